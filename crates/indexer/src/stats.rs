use serde::{Deserialize, Serialize};

/// Statistics about one rescan
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanStats {
    /// Source files found by the walk
    pub files: usize,

    /// Files whose cached declarations were reused
    pub reused: usize,

    /// Files parsed during this scan
    pub extracted: usize,

    /// Classes in the new snapshot
    pub classes: usize,

    pub unresolved_bases: usize,

    pub duplicates: usize,

    /// Generation of the snapshot this scan produced
    pub generation: u64,

    /// The walk hit `max_files`
    pub truncated: bool,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Files left out of the snapshot, with the reason
    pub errors: Vec<String>,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reused(&mut self) {
        self.reused += 1;
    }

    pub fn add_extracted(&mut self) {
        self.extracted += 1;
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
