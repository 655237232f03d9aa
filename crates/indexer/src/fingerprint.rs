use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Content fingerprint of a file.
///
/// `Absent` stands for "could not be read" and never equals a digest, so a file that vanishes
/// (or becomes unreadable) is observed as a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    Absent,
    Content([u8; 32]),
}

impl Fingerprint {
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Self::Content(digest)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Content(digest) => {
                for byte in &digest[..8] {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Fingerprint the current contents of `path`
pub fn fingerprint(path: impl AsRef<Path>) -> Fingerprint {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(bytes) => Fingerprint::of_bytes(&bytes),
        Err(e) => {
            log::debug!("Treating {} as absent: {e}", path.display());
            Fingerprint::Absent
        }
    }
}

/// Remembers the last observed fingerprint of every path it has been asked about
#[derive(Debug, Default)]
pub struct ChangeTracker {
    recorded: HashMap<PathBuf, Fingerprint>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-update: fingerprint `path`, report whether it differs from the last
    /// observation and record the new value. The first observation of a path is a change.
    pub fn has_changed(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.observe(path, fingerprint(path))
    }

    /// Record an already computed fingerprint; same contract as [`Self::has_changed`]
    pub fn observe(&mut self, path: &Path, current: Fingerprint) -> bool {
        let previous = self.recorded.insert(path.to_path_buf(), current);
        previous != Some(current)
    }

    pub fn recorded(&self, path: &Path) -> Option<Fingerprint> {
        self.recorded.get(path).copied()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.recorded.retain(|path, _| keep(path));
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reports_each_mutation_once() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a.py");
        fs::write(&path, "class A: pass\n").unwrap();

        let mut tracker = ChangeTracker::new();
        assert!(tracker.has_changed(&path), "first observation counts");
        assert!(!tracker.has_changed(&path));
        assert!(!tracker.has_changed(&path));

        fs::write(&path, "class A(B): pass\n").unwrap();
        assert!(tracker.has_changed(&path));
        assert!(!tracker.has_changed(&path));
    }

    #[test]
    fn vanished_file_changes_exactly_once() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gone.py");
        fs::write(&path, "x = 1\n").unwrap();

        let mut tracker = ChangeTracker::new();
        tracker.has_changed(&path);
        fs::remove_file(&path).unwrap();

        assert!(tracker.has_changed(&path));
        assert_eq!(tracker.recorded(&path), Some(Fingerprint::Absent));
        assert!(!tracker.has_changed(&path));
    }

    #[test]
    fn identical_content_has_identical_fingerprint() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a.py");
        let b = temp.path().join("b.py");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), Fingerprint::Absent);
        assert!(fingerprint(temp.path().join("missing.py")).is_absent());
        assert_eq!(Fingerprint::of_bytes(b"same"), fingerprint(&a));
    }

    #[test]
    fn retain_prunes_records() {
        let mut tracker = ChangeTracker::new();
        tracker.observe(Path::new("/ws/a.py"), Fingerprint::of_bytes(b"a"));
        tracker.observe(Path::new("/ws/b.py"), Fingerprint::of_bytes(b"b"));
        tracker.observe(Path::new("/ws/c.py"), Fingerprint::of_bytes(b"c"));

        tracker.retain(|path| path.ends_with("b.py"));

        assert_eq!(tracker.len(), 1);
        assert!(tracker.observe(Path::new("/ws/c.py"), Fingerprint::of_bytes(b"c")));
    }

    #[test]
    fn display_is_short_hex() {
        let rendered = Fingerprint::of_bytes(b"").to_string();
        assert_eq!(rendered, "e3b0c44298fc1c14");
        assert_eq!(Fingerprint::Absent.to_string(), "absent");
    }
}
