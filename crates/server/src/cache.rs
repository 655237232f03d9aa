use lru::LruCache;
use override_indexer::Fingerprint;
use override_protocol::OverrideRecord;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    generation: u64,
    records: Vec<OverrideRecord>,
    computed_at_ms: u64,
}

/// Last computed records per target file.
///
/// An entry is only served while both the file's content fingerprint and the index generation
/// it was computed against are unchanged.
pub struct ResultCache {
    entries: LruCache<PathBuf, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(
        &mut self,
        path: &Path,
        fingerprint: Fingerprint,
        generation: u64,
    ) -> Option<Vec<OverrideRecord>> {
        let valid = self
            .entries
            .get(path)
            .map(|entry| entry.fingerprint == fingerprint && entry.generation == generation);

        match valid {
            Some(true) => {
                self.hits += 1;
                let entry = self.entries.peek(path)?;
                log::debug!(
                    "Result cache hit for {} (computed at {})",
                    path.display(),
                    entry.computed_at_ms
                );
                Some(entry.records.clone())
            }
            Some(false) => {
                self.misses += 1;
                self.entries.pop(path);
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(
        &mut self,
        path: PathBuf,
        fingerprint: Fingerprint,
        generation: u64,
        records: Vec<OverrideRecord>,
    ) {
        self.entries.put(
            path,
            CacheEntry {
                fingerprint,
                generation,
                records,
                computed_at_ms: unix_ms_now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use override_protocol::ChildOverride;

    fn record() -> OverrideRecord {
        OverrideRecord::ChildOverride(ChildOverride {
            class: "Dog".to_string(),
            method: "speak".to_string(),
            line: 3,
            signature: "speak(self)".to_string(),
            base_class: "Animal".to_string(),
            base_file: "base.py".to_string(),
            base_file_path: "/ws/base.py".to_string(),
            base_line: 2,
            base_signature: "speak(self)".to_string(),
        })
    }

    #[test]
    fn hit_requires_matching_fingerprint_and_generation() {
        let mut cache = ResultCache::new(4);
        let path = Path::new("/ws/child.py");
        let fp = Fingerprint::of_bytes(b"v1");
        cache.put(path.to_path_buf(), fp, 1, vec![record()]);

        assert_eq!(cache.get(path, fp, 1), Some(vec![record()]));
        assert_eq!(cache.get(path, fp, 2), None);
        // The stale entry was dropped on the mismatch.
        assert!(cache.is_empty());

        cache.put(path.to_path_buf(), fp, 2, vec![]);
        assert_eq!(cache.get(path, Fingerprint::of_bytes(b"v2"), 2), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let mut cache = ResultCache::new(2);
        let fp = Fingerprint::of_bytes(b"x");
        cache.put(PathBuf::from("/a.py"), fp, 1, vec![]);
        cache.put(PathBuf::from("/b.py"), fp, 1, vec![]);
        assert!(cache.get(Path::new("/a.py"), fp, 1).is_some());
        cache.put(PathBuf::from("/c.py"), fp, 1, vec![]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(Path::new("/b.py"), fp, 1).is_none());
        assert!(cache.get(Path::new("/a.py"), fp, 1).is_some());
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut cache = ResultCache::new(0);
        cache.put(PathBuf::from("/a.py"), Fingerprint::Absent, 1, vec![]);
        assert_eq!(cache.len(), 1);
    }
}
