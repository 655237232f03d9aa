use crate::error::{IndexerError, Result};
use crate::fingerprint::{fingerprint, ChangeTracker, Fingerprint};
use crate::hierarchy::{FileDeclarations, HierarchyIndex};
use crate::scanner::{FileScanner, ScanOptions};
use crate::staleness::{assess_staleness, StaleAssessment, StalenessInputs, WorkspaceState};
use crate::stats::ScanStats;
use override_extractor::{Declaration, Extractor};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(30);

/// When a workspace rebuilds its index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanPolicy {
    pub interval: Duration,

    /// Rebuild when the requested file no longer matches its snapshot fingerprint
    pub rescan_on_target_change: bool,

    pub scan: ScanOptions,
}

impl Default for RescanPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RESCAN_INTERVAL,
            rescan_on_target_change: true,
            scan: ScanOptions::default(),
        }
    }
}

/// One project root and the hierarchy snapshot built from it.
///
/// The snapshot is only ever replaced wholesale: a rescan builds a new [`HierarchyIndex`] off to
/// the side and swaps it in, so readers never observe a half-built index.
pub struct Workspace {
    root: PathBuf,
    policy: RescanPolicy,
    state: WorkspaceState,
    index: HierarchyIndex,
    tracker: ChangeTracker,
    extracted: HashMap<PathBuf, Vec<Declaration>>,
    extractor: Extractor,
    last_scan: Option<Instant>,
}

impl Workspace {
    pub fn new(root: impl AsRef<Path>, policy: RescanPolicy) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(root.display().to_string()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            policy,
            state: WorkspaceState::Uninitialized,
            index: HierarchyIndex::default(),
            tracker: ChangeTracker::new(),
            extracted: HashMap::new(),
            extractor: Extractor::new()?,
            last_scan: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    pub fn index(&self) -> &HierarchyIndex {
        &self.index
    }

    pub fn policy(&self) -> &RescanPolicy {
        &self.policy
    }

    /// Force the next [`Self::ensure_fresh`] to rebuild
    pub fn mark_stale(&mut self) {
        if self.state == WorkspaceState::Indexed {
            self.state = WorkspaceState::Stale;
        }
    }

    /// Evaluate the rescan policy for a request about `target`. Does not record anything.
    pub fn assess(&self, target: Option<&Path>) -> StaleAssessment {
        let target_changed = self.policy.rescan_on_target_change
            && target.is_some_and(|target| self.target_changed(target));

        assess_staleness(StalenessInputs {
            state: self.state,
            since_last_scan: self.last_scan.map(|at| at.elapsed()),
            interval: self.policy.interval,
            target_changed,
        })
    }

    // A target left out of the snapshot (it failed to parse last time) triggers once it differs
    // from what the last scan saw. Never-scanned files are extracted on demand instead.
    fn target_changed(&self, target: &Path) -> bool {
        let recorded = self
            .index
            .file_fingerprint(target)
            .or_else(|| self.tracker.recorded(target));
        recorded.is_some_and(|recorded| fingerprint(target) != recorded)
    }

    /// Rescan if the policy says so; returns the scan statistics when a rebuild happened
    pub fn ensure_fresh(&mut self, target: Option<&Path>) -> Result<Option<ScanStats>> {
        let assessment = self.assess(target);
        if !assessment.stale {
            return Ok(None);
        }

        log::debug!(
            "Rescanning {} ({:?})",
            self.root.display(),
            assessment.reasons
        );
        self.rescan().map(Some)
    }

    /// Walk the workspace and rebuild the index, reusing declarations of unchanged files
    pub fn rescan(&mut self) -> Result<ScanStats> {
        if !self.root.is_dir() {
            return Err(IndexerError::InvalidPath(self.root.display().to_string()));
        }

        let started = Instant::now();
        let outcome = FileScanner::new(&self.root)
            .with_options(self.policy.scan.clone())
            .scan();

        let mut stats = ScanStats::new();
        stats.files = outcome.files.len();
        stats.truncated = outcome.truncated;

        let live: HashSet<PathBuf> = outcome.files.iter().cloned().collect();
        let mut snapshot = Vec::with_capacity(outcome.files.len());

        for path in outcome.files {
            let changed = self.tracker.has_changed(&path);
            let fingerprint = self
                .tracker
                .recorded(&path)
                .unwrap_or(Fingerprint::Absent);

            let cached = if changed {
                None
            } else {
                self.extracted.get(&path).cloned()
            };

            let declarations = if let Some(declarations) = cached {
                stats.add_reused();
                declarations
            } else {
                match self.extractor.extract_file(&path) {
                    Ok(declarations) => {
                        stats.add_extracted();
                        self.extracted.insert(path.clone(), declarations.clone());
                        declarations
                    }
                    Err(e) => {
                        log::debug!("Leaving {} out of the index: {e}", path.display());
                        stats.add_error(format!("{}: {e}", path.display()));
                        self.extracted.remove(&path);
                        continue;
                    }
                }
            };

            snapshot.push(FileDeclarations {
                path,
                fingerprint,
                declarations,
            });
        }

        self.tracker.retain(|path| live.contains(path));
        self.extracted.retain(|path, _| live.contains(path));

        let index = HierarchyIndex::build(snapshot, self.index.generation() + 1);
        stats.classes = index.class_count();
        stats.unresolved_bases = index.unresolved_bases().len();
        stats.duplicates = index.duplicates().len();
        stats.generation = index.generation();
        stats.time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.index = index;
        self.state = WorkspaceState::Indexed;
        self.last_scan = Some(Instant::now());

        log::info!(
            "Indexed {}: {} files ({} reused, {} parsed, {} skipped), {} classes in {} ms",
            self.root.display(),
            stats.files,
            stats.reused,
            stats.extracted,
            stats.errors.len(),
            stats.classes,
            stats.time_ms
        );
        Ok(stats)
    }

    /// Declarations of `target`: from the snapshot when it is part of it, otherwise parsed on
    /// the spot. A target that cannot be read or parsed has no declarations.
    pub fn target_declarations(&mut self, target: &Path) -> Vec<Declaration> {
        if let Some(declarations) = self.index.declarations_in(target) {
            return declarations.to_vec();
        }

        match self.extractor.extract_file(target) {
            Ok(declarations) => declarations,
            Err(e) => {
                log::debug!("No declarations for {}: {e}", target.display());
                Vec::new()
            }
        }
    }

    /// Index to resolve `target` against, with the target's declarations.
    ///
    /// A target outside the snapshot is overlaid on a copy of it, so classes declared in the
    /// target can serve as each other's ancestors.
    pub fn target_view(&mut self, target: &Path) -> (Cow<'_, HierarchyIndex>, Vec<Declaration>) {
        let declarations = self.target_declarations(target);
        if declarations.is_empty() || self.index.contains_file(target) {
            return (Cow::Borrowed(&self.index), declarations);
        }

        log::debug!(
            "{} is not indexed; resolving against an overlay",
            target.display()
        );
        let overlay = self.index.overlay(FileDeclarations {
            path: target.to_path_buf(),
            fingerprint: fingerprint(target),
            declarations: declarations.clone(),
        });
        (Cow::Owned(overlay), declarations)
    }
}
