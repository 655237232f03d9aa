use ignore::WalkBuilder;
use override_extractor::is_source_path;
use std::path::{Path, PathBuf};

/// Bounds applied to a workspace walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Stop after this many source files
    pub max_files: usize,

    /// Directory names skipped in addition to the built-in list (case-insensitive)
    pub extra_excluded_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            extra_excluded_dirs: Vec::new(),
        }
    }
}

/// Result of one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Source files in sorted path order
    pub files: Vec<PathBuf>,

    /// The walk stopped at `max_files`
    pub truncated: bool,
}

/// Scanner for finding Python sources in a workspace
pub struct FileScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options: ScanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Walk the workspace (.gitignore aware)
    pub fn scan(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        let root = self.root.clone();
        let extra: Vec<String> = self
            .options
            .extra_excluded_dirs
            .iter()
            .map(|dir| dir.trim().to_lowercase())
            .filter(|dir| !dir.is_empty())
            .collect();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| !Self::is_ignored_scope(entry.path(), &root, &extra));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !is_source_path(path) {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            continue;
                        }
                    }

                    if outcome.files.len() >= self.options.max_files {
                        log::warn!(
                            "Workspace {} has more than {} source files; ignoring the rest",
                            self.root.display(),
                            self.options.max_files
                        );
                        outcome.truncated = true;
                        break;
                    }

                    outcome.files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        outcome.files.sort();
        log::debug!(
            "Found {} source files under {}",
            outcome.files.len(),
            self.root.display()
        );
        outcome
    }

    fn is_ignored_scope(path: &Path, root: &Path, extra: &[String]) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let std::path::Component::Normal(name) = component {
                    let lowered = name.to_string_lossy().to_lowercase();
                    if IGNORED_SCOPES.iter().any(|ignored| *ignored == lowered)
                        || extra.iter().any(|ignored| *ignored == lowered)
                    {
                        return true;
                    }
                }
            }
        }
        false
    }
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // virtualenvs / vendored packages
    ".venv",
    "venv",
    "env",
    "site-packages",
    "node_modules",
    ".eggs",
    // caches / builds
    "__pycache__",
    ".cache",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "htmlcov",
    "build",
    "dist",
];

const DEFAULT_MAX_FILES: usize = 10_000;
const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB
