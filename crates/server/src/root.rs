use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const MARKERS: &[&str] = &[
    ".git",
    ".hg",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "Pipfile",
    "tox.ini",
    ".project-root",
];

/// Nearest ancestor of `target` holding a project marker, else the target's own directory
pub fn find_workspace_root(target: &Path) -> PathBuf {
    let start = target.parent().unwrap_or(target);
    start
        .ancestors()
        .find(|candidate| MARKERS.iter().any(|marker| candidate.join(marker).exists()))
        .map_or_else(|| start.to_path_buf(), PathBuf::from)
}

/// Absolute, symlink-resolved form of a requested path. Paths that do not exist are made
/// absolute but otherwise left alone.
pub fn normalize_target(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Cannot resolve current directory")?
            .join(path)
    };
    Ok(absolute.canonicalize().unwrap_or(absolute))
}
