use crate::cache::ResultCache;
use crate::config::ServerConfig;
use crate::root::{find_workspace_root, normalize_target};
use anyhow::{Context, Result};
use override_indexer::{Fingerprint, Workspace};
use override_protocol::OverrideRecord;
use std::path::{Path, PathBuf};

/// One-shot analysis without the session handshake.
///
/// Unlike the session, a target that cannot be read is an error here.
pub struct StandaloneAnalyzer {
    config: ServerConfig,
    workspace_root: Option<PathBuf>,
    workspace: Option<Workspace>,
    cache: Option<ResultCache>,
}

impl StandaloneAnalyzer {
    pub fn new(config: ServerConfig) -> Self {
        let cache = Some(ResultCache::new(config.cache_capacity));
        Self {
            config,
            workspace_root: None,
            workspace: None,
            cache,
        }
    }

    /// Index this directory instead of discovering the root from the target
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    pub fn analyze(&mut self, file_path: &Path) -> Result<Vec<OverrideRecord>> {
        let target = normalize_target(file_path)?;
        let bytes = std::fs::read(&target)
            .with_context(|| format!("Cannot read {}", target.display()))?;
        let fingerprint = Fingerprint::of_bytes(&bytes);

        let root = match &self.workspace_root {
            Some(root) => normalize_target(root)?,
            None => find_workspace_root(&target),
        };
        let workspace = self.workspace_at(&root)?;
        workspace.ensure_fresh(Some(&target))?;
        let generation = workspace.index().generation();

        if let Some(records) = self
            .cache
            .as_mut()
            .and_then(|cache| cache.get(&target, fingerprint, generation))
        {
            return Ok(records);
        }

        let workspace = self.workspace_at(&root)?;
        let records = override_resolver::analyze(workspace, &target);
        if let Some(cache) = self.cache.as_mut() {
            cache.put(target, fingerprint, generation, records.clone());
        }
        Ok(records)
    }

    fn workspace_at(&mut self, root: &Path) -> Result<&mut Workspace> {
        let reusable = self
            .workspace
            .as_ref()
            .is_some_and(|workspace| workspace.root() == root);
        if !reusable {
            let workspace = Workspace::new(root, self.config.rescan_policy())
                .with_context(|| format!("Cannot open workspace {}", root.display()))?;
            self.workspace = Some(workspace);
        }

        self.workspace
            .as_mut()
            .with_context(|| format!("workspace {} is not open", root.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn project() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".project-root"), "").unwrap();
        fs::write(
            temp.path().join("base.py"),
            "class Shape:\n    def area(self):\n        return 0\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("square.py"),
            "class Square(Shape):\n    def area(self):\n        return 1\n",
        )
        .unwrap();
        temp
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let temp = project();
        let target = temp.path().join("square.py");
        let mut analyzer = StandaloneAnalyzer::new(ServerConfig::default());

        let first = analyzer.analyze(&target).unwrap();
        let second = analyzer.analyze(&target).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        let cache = analyzer.cache().unwrap();
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn edit_invalidates_cached_result() {
        let temp = project();
        let target = temp.path().join("square.py");
        let mut analyzer = StandaloneAnalyzer::new(ServerConfig::default());
        assert_eq!(analyzer.analyze(&target).unwrap().len(), 1);

        fs::write(&target, "class Square(Shape):\n    def side(self):\n        return 1\n")
            .unwrap();

        assert!(analyzer.analyze(&target).unwrap().is_empty());
        assert_eq!(analyzer.cache().unwrap().hits(), 0);
    }

    #[test]
    fn unreadable_target_is_an_error() {
        let temp = project();
        let mut analyzer = StandaloneAnalyzer::new(ServerConfig::default()).without_cache();
        let err = analyzer
            .analyze(&temp.path().join("missing.py"))
            .unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
        assert!(analyzer.cache().is_none());
    }

    #[test]
    fn explicit_workspace_root_is_used() {
        let temp = project();
        let outside = tempdir().unwrap();
        let target = outside.path().join("circle.py");
        fs::write(&target, "class Circle(Shape):\n    def area(self):\n        return 3\n")
            .unwrap();

        let mut analyzer =
            StandaloneAnalyzer::new(ServerConfig::default()).with_workspace_root(temp.path());
        let records = analyzer.analyze(&target).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].class(), "Circle");
    }
}
