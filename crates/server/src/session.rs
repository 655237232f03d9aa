use crate::config::ServerConfig;
use crate::root::{find_workspace_root, normalize_target};
use anyhow::{anyhow, Context, Result};
use lru::LruCache;
use override_indexer::Workspace;
use override_protocol::{
    serialize_json, Command, Notice, OverrideRecord, Request, RescanSummary, Response,
};
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Long-lived request/response loop over newline-delimited JSON.
///
/// One request is fully answered (including any rescan it triggers) before the next line is
/// read. Workspaces are kept per project root, least recently used first out.
pub struct Session {
    config: ServerConfig,
    workspaces: LruCache<PathBuf, Workspace>,
}

impl Session {
    pub fn new(config: ServerConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_workspaces).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            workspaces: LruCache::new(capacity),
        }
    }

    /// Announce readiness, then answer lines until end of input
    pub fn run<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> Result<()> {
        write_line(&mut writer, &Notice::Ready)?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .context("Failed to read request line")?;
            if read == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            if let Some(response) = self.handle_line(&line) {
                write_line(&mut writer, &response)?;
            }
        }

        log::info!("Input closed; session ends");
        Ok(())
    }

    /// Reply for one input line; `None` for lines that are not JSON at all
    pub fn handle_line(&mut self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Skipping non-JSON input line: {e}");
                return None;
            }
        };

        Some(match Request::from_value(value) {
            Ok(request) => self.handle(request),
            Err(rejected) => {
                log::debug!("Rejected request: {}", rejected.error);
                Response::rejected(rejected)
            }
        })
    }

    pub fn handle(&mut self, request: Request) -> Response {
        let Request { id, command } = request;
        let outcome = match &command {
            Command::Analyze { file_path } => self.analyze(file_path).and_then(to_value),
            Command::Rescan { file_path } => self.rescan(file_path).and_then(to_value),
        };

        match outcome {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                log::warn!("{} failed: {e:#}", command.name());
                Response::failure(Some(id), format!("{e:#}"))
            }
        }
    }

    pub fn analyze(&mut self, file_path: &Path) -> Result<Vec<OverrideRecord>> {
        let target = normalize_target(file_path)?;
        if !target.is_file() {
            log::debug!("{} does not exist; nothing to report", target.display());
            return Ok(Vec::new());
        }

        let workspace = self.workspace_for(&target)?;
        workspace.ensure_fresh(Some(&target))?;
        Ok(override_resolver::analyze(workspace, &target))
    }

    pub fn rescan(&mut self, file_path: &Path) -> Result<RescanSummary> {
        let target = normalize_target(file_path)?;
        let workspace = self.workspace_for(&target)?;
        workspace.mark_stale();
        let stats = workspace.rescan()?;

        Ok(RescanSummary {
            files: stats.files,
            classes: stats.classes,
            unresolved_bases: stats.unresolved_bases,
            duplicates: stats.duplicates,
            generation: stats.generation,
        })
    }

    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    fn workspace_for(&mut self, target: &Path) -> Result<&mut Workspace> {
        let root = find_workspace_root(target);
        if !self.workspaces.contains(&root) {
            let workspace = Workspace::new(&root, self.config.rescan_policy())
                .with_context(|| format!("Cannot open workspace {}", root.display()))?;
            log::info!("Opened workspace {}", root.display());
            if let Some((evicted, _)) = self.workspaces.push(root.clone(), workspace) {
                log::info!("Evicted workspace {}", evicted.display());
            }
        }

        self.workspaces
            .get_mut(&root)
            .ok_or_else(|| anyhow!("workspace {} is not open", root.display()))
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to encode result")
}

fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let json = serialize_json(value)?;
    writeln!(writer, "{json}").context("Failed to write reply")?;
    writer.flush().context("Failed to flush reply")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn blank_and_garbage_lines_are_skipped() {
        let mut session = Session::new(ServerConfig::default());
        assert!(session.handle_line("").is_none());
        assert!(session.handle_line("   \r").is_none());
        assert!(session.handle_line("not json").is_none());
        assert!(session.handle_line("{\"id\": 1,").is_none());
    }

    #[test]
    fn malformed_envelope_gets_error_reply() {
        let mut session = Session::new(ServerConfig::default());
        let response = session.handle_line(r#"{"id": 9, "command": "explode"}"#).unwrap();
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"id": 9, "error": "unknown command: explode"})
        );
    }

    #[test]
    fn workspaces_are_capped() {
        let temp = tempdir().unwrap();
        let mut session = Session::new(ServerConfig::default().with_max_workspaces(2));
        for name in ["a", "b", "c"] {
            let dir = temp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(".project-root"), "").unwrap();
            fs::write(dir.join("m.py"), "class M: pass\n").unwrap();
            session.analyze(&dir.join("m.py")).unwrap();
        }
        assert_eq!(session.workspace_count(), 2);
    }
}
