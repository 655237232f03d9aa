use override_indexer::{RescanPolicy, ScanOptions, DEFAULT_RESCAN_INTERVAL};
use std::time::Duration;

const DEFAULT_MAX_FILES: usize = 10_000;
const DEFAULT_MAX_WORKSPACES: usize = 8;
const DEFAULT_CACHE_CAPACITY: usize = 256;

const MAX_RESCAN_INTERVAL_MS: u64 = 86_400_000;
const MAX_FILES_LIMIT: usize = 1_000_000;
const MAX_WORKSPACES_LIMIT: usize = 256;
const MAX_CACHE_CAPACITY: usize = 65_536;

pub const ENV_RESCAN_INTERVAL_MS: &str = "OVERRIDE_HINTS_RESCAN_INTERVAL_MS";
pub const ENV_MAX_FILES: &str = "OVERRIDE_HINTS_MAX_FILES";
pub const ENV_MAX_WORKSPACES: &str = "OVERRIDE_HINTS_MAX_WORKSPACES";
pub const ENV_CACHE_CAPACITY: &str = "OVERRIDE_HINTS_CACHE_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub rescan_interval: Duration,
    pub max_files: usize,
    pub max_workspaces: usize,
    pub cache_capacity: usize,
    pub rescan_on_target_change: bool,
    pub extra_excluded_dirs: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
            max_files: DEFAULT_MAX_FILES,
            max_workspaces: DEFAULT_MAX_WORKSPACES,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            rescan_on_target_change: true,
            extra_excluded_dirs: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `OVERRIDE_HINTS_*` keys.
    /// Blank or unparsable values fall back to the default; the rest are clamped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let default_interval_ms =
            u64::try_from(defaults.rescan_interval.as_millis()).unwrap_or(MAX_RESCAN_INTERVAL_MS);

        Self {
            rescan_interval: Duration::from_millis(parse_u64(
                lookup(ENV_RESCAN_INTERVAL_MS).as_deref(),
                default_interval_ms,
                0,
                MAX_RESCAN_INTERVAL_MS,
            )),
            max_files: parse_usize(
                lookup(ENV_MAX_FILES).as_deref(),
                defaults.max_files,
                1,
                MAX_FILES_LIMIT,
            ),
            max_workspaces: parse_usize(
                lookup(ENV_MAX_WORKSPACES).as_deref(),
                defaults.max_workspaces,
                1,
                MAX_WORKSPACES_LIMIT,
            ),
            cache_capacity: parse_usize(
                lookup(ENV_CACHE_CAPACITY).as_deref(),
                defaults.cache_capacity,
                1,
                MAX_CACHE_CAPACITY,
            ),
            ..defaults
        }
    }

    pub fn with_rescan_interval_ms(mut self, ms: u64) -> Self {
        self.rescan_interval = Duration::from_millis(ms.min(MAX_RESCAN_INTERVAL_MS));
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files.clamp(1, MAX_FILES_LIMIT);
        self
    }

    pub fn with_max_workspaces(mut self, max_workspaces: usize) -> Self {
        self.max_workspaces = max_workspaces.clamp(1, MAX_WORKSPACES_LIMIT);
        self
    }

    pub fn with_excluded_dirs(mut self, dirs: impl IntoIterator<Item = String>) -> Self {
        self.extra_excluded_dirs.extend(dirs);
        self
    }

    pub fn rescan_policy(&self) -> RescanPolicy {
        RescanPolicy {
            interval: self.rescan_interval,
            rescan_on_target_change: self.rescan_on_target_change,
            scan: ScanOptions {
                max_files: self.max_files,
                extra_excluded_dirs: self.extra_excluded_dirs.clone(),
            },
        }
    }
}

fn parse_u64(raw: Option<&str>, default_value: u64, min: u64, max: u64) -> u64 {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_value)
        .clamp(min, max)
}

fn parse_usize(raw: Option<&str>, default_value: usize, min: usize, max: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(min, max)
}
