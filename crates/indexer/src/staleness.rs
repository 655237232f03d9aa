use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a workspace index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceState {
    /// No scan has completed yet
    Uninitialized,
    Indexed,
    /// A rebuild was requested and has not run yet
    Stale,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    NeverIndexed,
    IntervalElapsed,
    MarkedStale,
    TargetChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaleAssessment {
    pub stale: bool,
    pub reasons: Vec<StaleReason>,
}

/// Everything the rescan policy looks at, gathered without touching the index
#[derive(Debug, Clone, Copy)]
pub struct StalenessInputs {
    pub state: WorkspaceState,
    pub since_last_scan: Option<Duration>,
    pub interval: Duration,
    /// Target file's current fingerprint differs from the one in the snapshot
    pub target_changed: bool,
}

#[must_use]
pub fn assess_staleness(inputs: StalenessInputs) -> StaleAssessment {
    let mut reasons = Vec::new();

    match inputs.state {
        WorkspaceState::Uninitialized => reasons.push(StaleReason::NeverIndexed),
        WorkspaceState::Stale => reasons.push(StaleReason::MarkedStale),
        WorkspaceState::Indexed => {}
    }

    if let Some(elapsed) = inputs.since_last_scan {
        if elapsed > inputs.interval {
            reasons.push(StaleReason::IntervalElapsed);
        }
    }

    if inputs.target_changed {
        reasons.push(StaleReason::TargetChanged);
    }

    let stale = !reasons.is_empty();
    StaleAssessment { stale, reasons }
}
