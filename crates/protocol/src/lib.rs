//! # Override Protocol
//!
//! Wire types shared by the session server and the standalone analyzer: the two
//! [`OverrideRecord`] shapes and the newline-delimited JSON request/response envelopes.
//!
//! ```text
//! -> {"type":"ready"}
//! <- {"id": 1, "command": "analyze", "data": {"file_path": "/ws/child.py"}}
//! -> {"id": 1, "result": [{"type": "child_override", ...}]}
//! ```

use anyhow::Result;
use serde::Serialize;

pub mod envelope;
pub mod record;

pub use envelope::{
    Command, Notice, RejectedRequest, Request, RequestError, RequestId, RescanSummary, Response,
    WireRequest, WireRequestData, UNKNOWN_REQUEST_ID,
};
pub use record::{
    ChildOverride, OverrideRecord, ParentOverridden, RecordKind, RecordShapeError, WireRecord,
};

pub const PROTOCOL_SCHEMA_VERSION: u32 = 1;

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

/// JSON Schema for every line shape the protocol defines.
pub fn protocol_schema() -> serde_json::Value {
    serde_json::json!({
        "schema_version": PROTOCOL_SCHEMA_VERSION,
        "notice": schemars::schema_for!(Notice),
        "request": schemars::schema_for!(WireRequest),
        "record": schemars::schema_for!(WireRecord),
        "rescan_summary": schemars::schema_for!(RescanSummary),
    })
}
