use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Opaque request identifier, echoed back verbatim.
pub type RequestId = Value;

/// Placeholder id used when a failed request carried none.
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze { file_path: PathBuf },
    Rescan { file_path: PathBuf },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Analyze { .. } => "analyze",
            Self::Rescan { .. } => "rescan",
        }
    }

    pub fn file_path(&self) -> &PathBuf {
        match self {
            Self::Analyze { file_path } | Self::Rescan { file_path } => file_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub command: Command,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// A request envelope that could not be turned into a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRequest {
    pub id: Option<RequestId>,
    pub error: RequestError,
}

/// Request body as it appears on the wire; used for schema export.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WireRequest {
    pub id: Value,
    pub command: String,
    pub data: WireRequestData,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WireRequestData {
    pub file_path: String,
}

impl Request {
    /// Validates an already-decoded JSON line.
    ///
    /// The id is extracted first so that every later failure can still be paired with the
    /// request that caused it.
    pub fn from_value(value: Value) -> Result<Self, RejectedRequest> {
        let Value::Object(mut map) = value else {
            return Err(RejectedRequest {
                id: None,
                error: RequestError::NotAnObject,
            });
        };

        let id = map.remove("id").filter(|id| !id.is_null());
        let reject = |error: RequestError| RejectedRequest {
            id: id.clone(),
            error,
        };

        let command = match map.get("command") {
            None | Some(Value::Null) => return Err(reject(RequestError::MissingField("command"))),
            Some(Value::String(command)) => command.clone(),
            Some(_) => {
                return Err(reject(RequestError::InvalidField {
                    field: "command",
                    expected: "a string",
                }))
            }
        };

        if !matches!(command.as_str(), "analyze" | "rescan") {
            return Err(reject(RequestError::UnknownCommand(command)));
        }

        let file_path = match map.get("data").and_then(|data| data.get("file_path")) {
            None | Some(Value::Null) => {
                return Err(reject(RequestError::MissingField("data.file_path")))
            }
            Some(Value::String(path)) if !path.trim().is_empty() => PathBuf::from(path),
            Some(_) => {
                return Err(reject(RequestError::InvalidField {
                    field: "data.file_path",
                    expected: "a non-empty string",
                }))
            }
        };

        let Some(id) = id.clone() else {
            return Err(reject(RequestError::MissingField("id")));
        };

        let command = if command == "analyze" {
            Command::Analyze { file_path }
        } else {
            Command::Rescan { file_path }
        };
        Ok(Self { id, command })
    }
}

/// One reply line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success { id: RequestId, result: Value },
    Failure { id: RequestId, error: String },
}

impl Response {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Success { id, result }
    }

    pub fn failure(id: Option<RequestId>, error: impl Into<String>) -> Self {
        Self::Failure {
            id: id.unwrap_or_else(|| Value::String(UNKNOWN_REQUEST_ID.to_string())),
            error: error.into(),
        }
    }

    pub fn rejected(rejected: RejectedRequest) -> Self {
        Self::failure(rejected.id, rejected.error.to_string())
    }
}

/// Out-of-band lines the server emits without a matching request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    Ready,
}

/// Result payload of the `rescan` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RescanSummary {
    pub files: usize,
    pub classes: usize,
    pub unresolved_bases: usize,
    pub duplicates: usize,
    pub generation: u64,
}
