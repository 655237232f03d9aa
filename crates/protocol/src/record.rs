use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A method that shadows a same-named method of one of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildOverride {
    pub class: String,
    pub method: String,
    pub line: usize,
    pub signature: String,
    pub base_class: String,
    pub base_file: String,
    pub base_file_path: String,
    pub base_line: usize,
    pub base_signature: String,
}

/// A method that is shadowed by a same-named method of a descendant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOverridden {
    pub class: String,
    pub method: String,
    pub line: usize,
    pub signature: String,
    pub child_class: String,
    pub child_file: String,
    pub child_file_path: String,
    pub child_line: usize,
    pub child_signature: String,
}

/// One override hint.
///
/// On the wire both variants share a single flat object (see [`WireRecord`]); fields that do
/// not apply to the variant are present and `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireRecord", try_from = "WireRecord")]
pub enum OverrideRecord {
    ChildOverride(ChildOverride),
    ParentOverridden(ParentOverridden),
}

impl OverrideRecord {
    /// Class the record is anchored at.
    pub fn class(&self) -> &str {
        match self {
            Self::ChildOverride(r) => &r.class,
            Self::ParentOverridden(r) => &r.class,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Self::ChildOverride(r) => &r.method,
            Self::ParentOverridden(r) => &r.method,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    ChildOverride,
    ParentOverridden,
}

/// Flat wire shape shared by both record variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WireRecord {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub class: String,
    pub method: String,
    pub line: usize,
    pub signature: String,
    #[serde(rename = "base")]
    pub base_class: Option<String>,
    pub base_file: Option<String>,
    pub base_file_path: Option<String>,
    pub base_line: Option<usize>,
    pub base_signature: Option<String>,
    #[serde(rename = "child")]
    pub child_class: Option<String>,
    pub child_file: Option<String>,
    pub child_file_path: Option<String>,
    pub child_line: Option<usize>,
    pub child_signature: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("`{kind}` record is missing field `{field}`")]
pub struct RecordShapeError {
    kind: &'static str,
    field: &'static str,
}

impl From<OverrideRecord> for WireRecord {
    fn from(record: OverrideRecord) -> Self {
        match record {
            OverrideRecord::ChildOverride(r) => Self {
                kind: RecordKind::ChildOverride,
                class: r.class,
                method: r.method,
                line: r.line,
                signature: r.signature,
                base_class: Some(r.base_class),
                base_file: Some(r.base_file),
                base_file_path: Some(r.base_file_path),
                base_line: Some(r.base_line),
                base_signature: Some(r.base_signature),
                child_class: None,
                child_file: None,
                child_file_path: None,
                child_line: None,
                child_signature: None,
            },
            OverrideRecord::ParentOverridden(r) => Self {
                kind: RecordKind::ParentOverridden,
                class: r.class,
                method: r.method,
                line: r.line,
                signature: r.signature,
                base_class: None,
                base_file: None,
                base_file_path: None,
                base_line: None,
                base_signature: None,
                child_class: Some(r.child_class),
                child_file: Some(r.child_file),
                child_file_path: Some(r.child_file_path),
                child_line: Some(r.child_line),
                child_signature: Some(r.child_signature),
            },
        }
    }
}

impl TryFrom<WireRecord> for OverrideRecord {
    type Error = RecordShapeError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        fn take<T>(
            value: Option<T>,
            kind: &'static str,
            field: &'static str,
        ) -> Result<T, RecordShapeError> {
            value.ok_or(RecordShapeError { kind, field })
        }

        match wire.kind {
            RecordKind::ChildOverride => {
                const KIND: &str = "child_override";
                Ok(Self::ChildOverride(ChildOverride {
                    class: wire.class,
                    method: wire.method,
                    line: wire.line,
                    signature: wire.signature,
                    base_class: take(wire.base_class, KIND, "base")?,
                    base_file: take(wire.base_file, KIND, "base_file")?,
                    base_file_path: take(wire.base_file_path, KIND, "base_file_path")?,
                    base_line: take(wire.base_line, KIND, "base_line")?,
                    base_signature: take(wire.base_signature, KIND, "base_signature")?,
                }))
            }
            RecordKind::ParentOverridden => {
                const KIND: &str = "parent_overridden";
                Ok(Self::ParentOverridden(ParentOverridden {
                    class: wire.class,
                    method: wire.method,
                    line: wire.line,
                    signature: wire.signature,
                    child_class: take(wire.child_class, KIND, "child")?,
                    child_file: take(wire.child_file, KIND, "child_file")?,
                    child_file_path: take(wire.child_file_path, KIND, "child_file_path")?,
                    child_line: take(wire.child_line, KIND, "child_line")?,
                    child_signature: take(wire.child_signature, KIND, "child_signature")?,
                }))
            }
        }
    }
}
