//! Normalization of raw service payloads into [`IssueReport`]
//!
//! The service is inconsistent about shapes: issue lists arrive as arrays,
//! bare strings, or JSON text, and history records wrap the report in a
//! `report_response` field that may itself be encoded. Every shape check in
//! the crate lives here.
//!
//! Each value gets at most one JSON decode pass along its path from the
//! wire. Values are tagged with a [`Layer`] while they flow through the
//! decoder, and only [`Layer::Wire`] values are eligible for a pass.

mod records;

pub use records::{decode_common_issues, decode_records, COMMON_AST_KEY, COMMON_STYLE_KEY};

use crate::IssueReport;
use serde_json::{Map, Value};
use std::borrow::Cow;

pub const AST_ISSUES_KEY: &str = "AST Issues";
pub const STYLE_ISSUES_KEY: &str = "PEP8 Issues";
pub const CODE_SMELLS_KEY: &str = "Code Smells";
pub const ENVELOPE_KEY: &str = "report_response";

/// Why the decoder fell back to an empty report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has neither \"AST Issues\" nor \"PEP8 Issues\"")]
    MissingIssueFields,
    #[error("report_response of record {id:?} is not an encoded object")]
    MalformedEnvelope { id: String },
}

/// Decode depth of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layer {
    /// As received; one decode pass still available
    Wire,
    /// Produced by (or already spent) a decode pass
    Unwrapped,
}

/// A JSON value plus its decode depth
#[derive(Debug, Clone)]
pub(crate) struct Tagged<'a> {
    pub(crate) value: Cow<'a, Value>,
    pub(crate) layer: Layer,
}

impl<'a> Tagged<'a> {
    pub(crate) fn wire(value: &'a Value) -> Self {
        Self {
            value: Cow::Borrowed(value),
            layer: Layer::Wire,
        }
    }

    fn reborrow(&self) -> Tagged<'_> {
        Tagged {
            value: Cow::Borrowed(self.value.as_ref()),
            layer: self.layer,
        }
    }

    /// Child value of an object, inheriting this value's layer
    pub(crate) fn field(&self, key: &str) -> Option<Tagged<'_>> {
        self.value.get(key).map(|value| Tagged {
            value: Cow::Borrowed(value),
            layer: self.layer,
        })
    }

    /// Element values of an array, inheriting this value's layer
    pub(crate) fn items(&self) -> impl Iterator<Item = Tagged<'_>> {
        let layer = self.layer;
        self.value
            .as_array()
            .into_iter()
            .flatten()
            .map(move |value| Tagged {
                value: Cow::Borrowed(value),
                layer,
            })
    }

    /// Spend the single decode pass on a string value.
    ///
    /// The decoded value replaces the text only when `accept` approves it;
    /// otherwise the text is kept as-is. Either way the pass is spent.
    pub(crate) fn unwrap_once(self, accept: impl Fn(&Value) -> bool) -> Self {
        if self.layer == Layer::Unwrapped {
            return self;
        }
        let Value::String(text) = self.value.as_ref() else {
            return self;
        };
        let decoded = serde_json::from_str::<Value>(text)
            .ok()
            .filter(|value| accept(value));
        match decoded {
            Some(value) => Tagged {
                value: Cow::Owned(value),
                layer: Layer::Unwrapped,
            },
            None => Tagged {
                value: self.value,
                layer: Layer::Unwrapped,
            },
        }
    }

    /// Restore the decode pass for a value that is its own wire unit
    fn rewire(self) -> Self {
        Tagged {
            value: self.value,
            layer: Layer::Wire,
        }
    }

    pub(crate) fn as_object(&self) -> Option<&Map<String, Value>> {
        self.value.as_object()
    }
}

/// Decode one raw payload. Never fails; falls back to an empty report and
/// logs the reason.
pub fn decode(raw: &Value) -> IssueReport {
    let (report, problem) = decode_with_diagnostics(raw);
    if let Some(problem) = problem {
        log_fallback(&report, &problem);
    }
    report
}

/// Decode one raw payload and report why the fallback path was taken, if it was
pub fn decode_with_diagnostics(raw: &Value) -> (IssueReport, Option<DecodeError>) {
    decode_tagged(Tagged::wire(raw))
}

pub(crate) fn decode_tagged(payload: Tagged<'_>) -> (IssueReport, Option<DecodeError>) {
    let payload = payload.unwrap_once(Value::is_object);
    if payload.as_object().is_none() {
        return (IssueReport::default(), Some(DecodeError::NotAnObject));
    }

    let mut report = IssueReport {
        id: scalar_text(payload.field("id")),
        timestamp: scalar_text(payload.field("timestamp")),
        status: optional_text(payload.field("Status")),
        code: optional_text(payload.field("code")),
        ..IssueReport::default()
    };

    let container = match payload.field(ENVELOPE_KEY) {
        Some(envelope) => {
            // The envelope text is encoded on its own, even inside an
            // encoded record; an object envelope keeps the record's layer
            let envelope = if envelope.value.is_string() {
                envelope.rewire()
            } else {
                envelope
            };
            let envelope = envelope.unwrap_once(Value::is_object);
            if envelope.as_object().is_none() {
                let id = report.id.clone();
                return (report, Some(DecodeError::MalformedEnvelope { id }));
            }
            envelope
        }
        None => payload.reborrow(),
    };

    let ast = container.field(AST_ISSUES_KEY);
    let style = container.field(STYLE_ISSUES_KEY);
    if ast.is_none() && style.is_none() {
        return (report, Some(DecodeError::MissingIssueFields));
    }

    report.ast_issues = issue_list(ast);
    report.style_issues = issue_list(style);
    report.code_smells = container
        .field(CODE_SMELLS_KEY)
        .map(|smells| plain_text(&smells.value))
        .unwrap_or_default();

    (report, None)
}

pub(crate) fn log_fallback(report: &IssueReport, problem: &DecodeError) {
    // Sentinel records are expected to be empty
    if report.is_sentinel() {
        return;
    }
    tracing::warn!(id = %report.id, %problem, "using empty report for malformed payload");
}

/// Normalize an issue field into an ordered list of strings
fn issue_list(field: Option<Tagged<'_>>) -> Vec<String> {
    let Some(field) = field else {
        return Vec::new();
    };
    let field = field.unwrap_once(|decoded| decoded.is_array() || decoded.is_string());
    match field.value.as_ref() {
        Value::Array(items) => items.iter().filter_map(element_text).collect(),
        Value::String(text) if text.trim().is_empty() => Vec::new(),
        other => element_text(other).into_iter().collect(),
    }
}

/// Text of one issue element. Elements are never JSON-parsed.
fn element_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        structured => Some(structured.to_string()),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn scalar_text(field: Option<Tagged<'_>>) -> String {
    field.map(|f| plain_text(&f.value)).unwrap_or_default()
}

fn optional_text(field: Option<Tagged<'_>>) -> Option<String> {
    match field {
        None => None,
        Some(f) if f.value.is_null() => None,
        Some(f) => Some(plain_text(&f.value)),
    }
}
