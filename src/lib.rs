//! issuelens: client for a remote Python code analysis service
//!
//! The analysis itself runs server-side. This library turns whatever the
//! service returns into one canonical [`IssueReport`], classifies its
//! severity, and shapes issue-frequency statistics into chart slices.

pub mod client;
pub mod config;
pub mod decoder;
pub mod frequency;
pub mod reporter;
pub mod severity;

pub use client::{ClientError, FailureKind, RequestOrchestrator};
pub use decoder::{decode, decode_common_issues, decode_records, DecodeError};
pub use frequency::{to_chart_slices, DEFAULT_SLICE_LIMIT};
pub use severity::{classify, SeverityTier};

use serde::Serialize;

/// Id the backend uses for "no matching record"
pub const SENTINEL_ID: &str = "N/A";

/// Canonical analysis report, the only shape the presentation layer sees.
///
/// Serializes with the service's wire keys, so a serialized report decodes
/// back to an identical value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IssueReport {
    /// Opaque record identifier ("N/A" means no record)
    pub id: String,
    /// Backend-formatted display timestamp, never parsed
    pub timestamp: String,
    /// Structural/semantic findings
    #[serde(rename = "AST Issues")]
    pub ast_issues: Vec<String>,
    /// Formatting/convention findings
    #[serde(rename = "PEP8 Issues")]
    pub style_issues: Vec<String>,
    /// Free-text markdown commentary
    #[serde(rename = "Code Smells")]
    pub code_smells: String,
    /// Status message returned by the analyze endpoint
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Submitted source text, when the record endpoint echoes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IssueReport {
    /// True for the backend's "no record" placeholder
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }

    /// True when the report carries no findings at all
    pub fn is_empty(&self) -> bool {
        self.ast_issues.is_empty() && self.style_issues.is_empty() && self.code_smells.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.ast_issues.len() + self.style_issues.len()
    }

    pub fn severity(&self) -> SeverityTier {
        classify(self)
    }
}

/// A pre-aggregated (label, count) pair from the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyEntry {
    pub label: String,
    pub count: u64,
}

impl FrequencyEntry {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Per-category frequency lists returned by the common-issues endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonIssues {
    /// Most frequent AST findings, in backend order
    pub ast: Vec<FrequencyEntry>,
    /// Most frequent style findings, in backend order
    pub style: Vec<FrequencyEntry>,
}

impl CommonIssues {
    pub fn is_empty(&self) -> bool {
        self.ast.is_empty() && self.style.is_empty()
    }
}

/// One display-ready slice of a frequency chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSlice {
    /// Untruncated label for tooltips and detail views
    pub full_label: String,
    /// Label capped at 23 characters including the ellipsis
    pub display_label: String,
    pub value: u64,
    /// Index into [`frequency::PALETTE`]
    pub color_index: usize,
}

impl ChartSlice {
    /// Hex color for this slice
    pub fn color(&self) -> &'static str {
        frequency::palette_color(self.color_index)
    }
}
