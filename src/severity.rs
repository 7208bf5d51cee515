//! Overall severity of a report, used to pick a highlight color

use crate::IssueReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ERROR_MARKER: &str = "error";
const WARNING_MARKER: &str = "warning";

/// Severity tier of a whole report. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Error,
    Warning,
    None,
}

impl SeverityTier {
    /// Background color the web UI used for this tier
    pub fn highlight(self) -> &'static str {
        match self {
            SeverityTier::Error => "lightcoral",
            SeverityTier::Warning => "lightyellow",
            SeverityTier::None => "transparent",
        }
    }

    /// Parse a `--fail-on` style threshold name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "error" => Some(SeverityTier::Error),
            "warning" => Some(SeverityTier::Warning),
            "none" => Some(SeverityTier::None),
            _ => None,
        }
    }

    fn rank(self) -> u8 {
        match self {
            SeverityTier::None => 0,
            SeverityTier::Warning => 1,
            SeverityTier::Error => 2,
        }
    }

    /// True when `self` is at least as severe as `threshold`
    pub fn reaches(self, threshold: SeverityTier) -> bool {
        self.rank() >= threshold.rank()
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityTier::Error => write!(f, "ERROR"),
            SeverityTier::Warning => write!(f, "WARNING"),
            SeverityTier::None => write!(f, "NONE"),
        }
    }
}

/// Classify a report: any "error" wins, then any "warning", else none.
/// Matching is a case-insensitive substring test over AST issues, then
/// style issues.
pub fn classify(report: &IssueReport) -> SeverityTier {
    tier_of(
        report
            .ast_issues
            .iter()
            .chain(report.style_issues.iter())
            .map(|issue| Some(issue.as_str())),
    )
}

/// Classify raw JSON issue elements. Non-string elements never match.
pub fn classify_values(ast_issues: &[Value], style_issues: &[Value]) -> SeverityTier {
    tier_of(ast_issues.iter().chain(style_issues).map(Value::as_str))
}

/// Tier of a single issue line
pub fn classify_issue(issue: &str) -> SeverityTier {
    tier_of(std::iter::once(Some(issue)))
}

fn tier_of<'a>(issues: impl Iterator<Item = Option<&'a str>>) -> SeverityTier {
    let mut tier = SeverityTier::None;
    for issue in issues.flatten() {
        let lowered = issue.to_lowercase();
        if lowered.contains(ERROR_MARKER) {
            return SeverityTier::Error;
        }
        if lowered.contains(WARNING_MARKER) {
            tier = SeverityTier::Warning;
        }
    }
    tier
}
