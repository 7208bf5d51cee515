//! JSON reporter for machine-readable output

use crate::frequency::{self, DEFAULT_SLICE_LIMIT};
use crate::{ChartSlice, CommonIssues, IssueReport, SeverityTier};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
    slice_limit: usize,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self {
            pretty: false,
            slice_limit: DEFAULT_SLICE_LIMIT,
        }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn slice_limit(mut self, limit: usize) -> Self {
        self.slice_limit = limit;
        self
    }

    /// A report with its wire keys plus the derived severity
    pub fn report(&self, report: &IssueReport) -> String {
        self.encode(&JsonReport::from(report), "{}")
    }

    /// Reports as a JSON array
    pub fn report_many(&self, reports: &[IssueReport]) -> String {
        let reports: Vec<JsonReport<'_>> = reports.iter().map(JsonReport::from).collect();
        self.encode(&reports, "[]")
    }

    /// Both frequency charts as display-ready slices
    pub fn report_common(&self, user_name: &str, common: &CommonIssues) -> String {
        let ast = frequency::to_chart_slices(&common.ast, self.slice_limit);
        let style = frequency::to_chart_slices(&common.style, self.slice_limit);
        let output = JsonCommon {
            user_name,
            ast_total: frequency::total_value(&ast),
            style_total: frequency::total_value(&style),
            ast,
            style,
        };
        self.encode(&output, "{}")
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|_| fallback.to_string())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a IssueReport,
    severity: SeverityTier,
    highlight: &'static str,
}

impl<'a> From<&'a IssueReport> for JsonReport<'a> {
    fn from(report: &'a IssueReport) -> Self {
        let severity = report.severity();
        Self {
            report,
            severity,
            highlight: severity.highlight(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonCommon<'a> {
    user_name: &'a str,
    ast: Vec<ChartSlice>,
    ast_total: u64,
    style: Vec<ChartSlice>,
    style_total: u64,
}
