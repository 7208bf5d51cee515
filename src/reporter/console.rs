//! Console reporter with colored output

use crate::frequency::{self, DEFAULT_SLICE_LIMIT};
use crate::{ChartSlice, CommonIssues, IssueReport, SeverityTier};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    slice_limit: usize,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            slice_limit: DEFAULT_SLICE_LIMIT,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Number of slices drawn per chart
    pub fn slice_limit(mut self, limit: usize) -> Self {
        self.slice_limit = limit;
        self
    }

    /// Print a single report
    pub fn report(&self, report: &IssueReport) {
        print!("{}", self.render_report(report));
    }

    /// Print a list of history records, one block each
    pub fn report_many(&self, reports: &[IssueReport]) {
        print!("{}", self.render_many(reports));
    }

    /// Print one line per report: id, severity, issue count
    pub fn report_quiet(&self, reports: &[IssueReport]) {
        for report in reports {
            println!("{}", self.render_quiet(report));
        }
    }

    /// Print the two frequency charts of a common-issues lookup
    pub fn report_common(&self, user_name: &str, common: &CommonIssues) {
        print!("{}", self.render_common(user_name, common));
    }

    pub fn render_report(&self, report: &IssueReport) -> String {
        let mut out = String::new();
        let tier = report.severity();

        let _ = writeln!(out);
        let title = if report.id.is_empty() {
            "Analysis Report".to_string()
        } else {
            format!("Analysis Report #{}", report.id)
        };
        let _ = writeln!(out, "{}", self.paint(title.bold()));
        if !report.timestamp.is_empty() {
            let _ = writeln!(out, "   {}", self.paint(report.timestamp.dimmed()));
        }
        if let Some(status) = &report.status {
            let _ = writeln!(out, "   Status: {}", status);
        }
        let _ = writeln!(out, "   Severity: {}", self.colorize_tier(tier));
        let _ = writeln!(out);

        self.render_issue_list(&mut out, "AST Issues", &report.ast_issues);
        self.render_issue_list(&mut out, "PEP8 Issues", &report.style_issues);

        let _ = writeln!(out, "   {}", self.paint("Code Smells:".bold()));
        if report.code_smells.trim().is_empty() {
            let _ = writeln!(out, "     {}", self.paint("No code smells reported.".dimmed()));
        } else {
            for line in report.code_smells.lines() {
                let _ = writeln!(out, "     {}", line);
            }
        }

        if self.verbose {
            if let Some(code) = &report.code {
                let _ = writeln!(out);
                let _ = writeln!(out, "   {}", self.paint("Submitted code:".bold()));
                for line in code.lines() {
                    let _ = writeln!(out, "     {}", self.paint(line.dimmed()));
                }
            }
        }
        out
    }

    pub fn render_many(&self, reports: &[IssueReport]) -> String {
        if reports.is_empty() {
            return "No logs found.\n".to_string();
        }
        let mut out = String::new();
        for report in reports {
            out.push_str(&self.render_report(report));
            let _ = writeln!(out, "{}", "─".repeat(60));
        }
        let _ = writeln!(out, "   {} record(s)", reports.len());
        out
    }

    pub fn render_quiet(&self, report: &IssueReport) -> String {
        format!(
            "{}: {} ({} issues)",
            if report.id.is_empty() { "-" } else { report.id.as_str() },
            self.colorize_tier(report.severity()),
            report.issue_count()
        )
    }

    pub fn render_common(&self, user_name: &str, common: &CommonIssues) -> String {
        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            self.paint(format!("Common issues for {}", user_name).bold())
        );
        let _ = writeln!(out);

        let ast = frequency::to_chart_slices(&common.ast, self.slice_limit);
        self.render_chart(&mut out, "Most Common AST Issues", "No common AST issues found.", &ast);
        let style = frequency::to_chart_slices(&common.style, self.slice_limit);
        self.render_chart(&mut out, "Most Common PEP8 Issues", "No common PEP8 issues found.", &style);
        out
    }

    fn render_issue_list(&self, out: &mut String, title: &str, issues: &[String]) {
        let _ = writeln!(
            out,
            "   {}",
            self.paint(format!("{} ({}):", title, issues.len()).bold())
        );
        if issues.is_empty() {
            let _ = writeln!(out, "     {}", self.paint(format!("No {} found.", title).dimmed()));
        }
        for issue in issues {
            let _ = writeln!(out, "     {} {}", self.issue_icon(issue), issue);
        }
        let _ = writeln!(out);
    }

    /// Horizontal bar chart; bar length is relative to the largest slice
    fn render_chart(&self, out: &mut String, title: &str, placeholder: &str, slices: &[ChartSlice]) {
        let _ = writeln!(out, "   {}", self.paint(title.bold()));
        if slices.is_empty() {
            let _ = writeln!(out, "     {}", self.paint(placeholder.dimmed()));
            let _ = writeln!(out);
            return;
        }

        let total = frequency::total_value(slices);
        let max = slices.iter().map(|s| s.value).max().unwrap_or(0);
        let label_width = slices
            .iter()
            .map(|s| s.display_label.chars().count())
            .max()
            .unwrap_or(0);

        for slice in slices {
            let filled = if max == 0 {
                0
            } else {
                ((slice.value as u128 * BAR_WIDTH as u128) / max as u128) as usize
            };
            let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
            let bar = if self.use_colors {
                let (r, g, b) = hex_rgb(slice.color());
                bar.truecolor(r, g, b).to_string()
            } else {
                bar
            };
            let share = if total == 0 {
                0.0
            } else {
                slice.value as f64 * 100.0 / total as f64
            };
            let _ = writeln!(
                out,
                "     {:<width$} {} {:>4} ({:>5.1}%)",
                slice.display_label,
                bar,
                slice.value,
                share,
                width = label_width
            );
            if self.verbose && slice.display_label != slice.full_label {
                let _ = writeln!(out, "       {} {}", self.paint("↳".dimmed()), slice.full_label);
            }
        }
        let _ = writeln!(out);
    }

    fn issue_icon(&self, issue: &str) -> String {
        let icon = match crate::severity::classify_issue(issue) {
            SeverityTier::Error => "✗".red(),
            SeverityTier::Warning => "⚠".yellow(),
            SeverityTier::None => "•".normal(),
        };
        self.paint(icon)
    }

    fn colorize_tier(&self, tier: SeverityTier) -> String {
        let s = tier.to_string();
        let colored = match tier {
            SeverityTier::Error => s.red().bold(),
            SeverityTier::Warning => s.yellow().bold(),
            SeverityTier::None => s.green(),
        };
        self.paint(colored)
    }

    fn paint(&self, s: ColoredString) -> String {
        if self.use_colors {
            s.to_string()
        } else {
            s.clear().to_string()
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// "#RRGGBB" to components; anything unparsable renders white
fn hex_rgb(hex: &str) -> (u8, u8, u8) {
    let digits = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(255)
    };
    (channel(0..2), channel(2..4), channel(4..6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrequencyEntry;

    fn make_report(ast: &[&str], style: &[&str]) -> IssueReport {
        IssueReport {
            id: "42".to_string(),
            timestamp: "2025-03-01 10:00".to_string(),
            ast_issues: ast.iter().map(|s| s.to_string()).collect(),
            style_issues: style.iter().map(|s| s.to_string()).collect(),
            code_smells: "Long function body".to_string(),
            status: None,
            code: None,
        }
    }

    #[test]
    fn test_report_shows_severity_and_issues() {
        let reporter = ConsoleReporter::new().without_colors();
        let out = reporter.render_report(&make_report(&["Error: undefined name x"], &["E501 line too long"]));
        assert!(out.contains("Analysis Report #42"));
        assert!(out.contains("Severity: ERROR"));
        assert!(out.contains("AST Issues (1):"));
        assert!(out.contains("undefined name x"));
        assert!(out.contains("Long function body"));
    }

    #[test]
    fn test_report_empty_categories_have_placeholders() {
        let reporter = ConsoleReporter::new().without_colors();
        let mut report = make_report(&[], &[]);
        report.code_smells.clear();
        let out = reporter.render_report(&report);
        assert!(out.contains("No AST Issues found."));
        assert!(out.contains("No PEP8 Issues found."));
        assert!(out.contains("No code smells reported."));
        assert!(out.contains("Severity: NONE"));
    }

    #[test]
    fn test_no_ansi_codes_without_colors() {
        let reporter = ConsoleReporter::new().without_colors();
        let out = reporter.render_report(&make_report(&["Warning: unused import"], &[]));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_quiet_line() {
        let reporter = ConsoleReporter::new().without_colors();
        let line = reporter.render_quiet(&make_report(&["Warning: shadowed"], &["W291"]));
        assert_eq!(line, "42: WARNING (2 issues)");
    }

    #[test]
    fn test_many_empty_is_placeholder() {
        let reporter = ConsoleReporter::new().without_colors();
        assert_eq!(reporter.render_many(&[]), "No logs found.\n");
    }

    #[test]
    fn test_common_chart_truncates_and_limits() {
        let common = CommonIssues {
            ast: vec![
                FrequencyEntry::new("unused-variable-in-function-scope", 6),
                FrequencyEntry::new("bare-except", 3),
                FrequencyEntry::new("shadowed-builtin", 1),
            ],
            style: vec![],
        };
        let reporter = ConsoleReporter::new().without_colors().slice_limit(2);
        let out = reporter.render_common("alice", &common);
        assert!(out.contains("Common issues for alice"));
        assert!(out.contains("unused-variable-in-f..."));
        assert!(out.contains("bare-except"));
        assert!(!out.contains("shadowed-builtin"));
        assert!(out.contains("66.7%"));
        assert!(out.contains("No common PEP8 issues found."));
    }

    #[test]
    fn test_common_chart_with_huge_counts() {
        let common = CommonIssues {
            ast: vec![FrequencyEntry::new("a", u64::MAX), FrequencyEntry::new("b", 1)],
            style: vec![],
        };
        let out = ConsoleReporter::new().without_colors().render_common("alice", &common);
        assert!(out.contains("100.0%"));
        assert!(out.contains("(  0.0%)"));
    }

    #[test]
    fn test_hex_rgb() {
        assert_eq!(hex_rgb("#0088FE"), (0x00, 0x88, 0xFE));
        assert_eq!(hex_rgb("#f07d70"), (0xf0, 0x7d, 0x70));
        assert_eq!(hex_rgb("bad"), (255, 255, 255));
    }
}
