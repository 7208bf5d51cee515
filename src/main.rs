//! issuelens: command-line client for the Python code analysis service

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use issuelens::client::{
    Analyze, AnalyzeInput, CommonIssuesInput, CommonIssuesLookup, Credentials, HistoryDump,
    HistoryInput, HistoryLookup, RecordInput, RecordLookup, ReqwestTransport, Submission,
};
use issuelens::config::{load_config, CliOverrides, Config, CONFIG_FILENAME};
use issuelens::reporter::{ConsoleReporter, JsonReporter};
use issuelens::{ClientError, FailureKind, IssueReport, RequestOrchestrator, SeverityTier};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// issuelens: submit Python code for analysis and browse past reports
#[derive(Parser, Debug)]
#[command(name = "issuelens")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Analysis service URL (default: http://localhost:8080)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Path to config file (default: search .issuelensrc.json in current dir and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (default: 30)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Username sent with requests
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Output format as JSON
    #[arg(long, short, global = true)]
    json: bool,

    /// Quiet mode (one line per report)
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Verbose output and debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a Python file, or name a path on the server, and analyze it
    Analyze {
        /// Local file to upload
        file: Option<PathBuf>,

        /// Path the service reads itself; nothing is uploaded
        #[arg(long)]
        path: Option<String>,

        /// Name recorded with an upload (default: the file's name)
        #[arg(long)]
        name: Option<String>,

        /// Exit 1 when the report is at least this severe (error, warning)
        #[arg(long, value_name = "TIER", value_parser = parse_tier)]
        fail_on: Option<SeverityTier>,
    },

    /// Show past reports for a user and file path
    History {
        /// File path the reports were recorded under
        file: String,
    },

    /// Show every stored report, newest first
    Dump,

    /// Show one stored report by id
    Record {
        id: String,
    },

    /// Chart the most frequent issues of a user
    Common {
        /// Number of slices per chart (default: 5)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Send issue-tracker credentials to the service
    Credentials {
        #[arg(long)]
        jira_server: Option<String>,

        #[arg(long)]
        jira_email: Option<String>,

        #[arg(long)]
        jira_api_token: Option<String>,

        #[arg(long)]
        issue_key: Option<String>,
    },

    /// Check that the service is reachable
    Health,

    /// Create .issuelensrc.json with sensible defaults
    Init {
        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }
    init_logging(args.verbose);

    if let Commands::Init { dir } = &args.command {
        return run_init(args.server.as_deref(), args.user.as_deref(), dir.as_deref());
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let overrides = CliOverrides {
        server_url: args.server.clone(),
        timeout_secs: args.timeout,
        user_name: args.user.clone(),
        slice_limit: match &args.command {
            Commands::Common { limit, .. } => *limit,
            _ => None,
        },
        fail_on: match &args.command {
            Commands::Analyze { fail_on, .. } => *fail_on,
            _ => None,
        },
    };
    let config = load_config(&cwd, args.config.as_deref())?.merge_with_cli(overrides);
    tracing::debug!(?config, "effective config");

    let transport = ReqwestTransport::new()?;
    let mut orchestrator =
        RequestOrchestrator::new(transport).with_policy(config.resubmit_policy());
    let client = config.client_config();
    let output = Output::new(&args, &config);
    let user_name = config.user_name.clone().unwrap_or_default();

    match args.command {
        Commands::Analyze { file, path, name, .. } => {
            let code = match &file {
                Some(file) => Some(
                    fs::read_to_string(file)
                        .with_context(|| format!("Failed to read {}", file.display()))?,
                ),
                None => None,
            };
            let submission = match Submission::from_parts(code, path) {
                Ok(submission) => submission,
                Err(err) => return Ok(fail(&err)),
            };
            let file_name = name
                .or_else(|| {
                    file.as_deref()
                        .and_then(Path::file_name)
                        .map(|n| n.to_string_lossy().into_owned())
                })
                .unwrap_or_default();
            let input = AnalyzeInput {
                user_name,
                file_name,
                submission,
            };

            match orchestrator.run::<Analyze>(&client, &input) {
                Ok(report) => {
                    output.report(report);
                    Ok(severity_exit(report, config.fail_on))
                }
                Err(err) => Ok(fail(&err)),
            }
        }
        Commands::History { file } => {
            let input = HistoryInput {
                user_name,
                file_name: file,
            };
            match orchestrator.run::<HistoryLookup>(&client, &input) {
                Ok(reports) => {
                    output.report_many(reports);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(fail(&err)),
            }
        }
        Commands::Dump => match orchestrator.run::<HistoryDump>(&client, &()) {
            Ok(reports) => {
                let newest_first: Vec<IssueReport> = reports.iter().rev().cloned().collect();
                output.report_many(&newest_first);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(&err)),
        },
        Commands::Record { id } => match orchestrator.run::<RecordLookup>(&client, &RecordInput { id }) {
            Ok(report) => {
                output.report(report);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(&err)),
        },
        Commands::Common { .. } => {
            let input = CommonIssuesInput {
                user_name: user_name.clone(),
            };
            match orchestrator.run::<CommonIssuesLookup>(&client, &input) {
                Ok(common) => {
                    if args.json {
                        println!("{}", output.json.report_common(&user_name, common));
                    } else {
                        output.console.report_common(&user_name, common);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(fail(&err)),
            }
        }
        Commands::Credentials {
            jira_server,
            jira_email,
            jira_api_token,
            issue_key,
        } => {
            let credentials = Credentials {
                jira_server: jira_server.unwrap_or_default(),
                jira_email: jira_email.unwrap_or_default(),
                jira_api_token: jira_api_token.unwrap_or_default(),
                issue_key: issue_key.unwrap_or_default(),
            };
            match orchestrator.update_credentials(&client, &credentials) {
                Ok(message) => {
                    if args.json {
                        println!("{}", serde_json::json!({ "message": message }));
                    } else {
                        println!("{} {}", "✓".green(), message);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(fail(&err)),
            }
        }
        Commands::Health => match orchestrator.health(&client) {
            Ok(status) => {
                if args.json {
                    println!("{}", status);
                } else {
                    let detail = status
                        .get("status")
                        .and_then(|s| s.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| status.to_string());
                    println!("{} {} is up ({})", "✓".green(), client.server_url, detail);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(&err)),
        },
        Commands::Init { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "issuelens=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_tier(value: &str) -> Result<SeverityTier, String> {
    match SeverityTier::from_name(value) {
        Some(SeverityTier::None) | None => Err(format!(
            "unknown severity {:?} (expected error or warning)",
            value
        )),
        Some(tier) => Ok(tier),
    }
}

/// Print a failed request and pick its exit code
fn fail(err: &ClientError) -> ExitCode {
    eprintln!("{}: {}", "Error".red().bold(), err.user_message());
    match err.kind() {
        FailureKind::NotFound => ExitCode::from(1),
        _ => ExitCode::from(2),
    }
}

fn severity_exit(report: &IssueReport, fail_on: Option<SeverityTier>) -> ExitCode {
    match fail_on {
        Some(threshold) if threshold != SeverityTier::None && report.severity().reaches(threshold) => {
            ExitCode::from(1)
        }
        _ => ExitCode::SUCCESS,
    }
}

/// Routes reports to the console or JSON reporter per the global flags
struct Output {
    console: ConsoleReporter,
    json: JsonReporter,
    as_json: bool,
    quiet: bool,
}

impl Output {
    fn new(args: &Args, config: &Config) -> Self {
        let mut console = ConsoleReporter::new().slice_limit(config.slice_limit());
        if args.no_color {
            console = console.without_colors();
        }
        if args.verbose {
            console = console.verbose();
        }
        Self {
            console,
            json: JsonReporter::new().pretty().slice_limit(config.slice_limit()),
            as_json: args.json,
            quiet: args.quiet,
        }
    }

    fn report(&self, report: &IssueReport) {
        if self.as_json {
            println!("{}", self.json.report(report));
        } else if self.quiet {
            self.console.report_quiet(std::slice::from_ref(report));
        } else {
            self.console.report(report);
        }
    }

    fn report_many(&self, reports: &[IssueReport]) {
        if self.as_json {
            println!("{}", self.json.report_many(reports));
        } else if self.quiet {
            self.console.report_quiet(reports);
        } else {
            self.console.report_many(reports);
        }
    }
}

fn run_init(server: Option<&str>, user: Option<&str>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let mut starter = serde_json::json!({
        "serverUrl": server.unwrap_or(issuelens::client::request::DEFAULT_SERVER_URL),
        "timeoutSecs": issuelens::client::request::DEFAULT_TIMEOUT_SECS,
        "sliceLimit": issuelens::DEFAULT_SLICE_LIMIT,
        "resubmitPolicy": "supersede",
    });
    if let Some(user) = user {
        starter["userName"] = serde_json::Value::from(user);
    }
    let json = serde_json::to_string_pretty(&starter).context("Failed to encode config")?;

    fs::write(&config_path, json + "\n")
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("{} Created {}", "✓".green(), config_path.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(ast: &[&str]) -> IssueReport {
        IssueReport {
            id: "r1".to_string(),
            ast_issues: ast.iter().map(|s| s.to_string()).collect(),
            ..IssueReport::default()
        }
    }

    #[test]
    fn test_fail_on_reached_exits_1() {
        let report = report_with(&["Error: undefined name"]);
        assert_eq!(severity_exit(&report, Some(SeverityTier::Warning)), ExitCode::from(1));
        assert_eq!(severity_exit(&report, Some(SeverityTier::Error)), ExitCode::from(1));
    }

    #[test]
    fn test_fail_on_not_reached_succeeds() {
        let report = report_with(&["Warning: unused import"]);
        assert_eq!(severity_exit(&report, Some(SeverityTier::Error)), ExitCode::SUCCESS);
        assert_eq!(severity_exit(&report_with(&[]), Some(SeverityTier::Warning)), ExitCode::SUCCESS);
    }

    #[test]
    fn test_no_threshold_succeeds() {
        let report = report_with(&["Error: x"]);
        assert_eq!(severity_exit(&report, None), ExitCode::SUCCESS);
        assert_eq!(severity_exit(&report, Some(SeverityTier::None)), ExitCode::SUCCESS);
    }

    #[test]
    fn test_not_found_exits_1() {
        let err = ClientError::NotFound("No history found.".to_string());
        assert_eq!(fail(&err), ExitCode::from(1));
    }

    #[test]
    fn test_other_failures_exit_2() {
        let errors = [
            ClientError::Validation("Please enter a username.".to_string()),
            ClientError::Transport("connection refused".to_string()),
            ClientError::Server {
                status: 500,
                message: "db down".to_string(),
            },
        ];
        for err in &errors {
            assert_eq!(fail(err), ExitCode::from(2), "{:?}", err);
        }
    }
}
