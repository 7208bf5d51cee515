//! Config schema and deserialization

use crate::client::{ClientConfig, ResubmitPolicy};
use crate::client::request::{DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS};
use crate::frequency::DEFAULT_SLICE_LIMIT;
use crate::SeverityTier;
use serde::Deserialize;
use std::time::Duration;

/// Root config structure for .issuelensrc.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the analysis service. Default: http://localhost:8080
    #[serde(default)]
    pub server_url: Option<String>,

    /// Per-request timeout in seconds. Default: 30
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Username sent with analyze, history and common-issues requests
    #[serde(default)]
    pub user_name: Option<String>,

    /// Number of slices per frequency chart. Default: 5
    #[serde(default)]
    pub slice_limit: Option<usize>,

    /// What to do when a request of a pending kind is started again
    #[serde(default)]
    pub resubmit_policy: Option<ResubmitPolicy>,

    /// Exit 1 when an analyzed report is at least this severe
    #[serde(default)]
    pub fail_on: Option<SeverityTier>,
}

/// Values given on the command line; each one beats the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub server_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_name: Option<String>,
    pub slice_limit: Option<usize>,
    pub fail_on: Option<SeverityTier>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if cli.server_url.is_some() {
            self.server_url = cli.server_url;
        }
        if cli.timeout_secs.is_some() {
            self.timeout_secs = cli.timeout_secs;
        }
        if cli.user_name.is_some() {
            self.user_name = cli.user_name;
        }
        if cli.slice_limit.is_some() {
            self.slice_limit = cli.slice_limit;
        }
        if cli.fail_on.is_some() {
            self.fail_on = cli.fail_on;
        }
        self
    }

    /// Connection settings for one call
    pub fn client_config(&self) -> ClientConfig {
        let server_url = self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL);
        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        ClientConfig::new(server_url).with_timeout(timeout)
    }

    pub fn slice_limit(&self) -> usize {
        self.slice_limit.unwrap_or(DEFAULT_SLICE_LIMIT)
    }

    pub fn resubmit_policy(&self) -> ResubmitPolicy {
        self.resubmit_policy.unwrap_or_default()
    }
}
