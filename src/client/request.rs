//! Request inputs and the per-call client configuration

use super::error::ClientError;
use super::transport::{HttpRequest, Method};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings, passed into every call. Nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of an endpoint below the server URL. Segments are percent-encoded;
    /// an empty final segment produces a trailing slash.
    pub fn endpoint(&self, segments: &[&str]) -> Result<String, ClientError> {
        let mut url = reqwest::Url::parse(&self.server_url).map_err(|e| {
            ClientError::Validation(format!("Invalid server URL {:?}: {}", self.server_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Validation(format!("Server URL {:?} cannot take a path", self.server_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    pub(crate) fn get(&self, segments: &[&str]) -> Result<HttpRequest, ClientError> {
        Ok(HttpRequest {
            method: Method::Get,
            url: self.endpoint(segments)?,
            body: None,
            timeout: self.timeout,
        })
    }

    pub(crate) fn post(&self, segments: &[&str], body: Option<Value>) -> Result<HttpRequest, ClientError> {
        Ok(HttpRequest {
            method: Method::Post,
            url: self.endpoint(segments)?,
            body,
            timeout: self.timeout,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

/// How the analyzed code reaches the service. Exactly one mode per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// File text read on the client and sent in the body
    Upload { code: String },
    /// Path the service resolves itself; no code is sent
    Path { path: String },
}

impl Submission {
    /// Build from optional parts, rejecting both-or-neither
    pub fn from_parts(code: Option<String>, path: Option<String>) -> Result<Self, ClientError> {
        match (code, path) {
            (Some(code), None) => Ok(Submission::Upload { code }),
            (None, Some(path)) => Ok(Submission::Path { path }),
            (Some(_), Some(_)) => Err(ClientError::Validation(
                "Provide either file content or a file path, not both.".to_string(),
            )),
            (None, None) => Err(ClientError::Validation(
                "Provide file content or a file path to analyze.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeInput {
    pub user_name: String,
    /// Name recorded with the submission; in path mode the path is used
    pub file_name: String,
    pub submission: Submission,
}

impl AnalyzeInput {
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        match &self.submission {
            Submission::Upload { code } if code.trim().is_empty() => Err(ClientError::Validation(
                "The selected file is empty.".to_string(),
            )),
            Submission::Path { path } if path.trim().is_empty() => Err(ClientError::Validation(
                "Please enter a file path.".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn body(&self) -> AnalyzeBody<'_> {
        match &self.submission {
            Submission::Upload { code } => AnalyzeBody {
                code: Some(code),
                user_name: &self.user_name,
                file_name: &self.file_name,
            },
            Submission::Path { path } => AnalyzeBody {
                code: None,
                user_name: &self.user_name,
                file_name: path,
            },
        }
    }
}

/// Wire body of `POST /analyze`; `code` is sent as `null` in path mode
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeBody<'a> {
    pub code: Option<&'a str>,
    pub user_name: &'a str,
    pub file_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInput {
    pub user_name: String,
    pub file_name: String,
}

impl HistoryInput {
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.user_name.trim().is_empty() || self.file_name.trim().is_empty() {
            return Err(ClientError::Validation(
                "Please enter both Username and File Path.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonIssuesInput {
    pub user_name: String,
}

impl CommonIssuesInput {
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.user_name.trim().is_empty() {
            return Err(ClientError::Validation("Please enter a username.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    pub id: String,
}

impl RecordInput {
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.id.trim().is_empty() {
            return Err(ClientError::Validation("Please enter a record id.".to_string()));
        }
        Ok(())
    }
}

/// Issue-tracker credentials forwarded to `POST /update-env`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub jira_server: String,
    pub jira_email: String,
    pub jira_api_token: String,
    pub issue_key: String,
}

impl Credentials {
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        let missing: Vec<&str> = [
            ("server", &self.jira_server),
            ("email", &self.jira_email),
            ("API token", &self.jira_api_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(format!(
                "Missing credentials: {}",
                missing.join(", ")
            )))
        }
    }
}
