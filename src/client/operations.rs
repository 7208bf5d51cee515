//! The operation kinds the orchestrator drives
//!
//! Each operation knows how to validate its input, build its one HTTP
//! request, and interpret a successful response body.

use super::error::ClientError;
use super::orchestrator::{OperationKind, Slot, Slots};
use super::request::{AnalyzeInput, ClientConfig, CommonIssuesInput, HistoryInput, RecordInput};
use super::transport::HttpRequest;
use crate::decoder::{self, AST_ISSUES_KEY, STYLE_ISSUES_KEY};
use crate::{CommonIssues, IssueReport};
use serde_json::Value;

/// One request/response exchange with its own state machine
pub trait Operation {
    type Input;
    type Output;

    const KIND: OperationKind;

    /// Check preconditions before any network call
    fn validate(input: &Self::Input) -> Result<(), ClientError>;

    fn request(config: &ClientConfig, input: &Self::Input) -> Result<HttpRequest, ClientError>;

    /// Turn a successful response body into the operation's output
    fn interpret(body: &Value) -> Result<Self::Output, ClientError>;

    #[doc(hidden)]
    fn slot(slots: &Slots) -> &Slot<Self::Output>;

    #[doc(hidden)]
    fn slot_mut(slots: &mut Slots) -> &mut Slot<Self::Output>;
}

/// `POST /analyze`
pub struct Analyze;

/// `POST /getresponse/`
pub struct HistoryLookup;

/// `GET /responses`
pub struct HistoryDump;

/// `GET /common_issues/{username}`
pub struct CommonIssuesLookup;

/// `POST /responses/{id}`
pub struct RecordLookup;

impl Operation for Analyze {
    type Input = AnalyzeInput;
    type Output = IssueReport;

    const KIND: OperationKind = OperationKind::Analyze;

    fn validate(input: &AnalyzeInput) -> Result<(), ClientError> {
        input.validate()
    }

    fn request(config: &ClientConfig, input: &AnalyzeInput) -> Result<HttpRequest, ClientError> {
        let body = serde_json::to_value(input.body())
            .map_err(|e| ClientError::Validation(format!("Cannot encode request: {}", e)))?;
        config.post(&["analyze"], Some(body))
    }

    fn interpret(body: &Value) -> Result<IssueReport, ClientError> {
        // The service answers storage failures with 200 and {"error": ...}
        if let Some(message) = error_reply(body) {
            return Err(ClientError::Server {
                status: 200,
                message,
            });
        }
        Ok(decoder::decode(body))
    }

    fn slot(slots: &Slots) -> &Slot<IssueReport> {
        &slots.analyze
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<IssueReport> {
        &mut slots.analyze
    }
}

impl Operation for HistoryLookup {
    type Input = HistoryInput;
    type Output = Vec<IssueReport>;

    const KIND: OperationKind = OperationKind::HistoryLookup;

    fn validate(input: &HistoryInput) -> Result<(), ClientError> {
        input.validate()
    }

    fn request(config: &ClientConfig, input: &HistoryInput) -> Result<HttpRequest, ClientError> {
        let body = serde_json::to_value(input)
            .map_err(|e| ClientError::Validation(format!("Cannot encode request: {}", e)))?;
        config.post(&["getresponse", ""], Some(body))
    }

    fn interpret(body: &Value) -> Result<Vec<IssueReport>, ClientError> {
        found_records(body, "No logs found for the given Username and File Path.")
    }

    fn slot(slots: &Slots) -> &Slot<Vec<IssueReport>> {
        &slots.history
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<Vec<IssueReport>> {
        &mut slots.history
    }
}

impl Operation for HistoryDump {
    type Input = ();
    type Output = Vec<IssueReport>;

    const KIND: OperationKind = OperationKind::HistoryDump;

    fn validate(_input: &()) -> Result<(), ClientError> {
        Ok(())
    }

    fn request(config: &ClientConfig, _input: &()) -> Result<HttpRequest, ClientError> {
        config.get(&["responses"])
    }

    fn interpret(body: &Value) -> Result<Vec<IssueReport>, ClientError> {
        found_records(body, "No logs found.")
    }

    fn slot(slots: &Slots) -> &Slot<Vec<IssueReport>> {
        &slots.dump
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<Vec<IssueReport>> {
        &mut slots.dump
    }
}

impl Operation for CommonIssuesLookup {
    type Input = CommonIssuesInput;
    type Output = CommonIssues;

    const KIND: OperationKind = OperationKind::CommonIssues;

    fn validate(input: &CommonIssuesInput) -> Result<(), ClientError> {
        input.validate()
    }

    fn request(config: &ClientConfig, input: &CommonIssuesInput) -> Result<HttpRequest, ClientError> {
        config.get(&["common_issues", input.user_name.trim()])
    }

    fn interpret(body: &Value) -> Result<CommonIssues, ClientError> {
        Ok(decoder::decode_common_issues(body))
    }

    fn slot(slots: &Slots) -> &Slot<CommonIssues> {
        &slots.common
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<CommonIssues> {
        &mut slots.common
    }
}

impl Operation for RecordLookup {
    type Input = RecordInput;
    type Output = IssueReport;

    const KIND: OperationKind = OperationKind::RecordLookup;

    fn validate(input: &RecordInput) -> Result<(), ClientError> {
        input.validate()
    }

    fn request(config: &ClientConfig, input: &RecordInput) -> Result<HttpRequest, ClientError> {
        config.post(&["responses", input.id.trim()], None)
    }

    fn interpret(body: &Value) -> Result<IssueReport, ClientError> {
        found_records(body, "No record found with that id.")
            .map(|mut reports| reports.swap_remove(0))
    }

    fn slot(slots: &Slots) -> &Slot<IssueReport> {
        &slots.record
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<IssueReport> {
        &mut slots.record
    }
}

/// Decoded records minus sentinels; none left means not found
fn found_records(body: &Value, not_found: &str) -> Result<Vec<IssueReport>, ClientError> {
    let reports: Vec<IssueReport> = decoder::decode_records(body)
        .into_iter()
        .filter(|report| !report.is_sentinel())
        .collect();
    if reports.is_empty() {
        return Err(ClientError::NotFound(not_found.to_string()));
    }
    Ok(reports)
}

/// Message of an `{"error": ...}` reply that carries no report
fn error_reply(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    if object.contains_key(AST_ISSUES_KEY) || object.contains_key(STYLE_ISSUES_KEY) {
        return None;
    }
    match object.get("error")? {
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
