//! Per-kind request lifecycle: Idle -> Pending -> Success | Failure
//!
//! Each operation kind has its own state and generation counter, so kinds
//! never interact. A request is two steps around its single suspension
//! point: [`RequestOrchestrator::begin`] validates and enters `Pending`, the
//! caller sends the prepared request, and [`RequestOrchestrator::settle`]
//! applies the outcome if the ticket is still current.

use super::error::ClientError;
use super::operations::Operation;
use super::request::{ClientConfig, Credentials};
use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::{CommonIssues, IssueReport};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Analyze,
    HistoryLookup,
    HistoryDump,
    CommonIssues,
    RecordLookup,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Analyze => write!(f, "analyze"),
            OperationKind::HistoryLookup => write!(f, "history lookup"),
            OperationKind::HistoryDump => write!(f, "history dump"),
            OperationKind::CommonIssues => write!(f, "common issues"),
            OperationKind::RecordLookup => write!(f, "record lookup"),
        }
    }
}

/// What to do when a request starts while another of the same kind is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResubmitPolicy {
    /// Last request wins; the stale response is dropped when it arrives
    #[default]
    Supersede,
    /// Refuse the new request until the pending one settles
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending,
    Success(T),
    Failure(ClientError),
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            RequestState::Success(output) => Some(output),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ClientError> {
        match self {
            RequestState::Failure(error) => Some(error),
            _ => None,
        }
    }
}

/// Identifies one `begin` so a late settlement can be recognized as stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: OperationKind,
    generation: u64,
}

impl Ticket {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

/// A request that has entered `Pending` and still has to be sent
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    /// The ticket was superseded; the outcome was dropped
    Discarded,
}

/// State of one operation kind
#[derive(Debug)]
pub struct Slot<T> {
    state: RequestState<T>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            generation: 0,
        }
    }
}

/// One slot per operation kind
#[derive(Debug, Default)]
pub struct Slots {
    pub(crate) analyze: Slot<IssueReport>,
    pub(crate) history: Slot<Vec<IssueReport>>,
    pub(crate) dump: Slot<Vec<IssueReport>>,
    pub(crate) common: Slot<CommonIssues>,
    pub(crate) record: Slot<IssueReport>,
}

/// Drives every operation kind against one transport
pub struct RequestOrchestrator<T> {
    transport: T,
    policy: ResubmitPolicy,
    slots: Slots,
}

impl<T: Transport> RequestOrchestrator<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: ResubmitPolicy::default(),
            slots: Slots::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResubmitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state<Op: Operation>(&self) -> &RequestState<Op::Output> {
        &Op::slot(&self.slots).state
    }

    /// Validate the input and enter `Pending`.
    ///
    /// Invalid input settles the kind as a failure without a network call,
    /// unless a request of this kind is still pending, which is left alone.
    pub fn begin<Op: Operation>(
        &mut self,
        config: &ClientConfig,
        input: &Op::Input,
    ) -> Result<PendingCall, ClientError> {
        let policy = self.policy;
        let slot = Op::slot_mut(&mut self.slots);

        if slot.state.is_pending() {
            match policy {
                ResubmitPolicy::Reject => {
                    tracing::debug!(kind = %Op::KIND, "rejecting resubmit while pending");
                    return Err(ClientError::Busy(Op::KIND));
                }
                ResubmitPolicy::Supersede => {
                    tracing::debug!(kind = %Op::KIND, "superseding pending request");
                }
            }
        }

        let request = match Op::validate(input).and_then(|()| Op::request(config, input)) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(kind = %Op::KIND, error = %err, "input rejected");
                if !slot.state.is_pending() {
                    slot.state = RequestState::Failure(err.clone());
                }
                return Err(err);
            }
        };

        slot.generation += 1;
        slot.state = RequestState::Pending;
        tracing::debug!(kind = %Op::KIND, method = %request.method, url = %request.url, "request pending");

        Ok(PendingCall {
            ticket: Ticket {
                kind: Op::KIND,
                generation: slot.generation,
            },
            request,
        })
    }

    /// Apply the outcome of a sent request, unless a newer request of the
    /// same kind has started since the ticket was issued.
    pub fn settle<Op: Operation>(
        &mut self,
        ticket: Ticket,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Settlement {
        let slot = Op::slot_mut(&mut self.slots);
        if ticket.kind != Op::KIND || ticket.generation != slot.generation || !slot.state.is_pending() {
            tracing::debug!(kind = %ticket.kind, "discarding stale response");
            return Settlement::Discarded;
        }

        slot.state = match interpret::<Op>(outcome) {
            Ok(output) => RequestState::Success(output),
            Err(err) => RequestState::Failure(err),
        };
        Settlement::Applied
    }

    /// Begin, send, and settle in one call
    pub fn run<Op: Operation>(
        &mut self,
        config: &ClientConfig,
        input: &Op::Input,
    ) -> Result<&Op::Output, ClientError> {
        let call = self.begin::<Op>(config, input)?;
        let outcome = self.transport.send(&call.request);
        self.settle::<Op>(call.ticket, outcome);

        match self.state::<Op>() {
            RequestState::Success(output) => Ok(output),
            RequestState::Failure(err) => Err(err.clone()),
            RequestState::Idle | RequestState::Pending => Err(ClientError::Transport(format!(
                "{} request did not settle",
                Op::KIND
            ))),
        }
    }

    /// Forward issue-tracker credentials to the service. Returns its message.
    pub fn update_credentials(
        &self,
        config: &ClientConfig,
        credentials: &Credentials,
    ) -> Result<String, ClientError> {
        credentials.validate()?;
        let body = serde_json::to_value(credentials)
            .map_err(|e| ClientError::Validation(format!("Cannot encode credentials: {}", e)))?;
        let request = config.post(&["update-env"], Some(body))?;
        let reply = self.exchange(&request)?;
        Ok(reply
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| reply.to_string()))
    }

    /// Probe the service's health endpoint
    pub fn health(&self, config: &ClientConfig) -> Result<Value, ClientError> {
        let request = config.get(&["health"])?;
        self.exchange(&request)
    }

    /// One request outside the per-kind state machines
    fn exchange(&self, request: &HttpRequest) -> Result<Value, ClientError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).map_err(|e| {
            tracing::warn!(url = %request.url, error = %e, "transport failure");
            ClientError::from(e)
        })?;
        check_status(&response)?;
        Ok(response.json())
    }
}

fn interpret<Op: Operation>(
    outcome: Result<HttpResponse, TransportError>,
) -> Result<Op::Output, ClientError> {
    let response = outcome.map_err(|e| {
        tracing::warn!(kind = %Op::KIND, error = %e, "transport failure");
        ClientError::from(e)
    })?;
    check_status(&response).map_err(|err| {
        tracing::warn!(kind = %Op::KIND, error = %err, "server failure");
        err
    })?;

    let result = Op::interpret(&response.json());
    match &result {
        Ok(_) => tracing::debug!(kind = %Op::KIND, "request succeeded"),
        Err(err) => tracing::debug!(kind = %Op::KIND, error = %err, "request failed"),
    }
    result
}

fn check_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ClientError::Server {
        status: response.status,
        message: error_detail(&response.body),
    })
}

/// Short error text from a failed response body
fn error_detail(body: &str) -> String {
    const MAX_DETAIL_CHARS: usize = 200;

    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").or_else(|| value.get("error")).cloned())
        .map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.trim().to_string());

    if detail.chars().count() > MAX_DETAIL_CHARS {
        let mut short: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
        short.push_str("...");
        short
    } else {
        detail
    }
}
