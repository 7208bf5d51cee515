//! Talking to the analysis service
//!
//! [`RequestOrchestrator`] owns one state machine per operation kind and
//! routes every response through the decoder. The HTTP layer sits behind
//! the [`Transport`] trait.

mod error;
pub mod operations;
pub mod orchestrator;
pub mod request;
pub mod transport;

pub use error::{ClientError, FailureKind};
pub use operations::{Analyze, CommonIssuesLookup, HistoryDump, HistoryLookup, Operation, RecordLookup};
pub use orchestrator::{
    OperationKind, PendingCall, RequestOrchestrator, RequestState, ResubmitPolicy, Settlement, Ticket,
};
pub use request::{
    AnalyzeInput, ClientConfig, CommonIssuesInput, Credentials, HistoryInput, RecordInput, Submission,
};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};
