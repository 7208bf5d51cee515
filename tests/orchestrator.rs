//! Request lifecycle against an in-memory transport

use issuelens::client::{
    Analyze, AnalyzeInput, ClientConfig, CommonIssuesInput, CommonIssuesLookup, HistoryDump,
    HistoryInput, HistoryLookup, HttpRequest, HttpResponse, Method, RecordInput, RecordLookup,
    RequestState, ResubmitPolicy, Settlement, Submission, Transport, TransportError,
};
use issuelens::{to_chart_slices, ClientError, FailureKind, RequestOrchestrator, SeverityTier};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;

/// Answers by URL and keeps every request it saw
#[derive(Default)]
struct MockService {
    routes: HashMap<String, HttpResponse>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl MockService {
    fn route(mut self, path: &str, status: u16, body: serde_json::Value) -> Self {
        self.routes.insert(
            format!("http://localhost:8080{}", path),
            HttpResponse::new(status, body.to_string()),
        );
        self
    }

    fn calls(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl Transport for MockService {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.borrow_mut().push(request.clone());
        self.routes
            .get(&request.url)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("connection refused: {}", request.url)))
    }
}

fn config() -> ClientConfig {
    ClientConfig::default()
}

#[test]
fn analyze_end_to_end() {
    let service = MockService::default().route(
        "/analyze",
        200,
        json!({
            "Status": "ok",
            "id": "r1",
            "AST Issues": ["Warning: unused import"],
            "PEP8 Issues": [],
            "Code Smells": ""
        }),
    );
    let mut orchestrator = RequestOrchestrator::new(&service);
    let input = AnalyzeInput {
        user_name: "alice".into(),
        file_name: "a.py".into(),
        submission: Submission::Upload {
            code: "def foo():\n    pass".into(),
        },
    };

    let report = orchestrator.run::<Analyze>(&config(), &input).unwrap();
    assert_eq!(report.id, "r1");
    assert_eq!(report.severity(), SeverityTier::Warning);
    assert!(report.style_issues.is_empty());
    assert_eq!(report.status.as_deref(), Some("ok"));

    let sent = service.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(
        sent[0].body,
        Some(json!({ "code": "def foo():\n    pass", "userName": "alice", "fileName": "a.py" }))
    );
}

#[test]
fn history_decodes_encoded_envelopes() {
    let envelope = json!({
        "AST Issues": ["Error: undefined name 'x'"],
        "PEP8 Issues": ["E501 line too long"],
        "Code Smells": "Deep nesting"
    })
    .to_string();
    let service = MockService::default().route(
        "/getresponse/",
        200,
        json!([
            { "timestamp": "2025-03-01 10:00", "id": 11, "code": "x", "report_response": envelope },
            { "timestamp": "2025-03-02 09:30", "id": 12, "code": "y", "report_response": "not json" }
        ]),
    );
    let mut orchestrator = RequestOrchestrator::new(&service);
    let input = HistoryInput {
        user_name: "alice".into(),
        file_name: "a.py".into(),
    };

    let reports = orchestrator.run::<HistoryLookup>(&config(), &input).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].id, "11");
    assert_eq!(reports[0].style_issues, vec!["E501 line too long"]);
    assert_eq!(reports[0].severity(), SeverityTier::Error);
    // Malformed envelope keeps its metadata and comes back empty
    assert_eq!(reports[1].id, "12");
    assert_eq!(reports[1].timestamp, "2025-03-02 09:30");
    assert!(reports[1].is_empty());
}

#[test]
fn encoded_history_body_keeps_encoded_envelopes() {
    let envelope = json!({ "AST Issues": ["Error: x"], "PEP8 Issues": [] }).to_string();
    let records = json!([{ "timestamp": "t", "id": 1, "code": "x", "report_response": envelope }]);
    let service = MockService::default().route("/getresponse/", 200, json!(records.to_string()));
    let mut orchestrator = RequestOrchestrator::new(&service);
    let input = HistoryInput {
        user_name: "alice".into(),
        file_name: "a.py".into(),
    };

    let reports = orchestrator.run::<HistoryLookup>(&config(), &input).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].ast_issues, vec!["Error: x"]);
    assert_eq!(reports[0].severity(), SeverityTier::Error);
}

#[test]
fn sentinel_only_history_is_not_found() {
    let service = MockService::default().route(
        "/getresponse/",
        200,
        json!([{ "timestamp": "N/A", "id": "N/A", "code": "N/A", "report_response": "N/A" }]),
    );
    let mut orchestrator = RequestOrchestrator::new(&service);
    let input = HistoryInput {
        user_name: "nobody".into(),
        file_name: "a.py".into(),
    };

    let err = orchestrator.run::<HistoryLookup>(&config(), &input).unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
    assert!(orchestrator.state::<HistoryLookup>().failure().is_some());
}

#[test]
fn dump_decodes_object_envelopes() {
    let service = MockService::default().route(
        "/responses",
        200,
        json!([
            { "timestamp": "t1", "id": 1, "code": "a", "report_response": { "AST Issues": [], "PEP8 Issues": ["W291"] } },
            { "timestamp": "t2", "id": 2, "code": "b", "report_response": { "AST Issues": "No AST issues found." } }
        ]),
    );
    let mut orchestrator = RequestOrchestrator::new(&service);

    let reports = orchestrator.run::<HistoryDump>(&config(), &()).unwrap();
    assert_eq!(reports[0].style_issues, vec!["W291"]);
    assert_eq!(reports[1].ast_issues, vec!["No AST issues found."]);
    assert_eq!(reports[1].code.as_deref(), Some("b"));
}

#[test]
fn record_lookup_returns_single_report() {
    let service = MockService::default().route(
        "/responses/7",
        200,
        json!({ "timestamp": "t", "id": 7, "code": "pass", "report_response": { "AST Issues": ["x"] } }),
    );
    let mut orchestrator = RequestOrchestrator::new(&service);

    let report = orchestrator
        .run::<RecordLookup>(&config(), &RecordInput { id: "7".into() })
        .unwrap();
    assert_eq!(report.id, "7");
    assert_eq!(report.ast_issues, vec!["x"]);
}

#[test]
fn common_issues_feed_chart_slices() {
    let service = MockService::default().route(
        "/common_issues/alice",
        200,
        json!({
            "common_AST_Issues": [["unused-variable-in-function", 9], ["bare-except", 4]],
            "common_PEP8_Issues": []
        }),
    );
    let mut orchestrator = RequestOrchestrator::new(&service);
    let input = CommonIssuesInput {
        user_name: "alice".into(),
    };

    let common = orchestrator.run::<CommonIssuesLookup>(&config(), &input).unwrap();
    let slices = to_chart_slices(&common.ast, 5);
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].display_label, "unused-variable-in-f...");
    assert_eq!(slices[0].full_label, "unused-variable-in-function");
    assert_eq!(slices[1].value, 4);
    assert_eq!(slices[1].color_index, 1);
    assert!(to_chart_slices(&common.style, 5).is_empty());
}

#[test]
fn validation_failure_makes_no_network_call() {
    let service = MockService::default();
    let mut orchestrator = RequestOrchestrator::new(&service);
    let input = HistoryInput {
        user_name: "alice".into(),
        file_name: " ".into(),
    };

    let err = orchestrator.run::<HistoryLookup>(&config(), &input).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(service.calls(), 0);
}

#[test]
fn transport_and_server_failures_are_distinct() {
    let service = MockService::default().route("/responses", 500, json!({ "detail": "db down" }));
    let mut orchestrator = RequestOrchestrator::new(&service);

    let err = orchestrator.run::<HistoryDump>(&config(), &()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Server);

    let input = CommonIssuesInput {
        user_name: "alice".into(),
    };
    let err = orchestrator.run::<CommonIssuesLookup>(&config(), &input).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(
        err.user_message(),
        "Unable to fetch results from the analysis service."
    );
}

#[test]
fn supersede_keeps_the_latest_request() {
    let service = MockService::default();
    let mut orchestrator = RequestOrchestrator::new(&service);

    let first = orchestrator.begin::<HistoryDump>(&config(), &()).unwrap();
    let second = orchestrator.begin::<HistoryDump>(&config(), &()).unwrap();

    let latest = HttpResponse::new(200, json!([{ "id": 2, "report_response": { "AST Issues": [] } }]).to_string());
    let stale = HttpResponse::new(200, json!([{ "id": 1, "report_response": { "AST Issues": [] } }]).to_string());

    assert_eq!(orchestrator.settle::<HistoryDump>(second.ticket, Ok(latest)), Settlement::Applied);
    assert_eq!(orchestrator.settle::<HistoryDump>(first.ticket, Ok(stale)), Settlement::Discarded);

    match orchestrator.state::<HistoryDump>() {
        RequestState::Success(reports) => assert_eq!(reports[0].id, "2"),
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn reject_policy_returns_busy() {
    let service = MockService::default();
    let mut orchestrator = RequestOrchestrator::new(&service).with_policy(ResubmitPolicy::Reject);

    let _pending = orchestrator.begin::<HistoryDump>(&config(), &()).unwrap();
    let err = orchestrator.begin::<HistoryDump>(&config(), &()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Busy);
    assert!(matches!(err, ClientError::Busy(_)));
    assert!(orchestrator.state::<HistoryDump>().is_pending());
}

#[test]
fn health_passes_body_through() {
    let service = MockService::default().route("/health", 200, json!({ "status": "ok" }));
    let orchestrator = RequestOrchestrator::new(&service);
    let status = orchestrator.health(&config()).unwrap();
    assert_eq!(status["status"], "ok");
}
