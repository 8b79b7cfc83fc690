use super::*;
use async_trait::async_trait;
use axum::{body::Body, http::Request as HttpRequest};
use commands::{CommandHandler, IssueCreatedPayload, PullRequestCreatedPayload};
use hmac::{Hmac, Mac};
use pipeline::{MessageSinkError, NotificationError, SourceRepositoryError};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Mutex;
use std::time::Duration;
use tower::ServiceExt;

// ============================================================================
// Handler doubles
// ============================================================================

/// Records payloads and answers with the error produced by `fail`, if any.
struct RecordingHandler<P> {
    payloads: Mutex<Vec<P>>,
    fail: Option<fn() -> NotificationError>,
}

impl<P> RecordingHandler<P> {
    fn new() -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            fail: None,
        }
    }

    fn failing(fail: fn() -> NotificationError) -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            fail: Some(fail),
        }
    }

    fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl<P: Send + 'static> CommandHandler for RecordingHandler<P> {
    type Payload = P;

    async fn execute(&self, payload: P) -> Result<(), NotificationError> {
        self.payloads.lock().unwrap().push(payload);
        match self.fail {
            Some(fail) => Err(fail()),
            None => Ok(()),
        }
    }
}

struct Fixture {
    app: Router,
    issues: Arc<RecordingHandler<IssueCreatedPayload>>,
    pull_requests: Arc<RecordingHandler<PullRequestCreatedPayload>>,
}

fn fixture_with(
    issues: RecordingHandler<IssueCreatedPayload>,
    pull_requests: RecordingHandler<PullRequestCreatedPayload>,
    secret: Option<&str>,
) -> Fixture {
    let issues = Arc::new(issues);
    let pull_requests = Arc::new(pull_requests);
    let controller = EventController::new(issues.clone(), pull_requests.clone());
    let state = AppState::new(controller, secret.map(WebhookSecret::new));
    Fixture {
        app: create_router(state),
        issues,
        pull_requests,
    }
}

fn fixture() -> Fixture {
    fixture_with(RecordingHandler::new(), RecordingHandler::new(), None)
}

// ============================================================================
// Requests
// ============================================================================

fn issue_json(action: &str) -> Value {
    json!({
        "action": action,
        "issue": {
            "number": 42,
            "title": "Bug",
            "url": "https://api.github.com/repos/o/r/issues/42",
            "html_url": "https://github.com/o/r/issues/42",
            "labels": [{ "name": "bug" }]
        },
        "sender": {
            "login": "alice",
            "avatar_url": "https://a/alice",
            "html_url": "https://github.com/alice"
        }
    })
}

fn pull_request_json(action: &str) -> Value {
    json!({
        "action": action,
        "pull_request": {
            "number": 7,
            "title": "Add feature",
            "url": "https://api.github.com/repos/o/r/pulls/7",
            "html_url": "https://github.com/o/r/pull/7",
            "commits": 2,
            "head": { "ref": "feature/x" },
            "base": { "ref": "main" }
        },
        "sender": {
            "login": "bob",
            "avatar_url": "https://a/bob",
            "html_url": "https://github.com/bob"
        }
    })
}

fn post(path: &str, body: &Value) -> HttpRequest<Body> {
    post_raw(path, body.to_string().into_bytes(), None)
}

fn post_raw(path: &str, body: Vec<u8>, signature: Option<String>) -> HttpRequest<Body> {
    let mut builder = HttpRequest::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header(DELIVERY_HEADER, "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).unwrap()
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_health_reports_healthy() {
    let f = fixture();

    let response = f
        .app
        .oneshot(HttpRequest::get(HEALTH_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_opened_issue_is_dispatched_and_answers_empty_200() {
    let f = fixture();

    let response = f.app.oneshot(post(ISSUES_PATH, &issue_json("opened"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(f.issues.calls(), 1);
    assert_eq!(f.pull_requests.calls(), 0);
    let payloads = f.issues.payloads.lock().unwrap();
    assert_eq!(payloads[0].issue_url, "https://github.com/o/r/issues/42");
    assert_eq!(payloads[0].issue_labels, ["bug"]);
}

#[tokio::test]
async fn test_opened_pull_request_is_dispatched() {
    let f = fixture();

    let response = f
        .app
        .oneshot(post(PULL_REQUESTS_PATH, &pull_request_json("opened")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(f.pull_requests.calls(), 1);
    assert_eq!(f.issues.calls(), 0);
}

#[tokio::test]
async fn test_ignored_action_still_answers_200() {
    let f = fixture();

    let response = f.app.oneshot(post(ISSUES_PATH, &issue_json("closed"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(f.issues.calls(), 0);
}

#[tokio::test]
async fn test_get_on_event_route_is_method_not_allowed() {
    let f = fixture();

    let response = f
        .app
        .oneshot(HttpRequest::get(ISSUES_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// Body validation
// ============================================================================

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let f = fixture();

    let response = f
        .app
        .oneshot(post_raw(ISSUES_PATH, b"{not json".to_vec(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(f.issues.calls(), 0);
}

#[tokio::test]
async fn test_body_missing_required_fields_is_unprocessable() {
    let f = fixture();

    let response = f
        .app
        .oneshot(post(PULL_REQUESTS_PATH, &json!({ "action": "opened" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(f.pull_requests.calls(), 0);
}

// ============================================================================
// Failure mapping
// ============================================================================

#[tokio::test]
async fn test_rate_limited_delivery_is_service_unavailable_with_retry_after() {
    let f = fixture_with(
        RecordingHandler::failing(|| {
            NotificationError::Delivery(MessageSinkError::RateLimited {
                retry_after: Some(Duration::from_millis(1500)),
            })
        }),
        RecordingHandler::new(),
        None,
    );

    let response = f.app.oneshot(post(ISSUES_PATH, &issue_json("opened"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "2");
}

#[tokio::test]
async fn test_missing_pull_request_is_bad_gateway() {
    let f = fixture_with(
        RecordingHandler::new(),
        RecordingHandler::failing(|| {
            NotificationError::Enrichment(SourceRepositoryError::NotFound {
                resource: "/repos/o/r/pulls/7/commits".to_string(),
            })
        }),
        None,
    );

    let response = f
        .app
        .oneshot(post(PULL_REQUESTS_PATH, &pull_request_json("opened")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get("retry-after").is_none());
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], 502);
}

// ============================================================================
// Signature verification
// ============================================================================

mod signatures {
    use super::*;

    const SECRET: &str = "It's a Secret to Everybody";

    fn signed_fixture() -> Fixture {
        fixture_with(RecordingHandler::new(), RecordingHandler::new(), Some(SECRET))
    }

    #[tokio::test]
    async fn test_correctly_signed_request_is_accepted() {
        let f = signed_fixture();
        let body = issue_json("opened").to_string().into_bytes();
        let signature = sign(SECRET, &body);

        let response = f
            .app
            .oneshot(post_raw(ISSUES_PATH, body, Some(signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(f.issues.calls(), 1);
    }

    #[tokio::test]
    async fn test_unsigned_request_is_unauthorized() {
        let f = signed_fixture();

        let response = f.app.oneshot(post(ISSUES_PATH, &issue_json("opened"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(f.issues.calls(), 0);
    }

    #[tokio::test]
    async fn test_signature_from_other_secret_is_unauthorized() {
        let f = signed_fixture();
        let body = pull_request_json("opened").to_string().into_bytes();
        let signature = sign("wrong secret", &body);

        let response = f
            .app
            .oneshot(post_raw(PULL_REQUESTS_PATH, body, Some(signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(f.pull_requests.calls(), 0);
    }

    #[tokio::test]
    async fn test_health_does_not_require_signature() {
        let f = signed_fixture();

        let response = f
            .app
            .oneshot(HttpRequest::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
