// ---------------------------------------------------------------------------
// Integration tests for the HTTP API
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aegis_scan_rs::actions::Actions;
use aegis_scan_rs::ai::{AiError, AiResult, GenerationRequest, ModelClient};
use aegis_scan_rs::history::{FileStorage, KeyValueStore, MemoryStorage, ScanHistory};
use aegis_scan_rs::probe::{ProbeError, ProbePolicy, ReachabilityProbe};
use aegis_scan_rs::server::{build_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use url::Url;

/// Answers by flow name so one stub serves every endpoint.
struct FlowModel {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ModelClient for FlowModel {
    fn name(&self) -> &str {
        "flow-stub"
    }

    fn model(&self) -> &str {
        "stub"
    }

    async fn generate(&self, request: &GenerationRequest) -> AiResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AiError::Timeout);
        }
        Ok(match request.name {
            "generateVulnerabilityReport" => json!({
                "vulnerabilities": [
                    { "name": "SQLi", "severity": "Critical", "description": "d", "remediation": "r" },
                    { "name": "XSS", "severity": "High", "description": "d", "remediation": "r" }
                ]
            }),
            "performPenTest" => json!({
                "executiveSummary": "summary",
                "attackNarrative": "narrative",
                "simulatedAttackVectors": []
            }),
            _ => json!({ "canAccessAuthenticatedAreas": false, "feedback": "no credentials supplied" }),
        })
    }
}

/// Probe stub returning a fixed HTTP status.
struct StatusProbe(u16);

#[async_trait]
impl ReachabilityProbe for StatusProbe {
    async fn probe(&self, _target: &Url) -> Result<(), ProbeError> {
        if (200..300).contains(&self.0) {
            Ok(())
        } else {
            Err(ProbeError::Status(self.0))
        }
    }
}

fn test_state(fail: bool, probe_status: u16) -> (AppState, Arc<FlowModel>) {
    let model = Arc::new(FlowModel {
        calls: AtomicUsize::new(0),
        fail,
    });
    let actions = Actions::new(model.clone(), Arc::new(StatusProbe(probe_status)), ProbePolicy::Always);
    let storage: Box<dyn KeyValueStore> = Box::new(MemoryStorage::new());
    (AppState::new(actions, storage), model)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn parse_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let (state, _) = test_state(false, 200);
    let app = build_router(state, "ui");
    let resp = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-store");
    assert_eq!(parse_json(resp.into_body()).await["status"], "ok");
}

#[tokio::test]
async fn scan_records_history_with_risk_score() {
    let (state, _) = test_state(false, 200);
    let app = build_router(state.clone(), "ui");

    let resp = app
        .clone()
        .oneshot(post_json("/api/scan", json!({ "url": "https://example.com" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = parse_json(resp.into_body()).await;
    assert_eq!(created["riskScore"], 17);
    assert_eq!(created["report"]["vulnerabilities"].as_array().unwrap().len(), 2);
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let rows = parse_json(resp.into_body()).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["id"], id.as_str());
    assert_eq!(rows[0]["targetUrl"], "https://example.com");
    assert_eq!(rows[0]["riskBand"], "Medium");

    let resp = app
        .oneshot(
            Request::get(format!("/api/history/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let item = parse_json(resp.into_body()).await;
    assert_eq!(item["riskScore"], 17);
    assert_eq!(item["report"]["vulnerabilities"][0]["severity"], "Critical");

    assert_eq!(state.history().lock().await.len(), 1);
}

#[tokio::test]
async fn scan_is_persisted_to_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(FlowModel {
        calls: AtomicUsize::new(0),
        fail: false,
    });
    let actions = Actions::new(model, Arc::new(StatusProbe(200)), ProbePolicy::Always);
    let storage: Box<dyn KeyValueStore> = Box::new(FileStorage::new(dir.path()));
    let app = build_router(AppState::new(actions, storage), "ui");

    let resp = app
        .oneshot(post_json("/api/scan", json!({ "url": "https://example.com" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let id = parse_json(resp.into_body()).await["id"].as_str().unwrap().to_string();

    let mut reopened = ScanHistory::new(FileStorage::new(dir.path()));
    let item = reopened.get_scan_by_id(&id).unwrap();
    assert_eq!(item.target_url, "https://example.com");
    assert_eq!(item.risk_score, 17);
}

#[tokio::test]
async fn invalid_url_is_bad_request_without_model_call() {
    let (state, model) = test_state(false, 200);
    let app = build_router(state.clone(), "ui");

    let resp = app
        .oneshot(post_json("/api/scan", json!({ "url": "example.com" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = parse_json(resp.into_body()).await;
    assert_eq!(body, json!({ "error": "Invalid URL. Please include http:// or https://" }));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert!(state.history().lock().await.is_empty());
}

#[tokio::test]
async fn malformed_body_is_bad_request_with_error_json() {
    let (state, model) = test_state(false, 200);
    let app = build_router(state.clone(), "ui");

    let resp = app
        .clone()
        .oneshot(post_json("/api/scan", json!({ "target": "https://example.com" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = parse_json(resp.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("url"));

    let resp = app
        .oneshot(
            Request::post("/api/pen-test")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = parse_json(resp.into_body()).await;
    assert!(body["error"].is_string());

    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert!(state.history().lock().await.is_empty());
}

#[tokio::test]
async fn model_failure_is_single_error_string() {
    let (state, _) = test_state(true, 200);
    let app = build_router(state.clone(), "ui");

    let resp = app
        .oneshot(post_json("/api/scan", json!({ "url": "https://example.com" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = parse_json(resp.into_body()).await;
    let msg = body["error"].as_str().unwrap();
    assert!(msg.starts_with("Failed to scan the URL."));
    assert!(body.get("report").is_none());
    assert!(state.history().lock().await.is_empty());
}

#[tokio::test]
async fn pen_test_unreachable_target_never_invokes_model() {
    let (state, model) = test_state(false, 404);
    let app = build_router(state, "ui");

    let resp = app
        .oneshot(post_json("/api/pen-test", json!({ "url": "https://example.com/missing" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = parse_json(resp.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("404"));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pen_test_success_is_not_recorded_in_history() {
    let (state, _) = test_state(false, 200);
    let app = build_router(state.clone(), "ui");

    let resp = app
        .oneshot(post_json("/api/pen-test", json!({ "url": "https://example.com" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = parse_json(resp.into_body()).await;
    assert_eq!(body["report"]["executiveSummary"], "summary");
    assert!(state.history().lock().await.is_empty());
}

#[tokio::test]
async fn auth_check_returns_report() {
    let (state, _) = test_state(false, 200);
    let app = build_router(state, "ui");

    let resp = app
        .oneshot(post_json("/api/auth-check", json!({ "url": "http://intranet.local" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = parse_json(resp.into_body()).await;
    assert_eq!(body["report"]["canAccessAuthenticatedAreas"], false);
}

#[tokio::test]
async fn unknown_history_id_is_not_found() {
    let (state, _) = test_state(false, 200);
    let app = build_router(state, "ui");

    let resp = app
        .oneshot(Request::get("/api/history/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = parse_json(resp.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("nope"));
}
