use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path as UrlPath, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::{
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    actions::{ActionError, ActionOutcome, Actions},
    history::{KeyValueStore, ScanHistory},
    risk::RiskBand,
    types::{ScanHistoryItem, VulnerabilityReport},
};

pub type SharedHistory = Arc<Mutex<ScanHistory<Box<dyn KeyValueStore>>>>;

#[derive(Clone)]
pub struct AppState {
    actions: Actions,
    history: SharedHistory, // the only shared mutable resource
}

impl AppState {
    pub fn new(actions: Actions, storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            actions,
            history: Arc::new(Mutex::new(ScanHistory::new(storage))),
        }
    }

    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub url: String,
}

/// Successful scan: the report plus the history record it was stored as.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCreated {
    pub report: VulnerabilityReport,
    pub id: String,
    pub risk_score: u8,
}

/// One row of the history listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: String,
    pub target_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scan_date: OffsetDateTime,
    pub risk_score: u8,
    pub risk_band: RiskBand,
    pub vulnerability_count: usize,
}

impl From<&ScanHistoryItem> for HistoryRow {
    fn from(item: &ScanHistoryItem) -> Self {
        Self {
            id: item.id.clone(),
            target_url: item.target_url.clone(),
            scan_date: item.scan_date,
            risk_score: item.risk_score,
            risk_band: RiskBand::from_score(item.risk_score),
            vulnerability_count: item.report.vulnerabilities.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = match self {
            ActionError::InvalidUrl => StatusCode::BAD_REQUEST,
            ActionError::Unreachable(_) | ActionError::Model { .. } => StatusCode::BAD_GATEWAY,
        };
        let outcome: ActionOutcome<()> = Err(self).into();
        (status, Json(outcome)).into_response()
    }
}

/// Reject a malformed request body with the same `{ "error": ... }` shape as a failed action.
fn request_body(payload: Result<Json<TargetRequest>, JsonRejection>) -> Result<TargetRequest, Response> {
    match payload {
        Ok(Json(req)) => Ok(req),
        Err(rejection) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: format!("Invalid request body: {}", rejection.body_text()),
            }),
        )
            .into_response()),
    }
}

/// Build the API + static UI router.
pub fn build_router(state: AppState, ui_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/health", get(get_health))
        .route("/scan", post(post_scan))
        .route("/pen-test", post(post_pen_test))
        .route("/auth-check", post(post_auth_check))
        .route("/history", get(get_history))
        .route("/history/{id}", get(get_history_item))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state);

    let static_svc = ServeDir::new(ui_dir.as_ref()).append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(
    bind: &str,
    state: AppState,
    ui_dir: impl AsRef<Path>,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = build_router(state, ui_dir);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "serving UI and API");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("server shut down");
    Ok(())
}

async fn get_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn post_scan(
    State(app): State<AppState>,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    let report = match app.actions.perform_scan(&req.url).await {
        Ok(report) => report,
        Err(e) => return e.into_response(),
    };
    let item = ScanHistoryItem::from_report(&req.url, report.clone());
    let created = ScanCreated {
        report,
        id: item.id.clone(),
        risk_score: item.risk_score,
    };

    // add_scan writes the history file synchronously.
    let history = app.history.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || history.blocking_lock().add_scan(item)).await {
        error!(id = %created.id, error = %e, "history write task failed");
    }
    info!(id = %created.id, risk_score = created.risk_score, "scan recorded");
    Json(created).into_response()
}

async fn post_pen_test(
    State(app): State<AppState>,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    match app.actions.perform_pen_test(&req.url).await {
        Ok(report) => Json(ActionOutcome::Report { report }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn post_auth_check(
    State(app): State<AppState>,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    match app.actions.check_authentication(&req.url).await {
        Ok(report) => Json(ActionOutcome::Report { report }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_history(State(app): State<AppState>) -> impl IntoResponse {
    let items = app.history.lock().await.items();
    let rows: Vec<HistoryRow> = items.iter().map(HistoryRow::from).collect();
    Json(rows)
}

async fn get_history_item(
    State(app): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Response {
    match app.history.lock().await.get_scan_by_id(&id) {
        Some(item) => Json(item).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("scan report {id} not found"),
            }),
        )
            .into_response(),
    }
}
