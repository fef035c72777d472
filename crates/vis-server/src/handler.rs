use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use vis_ledger::{LedgerResult, LedgerService, PrepareRequest, ResolveQuery, RollbackRequest};
use vis_types::RepoSummary;

use crate::badge;
use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";
const NO_CACHE: &str = "no-cache,max-age=0";

/// Body of `POST /api/v1/version/commit`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub tx_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RollbackResponse {
    pub removed: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

/// Run a ledger call on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, f: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce(&LedgerService) -> LedgerResult<T> + Send + 'static,
{
    let ledger = state.ledger.clone();
    let result = tokio::task::spawn_blocking(move || f(&*ledger))
        .await
        .map_err(|e| ServerError::Internal(format!("ledger task failed: {e}")))?;
    Ok(result?)
}

/// Readers get 404 for a blank repository rather than a validation error.
fn require_repo(query: &ResolveQuery) -> ServerResult<()> {
    if query.repo_id.trim().is_empty() {
        return Err(ServerError::NotFound);
    }
    Ok(())
}

/// `GET /api/v1/version`: SVG badge of the current value.
pub async fn badge_handler(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> ServerResult<Response> {
    require_repo(&query)?;
    let label = query.type_label();
    let value = run_blocking(&state, move |ledger| ledger.resolve_or_placeholder(&query)).await?;
    let svg = badge::render(&label, &value);
    Ok((
        [
            (header::CONTENT_TYPE, SVG_CONTENT_TYPE),
            (header::CACHE_CONTROL, NO_CACHE),
        ],
        svg,
    )
        .into_response())
}

/// `GET /api/v1/version/raw`: the current value as plain text.
pub async fn raw_handler(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> ServerResult<Response> {
    require_repo(&query)?;
    let value = run_blocking(&state, move |ledger| ledger.resolve_or_placeholder(&query)).await?;
    Ok(([(header::CACHE_CONTROL, NO_CACHE)], value).into_response())
}

/// `POST /api/v1/version/prepare`: returns the transaction id as text.
pub async fn prepare_handler(
    State(state): State<AppState>,
    Json(request): Json<PrepareRequest>,
) -> ServerResult<String> {
    let id = run_blocking(&state, move |ledger| ledger.prepare(&request)).await?;
    Ok(id.to_hex())
}

/// `POST /api/v1/version/commit`.
pub async fn commit_handler(
    State(state): State<AppState>,
    Json(request): Json<CommitRequest>,
) -> ServerResult<&'static str> {
    run_blocking(&state, move |ledger| ledger.commit_hex(&request.tx_id)).await?;
    Ok("OK")
}

/// `POST /api/v1/version/rollback`.
pub async fn rollback_handler(
    State(state): State<AppState>,
    Json(request): Json<RollbackRequest>,
) -> ServerResult<Json<RollbackResponse>> {
    let removed = run_blocking(&state, move |ledger| ledger.rollback(&request)).await?;
    Ok(Json(RollbackResponse { removed }))
}

/// `GET /api/v1/repos`.
pub async fn repos_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<RepoSummary>>> {
    let summaries = run_blocking(&state, |ledger| ledger.summaries()).await?;
    Ok(Json(summaries))
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "vis-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
