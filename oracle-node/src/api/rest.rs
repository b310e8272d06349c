use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use oracle_common::{
    message::{AnswerQuery, MedianPush, MemberList, PushReply, SyncRequest},
    OracleError,
};
use oracle_p2p::PeerService;

use crate::node::{NodeStatus, OracleNode};

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<OracleNode>,
}

/// Maps node errors to HTTP: caller mistakes are 400, the rest 500.
pub struct ApiError(OracleError);

impl From<OracleError> for ApiError {
    fn from(e: OracleError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(OracleError::MalformedRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(OracleError::MalformedRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.0.to_string()).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sync", post(sync_api))
        .route("/answer", get(answer_api))
        .route("/median", post(median_api))
        .route("/status", get(status_api))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serves the peer API on `listener` until `shutdown` resolves.
pub async fn start_rest_api<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), OracleError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("🌐 Peer API listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Peer API on {} stopped", addr);
    Ok(())
}

async fn sync_api(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<MemberList>, ApiError> {
    let Json(request) = payload.inspect_err(|e| warn!("Rejected /sync body: {}", e))?;
    let members = state.node.on_sync(request.node).await?;
    Ok(Json(members))
}

async fn answer_api(
    State(state): State<AppState>,
    query: Result<Query<AnswerQuery>, QueryRejection>,
) -> Result<Json<f64>, ApiError> {
    let Query(query) = query?;
    let value = state.node.on_pull_answer(query.node).await?;
    Ok(Json(value))
}

async fn median_api(
    State(state): State<AppState>,
    payload: Result<Json<MedianPush>, JsonRejection>,
) -> Result<Json<PushReply>, ApiError> {
    let Json(push) = payload.inspect_err(|e| warn!("Rejected /median body: {}", e))?;
    let reply = state.node.on_push_median(push).await?;
    Ok(Json(reply))
}

async fn status_api(State(state): State<AppState>) -> Json<NodeStatus> {
    Json(state.node.status().await)
}
