//! HTTP gateway (Axum) in front of the fusion ranker.
//!
//! `POST /v1/search` takes `{"query": "..."}` and answers with ranked
//! `{offer, score}` rows. Every response, errors included, carries
//! [`SEARCH_STATUS_HEADER`].

pub mod error;
pub mod handler;
pub mod state;
pub mod status;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{SearchRequest, SearchResponse, search_handler};
pub use state::HandlerState;
pub use status::{
    NO_RESULTS_MESSAGE, SEARCH_STATUS_HEADER, SEARCH_STATUS_HEALTHY,
    SEARCH_STATUS_PENDING, SEARCH_STATUS_READY, SearchStatus,
};

use crate::embedding::QueryEmbedder;
use crate::vectordb::FacetSearchBackend;

pub fn create_router_with_state<E, B>(state: HandlerState<E, B>) -> Router
where
    E: QueryEmbedder + 'static,
    B: FacetSearchBackend + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/search", post(search_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub vectordb: &'static str,
    pub embedding: &'static str,
    pub embedder_mode: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        SEARCH_STATUS_HEADER,
        HeaderValue::from_static(SEARCH_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<E, B>(State(state): State<HandlerState<E, B>>) -> Response
where
    E: QueryEmbedder + 'static,
    B: FacetSearchBackend + 'static,
{
    let vectordb_status = if state.ranker.backend().is_ready().await {
        SEARCH_STATUS_READY
    } else {
        SEARCH_STATUS_PENDING
    };

    let stub_embedder = state.ranker.embedder().is_stub();
    let embedder_mode = if stub_embedder { "stub" } else { "real" };

    // Stub vectors only make sense against the in-memory backend.
    let embedding_status = if stub_embedder && !state.ranker.backend().is_mock() {
        SEARCH_STATUS_PENDING
    } else {
        SEARCH_STATUS_READY
    };

    let components = ComponentStatus {
        http: SEARCH_STATUS_READY,
        vectordb: vectordb_status,
        embedding: embedding_status,
        embedder_mode,
    };

    let is_ready = components.vectordb == SEARCH_STATUS_READY
        && components.embedding == SEARCH_STATUS_READY;

    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, SEARCH_STATUS_PENDING)
    };

    let mut headers = HeaderMap::new();
    headers.insert(SEARCH_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
