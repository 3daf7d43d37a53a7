//! Player-facing document routes.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::delivery::{
    cors_preflight, document_response, ConditionalHeaders, DeliveryError, DocumentKind,
    IndexPublisher,
};

use super::state::ServerState;

async fn get_index(
    State(publisher): State<IndexPublisher>,
    Path(device_key): Path<String>,
    method: Method,
    conditional: ConditionalHeaders,
    headers: HeaderMap,
) -> Result<Response, DeliveryError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let document = publisher.publish_index(user_agent, &device_key).await?;
    Ok(document_response(
        &method,
        &conditional,
        &document,
        DocumentKind::Index,
    ))
}

async fn get_task_schedule(
    State(publisher): State<IndexPublisher>,
    Path(device_key): Path<String>,
    method: Method,
    conditional: ConditionalHeaders,
) -> Result<Response, DeliveryError> {
    let document = publisher.task_schedule(&device_key)?;
    Ok(document_response(
        &method,
        &conditional,
        &document,
        DocumentKind::TaskSchedule,
    ))
}

async fn preflight() -> impl IntoResponse {
    cors_preflight()
}

pub fn make_index_routes(state: ServerState) -> Router {
    Router::new()
        .route(
            "/index/{device_key}",
            get(get_index).head(get_index).options(preflight),
        )
        .route(
            "/task-schedule/{device_key}",
            get(get_task_schedule)
                .head(get_task_schedule)
                .options(preflight),
        )
        .with_state(state)
}
