use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    counter::{Outcome, record_view},
    error::AppError,
    state::AppState,
    utils::{MAX_PAYLOAD_BYTES, client_address, is_json, parse_view},
};

/// `true` when the view was counted, `false` when it was deduplicated. Status is 202 either way.
pub const VIEW_COUNTED_HEADER: &str = "x-view-counted";

pub async fn incr_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Outcome, AppError> {
    if request.method() != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    if !is_json(request.headers()) {
        return Err(AppError::UnsupportedContentType);
    }

    let address = client_address(
        request.headers(),
        request.extensions(),
        state.config.trust_proxy,
    );

    let body = to_bytes(request.into_body(), MAX_PAYLOAD_BYTES)
        .await
        .map_err(|_| AppError::UnreadableBody)?;
    let view = parse_view(&body)?;

    record_view(state.store.as_ref(), &view, address, state.config.dedup_ttl).await
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let counted = match self {
            Outcome::Counted => "true",
            Outcome::Deduplicated => "false",
        };

        (StatusCode::ACCEPTED, [(VIEW_COUNTED_HEADER, counted)]).into_response()
    }
}
