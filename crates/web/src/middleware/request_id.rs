//! Resolves/generates `X-Request-ID` (§5) and echoes it back on the
//! response, carrying the resolved id via request extensions so handlers
//! and the error path can log it alongside whatever they do.

use axum::{extract::State, http::HeaderValue, middleware::Next, response::Response};

use crate::AppState;

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(
    State(state): State<AppState>,
    mut req: axum::extract::Request,
    next: Next,
) -> Response {
    let supplied = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok());
    let resolved = transit_engine::request_id::resolve(supplied, state.request_id_max_len);

    req.extensions_mut().insert(RequestId(resolved.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&resolved) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
