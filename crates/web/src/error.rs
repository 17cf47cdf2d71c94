//! Generalizes the teacher's `web::common::RouteErrorResponse` from a
//! single `NotFound`/`Other` split into the full §7 error taxonomy,
//! rendering each variant into the envelope shape of §6 plus the status
//! code and headers §7 calls for.

use std::collections::HashMap;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use transit_engine::error::EngineError;

use crate::envelope::{VERSION_OK, VERSION_UNAUTHORIZED};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    code: u16,
    text: String,
    version: u8,
    current_time: i64,
    data: ErrorData,
}

/// An error translated into the envelope's `{code,text,version,data}`
/// shape. `current_time_millis` is threaded in explicitly by the caller
/// (sourced from the same `Clock` the successful path uses) rather than
/// read from the wall clock here, so a test pinning a `MockClock` sees a
/// consistent `currentTime` on both the happy and error paths.
pub struct ApiError {
    status: StatusCode,
    text: String,
    version: u8,
    current_time_millis: i64,
    field_errors: Option<HashMap<String, Vec<String>>>,
    retry_after_secs: Option<u64>,
    rate_limit_limit: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, text: impl Into<String>, current_time_millis: i64) -> Self {
        Self {
            status,
            text: text.into(),
            version: VERSION_OK,
            current_time_millis,
            field_errors: None,
            retry_after_secs: None,
            rate_limit_limit: None,
        }
    }

    pub fn unauthorized(current_time_millis: i64) -> Self {
        Self {
            version: VERSION_UNAUTHORIZED,
            ..Self::new(StatusCode::UNAUTHORIZED, "permission denied", current_time_millis)
        }
    }

    pub fn rate_limited(current_time_millis: i64, retry_after_secs: u64, limit_per_minute: u64) -> Self {
        Self {
            retry_after_secs: Some(retry_after_secs),
            rate_limit_limit: Some(limit_per_minute),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded, please slow down",
                current_time_millis,
            )
        }
    }

    pub fn from_engine_error(error: EngineError, current_time_millis: i64) -> Self {
        match error {
            EngineError::Validation(field_errors) => {
                let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
                for field_error in field_errors {
                    grouped.entry(field_error.field).or_default().push(field_error.message);
                }
                Self {
                    field_errors: Some(grouped),
                    ..Self::new(StatusCode::BAD_REQUEST, "validation failed", current_time_millis)
                }
            }
            EngineError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "resource not found", current_time_millis)
            }
            EngineError::Unauthorized => Self::unauthorized(current_time_millis),
            EngineError::RateLimited { retry_after_secs } => Self {
                retry_after_secs: Some(retry_after_secs),
                ..Self::new(
                    StatusCode::TOO_MANY_REQUESTS,
                    "rate limit exceeded, please slow down",
                    current_time_millis,
                )
            },
            // §7: the schedule store being unavailable is a 503 only from
            // the health endpoint's own handler; everywhere else it is a
            // plain 500, same as any other internal failure.
            EngineError::Unavailable(reason) => {
                tracing::error!(reason, "schedule store unavailable");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error", current_time_millis)
            }
            EngineError::Transient(reason) => {
                tracing::warn!(reason, "transient failure reached the web layer");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error", current_time_millis)
            }
            EngineError::Internal(reason) => {
                tracing::error!(reason, "internal error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error", current_time_millis)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            code: self.status.as_u16(),
            text: self.text,
            version: self.version,
            current_time: self.current_time_millis,
            data: ErrorData {
                field_errors: self.field_errors,
            },
        };

        let mut response = (self.status, Json(body)).into_response();
        response
            .headers_mut()
            .insert("cache-control", HeaderValue::from_static("no-cache, no-store, must-revalidate"));

        if let Some(retry_after) = self.retry_after_secs {
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                headers.insert("retry-after", value);
            }
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        }

        if let Some(limit) = self.rate_limit_limit {
            if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
                response.headers_mut().insert("x-ratelimit-limit", value);
            }
        }

        response
    }
}
