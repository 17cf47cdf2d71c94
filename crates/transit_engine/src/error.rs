//! The error taxonomy the query-fusion engine surfaces to callers. Mirrors
//! the teacher's hand-rolled `RequestError` enum, but derives `Display`/
//! `Error`/`From` with `thiserror` rather than writing them out by hand.

use std::fmt::Debug;

use thiserror::Error;

/// A field-level validation failure, reported alongside `EngineError::Validation`.
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed request input: bad combined id, out-of-range query
    /// parameter, unparseable date. Maps to HTTP 400.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The requested entity does not exist. Maps to HTTP 404.
    #[error("not found")]
    NotFound,

    /// Caller presented no or an invalid API key. Maps to HTTP 401.
    #[error("unauthorized")]
    Unauthorized,

    /// Caller exceeded their allotted request rate. Carries the number of
    /// seconds to wait before retrying. Maps to HTTP 429.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The store or a downstream dependency could not serve the request at
    /// all (e.g. the schedule store connection pool is exhausted or the
    /// health check fails). Maps to HTTP 503.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A single-item lookup failed inside a batch operation that otherwise
    /// succeeded (see the arrivals engine's partial-success handling);
    /// logged but does not fail the batch. Maps to HTTP 500 if it escapes.
    #[error("transient failure: {0}")]
    Transient(String),

    /// An unexpected internal failure, not attributable to caller input.
    /// Maps to HTTP 500. The request id should accompany the log line this
    /// is recorded under so it can be correlated with the response.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}
