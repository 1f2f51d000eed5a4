//! Errors raised while handling a request, and the boundary that turns them
//! into JSON responses.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

/// A step failed; no later step ran.
///
/// The original error is kept untouched so callers can downcast it.
#[derive(thiserror::Error, Debug)]
#[error("chain step {index} failed")]
pub struct ChainError {
    index: usize,
    #[source]
    source: anyhow::Error,
}

impl ChainError {
    pub(crate) fn new(index: usize, source: anyhow::Error) -> Self {
        ChainError { index, source }
    }

    /// Position of the failing step; the base handler is the last index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.source
    }

    pub fn into_error(self) -> anyhow::Error {
        self.source
    }
}

impl IntoResponse for ChainError {
    fn into_response(self) -> Response {
        into_response(&self.source)
    }
}

/// An error carrying the HTTP status it should be reported with.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

macro_rules! status {
    ($($(#[$m:meta])* $v:vis fn $n:ident = $status:expr;)+) => {
        $(
            $(#[$m])* $v fn $n(message: impl Into<String>) -> Self {
                Self::new($status, message)
            }
        )+
    };
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HttpError {
            status,
            message: message.into(),
        }
    }

    status! {
        pub fn bad_request = StatusCode::BAD_REQUEST;
        pub fn unauthorized = StatusCode::UNAUTHORIZED;
        pub fn forbidden = StatusCode::FORBIDDEN;
        pub fn not_found = StatusCode::NOT_FOUND;
        pub fn conflict = StatusCode::CONFLICT;
        pub fn internal = StatusCode::INTERNAL_SERVER_ERROR;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        into_response(&anyhow::Error::new(self))
    }
}

/// Names a failure for the `type` field of a 500 response.
///
/// Attach it as anyhow context; the innermost cause is left untouched:
///
/// ```
/// use anyhow::Context as _;
/// use monpress::ErrorKind;
///
/// let err = "x".parse::<u32>().context(ErrorKind("ConfigError")).unwrap_err();
/// assert_eq!(err.downcast_ref::<ErrorKind>(), Some(&ErrorKind("ConfigError")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: bool,
    date: DateTime<Utc>,
    message: String,
    error: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Maps a handler error to a JSON error response.
///
/// - [`HttpError`] keeps its own status and message
/// - `serde_json::Error` is a 400 validation failure
/// - anything else is a 500 whose message hides the cause; its `type` is the
///   attached [`ErrorKind`], or `"Error"` without one
pub fn into_response(err: &anyhow::Error) -> Response {
    let (status, message, kind) = if let Some(http) = err.downcast_ref::<HttpError>() {
        (http.status, http.message.clone(), "HttpError")
    } else if let Some(json) = err.downcast_ref::<serde_json::Error>() {
        (StatusCode::BAD_REQUEST, json.to_string(), "ValidationError")
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
            err.downcast_ref::<ErrorKind>().map_or("Error", |kind| kind.0),
        )
    };

    if status.is_server_error() {
        error!(error = ?err, "request failed");
    } else {
        warn!(status = status.as_u16(), error = %err, "request rejected");
    }

    let body = ErrorBody {
        status: false,
        date: Utc::now(),
        message,
        error: format!("{:#}", err),
        kind,
    };
    (status, Json(body)).into_response()
}
