use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Shown when the backend cannot be reached or answers with something that
/// is not a usable envelope.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error";

/// Shown when the backend reports `success: false` without an `error` string.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Network failure, timeout, or malformed envelope.
    #[error("{0}")]
    Transport(String),

    /// Well-formed envelope with `success: false`.
    #[error("{0}")]
    Backend(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    pub fn connection() -> Self {
        ConsoleError::Transport(CONNECTION_ERROR_MESSAGE.to_string())
    }

    /// Builds a backend error from the envelope's optional `error` field.
    pub fn backend(message: Option<&str>) -> Self {
        match message.map(str::trim) {
            Some(m) if !m.is_empty() => ConsoleError::Backend(m.to_string()),
            _ => ConsoleError::Backend(UNKNOWN_ERROR_MESSAGE.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::Transport(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::Backend(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConsoleError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ConsoleError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ConsoleError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Same envelope shape the query backend uses for its own failures.
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
