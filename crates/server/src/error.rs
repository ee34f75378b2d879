use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use reelvault_protocol::ErrorBody;
use reelvault_transfer::TransferError;

use crate::ServerError;

/// An error as seen by HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or invalid input.
    BadRequest(String),
    /// A merge found this chunk index absent; the client should resend it.
    MissingChunk(u32),
    /// The upload crossed the size ceiling.
    PayloadTooLarge(String),
    NotFound(&'static str),
    RangeNotSatisfiable { size: u64 },
    /// I/O or catalog fault; `error` carries the underlying cause.
    Internal { message: String, error: String },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, error: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            error: error.to_string(),
        }
    }

    /// Replaces the message of an internal fault, keeping its cause.
    pub fn context(self, message: impl Into<String>) -> Self {
        match self {
            Self::Internal { error, .. } => Self::Internal {
                message: message.into(),
                error,
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MissingChunk(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::MissingChunk { index } => Self::MissingChunk(index),
            TransferError::SizeExceeded { .. } => Self::PayloadTooLarge(e.to_string()),
            TransferError::InvalidIdentifier(_)
            | TransferError::InvalidName(_)
            | TransferError::InvalidChunkIndex(_)
            | TransferError::NoChunks
            | TransferError::Stream(_) => Self::BadRequest(e.to_string()),
            TransferError::Io(_) => Self::internal("Internal server error", e),
        }
    }
}

impl From<ServerError> for ApiError {
    fn from(e: ServerError) -> Self {
        match e {
            ServerError::Transfer(e) => e.into(),
            other => Self::internal("Internal server error", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::BadRequest(msg) => ErrorBody::new(msg.clone()),
            Self::MissingChunk(index) => ErrorBody {
                missing_chunk: Some(*index),
                ..ErrorBody::new(format!("Missing chunk {index}"))
            },
            Self::PayloadTooLarge(detail) => {
                ErrorBody::new("Upload exceeds the maximum file size").with_error(detail.clone())
            }
            Self::NotFound(msg) => ErrorBody::new(*msg),
            Self::RangeNotSatisfiable { .. } => ErrorBody::new("Requested range not satisfiable"),
            Self::Internal { message, error } => {
                tracing::error!(%status, error = %error, "{message}");
                ErrorBody::new(message.clone()).with_error(error.clone())
            }
        };

        let mut resp = (status, Json(body)).into_response();
        if let Self::RangeNotSatisfiable { size } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                resp.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        resp
    }
}
