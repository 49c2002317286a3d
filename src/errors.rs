use crate::auth::AuthError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize collection `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored collection `{key}` is unreadable: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write store file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a single record operation. The messages are shown to the user
/// as-is.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecordError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        let status = match &err {
            RecordError::Invalid(_) => StatusCode::BAD_REQUEST,
            RecordError::Duplicate(_) => StatusCode::CONFLICT,
            RecordError::NotFound(_) => StatusCode::NOT_FOUND,
            RecordError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyFields => Self::bad_request(err.to_string()),
            AuthError::Store(inner) => Self::internal(inner),
            _ => Self::unauthorized(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
