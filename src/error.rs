use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no such document {file}")]
    DocumentNotFound { file: String },

    #[error("key {key} invalid on {file}")]
    KeyNotFound { file: String, key: String },

    #[error("malformed JSON in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{file} does not hold a JSON object")]
    NotAnObject { file: String },

    #[error("invalid document name {file:?}")]
    InvalidName { file: String },

    #[error("audit log is closed")]
    AuditClosed,

    #[error("Parsing error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl StoreError {
    /// Maps a failed filesystem call on `file` to the store taxonomy.
    pub(crate) fn from_io(file: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::DocumentNotFound {
                file: file.to_string(),
            }
        } else {
            StoreError::IO(err)
        }
    }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::DocumentNotFound { .. } | StoreError::KeyNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            StoreError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            StoreError::Parse { .. } | StoreError::NotAnObject { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            StoreError::AuditClosed | StoreError::Serde(_) | StoreError::IO(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
