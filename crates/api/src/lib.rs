//! Arcadia backend API façade.
//!
//! This crate defines the trait the console and CLI depend on, the HTTP transport
//! that talks to the REST backend, and an in-memory mock for tests.

#![forbid(unsafe_code)]

use arcadia_codec::Payload;
use arcadia_core::{Record, RecordId, ResourceKind};
use serde::{Deserialize, Serialize};

mod http;
mod mock;

pub use http::HttpApi;
pub use mock::{ApiCall, MockApi};

/// Backend errors, reduced to what the console shows or branches on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ApiError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("decode: {0}")]
    Decode(String),
    #[error("not_found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Text shown to the operator; backend messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::NotFound(m) | ApiError::Transport(m) => m.clone(),
            ApiError::Decode(m) => format!("unexpected response: {m}"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// REST surface of the backend, one collection per resource kind.
#[async_trait::async_trait]
pub trait AdminApi: Send + Sync {
    /// All records of `kind`. Entries without an id are dropped.
    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Record>>;

    /// Create a record; returns it when the backend echoes it back.
    async fn create(&self, kind: ResourceKind, payload: Payload) -> ApiResult<Option<Record>>;

    /// Replace the fields present in `payload`; omitted fields keep their stored value.
    async fn update(&self, kind: ResourceKind, id: &RecordId, payload: Payload) -> ApiResult<Option<Record>>;

    async fn delete(&self, kind: ResourceKind, id: &RecordId) -> ApiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_passes_backend_text_through() {
        let e = ApiError::Rejected { status: 400, message: "Title already exists".into() };
        assert_eq!(e.user_message(), "Title already exists");
        assert_eq!(e.status(), Some(400));
        assert_eq!(ApiError::NotFound("no user 4".into()).status(), Some(404));
        assert!(ApiError::Decode("eof".into()).user_message().contains("eof"));
    }
}
