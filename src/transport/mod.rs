//! # Transport Session
//!
//! The narrowest capability the fetch pipeline needs from the network layer:
//! submit a built [`Request`] and receive, exactly once, the raw
//! [`TransportOutcome`] triple.
//!
//! The pipeline never looks past this trait. Swapping `reqwest` for something
//! else, or for [`MockSession`](crate::mock::MockSession) in tests, means
//! implementing [`TransportSession`] and nothing more.

pub mod http;

pub use http::ReqwestSession;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::resource::Request;

/// Executes built requests.
///
/// # Contract
/// - One `execute` call yields one outcome. No retries, no caching.
/// - The future may resolve on any task; the pipeline makes no assumption about it.
/// - Non-success statuses are reported through [`TransportOutcome::response`],
///   not swallowed. The pipeline classifies them.
#[async_trait]
pub trait TransportSession: Send + Sync {
    async fn execute(&self, request: Request) -> TransportOutcome;
}

/// Status-bearing response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseMeta {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
}

impl ResponseMeta {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
        }
    }
}

/// Opaque transport failure.
///
/// `domain` identifies where the error came from (e.g. `"reqwest"`), which is
/// the identity callers match on.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{domain} ({code}): {message}")]
pub struct TransportError {
    pub domain: String,
    pub code: i64,
    pub message: String,
}

impl TransportError {
    pub fn new(domain: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            message: message.into(),
        }
    }
}

/// The raw triple a transport hands back. Transient; the pipeline consumes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportOutcome {
    pub data: Option<Vec<u8>>,
    pub response: Option<ResponseMeta>,
    pub error: Option<TransportError>,
}

impl TransportOutcome {
    pub fn new(
        data: Option<Vec<u8>>,
        response: Option<ResponseMeta>,
        error: Option<TransportError>,
    ) -> Self {
        Self {
            data,
            response,
            error,
        }
    }

    /// No data, no response, no error.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A bare status with no body.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            response: Some(ResponseMeta::new(status_code)),
            ..Self::default()
        }
    }

    /// A status plus body bytes.
    pub fn with_body(status_code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
            response: Some(ResponseMeta::new(status_code)),
            error: None,
        }
    }

    /// A transport error with no response at all.
    pub fn with_error(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Status code of the response, if one arrived.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status_code)
    }
}
