//! # Fetch Errors
//!
//! This module defines the closed failure taxonomy of the fetch pipeline.
//! Every failure is captured inside a service and handed to the caller as the
//! `Err` half of a `Result`; nothing escapes as a panic.
//!
//! ## Families
//!
//! - [`NetworkServiceError`]: the request could not be built, the server answered
//!   with a handled failure status, the transport failed, or nothing came back.
//! - [`JsonParsingError`]: a body arrived but it does not decode into the model.
//!
//! [`FetchError`] joins the two families and is what
//! [`FetchService`](crate::service::FetchService) reports. Callers are expected
//! to match it exhaustively:
//!
//! ```rust
//! use typed_fetch::{FetchError, JsonParsingError, NetworkServiceError};
//!
//! fn describe(error: &FetchError) -> String {
//!     match error {
//!         FetchError::Network(NetworkServiceError::CouldNotCreateRequest) => "bad request".into(),
//!         FetchError::Network(NetworkServiceError::StatusCode(code)) => format!("server said {code}"),
//!         FetchError::Network(NetworkServiceError::Networking(e)) => format!("transport: {}", e.domain),
//!         FetchError::Network(NetworkServiceError::NoData) => "empty".into(),
//!         FetchError::Json(JsonParsingError::InvalidJsonData) => "garbled".into(),
//!     }
//! }
//!
//! assert_eq!(describe(&NetworkServiceError::StatusCode(404).into()), "server said 404");
//! ```
//!
//! The disk family ([`DiskServiceError`], joined in [`LoadError`]) belongs to
//! [`DiskJsonService`](crate::service::DiskJsonService) only.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::transport::TransportError;

/// Status codes that classify as [`NetworkServiceError::StatusCode`].
///
/// Anything outside this band (3xx, codes of 600 and above) is treated as an
/// opaque transport failure when an error accompanies it.
pub const HANDLED_STATUS_CODES: RangeInclusive<u16> = 400..=599;

/// Failures raised while building, executing, or classifying a network request.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum NetworkServiceError {
    /// The resource could not produce a well-formed request.
    #[error("Could not create request")]
    CouldNotCreateRequest,

    /// The server answered with a status in [`HANDLED_STATUS_CODES`].
    #[error("Failure status code: {0}")]
    StatusCode(u16),

    /// The transport failed outside the handled status band.
    #[error("Networking error: {0}")]
    Networking(TransportError),

    /// No error, but no body either.
    #[error("No data received")]
    NoData,
}

/// Failures raised while decoding a body into the expected model.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum JsonParsingError {
    /// The body is not valid JSON for the model. Schema mismatches land here too.
    #[error("Invalid JSON data")]
    InvalidJsonData,
}

/// Error type of the network fetch pipeline.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetworkServiceError),
    #[error(transparent)]
    Json(#[from] JsonParsingError),
}

/// Failures raised while reading a resource from the local filesystem.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DiskServiceError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Could not read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Error type of the disk fetch pipeline.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Disk(#[from] DiskServiceError),
    #[error(transparent)]
    Json(#[from] JsonParsingError),
}

impl NetworkServiceError {
    /// Classifies a status code, returning `Some` only inside the handled band.
    pub fn from_status_code(status_code: u16) -> Option<Self> {
        HANDLED_STATUS_CODES
            .contains(&status_code)
            .then_some(NetworkServiceError::StatusCode(status_code))
    }
}
