//! # Resources
//!
//! A resource is a declarative description of where a model lives and which
//! model type to expect back. The pipeline is generic over it, so a service
//! built for one resource type can only ever hand back that resource's model.
//!
//! - [`Resource`]: the model type plus how to decode it.
//! - [`NetworkResource`]: an HTTP(S) endpoint; derives a [`Request`].
//! - [`DiskResource`]: a JSON document on the local filesystem.

pub mod disk;
pub mod network;

pub use disk::*;
pub use network::*;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::JsonParsingError;

/// Anything the pipeline can fetch.
///
/// # Associated Model
/// `Model` is the type the response body decodes into. Because it is an
/// associated type rather than a method generic, a `FetchService<UserResource>`
/// can only produce `User`s.
///
/// # Provided Methods
/// [`Resource::decode`] defaults to `serde_json`. Override it when the JSON
/// shape does not map one-to-one onto the model (e.g. an envelope object).
pub trait Resource: Send + Sync + 'static {
    type Model: DeserializeOwned + Send + 'static;

    /// Decodes raw body bytes into the model.
    ///
    /// Every decoding failure, from malformed JSON to a schema mismatch, is
    /// reported as [`JsonParsingError::InvalidJsonData`].
    fn decode(data: &[u8]) -> Result<Self::Model, JsonParsingError> {
        serde_json::from_slice(data).map_err(|_| JsonParsingError::InvalidJsonData)
    }
}

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("Unknown HTTP method: {other}")),
        }
    }
}

/// One `name[=value]` pair of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A bare `name` with no `=value` part.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// A transport-ready request.
///
/// Only ever derived from a [`NetworkResource`]; see
/// [`NetworkResource::build_request`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}
