//! # reqwest Transport
//!
//! [`ReqwestSession`] adapts a `reqwest::Client` to [`TransportSession`].
//! Building the client (proxies, TLS, timeouts) stays with the caller.

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{debug, warn};

use super::{ResponseMeta, TransportError, TransportOutcome, TransportSession};
use crate::resource::{HttpMethod, Request};

/// Error domain reported for every `reqwest` failure.
pub const REQWEST_DOMAIN: &str = "reqwest";

/// A [`TransportSession`] backed by a shared `reqwest::Client`.
///
/// Cheap to clone: `reqwest::Client` is reference counted internally.
#[derive(Clone, Default)]
pub struct ReqwestSession {
    client: Client,
}

impl ReqwestSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransportSession for ReqwestSession {
    async fn execute(&self, request: Request) -> TransportOutcome {
        debug!(method = %request.method, "Sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Request failed");
                return TransportOutcome::with_error(to_transport_error(&e));
            }
        };

        let meta = ResponseMeta {
            status_code: response.status().as_u16(),
            headers: response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
        };
        debug!(status = meta.status_code, "Response received");

        match response.bytes().await {
            Ok(bytes) => TransportOutcome::new(Some(bytes.to_vec()), Some(meta), None),
            Err(e) => {
                warn!(error = %e, "Reading body failed");
                TransportOutcome::new(None, Some(meta), Some(to_transport_error(&e)))
            }
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

fn to_transport_error(error: &reqwest::Error) -> TransportError {
    let code = error.status().map_or(0, |s| i64::from(s.as_u16()));
    TransportError::new(REQWEST_DOMAIN, code, error.to_string())
}
