//! # Mock Transport & Testing Guide
//!
//! Test doubles for [`TransportSession`], so the fetch pipeline can be tested
//! without a network.
//!
//! ## When to use which
//!
//! | Double | Responds | Use Case |
//! |--------|----------|----------|
//! | [`MockSession`] | Immediately, from scripted expectations | Classification and decoding tests |
//! | [`create_mock_session`] | When the test says so | Timing-sensitive tests (cancellation, concurrency) |
//!
//! ## Pattern 1: Scripted responses
//!
//! ```rust
//! use std::sync::Arc;
//! use typed_fetch::mock::MockSession;
//! use typed_fetch::resource::NetworkJsonResource;
//! use typed_fetch::service::{FetchService, ResourceService};
//! use typed_fetch::{FetchError, NetworkServiceError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockSession::new();
//!     mock.expect_request().return_status(404);
//!
//!     let service: FetchService<NetworkJsonResource<String>> =
//!         FetchService::new(Arc::new(mock.clone()));
//!     let resource = NetworkJsonResource::<String>::new("http://test.com");
//!
//!     let result = service.fetch(&resource).await;
//!     assert_eq!(result, Err(FetchError::Network(NetworkServiceError::StatusCode(404))));
//!     assert_eq!(mock.captured_requests().len(), 1);
//!     mock.verify();
//! }
//! ```
//!
//! ## Pattern 2: Test-controlled completion
//!
//! The test receives each request along with a responder and decides when, and
//! whether, the transport completes.
//!
//! ```rust
//! use std::sync::Arc;
//! use typed_fetch::mock::{create_mock_session, expect_request};
//! use typed_fetch::resource::NetworkJsonResource;
//! use typed_fetch::service::{FetchService, ResourceService};
//! use typed_fetch::transport::TransportOutcome;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (session, mut receiver) = create_mock_session(1);
//!     let service: FetchService<NetworkJsonResource<String>> =
//!         FetchService::new(Arc::new(session));
//!
//!     let task = tokio::spawn(async move {
//!         service.fetch(&NetworkJsonResource::<String>::new("http://test.com")).await
//!     });
//!
//!     let (request, responder) = expect_request(&mut receiver).await.unwrap();
//!     assert_eq!(request.url.as_str(), "http://test.com/");
//!     responder.send(TransportOutcome::with_body(200, b"\"done\"".to_vec())).unwrap();
//!
//!     assert_eq!(task.await.unwrap(), Ok("done".to_string()));
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::resource::Request;
use crate::transport::{TransportError, TransportOutcome, TransportSession};

/// Error domain reported by the mock doubles themselves.
pub const MOCK_DOMAIN: &str = "mock";

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A transport that answers from a queue of scripted outcomes.
///
/// Clones share state, so keep one clone in the test and hand another to the
/// service.
///
/// # Panics
/// `execute` panics when a request arrives with no expectation left.
#[derive(Clone, Default)]
pub struct MockSession {
    expectations: Arc<Mutex<VecDeque<TransportOutcome>>>,
    captured: Arc<Mutex<Vec<Request>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one more request.
    pub fn expect_request(&self) -> RequestExpectationBuilder {
        RequestExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Every request executed so far, in order.
    pub fn captured_requests(&self) -> Vec<Request> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.captured.lock().unwrap().last().cloned()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

#[async_trait]
impl TransportSession for MockSession {
    async fn execute(&self, request: Request) -> TransportOutcome {
        let url = request.url.to_string();
        self.captured.lock().unwrap().push(request);
        let next = self.expectations.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => panic!("Unexpected request to {url}: no expectation left"),
        }
    }
}

/// Builder for one request expectation.
pub struct RequestExpectationBuilder {
    expectations: Arc<Mutex<VecDeque<TransportOutcome>>>,
}

impl RequestExpectationBuilder {
    /// Responds with the given raw triple.
    pub fn return_outcome(self, outcome: TransportOutcome) {
        self.expectations.lock().unwrap().push_back(outcome);
    }

    /// Responds with a bare status and no body.
    pub fn return_status(self, status_code: u16) {
        self.return_outcome(TransportOutcome::with_status(status_code));
    }

    /// Responds with a status and a JSON body.
    pub fn return_json(self, status_code: u16, body: serde_json::Value) {
        self.return_outcome(TransportOutcome::with_body(status_code, body.to_string()));
    }

    /// Responds with a status and raw body bytes.
    pub fn return_body(self, status_code: u16, body: impl Into<Vec<u8>>) {
        self.return_outcome(TransportOutcome::with_body(status_code, body));
    }

    /// Responds with a transport error and no response.
    pub fn return_error(self, error: TransportError) {
        self.return_outcome(TransportOutcome::with_error(error));
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// A request waiting for the test to answer it.
#[derive(Debug)]
pub struct PendingRequest {
    pub request: Request,
    pub respond_to: oneshot::Sender<TransportOutcome>,
}

/// A transport that forwards every request to a channel the test holds.
#[derive(Clone)]
pub struct ChannelSession {
    sender: mpsc::Sender<PendingRequest>,
}

#[async_trait]
impl TransportSession for ChannelSession {
    async fn execute(&self, request: Request) -> TransportOutcome {
        let (respond_to, response) = oneshot::channel();
        if self
            .sender
            .send(PendingRequest {
                request,
                respond_to,
            })
            .await
            .is_err()
        {
            return TransportOutcome::with_error(TransportError::new(
                MOCK_DOMAIN,
                -1,
                "Mock session closed",
            ));
        }
        response.await.unwrap_or_else(|_| {
            TransportOutcome::with_error(TransportError::new(
                MOCK_DOMAIN,
                -2,
                "Mock responder dropped",
            ))
        })
    }
}

/// Creates a channel-backed session and the receiver the test reads requests from.
///
/// # Testing Strategy
/// The service under test talks to the returned session as if it were real.
/// The test pulls each request off `receiver` with [`expect_request`], asserts
/// on it, and completes it through the responder. Until it does, the fetch
/// stays in flight, which makes cancellation races deterministic.
pub fn create_mock_session(
    buffer_size: usize,
) -> (ChannelSession, mpsc::Receiver<PendingRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ChannelSession { sender }, receiver)
}

/// Waits for the next request and splits it into the request and its responder.
pub async fn expect_request(
    receiver: &mut mpsc::Receiver<PendingRequest>,
) -> Option<(Request, oneshot::Sender<TransportOutcome>)> {
    receiver
        .recv()
        .await
        .map(|pending| (pending.request, pending.respond_to))
}
