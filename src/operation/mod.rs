//! # Operations
//!
//! A [`ResourceOperation`] wraps one fetch into a cancellable, single-completion
//! unit of work that a host queue can schedule. [`OperationQueue`] is such a
//! host, built on a Tokio task.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──run()──▶ Executing ──result──▶ Finished
//!    │                   │                    ▲
//!    └──────cancel()─────┴────────────────────┘
//! ```
//!
//! - `run` only starts a `Pending` operation.
//! - Whoever moves the state to `Finished` first wins. If the result gets there
//!   first the completion fires; if `cancel` does the result is dropped.
//! - Cancelling does not abort the transport call. It still runs to the end and
//!   its result is discarded.

pub mod queue;

pub use queue::*;

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::service::{short_type_name, FetchResult, ResourceService};

/// Where an operation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationState {
    Pending = 0,
    Executing = 1,
    Finished = 2,
}

// Set alongside `Finished` when `cancel` is what finished the operation.
const CANCELLED_BIT: u8 = 0b100;
const STATE_MASK: u8 = 0b011;

impl OperationState {
    fn from_u8(value: u8) -> Self {
        match value & STATE_MASK {
            0 => OperationState::Pending,
            1 => OperationState::Executing,
            _ => OperationState::Finished,
        }
    }
}

/// The view a host queue has of a unit of work.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Run entry point. Does nothing unless the operation is still pending.
    async fn run(self: Arc<Self>);

    /// Finishes the operation as cancelled. Does nothing once it has finished,
    /// so a delivered operation never reports itself cancelled.
    fn cancel(&self);

    fn is_cancelled(&self) -> bool;

    fn state(&self) -> OperationState;

    fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }
}

type Completion<S> = Box<dyn FnOnce(FetchResult<S>) + Send>;

/// One fetch of `S::Resource` through `S`, delivered at most once.
///
/// ```rust
/// use std::sync::Arc;
/// use typed_fetch::mock::MockSession;
/// use typed_fetch::operation::{Operation, OperationState, ResourceOperation};
/// use typed_fetch::resource::NetworkJsonResource;
/// use typed_fetch::service::FetchService;
///
/// #[tokio::main]
/// async fn main() {
///     let mock = MockSession::new();
///     mock.expect_request().return_json(200, serde_json::json!("success"));
///
///     let service: FetchService<NetworkJsonResource<String>> =
///         FetchService::new(Arc::new(mock.clone()));
///     let (tx, rx) = tokio::sync::oneshot::channel();
///     let operation = ResourceOperation::new(
///         service,
///         NetworkJsonResource::<String>::new("http://test.com"),
///         move |result| { let _ = tx.send(result); },
///     );
///
///     operation.start().await.unwrap();
///     assert_eq!(rx.await.unwrap(), Ok("success".to_string()));
///     assert_eq!(operation.state(), OperationState::Finished);
/// }
/// ```
pub struct ResourceOperation<S: ResourceService> {
    service: S,
    resource: S::Resource,
    completion: Mutex<Option<Completion<S>>>,
    // Lifecycle state plus `CANCELLED_BIT`, in one word so a single
    // compare-and-set decides between delivery and cancellation.
    state: AtomicU8,
}

impl<S: ResourceService> ResourceOperation<S> {
    pub fn new<F>(service: S, resource: S::Resource, completion: F) -> Arc<Self>
    where
        F: FnOnce(FetchResult<S>) + Send + 'static,
    {
        Arc::new(Self {
            service,
            resource,
            completion: Mutex::new(Some(Box::new(completion))),
            state: AtomicU8::new(OperationState::Pending as u8),
        })
    }

    pub fn resource(&self) -> &S::Resource {
        &self.resource
    }

    /// Runs the operation on its own task, without a queue.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }

    /// Delivers a result to the caller's completion unless the operation was
    /// cancelled or already finished. Returns whether the completion fired.
    pub fn did_finish_fetching_resource(&self, result: FetchResult<S>) -> bool {
        if !self.finish(OperationState::Finished as u8) {
            debug!(operation = %self, "Result discarded");
            return false;
        }

        let completion = self
            .completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match completion {
            Some(completion) => {
                completion(result);
                true
            }
            None => false,
        }
    }

    fn transition(&self, from: OperationState, to: OperationState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves any non-finished state to `terminal`. Only the first caller wins.
    fn finish(&self, terminal: u8) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (OperationState::from_u8(s) != OperationState::Finished).then_some(terminal)
            })
            .is_ok()
    }
}

#[async_trait]
impl<S: ResourceService> Operation for ResourceOperation<S> {
    async fn run(self: Arc<Self>) {
        if !self.transition(OperationState::Pending, OperationState::Executing) {
            debug!(operation = %self, state = ?self.state(), "Not pending, skipping");
            return;
        }

        debug!(operation = %self, "Executing");
        let result = self.service.fetch(&self.resource).await;
        self.did_finish_fetching_resource(result);
    }

    fn cancel(&self) {
        if self.finish(OperationState::Finished as u8 | CANCELLED_BIT) {
            info!(operation = %self, "Cancelled");
        }
    }

    fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) & CANCELLED_BIT != 0
    }

    fn state(&self) -> OperationState {
        OperationState::from_u8(self.state.load(Ordering::Acquire))
    }
}

impl<S: ResourceService> fmt::Display for ResourceOperation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceOperation<{}>", short_type_name::<S::Resource>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, NetworkServiceError};
    use crate::mock::{create_mock_session, expect_request, MockSession};
    use crate::resource::NetworkJsonResource;
    use crate::service::FetchService;
    use crate::transport::TransportOutcome;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    type StringResource = NetworkJsonResource<String>;

    fn counting_operation(
        service: FetchService<StringResource>,
        calls: Arc<AtomicUsize>,
    ) -> Arc<ResourceOperation<FetchService<StringResource>>> {
        ResourceOperation::new(service, StringResource::new("http://test.com"), move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_did_finish_fetching_resource_calls_completion() {
        let service: FetchService<StringResource> = FetchService::new(Arc::new(MockSession::new()));
        let (tx, rx) = oneshot::channel();
        let operation =
            ResourceOperation::new(service, StringResource::new("http://test.com"), move |result| {
                let _ = tx.send(result);
            });

        assert!(operation.did_finish_fetching_resource(Ok("success".to_string())));
        assert_eq!(rx.await.unwrap(), Ok("success".to_string()));
        assert!(operation.is_finished());
    }

    #[tokio::test]
    async fn test_completion_fires_at_most_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service: FetchService<StringResource> = FetchService::new(Arc::new(MockSession::new()));
        let operation = counting_operation(service, calls.clone());

        assert!(operation.did_finish_fetching_resource(Ok("first".into())));
        assert!(!operation.did_finish_fetching_resource(Ok("second".into())));
        assert!(!operation.did_finish_fetching_resource(Err(FetchError::Network(
            NetworkServiceError::NoData
        ))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_delivery_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service: FetchService<StringResource> = FetchService::new(Arc::new(MockSession::new()));
        let operation = counting_operation(service, calls.clone());

        assert!(operation.did_finish_fetching_resource(Ok("x".into())));
        operation.cancel();

        assert!(!operation.is_cancelled());
        assert_eq!(operation.state(), OperationState::Finished);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_then_delivery_never_fires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service: FetchService<StringResource> = FetchService::new(Arc::new(MockSession::new()));
        let operation = counting_operation(service, calls.clone());

        operation.cancel();
        operation.cancel();
        assert!(!operation.did_finish_fetching_resource(Ok("late".into())));

        assert!(operation.is_cancelled());
        assert_eq!(operation.state(), OperationState::Finished);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_and_delivery_race_has_one_winner() {
        for _ in 0..64 {
            let calls = Arc::new(AtomicUsize::new(0));
            let service: FetchService<StringResource> =
                FetchService::new(Arc::new(MockSession::new()));
            let operation = counting_operation(service, calls.clone());

            let deliver = {
                let operation = Arc::clone(&operation);
                tokio::task::spawn_blocking(move || {
                    operation.did_finish_fetching_resource(Ok("x".into()))
                })
            };
            let cancel = {
                let operation = Arc::clone(&operation);
                tokio::task::spawn_blocking(move || operation.cancel())
            };
            let delivered = deliver.await.unwrap();
            cancel.await.unwrap();

            // Exactly one side wins, and the flags agree with it.
            assert_eq!(delivered, !operation.is_cancelled());
            assert_eq!(calls.load(Ordering::SeqCst), usize::from(delivered));
            assert_eq!(operation.state(), OperationState::Finished);
        }
    }

    #[tokio::test]
    async fn test_cancel_before_start_skips_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = MockSession::new();
        let operation = counting_operation(FetchService::new(Arc::new(mock.clone())), calls.clone());

        operation.cancel();
        operation.start().await.unwrap();

        assert!(operation.is_cancelled());
        assert_eq!(operation.state(), OperationState::Finished);
        assert!(mock.captured_requests().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_suppresses_completion() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (session, mut receiver) = create_mock_session(1);
        let operation = counting_operation(FetchService::new(Arc::new(session)), calls.clone());

        let handle = operation.start();
        let (_request, responder) = expect_request(&mut receiver)
            .await
            .expect("Expected a request");
        assert_eq!(operation.state(), OperationState::Executing);

        operation.cancel();
        assert_eq!(operation.state(), OperationState::Finished);

        // The transport still completes; its result goes nowhere.
        responder
            .send(TransportOutcome::with_body(200, b"\"late\"".to_vec()))
            .unwrap();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_twice_fetches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = MockSession::new();
        mock.expect_request().return_json(200, serde_json::json!("once"));
        let operation = counting_operation(FetchService::new(Arc::new(mock.clone())), calls.clone());

        Arc::clone(&operation).run().await;
        Arc::clone(&operation).run().await;

        assert_eq!(mock.captured_requests().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        mock.verify();
    }
}
