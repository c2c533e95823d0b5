//! # Operation Queue
//!
//! A host for [`Operation`]s, built as an actor: [`QueueRunner`] owns the
//! running tasks and processes commands sequentially; [`OperationQueue`] is the
//! cheap, cloneable handle that sends them.
//!
//! - At most `max_concurrent` operations execute at once (a `Semaphore`).
//! - Every operation runs on its own Tokio task inside a `JoinSet`.
//! - Dropping every handle stops the runner once in-flight work has drained.
//!
//! ```rust
//! use std::sync::Arc;
//! use typed_fetch::mock::MockSession;
//! use typed_fetch::operation::{QueueRunner, ResourceOperation};
//! use typed_fetch::resource::NetworkJsonResource;
//! use typed_fetch::service::FetchService;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockSession::new();
//!     mock.expect_request().return_json(200, serde_json::json!(42));
//!     let service: FetchService<NetworkJsonResource<u32>> =
//!         FetchService::new(Arc::new(mock.clone()));
//!
//!     let (runner, queue) = QueueRunner::new(8, 2);
//!     let handle = tokio::spawn(runner.run());
//!
//!     let operation = ResourceOperation::new(
//!         service,
//!         NetworkJsonResource::<u32>::new("https://api.example.com/answer"),
//!         |result| assert_eq!(result, Ok(42)),
//!     );
//!     queue.add_operation(operation).await.unwrap();
//!     queue.wait_until_idle().await.unwrap();
//!
//!     drop(queue);
//!     handle.await.unwrap();
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::Operation;

pub const DEFAULT_BUFFER_SIZE: usize = 32;
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Errors talking to the queue runner.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum QueueError {
    #[error("Queue closed")]
    Closed,
    #[error("Queue dropped response channel")]
    Dropped,
}

/// Commands sent from [`OperationQueue`] to [`QueueRunner`].
pub enum QueueCommand {
    Enqueue(Arc<dyn Operation>),
    CancelAll {
        respond_to: oneshot::Sender<usize>,
    },
    WaitIdle {
        respond_to: oneshot::Sender<()>,
    },
}

/// The server half of the queue. Owns the tasks; run it with [`QueueRunner::run`].
pub struct QueueRunner {
    receiver: mpsc::Receiver<QueueCommand>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    tasks: JoinSet<()>,
    operations: Vec<Arc<dyn Operation>>,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl QueueRunner {
    /// Creates a runner and its handle. `max_concurrent` is clamped to at least 1.
    pub fn new(buffer_size: usize, max_concurrent: usize) -> (Self, OperationQueue) {
        let max_concurrent = max_concurrent.max(1);
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let runner = Self {
            receiver,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            tasks: JoinSet::new(),
            operations: Vec::new(),
            idle_waiters: Vec::new(),
        };
        (runner, OperationQueue { sender })
    }

    /// Processes commands until every handle is dropped, then drains running work.
    pub async fn run(mut self) {
        info!(max_concurrent = self.max_concurrent, "Queue started");

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Operation task failed");
                    }
                    self.notify_if_idle();
                }
            }
        }

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Operation task failed");
            }
        }
        self.notify_if_idle();
        info!("Queue shutdown");
    }

    fn handle(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::Enqueue(operation) => {
                self.operations.retain(|op| !op.is_finished());
                self.operations.push(Arc::clone(&operation));
                debug!(queued = self.operations.len(), "Enqueue");

                let semaphore = Arc::clone(&self.semaphore);
                self.tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return;
                    };
                    operation.run().await;
                });
            }
            QueueCommand::CancelAll { respond_to } => {
                let mut cancelled = 0;
                for operation in self.operations.drain(..) {
                    if !operation.is_finished() {
                        operation.cancel();
                        cancelled += 1;
                    }
                }
                info!(cancelled, "Cancelled all");
                let _ = respond_to.send(cancelled);
            }
            QueueCommand::WaitIdle { respond_to } => {
                self.idle_waiters.push(respond_to);
                self.notify_if_idle();
            }
        }
    }

    fn notify_if_idle(&mut self) {
        if self.tasks.is_empty() {
            for waiter in self.idle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }
}

/// Handle for submitting operations to a [`QueueRunner`].
#[derive(Clone)]
pub struct OperationQueue {
    sender: mpsc::Sender<QueueCommand>,
}

impl OperationQueue {
    /// Spawns a runner with the given concurrency and returns its handle.
    pub fn spawn(max_concurrent: usize) -> (Self, JoinHandle<()>) {
        let (runner, queue) = QueueRunner::new(DEFAULT_BUFFER_SIZE, max_concurrent);
        let handle = tokio::spawn(runner.run());
        (queue, handle)
    }

    pub async fn add_operation<O: Operation>(&self, operation: Arc<O>) -> Result<(), QueueError> {
        let operation: Arc<dyn Operation> = operation;
        self.sender
            .send(QueueCommand::Enqueue(operation))
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Cancels every operation not yet finished. Returns how many were cancelled.
    pub async fn cancel_all(&self) -> Result<usize, QueueError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::CancelAll { respond_to })
            .await
            .map_err(|_| QueueError::Closed)?;
        response.await.map_err(|_| QueueError::Dropped)
    }

    /// Resolves once no operation task is running.
    pub async fn wait_until_idle(&self) -> Result<(), QueueError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(QueueCommand::WaitIdle { respond_to })
            .await
            .map_err(|_| QueueError::Closed)?;
        response.await.map_err(|_| QueueError::Dropped)
    }
}
