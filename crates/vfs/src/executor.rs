//! Async executor bridging synchronous FUSE callbacks to async backend I/O.
//!
//! The executor owns a Tokio runtime on a dedicated thread, independent of
//! any runtime the caller may be running. FUSE callbacks either hand work off
//! and return immediately ([`AsyncExecutor::spawn`], used for lookup, getattr,
//! and read, which reply from the task), or wait on a oneshot channel for the
//! result ([`AsyncExecutor::block_on`], used for open).
//!
//! ```text
//! FUSE Thread                    Executor Thread
//! ───────────                    ───────────────
//!     │ spawn(reply task) ───────────►│ tokio::spawn
//!     │ (returns)                     │   ... reply.data()
//!     │                               │
//!     │ block_on(future) ────────────►│ tokio::spawn
//!     │ blocking_recv() ◄─────────────│ send result
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Callbacks that may be queued before the runtime thread picks them up.
const DISPATCH_QUEUE_DEPTH: usize = 1024;

#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("executor failed to start: {0}")]
    Startup(String),

    /// The runtime has stopped, or dropped the task before it answered.
    #[error("executor has been shut down")]
    Shutdown,

    #[error("open timed out after {0:?}")]
    Timeout(Duration),
}

/// Configuration for the async executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of Tokio worker threads.
    pub worker_threads: usize,
    /// Upper bound on a blocking wait in [`AsyncExecutor::block_on`].
    pub open_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            open_timeout: None,
        }
    }
}

impl ExecutorConfig {
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }
}

/// Runtime thread serving FUSE callbacks.
///
/// Dropping the executor stops the runtime; tasks still running at that
/// point are abandoned, and their replies are dropped (the kernel sees EIO).
pub struct AsyncExecutor {
    queue_tx: mpsc::Sender<BoxFuture<'static, ()>>,
    stop: CancellationToken,
    thread: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    open_timeout: Option<Duration>,
}

impl AsyncExecutor {
    /// Start an executor with its own runtime thread.
    ///
    /// # Returns
    /// The running executor, or `Startup` if the runtime could not be built.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        let rt: tokio::runtime::Runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("ocfl-io-worker")
            .enable_all()
            .build()
            .map_err(|e| ExecutorError::Startup(e.to_string()))?;

        let (queue_tx, mut queue) = mpsc::channel::<BoxFuture<'static, ()>>(DISPATCH_QUEUE_DEPTH);
        let stop = CancellationToken::new();
        let stopped: CancellationToken = stop.clone();
        let running = Arc::new(AtomicBool::new(true));
        let running_flag: Arc<AtomicBool> = running.clone();

        let thread: JoinHandle<()> = std::thread::Builder::new()
            .name("ocfl-async-executor".to_string())
            .spawn(move || {
                rt.block_on(async move {
                    loop {
                        tokio::select! {
                            biased;

                            _ = stopped.cancelled() => break,
                            task = queue.recv() => match task {
                                Some(task) => {
                                    tokio::spawn(task);
                                }
                                None => break,
                            },
                        }
                    }
                });
                running_flag.store(false, Ordering::Release);
                tracing::debug!("executor runtime stopped");
            })
            .map_err(|e| ExecutorError::Startup(e.to_string()))?;

        Ok(Self {
            queue_tx,
            stop,
            thread: Some(thread),
            running,
            open_timeout: config.open_timeout,
        })
    }

    fn dispatch(&self, task: BoxFuture<'static, ()>) -> Result<(), ExecutorError> {
        if !self.is_running() {
            return Err(ExecutorError::Shutdown);
        }
        self.queue_tx
            .blocking_send(task)
            .map_err(|_| ExecutorError::Shutdown)
    }

    /// Run a future on the executor without waiting for it.
    ///
    /// The future delivers its own result, for FUSE by calling the reply
    /// object it captured.
    ///
    /// # Returns
    /// Err(Shutdown) if the executor no longer accepts work.
    pub fn spawn<F>(&self, future: F) -> Result<(), ExecutorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.dispatch(future.boxed())
    }

    /// Run a future on the executor and wait for its result.
    ///
    /// Safe to call from FUSE callbacks: the caller waits on a oneshot
    /// channel, never on the runtime itself. The configured open timeout,
    /// if any, bounds the wait.
    pub fn block_on<F, T>(&self, future: F) -> Result<T, ExecutorError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel::<Result<T, ExecutorError>>();
        let limit: Option<Duration> = self.open_timeout;
        self.dispatch(
            async move {
                let result: Result<T, ExecutorError> = match limit {
                    Some(limit) => tokio::time::timeout(limit, future)
                        .await
                        .map_err(|_| ExecutorError::Timeout(limit)),
                    None => Ok(future.await),
                };
                let _ = result_tx.send(result);
            }
            .boxed(),
        )?;
        result_rx
            .blocking_recv()
            .unwrap_or(Err(ExecutorError::Shutdown))
    }

    /// Stop accepting work and shut the runtime down.
    pub fn shutdown(&self) {
        self.stop.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
