//! Async enhancement backends
//!
//! [`AsyncEnhancer`] is the async counterpart of the core's
//! `SignalEnhancer`. Two implementations live here:
//!
//! - [`WorkerEnhancer`] moves a synchronous enhancer onto a tokio worker
//!   task and talks to it over a bounded channel. `stop()` drops every
//!   request still queued or running; their callers see `Cancelled`.
//! - [`TimeoutEnhancer`] wraps any async backend with a deadline and
//!   answers with the in-process `NumericEnhancer` when the backend times
//!   out, fails or returns a block of the wrong length.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use vitalguard_core::{EnhanceRequest, Enhancement, NumericEnhancer, SignalEnhancer};

use crate::error::AccelError;

/// Async enhancement capability
#[async_trait]
pub trait AsyncEnhancer: Send + Sync {
    /// Enhance one block
    async fn enhance(&self, request: EnhanceRequest) -> Result<Enhancement, AccelError>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Drop pending work; later calls may fail
    fn shutdown(&self) {}
}

/// In-process numeric enhancer behind the async trait
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineEnhancer;

#[async_trait]
impl AsyncEnhancer for InlineEnhancer {
    async fn enhance(&self, request: EnhanceRequest) -> Result<Enhancement, AccelError> {
        Ok(NumericEnhancer::run(&request)?)
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

type Reply = oneshot::Sender<Result<Enhancement, AccelError>>;

struct Job {
    request: EnhanceRequest,
    reply: Reply,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Synchronous enhancer driven from a dedicated worker task
pub struct WorkerEnhancer {
    name: &'static str,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for WorkerEnhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerEnhancer")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl WorkerEnhancer {
    /// Spawn the worker on the current tokio runtime
    ///
    /// Each block runs on the blocking pool so a slow backend never stalls
    /// the runtime's async threads.
    pub fn spawn<E>(enhancer: E, queue_depth: usize) -> Self
    where
        E: SignalEnhancer + Send + 'static,
    {
        let name = enhancer.name();
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let handle = tokio::spawn(Self::run(Box::new(enhancer), rx));
        info!("Enhancement worker '{}' started (queue depth {})", name, queue_depth.max(1));

        Self {
            name,
            sender: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    async fn run(mut enhancer: Box<dyn SignalEnhancer + Send>, mut rx: mpsc::Receiver<Job>) {
        while let Some(job) = rx.recv().await {
            let Job { request, reply } = job;
            let outcome = tokio::task::spawn_blocking(move || {
                let result = enhancer.enhance(&request);
                (enhancer, result)
            })
            .await;

            match outcome {
                Ok((returned, result)) => {
                    enhancer = returned;
                    // Caller may have timed out and dropped its receiver
                    let _ = reply.send(result.map_err(AccelError::from));
                }
                Err(join_err) => {
                    warn!("Enhancement worker lost its backend: {}", join_err);
                    let _ = reply.send(Err(AccelError::Backend(join_err.to_string())));
                    break;
                }
            }
        }
        debug!("Enhancement worker exiting");
    }

    /// Whether the worker still accepts requests
    pub fn is_running(&self) -> bool {
        locked(&self.sender).as_ref().map_or(false, |tx| !tx.is_closed())
    }

    /// Stop the worker, cancelling queued and in-flight requests
    pub fn stop(&self) {
        let had_sender = locked(&self.sender).take().is_some();
        if let Some(handle) = locked(&self.handle).take() {
            handle.abort();
        }
        if had_sender {
            info!("Enhancement worker '{}' stopped", self.name);
        }
    }
}

impl Drop for WorkerEnhancer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl AsyncEnhancer for WorkerEnhancer {
    async fn enhance(&self, request: EnhanceRequest) -> Result<Enhancement, AccelError> {
        let sender = locked(&self.sender).clone().ok_or(AccelError::WorkerStopped)?;
        let (reply, response) = oneshot::channel();
        sender
            .send(Job { request, reply })
            .await
            .map_err(|_| AccelError::WorkerStopped)?;
        response.await.map_err(|_| AccelError::Cancelled)?
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn shutdown(&self) {
        self.stop();
    }
}

/// Deadline plus in-process fallback around an async backend
#[derive(Debug)]
pub struct TimeoutEnhancer<E> {
    inner: E,
    timeout: Duration,
    fallbacks: AtomicU64,
}

impl<E: AsyncEnhancer> TimeoutEnhancer<E> {
    /// Wrap `inner` with `timeout`
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Wrapped backend
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Deadline per call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Calls answered by the in-process fallback
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    fn fallback(&self, request: &EnhanceRequest, cause: AccelError) -> Result<Enhancement, AccelError> {
        let count = self.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            "Enhancer '{}' failed ({}), in-process fallback #{} on {} samples",
            self.inner.name(),
            cause,
            count,
            request.samples.len()
        );
        Ok(NumericEnhancer::run(request)?)
    }
}

#[async_trait]
impl<E: AsyncEnhancer> AsyncEnhancer for TimeoutEnhancer<E> {
    async fn enhance(&self, request: EnhanceRequest) -> Result<Enhancement, AccelError> {
        let expected = request.samples.len();
        match tokio::time::timeout(self.timeout, self.inner.enhance(request.clone())).await {
            Ok(Ok(enhancement)) if enhancement.values.len() == expected => Ok(enhancement),
            Ok(Ok(enhancement)) => self.fallback(
                &request,
                AccelError::LengthMismatch { expected, actual: enhancement.values.len() },
            ),
            Ok(Err(err)) => self.fallback(&request, err),
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                self.fallback(&request, AccelError::Timeout { timeout_ms })
            }
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn shutdown(&self) {
        self.inner.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalguard_core::{AdaptiveFilter, ProcessingResult};

    struct Pending;

    #[async_trait]
    impl AsyncEnhancer for Pending {
        async fn enhance(&self, _request: EnhanceRequest) -> Result<Enhancement, AccelError> {
            std::future::pending().await
        }

        fn name(&self) -> &'static str {
            "pending"
        }
    }

    struct Truncating;

    impl SignalEnhancer for Truncating {
        fn enhance(&mut self, request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
            let mut out = NumericEnhancer::run(request)?;
            out.values.pop();
            Ok(out)
        }

        fn name(&self) -> &'static str {
            "truncating"
        }
    }

    fn request() -> EnhanceRequest {
        AdaptiveFilter::default().batch_request(&[1.0, 1.2, 0.8, 1.1, 0.9, 1.0])
    }

    #[tokio::test]
    async fn inline_matches_numeric() {
        let expected = NumericEnhancer::run(&request()).unwrap();
        let out = InlineEnhancer.enhance(request()).await.unwrap();
        assert_eq!(out.values, expected.values);
    }

    #[tokio::test]
    async fn worker_round_trip() {
        let worker = WorkerEnhancer::spawn(NumericEnhancer::new(), 4);
        assert!(worker.is_running());
        let out = worker.enhance(request()).await.unwrap();
        assert_eq!(out.values.len(), 6);
        assert_eq!(worker.name(), "numeric");
    }

    #[tokio::test]
    async fn stopped_worker_rejects() {
        let worker = WorkerEnhancer::spawn(NumericEnhancer::new(), 4);
        worker.stop();
        assert!(!worker.is_running());
        assert!(matches!(worker.enhance(request()).await, Err(AccelError::WorkerStopped)));
    }

    #[tokio::test]
    async fn timeout_falls_back() {
        let enhancer = TimeoutEnhancer::new(Pending, Duration::from_millis(20));
        let out = enhancer.enhance(request()).await.unwrap();
        assert_eq!(out.values.len(), 6);
        assert_eq!(enhancer.fallback_count(), 1);
    }

    #[tokio::test]
    async fn short_block_falls_back() {
        let worker = WorkerEnhancer::spawn(Truncating, 4);
        let enhancer = TimeoutEnhancer::new(worker, Duration::from_secs(1));
        let out = enhancer.enhance(request()).await.unwrap();
        assert_eq!(out.values.len(), 6);
        assert_eq!(enhancer.fallback_count(), 1);
    }
}
