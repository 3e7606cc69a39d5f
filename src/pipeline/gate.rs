//! Backpressure and cancellation around the inference backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::task::JoinHandle;

use super::extraction::types::{Classification, ExtractedData};
use super::ports::{Classifier, Extractor, ModelError};
use super::retry::CorrectionHints;
use crate::models::enums::ClassifiedType;

/// Bounded number of in-flight model calls, shared by every pipeline run.
///
/// Callers beyond the limit wait in FIFO order rather than failing.
/// Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct ModelGate {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl ModelGate {
    /// A limit of zero is raised to one.
    pub fn new(max_concurrent: usize) -> Self {
        let limit = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, ModelError> {
        self.permits.acquire().await.map_err(|_| ModelError::GateClosed)
    }

    /// Wrap a classifier or extractor so each call holds a permit.
    pub fn throttle<M>(&self, inner: M) -> Throttled<M> {
        Throttled {
            inner,
            gate: self.clone(),
        }
    }
}

/// A model port whose calls pass through a [`ModelGate`].
pub struct Throttled<M> {
    inner: M,
    gate: ModelGate,
}

impl<M> Throttled<M> {
    pub fn gate(&self) -> &ModelGate {
        &self.gate
    }
}

#[async_trait]
impl<M: Classifier> Classifier for Throttled<M> {
    async fn classify(&self, bytes: &[u8], mime_type: &str) -> Result<Classification, ModelError> {
        let _permit = self.gate.acquire().await?;
        self.inner.classify(bytes, mime_type).await
    }
}

#[async_trait]
impl<M: Extractor> Extractor for Throttled<M> {
    async fn extract(
        &self,
        bytes: &[u8],
        mime_type: &str,
        document_type: ClassifiedType,
        hints: Option<&CorrectionHints>,
    ) -> Result<ExtractedData, ModelError> {
        let _permit = self.gate.acquire().await?;
        self.inner
            .extract(bytes, mime_type, document_type, hints)
            .await
    }
}

/// External cancellation for one or more pipeline runs.
///
/// Checked between retry attempts; an in-flight model call is never
/// interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
    parent: Option<Arc<CancellationFlag>>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// A flag that also reports cancellation of `self`, but whose own
    /// `cancel` leaves `self` untouched.
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::default(),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Cancel once `timeout` elapses. Must be called inside a tokio runtime.
    pub fn cancel_after(&self, timeout: Duration) -> JoinHandle<()> {
        let flag = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Pipeline deadline reached");
            flag.cancel();
        })
    }
}

/// A child of some flag that trips after a timeout. Dropping it stops the
/// timer, so an abandoned run leaves no task behind.
#[derive(Debug)]
pub struct Deadline {
    flag: CancellationFlag,
    timer: JoinHandle<()>,
}

impl Deadline {
    pub fn start(parent: &CancellationFlag, timeout: Duration) -> Self {
        let flag = parent.child();
        let timer = flag.cancel_after(timeout);
        Self { flag, timer }
    }

    pub fn flag(&self) -> &CancellationFlag {
        &self.flag
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::mock::SlowClassifier;

    #[tokio::test]
    async fn gate_caps_concurrent_calls() {
        let slow = SlowClassifier::new(Duration::from_millis(20));
        let in_flight = slow.peak_counter();
        let classifier = Arc::new(ModelGate::new(2).throttle(slow));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let classifier = Arc::clone(&classifier);
            tasks.spawn(async move { classifier.classify(b"%PDF", "application/pdf").await });
        }
        while let Some(joined) = tasks.join_next().await {
            assert!(joined.unwrap().is_ok());
        }

        assert_eq!(in_flight.peak(), 2);
        assert_eq!(classifier.gate().available(), 2);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        assert_eq!(ModelGate::new(0).limit(), 1);
    }

    #[tokio::test]
    async fn child_sees_parent_but_not_the_reverse() {
        let parent = CancellationFlag::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let sibling = parent.child();
        parent.cancel();
        assert!(sibling.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_after_trips_the_flag() {
        let flag = CancellationFlag::new();
        assert!(!flag.is_cancelled());
        flag.cancel_after(Duration::from_millis(5)).await.unwrap();
        assert!(flag.is_cancelled());
    }

    #[tokio::test]
    async fn waiting_callers_are_served_in_arrival_order() {
        let gate = ModelGate::new(1);
        let served = Arc::new(std::sync::Mutex::new(Vec::new()));
        let held = gate.acquire().await.unwrap();

        let mut handles = Vec::new();
        for id in 0..4 {
            let gate = gate.clone();
            let served = Arc::clone(&served);
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                served.lock().unwrap().push(id);
            }));
            // Let this caller join the queue before the next one arrives.
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        drop(held);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*served.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn deadline_trips_only_its_own_flag() {
        let parent = CancellationFlag::new();
        let deadline = Deadline::start(&parent, Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(deadline.flag().is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn dropped_deadline_never_fires() {
        let parent = CancellationFlag::new();
        let deadline = Deadline::start(&parent, Duration::from_millis(5));
        let flag = deadline.flag().clone();
        drop(deadline);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!flag.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        other.cancel();
        assert!(flag.is_cancelled());
    }
}
