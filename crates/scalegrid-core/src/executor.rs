//! Bounded action executor.
//!
//! Every apply step in ScaleGrid goes through an `ExecutionContext`: at
//! most `max_concurrency` actions in flight, each bounded by
//! `action_timeout`, all of them abandoned as soon as the cancel signal
//! fires. Results come back in input order regardless of completion order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::actuator::BoxFuture;
use crate::config::ExecutorConfig;
use crate::error::{ExecutionFailure, FailureKind};

/// Receiving half of a cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested.
    ///
    /// If the sending side goes away without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                if *self.rx.borrow() {
                    return;
                }
                std::future::pending::<()>().await;
            }
        }
    }
}

impl From<watch::Receiver<bool>> for CancelSignal {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }
}

/// Sending half of a cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Concurrency, timeout, and cancellation settings for one execution pass.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    max_concurrency: usize,
    action_timeout: Duration,
    cancel: CancelSignal,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}

impl ExecutionContext {
    pub fn new(max_concurrency: usize, action_timeout: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            action_timeout,
            cancel: CancelSignal::never(),
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.max_concurrency, config.action_timeout())
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn action_timeout(&self) -> Duration {
        self.action_timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Run a single apply step under the timeout and cancel signal.
    pub async fn run_one<T, F>(&self, subject: &str, fut: F) -> Result<T, ExecutionFailure>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        if self.is_cancelled() {
            return Err(ExecutionFailure::cancelled(subject));
        }

        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(subject, "apply step cancelled");
                Err(ExecutionFailure::cancelled(subject))
            }
            res = tokio::time::timeout(self.action_timeout, fut) => match res {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(ExecutionFailure::failed(subject, format!("{e:#}"))),
                Err(_) => {
                    warn!(
                        subject,
                        timeout_ms = self.action_timeout.as_millis() as u64,
                        "apply step timed out"
                    );
                    Err(ExecutionFailure::timed_out(subject, self.action_timeout))
                }
            },
        }
    }

    /// Run `f` over every item with bounded concurrency.
    ///
    /// Each item is paired with a subject used in failure reports. The
    /// returned vector lines up index-for-index with `items`.
    pub async fn run_bounded<I, T, F>(
        &self,
        items: Vec<(String, I)>,
        f: F,
    ) -> Vec<Result<T, ExecutionFailure>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> BoxFuture<anyhow::Result<T>>,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut subjects = Vec::with_capacity(items.len());
        let mut set = JoinSet::new();

        for (index, (subject, item)) in items.into_iter().enumerate() {
            subjects.push(subject.clone());
            let fut = f(item);
            let ctx = self.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let mut cancel = ctx.cancel.clone();
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let result = match permit {
                    Some(_permit) => ctx.run_one(&subject, fut).await,
                    None => Err(ExecutionFailure::cancelled(&subject)),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<T, ExecutionFailure>>> =
            (0..subjects.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!(error = %e, "executor task aborted"),
            }
        }

        results
            .into_iter()
            .zip(subjects)
            .map(|(result, subject)| {
                result.unwrap_or_else(|| Err(ExecutionFailure::failed(subject, "task aborted")))
            })
            .collect()
    }
}

/// Recorded result of one apply step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Completed,
    /// Nothing to apply; counts as success.
    Skipped,
    Failed {
        error: String,
    },
    TimedOut {
        after_ms: u64,
    },
    Cancelled,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Completed | ActionOutcome::Skipped)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ActionOutcome::Cancelled)
    }

    pub fn from_result<T>(result: &Result<T, ExecutionFailure>) -> Self {
        match result {
            Ok(_) => ActionOutcome::Completed,
            Err(failure) => failure.into(),
        }
    }
}

impl From<&ExecutionFailure> for ActionOutcome {
    fn from(failure: &ExecutionFailure) -> Self {
        match &failure.kind {
            FailureKind::Failed { error } => ActionOutcome::Failed {
                error: error.clone(),
            },
            FailureKind::TimedOut { after_ms } => ActionOutcome::TimedOut {
                after_ms: *after_ms,
            },
            FailureKind::Cancelled => ActionOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn ctx(concurrency: usize, timeout_ms: u64) -> ExecutionContext {
        ExecutionContext::new(concurrency, Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn results_follow_input_order() {
        let items = (0..5u64)
            .map(|i| (format!("item-{i}"), i))
            .collect::<Vec<_>>();
        let results = ctx(3, 1_000)
            .run_bounded(items, |i| {
                Box::pin(async move {
                    // Later items finish first.
                    tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
                    Ok(i * 2)
                })
            })
            .await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let items = (0..8).map(|i| (format!("a{i}"), ())).collect::<Vec<_>>();

        let results = ctx(2, 1_000)
            .run_bounded(items, |_| {
                let active = active.clone();
                let peak = peak.clone();
                Box::pin(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn slow_step_times_out() {
        let result = ctx(1, 20)
            .run_one("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        let failure = result.unwrap_err();
        assert_eq!(failure.kind, FailureKind::TimedOut { after_ms: 20 });
        assert_eq!(
            ActionOutcome::from(&failure),
            ActionOutcome::TimedOut { after_ms: 20 }
        );
    }

    #[tokio::test]
    async fn failing_step_reports_error() {
        let result: Result<(), _> = ctx(1, 1_000)
            .run_one("broken", async { Err(anyhow::anyhow!("api unavailable")) })
            .await;
        let outcome = ActionOutcome::from_result(&result);
        assert_eq!(
            outcome,
            ActionOutcome::Failed {
                error: "api unavailable".into()
            }
        );
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn cancel_before_start_skips_everything() {
        let (handle, signal) = cancel_pair();
        handle.cancel();
        let calls = Arc::new(AtomicUsize::new(0));
        let items = (0..3).map(|i| (format!("a{i}"), ())).collect::<Vec<_>>();

        let results = ctx(2, 1_000)
            .with_cancel(signal)
            .run_bounded(items, |_| {
                let calls = calls.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .await;

        assert!(results.iter().all(|r| r.as_ref().unwrap_err().is_cancelled()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_interrupts_in_flight_steps() {
        let (handle, signal) = cancel_pair();
        let context = ctx(4, 30_000).with_cancel(signal);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let items = (0..2).map(|i| (format!("a{i}"), ())).collect::<Vec<_>>();
        let results = context
            .run_bounded(items, |_| {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok(())
                })
            })
            .await;
        canceller.await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.as_ref().unwrap_err().is_cancelled()));
        assert!(context.is_cancelled());
    }

    #[tokio::test]
    async fn never_signal_does_not_fire() {
        let signal = CancelSignal::never();
        assert!(!signal.is_cancelled());
        let mut waiting = signal.clone();
        let fired = tokio::time::timeout(Duration::from_millis(10), waiting.cancelled()).await;
        assert!(fired.is_err());
    }

    #[test]
    fn skipped_counts_as_success() {
        assert!(ActionOutcome::Skipped.is_success());
        assert!(ActionOutcome::Completed.is_success());
        assert!(!ActionOutcome::Cancelled.is_success());
    }
}
