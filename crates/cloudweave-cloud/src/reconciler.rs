//! Bounded poll/verify engine for asynchronous provisioning
//!
//! Providers acknowledge most mutations immediately and converge later. The
//! reconciler runs the side-effecting step once, then polls with a fixed
//! delay until the target state is reached, the provider reports a terminal
//! failure, or the attempt budget runs out.
//!
//! ```text
//! Created ──▶ Polling ──▶ Active
//!                │
//!                ├──────▶ Failed
//!                └──────▶ TimedOut
//! ```

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Attempt budget for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub max_attempts: u32,

    #[serde(with = "duration_millis")]
    pub delay: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Network objects: NLB activation, subnet activation, member changes.
    pub fn infrastructure() -> Self {
        Self::new(120, Duration::from_secs(1))
    }

    /// Compute objects: VM boot, image snapshots.
    pub fn compute() -> Self {
        Self::new(500, Duration::from_secs(3))
    }

    /// Zero-delay budget, for tests and in-memory providers.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Budgets for the two latency classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub infrastructure: PollPolicy,
    pub compute: PollPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            infrastructure: PollPolicy::infrastructure(),
            compute: PollPolicy::compute(),
        }
    }
}

impl ReconcilerConfig {
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            infrastructure: PollPolicy::immediate(max_attempts),
            compute: PollPolicy::immediate(max_attempts),
        }
    }
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not there yet; carries the last observed provider status
    Pending(String),
    /// Target state reached
    Reached(T),
    /// Provider reported a terminal failure; do not retry
    Failed(String),
}

/// Cancellation signal threaded through poll loops
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // sender lives in self, so wait_for only ends on cancellation
        let _ = rx.wait_for(|c| *c).await;
    }
}

/// Poll loop driver
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    policy: PollPolicy,
    cancel: Option<CancelToken>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::infrastructure()
    }
}

impl Reconciler {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Run `create` once, then poll until the target state.
    pub async fn provision<C, CFut, R, P, PFut, T>(
        &self,
        operation: &str,
        create: C,
        poll: P,
    ) -> Result<(R, T)>
    where
        C: FnOnce() -> CFut,
        CFut: Future<Output = Result<R>>,
        P: FnMut(&R) -> PFut,
        PFut: Future<Output = Result<PollStatus<T>>>,
    {
        self.check_cancelled(operation)?;
        let created = create().await?;
        tracing::debug!("{}: created, polling for target state", operation);

        let mut poll = poll;
        let reached = self.wait_for(operation, || poll(&created)).await?;
        Ok((created, reached))
    }

    /// Poll until the target state without a preceding create step.
    ///
    /// Returns after exactly `k` polls when the `k`-th poll reaches the
    /// target, and after exactly `max_attempts` polls on timeout. There is
    /// no sleep after the final attempt. An `Err` from `poll` aborts.
    pub async fn wait_for<P, PFut, T>(&self, operation: &str, mut poll: P) -> Result<T>
    where
        P: FnMut() -> PFut,
        PFut: Future<Output = Result<PollStatus<T>>>,
    {
        let mut last_observed = String::new();

        for attempt in 1..=self.policy.max_attempts {
            self.check_cancelled(operation)?;

            match poll().await? {
                PollStatus::Reached(value) => {
                    tracing::debug!("{}: reached target after {} polls", operation, attempt);
                    return Ok(value);
                }
                PollStatus::Failed(reason) => {
                    tracing::warn!("{}: provider reported failure: {}", operation, reason);
                    return Err(CloudError::UpstreamError(format!(
                        "{} failed: {}",
                        operation, reason
                    )));
                }
                PollStatus::Pending(observed) => {
                    tracing::debug!(
                        "{}: attempt {}/{} pending ({})",
                        operation,
                        attempt,
                        self.policy.max_attempts,
                        observed
                    );
                    last_observed = observed;
                }
            }

            if attempt < self.policy.max_attempts {
                self.sleep(operation).await?;
            }
        }

        tracing::warn!(
            "{}: gave up after {} attempts (last status: {})",
            operation,
            self.policy.max_attempts,
            last_observed
        );
        Err(CloudError::TimeoutExceeded {
            operation: operation.to_string(),
            attempts: self.policy.max_attempts,
        })
    }

    fn check_cancelled(&self, operation: &str) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                Err(CloudError::Cancelled(operation.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn sleep(&self, operation: &str) -> Result<()> {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = tokio::time::sleep(self.policy.delay) => Ok(()),
                    _ = token.cancelled() => Err(CloudError::Cancelled(operation.to_string())),
                }
            }
            None => {
                tokio::time::sleep(self.policy.delay).await;
                Ok(())
            }
        }
    }
}
