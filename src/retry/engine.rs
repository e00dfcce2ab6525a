use super::context::RetryContext;
use super::policy::RetryPolicy;
use crate::transport::{HttpResponse, Outcome, TransportError};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Observer invoked before every retry sleep.
pub type RetryObserver = Arc<dyn Fn(&RetryContext) + Send + Sync>;

/// What to do with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Retry under the policy at `policy_index` after `delay`.
    Retry { policy_index: usize, delay: Duration },
    /// Hand the outcome back to the caller as-is.
    Propagate,
}

/// Ordered chain of retry policies; the first policy whose predicate matches
/// an outcome governs it.
///
/// An engine with no policies sends every request exactly once.
#[derive(Clone, Default)]
pub struct RetryEngine {
    policies: Vec<Arc<dyn RetryPolicy>>,
    on_retry: Option<RetryObserver>,
}

impl RetryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    pub fn with_policies(mut self, policies: Vec<Arc<dyn RetryPolicy>>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Register an observer called before each retry (for metrics or progress output).
    pub fn on_retry(mut self, observer: impl Fn(&RetryContext) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn policy_keys(&self) -> Vec<&str> {
        self.policies.iter().map(|p| p.key()).collect()
    }

    /// Upper bound on the time one operation can spend sleeping between retries.
    ///
    /// Callers should keep the per-request timeout above this value. Saturates
    /// at [`Duration::MAX`].
    pub fn worst_case_delay(&self) -> Duration {
        self.policies
            .iter()
            .fold(Duration::ZERO, |acc, p| acc.saturating_add(p.total_delay()))
    }

    /// Whether some policy in the chain handles the failure behind `err`.
    ///
    /// Tells "the chain gave up" apart from "no policy applies".
    pub fn governs(&self, err: &Error) -> bool {
        let outcome: Outcome = match err {
            Error::Transport(TransportError::Status { status, body }) => {
                Ok(HttpResponse::new(*status, body.clone()))
            }
            Error::Transport(e) => Err(e.clone()),
            _ => return false,
        };
        self.policies.iter().any(|p| p.matches(&outcome))
    }

    /// `counters[i]` is the number of retries policy `i` already granted.
    pub(crate) fn decide(&self, outcome: &Outcome, counters: &[u32]) -> Decision {
        let Some(index) = self.policies.iter().position(|p| p.matches(outcome)) else {
            return Decision::Propagate;
        };
        let policy = &self.policies[index];
        let used = counters.get(index).copied().unwrap_or(0);
        if used >= policy.max_retries() {
            return Decision::Propagate;
        }
        Decision::Retry {
            policy_index: index,
            delay: policy.delay_before_attempt(used + 1),
        }
    }

    /// Run `send` until the policy chain stops asking for retries.
    ///
    /// Returns the last response whatever its status, the last transport
    /// error unchanged, or [`Error::Cancelled`] if `cancel` fires during a
    /// retry sleep. An exchange already in flight is never interrupted.
    pub async fn execute<F, Fut>(
        &self,
        operation: &str,
        cancel: Option<&CancellationToken>,
        mut send: F,
    ) -> Result<HttpResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut counters = vec![0u32; self.policies.len()];
        let mut elapsed_wait = Duration::ZERO;

        loop {
            let outcome = send().await;

            let (policy_index, delay) = match self.decide(&outcome, &counters) {
                Decision::Propagate => return outcome.map_err(Error::Transport),
                Decision::Retry {
                    policy_index,
                    delay,
                } => (policy_index, delay),
            };

            counters[policy_index] += 1;
            elapsed_wait = elapsed_wait.saturating_add(delay);
            let policy = &self.policies[policy_index];
            let ctx = RetryContext {
                policy_key: policy.key().to_string(),
                attempt: counters[policy_index],
                remaining: policy.max_retries() - counters[policy_index],
                delay,
                elapsed_wait,
                operation: operation.to_string(),
            };

            info!(
                policy_key = ctx.policy_key.as_str(),
                attempt = ctx.attempt,
                remaining = ctx.remaining,
                delay_ms = delay.as_millis() as u64,
                operation,
                "Retry {} for policy with key {}",
                ctx.attempt,
                ctx.policy_key
            );
            if let Some(observer) = &self.on_retry {
                observer(&ctx);
            }

            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            debug!(operation, "retry sleep cancelled");
                            return Err(Error::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}

impl std::fmt::Debug for RetryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryEngine")
            .field("policies", &self.policy_keys())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}
