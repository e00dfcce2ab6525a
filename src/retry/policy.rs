//! Retry policies: a predicate over an exchange outcome paired with a fixed
//! delay schedule and an attempt cap.

use crate::transport::Outcome;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Key of the stock 504 policy, kept stable so logs stay greppable.
pub const GATEWAY_TIMEOUT_POLICY_KEY: &str = "WaitAndRetryAsync_For_GatewayTimeout_504__StatusCode";

/// One independent retry rule.
///
/// Policies never share counters: the engine tracks each policy's attempts
/// separately against that policy's own [`max_retries`](RetryPolicy::max_retries).
pub trait RetryPolicy: Send + Sync {
    /// Diagnostic key, only used for logging and [`super::RetryContext`].
    fn key(&self) -> &str;

    /// Whether this policy governs the given outcome.
    fn matches(&self, outcome: &Outcome) -> bool;

    /// Delay before retry number `attempt` (1-based).
    fn delay_before_attempt(&self, attempt: u32) -> Duration;

    /// Maximum number of retries this policy grants (not counting the first call).
    fn max_retries(&self) -> u32;

    /// Sum of every delay this policy can impose, saturating at [`Duration::MAX`].
    ///
    /// The default walks each attempt; policies with a closed form should
    /// override it.
    fn total_delay(&self) -> Duration {
        (1..=self.max_retries()).fold(Duration::ZERO, |acc, attempt| {
            acc.saturating_add(self.delay_before_attempt(attempt))
        })
    }
}

/// Which outcomes a [`WaitAndRetry`] policy handles.
#[derive(Clone)]
pub enum RetryCondition {
    /// Responses carrying one of these HTTP statuses.
    StatusCodes(Vec<u16>),
    /// Any 5xx response.
    ServerErrors,
    /// Retriable transport failures (timeouts, connection resets).
    TransportFailures,
    Custom(Arc<dyn Fn(&Outcome) -> bool + Send + Sync>),
}

impl fmt::Debug for RetryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryCondition::StatusCodes(codes) => f.debug_tuple("StatusCodes").field(codes).finish(),
            RetryCondition::ServerErrors => f.write_str("ServerErrors"),
            RetryCondition::TransportFailures => f.write_str("TransportFailures"),
            RetryCondition::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl RetryCondition {
    pub fn matches(&self, outcome: &Outcome) -> bool {
        match (self, outcome) {
            (RetryCondition::StatusCodes(codes), Ok(resp)) => codes.contains(&resp.status),
            (RetryCondition::ServerErrors, Ok(resp)) => (500..600).contains(&resp.status),
            (RetryCondition::TransportFailures, Err(e)) => e.is_retriable(),
            (RetryCondition::Custom(pred), outcome) => pred(outcome),
            _ => false,
        }
    }
}

/// Fixed-delay retry policy.
///
/// The delay does not grow with the attempt number, so the worst case of a
/// policy is simply `delay * max_retries`.
#[derive(Debug, Clone)]
pub struct WaitAndRetry {
    key: String,
    condition: RetryCondition,
    max_retries: u32,
    delay: Duration,
}

impl WaitAndRetry {
    pub fn new(key: impl Into<String>, condition: RetryCondition) -> Self {
        Self {
            key: key.into(),
            condition,
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }

    /// Retry on `504 Gateway Timeout`.
    pub fn gateway_timeout(max_retries: u32, delay: Duration) -> Self {
        Self::new(
            GATEWAY_TIMEOUT_POLICY_KEY,
            RetryCondition::StatusCodes(vec![504]),
        )
        .with_max_retries(max_retries)
        .with_delay(delay)
    }

    /// Retry on timeouts and connection failures.
    pub fn transport_failures(max_retries: u32, delay: Duration) -> Self {
        Self::new(
            "WaitAndRetryAsync_For_TransportFailures",
            RetryCondition::TransportFailures,
        )
        .with_max_retries(max_retries)
        .with_delay(delay)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn condition(&self) -> &RetryCondition {
        &self.condition
    }
}

impl RetryPolicy for WaitAndRetry {
    fn key(&self) -> &str {
        &self.key
    }

    fn matches(&self, outcome: &Outcome) -> bool {
        self.condition.matches(outcome)
    }

    fn delay_before_attempt(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn total_delay(&self) -> Duration {
        self.delay.saturating_mul(self.max_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, TransportError};

    #[test]
    fn test_gateway_timeout_policy_matches_only_504() {
        let p = WaitAndRetry::gateway_timeout(3, Duration::from_millis(3000));
        assert_eq!(p.key(), "WaitAndRetryAsync_For_GatewayTimeout_504__StatusCode");
        assert!(p.matches(&Ok(HttpResponse::new(504, ""))));
        assert!(!p.matches(&Ok(HttpResponse::new(503, ""))));
        assert!(!p.matches(&Ok(HttpResponse::new(200, ""))));
        assert!(!p.matches(&Err(TransportError::Timeout("t".into()))));
    }

    #[test]
    fn test_transport_failure_policy_ignores_responses() {
        let p = WaitAndRetry::transport_failures(2, Duration::from_millis(10));
        assert!(p.matches(&Err(TransportError::Connection("reset".into()))));
        assert!(p.matches(&Err(TransportError::Timeout("read".into()))));
        assert!(!p.matches(&Err(TransportError::Malformed("eof".into()))));
        assert!(!p.matches(&Ok(HttpResponse::new(500, ""))));
    }

    #[test]
    fn test_server_errors_condition() {
        let c = RetryCondition::ServerErrors;
        assert!(c.matches(&Ok(HttpResponse::new(500, ""))));
        assert!(c.matches(&Ok(HttpResponse::new(599, ""))));
        assert!(!c.matches(&Ok(HttpResponse::new(429, ""))));
    }

    #[test]
    fn test_custom_condition() {
        let c = RetryCondition::Custom(Arc::new(|o: &Outcome| {
            matches!(o, Ok(r) if r.status == 429)
        }));
        assert!(c.matches(&Ok(HttpResponse::new(429, ""))));
        assert!(!c.matches(&Ok(HttpResponse::new(200, ""))));
        assert_eq!(format!("{:?}", c), "Custom(..)");
    }

    #[test]
    fn test_fixed_delay_does_not_grow() {
        let p = WaitAndRetry::new("k", RetryCondition::ServerErrors)
            .with_delay(Duration::from_millis(250));
        assert_eq!(p.delay_before_attempt(1), Duration::from_millis(250));
        assert_eq!(p.delay_before_attempt(7), Duration::from_millis(250));
        assert_eq!(p.total_delay(), Duration::from_millis(750));
    }

    #[test]
    fn test_total_delay_saturates() {
        let p = WaitAndRetry::new("k", RetryCondition::ServerErrors)
            .with_max_retries(u32::MAX)
            .with_delay(Duration::MAX);
        assert_eq!(p.total_delay(), Duration::MAX);
    }
}
