//! Retry policy engine.
//!
//! Different failure classes (gateway timeouts, connection resets, throttling)
//! get their own [`RetryPolicy`] with its own delay and attempt cap. The
//! [`RetryEngine`] evaluates the chain in order and lets the first matching
//! policy decide.
//!
//! ```rust
//! use ocr_cloud_sdk::retry::{RetryEngine, WaitAndRetry};
//! use std::time::Duration;
//!
//! let engine = RetryEngine::new()
//!     .with_policy(WaitAndRetry::gateway_timeout(3, Duration::from_secs(3)))
//!     .with_policy(WaitAndRetry::transport_failures(2, Duration::from_secs(1)));
//!
//! // The request timeout must stay above this bound.
//! assert_eq!(engine.worst_case_delay(), Duration::from_secs(11));
//! ```

mod context;
mod engine;
mod policy;

pub use context::RetryContext;
pub use engine::{RetryEngine, RetryObserver};
pub use policy::{RetryCondition, RetryPolicy, WaitAndRetry, GATEWAY_TIMEOUT_POLICY_KEY};
