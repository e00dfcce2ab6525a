use std::time::Duration;

/// Snapshot handed to retry observers right before a retry sleep.
///
/// Lives for one logical operation (one submit or one status call).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    /// Key of the policy that governs this retry.
    pub policy_key: String,
    /// 1-based retry number for this policy.
    pub attempt: u32,
    /// Retries this policy still grants after this one.
    pub remaining: u32,
    /// Delay about to be slept.
    pub delay: Duration,
    /// Total time slept so far in this operation, across all policies, including `delay`.
    pub elapsed_wait: Duration,
    /// Logical operation name (e.g. "getTaskStatus").
    pub operation: String,
}
