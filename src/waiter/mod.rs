//! Completion waiter: submit once, then poll until the task is terminal, the
//! wait budget runs out, or the caller cancels.
//!
//! ```rust,no_run
//! use ocr_cloud_sdk::{AuthInfo, ImageProcessingParams, OcrClient, WaitOptions, WaitOutcome};
//! use std::time::Duration;
//!
//! # async fn run() -> ocr_cloud_sdk::Result<()> {
//! let client = OcrClient::new(AuthInfo::new("https://cloud-westus.ocrsdk.com", "app", "pw")?)?;
//! let image = std::fs::read("scan.jpg")?;
//! let options = WaitOptions::new().with_max_wait(Duration::from_secs(120));
//!
//! match client
//!     .process_and_wait(&ImageProcessingParams::default(), image, options)
//!     .await?
//! {
//!     WaitOutcome::Completed(task) => println!("{}: {:?}", task.status, task.result_urls),
//!     WaitOutcome::TimedOut(task) => println!("still running, resume with {}", task.task_id),
//!     WaitOutcome::Cancelled(_) => println!("cancelled"),
//! }
//! # Ok(())
//! # }
//! ```

mod state;

pub use state::{Event, WaitState};

use crate::client::OcrClient;
use crate::types::{ImageProcessingParams, ProcessingParams, Task, TaskStatus};
use crate::Result;
use bytes::Bytes;
use state::{transition, Budget};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Poll interval used when neither the caller nor the service suggests one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Wait budget used when the caller does not set one.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Per-invocation wait options. Unset fields fall back to the client's
/// defaults, then to [`DEFAULT_MAX_WAIT`] / [`DEFAULT_POLL_INTERVAL`].
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub max_wait: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Fixed interval between status queries. Overrides the server's
    /// suggested interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn budget(&self, defaults: &WaitOptions) -> Budget {
        Budget {
            max_wait: self
                .max_wait
                .or(defaults.max_wait)
                .unwrap_or(DEFAULT_MAX_WAIT),
            poll_interval: self.poll_interval.or(defaults.poll_interval),
        }
    }
}

/// How a wait ended. Errors travel separately in the `Err` channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The task reached a terminal status. A `Failed` task lands here too.
    Completed(Task),
    /// The budget ran out; the task id can be handed to
    /// [`OcrClient::wait_for_task`] later.
    TimedOut(Task),
    /// The cancellation token fired. Carries the last snapshot if the
    /// submission had already been accepted.
    Cancelled(Option<Task>),
}

impl WaitOutcome {
    pub fn task(&self) -> Option<&Task> {
        match self {
            WaitOutcome::Completed(t) | WaitOutcome::TimedOut(t) => Some(t),
            WaitOutcome::Cancelled(t) => t.as_ref(),
        }
    }

    pub fn into_task(self) -> Option<Task> {
        match self {
            WaitOutcome::Completed(t) | WaitOutcome::TimedOut(t) => Some(t),
            WaitOutcome::Cancelled(t) => t,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, WaitOutcome::Completed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled(_))
    }
}

impl OcrClient {
    /// Submit `content` once and wait for the resulting task to finish.
    ///
    /// Every call creates a new task; identical parameters are never
    /// deduplicated.
    pub async fn process_and_wait<P: ProcessingParams>(
        &self,
        params: &P,
        content: impl Into<Bytes>,
        options: WaitOptions,
    ) -> Result<WaitOutcome> {
        let params: &dyn ProcessingParams = params;
        self.run_wait(WaitState::Created, Some((params, content.into())), options)
            .await
    }

    pub async fn process_image_and_wait(
        &self,
        params: &ImageProcessingParams,
        content: impl Into<Bytes>,
        options: WaitOptions,
    ) -> Result<WaitOutcome> {
        self.process_and_wait(params, content, options).await
    }

    /// Resume waiting on an already submitted task, e.g. after a
    /// [`WaitOutcome::TimedOut`]. The first status query is issued immediately.
    pub async fn wait_for_task(&self, task_id: &str, options: WaitOptions) -> Result<WaitOutcome> {
        let start = WaitState::Submitted(Task::new(task_id, TaskStatus::Submitted));
        self.run_wait(start, None, options).await
    }

    async fn run_wait(
        &self,
        mut state: WaitState,
        mut submission: Option<(&dyn ProcessingParams, Bytes)>,
        options: WaitOptions,
    ) -> Result<WaitOutcome> {
        let budget = options.budget(&self.wait_defaults);
        let cancel = options.cancel.as_ref();
        let started = Instant::now();
        let mut polls = 0u32;

        while !state.is_final() {
            let event = if cancel.is_some_and(|t| t.is_cancelled()) {
                Event::Cancelled
            } else {
                match &state {
                    WaitState::Created => match submission.take() {
                        Some((params, content)) => {
                            Event::Submitted(self.submit_with(params, content, cancel).await)
                        }
                        None => Event::Cancelled,
                    },
                    WaitState::Submitted(task) | WaitState::Polling(task) => {
                        polls += 1;
                        debug!(task_id = task.task_id.as_str(), poll = polls, "querying task status");
                        let result = self.get_task_status_with(&task.task_id, cancel).await;
                        if cancel.is_some_and(|t| t.is_cancelled()) {
                            // The exchange finished after cancellation; drop its result.
                            Event::Cancelled
                        } else {
                            match result {
                                Err(e) if e.is_retriable() && !self.retry.governs(&e) => {
                                    warn!(
                                        task_id = task.task_id.as_str(),
                                        poll = polls,
                                        error = %e,
                                        "status check failed, polling continues"
                                    );
                                    Event::StatusUnavailable(e)
                                }
                                other => Event::StatusReceived(other),
                            }
                        }
                    }
                    WaitState::Sleeping { delay, .. } => sleep_or_cancel(*delay, cancel).await,
                    _ => break,
                }
            };
            state = transition(state, event, started.elapsed(), &budget);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match state {
            WaitState::Completed(task) => {
                info!(
                    task_id = task.task_id.as_str(),
                    status = task.status.as_str(),
                    polls,
                    duration_ms = elapsed_ms,
                    "task reached terminal status"
                );
                Ok(WaitOutcome::Completed(task))
            }
            WaitState::TimedOut(task) => {
                info!(
                    task_id = task.task_id.as_str(),
                    status = task.status.as_str(),
                    polls,
                    max_wait_ms = budget.max_wait.as_millis() as u64,
                    "wait budget exhausted"
                );
                Ok(WaitOutcome::TimedOut(task))
            }
            WaitState::Cancelled(task) => {
                info!(
                    task_id = task.as_ref().map(|t| t.task_id.as_str()).unwrap_or(""),
                    polls,
                    duration_ms = elapsed_ms,
                    "wait cancelled"
                );
                Ok(WaitOutcome::Cancelled(task))
            }
            WaitState::Errored(e) => {
                info!(polls, duration_ms = elapsed_ms, error = %e, "wait failed");
                Err(e)
            }
            // The loop only exits on a final state.
            other => Err(crate::Error::protocol(format!(
                "wait stopped in non-final state {:?}",
                other
            ))),
        }
    }
}

async fn sleep_or_cancel(delay: Duration, cancel: Option<&CancellationToken>) -> Event {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = token.cancelled() => Event::Cancelled,
                _ = tokio::time::sleep(delay) => Event::SleepElapsed,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            Event::SleepElapsed
        }
    }
}
