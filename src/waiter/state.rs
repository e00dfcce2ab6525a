//! Explicit wait state machine.
//!
//! [`transition`] is pure: it never performs I/O or reads the clock. The
//! driver in the parent module performs the action each state asks for
//! (submit, query, sleep) and feeds the result back in as an [`Event`].

use crate::types::Task;
use crate::{Error, Result};
use std::time::Duration;

use super::DEFAULT_POLL_INTERVAL;

/// Resolved per-invocation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Budget {
    pub max_wait: Duration,
    /// Caller-supplied interval; wins over the server suggestion when set.
    pub poll_interval: Option<Duration>,
}

impl Budget {
    /// Caller value, then the server's suggestion, then [`DEFAULT_POLL_INTERVAL`].
    pub fn interval_for(&self, task: &Task) -> Duration {
        self.poll_interval
            .filter(|d| !d.is_zero())
            .or_else(|| task.suggested_poll_interval())
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }
}

#[derive(Debug)]
pub enum WaitState {
    /// Nothing submitted yet.
    Created,
    /// Submission accepted; the first status query is due immediately.
    Submitted(Task),
    /// A sleep finished; the next status query is due.
    Polling(Task),
    /// Last snapshot was non-terminal; sleep `delay` before querying again.
    Sleeping { task: Task, delay: Duration },
    /// Terminal service status observed (including `Failed`).
    Completed(Task),
    /// Budget exhausted while the task was still running.
    TimedOut(Task),
    /// Caller cancelled; carries the last known snapshot, if any.
    Cancelled(Option<Task>),
    /// Submission or status query failed after the retry chain gave up.
    Errored(Error),
}

impl WaitState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            WaitState::Completed(_)
                | WaitState::TimedOut(_)
                | WaitState::Cancelled(_)
                | WaitState::Errored(_)
        )
    }

    /// Last snapshot held by this state.
    pub fn task(&self) -> Option<&Task> {
        match self {
            WaitState::Submitted(t)
            | WaitState::Polling(t)
            | WaitState::Sleeping { task: t, .. }
            | WaitState::Completed(t)
            | WaitState::TimedOut(t) => Some(t),
            WaitState::Cancelled(t) => t.as_ref(),
            WaitState::Created | WaitState::Errored(_) => None,
        }
    }

    fn into_task(self) -> Option<Task> {
        match self {
            WaitState::Submitted(t)
            | WaitState::Polling(t)
            | WaitState::Sleeping { task: t, .. }
            | WaitState::Completed(t)
            | WaitState::TimedOut(t) => Some(t),
            WaitState::Cancelled(t) => t,
            WaitState::Created | WaitState::Errored(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum Event {
    Submitted(Result<Task>),
    StatusReceived(Result<Task>),
    /// Transient status failure that no retry policy handles. Polling goes on.
    StatusUnavailable(Error),
    SleepElapsed,
    Cancelled,
}

/// Advance the machine by one event.
///
/// `elapsed` is the time since the wait began. Final states absorb every
/// event, and so does any state paired with an event it does not expect.
pub(crate) fn transition(
    state: WaitState,
    event: Event,
    elapsed: Duration,
    budget: &Budget,
) -> WaitState {
    if state.is_final() {
        return state;
    }
    match (state, event) {
        (state, Event::Cancelled) => WaitState::Cancelled(state.into_task()),

        (WaitState::Created, Event::Submitted(Ok(task))) => WaitState::Submitted(task),
        (WaitState::Created, Event::Submitted(Err(Error::Cancelled))) => WaitState::Cancelled(None),
        (WaitState::Created, Event::Submitted(Err(e))) => WaitState::Errored(e),

        (WaitState::Submitted(last) | WaitState::Polling(last), Event::StatusReceived(result)) => {
            match result {
                Ok(task) => after_status(task, elapsed, budget),
                // Retry sleep interrupted by the cancellation token.
                Err(Error::Cancelled) => WaitState::Cancelled(Some(last)),
                Err(e) => WaitState::Errored(e),
            }
        }

        (WaitState::Submitted(last) | WaitState::Polling(last), Event::StatusUnavailable(_)) => {
            schedule_next(last, elapsed, budget)
        }

        (WaitState::Sleeping { task, .. }, Event::SleepElapsed) => WaitState::Polling(task),

        (state, _) => state,
    }
}

fn after_status(task: Task, elapsed: Duration, budget: &Budget) -> WaitState {
    if task.is_terminal() {
        return WaitState::Completed(task);
    }
    schedule_next(task, elapsed, budget)
}

fn schedule_next(task: Task, elapsed: Duration, budget: &Budget) -> WaitState {
    if elapsed >= budget.max_wait {
        return WaitState::TimedOut(task);
    }
    let remaining = budget.max_wait - elapsed;
    let delay = budget.interval_for(&task).min(remaining);
    WaitState::Sleeping { task, delay }
}
