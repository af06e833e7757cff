//! Result of a single runner invocation.

use crate::runner::RunnerError;
use crate::task::Task;

/// What happened when one runner processed one task
///
/// The invocation wrapper turns whatever the runner raised into one of these;
/// the dispatch loop switches on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The runner's stream was drained without a signal
    Continue,
    /// The runner stopped all processing of the task
    Abort {
        /// Reason given by the runner
        reason: String,
    },
    /// The runner stepped aside; siblings may still run
    Skip {
        /// Reason given by the runner
        reason: String,
    },
    /// The runner asked for a retry; `budget` is the task's remaining budget
    RetryWithBudget {
        /// Retry budget of the task that failed (before decrement)
        budget: u32,
        /// Reason given by the runner
        reason: String,
    },
    /// The runner (or routing its output) failed unexpectedly
    Failed(String),
}

impl Outcome {
    /// Map a runner signal onto an outcome for `task`
    pub fn from_signal(signal: RunnerError, task: &Task) -> Self {
        match signal {
            RunnerError::Abort { reason } => Outcome::Abort { reason },
            RunnerError::Skip { reason } => Outcome::Skip { reason },
            RunnerError::Retry { reason } => Outcome::RetryWithBudget {
                budget: task.retry(),
                reason,
            },
            RunnerError::Failed(error) => Outcome::Failed(error.to_string()),
        }
    }
}
