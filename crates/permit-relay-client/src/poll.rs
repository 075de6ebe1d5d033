//! Status polling of a submitted relay task.
//!
//! The poller queries the relay at a fixed interval until the task reports a
//! transaction hash or a terminal state, or until the attempt budget is spent.
//! Running out of attempts is not an error: the caller gets the last status
//! observed and decides what "still pending" means for it.

use std::time::Duration;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::relay::Relay;
use crate::types::{TaskId, TaskStatus};

/// Polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait between two status queries.
    pub interval: Duration,
    /// Status queries before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_attempts: 60,
        }
    }
}

/// Result of polling a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A transaction hash or a terminal state was observed.
    Terminal(TaskStatus),
    /// Attempts ran out first. Carries the last status successfully read, if any.
    Inconclusive(Option<TaskStatus>),
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollOutcome::Terminal(_))
    }

    /// The most recent status observed.
    pub fn status(&self) -> Option<&TaskStatus> {
        match self {
            PollOutcome::Terminal(status) => Some(status),
            PollOutcome::Inconclusive(status) => status.as_ref(),
        }
    }
}

/// Polls `task_id` on `relay` until it settles or `config.max_attempts` queries are spent.
///
/// A failed query is logged and counts as an attempt; polling carries on.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "relay.poll_task", skip_all, fields(task_id = %task_id))
)]
pub async fn poll_task<R>(relay: &R, task_id: &TaskId, config: &PollConfig) -> PollOutcome
where
    R: Relay + Sync,
{
    let mut last_status = None;
    for attempt in 1..=config.max_attempts {
        match relay.task_status(task_id).await {
            Ok(status) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(
                    attempt,
                    state = %status.task_state,
                    tx_hash = status.transaction_hash(),
                    message = status.last_check_message.as_deref(),
                    "Task status"
                );
                if status.is_terminal() {
                    return PollOutcome::Terminal(status);
                }
                last_status = Some(status);
            }
            Err(_err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(attempt, error = %_err, "Task status query failed");
            }
        }
        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }
    #[cfg(feature = "telemetry")]
    tracing::warn!(max_attempts = config.max_attempts, "Task still pending after all attempts");
    PollOutcome::Inconclusive(last_status)
}
