// Task Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Task identifier, unique within its queue and increasing in submission order
pub type TaskId = u64;

/// Task lifecycle state
///
/// `Queued -> Running -> {Completed | Failed | TimedOut}`. Terminal states
/// are irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Queued,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::TimedOut
        )
    }

    pub fn can_transition_to(&self, next: TaskState) -> bool {
        match self {
            TaskState::Queued => next == TaskState::Running,
            TaskState::Running => next.is_terminal(),
            _ => false,
        }
    }

    /// Validated transition
    pub fn transition(self, next: TaskState) -> Result<TaskState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Queued => write!(f, "QUEUED"),
            TaskState::Running => write!(f, "RUNNING"),
            TaskState::Completed => write!(f, "COMPLETED"),
            TaskState::Failed => write!(f, "FAILED"),
            TaskState::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}
