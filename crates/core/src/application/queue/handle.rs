// Task Handle - single-result reply for a submitted task

use crate::domain::{QueueId, TaskId, TaskState};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// Terminal outcome of a queued task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T, E> {
    /// The work returned `Ok`
    Completed(T),
    /// The work returned `Err`, carried verbatim
    Failed(E),
    /// The timeout elapsed before the work finished
    TimedOut(Duration),
    /// The work panicked or its supervisor went away
    Aborted(String),
}

impl<T, E> TaskOutcome<T, E> {
    /// Terminal state matching this outcome
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Completed(_) => TaskState::Completed,
            TaskOutcome::Failed(_) | TaskOutcome::Aborted(_) => TaskState::Failed,
            TaskOutcome::TimedOut(_) => TaskState::TimedOut,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, TaskOutcome::TimedOut(_))
    }
}

/// Handle to a submitted task.
///
/// Awaiting the handle yields the outcome exactly once. Dropping it does not
/// cancel the task; the queue still runs it to a terminal state.
pub struct TaskHandle<T, E> {
    id: TaskId,
    queue: QueueId,
    state: watch::Receiver<TaskState>,
    outcome: oneshot::Receiver<TaskOutcome<T, E>>,
}

impl<T, E> TaskHandle<T, E> {
    pub(super) fn new(
        id: TaskId,
        queue: QueueId,
        state: watch::Receiver<TaskState>,
        outcome: oneshot::Receiver<TaskOutcome<T, E>>,
    ) -> Self {
        Self {
            id,
            queue,
            state,
            outcome,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Wait until the task reaches `target` or any terminal state.
    /// Returns the state observed.
    pub async fn wait_for_state(&mut self, target: TaskState) -> TaskState {
        let observed = match self
            .state
            .wait_for(|s| *s == target || s.is_terminal())
            .await
        {
            Ok(state) => Some(*state),
            Err(_) => None,
        };
        // Supervisor gone; last value is final
        observed.unwrap_or_else(|| *self.state.borrow())
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = TaskOutcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.outcome).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(TaskOutcome::Aborted(
                "task supervisor dropped before reporting".to_string(),
            )),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> std::fmt::Debug for TaskHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("queue", &self.queue)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_state() {
        assert_eq!(
            TaskOutcome::<u8, ()>::Completed(1).state(),
            TaskState::Completed
        );
        assert_eq!(TaskOutcome::<u8, ()>::Failed(()).state(), TaskState::Failed);
        assert_eq!(
            TaskOutcome::<u8, ()>::Aborted("boom".into()).state(),
            TaskState::Failed
        );
        assert!(TaskOutcome::<u8, ()>::TimedOut(Duration::from_secs(1)).is_timed_out());
    }

    #[tokio::test]
    async fn test_dropped_sender_reports_aborted() {
        let (_state_tx, state_rx) = watch::channel(TaskState::Queued);
        let (outcome_tx, outcome_rx) = oneshot::channel::<TaskOutcome<u8, ()>>();
        let handle = TaskHandle::new(1, "q".to_string(), state_rx, outcome_rx);

        drop(outcome_tx);
        assert!(matches!(handle.await, TaskOutcome::Aborted(_)));
    }

    #[tokio::test]
    async fn test_wait_for_state_returns_last_value_when_sender_gone() {
        let (state_tx, state_rx) = watch::channel(TaskState::Queued);
        let (_outcome_tx, outcome_rx) = oneshot::channel::<TaskOutcome<u8, ()>>();
        let mut handle = TaskHandle::new(1, "q".to_string(), state_rx, outcome_rx);

        state_tx.send(TaskState::Running).unwrap();
        drop(state_tx);

        assert_eq!(
            handle.wait_for_state(TaskState::Completed).await,
            TaskState::Running
        );
    }

    #[tokio::test]
    async fn test_wait_for_state_stops_at_target() {
        let (state_tx, state_rx) = watch::channel(TaskState::Queued);
        let (_outcome_tx, outcome_rx) = oneshot::channel::<TaskOutcome<u8, ()>>();
        let mut handle = TaskHandle::new(1, "q".to_string(), state_rx, outcome_rx);

        state_tx.send(TaskState::Running).unwrap();
        assert_eq!(
            handle.wait_for_state(TaskState::Running).await,
            TaskState::Running
        );
    }
}
