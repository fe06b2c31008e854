// Named Queue - bounded-concurrency FIFO admission of async tasks
//
// Each submitted task gets a supervisor: it waits for a slot, runs the work on
// its own tokio task, races it against the timeout, records the terminal state
// and hands the outcome to the submitter. The timer starts at admission.
// A timed-out task's work is detached, not aborted.
//
// FIFO applies to slot grants: waiters are admitted in submission order. On a
// multi-thread runtime, admitted tasks may begin executing their work in a
// different order when several slots are granted at once.

mod handle;
mod slot;

pub use handle::{TaskHandle, TaskOutcome};

use crate::domain::{DomainError, QueueConfig, TaskId, TaskState};
use serde::{Deserialize, Serialize};
use slot::{Admission, QueueState, SharedState};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;
use tracing::{debug, error, info_span, warn, Instrument};

/// Point-in-time view of a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub name: String,
    /// `None` when unbounded
    pub concurrency_limit: Option<usize>,
    pub default_timeout_ms: Option<u64>,
    pub pending: usize,
    pub running: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Creation time (ms since epoch)
    pub created_at: i64,
}

/// A named scheduling domain
pub struct TaskQueue {
    config: QueueConfig,
    created_at: i64,
    shared: SharedState,
}

impl TaskQueue {
    /// Create a queue.
    ///
    /// # Errors
    /// - DomainError::InvalidQueueConfig on an empty name, zero
    ///   concurrency or zero timeout
    pub fn new(config: QueueConfig, created_at: i64) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            config,
            created_at,
            shared: Arc::new(parking_lot::Mutex::new(QueueState::default())),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Submit `work` for execution.
    ///
    /// `timeout` overrides the queue's default timeout for this task. The
    /// work is not invoked until the task is admitted. Must be called from
    /// within a tokio runtime.
    pub fn submit<F, Fut, T, E>(&self, work: F, timeout: Option<Duration>) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (id, admission) = slot::enqueue(&self.shared, self.config.slot_limit());
        let (state_tx, state_rx) = watch::channel(TaskState::Queued);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let timeout = timeout.or(self.config.default_timeout);

        debug!(queue = %self.config.name, task_id = id, "Task submitted");

        let span = info_span!("queued_task", queue = %self.config.name, task_id = id);
        let shared = self.shared.clone();
        tokio::spawn(
            async move {
                let outcome = supervise(id, admission, work, timeout, &state_tx).await;
                record(&shared, &outcome);
                advance(&state_tx, outcome.state());
                // Submitter may have dropped the handle
                let _ = outcome_tx.send(outcome);
            }
            .instrument(span),
        );

        TaskHandle::new(id, self.config.name.clone(), state_rx, outcome_rx)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.shared.lock();
        QueueSnapshot {
            name: self.config.name.clone(),
            concurrency_limit: self.config.concurrency,
            default_timeout_ms: self.config.default_timeout.map(|d| d.as_millis() as u64),
            pending: state.pending.len(),
            running: state.running,
            submitted: state.counters.submitted,
            completed: state.counters.completed,
            failed: state.counters.failed,
            timed_out: state.counters.timed_out,
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("config", &self.config)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Wait for admission, run the work and produce its outcome.
/// The slot is released when this returns.
async fn supervise<F, Fut, T, E>(
    id: TaskId,
    admission: Admission,
    work: F,
    timeout: Option<Duration>,
    state_tx: &watch::Sender<TaskState>,
) -> TaskOutcome<T, E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let _slot = match admission {
        Admission::Ready(slot) => slot,
        Admission::Waiting(rx) => match rx.await {
            Ok(slot) => slot,
            Err(_) => return TaskOutcome::Aborted("queue dropped before admission".to_string()),
        },
    };
    advance(state_tx, TaskState::Running);
    debug!(task_id = id, "Task admitted");

    let mut join = tokio::spawn(work());
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut join).await {
            Ok(joined) => from_join(joined),
            Err(_) => {
                warn!(
                    task_id = id,
                    timeout_ms = limit.as_millis() as u64,
                    "Task timed out, work left running detached"
                );
                TaskOutcome::TimedOut(limit)
            }
        },
        None => from_join(join.await),
    }
}

fn from_join<T, E>(joined: Result<Result<T, E>, JoinError>) -> TaskOutcome<T, E> {
    match joined {
        Ok(Ok(value)) => TaskOutcome::Completed(value),
        Ok(Err(err)) => TaskOutcome::Failed(err),
        Err(join_err) if join_err.is_panic() => {
            let panic_msg = panic_message(join_err.into_panic());
            error!(panic_msg = %panic_msg, "Queued task panicked");
            TaskOutcome::Aborted(panic_msg)
        }
        Err(_) => TaskOutcome::Aborted("task cancelled".to_string()),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn record<T, E>(shared: &SharedState, outcome: &TaskOutcome<T, E>) {
    let mut state = shared.lock();
    match outcome.state() {
        TaskState::Completed => state.counters.completed += 1,
        TaskState::TimedOut => state.counters.timed_out += 1,
        _ => state.counters.failed += 1,
    }
}

/// Move the published state forward along the task lifecycle
fn advance(state_tx: &watch::Sender<TaskState>, next: TaskState) {
    state_tx.send_if_modified(|current| match current.transition(next) {
        Ok(state) => {
            *current = state;
            true
        }
        Err(e) => {
            warn!(error = %e, "Ignoring task state change");
            false
        }
    });
}
