// Slot accounting and FIFO admission
//
// All mutation happens under one short critical section; the lock is never
// held across an await point.

use crate::domain::TaskId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::trace;

/// Mutable queue state shared by the queue and its slots
#[derive(Default)]
pub(super) struct QueueState {
    pub next_id: TaskId,
    pub pending: VecDeque<Waiter>,
    pub running: usize,
    pub counters: QueueCounters,
}

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct QueueCounters {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
}

/// A submitted task waiting for admission
pub(super) struct Waiter {
    pub id: TaskId,
    pub admit: oneshot::Sender<Slot>,
}

/// How a freshly submitted task enters the queue
pub(super) enum Admission {
    /// A slot was free and nothing was waiting ahead of it
    Ready(Slot),
    /// Parked at the tail of `pending`
    Waiting(oneshot::Receiver<Slot>),
}

pub(super) type SharedState = Arc<Mutex<QueueState>>;

/// Register a new task. Returns its id and how it was admitted.
pub(super) fn enqueue(shared: &SharedState, limit: usize) -> (TaskId, Admission) {
    let mut state = shared.lock();
    state.next_id += 1;
    state.counters.submitted += 1;
    let id = state.next_id;

    // Admit directly only when no earlier task is still waiting
    if state.pending.is_empty() && state.running < limit {
        state.running += 1;
        return (id, Admission::Ready(Slot::new(shared.clone(), limit)));
    }

    let (admit, rx) = oneshot::channel();
    state.pending.push_back(Waiter { id, admit });
    (id, Admission::Waiting(rx))
}

/// Hand free slots to waiters, oldest first.
fn admit_waiting(shared: &SharedState, state: &mut QueueState, limit: usize) {
    while state.running < limit {
        let Some(waiter) = state.pending.pop_front() else {
            break;
        };
        state.running += 1;
        match waiter.admit.send(Slot::new(shared.clone(), limit)) {
            Ok(()) => trace!(task_id = waiter.id, "Task admitted from pending"),
            Err(mut slot) => {
                // Supervisor is gone; take the slot back without re-entering the lock
                slot.disarm();
                state.running -= 1;
            }
        }
    }
}

/// One unit of queue capacity. Dropping it frees the slot and admits the
/// next pending task.
pub(super) struct Slot {
    shared: Option<SharedState>,
    limit: usize,
}

impl Slot {
    fn new(shared: SharedState, limit: usize) -> Self {
        Self {
            shared: Some(shared),
            limit,
        }
    }

    fn disarm(&mut self) {
        self.shared = None;
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            let mut state = shared.lock();
            state.running = state.running.saturating_sub(1);
            admit_waiting(&shared, &mut state, self.limit);
        }
    }
}
