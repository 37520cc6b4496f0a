//! Process-wide state/event emitter (C12).
//!
//! [`EventBus`] is a type-tagged pub/sub bus: every subscriber gets its own
//! independent [`tokio::sync::broadcast::Receiver`], so a panic or dropped
//! receiver in one listener can never affect another. [`TaskStateStore`]
//! layers a per-task [`TaskState`] record on top, emitting a `StateChanged`
//! event on every mutation.

use std::time::SystemTime;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::state::HaltConfig;

/// Default channel capacity; slow subscribers that fall this far behind see
/// a `Lagged` error from `recv()` and must resync rather than block publishers.
const DEFAULT_BUS_CAPACITY: usize = 256;

/// A single process-wide event. Closed set, mirroring the shape of
/// `stream_event::ProtocolEvent` but scoped to task lifecycle notifications
/// rather than graph node streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    /// A `TaskState` field changed (status, error counters, iteration count, ...).
    StateChanged { task_id: String },
    /// A child task was spawned from a parent.
    TaskSpawned {
        parent_id: String,
        root_id: String,
        child_id: String,
    },
    /// The task tree changed shape (tree_edit applied).
    TaskTreeUpdated {
        parent_id: String,
        child_ids: Vec<String>,
        removed_ids: Vec<String>,
    },
    /// A task was paused.
    TaskPaused { task_id: String, reason: Option<String> },
    /// A paused task resumed.
    TaskResumed { task_id: String, reason: Option<String> },
    /// A spawned child task finished and reported its summary upward.
    TaskChildResult { parent_id: String, summary: String },
}

/// Process-wide bus: `publish` is fire-and-forget (no-op if nobody is
/// subscribed); each `subscribe()` call returns an independent receiver.
pub struct EventBus {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Independent receiver for one listener; drop it to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to all current subscribers. A send error (no
    /// subscribers) is intentionally swallowed: nobody watching isn't a failure.
    pub fn publish(&self, event: AgentEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle status surfaced on [`TaskState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Paused,
    Done,
    Error,
    Aborted,
}

/// Per-task bookkeeping record: status, pause flag, halt counters and their
/// configured thresholds, and when it last changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    pub status: TaskStatus,
    pub paused: bool,
    pub consecutive_errors: u32,
    pub idle_rounds: u32,
    pub iterations: u32,
    pub max_iterations: u32,
    pub max_errors: u32,
    pub max_idle: u32,
    #[serde(skip, default = "SystemTime::now")]
    pub last_changed: SystemTime,
}

impl TaskState {
    pub fn new(halt: HaltConfig) -> Self {
        Self {
            status: TaskStatus::Running,
            paused: false,
            consecutive_errors: 0,
            idle_rounds: 0,
            iterations: 0,
            max_iterations: halt.max_iterations,
            max_errors: halt.max_errors,
            max_idle: halt.max_idle,
            last_changed: SystemTime::now(),
        }
    }
}

/// Maintains one [`TaskState`] per task id, publishing `StateChanged` on the
/// shared [`EventBus`] after every mutation.
pub struct TaskStateStore {
    states: DashMap<String, TaskState>,
    bus: std::sync::Arc<EventBus>,
}

impl TaskStateStore {
    pub fn new(bus: std::sync::Arc<EventBus>) -> Self {
        Self {
            states: DashMap::new(),
            bus,
        }
    }

    /// Creates a fresh `TaskState` for `task_id` from `halt`, overwriting any existing record.
    pub fn init(&self, task_id: &str, halt: HaltConfig) {
        self.states.insert(task_id.to_string(), TaskState::new(halt));
        self.bus.publish(AgentEvent::StateChanged {
            task_id: task_id.to_string(),
        });
    }

    /// Snapshot of the current state, if the task is known.
    pub fn get(&self, task_id: &str) -> Option<TaskState> {
        self.states.get(task_id).map(|r| r.clone())
    }

    /// Applies `f` to the task's record and publishes `StateChanged`. No-op
    /// if the task id isn't known.
    pub fn update(&self, task_id: &str, f: impl FnOnce(&mut TaskState)) {
        if let Some(mut entry) = self.states.get_mut(task_id) {
            f(&mut entry);
            entry.last_changed = SystemTime::now();
        } else {
            return;
        }
        self.bus.publish(AgentEvent::StateChanged {
            task_id: task_id.to_string(),
        });
    }

    pub fn remove(&self, task_id: &str) {
        self.states.remove(task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn publish_reaches_every_independent_subscriber() {
        let bus = EventBus::new();
        let mut r1 = bus.subscribe();
        let mut r2 = bus.subscribe();
        bus.publish(AgentEvent::StateChanged {
            task_id: "t1".to_string(),
        });
        let e1 = r1.recv().await.unwrap();
        let e2 = r2.recv().await.unwrap();
        assert!(matches!(e1, AgentEvent::StateChanged { task_id } if task_id == "t1"));
        assert!(matches!(e2, AgentEvent::StateChanged { task_id } if task_id == "t1"));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(AgentEvent::StateChanged {
            task_id: "t1".to_string(),
        });
    }

    #[tokio::test]
    async fn update_mutates_state_and_emits_state_changed() {
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        let store = TaskStateStore::new(bus);
        store.init("t1", HaltConfig::default());

        store.update("t1", |s| s.consecutive_errors = 3);
        let state = store.get("t1").unwrap();
        assert_eq!(state.consecutive_errors, 3);

        // init() then update() each publish once.
        let _ = rx.recv().await.unwrap();
        let _ = rx.recv().await.unwrap();
    }

    #[test]
    fn update_on_unknown_task_is_a_no_op() {
        let bus = Arc::new(EventBus::new());
        let store = TaskStateStore::new(bus);
        store.update("missing", |s| s.consecutive_errors = 9);
        assert!(store.get("missing").is_none());
    }
}
