//! Task map entry and the outcomes/edits the orchestrator operates on.

use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;

use super::pause::PauseMode;

/// One node in the task tree. `root_id` equals `id` for a root task, which
/// lets listeners group a whole tree without walking parent pointers.
///
/// `cancel` is the task-level token: cancelling it aborts the task for good.
/// `step` holds a child token scoped to whatever step is currently in
/// flight; `pause(..., abort_current_step=true)` cancels only `step`, so the
/// task itself can still be resumed and re-executed afterward.
#[derive(Clone)]
pub struct TaskContext {
    pub id: String,
    pub parent_id: Option<String>,
    pub root_id: String,
    pub children: Vec<String>,
    pub prompt: String,
    pub pause: PauseMode,
    pub cancel: CancellationToken,
    pub step: Arc<RwLock<CancellationToken>>,
}

impl TaskContext {
    pub fn root(id: String, prompt: String) -> Self {
        let cancel = CancellationToken::new();
        let step = Arc::new(RwLock::new(cancel.child_token()));
        Self {
            root_id: id.clone(),
            id,
            parent_id: None,
            children: Vec::new(),
            prompt,
            pause: PauseMode::new(),
            cancel,
            step,
        }
    }

    pub fn child(id: String, parent_id: String, root_id: String, prompt: String) -> Self {
        let cancel = CancellationToken::new();
        let step = Arc::new(RwLock::new(cancel.child_token()));
        Self {
            id,
            parent_id: Some(parent_id),
            root_id,
            children: Vec::new(),
            prompt,
            pause: PauseMode::new(),
            cancel,
            step,
        }
    }

    /// Replaces the current step token with a fresh child of the task token,
    /// returning it. Call once at the start of each `execute()` attempt.
    pub fn new_step_token(&self) -> CancellationToken {
        let token = self.cancel.child_token();
        *self.step.write().unwrap() = token.clone();
        token
    }
}

/// Why a task's `execute` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Done,
    Error,
    Abort,
}

/// Result of running a task's prompt through the executor once.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub id: String,
    pub success: bool,
    pub stop_reason: StopReason,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// A structural change to the task tree.
pub enum TreeEdit {
    AddChild { parent_id: String, prompt: String },
    DeleteSubtree { id: String },
    MoveSubtree { id: String, new_parent_id: String },
    UpdateTask { id: String, prompt: String },
}
