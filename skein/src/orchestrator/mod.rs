//! Task orchestrator (C10): a map of running/paused/finished tasks, each
//! backed by an [`Executor`] that turns a task's accumulated prompt into a
//! reply. Tasks form a tree (parent/root/children) so a task can spawn
//! children and fold their results back into its own conversation.

mod pause;
mod task;

pub use pause::PauseMode;
pub use task::{ExecuteOutcome, StopReason, TaskContext, TreeEdit};

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AgentError;
use crate::events::{AgentEvent, EventBus};

/// Turns a task id's accumulated prompt into a reply. `ReactRunner` is the
/// production implementation; tests use a stub.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, prompt: &str) -> Result<String, AgentError>;
}

fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Owns the task map and an [`EventBus`] handle for lifecycle notifications.
/// One orchestrator instance typically backs one dialogue session.
pub struct TaskOrchestrator {
    tasks: DashMap<String, TaskContext>,
    executor: Arc<dyn Executor>,
    bus: Arc<EventBus>,
}

impl TaskOrchestrator {
    pub fn new(executor: Arc<dyn Executor>, bus: Arc<EventBus>) -> Self {
        Self {
            tasks: DashMap::new(),
            executor,
            bus,
        }
    }

    /// Registers a new root task with its initial prompt. Returns the new id.
    pub fn generate(&self, prompt: impl Into<String>) -> String {
        let id = new_task_id();
        let ctx = TaskContext::root(id.clone(), prompt.into());
        self.tasks.insert(id.clone(), ctx);
        id
    }

    /// Appends text to a task's prompt without running it.
    pub fn modify(&self, id: &str, prompt: impl Into<String>) -> Result<(), AgentError> {
        let mut entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?;
        entry.prompt.push('\n');
        entry.prompt.push_str(&prompt.into());
        Ok(())
    }

    /// Runs a task's current prompt to completion through the executor,
    /// honoring abort/pause signalled on its cancellation token.
    pub async fn execute(&self, id: &str) -> Result<ExecuteOutcome, AgentError> {
        let (prompt, task_cancel) = {
            let entry = self
                .tasks
                .get(id)
                .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?;
            (entry.prompt.clone(), entry.cancel.clone())
        };

        self.wait_while_paused(id, &task_cancel).await;
        if task_cancel.is_cancelled() {
            return Ok(ExecuteOutcome {
                id: id.to_string(),
                success: false,
                stop_reason: StopReason::Abort,
                result: None,
                error: None,
            });
        }

        let step_cancel = self
            .tasks
            .get(id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?
            .new_step_token();

        let outcome = tokio::select! {
            biased;
            _ = step_cancel.cancelled() => ExecuteOutcome {
                id: id.to_string(),
                success: false,
                stop_reason: StopReason::Abort,
                result: None,
                error: None,
            },
            res = self.executor.execute(&prompt) => match res {
                Ok(result) => ExecuteOutcome {
                    id: id.to_string(),
                    success: true,
                    stop_reason: StopReason::Done,
                    result: Some(result),
                    error: None,
                },
                Err(e) => ExecuteOutcome {
                    id: id.to_string(),
                    success: false,
                    stop_reason: StopReason::Error,
                    result: None,
                    error: Some(e.to_string()),
                },
            },
        };

        let parent_id = self.tasks.get(id).and_then(|e| e.parent_id.clone());
        if let (Some(parent_id), Some(result)) = (parent_id, &outcome.result) {
            self.bus.publish(AgentEvent::TaskChildResult {
                parent_id,
                summary: result.clone(),
            });
        }

        Ok(outcome)
    }

    async fn wait_while_paused(&self, id: &str, cancel: &CancellationToken) {
        loop {
            let paused = self
                .tasks
                .get(id)
                .map(|t| t.pause.is_paused())
                .unwrap_or(false);
            if !paused || cancel.is_cancelled() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }
    }

    /// Cancels a task's token for good: unlike pausing, the task cannot be
    /// resumed after this (a fresh task must be generated instead).
    pub fn abort(&self, id: &str, reason: Option<String>) -> Result<(), AgentError> {
        let entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?;
        entry.pause.set(false);
        entry.cancel.cancel();
        let _ = reason;
        Ok(())
    }

    /// Flips a task's pause flag. When pausing with `abort_current_step`, also
    /// cancels whatever step is currently in flight via its step-level token,
    /// leaving the task-level token live so it can still run again once resumed.
    pub fn pause(
        &self,
        id: &str,
        pause: bool,
        abort_current_step: bool,
        reason: Option<String>,
    ) -> Result<(), AgentError> {
        let entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?;
        entry.pause.set(pause);
        if pause && abort_current_step {
            entry.step.read().unwrap().cancel();
        }
        drop(entry);
        if pause {
            self.bus.publish(AgentEvent::TaskPaused {
                task_id: id.to_string(),
                reason,
            });
        } else {
            self.bus.publish(AgentEvent::TaskResumed {
                task_id: id.to_string(),
                reason,
            });
        }
        Ok(())
    }

    /// Appends a chat turn to a task's prompt (same mechanics as `modify`,
    /// named separately for call-site clarity in the dialogue front).
    pub fn chat(&self, id: &str, text: impl Into<String>) -> Result<(), AgentError> {
        self.modify(id, text)
    }

    /// Registers a new child task under `parent_id`, inheriting its root id.
    pub fn spawn_child(&self, parent_id: &str, prompt: impl Into<String>) -> Result<String, AgentError> {
        let root_id = self
            .tasks
            .get(parent_id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {parent_id}")))?
            .root_id
            .clone();
        let child_id = new_task_id();
        let ctx = TaskContext::child(child_id.clone(), parent_id.to_string(), root_id.clone(), prompt.into());
        self.tasks.insert(child_id.clone(), ctx);
        if let Some(mut parent) = self.tasks.get_mut(parent_id) {
            parent.children.push(child_id.clone());
        }
        self.bus.publish(AgentEvent::TaskSpawned {
            parent_id: parent_id.to_string(),
            root_id,
            child_id: child_id.clone(),
        });
        Ok(child_id)
    }

    /// Replaces a task's prompt entirely, used when re-planning a subtree
    /// after upstream context changed. Does not touch its children.
    pub fn replan_subtree(&self, id: &str, new_prompt: impl Into<String>) -> Result<(), AgentError> {
        let mut entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?;
        entry.prompt = new_prompt.into();
        Ok(())
    }

    /// Applies a structural edit to the task tree (add/remove children, move
    /// a subtree, or overwrite a task's prompt text).
    pub fn tree_edit(&self, op: TreeEdit) -> Result<(), AgentError> {
        match op {
            TreeEdit::AddChild { parent_id, prompt } => {
                let child_id = self.spawn_child(&parent_id, prompt)?;
                self.bus.publish(AgentEvent::TaskTreeUpdated {
                    parent_id,
                    child_ids: vec![child_id],
                    removed_ids: vec![],
                });
                Ok(())
            }
            TreeEdit::DeleteSubtree { id } => {
                let parent_id = self.tasks.get(&id).and_then(|e| e.parent_id.clone());
                let removed = self.collect_subtree(&id);
                for r in &removed {
                    self.tasks.remove(r);
                }
                if let Some(parent_id) = &parent_id {
                    if let Some(mut parent) = self.tasks.get_mut(parent_id) {
                        parent.children.retain(|c| c != &id);
                    }
                }
                self.bus.publish(AgentEvent::TaskTreeUpdated {
                    parent_id: parent_id.unwrap_or_default(),
                    child_ids: vec![],
                    removed_ids: removed,
                });
                Ok(())
            }
            TreeEdit::MoveSubtree { id, new_parent_id } => {
                {
                    let mut node = self
                        .tasks
                        .get_mut(&id)
                        .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown task: {id}")))?;
                    if let Some(old_parent) = node.parent_id.clone() {
                        if let Some(mut old) = self.tasks.get_mut(&old_parent) {
                            old.children.retain(|c| c != &id);
                        }
                    }
                    node.parent_id = Some(new_parent_id.clone());
                }
                if let Some(mut new_parent) = self.tasks.get_mut(&new_parent_id) {
                    new_parent.children.push(id.clone());
                }
                self.bus.publish(AgentEvent::TaskTreeUpdated {
                    parent_id: new_parent_id,
                    child_ids: vec![id],
                    removed_ids: vec![],
                });
                Ok(())
            }
            TreeEdit::UpdateTask { id, prompt } => self.replan_subtree(&id, prompt),
        }
    }

    fn collect_subtree(&self, id: &str) -> Vec<String> {
        let mut out = vec![id.to_string()];
        if let Some(node) = self.tasks.get(id) {
            for child in node.children.clone() {
                out.extend(self.collect_subtree(&child));
            }
        }
        out
    }

    pub fn get(&self, id: &str) -> Option<TaskContext> {
        self.tasks.get(id).map(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoExecutor;
    #[async_trait]
    impl Executor for EchoExecutor {
        async fn execute(&self, prompt: &str) -> Result<String, AgentError> {
            Ok(format!("done: {prompt}"))
        }
    }

    struct FailingExecutor;
    #[async_trait]
    impl Executor for FailingExecutor {
        async fn execute(&self, _prompt: &str) -> Result<String, AgentError> {
            Err(AgentError::ExecutionFailed("boom".to_string()))
        }
    }

    struct CountingExecutor(Arc<AtomicUsize>);
    #[async_trait]
    impl Executor for CountingExecutor {
        async fn execute(&self, _prompt: &str) -> Result<String, AgentError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok("ok".to_string())
        }
    }

    fn orchestrator(executor: Arc<dyn Executor>) -> TaskOrchestrator {
        TaskOrchestrator::new(executor, Arc::new(EventBus::new()))
    }

    #[tokio::test]
    async fn generate_and_execute_runs_the_executor_on_the_prompt() {
        let orch = orchestrator(Arc::new(EchoExecutor));
        let id = orch.generate("hello");
        let outcome = orch.execute(&id).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.stop_reason, StopReason::Done);
        assert_eq!(outcome.result.as_deref(), Some("done: hello"));
    }

    #[tokio::test]
    async fn execute_reports_error_stop_reason_on_executor_failure() {
        let orch = orchestrator(Arc::new(FailingExecutor));
        let id = orch.generate("hello");
        let outcome = orch.execute(&id).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.stop_reason, StopReason::Error);
        assert!(outcome.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn abort_before_execute_yields_abort_stop_reason() {
        let orch = orchestrator(Arc::new(EchoExecutor));
        let id = orch.generate("hello");
        orch.abort(&id, Some("changed my mind".to_string())).unwrap();
        let outcome = orch.execute(&id).await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Abort);
    }

    #[tokio::test]
    async fn abort_mid_execute_cancels_the_in_flight_step() {
        let counter = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(Arc::new(CountingExecutor(Arc::clone(&counter))));
        let id = orch.generate("hello");
        let ctx = orch.get(&id).unwrap();
        let cancel = ctx.cancel.clone();
        let orch = Arc::new(orch);
        let orch2 = Arc::clone(&orch);
        let id2 = id.clone();
        let handle = tokio::spawn(async move { orch2.execute(&id2).await.unwrap() });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        cancel.cancel();
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Abort);
    }

    #[tokio::test]
    async fn spawn_child_links_parent_child_and_shares_root() {
        let orch = orchestrator(Arc::new(EchoExecutor));
        let root = orch.generate("root task");
        let child = orch.spawn_child(&root, "child task").unwrap();
        let parent_ctx = orch.get(&root).unwrap();
        let child_ctx = orch.get(&child).unwrap();
        assert_eq!(parent_ctx.children, vec![child.clone()]);
        assert_eq!(child_ctx.parent_id.as_deref(), Some(root.as_str()));
        assert_eq!(child_ctx.root_id, root);
    }

    #[tokio::test]
    async fn modify_appends_to_the_task_prompt() {
        let orch = orchestrator(Arc::new(EchoExecutor));
        let id = orch.generate("first");
        orch.modify(&id, "second").unwrap();
        let outcome = orch.execute(&id).await.unwrap();
        assert_eq!(outcome.result.as_deref(), Some("done: first\nsecond"));
    }

    #[tokio::test]
    async fn tree_edit_delete_subtree_removes_all_descendants() {
        let orch = orchestrator(Arc::new(EchoExecutor));
        let root = orch.generate("root");
        let child = orch.spawn_child(&root, "child").unwrap();
        let grandchild = orch.spawn_child(&child, "grandchild").unwrap();
        orch.tree_edit(TreeEdit::DeleteSubtree { id: child.clone() }).unwrap();
        assert!(orch.get(&child).is_none());
        assert!(orch.get(&grandchild).is_none());
        assert!(orch.get(&root).is_some());
        assert!(!orch.get(&root).unwrap().children.contains(&child));
    }

    #[tokio::test]
    async fn tree_edit_move_subtree_updates_both_parents() {
        let orch = orchestrator(Arc::new(EchoExecutor));
        let a = orch.generate("a");
        let b = orch.generate("b");
        let child = orch.spawn_child(&a, "child").unwrap();
        orch.tree_edit(TreeEdit::MoveSubtree {
            id: child.clone(),
            new_parent_id: b.clone(),
        })
        .unwrap();
        assert!(!orch.get(&a).unwrap().children.contains(&child));
        assert!(orch.get(&b).unwrap().children.contains(&child));
        assert_eq!(orch.get(&child).unwrap().parent_id.as_deref(), Some(b.as_str()));
    }

    #[tokio::test]
    async fn pause_blocks_execute_until_resumed() {
        let orch = Arc::new(orchestrator(Arc::new(EchoExecutor)));
        let id = orch.generate("hello");
        orch.pause(&id, true, false, None).unwrap();

        let orch2 = Arc::clone(&orch);
        let id2 = id.clone();
        let handle = tokio::spawn(async move { orch2.execute(&id2).await.unwrap() });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        orch.pause(&id, false, false, None).unwrap();
        let outcome = handle.await.unwrap();
        assert!(outcome.success);
    }
}
