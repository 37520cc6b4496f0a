//! Dialogue front (C11): a chat-shaped entry point over the task
//! orchestrator. Each turn is driven through a [`ReactRunner`] whose only
//! tools are [`PlanTaskTool`]/[`ExecuteTaskTool`], so planning and execution
//! reuse the same think/act/observe/compress turn loop as any other agent
//! instead of a bespoke one.

mod memory;
mod tools;

pub use memory::{DialogueTurn, EkoMemory};
pub use tools::{ExecuteTaskTool, PlanTaskTool};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::agent::react::{ReactRunner, RunError};
use crate::error::AgentError;
use crate::events::EventBus;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::orchestrator::{Executor, TaskOrchestrator};
use crate::stream::MessageChunk;
use crate::tools::AggregateToolSource;

/// Default cap on how many user turns a single [`DialogueFront`] will accept
/// before refusing further input; a runaway chat loop stops here rather than
/// growing its prompt without bound.
pub const DEFAULT_MAX_TURNS: usize = 15;

/// Wraps a shared `Arc<dyn LlmClient>` so it can back both the runner (which
/// wants ownership of a `Box<dyn LlmClient>`) and the planner tool (which
/// wants to keep invoking the same client directly).
struct SharedLlm(Arc<dyn LlmClient>);

#[async_trait]
impl LlmClient for SharedLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.0.invoke(messages).await
    }

    async fn invoke_stream(
        &self,
        messages: &[Message],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, AgentError> {
        self.0.invoke_stream(messages, chunk_tx).await
    }
}

/// Runs a task's prompt through the given LLM directly, with no tools of its
/// own. Used as the orchestrator's executor for tasks spawned by the dialogue
/// front's `execute_task` tool.
struct DirectExecutor {
    llm: Arc<dyn LlmClient>,
}

#[async_trait]
impl Executor for DirectExecutor {
    async fn execute(&self, prompt: &str) -> Result<String, AgentError> {
        let response = self.llm.invoke(&[Message::user(prompt)]).await?;
        Ok(response.content)
    }
}

/// Whether planning and execution happen in the same turn or are split
/// across separate `chat` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// `plan_task` and `execute_task` are both available every turn.
    Combined,
    /// Only `plan_task` is available; a later turn must call `execute_task`
    /// explicitly once the caller has reviewed the plan.
    Segmented,
}

/// Chat-shaped front end over a [`TaskOrchestrator`]: each `chat()` call is
/// one bounded ReAct turn that can plan and (depending on [`ExecutionMode`])
/// execute tasks.
pub struct DialogueFront {
    runner: ReactRunner,
    orchestrator: Arc<TaskOrchestrator>,
    memory: EkoMemory,
    max_turns: usize,
    turns_used: usize,
}

impl DialogueFront {
    pub async fn new(
        llm: Arc<dyn LlmClient>,
        mode: ExecutionMode,
        max_turns: usize,
    ) -> Result<Self, RunError> {
        let bus = Arc::new(EventBus::new());
        let orchestrator = Arc::new(TaskOrchestrator::new(
            Arc::new(DirectExecutor { llm: Arc::clone(&llm) }),
            bus,
        ));

        let tool_source = AggregateToolSource::new();
        tool_source.register_sync(Box::new(PlanTaskTool::new(
            Arc::clone(&orchestrator),
            Arc::clone(&llm),
        )));
        if mode == ExecutionMode::Combined {
            tool_source.register_sync(Box::new(ExecuteTaskTool::new(Arc::clone(&orchestrator))));
        }

        let runner = ReactRunner::new(
            Box::new(SharedLlm(llm)),
            Box::new(tool_source),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            false,
        )
        .map_err(|e| RunError::Execution(AgentError::ExecutionFailed(e.to_string())))?;

        Ok(Self {
            runner,
            orchestrator,
            memory: EkoMemory::new(),
            max_turns,
            turns_used: 0,
        })
    }

    pub async fn with_default_turns(
        llm: Arc<dyn LlmClient>,
        mode: ExecutionMode,
    ) -> Result<Self, RunError> {
        Self::new(llm, mode, DEFAULT_MAX_TURNS).await
    }

    pub fn memory(&self) -> &EkoMemory {
        &self.memory
    }

    pub fn orchestrator(&self) -> &Arc<TaskOrchestrator> {
        &self.orchestrator
    }

    /// Runs one bounded turn. Errors once `max_turns` user turns have been sent.
    pub async fn chat(&mut self, user_text: &str) -> Result<String, RunError> {
        if self.turns_used >= self.max_turns {
            return Err(RunError::Execution(AgentError::ExecutionFailed(format!(
                "dialogue turn limit reached ({} turns)",
                self.max_turns
            ))));
        }
        self.turns_used += 1;
        self.memory.push("user", user_text);

        let final_state = self.runner.invoke(user_text).await?;
        let reply = final_state
            .last_assistant_reply()
            .unwrap_or_else(|| "(no reply)".to_string());
        self.memory.push("assistant", reply.clone());
        Ok(reply)
    }

    pub fn turns_remaining(&self) -> usize {
        self.max_turns.saturating_sub(self.turns_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    fn plain_llm(reply: &str) -> Arc<dyn LlmClient> {
        Arc::new(MockLlm::with_no_tool_calls(reply))
    }

    #[tokio::test]
    async fn chat_returns_the_assistant_reply_and_records_memory() {
        let mut front = DialogueFront::new(plain_llm("sure, on it"), ExecutionMode::Combined, 5)
            .await
            .unwrap();
        let reply = front.chat("plan my trip").await.unwrap();
        assert_eq!(reply, "sure, on it");
        assert_eq!(front.memory().len(), 2);
    }

    #[tokio::test]
    async fn chat_errors_once_turn_limit_is_reached() {
        let mut front = DialogueFront::new(plain_llm("ok"), ExecutionMode::Combined, 1)
            .await
            .unwrap();
        front.chat("first").await.unwrap();
        assert_eq!(front.turns_remaining(), 0);
        assert!(front.chat("second").await.is_err());
    }

    #[tokio::test]
    async fn segmented_mode_registers_only_the_planner_tool() {
        let front = DialogueFront::new(plain_llm("ok"), ExecutionMode::Segmented, 5)
            .await
            .unwrap();
        assert_eq!(front.turns_remaining(), 5);
    }
}
