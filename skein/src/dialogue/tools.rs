//! `planTask`/`executeTask`: the two tools the dialogue front exposes to its
//! own chat loop, each closing over a shared [`TaskOrchestrator`] handle so a
//! plan created in one call can be executed (or re-planned) in a later one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::orchestrator::TaskOrchestrator;
use crate::planner;
use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::Tool;

/// Plans a task from a natural-language prompt and registers it with the
/// orchestrator, returning the new task id instead of running it.
pub struct PlanTaskTool {
    orchestrator: Arc<TaskOrchestrator>,
    llm: Arc<dyn LlmClient>,
}

impl PlanTaskTool {
    pub fn new(orchestrator: Arc<TaskOrchestrator>, llm: Arc<dyn LlmClient>) -> Self {
        Self { orchestrator, llm }
    }
}

#[async_trait]
impl Tool for PlanTaskTool {
    fn name(&self) -> &str {
        "plan_task"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "plan_task".to_string(),
            description: Some(
                "Decompose a user request into a task plan without running it.".to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string", "description": "The request to plan." }
                },
                "required": ["prompt"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let prompt = args
            .get("prompt")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing required argument: prompt".into()))?;

        let plan = planner::plan(self.llm.as_ref(), prompt)
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;

        let task_id = self.orchestrator.generate(plan.task.clone());
        let steps = plan
            .nodes
            .iter()
            .map(|n| format!("- {}", n.text))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolCallContent {
            text: format!("task_id: {task_id}\ntask: {}\n{steps}", plan.task),
        })
    }
}

/// Runs a previously planned task id to completion through the orchestrator.
pub struct ExecuteTaskTool {
    orchestrator: Arc<TaskOrchestrator>,
}

impl ExecuteTaskTool {
    pub fn new(orchestrator: Arc<TaskOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl Tool for ExecuteTaskTool {
    fn name(&self) -> &str {
        "execute_task"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "execute_task".to_string(),
            description: Some("Runs a previously planned task id to completion.".to_string()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string", "description": "Id returned by plan_task." }
                },
                "required": ["task_id"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let task_id = args
            .get("task_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing required argument: task_id".into()))?;

        let outcome = self
            .orchestrator
            .execute(task_id)
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;

        if outcome.success {
            Ok(ToolCallContent {
                text: outcome.result.unwrap_or_default(),
            })
        } else {
            Err(ToolSourceError::Transport(
                outcome.error.unwrap_or_else(|| format!("{:?}", outcome.stop_reason)),
            ))
        }
    }
}
