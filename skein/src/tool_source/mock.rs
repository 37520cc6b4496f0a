//! Mock tool source for tests and demos: a fixed set of canned tools.
//!
//! Mirrors the style of [`crate::llm::mock::MockLlm`]: stateless by default, with
//! constructors that cover common demo scenarios (e.g. `get_time_example`).

use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSource, ToolSourceError, ToolSpec};

/// One canned tool: name, spec, and a fixed or computed response.
struct MockTool {
    spec: ToolSpec,
    response: Box<dyn Fn(&Value) -> Result<String, ToolSourceError> + Send + Sync>,
}

/// Mock tool source: returns canned responses for a fixed set of tools, recording calls.
///
/// Use [`MockToolSource::get_time_example`] for the common "what time is it?" demo, or
/// [`MockToolSource::new`] plus [`MockToolSource::with_tool`] to build a custom set.
pub struct MockToolSource {
    tools: Vec<MockTool>,
}

impl MockToolSource {
    /// Creates an empty mock tool source.
    pub fn new() -> Self {
        Self { tools: vec![] }
    }

    /// Registers a tool with a fixed text response, ignoring arguments.
    pub fn with_tool(mut self, name: &str, description: &str, response: &str) -> Self {
        let response = response.to_string();
        self.tools.push(MockTool {
            spec: ToolSpec {
                name: name.to_string(),
                description: Some(description.to_string()),
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            },
            response: Box::new(move |_| Ok(response.clone())),
        });
        self
    }

    /// A single `get_time` tool that always returns a fixed timestamp string.
    ///
    /// Useful as a default for quick demos, e.g. `run_agent("What time is it?", None)`.
    pub fn get_time_example() -> Self {
        Self::new().with_tool(
            "get_time",
            "Returns the current time.",
            "2024-01-01T00:00:00Z",
        )
    }
}

impl Default for MockToolSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.iter().map(|t| t.spec.clone()).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.spec.name == name)
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?;
        let text = (tool.response)(&arguments)?;
        Ok(ToolCallContent { text })
    }

    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.call_tool(name, arguments).await
    }
}
