//! Observe node: read tool_results, merge into state (e.g. messages), clear tool_calls and tool_results.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::Next;
use crate::message::Message;
use crate::state::{HaltConfig, ReActState, ReactRuntime, ToolResult};
use crate::Node;

pub struct ObserveNode {
    enable_loop: bool,
    halt: HaltConfig,
}

impl ObserveNode {
    pub fn new() -> Self {
        Self {
            enable_loop: false,
            halt: HaltConfig::default(),
        }
    }

    /// Loop mode with the default halt thresholds.
    pub fn with_loop() -> Self {
        Self::with_halt_config(HaltConfig::default())
    }

    /// Loop mode with caller-supplied halt thresholds (max_react_iterations,
    /// max_react_error_streak, max_react_idle_rounds from `ReactBuildConfig`).
    pub fn with_halt_config(halt: HaltConfig) -> Self {
        Self {
            enable_loop: true,
            halt,
        }
    }
}

impl Default for ObserveNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node<ReActState> for ObserveNode {
    fn id(&self) -> &str {
        "observe"
    }

    async fn run(&self, state: ReActState) -> Result<(ReActState, Next), AgentError> {
        let had_tool_calls = !state.tool_calls.is_empty();
        let had_error = state.tool_results.iter().any(|tr| tr.is_error);
        let mut messages = state.messages;
        for tr in &state.tool_results {
            let name = tr
                .name
                .as_deref()
                .or(tr.call_id.as_deref())
                .unwrap_or("tool");
            messages.push(Message::Tool(format!(
                "Tool {} returned: {}",
                name, tr.content
            )));
        }
        let next_turn = state.turn_count.saturating_add(1);

        let mut new_state = ReActState {
            messages,
            tool_calls: vec![],
            tool_results: vec![],
            turn_count: next_turn,
            approval_result: state.approval_result,
            usage: state.usage,
            total_usage: state.total_usage,
            message_count_after_last_think: state.message_count_after_last_think,
            iterations: state.iterations,
            consecutive_errors: state.consecutive_errors,
            idle_rounds: state.idle_rounds,
        };

        let should_halt = {
            let mut runtime = ReactRuntime::new(&mut new_state, self.halt);
            runtime.start_iteration(format!("observe-{next_turn}"));
            if had_tool_calls {
                runtime.record_observation(ToolResult {
                    call_id: None,
                    name: None,
                    content: String::new(),
                    is_error: had_error,
                });
            } else {
                runtime.mark_idle();
            }
            runtime.should_halt()
        };

        let next = if !self.enable_loop {
            Next::Continue
        } else if should_halt || !had_tool_calls {
            Next::End
        } else {
            Next::Continue
        };
        Ok((new_state, next))
    }
}
