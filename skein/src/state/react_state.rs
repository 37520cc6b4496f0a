//! ReAct state and tool types for the ReAct agent.
//!
//! ReActState holds messages plus per-round tool_calls and tool_results; Think/Act/Observe
//! nodes read and write these fields. ToolCall and ToolResult align with MCP `tools/call`
//! and result content. [`ReactIteration`] and [`ReactRuntime`] layer per-iteration
//! bookkeeping (thought/action/observation/completion) and the halt predicates on top.

use std::time::SystemTime;

use crate::message::Message;
use crate::LlmUsage;
use serde::{Deserialize, Serialize};

/// A single tool invocation produced by the LLM (Think node) and consumed by Act.
///
/// Aligns with MCP `tools/call`: `name` and `arguments` (JSON string or object).
/// Optional `id` can be used to correlate with `ToolResult::call_id` in Observe.
///
/// **Interaction**: Written by ThinkNode from LLM output; read by ActNode to call
/// `ToolSource::call_tool(name, arguments)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as registered in ToolSource (e.g. MCP tools/list).
    pub name: String,
    /// Arguments as JSON string; parse in Act when calling the tool.
    pub arguments: String,
    /// Optional id to match with ToolResult; useful when merging results in Observe.
    pub id: Option<String>,
}

/// Result of executing one tool call (Act node output, Observe node input).
///
/// Aligns with MCP result `content[].text`. Use `call_id` or `name` to associate
/// with the corresponding `ToolCall` when merging into state in Observe.
///
/// **Interaction**: Written by ActNode from `ToolSource::call_tool` result; read by
/// ObserveNode to append to messages or internal state and then clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the tool call this result belongs to (if ToolCall had `id`).
    pub call_id: Option<String>,
    /// Tool name; alternative to call_id for matching.
    pub name: Option<String>,
    /// Result content (e.g. text from MCP result.content[].text).
    pub content: String,
    /// Whether the tool execution itself failed (error text is in `content`).
    #[serde(default)]
    pub is_error: bool,
}

/// Status of a single [`ReactIteration`] in the reasoning/action/observation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactIterationStatus {
    Reasoning,
    Action,
    Observation,
    /// Terminal: the loop produced a final answer.
    Completion,
    /// Terminal: the loop halted on an error or halt predicate.
    Failed,
}

/// Bookkeeping record for one ReAct iteration.
///
/// `status ∈ {Completion, Failed}` is terminal: once set, no further field on this
/// record is mutated (the next iteration gets its own record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactIteration {
    pub id: String,
    pub index: u32,
    #[serde(skip, default = "SystemTime::now")]
    pub started_at: SystemTime,
    pub status: ReactIterationStatus,
    pub thought: Option<String>,
    pub action: Option<ToolCall>,
    pub observation: Option<ToolResult>,
    pub response: Option<String>,
    pub finish_reason: Option<String>,
    pub error_message: Option<String>,
}

impl ReactIteration {
    fn new(id: impl Into<String>, index: u32) -> Self {
        Self {
            id: id.into(),
            index,
            started_at: SystemTime::now(),
            status: ReactIterationStatus::Reasoning,
            thought: None,
            action: None,
            observation: None,
            response: None,
            finish_reason: None,
            error_message: None,
        }
    }
}

/// State for the ReAct graph: Think → Act → Observe (→ Compress → Think).
///
/// Extends conversation history (`messages`) with per-round tool data: LLM outputs
/// `tool_calls`, Act fills `tool_results`, Observe merges results and clears both.
/// `iterations`/`consecutive_errors`/`idle_rounds` are maintained by [`ReactRuntime`]
/// and drive the halt predicates from the ReAct runtime design.
/// Satisfies `Clone + Send + Sync + 'static` for use with `Node<ReActState>` and
/// `StateGraph<ReActState>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActState {
    /// Conversation history (System, User, Assistant, Tool). Used by Think and extended by Observe.
    pub messages: Vec<Message>,
    /// Current round tool calls from the LLM (Think writes, Act reads).
    pub tool_calls: Vec<ToolCall>,
    /// Current round tool execution results (Act writes, Observe reads and merges).
    pub tool_results: Vec<ToolResult>,
    /// Number of observe rounds completed; incremented in ObserveNode, used to enforce max turns.
    #[serde(default)]
    pub turn_count: u32,
    /// When set, indicates the user's approval decision for the current pending tool (approval flow).
    /// Set by the caller (e.g. Server) when resuming after an `approval_required` Interrupt.
    /// Consumed by ActNode: `Some(true)` → execute the tool; `Some(false)` → add "User rejected" result.
    #[serde(default)]
    pub approval_result: Option<bool>,
    /// Token usage for the last LLM call (Think node). Set by ThinkNode when the provider returns usage.
    #[serde(default)]
    pub usage: Option<LlmUsage>,
    /// Accumulated token usage over the whole run (sum of all Think turns). Set by ThinkNode.
    #[serde(default)]
    pub total_usage: Option<LlmUsage>,
    /// Number of messages at the time of the last Think; used for hybrid token estimate in compression.
    #[serde(default)]
    pub message_count_after_last_think: Option<usize>,
    /// Per-iteration bookkeeping records, oldest first.
    #[serde(default)]
    pub iterations: Vec<ReactIteration>,
    /// Consecutive tool/observation failures since the last success or completion.
    #[serde(default)]
    pub consecutive_errors: u32,
    /// Consecutive iterations with no tool executed and no final text produced.
    #[serde(default)]
    pub idle_rounds: u32,
}

impl Default for ReActState {
    fn default() -> Self {
        Self {
            messages: vec![],
            tool_calls: vec![],
            tool_results: vec![],
            turn_count: 0,
            approval_result: None,
            usage: None,
            total_usage: None,
            message_count_after_last_think: None,
            iterations: vec![],
            consecutive_errors: 0,
            idle_rounds: 0,
        }
    }
}

impl ReActState {
    /// Returns the content of the chronologically last Assistant message, if any.
    ///
    /// Used by callers (e.g. bot, CLI) to get the final reply without scanning `messages`.
    /// Semantics: last message in `messages` that is `Message::Assistant(content)`; empty
    /// content (e.g. assistant turn with only tool_calls) returns `Some("")`. Returns
    /// `None` only when there is no Assistant message at all.
    pub fn last_assistant_reply(&self) -> Option<String> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant(s) => Some(s.clone()),
            _ => None,
        })
    }
}

/// Configurable halt thresholds for [`ReactRuntime`].
#[derive(Debug, Clone, Copy)]
pub struct HaltConfig {
    pub max_iterations: u32,
    pub max_errors: u32,
    pub max_idle: u32,
}

impl Default for HaltConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_errors: 10,
            max_idle: 3,
        }
    }
}

/// Thin wrapper over `&mut ReActState` implementing the iteration state machine
/// and halt predicates from the ReAct runtime design.
///
/// `start_iteration` opens a new [`ReactIteration`] record; `record_thought`,
/// `record_action`, `record_observation`, `complete`, and `fail` mutate the most
/// recent (open) record and, where relevant, the shared counters.
pub struct ReactRuntime<'a> {
    state: &'a mut ReActState,
    halt: HaltConfig,
}

impl<'a> ReactRuntime<'a> {
    pub fn new(state: &'a mut ReActState, halt: HaltConfig) -> Self {
        Self { state, halt }
    }

    /// Opens a new iteration record, numbered one past the last.
    pub fn start_iteration(&mut self, id: impl Into<String>) -> &mut ReactIteration {
        let index = self.state.iterations.len() as u32;
        self.state.iterations.push(ReactIteration::new(id, index));
        self.state.iterations.last_mut().expect("just pushed")
    }

    fn current(&mut self) -> &mut ReactIteration {
        self.state
            .iterations
            .last_mut()
            .expect("start_iteration must be called first")
    }

    /// Records the reasoning text for the current iteration.
    pub fn record_thought(&mut self, thought: impl Into<String>) {
        self.current().thought = Some(thought.into());
    }

    /// Records the action (tool call) chosen for the current iteration.
    pub fn record_action(&mut self, action: ToolCall) {
        let iter = self.current();
        iter.status = ReactIterationStatus::Action;
        iter.action = Some(action);
    }

    /// Records the observation for the current iteration. Resets `idle_rounds` always;
    /// resets `consecutive_errors` on success and increments it on failure.
    pub fn record_observation(&mut self, observation: ToolResult) {
        let is_error = observation.is_error;
        let iter = self.current();
        iter.status = ReactIterationStatus::Observation;
        iter.observation = Some(observation);
        self.state.idle_rounds = 0;
        if is_error {
            self.state.consecutive_errors += 1;
        } else {
            self.state.consecutive_errors = 0;
        }
    }

    /// Marks the current iteration idle: no tool executed, no final text produced.
    pub fn mark_idle(&mut self) {
        self.state.idle_rounds += 1;
    }

    /// Completes the current iteration with final text. Resets both halt counters.
    pub fn complete(&mut self, response: impl Into<String>, finish_reason: impl Into<String>) {
        let response = response.into();
        let finish_reason = finish_reason.into();
        let iter = self.current();
        iter.status = ReactIterationStatus::Completion;
        iter.response = Some(response);
        iter.finish_reason = Some(finish_reason);
        self.state.consecutive_errors = 0;
        self.state.idle_rounds = 0;
    }

    /// Fails the current iteration with an error message.
    pub fn fail(&mut self, error_message: impl Into<String>) {
        let iter = self.current();
        iter.status = ReactIterationStatus::Failed;
        iter.error_message = Some(error_message.into());
    }

    /// Evaluates the three halt predicates: too many iterations, too many consecutive
    /// errors, or too many idle rounds.
    pub fn should_halt(&self) -> bool {
        self.state.iterations.len() as u32 >= self.halt.max_iterations
            || self.state.consecutive_errors >= self.halt.max_errors
            || self.state.idle_rounds >= self.halt.max_idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: last_assistant_reply finds the last Assistant message, ignoring later Tool/User ones.
    #[test]
    fn last_assistant_reply_finds_last_assistant_message() {
        let mut state = ReActState::default();
        state.messages.push(Message::user("hi"));
        state.messages.push(Message::assistant("first"));
        state.messages.push(Message::tool("result"));
        assert_eq!(state.last_assistant_reply(), Some("first".to_string()));
    }

    /// **Scenario**: a successful observation resets consecutive_errors and idle_rounds.
    #[test]
    fn successful_observation_resets_counters() {
        let mut state = ReActState::default();
        state.consecutive_errors = 3;
        state.idle_rounds = 2;
        let mut runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        runtime.start_iteration("iter-1");
        runtime.record_observation(ToolResult {
            call_id: None,
            name: Some("echo".into()),
            content: "ok".into(),
            is_error: false,
        });
        assert_eq!(state.consecutive_errors, 0);
        assert_eq!(state.idle_rounds, 0);
    }

    /// **Scenario**: a failed observation increments consecutive_errors but resets idle_rounds.
    #[test]
    fn failed_observation_increments_consecutive_errors() {
        let mut state = ReActState::default();
        state.idle_rounds = 1;
        let mut runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        runtime.start_iteration("iter-1");
        runtime.record_observation(ToolResult {
            call_id: None,
            name: Some("echo".into()),
            content: "boom".into(),
            is_error: true,
        });
        assert_eq!(state.consecutive_errors, 1);
        assert_eq!(state.idle_rounds, 0);
    }

    /// **Scenario**: should_halt is true once consecutive_errors reaches max_errors.
    #[test]
    fn should_halt_on_max_errors() {
        let mut state = ReActState::default();
        state.consecutive_errors = 10;
        let runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        assert!(runtime.should_halt());
    }

    /// **Scenario**: should_halt is true once idle_rounds reaches max_idle.
    #[test]
    fn should_halt_on_max_idle() {
        let mut state = ReActState::default();
        state.idle_rounds = 3;
        let runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        assert!(runtime.should_halt());
    }

    /// **Scenario**: should_halt is false when under all thresholds.
    #[test]
    fn should_not_halt_under_thresholds() {
        let mut state = ReActState::default();
        state.consecutive_errors = 1;
        state.idle_rounds = 1;
        let runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        assert!(!runtime.should_halt());
    }

    /// **Scenario**: complete() marks the iteration terminal and resets both counters.
    #[test]
    fn complete_resets_counters_and_marks_terminal() {
        let mut state = ReActState::default();
        state.consecutive_errors = 2;
        state.idle_rounds = 1;
        let mut runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        runtime.start_iteration("iter-1");
        runtime.complete("done", "stop");
        assert_eq!(state.consecutive_errors, 0);
        assert_eq!(state.idle_rounds, 0);
        assert_eq!(
            state.iterations[0].status,
            ReactIterationStatus::Completion
        );
    }

    /// **Scenario**: mark_idle increments idle_rounds without touching consecutive_errors.
    #[test]
    fn mark_idle_increments_idle_rounds_only() {
        let mut state = ReActState::default();
        state.consecutive_errors = 2;
        let mut runtime = ReactRuntime::new(&mut state, HaltConfig::default());
        runtime.start_iteration("iter-1");
        runtime.mark_idle();
        assert_eq!(state.idle_rounds, 1);
        assert_eq!(state.consecutive_errors, 2);
    }
}
