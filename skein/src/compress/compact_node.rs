//! Compact node: when config.auto and context overflows, summarizes old messages via LLM.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::state::ReActState;

use super::compaction;
use super::config::CompactionConfig;
use super::context_window;

/// Node that compacts conversation history when context overflows (config.auto).
pub struct CompactNode {
    pub config: CompactionConfig,
    pub llm: Arc<dyn LlmClient>,
}

#[async_trait]
impl Node<ReActState> for CompactNode {
    fn id(&self) -> &str {
        "compact"
    }

    async fn run(&self, state: ReActState) -> Result<(ReActState, Next), AgentError> {
        let overflow_input = context_window::ContextWindowCheck {
            messages: &state.messages,
            usage: state
                .usage
                .as_ref()
                .map(|u| (u.prompt_tokens, u.completion_tokens)),
            message_count_after_last_think: state.message_count_after_last_think,
            max_context_tokens: self.config.max_context_tokens,
            reserve_tokens: self.config.reserve_tokens,
        };
        let triggered = self.config.auto
            && (context_window::is_overflow(&overflow_input)
                || should_compact(&state, &self.config));
        let messages = if triggered {
            compaction::compact(&state.messages, self.llm.as_ref(), &self.config).await?
        } else {
            state.messages
        };
        Ok((ReActState { messages, ..state }, Next::Continue))
    }
}

/// Non-token-overflow triggers: message count, a failed iteration's error text
/// mentioning tokens/length, or a `length` finish reason once enough turns have run.
fn should_compact(state: &ReActState, config: &CompactionConfig) -> bool {
    if let Some(threshold) = config.compress_threshold {
        if state.messages.len() >= threshold {
            return true;
        }
    }

    if let Some(last) = state.iterations.last() {
        if let Some(err) = &last.error_message {
            let lower = err.to_lowercase();
            if lower.contains("tokens") || lower.contains("too long") {
                return true;
            }
        }
        if last.finish_reason.as_deref() == Some("length") && state.iterations.len() >= 5 {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::message::Message;
    use crate::state::ReActState;
    use crate::MockLlm;

    use super::*;

    #[tokio::test]
    async fn compact_node_id_is_compact() {
        let node = CompactNode {
            config: CompactionConfig::default(),
            llm: Arc::new(MockLlm::with_no_tool_calls("")),
        };
        assert_eq!(node.id(), "compact");
    }

    #[tokio::test]
    async fn compact_node_auto_false_passes_through() {
        let node = CompactNode {
            config: CompactionConfig {
                auto: false,
                ..Default::default()
            },
            llm: Arc::new(MockLlm::with_no_tool_calls("")),
        };
        let state = ReActState {
            messages: vec![Message::User("a".repeat(200_000))], // would overflow if checked
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
        };
        let (out, next) = node.run(state).await.unwrap();
        assert_eq!(out.messages.len(), 1);
        assert!(matches!(next, Next::Continue));
    }

    #[tokio::test]
    async fn compact_node_auto_true_but_no_overflow_passes_through() {
        let node = CompactNode {
            config: CompactionConfig {
                auto: true,
                max_context_tokens: 200_000,
                reserve_tokens: 4096,
                ..Default::default()
            },
            llm: Arc::new(MockLlm::with_no_tool_calls("")),
        };
        let state = ReActState {
            messages: vec![Message::User("short".to_string())],
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
        };
        let (out, next) = node.run(state).await.unwrap();
        assert_eq!(out.messages.len(), 1);
        assert!(matches!(next, Next::Continue));
    }

    fn base_state(messages: Vec<Message>) -> ReActState {
        ReActState {
            messages,
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

    #[tokio::test]
    async fn compact_node_triggers_on_message_count_threshold() {
        let node = CompactNode {
            config: CompactionConfig {
                auto: true,
                compact_keep_recent: 1,
                compress_threshold: Some(3),
                ..Default::default()
            },
            llm: Arc::new(MockLlm::with_no_tool_calls("summary")),
        };
        let state = base_state(vec![
            Message::User("a".to_string()),
            Message::User("b".to_string()),
            Message::User("c".to_string()),
        ]);
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(&out.messages[0], Message::System(s) if s.contains("summary")));
    }

    #[tokio::test]
    async fn compact_node_triggers_on_error_text_mentioning_tokens() {
        use crate::state::{ReactIteration, ReactIterationStatus};

        let node = CompactNode {
            config: CompactionConfig {
                auto: true,
                compact_keep_recent: 1,
                ..Default::default()
            },
            llm: Arc::new(MockLlm::with_no_tool_calls("summary")),
        };
        let mut state = base_state(vec![
            Message::User("a".to_string()),
            Message::User("b".to_string()),
        ]);
        state.iterations.push(ReactIteration {
            id: "1".to_string(),
            index: 0,
            started_at: std::time::SystemTime::now(),
            status: ReactIterationStatus::Failed,
            thought: None,
            action: None,
            observation: None,
            response: None,
            finish_reason: None,
            error_message: Some("request exceeded maximum tokens".to_string()),
        });
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(&out.messages[0], Message::System(s) if s.contains("summary")));
    }

    #[tokio::test]
    async fn compact_node_triggers_on_length_finish_reason_after_five_turns() {
        use crate::state::{ReactIteration, ReactIterationStatus};

        let node = CompactNode {
            config: CompactionConfig {
                auto: true,
                compact_keep_recent: 1,
                ..Default::default()
            },
            llm: Arc::new(MockLlm::with_no_tool_calls("summary")),
        };
        let mut state = base_state(vec![
            Message::User("a".to_string()),
            Message::User("b".to_string()),
        ]);
        for i in 0..5 {
            state.iterations.push(ReactIteration {
                id: i.to_string(),
                index: i as u32,
                started_at: std::time::SystemTime::now(),
                status: ReactIterationStatus::Completion,
                thought: None,
                action: None,
                observation: None,
                response: None,
                finish_reason: if i == 4 { Some("length".to_string()) } else { None },
                error_message: None,
            });
        }
        let (out, _) = node.run(state).await.unwrap();
        assert!(matches!(&out.messages[0], Message::System(s) if s.contains("summary")));
    }

    #[tokio::test]
    async fn compact_node_length_finish_reason_before_five_turns_does_not_trigger() {
        use crate::state::{ReactIteration, ReactIterationStatus};

        let node = CompactNode {
            config: CompactionConfig {
                auto: true,
                compact_keep_recent: 1,
                ..Default::default()
            },
            llm: Arc::new(MockLlm::with_no_tool_calls("summary")),
        };
        let mut state = base_state(vec![
            Message::User("a".to_string()),
            Message::User("b".to_string()),
        ]);
        state.iterations.push(ReactIteration {
            id: "1".to_string(),
            index: 0,
            started_at: std::time::SystemTime::now(),
            status: ReactIterationStatus::Completion,
            thought: None,
            action: None,
            observation: None,
            response: None,
            finish_reason: Some("length".to_string()),
            error_message: None,
        });
        let (out, _) = node.run(state).await.unwrap();
        assert_eq!(out.messages.len(), 2);
    }
}
