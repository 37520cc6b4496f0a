//! Message types for agent state and the agent-loop wire format.
//!
//! [`Message`] is the loop-internal message: role plus plain text, used directly
//! as graph state by the ReAct/DUP/ToT/GoT nodes. [`AgentMessage`]/[`MessagePart`]
//! is the richer ordered-parts wire format used by the agent loop and tool
//! dispatch layer, where a tool-call must carry structured args and a tool result
//! must reference the call it answers.

use std::collections::HashMap;

/// A single message in the conversation.
///
/// Roles: system prompt, user input, assistant reply, tool result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt; typically placed first in the message list.
    System(String),
    /// User input.
    User(String),
    /// Model/agent reply.
    Assistant(String),
    /// Tool execution result fed back into the conversation.
    Tool(String),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Creates a tool-result message.
    pub fn tool(content: impl Into<String>) -> Self {
        Self::Tool(content.into())
    }

    /// Returns the plain-text content regardless of role.
    pub fn text(&self) -> &str {
        match self {
            Message::System(c) | Message::User(c) | Message::Assistant(c) | Message::Tool(c) => c,
        }
    }
}

/// One part of an [`AgentMessage`]'s ordered content.
///
/// A plain-string message is the degenerate case of a single `Text` part.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    /// Plain text content.
    Text { text: String },
    /// An attached file, e.g. an image.
    File {
        data: Vec<u8>,
        mime: String,
    },
    /// A tool call the assistant requests.
    ToolCall {
        id: String,
        name: String,
        args: HashMap<String, serde_json::Value>,
    },
    /// The result of a tool call, referencing its id.
    ToolResult {
        id: String,
        name: String,
        result: serde_json::Value,
    },
}

impl MessagePart {
    /// Creates a text part.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            text: content.into(),
        }
    }
}

/// Role-tagged message with ordered content parts, used by the agent loop (C8)
/// and tool dispatch layer.
///
/// Invariant: a `Tool` message's parts are all `ToolResult` parts; an `Assistant`
/// message's `ToolCall` parts must be answered by a subsequent `Tool` message
/// referencing the same ids.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AgentMessage {
    System { content: Vec<MessagePart> },
    User { content: Vec<MessagePart> },
    Assistant { content: Vec<MessagePart> },
    Tool { content: Vec<MessagePart> },
}

impl AgentMessage {
    /// Creates a system message from plain text.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            content: vec![MessagePart::text(text)],
        }
    }

    /// Creates a user message from plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: vec![MessagePart::text(text)],
        }
    }

    /// Creates an assistant message from plain text (no tool calls).
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: vec![MessagePart::text(text)],
        }
    }

    /// Creates an assistant message carrying text plus tool calls.
    ///
    /// Matches §4.8 step 7: "append an assistant message containing the text
    /// (if any) plus tool-call parts".
    pub fn assistant_with_tool_calls(
        text: Option<String>,
        tool_calls: Vec<MessagePart>,
    ) -> Self {
        let mut content = Vec::with_capacity(tool_calls.len() + 1);
        if let Some(t) = text {
            if !t.is_empty() {
                content.push(MessagePart::text(t));
            }
        }
        content.extend(tool_calls);
        Self::Assistant { content }
    }

    /// Creates a tool-role message from a set of tool-result parts.
    pub fn tool_results(results: Vec<MessagePart>) -> Self {
        Self::Tool { content: results }
    }

    /// Returns the ordered content parts regardless of role.
    pub fn content(&self) -> &[MessagePart] {
        match self {
            AgentMessage::System { content }
            | AgentMessage::User { content }
            | AgentMessage::Assistant { content }
            | AgentMessage::Tool { content } => content,
        }
    }

    /// Concatenates all `Text` parts, in order, joined by newlines.
    ///
    /// Non-text parts (files, tool calls, tool results) are skipped.
    pub fn text(&self) -> String {
        self.content()
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the ids of all `ToolCall` parts in this message, in order.
    pub fn tool_call_ids(&self) -> Vec<&str> {
        self.content()
            .iter()
            .filter_map(|p| match p {
                MessagePart::ToolCall { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the ids of all `ToolResult` parts in this message, in order.
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.content()
            .iter()
            .filter_map(|p| match p {
                MessagePart::ToolResult { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Checks the ordered-history invariant from §3: every assistant tool-call id
/// is answered by a subsequent tool message with a matching tool-result id,
/// and vice versa.
pub fn tool_call_ids_balanced(history: &[AgentMessage]) -> bool {
    use std::collections::HashSet;

    let mut pending: HashSet<&str> = HashSet::new();
    for msg in history {
        match msg {
            AgentMessage::Assistant { .. } => {
                for id in msg.tool_call_ids() {
                    pending.insert(id);
                }
            }
            AgentMessage::Tool { .. } => {
                for id in msg.tool_result_ids() {
                    if !pending.remove(id) {
                        return false;
                    }
                }
            }
            _ => {}
        }
    }
    pending.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: system/user/assistant/tool constructors produce the correct variant with content.
    #[test]
    fn message_constructors() {
        let sys = Message::system("s");
        assert!(matches!(&sys, Message::System(c) if c == "s"));
        let usr = Message::user("u");
        assert!(matches!(&usr, Message::User(c) if c == "u"));
        let ast = Message::assistant("a");
        assert!(matches!(&ast, Message::Assistant(c) if c == "a"));
        let tool = Message::tool("t");
        assert!(matches!(&tool, Message::Tool(c) if c == "t"));
    }

    /// **Scenario**: Message::text returns the content regardless of role.
    #[test]
    fn message_text_any_role() {
        assert_eq!(Message::system("s").text(), "s");
        assert_eq!(Message::tool("t").text(), "t");
    }

    /// **Scenario**: Each Message variant round-trips through serde.
    #[test]
    fn message_serialize_deserialize_roundtrip() {
        for msg in [
            Message::system("sys"),
            Message::user("usr"),
            Message::assistant("ast"),
            Message::tool("res"),
        ] {
            let json = serde_json::to_string(&msg).expect("serialize");
            let back: Message = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(msg.text(), back.text());
        }
    }

    /// **Scenario**: a plain-text AgentMessage is the single-Text-part degenerate case.
    #[test]
    fn agent_message_plain_text_degenerate_case() {
        let m = AgentMessage::user("hello");
        assert_eq!(m.content().len(), 1);
        assert_eq!(m.text(), "hello");
    }

    /// **Scenario**: assistant_with_tool_calls orders text before tool-call parts.
    #[test]
    fn assistant_with_tool_calls_orders_text_first() {
        let call = MessagePart::ToolCall {
            id: "c1".into(),
            name: "search".into(),
            args: HashMap::new(),
        };
        let m = AgentMessage::assistant_with_tool_calls(Some("thinking...".into()), vec![call]);
        assert_eq!(m.text(), "thinking...");
        assert_eq!(m.tool_call_ids(), vec!["c1"]);
    }

    /// **Scenario**: assistant_with_tool_calls omits the text part when text is empty.
    #[test]
    fn assistant_with_tool_calls_omits_empty_text() {
        let call = MessagePart::ToolCall {
            id: "c1".into(),
            name: "search".into(),
            args: HashMap::new(),
        };
        let m = AgentMessage::assistant_with_tool_calls(None, vec![call]);
        assert_eq!(m.content().len(), 1);
        assert_eq!(m.text(), "");
    }

    /// **Scenario**: tool_call_ids_balanced is true when every call has a matching result.
    #[test]
    fn tool_call_ids_balanced_true_when_matched() {
        let call = MessagePart::ToolCall {
            id: "c1".into(),
            name: "search".into(),
            args: HashMap::new(),
        };
        let result = MessagePart::ToolResult {
            id: "c1".into(),
            name: "search".into(),
            result: serde_json::json!({"ok": true}),
        };
        let history = vec![
            AgentMessage::user("q"),
            AgentMessage::assistant_with_tool_calls(None, vec![call]),
            AgentMessage::tool_results(vec![result]),
        ];
        assert!(tool_call_ids_balanced(&history));
    }

    /// **Scenario**: tool_call_ids_balanced is false when a call is never answered.
    #[test]
    fn tool_call_ids_balanced_false_when_unanswered() {
        let call = MessagePart::ToolCall {
            id: "c1".into(),
            name: "search".into(),
            args: HashMap::new(),
        };
        let history = vec![AgentMessage::assistant_with_tool_calls(None, vec![call])];
        assert!(!tool_call_ids_balanced(&history));
    }

    /// **Scenario**: tool_call_ids_balanced is false when a result references an unknown call.
    #[test]
    fn tool_call_ids_balanced_false_when_result_has_no_call() {
        let result = MessagePart::ToolResult {
            id: "ghost".into(),
            name: "search".into(),
            result: serde_json::Value::Null,
        };
        let history = vec![AgentMessage::tool_results(vec![result])];
        assert!(!tool_call_ids_balanced(&history));
    }
}
