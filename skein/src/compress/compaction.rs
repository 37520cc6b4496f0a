//! Conversation compaction: prune old tool results and compact history via LLM summarization.
//!
//! Capabilities:
//! - **prune**: Replace old tool-result messages beyond a token limit with a placeholder.
//! - **compact**: Summarize earlier messages into one System message via LLM and keep the most recent N as-is.

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;

use super::config::CompactionConfig;
use super::context_window::estimate_tokens;

/// Placeholder text used to replace pruned tool results in messages.
pub const PRUNE_PLACEHOLDER: &str = "[Old tool result cleared]";

/// Returns true if the message is a tool result (`Message::Tool`).
fn is_tool_result_message(m: &Message) -> bool {
    matches!(m, Message::Tool(_))
}

/// Replace old tool results beyond the keep-token limit with a placeholder.
///
/// Traverses messages from newest to oldest, accumulating tokens for tool-result messages only.
/// Results that push the total over `prune_keep_tokens` are marked for pruning. If the total
/// prunable tokens would be less than `prune_minimum`, no change is made.
pub fn prune(messages: Vec<Message>, config: &CompactionConfig) -> Vec<Message> {
    // Skip when pruning is off or keep limit is zero
    if !config.prune || config.prune_keep_tokens == 0 {
        return messages;
    }
    // Only apply pruning if we would remove at least this many tokens (avoids tiny, frequent edits)
    let min = config.prune_minimum.unwrap_or(20_000);

    let mut total: u32 = 0; // accumulated tool-result tokens (newest to oldest)
    let mut pruned: u32 = 0; // total tokens marked for pruning
    let mut to_prune = Vec::new(); // indices of messages to replace with placeholder

    // Walk from newest to oldest; once total exceeds keep, mark older tool results for pruning
    for (i, m) in messages.iter().enumerate().rev() {
        if is_tool_result_message(m) {
            let tok = estimate_tokens(std::slice::from_ref(m));
            total += tok;
            if total > config.prune_keep_tokens {
                pruned += tok;
                to_prune.push(i);
            }
        }
    }

    // Do nothing if we would prune fewer than min tokens
    if pruned < min {
        return messages;
    }

    // Replace marked messages with placeholder
    let mut out = messages;
    for i in to_prune {
        if let Some(Message::Tool(_)) = out.get_mut(i) {
            out[i] = Message::Tool(PRUNE_PLACEHOLDER.to_string());
        }
    }
    out
}

/// Summarize earlier messages into one System message via LLM and keep the most recent N as-is.
///
/// Output is `[one summary System message] + [last compact_keep_recent original messages]`.
/// If the summary is still too large relative to the compacted window, the summarization
/// prompt is retried over a smaller window (recursive shrink) rather than emitted as-is.
pub async fn compact(
    messages: &[Message],
    llm: &dyn LlmClient,
    config: &CompactionConfig,
) -> Result<Vec<Message>, AgentError> {
    let keep = config.compact_keep_recent;
    if messages.len() <= keep {
        return Ok(messages.to_vec());
    }
    // Split: older messages to summarize, last `keep` messages to keep verbatim
    let split = messages.len().saturating_sub(keep);
    let (to_summarize, recent) = messages.split_at(split);

    let content = summarize_with_shrink(to_summarize, llm, config.max_context_tokens).await?;

    // Prepend one System message with the summary, then the recent messages
    let summary = Message::System(format!("[Summary of earlier conversation]: {}", content));
    let mut out = vec![summary];
    out.extend(recent.iter().cloned());
    Ok(out)
}

/// Shrink factor applied to the summarization window each time the result is still too large.
const SHRINK_FACTOR: f64 = 0.8;

/// Minimum window size below which we stop shrinking and accept whatever the LLM returns.
const MIN_SHRINK_MESSAGES: usize = 1;

/// Summarize `to_summarize` via the LLM; if the resulting summary alone would still overflow
/// `max_context_tokens`, drop the oldest messages in the window (by `SHRINK_FACTOR`) and retry.
///
/// If the LLM call itself fails (rate limit, outage, whatever), falls back to
/// [`truncate_intelligently`] instead of propagating the error, so a compaction
/// pass never leaves the conversation stuck above the context limit.
async fn summarize_with_shrink(
    to_summarize: &[Message],
    llm: &dyn LlmClient,
    max_context_tokens: u32,
) -> Result<String, AgentError> {
    let mut window = to_summarize;
    loop {
        let prompt = build_summary_prompt(window);
        let summary_msgs = vec![Message::User(prompt)];
        let response = match llm.invoke(&summary_msgs).await {
            Ok(r) => r,
            Err(_) => return Ok(truncate_intelligently(to_summarize)),
        };
        let content = response.content;

        let summary_tokens = estimate_tokens(&[Message::System(content.clone())]);
        if summary_tokens <= max_context_tokens || window.len() <= MIN_SHRINK_MESSAGES {
            return Ok(content);
        }

        let shrunk_len = ((window.len() as f64) * SHRINK_FACTOR) as usize;
        let shrunk_len = shrunk_len.max(MIN_SHRINK_MESSAGES).min(window.len() - 1);
        window = &window[window.len() - shrunk_len..];
    }
}

/// Fraction of the oldest messages kept verbatim when the LLM summarizer is unavailable.
const TRUNCATE_HEAD_FRACTION: f64 = 0.35;

/// Fraction of the newest messages kept verbatim when the LLM summarizer is unavailable.
const TRUNCATE_TAIL_FRACTION: f64 = 0.30;

/// Placeholder text standing in for the middle range cut by [`truncate_intelligently`].
const TRUNCATE_PLACEHOLDER: &str = "[... earlier messages truncated, summarizer unavailable ...]";

/// Build a plain-text summary without calling the LLM: keep the first 35% and
/// last 30% of `messages` verbatim, with a placeholder for the cut middle.
fn truncate_intelligently(messages: &[Message]) -> String {
    let len = messages.len();
    if len == 0 {
        return String::new();
    }
    let head = ((len as f64) * TRUNCATE_HEAD_FRACTION).ceil() as usize;
    let tail = ((len as f64) * TRUNCATE_TAIL_FRACTION).ceil() as usize;
    let head = head.min(len);
    let tail = tail.min(len - head);

    let mut parts: Vec<String> = Vec::new();
    for m in &messages[..head] {
        parts.push(format_message(m));
    }
    if head + tail < len {
        parts.push(TRUNCATE_PLACEHOLDER.to_string());
    }
    for m in &messages[len - tail..] {
        parts.push(format_message(m));
    }
    parts.join("\n")
}

/// Render a single message as `Role: content` for the truncation fallback.
fn format_message(m: &Message) -> String {
    match m {
        Message::System(s) => format!("System: {}", s),
        Message::User(s) => format!("User: {}", s),
        Message::Assistant(s) => format!("Assistant: {}", s),
        Message::Tool(s) => format!("Tool: {}", s),
    }
}

/// Build the prompt sent to the LLM: instructions on what to summarize, then the message list.
fn build_summary_prompt(msgs: &[Message]) -> String {
    // Instruction lines telling the LLM what to focus on
    let mut parts = vec![
        "Summarize the following conversation. Focus on:".to_string(),
        "- What was done".to_string(),
        "- What is being worked on".to_string(),
        "- Which files are involved".to_string(),
        "- What needs to be done next".to_string(),
        "".to_string(),
    ];
    // Append each message with a role prefix
    for m in msgs {
        match m {
            Message::System(s) => parts.push(format!("System: {}", s)),
            Message::User(s) => parts.push(format!("User: {}", s)),
            Message::Assistant(s) => parts.push(format!("Assistant: {}", s)),
            Message::Tool(s) => parts.push(format!("Tool: {}", s)),
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    //! Tests for prune: disabled, zero keep, no tool results, minimum threshold, and replacement.

    use async_trait::async_trait;

    use crate::error::AgentError;
    use crate::llm::LlmResponse;
    use crate::message::Message;

    use super::*;

    /// LLM stub that always fails, to exercise the truncation fallback.
    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, AgentError> {
            Err(AgentError::ExecutionFailed("llm unavailable".to_string()))
        }
    }

    /// Build a Tool message for tests.
    fn tool_result_msg(name: &str, content: &str) -> Message {
        Message::Tool(format!("Tool {} returned: {}", name, content))
    }

    #[test]
    fn prune_disabled_returns_unchanged() {
        let config = CompactionConfig {
            prune: false,
            prune_keep_tokens: 1000,
            ..Default::default()
        };
        let msgs = vec![Message::User("hi".to_string()), tool_result_msg("a", "data")];
        let out = prune(msgs.clone(), &config);
        assert_eq!(out.len(), msgs.len());
        assert!(matches!(&out[0], Message::User(s) if s == "hi"));
        assert!(matches!(&out[1], Message::Tool(s) if s.contains("Tool a returned:")));
    }

    #[test]
    fn prune_keep_tokens_zero_returns_unchanged() {
        let config = CompactionConfig {
            prune: true,
            prune_keep_tokens: 0,
            ..Default::default()
        };
        let msgs = vec![tool_result_msg("a", "x")];
        let out = prune(msgs.clone(), &config);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], Message::Tool(s) if s.contains("Tool a returned:")));
    }

    #[test]
    fn prune_no_tool_results_returns_unchanged() {
        let config = CompactionConfig {
            prune: true,
            prune_keep_tokens: 100,
            prune_minimum: Some(0),
            ..Default::default()
        };
        let msgs = vec![
            Message::User("hi".to_string()),
            Message::Assistant("hello".to_string()),
        ];
        let out = prune(msgs.clone(), &config);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Message::User(s) if s == "hi"));
        assert!(matches!(&out[1], Message::Assistant(s) if s == "hello"));
    }

    #[test]
    fn prune_replaces_old_tool_results_beyond_keep() {
        // Each tool result is "Tool X returned: " + 20 chars ≈ 40 chars = 10 tokens. Two = 20 total.
        // keep = 15: newest (10) kept, then older (10) pushes total to 20 > 15, so we prune the older (index 1).
        let config = CompactionConfig {
            prune: true,
            prune_keep_tokens: 15,
            prune_minimum: Some(0),
            ..Default::default()
        };
        let msgs = vec![
            Message::User("user".to_string()),
            tool_result_msg("old", "12345678901234567890"),
            tool_result_msg("new", "abcdefghijabcdefghij"),
        ];
        let out = prune(msgs, &config);
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[0], Message::User(s) if s == "user"));
        assert!(matches!(&out[1], Message::Tool(s) if s == PRUNE_PLACEHOLDER));
        assert!(matches!(&out[2], Message::Tool(s) if s.contains("Tool new returned:")));
    }

    #[test]
    fn prune_below_minimum_returns_unchanged() {
        let config = CompactionConfig {
            prune: true,
            prune_keep_tokens: 1,
            prune_minimum: Some(100_000), // would prune 1 token but min is 100k
            ..Default::default()
        };
        let msgs = vec![
            Message::User("x".to_string()),
            tool_result_msg("a", &"y".repeat(400)), // 100 tokens
        ];
        let out = prune(msgs.clone(), &config);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Message::User(s) if s == "x"));
        assert!(matches!(&out[1], Message::Tool(s) if s.contains("Tool a returned:")));
    }

    #[tokio::test]
    async fn compact_keeps_recent_and_summarizes_older() {
        let msgs: Vec<Message> = (0..5)
            .map(|i| Message::User(format!("msg {}", i)))
            .collect();
        let config = CompactionConfig {
            compact_keep_recent: 2,
            max_context_tokens: 128_000,
            ..Default::default()
        };
        let llm = crate::MockLlm::with_no_tool_calls("summary text");
        let out = compact(&msgs, &llm, &config).await.unwrap();
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[0], Message::System(s) if s.contains("summary text")));
        assert!(matches!(&out[1], Message::User(s) if s == "msg 3"));
        assert!(matches!(&out[2], Message::User(s) if s == "msg 4"));
    }

    #[tokio::test]
    async fn compact_under_keep_threshold_passes_through() {
        let msgs = vec![Message::User("a".to_string()), Message::User("b".to_string())];
        let config = CompactionConfig {
            compact_keep_recent: 10,
            ..Default::default()
        };
        let llm = crate::MockLlm::with_no_tool_calls("unused");
        let out = compact(&msgs, &llm, &config).await.unwrap();
        assert_eq!(out, msgs);
    }

    #[tokio::test]
    async fn compact_falls_back_to_truncation_when_llm_fails() {
        let msgs: Vec<Message> = (0..10)
            .map(|i| Message::User(format!("msg {}", i)))
            .collect();
        let config = CompactionConfig {
            compact_keep_recent: 2,
            ..Default::default()
        };
        let llm = FailingLlm;
        let out = compact(&msgs, &llm, &config).await.unwrap();
        // Summary message plus the 2 kept-recent messages.
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[0], Message::System(s) if s.contains("msg 0") && s.contains("truncated")));
    }

    #[test]
    fn truncate_intelligently_keeps_head_tail_and_placeholder() {
        let msgs: Vec<Message> = (0..10)
            .map(|i| Message::User(format!("msg {}", i)))
            .collect();
        let out = truncate_intelligently(&msgs);
        assert!(out.contains("msg 0"));
        assert!(out.contains("msg 9"));
        assert!(out.contains(TRUNCATE_PLACEHOLDER));
        // Middle messages should be dropped.
        assert!(!out.contains("msg 5"));
    }

    #[test]
    fn truncate_intelligently_empty_input_is_empty_string() {
        assert_eq!(truncate_intelligently(&[]), "");
    }
}
