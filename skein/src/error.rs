//! Agent execution error types.
//!
//! Used by `Agent::run`, the ReAct runtime, and the retry/circuit-breaker layer.

use thiserror::Error;

use crate::graph::GraphInterrupt;

/// Error category assigned by the classifier (C2).
///
/// Drives retry eligibility in the retry manager (C1): `Auth` and `Model` are
/// never retried; `RateLimit` gets a minimum-delay floor and extended budget;
/// everything else defaults to `Unknown`/retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Auth,
    RateLimit,
    Model,
    ContextLength,
    Validation,
    ToolExec,
    Cancellation,
    Unknown,
}

impl ErrorCategory {
    /// Whether C1 should ever retry an operation that failed with this category.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ErrorCategory::Auth | ErrorCategory::Model | ErrorCategory::Validation
        )
    }
}

/// Classifies a raw error message into a [`ClassifiedError`] by matching
/// case-insensitive substrings against the known failure taxonomy.
///
/// Order matters: rate-limit and auth phrasing are checked before the more
/// general HTTP-status substrings since e.g. "429" is also matched by the
/// rate-limit check. Falls back to `Unknown` (retryable) when nothing matches.
pub fn classify(raw: &str) -> ClassifiedError {
    let lower = raw.to_lowercase();

    let category = if lower.contains("rate limit") || lower.contains("429") {
        ErrorCategory::RateLimit
    } else if lower.contains("unauthorized")
        || lower.contains("401")
        || lower.contains("forbidden")
        || lower.contains("403")
    {
        ErrorCategory::Auth
    } else if lower.contains("context length")
        || lower.contains("context_length")
        || lower.contains("token limit")
        || lower.contains("maximum context length")
    {
        ErrorCategory::ContextLength
    } else if lower.contains("econnrefused")
        || lower.contains("connection refused")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
        || lower.contains("dns")
    {
        ErrorCategory::Network
    } else if lower.contains("cancelled") || lower.contains("canceled") || lower.contains("abort")
    {
        ErrorCategory::Cancellation
    } else if lower.contains("invalid request")
        || lower.contains("validation")
        || lower.contains("bad request")
        || lower.contains("400")
    {
        ErrorCategory::Validation
    } else if lower.contains("tool") && (lower.contains("failed") || lower.contains("error")) {
        ErrorCategory::ToolExec
    } else if lower.contains("model") && lower.contains("error") {
        ErrorCategory::Model
    } else {
        ErrorCategory::Unknown
    };

    ClassifiedError::new(category, raw)
}

/// An error after classification, carrying the original message plus the
/// taxonomy fields the retry manager and user-facing layer need.
#[derive(Debug, Clone, Error)]
#[error("{category:?}: {message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub retryable: bool,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            retryable: category.is_retryable(),
            category,
            message,
        }
    }

    /// Pre-canned user-visible message for this category.
    pub fn user_message(&self) -> String {
        match self.category {
            ErrorCategory::Network => "A network error occurred. Please retry.".to_string(),
            ErrorCategory::Auth => {
                "Authentication failed. Please check your API key configuration.".to_string()
            }
            ErrorCategory::RateLimit => {
                "Rate limit exceeded. Retrying with backoff.".to_string()
            }
            ErrorCategory::Model => "The model returned an error.".to_string(),
            ErrorCategory::ContextLength => {
                "The conversation is too long and is being compressed.".to_string()
            }
            ErrorCategory::Validation => format!("Invalid request: {}", self.message),
            ErrorCategory::ToolExec => format!("Tool execution failed: {}", self.message),
            ErrorCategory::Cancellation => "The operation was cancelled.".to_string(),
            ErrorCategory::Unknown => format!("An error occurred: {}", self.message),
        }
    }
}

/// Agent execution error.
///
/// Returned by `Agent::run` when a step fails, and by the ReAct runtime and
/// retry manager for classified/circuit-breaker failures.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, tool error).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Graph execution was interrupted.
    ///
    /// This error is raised when a node requests an interrupt for human-in-the-loop
    /// scenarios. The graph executor can catch this error, save a checkpoint,
    /// and later resume execution with user input.
    #[error("graph interrupted: {0}")]
    Interrupted(GraphInterrupt),

    /// A classified error from C2, propagated once C1 exhausts retries or
    /// determined the category is not retryable.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// The circuit breaker for the named operation is open; the call was not attempted.
    #[error("circuit breaker is open for operation: {0}")]
    CircuitOpen(String),
}

impl From<GraphInterrupt> for AgentError {
    fn from(interrupt: GraphInterrupt) -> Self {
        AgentError::Interrupted(interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display format of ExecutionFailed contains "execution failed" and the message.
    #[test]
    fn agent_error_display_execution_failed() {
        let err = AgentError::ExecutionFailed("msg".to_string());
        let s = err.to_string();
        assert!(
            s.contains("execution failed"),
            "Display should contain 'execution failed': {}",
            s
        );
        assert!(s.contains("msg"), "Display should contain message: {}", s);
    }

    /// **Scenario**: Debug format includes variant name and message.
    #[test]
    fn agent_error_debug_format() {
        let err = AgentError::ExecutionFailed("test".to_string());
        let s = format!("{:?}", err);
        assert!(
            s.contains("ExecutionFailed"),
            "Debug should contain variant name: {}",
            s
        );
        assert!(s.contains("test"), "Debug should contain message: {}", s);
    }

    /// **Scenario**: Auth, Model, and Validation categories are never retryable.
    #[test]
    fn error_category_retryable_excludes_auth_model_validation() {
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Model.is_retryable());
        assert!(!ErrorCategory::Validation.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Unknown.is_retryable());
    }

    /// **Scenario**: ClassifiedError::new derives `retryable` from the category.
    #[test]
    fn classified_error_retryable_derived_from_category() {
        let e = ClassifiedError::new(ErrorCategory::Auth, "401");
        assert!(!e.retryable);
        let e = ClassifiedError::new(ErrorCategory::Network, "ECONNREFUSED");
        assert!(e.retryable);
    }

    /// **Scenario**: AgentError::CircuitOpen carries the op id in its Display message.
    #[test]
    fn agent_error_circuit_open_display_contains_op_id() {
        let err = AgentError::CircuitOpen("llm.call".to_string());
        assert!(err.to_string().contains("llm.call"));
    }

    /// **Scenario**: ClassifiedError converts into AgentError via `?`/`From`.
    #[test]
    fn classified_error_converts_into_agent_error() {
        let classified = ClassifiedError::new(ErrorCategory::RateLimit, "429 rate limit");
        let err: AgentError = classified.into();
        assert!(matches!(err, AgentError::Classified(_)));
    }

    /// **Scenario**: user_message for Auth matches the pre-canned copy from the error taxonomy.
    #[test]
    fn classified_error_user_message_auth() {
        let e = ClassifiedError::new(ErrorCategory::Auth, "401 unauthorized");
        assert_eq!(
            e.user_message(),
            "Authentication failed. Please check your API key configuration."
        );
    }

    /// **Scenario**: classify recognizes rate-limit phrasing and the bare "429" status.
    #[test]
    fn classify_recognizes_rate_limit() {
        assert_eq!(
            classify("Rate limit exceeded, try again later").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(classify("HTTP 429 Too Many Requests").category, ErrorCategory::RateLimit);
    }

    /// **Scenario**: classify recognizes auth failures ("401", "unauthorized") and marks them not retryable.
    #[test]
    fn classify_recognizes_auth_and_is_not_retryable() {
        let e = classify("401 Unauthorized: invalid API key");
        assert_eq!(e.category, ErrorCategory::Auth);
        assert!(!e.retryable);
    }

    /// **Scenario**: classify recognizes connection-refused and 502/503/504 as Network (retryable).
    #[test]
    fn classify_recognizes_network_errors() {
        assert_eq!(classify("connect ECONNREFUSED 127.0.0.1:443").category, ErrorCategory::Network);
        assert_eq!(classify("upstream returned 503 Service Unavailable").category, ErrorCategory::Network);
        assert!(classify("request timed out after 30s").retryable);
    }

    /// **Scenario**: classify recognizes context-length overflow phrasing.
    #[test]
    fn classify_recognizes_context_length() {
        assert_eq!(
            classify("This model's maximum context length is 8192 tokens").category,
            ErrorCategory::ContextLength
        );
    }

    /// **Scenario**: classify defaults to Unknown (retryable) for unrecognized text.
    #[test]
    fn classify_defaults_to_unknown_retryable() {
        let e = classify("something unexpected happened");
        assert_eq!(e.category, ErrorCategory::Unknown);
        assert!(e.retryable);
    }

    /// **Scenario**: classify is case-insensitive.
    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify("RATE LIMIT EXCEEDED").category, ErrorCategory::RateLimit);
        assert_eq!(classify("Econnrefused").category, ErrorCategory::Network);
    }
}
