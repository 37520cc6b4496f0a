//! Resilience: retrying a whole external operation (an LLM call, a tool call)
//! with jittered backoff and a per-operation circuit breaker.
//!
//! Complements [`crate::graph::RetryPolicy`], which governs a single graph
//! node's execution inside a compiled graph. [`RetryManager`] wraps an
//! arbitrary async operation identified by an `op_id`, classifies failures
//! with [`crate::error::classify`] to decide whether and how long to wait
//! before the next attempt, and tracks a [`CircuitState`] per `op_id` so a
//! persistently failing operation stops being attempted at all once its
//! circuit opens.

mod retry_manager;

pub use retry_manager::{AttemptRecord, CircuitState, RetryConfig, RetryManager};
