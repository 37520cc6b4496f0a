//! Run context passed into nodes for streaming-aware execution.
//!
//! Holds runnable config, optional stream sender, selected stream modes, and runtime context.
//! This module integrates the Runtime functionality for a unified execution context.
//!
//! # StreamWriter Integration
//!
//! `RunContext` provides methods to create a `StreamWriter` and emit events directly:
//!
//! ```rust,ignore
//! use skein::graph::RunContext;
//!
//! async fn run_with_context(&self, state: S, ctx: &RunContext<S>) -> Result<(S, Next), AgentError> {
//!     let writer = ctx.stream_writer();
//!     writer.emit_custom(serde_json::json!({"progress": 50})).await;
//!     ctx.emit_custom(serde_json::json!({"status": "done"})).await;
//!     Ok((state, Next::Continue))
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::managed::ManagedValue;
use crate::memory::{RunnableConfig, Store};
use crate::stream::{StreamEvent, StreamMode, StreamWriter};

/// Run context passed into nodes for streaming-aware execution.
///
/// Holds runnable config, optional stream sender, selected stream modes, managed values,
/// and runtime context (store, previous state, custom context).
///
/// # Example
///
/// ```rust,no_run
/// use skein::graph::RunContext;
/// use skein::memory::{RunnableConfig, InMemoryStore};
/// use std::sync::Arc;
///
/// let config = RunnableConfig::default();
/// let mut ctx = RunContext::<String>::new(config);
///
/// let store = Arc::new(InMemoryStore::new());
/// ctx = ctx.with_store(store);
/// ctx = ctx.with_runtime_context(serde_json::json!({"user_id": "123"}));
/// ```
#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Config for the current run (thread_id, checkpoint, user_id, etc.).
    pub config: RunnableConfig,
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    /// Enabled stream modes (Values, Updates, Messages, Custom).
    pub stream_mode: HashSet<StreamMode>,
    /// Managed values accessible during node execution.
    pub managed_values: HashMap<String, Arc<dyn ManagedValue<serde_json::Value, S>>>,

    /// Store for the graph run, enabling persistence and long-term memory.
    pub store: Option<Arc<dyn Store>>,

    /// The previous return value for the given thread.
    ///
    /// Only available when a checkpointer is provided and there is a previous state.
    pub previous: Option<S>,

    /// Custom runtime context (user_id, db_conn, etc.).
    pub runtime_context: Option<serde_json::Value>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates a new RunContext with default values.
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
            managed_values: HashMap::new(),
            store: None,
            previous: None,
            runtime_context: None,
        }
    }

    /// Gets a managed value by name.
    pub fn get_managed_value(&self, name: &str) -> Option<serde_json::Value> {
        self.managed_values.get(name).map(|mv| mv.get(self))
    }

    /// Registers a managed value.
    pub fn with_managed_value(
        mut self,
        name: impl Into<String>,
        value: Arc<dyn ManagedValue<serde_json::Value, S>>,
    ) -> Self {
        self.managed_values.insert(name.into(), value);
        self
    }

    /// Sets the store for long-term memory.
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the previous state value, typically when resuming from a checkpoint.
    pub fn with_previous(mut self, previous: S) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Sets the custom runtime context.
    pub fn with_runtime_context(mut self, context: serde_json::Value) -> Self {
        self.runtime_context = Some(context);
        self
    }

    /// Gets the store if available.
    pub fn store(&self) -> Option<&Arc<dyn Store>> {
        self.store.as_ref()
    }

    /// Gets the previous state if available.
    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    /// Gets the runtime context if available.
    pub fn runtime_context(&self) -> Option<&serde_json::Value> {
        self.runtime_context.as_ref()
    }

    /// Creates a StreamWriter from this context.
    pub fn stream_writer(&self) -> StreamWriter<S> {
        StreamWriter::new(self.stream_tx.clone(), self.stream_mode.clone())
    }

    /// Emits a custom JSON payload directly from the context.
    pub async fn emit_custom(&self, value: Value) -> bool {
        self.stream_writer().emit_custom(value).await
    }

    /// Emits a message chunk directly from the context.
    pub async fn emit_message(
        &self,
        content: impl Into<String>,
        node_id: impl Into<String>,
    ) -> bool {
        self.stream_writer().emit_message(content, node_id).await
    }

    /// Checks if a specific stream mode is enabled.
    pub fn is_streaming_mode(&self, mode: StreamMode) -> bool {
        self.stream_mode.contains(&mode)
    }
}
