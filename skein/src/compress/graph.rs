//! Build the compression subgraph (prune → compact → END) and a node wrapper to use it in a parent graph.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{
    CompilationError, CompiledStateGraph, Next, Node, RunContext, StateGraph, END, START,
};
use crate::llm::LlmClient;
use crate::state::ReActState;

use super::compact_node::CompactNode;
use super::config::CompactionConfig;
use super::prune_node::PruneNode;

/// Builds the compression subgraph: prune → compact → END.
pub fn build_graph(
    config: CompactionConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<CompiledStateGraph<ReActState>, CompilationError> {
    let prune_node = Arc::new(PruneNode {
        config: config.clone(),
    });
    let compact_node = Arc::new(CompactNode { config, llm });
    let mut graph = StateGraph::<ReActState>::new();
    graph
        .add_node("prune", prune_node)
        .add_node("compact", compact_node)
        .add_edge(START, "prune")
        .add_edge("prune", "compact")
        .add_edge("compact", END);
    graph.compile()
}

/// Wraps a compiled compression graph so it can be used as a node (observe → compress → think).
pub struct CompressionGraphNode {
    inner: CompiledStateGraph<ReActState>,
}

impl CompressionGraphNode {
    pub fn new(inner: CompiledStateGraph<ReActState>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Node<ReActState> for CompressionGraphNode {
    fn id(&self) -> &str {
        "compress"
    }

    async fn run(&self, state: ReActState) -> Result<(ReActState, Next), AgentError> {
        let new_state = self.inner.invoke(state, None).await?;
        Ok((new_state, Next::Continue))
    }

    async fn run_with_context(
        &self,
        state: ReActState,
        ctx: &RunContext<ReActState>,
    ) -> Result<(ReActState, Next), AgentError> {
        let config = Some(ctx.config.clone());
        let new_state = self.inner.invoke(state, config).await?;
        Ok((new_state, Next::Continue))
    }
}
