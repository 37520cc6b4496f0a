//! Planner (C9): a single LLM call producing a tagged-markup plan.
//!
//! [`plan`] drives the single-task variant; [`plan_tree`] drives the
//! two-level groups→leaves variant; [`replan`] re-runs planning with the
//! prior plan request/result folded into history, per the replan contract.

mod markup;
mod prompt;

pub use markup::{parse_plan_markup, PlanNode, PlanTask};
pub use prompt::{PLANNER_SYSTEM, TREE_PLANNER_SYSTEM};

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;

/// Runs the single-task planner once against `prompt`.
pub async fn plan(llm: &dyn LlmClient, prompt: &str) -> Result<PlanTask, AgentError> {
    let messages = vec![Message::system(PLANNER_SYSTEM), Message::user(prompt)];
    let response = llm.invoke(&messages).await?;
    Ok(parse_plan_markup(&response.content))
}

/// Runs the tree planner once against `prompt`, producing a root task plus
/// leaf subtasks (depth clamped to 2 by the parser regardless of what the
/// model emits).
pub async fn plan_tree(llm: &dyn LlmClient, prompt: &str) -> Result<PlanTask, AgentError> {
    let messages = vec![Message::system(TREE_PLANNER_SYSTEM), Message::user(prompt)];
    let response = llm.invoke(&messages).await?;
    Ok(parse_plan_markup(&response.content))
}

/// Re-plans: folds the prior plan request and its rendered result into
/// history before the new user prompt, then re-runs the single-task planner.
pub async fn replan(
    llm: &dyn LlmClient,
    prior_request: &str,
    prior_result: &str,
    new_prompt: &str,
) -> Result<PlanTask, AgentError> {
    let messages = vec![
        Message::system(PLANNER_SYSTEM),
        Message::user(prior_request),
        Message::assistant(prior_result),
        Message::user(new_prompt),
    ];
    let response = llm.invoke(&messages).await?;
    Ok(parse_plan_markup(&response.content))
}
