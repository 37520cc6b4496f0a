//! Tolerant tagged-markup parser for planner output.
//!
//! The LLM streams a root element wrapping `<name>`, `<thought>`, `<task>`,
//! an ordered `<nodes>` list, and optional nested `<subtasks>` (a list of
//! further `<task>` elements, the tree-planner variant's groups → leaves
//! shape). Since the document may be read mid-stream, every extraction falls
//! back to "take the rest of the string" when a closing tag hasn't arrived
//! yet, so a partial render still produces a usable (if incomplete)
//! [`PlanTask`]. Same-named tags may nest (a `<task>` description sits
//! inside the `<task>` wrapper of a subtask entry); matching tracks open/
//! close depth rather than taking the first close found.

use serde::{Deserialize, Serialize};

/// `<subtasks>` stops being expanded past this depth (root = depth 0).
const MAX_SUBTASK_DEPTH: u8 = 2;

/// One ordered step inside a [`PlanTask`]'s `<nodes>` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanNode {
    pub text: String,
}

/// A parsed plan: optional name/thought, the task description, its ordered
/// node list, and nested subtasks (tree-planner variant, depth-clamped).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanTask {
    pub name: Option<String>,
    pub thought: Option<String>,
    pub task: String,
    pub nodes: Vec<PlanNode>,
    pub subtasks: Vec<PlanTask>,
}

/// Finds the end of the tag opened at `start` (just past its `<tag>`),
/// tracking nesting depth so an inner tag of the same name doesn't fool the
/// match. Returns `None` if the document ends before the matching close.
fn find_matching_close(text: &str, open: &str, close: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = start;
    loop {
        let next_open = text[pos..].find(open).map(|r| pos + r);
        let next_close = text[pos..].find(close).map(|r| pos + r);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                pos = o + open.len();
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return Some(c);
                }
                pos = c + close.len();
            }
            _ => return None,
        }
    }
}

/// Finds the first `<tag>...</tag>` body (depth-aware). If the opening tag
/// is present but the closing tag hasn't streamed in yet, returns everything
/// after the open tag instead of `None` (last-closing-fixup).
fn extract_tag_body<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = text.find(&open)? + open.len();
    match find_matching_close(text, &open, &close, start) {
        Some(end) => Some(&text[start..end]),
        None => Some(text[start..].trim_end()),
    }
}

/// Finds every top-level `<tag>...</tag>` body within `text`, in document
/// order, each matched depth-aware. An unclosed final tag contributes the
/// remainder of `text` and ends the scan.
fn extract_all_tag_bodies<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut cursor = 0usize;
    loop {
        let Some(rel) = text[cursor..].find(&open) else {
            break;
        };
        let start = cursor + rel + open.len();
        match find_matching_close(text, &open, &close, start) {
            Some(end) => {
                out.push(&text[start..end]);
                cursor = end + close.len();
            }
            None => {
                out.push(text[start..].trim_end());
                break;
            }
        }
    }
    out
}

/// Parses a raw planning-markup document into a [`PlanTask`].
///
/// `<subtasks>` nesting is clamped to [`MAX_SUBTASK_DEPTH`]; `<task>`
/// elements past that depth are dropped rather than expanded.
pub fn parse_plan_markup(raw: &str) -> PlanTask {
    parse_at_depth(raw, 0)
}

fn parse_at_depth(raw: &str, depth: u8) -> PlanTask {
    let name = extract_tag_body(raw, "name").map(|s| s.trim().to_string());
    let thought = extract_tag_body(raw, "thought").map(|s| s.trim().to_string());
    let task = extract_tag_body(raw, "task")
        .unwrap_or(raw)
        .trim()
        .to_string();

    let nodes_body = extract_tag_body(raw, "nodes").unwrap_or("");
    let nodes = extract_all_tag_bodies(nodes_body, "node")
        .into_iter()
        .map(|s| PlanNode {
            text: s.trim().to_string(),
        })
        .collect();

    let subtasks = if depth < MAX_SUBTASK_DEPTH {
        let subtasks_body = extract_tag_body(raw, "subtasks").unwrap_or("");
        extract_all_tag_bodies(subtasks_body, "task")
            .into_iter()
            .map(|s| parse_at_depth(s, depth + 1))
            .collect()
    } else {
        Vec::new()
    };

    PlanTask {
        name,
        thought,
        task,
        nodes,
        subtasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_thought_task_and_nodes() {
        let doc = "<root><name>Report</name><thought>need two steps</thought>\
                   <task>write a report</task><nodes><node>gather data</node>\
                   <node>write it up</node></nodes></root>";
        let plan = parse_plan_markup(doc);
        assert_eq!(plan.name.as_deref(), Some("Report"));
        assert_eq!(plan.thought.as_deref(), Some("need two steps"));
        assert_eq!(plan.task, "write a report");
        assert_eq!(plan.nodes.len(), 2);
        assert_eq!(plan.nodes[0].text, "gather data");
        assert_eq!(plan.nodes[1].text, "write it up");
    }

    #[test]
    fn missing_closing_tag_takes_rest_of_stream() {
        let doc = "<root><task>still streaming the description";
        let plan = parse_plan_markup(doc);
        assert_eq!(plan.task, "still streaming the description");
        assert!(plan.nodes.is_empty());
    }

    #[test]
    fn missing_nodes_block_yields_empty_list() {
        let doc = "<root><task>simple one-shot task</task></root>";
        let plan = parse_plan_markup(doc);
        assert_eq!(plan.task, "simple one-shot task");
        assert!(plan.nodes.is_empty());
    }

    #[test]
    fn parses_nested_subtasks_for_tree_planner_variant() {
        let doc = "<root><task>build the feature</task><subtasks>\
                   <task><name>backend</name><task>write the API</task></task>\
                   <task><name>frontend</name><task>wire up the UI</task></task>\
                   </subtasks></root>";
        let plan = parse_plan_markup(doc);
        assert_eq!(plan.task, "build the feature");
        assert_eq!(plan.subtasks.len(), 2);
        assert_eq!(plan.subtasks[0].name.as_deref(), Some("backend"));
        assert_eq!(plan.subtasks[0].task, "write the API");
        assert_eq!(plan.subtasks[1].name.as_deref(), Some("frontend"));
        assert_eq!(plan.subtasks[1].task, "wire up the UI");
    }

    #[test]
    fn subtask_nesting_is_clamped_to_max_depth() {
        // root -> subtasks[0] -> subtasks[0] -> subtasks[0]: three levels, depth 0/1/2.
        let level2 = "<task><task>level2</task></task>";
        let level1 = format!("<task><task>level1</task><subtasks>{level2}</subtasks></task>");
        let doc = format!("<root><task>level0</task><subtasks>{level1}</subtasks></root>");
        let plan = parse_plan_markup(&doc);
        assert_eq!(plan.task, "level0");
        assert_eq!(plan.subtasks.len(), 1);
        assert_eq!(plan.subtasks[0].task, "level1");
        assert_eq!(plan.subtasks[0].subtasks.len(), 1);
        assert_eq!(plan.subtasks[0].subtasks[0].task, "level2");
        // depth 2 reached; its own subtasks must not be expanded further.
        assert!(plan.subtasks[0].subtasks[0].subtasks.is_empty());
    }

    #[test]
    fn no_subtasks_block_yields_empty_subtasks() {
        let doc = "<root><task>solo task</task></root>";
        let plan = parse_plan_markup(doc);
        assert!(plan.subtasks.is_empty());
    }
}
