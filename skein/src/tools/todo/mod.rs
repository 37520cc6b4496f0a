//! Todo tools: todo_write, todo_read.
//!
//! Persist todo list as JSON under XDG state home (e.g. `~/.local/state/skein/todos.json` on Linux).
//! Uses the `cross-xdg` crate for cross-platform paths.

mod todo_read;
mod todo_write;

pub use todo_read::{TodoReadTool, TOOL_TODO_READ};
pub use todo_write::{TodoWriteTool, TOOL_TODO_WRITE};

/// Application name used under XDG state_home (e.g. state_home/skein/todos.json).
const XDG_APP_NAME: &str = "skein";
/// Filename for the todo list JSON under the app directory.
const TODOS_FILENAME: &str = "todos.json";

/// Returns the path to the todo list file using XDG state home.
///
/// Resolves to e.g. `$XDG_STATE_HOME/skein/todos.json` (Linux: `~/.local/state/skein/todos.json`).
/// Fails with [`ToolSourceError::InvalidInput`] if XDG base dirs cannot be determined (e.g. no home).
pub fn todo_file_path() -> Result<std::path::PathBuf, crate::tool_source::ToolSourceError> {
    let base = cross_xdg::BaseDirs::new().map_err(|e| {
        crate::tool_source::ToolSourceError::InvalidInput(format!(
            "XDG base dirs unavailable: {}",
            e
        ))
    })?;
    Ok(base.state_home().join(XDG_APP_NAME).join(TODOS_FILENAME))
}

/// Single todo item.
///
/// Used for JSON (de)serialization to/from the XDG todo file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TodoInfo {
    pub id: String,
    pub content: String,
    pub status: String,
    pub priority: String,
}

#[cfg(test)]
pub(crate) static XDG_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
