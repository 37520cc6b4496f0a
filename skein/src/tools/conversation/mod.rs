mod get_recent_messages;

pub use get_recent_messages::{GetRecentMessagesTool, TOOL_GET_RECENT_MESSAGES};
