//! Checkpoint and metadata types.
//!
//! Checkpoint (id, ts, channel_values, channel_versions, metadata).

use super::config::RunnableConfig;
use super::uuid6::uuid6;
use serde_json::Value;
use std::collections::HashMap;
use std::time::SystemTime;

/// Current version of checkpoint format.
pub const CHECKPOINT_VERSION: u32 = 2;

/// Special write type for errors.
pub const ERROR: &str = "__error__";
/// Special write type for scheduled tasks.
pub const SCHEDULED: &str = "__scheduled__";
/// Special write type for interrupts.
pub const INTERRUPT: &str = "__interrupt__";
/// Special write type for resume operations.
pub const RESUME: &str = "__resume__";

/// Mapping from special write types to negative indices.
/// Used by Checkpointer implementations in put_writes.
pub fn writes_idx_map(write_type: &str) -> Option<i32> {
    match write_type {
        ERROR => Some(-1),
        SCHEDULED => Some(-2),
        INTERRUPT => Some(-3),
        RESUME => Some(-4),
        _ => None,
    }
}

/// A pending write to be stored with a checkpoint.
///
/// Tuple of (task_id, channel, value).
pub type PendingWrite = (String, String, Value);

/// Channel versions map (channel name -> version).
///
/// Versions can be string, integer, or float but we use String for simplicity.
pub type ChannelVersions = HashMap<String, String>;

/// Metadata for a single checkpoint (source, step, created_at, parents).
///
/// Checkpoint metadata. Used by Checkpointer implementations
/// and by list() for time-travel UI.
#[derive(Debug, Clone, Default)]
pub struct CheckpointMetadata {
    /// The source of the checkpoint (input, loop, update, fork).
    pub source: CheckpointSource,
    /// The step number of the checkpoint (-1 for input, 0 for first loop, etc.).
    pub step: i64,
    /// Timestamp when this checkpoint was created.
    pub created_at: Option<std::time::SystemTime>,
    /// Parent checkpoint IDs (checkpoint_ns -> checkpoint_id).
    pub parents: HashMap<String, String>,
}

/// Source of the checkpoint (input, loop, update, fork).
///
/// Checkpoint metadata.source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckpointSource {
    /// Created from an input to invoke/stream/batch.
    #[default]
    Input,
    /// Created from inside the pregel loop.
    Loop,
    /// Created from a manual state update.
    Update,
    /// Created as a copy of another checkpoint.
    Fork,
}

/// One checkpoint: state snapshot + channel versions + id/ts.
///
/// Stored by Checkpointer keyed by (thread_id, checkpoint_ns, checkpoint_id).
/// channel_values is the graph state S; channel_versions used for reducer/merge.
///
/// **Interaction**: Produced by graph execution; consumed by Checkpointer::put,
/// returned by get_tuple.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    /// The version of the checkpoint format. Currently `2`.
    pub v: u32,
    /// The ID of the checkpoint. Unique and monotonically increasing.
    pub id: String,
    /// The timestamp of the checkpoint in ISO 8601 format (milliseconds since epoch).
    pub ts: String,
    /// The values of the channels at the time of the checkpoint (graph state).
    pub channel_values: S,
    /// The versions of the channels at the time of the checkpoint.
    pub channel_versions: ChannelVersions,
    /// Map from node ID to map from channel name to version seen.
    /// Used to determine which nodes to execute next.
    pub versions_seen: HashMap<String, ChannelVersions>,
    /// The channels that were updated in this checkpoint.
    pub updated_channels: Option<Vec<String>>,
    /// Pending sends for message passing.
    pub pending_sends: Vec<PendingWrite>,
    /// Metadata for the checkpoint.
    pub metadata: CheckpointMetadata,
}

/// Item returned by Checkpointer::list for history / time-travel.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

/// A tuple containing a checkpoint and its associated data.
///
/// Returned by Checkpointer::get_tuple.
#[derive(Debug, Clone)]
pub struct CheckpointTuple<S> {
    /// Configuration for the checkpoint.
    pub config: RunnableConfig,
    /// The checkpoint snapshot.
    pub checkpoint: Checkpoint<S>,
    /// Metadata for the checkpoint.
    pub metadata: CheckpointMetadata,
    /// Parent configuration (if any).
    pub parent_config: Option<RunnableConfig>,
    /// Pending writes (if any).
    pub pending_writes: Option<Vec<PendingWrite>>,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint from current state for saving after invoke.
    ///
    /// Uses UUID6 for the checkpoint ID, ensuring time-ordered and unique identifiers.
    ///
    /// # Arguments
    ///
    /// - `state`: The state to checkpoint
    /// - `source`: The source of the checkpoint (Input, Loop, Update, Fork)
    /// - `step`: The step number (-1 for input, 0+ for loop steps)
    pub fn from_state(state: S, source: CheckpointSource, step: i64) -> Self {
        let now = SystemTime::now();
        let id = uuid6().to_string();
        let ts = format!(
            "{}",
            now.duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0)
        );
        Self {
            v: CHECKPOINT_VERSION,
            id,
            ts,
            channel_values: state,
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
            updated_channels: None,
            pending_sends: Vec::new(),
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(now),
                parents: HashMap::new(),
            },
        }
    }

    /// Creates a checkpoint with a specific ID.
    ///
    /// Useful for restoring checkpoints or creating checkpoints with known IDs.
    pub fn with_id(id: String, state: S, source: CheckpointSource, step: i64) -> Self {
        let now = SystemTime::now();
        let ts = format!(
            "{}",
            now.duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0)
        );
        Self {
            v: CHECKPOINT_VERSION,
            id,
            ts,
            channel_values: state,
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
            updated_channels: None,
            pending_sends: Vec::new(),
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(now),
                parents: HashMap::new(),
            },
        }
    }
}

impl<S: Clone> Checkpoint<S> {
    /// Creates a deep copy of the checkpoint.
    ///
    /// Used for forking checkpoints or creating mutable copies.
    pub fn copy(&self) -> Self {
        Self {
            v: self.v,
            id: self.id.clone(),
            ts: self.ts.clone(),
            channel_values: self.channel_values.clone(),
            channel_versions: self.channel_versions.clone(),
            versions_seen: self
                .versions_seen
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            updated_channels: self.updated_channels.clone(),
            pending_sends: self.pending_sends.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<S: Default> Default for Checkpoint<S> {
    /// Creates an empty checkpoint with default values.
    fn default() -> Self {
        let now = SystemTime::now();
        let id = uuid6().to_string();
        let ts = format!(
            "{}",
            now.duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0)
        );
        Self {
            v: CHECKPOINT_VERSION,
            id,
            ts,
            channel_values: S::default(),
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
            updated_channels: None,
            pending_sends: Vec::new(),
            metadata: CheckpointMetadata::default(),
        }
    }
}
