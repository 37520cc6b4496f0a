//! Topic channel for message list accumulation.
//!
//! A configurable PubSub Topic that accumulates values into a list.
//!
//! # Features
//!
//! - Accumulates values into a vector
//! - Optional accumulation across steps (if `accumulate` is false, clears on each step)
//! - Supports both single values and lists as updates
//!
//! # Example
//!
//! ```rust
//! use skein::channels::{Topic, TopicSingleWrite, Channel};
//!
//! let mut topic: Topic<String> = Topic::new(true);
//!
//! topic.write_single("message1".to_string());
//! topic.write_single("message2".to_string());
//!
//! assert_eq!(topic.read(), Some(vec!["message1".to_string(), "message2".to_string()]));
//! ```

use super::{Channel, ChannelError};
use std::fmt::Debug;

/// A configurable PubSub Topic channel that accumulates values into a list.
///
/// # Behavior
///
/// - When `accumulate` is `true`: Values persist across update cycles
/// - When `accumulate` is `false`: Values are cleared at the start of each update cycle
///
/// # Interaction
///
/// - Used by `StateGraph` for message list fields (e.g., chat history)
/// - Works with `CompiledStateGraph::run_loop` for state updates
#[derive(Debug, Clone)]
pub struct Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// The accumulated values in the topic.
    values: Vec<T>,
    /// Whether to accumulate values across steps.
    accumulate: bool,
}

impl<T> Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// Creates a new Topic channel.
    pub fn new(accumulate: bool) -> Self {
        Self {
            values: Vec::new(),
            accumulate,
        }
    }

    /// Creates a new accumulating Topic channel. Equivalent to `Topic::new(true)`.
    pub fn accumulating() -> Self {
        Self::new(true)
    }

    /// Creates a new non-accumulating Topic channel. Equivalent to `Topic::new(false)`.
    pub fn ephemeral() -> Self {
        Self::new(false)
    }

    /// Returns whether this topic accumulates values across steps.
    pub fn is_accumulating(&self) -> bool {
        self.accumulate
    }

    /// Returns the number of values in the topic.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the topic is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clears all values from the topic.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Extends the topic with values from an iterator.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.values.extend(iter);
    }

    /// Creates a checkpoint of the current values.
    pub fn checkpoint(&self) -> Vec<T> {
        self.values.clone()
    }

    /// Restores the topic from a checkpoint.
    pub fn from_checkpoint(checkpoint: Vec<T>, accumulate: bool) -> Self {
        Self {
            values: checkpoint,
            accumulate,
        }
    }
}

impl<T> Default for Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// Creates a new accumulating Topic channel by default.
    fn default() -> Self {
        Self::accumulating()
    }
}

impl<T> Channel<Vec<T>> for Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// Reads all accumulated values from the topic.
    ///
    /// Returns `None` if the topic is empty.
    fn read(&self) -> Option<Vec<T>> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.clone())
        }
    }

    /// Writes a batch of values (as a vec) to the topic.
    fn write(&mut self, value: Vec<T>) {
        self.values.extend(value);
    }

    /// Updates the topic with multiple value batches.
    ///
    /// If `accumulate` is `false`, clears existing values before adding new ones.
    fn update(&mut self, updates: Vec<Vec<T>>) -> Result<(), ChannelError> {
        if !self.accumulate {
            self.values.clear();
        }

        for batch in updates {
            self.values.extend(batch);
        }

        Ok(())
    }

    fn channel_type(&self) -> &'static str {
        "Topic"
    }
}

/// Extension trait for writing single values to a Topic.
pub trait TopicSingleWrite<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// Writes a single value to the topic.
    fn write_single(&mut self, value: T);
}

impl<T> TopicSingleWrite<T> for Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn write_single(&mut self, value: T) {
        self.values.push(value);
    }
}
