//! Serializer for checkpoint state (state <-> bytes).
//!
//! Serializer protocol. Used by persistent Checkpointer implementations.
//!
//! ## Protocol Overview
//!
//! This module provides two serialization protocols:
//!
//! 1. **Serializer<S>** - Simple serialize/deserialize for typed state
//! 2. **TypedSerializer** - Typed serialization with type tag
//!
//! The typed serialization uses a `(type, bytes)` tuple where `type` indicates the encoding:
//! - `"null"` - None/empty value
//! - `"bytes"` - Raw bytes (no transformation)
//! - `"json"` - JSON-encoded data

use crate::memory::checkpointer::CheckpointError;

/// Type tag for null/empty values.
pub const TYPE_NULL: &str = "null";
/// Type tag for raw bytes.
pub const TYPE_BYTES: &str = "bytes";
/// Type tag for JSON-encoded data.
pub const TYPE_JSON: &str = "json";

/// Typed serialization data - tuple of (type_tag, bytes).
#[derive(Debug, Clone)]
pub struct TypedData {
    /// Type tag indicating the encoding (null, bytes, json).
    pub type_tag: String,
    /// Serialized bytes (empty for null type).
    pub data: Vec<u8>,
}

impl TypedData {
    /// Creates a null typed data (empty).
    pub fn null() -> Self {
        Self {
            type_tag: TYPE_NULL.to_string(),
            data: Vec::new(),
        }
    }

    /// Creates a bytes typed data (raw bytes, no encoding).
    pub fn bytes(data: Vec<u8>) -> Self {
        Self {
            type_tag: TYPE_BYTES.to_string(),
            data,
        }
    }

    /// Creates a JSON typed data.
    pub fn json(data: Vec<u8>) -> Self {
        Self {
            type_tag: TYPE_JSON.to_string(),
            data,
        }
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        self.type_tag == TYPE_NULL
    }
}

/// Serializes and deserializes state for checkpoint storage.
///
/// Used by persistent Checkpointer implementations (e.g. SqliteSaver). MemorySaver
/// stores `Checkpoint<S>` in memory and does not use a Serializer.
pub trait Serializer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Serialize state to bytes.
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError>;

    /// Deserialize state from bytes.
    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

/// Typed serialization protocol.
///
/// Provides type-tagged serialization where the type tag indicates the encoding.
pub trait TypedSerializer: Send + Sync {
    /// Serialize any value to typed data (type_tag, bytes).
    fn dumps_typed(&self, value: &serde_json::Value) -> Result<TypedData, CheckpointError>;

    /// Deserialize typed data (type_tag, bytes) back to a value.
    fn loads_typed(&self, data: &TypedData) -> Result<serde_json::Value, CheckpointError>;
}

/// JSON-based serializer. Requires S: Serialize + serde::de::DeserializeOwned.
///
/// Use for persistent checkpoint storage when state is JSON-serializable.
pub struct JsonSerializer;

impl<S> Serializer<S> for JsonSerializer
where
    S: Clone + Send + Sync + 'static + serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(state).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}

impl TypedSerializer for JsonSerializer {
    fn dumps_typed(&self, value: &serde_json::Value) -> Result<TypedData, CheckpointError> {
        if value.is_null() {
            return Ok(TypedData::null());
        }
        let bytes =
            serde_json::to_vec(value).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        Ok(TypedData::json(bytes))
    }

    fn loads_typed(&self, data: &TypedData) -> Result<serde_json::Value, CheckpointError> {
        match data.type_tag.as_str() {
            TYPE_NULL => Ok(serde_json::Value::Null),
            TYPE_BYTES => Ok(serde_json::Value::String(
                String::from_utf8_lossy(&data.data).to_string(),
            )),
            TYPE_JSON => serde_json::from_slice(&data.data)
                .map_err(|e| CheckpointError::Serialization(e.to_string())),
            other => Err(CheckpointError::Serialization(format!(
                "Unknown serialization type: {}",
                other
            ))),
        }
    }
}
