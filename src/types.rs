//! Core types for the mirror.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// The field map of a single remote document: field name to JSON value.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Opaque identity of a store instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(pub u64);

impl StoreId {
    /// Allocate the next store identity (process-wide counter).
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StoreId(NEXT.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({})", self.0)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a live listener registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// The value held by a single state slot.
///
/// A slot mirrors either one document, an ordered result set, or nothing yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
    /// No delivery has been applied to this slot.
    Empty,

    /// Field map of a single mirrored document.
    Document(FieldMap),

    /// Ordered field maps of a mirrored collection or query result set.
    Documents(Vec<FieldMap>),
}

impl SlotValue {
    /// Whether the slot has never received a delivery.
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotValue::Empty)
    }

    /// The single-document field map, if this slot mirrors a document.
    pub fn as_document(&self) -> Option<&FieldMap> {
        match self {
            SlotValue::Document(fields) => Some(fields),
            _ => None,
        }
    }

    /// The ordered field maps, if this slot mirrors a result set.
    pub fn as_documents(&self) -> Option<&[FieldMap]> {
        match self {
            SlotValue::Documents(docs) => Some(docs),
            _ => None,
        }
    }

    /// Deserialize the single-document field map into a typed value.
    pub fn to_document<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            SlotValue::Document(fields) => {
                serde_json::from_value(serde_json::Value::Object(fields.clone()))
                    .map_err(|e| SyncError::Deserialization(e.to_string()))
            }
            other => Err(SyncError::Deserialization(format!(
                "slot holds {}, not a document",
                other.kind_name()
            ))),
        }
    }

    /// Deserialize the result set into typed values, preserving order.
    pub fn to_documents<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        match self {
            SlotValue::Documents(docs) => docs
                .iter()
                .map(|fields| {
                    serde_json::from_value(serde_json::Value::Object(fields.clone()))
                        .map_err(|e| SyncError::Deserialization(e.to_string()))
                })
                .collect(),
            other => Err(SyncError::Deserialization(format!(
                "slot holds {}, not a result set",
                other.kind_name()
            ))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            SlotValue::Empty => "empty",
            SlotValue::Document(_) => "document",
            SlotValue::Documents(_) => "documents",
        }
    }
}

impl Default for SlotValue {
    fn default() -> Self {
        SlotValue::Empty
    }
}

/// Serialize a typed value into a document field map.
///
/// The value must serialize to a JSON object.
pub fn to_field_map<T: Serialize>(value: &T) -> Result<FieldMap> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(SyncError::Serialization(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Deserialize a document field map into a typed value.
pub fn from_field_map<T: DeserializeOwned>(fields: &FieldMap) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(fields.clone()))
        .map_err(|e| SyncError::Deserialization(e.to_string()))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
