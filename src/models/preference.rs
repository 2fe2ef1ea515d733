//! Preference entry types
//!
//! A preference record is a snapshot of one key in one backing store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Backing store a preference was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    SharedPreferences,
    DataStorePreferences,
    DataStoreProto,
}

impl StorageType {
    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::SharedPreferences => "SharedPreferences",
            Self::DataStorePreferences => "DataStore Preferences",
            Self::DataStoreProto => "DataStore Proto",
        }
    }
}

/// Typed preference value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PreferenceValue {
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    StringSet(BTreeSet<String>),
    Bytes(Vec<u8>),
    /// Text rendering of a proto message
    ProtoMessage(String),
}

impl PreferenceValue {
    /// Stable type label used for breakdowns
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Bool(_) => "Boolean",
            Self::Int(_) => "Int",
            Self::Long(_) => "Long",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::StringSet(_) => "StringSet",
            Self::Bytes(_) => "Bytes",
            Self::ProtoMessage(_) => "ProtoMessage",
        }
    }
}

/// A single preference entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub key: String,
    pub value: PreferenceValue,
    pub storage_type: StorageType,
    #[serde(default)]
    pub is_system_preference: bool,
}

impl PreferenceRecord {
    pub fn new(key: impl Into<String>, value: PreferenceValue, storage_type: StorageType) -> Self {
        Self {
            key: key.into(),
            value,
            storage_type,
            is_system_preference: false,
        }
    }

    /// Flag the entry as owned by the platform or a library rather than the app
    pub fn system(mut self) -> Self {
        self.is_system_preference = true;
        self
    }
}
