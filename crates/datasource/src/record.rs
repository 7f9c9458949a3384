//! Stored shape records as returned by the document store.

use geo_common::Geometry;
use serde::Deserialize;
use serde_json::Value;
use storage::Document;

/// A stored record, after the field mask has been applied.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredRecord {
    /// Geometry in the store's native CRS.
    pub geometry: Geometry,
    pub properties: RecordProperties,
    /// Survey entries, oldest first. Only the last one is used.
    #[serde(default)]
    pub entries: Option<Vec<Entry>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordProperties {
    /// Display name, passed through whatever its JSON type.
    #[serde(rename = "humanReadableName", default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub object_id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub responses: Option<Value>,
}

impl StoredRecord {
    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc)
    }
}
