//! Conversion of stored records into GeoJSON features.

use geo_common::{Feature, FeatureCollection, Geometry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::StoredRecord;

/// Feature properties served to map clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseProperties {
    /// Responses of the most recent entry. Absent when the record has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Value>,
    /// Copy of the native geometry. Never reprojected.
    pub geometry: Geometry,
    pub name: Option<Value>,
    pub object_id: Option<Value>,
}

pub type ShapeFeature = Feature<ResponseProperties>;
pub type ShapeCollection = FeatureCollection<ResponseProperties>;

/// Build a feature from a stored record.
///
/// The top-level geometry is the record's own and may be reprojected later;
/// `properties.geometry` is an independent copy that stays native.
pub fn to_feature(record: StoredRecord) -> ShapeFeature {
    let responses = record
        .entries
        .and_then(|mut entries| entries.pop())
        .and_then(|entry| entry.responses);

    let properties = ResponseProperties {
        responses,
        geometry: record.geometry.clone(),
        name: record.properties.name,
        object_id: record.properties.object_id,
    };

    Feature::new(record.geometry, properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(doc: Value) -> StoredRecord {
        StoredRecord::from_document(doc).unwrap()
    }

    #[test]
    fn test_responses_from_last_entry() {
        let feature = to_feature(decode(json!({
            "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
            "properties": { "humanReadableName": "Plot", "object_id": "p-1" },
            "entries": [ { "responses": { "v": "old" } }, { "responses": { "v": "new" } } ]
        })));

        assert_eq!(feature.type_, "Feature");
        assert_eq!(feature.properties.responses, Some(json!({ "v": "new" })));
        assert_eq!(feature.properties.name, Some(json!("Plot")));
        assert_eq!(feature.properties.object_id, Some(json!("p-1")));
        assert_eq!(feature.properties.geometry, feature.geometry);
    }

    #[test]
    fn test_responses_omitted_without_entries() {
        for entries in [json!(null), json!([])] {
            let feature = to_feature(decode(json!({
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                "properties": { "humanReadableName": "Plot", "object_id": 1 },
                "entries": entries
            })));

            assert!(feature.properties.responses.is_none());
            let json = serde_json::to_value(&feature).unwrap();
            assert!(json["properties"].get("responses").is_none());
        }
    }

    #[test]
    fn test_embedded_geometry_is_independent_copy() {
        let mut feature = to_feature(decode(json!({
            "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
            "properties": { "humanReadableName": "Plot", "object_id": 1 }
        })));

        feature
            .geometry
            .try_for_each_position_mut(&mut |p: &mut [f64; 2]| -> Result<(), ()> {
                p[0] += 100.0;
                Ok(())
            })
            .unwrap();

        assert_eq!(feature.properties.geometry, Geometry::point(1.0, 2.0));
        assert_eq!(feature.geometry, Geometry::point(101.0, 2.0));
    }
}
