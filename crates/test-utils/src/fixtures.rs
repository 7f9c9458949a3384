//! Common test fixtures for shape-tiles tests.
//!
//! Records follow the stored document layout: a GeoJSON `geometry`, a
//! `properties` bag with `humanReadableName` and `object_id`, and survey
//! `entries` carrying `responses`.

use serde_json::{json, Value};

/// Common bounding box definitions for testing.
pub mod bbox {
    /// Box used by the end-to-end scenarios.
    pub const UNIT_TEN: (f64, f64, f64, f64) = (0.0, 0.0, 10.0, 10.0);

    /// Global geographic box
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Small box around Detroit
    pub const DETROIT: (f64, f64, f64, f64) = (-83.1, 42.3, -83.0, 42.4);
}

/// A point record with two survey entries.
pub fn point_record(object_id: &str, x: f64, y: f64) -> Value {
    json!({
        "geometry": { "type": "Point", "coordinates": [x, y] },
        "indexedGeometry": { "type": "Point", "coordinates": [x, y] },
        "properties": {
            "humanReadableName": format!("{} Main St", object_id),
            "object_id": object_id,
            "centroid": { "type": "Point", "coordinates": [x, y] },
            "survey": "survey-1"
        },
        "entries": [
            {
                "responses": { "use": "vacant", "revision": 1 },
                "created": "2024-01-01T00:00:00Z",
                "files": ["first.jpg"],
                "source": { "type": "mobile", "started": 1, "finished": 2 }
            },
            {
                "responses": { "use": "residential", "revision": 2 },
                "created": "2024-02-01T00:00:00Z",
                "files": [],
                "source": { "type": "mobile", "started": 3, "finished": 4 }
            }
        ]
    })
}

/// A square parcel record with lower-left corner at `(x, y)`.
pub fn parcel_record(object_id: &str, x: f64, y: f64, size: f64) -> Value {
    let ring = json!([
        [x, y],
        [x + size, y],
        [x + size, y + size],
        [x, y + size],
        [x, y]
    ]);
    json!({
        "geometry": { "type": "Polygon", "coordinates": [ring.clone()] },
        "indexedGeometry": { "type": "Polygon", "coordinates": [ring] },
        "properties": {
            "humanReadableName": format!("Parcel {}", object_id),
            "object_id": object_id
        },
        "entries": [ { "responses": { "condition": "good" } } ]
    })
}

/// A record that was never surveyed.
pub fn unsurveyed_record(object_id: &str, x: f64, y: f64) -> Value {
    json!({
        "geometry": { "type": "Point", "coordinates": [x, y] },
        "properties": {
            "humanReadableName": format!("{} Oak Ave", object_id),
            "object_id": object_id
        }
    })
}

/// Three point records inside [`bbox::UNIT_TEN`].
pub fn three_records() -> Vec<Value> {
    vec![
        point_record("a", 1.0, 1.0),
        point_record("b", 5.0, 5.0),
        point_record("c", 9.0, 9.0),
    ]
}
