//! Filter, field-mask and paging model for document queries.
//!
//! Filters use a small MongoDB-flavoured vocabulary over dotted paths:
//! plain values match by equality, and operator objects support `$in`,
//! `$exists` and `$within: { $box: [[minX, minY], [maxX, maxY]] }`.

use std::collections::BTreeMap;
use std::sync::Arc;

use geo_common::{BoundingBox, Geometry, Position};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{StoreError, StoreResult};

/// A raw stored document.
pub type Document = Value;

/// Immutable query filter keyed by dotted field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Start a filter from a copy of a configured base filter.
    pub fn from_base(base: &Map<String, Value>) -> Self {
        Self(base.clone())
    }

    /// Constrain `key` to geometries lying within `bbox`.
    ///
    /// Replaces any existing constraint on the same key.
    pub fn within_box(mut self, key: &str, bbox: &BoundingBox) -> Self {
        self.0.insert(
            key.to_string(),
            json!({ "$within": { "$box": bbox.as_box_pair() } }),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the filter into typed constraints.
    pub fn constraints(&self) -> StoreResult<Vec<Constraint>> {
        let mut constraints = Vec::with_capacity(self.0.len());
        for (field, value) in &self.0 {
            match value {
                Value::Object(ops) if is_operator_object(ops) => {
                    for (operator, argument) in ops {
                        constraints.push(Constraint {
                            field: field.clone(),
                            op: Operator::parse(field, operator, argument)?,
                        });
                    }
                }
                other => constraints.push(Constraint {
                    field: field.clone(),
                    op: Operator::Eq(other.clone()),
                }),
            }
        }
        constraints.sort_by(|a, b| a.field.cmp(&b.field));
        Ok(constraints)
    }
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

/// One constraint on one field path.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub field: String,
    pub op: Operator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Value),
    In(Vec<Value>),
    Exists(bool),
    WithinBox(BoundingBox),
}

impl Operator {
    fn parse(field: &str, operator: &str, argument: &Value) -> StoreResult<Self> {
        let invalid = |message: &str| StoreError::InvalidFilter {
            field: field.to_string(),
            message: format!("{}: {}", operator, message),
        };

        match operator {
            "$eq" => Ok(Operator::Eq(argument.clone())),
            "$in" => match argument {
                Value::Array(values) => Ok(Operator::In(values.clone())),
                _ => Err(invalid("expected an array")),
            },
            "$exists" => match argument {
                Value::Bool(flag) => Ok(Operator::Exists(*flag)),
                Value::Number(n) => Ok(Operator::Exists(n.as_f64() != Some(0.0))),
                _ => Err(invalid("expected a boolean")),
            },
            "$within" => {
                let corners = argument
                    .get("$box")
                    .ok_or_else(|| invalid("only $box is supported"))?;
                let [sw, ne]: [Position; 2] = serde_json::from_value(corners.clone())
                    .map_err(|_| invalid("$box must be [[minX, minY], [maxX, maxY]]"))?;
                Ok(Operator::WithinBox(BoundingBox::from_corners(sw, ne)))
            }
            _ => Err(StoreError::UnsupportedOperator {
                field: field.to_string(),
                operator: operator.to_string(),
            }),
        }
    }
}

impl Constraint {
    /// Evaluate against a document. Paths traverse arrays element-wise.
    pub fn matches(&self, doc: &Document) -> bool {
        let segments: Vec<&str> = self.field.split('.').collect();
        let mut found = Vec::new();
        collect_path(doc, &segments, &mut found);

        match &self.op {
            Operator::Eq(expected) => found.iter().any(|v| value_matches(v, expected)),
            Operator::In(candidates) => found
                .iter()
                .any(|v| candidates.iter().any(|c| value_matches(v, c))),
            Operator::Exists(flag) => found.is_empty() != *flag,
            Operator::WithinBox(bbox) => found.iter().any(|v| geometry_within(v, bbox)),
        }
    }
}

fn value_matches(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) if !expected.is_array() => items.contains(expected),
        _ => actual == expected,
    }
}

fn geometry_within(value: &Value, bbox: &BoundingBox) -> bool {
    match serde_json::from_value::<Geometry>(value.clone()) {
        Ok(geometry) => geometry.all_positions(&|p: &Position| bbox.contains_point(p[0], p[1])),
        Err(_) => false,
    }
}

fn collect_path<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(child) = map.get(*head) {
                collect_path(child, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_path(item, segments, out);
            }
        }
        _ => {}
    }
}

/// How a field appears in query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProjection {
    Exclude,
    Include,
    /// Keep the first `n` array elements, or the last `-n` when negative.
    Slice(i64),
}

/// Field-selection mask applied to every returned document.
///
/// When any path is included, documents are first reduced to the included
/// paths; slices and then exclusions apply afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMask {
    fields: BTreeMap<String, FieldProjection>,
}

impl FieldMask {
    /// A mask that keeps every field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask used for shape records: only the latest entry, without the heavy
    /// history and survey metadata.
    pub fn record_defaults() -> Self {
        Self::new()
            .with("entries", FieldProjection::Slice(-1))
            .with("properties.centroid", FieldProjection::Exclude)
            .with("properties.survey", FieldProjection::Exclude)
            .with("entries.created", FieldProjection::Exclude)
            .with("entries.files", FieldProjection::Exclude)
            .with("entries.source.started", FieldProjection::Exclude)
            .with("entries.source.finished", FieldProjection::Exclude)
            .with("entries.source.type", FieldProjection::Exclude)
            .with("indexedGeometry", FieldProjection::Exclude)
    }

    pub fn with(mut self, path: &str, projection: FieldProjection) -> Self {
        self.fields.insert(path.to_string(), projection);
        self
    }

    /// Overlay `overrides` on this mask; overriding paths win.
    pub fn merged(mut self, overrides: &FieldMask) -> Self {
        for (path, projection) in &overrides.fields {
            self.fields.insert(path.clone(), *projection);
        }
        self
    }

    pub fn get(&self, path: &str) -> Option<FieldProjection> {
        self.fields.get(path).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a mask of the form `{ "path": 0 | 1 | false | true | { "$slice": n } }`.
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        let map = value.as_object().ok_or_else(|| StoreError::InvalidMask {
            field: String::new(),
            message: "mask must be an object".to_string(),
        })?;

        let mut mask = Self::new();
        for (path, setting) in map {
            let projection = match setting {
                Value::Bool(false) => FieldProjection::Exclude,
                Value::Bool(true) => FieldProjection::Include,
                Value::Number(n) if n.as_f64() == Some(0.0) => FieldProjection::Exclude,
                Value::Number(_) => FieldProjection::Include,
                Value::Object(ops) => match ops.get("$slice").and_then(Value::as_i64) {
                    Some(n) => FieldProjection::Slice(n),
                    None => {
                        return Err(StoreError::InvalidMask {
                            field: path.clone(),
                            message: "only integer $slice is supported".to_string(),
                        })
                    }
                },
                _ => {
                    return Err(StoreError::InvalidMask {
                        field: path.clone(),
                        message: format!("unsupported projection {}", setting),
                    })
                }
            };
            mask.fields.insert(path.clone(), projection);
        }
        Ok(mask)
    }

    /// Apply the mask to a document in place.
    pub fn apply(&self, doc: &mut Document) {
        let includes: Vec<Vec<&str>> = self
            .fields
            .iter()
            .filter(|(_, p)| **p == FieldProjection::Include)
            .map(|(path, _)| path.split('.').collect())
            .collect();
        if !includes.is_empty() {
            let paths: Vec<&[&str]> = includes.iter().map(Vec::as_slice).collect();
            *doc = project_include(doc, &paths).unwrap_or_else(|| Value::Object(Map::new()));
        }

        for (path, projection) in &self.fields {
            if let FieldProjection::Slice(n) = projection {
                let segments: Vec<&str> = path.split('.').collect();
                slice_path(doc, &segments, *n);
            }
        }

        for (path, projection) in &self.fields {
            if *projection == FieldProjection::Exclude {
                let segments: Vec<&str> = path.split('.').collect();
                remove_path(doc, &segments);
            }
        }
    }
}

fn project_include(value: &Value, paths: &[&[&str]]) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                let tails: Vec<&[&str]> = paths
                    .iter()
                    .filter(|p| p.first() == Some(&key.as_str()))
                    .map(|p| &p[1..])
                    .collect();
                if tails.is_empty() {
                    continue;
                }
                if tails.iter().any(|t| t.is_empty()) {
                    out.insert(key.clone(), child.clone());
                } else if let Some(projected) = project_include(child, &tails) {
                    out.insert(key.clone(), projected);
                }
            }
            Some(Value::Object(out))
        }
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| project_include(item, paths))
                .collect(),
        )),
        _ => None,
    }
}

fn slice_path(value: &mut Value, segments: &[&str], n: i64) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    match value {
        Value::Object(map) => {
            if let Some(child) = map.get_mut(*head) {
                if rest.is_empty() {
                    if let Value::Array(items) = child {
                        slice_array(items, n);
                    }
                } else {
                    slice_path(child, rest, n);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                slice_path(item, segments, n);
            }
        }
        _ => {}
    }
}

fn slice_array(items: &mut Vec<Value>, n: i64) {
    let keep = n.unsigned_abs() as usize;
    if n >= 0 {
        items.truncate(keep);
    } else if items.len() > keep {
        items.drain(..items.len() - keep);
    }
}

fn remove_path(value: &mut Value, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    match value {
        Value::Object(map) => {
            if rest.is_empty() {
                map.remove(*head);
            } else if let Some(child) = map.get_mut(*head) {
                remove_path(child, rest);
            }
        }
        Value::Array(items) => {
            for item in items {
                remove_path(item, segments);
            }
        }
        _ => {}
    }
}

/// One page request against a store.
///
/// Filter and mask are shared so issuing successive pages does not copy them.
#[derive(Debug, Clone)]
pub struct FindRequest {
    pub filter: Arc<Filter>,
    pub selection: Arc<FieldMask>,
    pub limit: usize,
    pub skip: usize,
}

impl FindRequest {
    pub fn new(filter: Filter, selection: FieldMask, limit: usize) -> Self {
        Self {
            filter: Arc::new(filter),
            selection: Arc::new(selection),
            limit,
            skip: 0,
        }
    }

    /// The same query at a different offset.
    pub fn page(&self, skip: usize) -> Self {
        Self {
            filter: Arc::clone(&self.filter),
            selection: Arc::clone(&self.selection),
            limit: self.limit,
            skip,
        }
    }

    /// The page following this one.
    pub fn next_page(&self) -> Self {
        self.page(self.skip + self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Value {
        json!({
            "geometry": { "type": "Point", "coordinates": [5.0, 5.0] },
            "properties": {
                "humanReadableName": "Plot 7",
                "object_id": "abc",
                "centroid": [5.0, 5.0],
                "survey": "s-1",
                "tags": ["red", "blue"]
            },
            "entries": [
                { "responses": { "q": 1 }, "created": "2020", "files": [] },
                { "responses": { "q": 2 }, "created": "2021", "files": ["a.jpg"],
                  "source": { "type": "mobile", "started": 1, "finished": 2, "id": "x" } }
            ],
            "indexedGeometry": { "type": "Point", "coordinates": [5.0, 5.0] }
        })
    }

    #[test]
    fn test_within_box_clones_base() {
        let mut base = Map::new();
        base.insert("properties.survey".into(), json!("s-1"));

        let filter = Filter::from_base(&base)
            .within_box("indexedGeometry", &BoundingBox::new(0.0, 1.0, 10.0, 11.0));

        assert_eq!(base.len(), 1);
        assert_eq!(
            filter.get("indexedGeometry"),
            Some(&json!({ "$within": { "$box": [[0.0, 1.0], [10.0, 11.0]] } }))
        );
        assert_eq!(filter.get("properties.survey"), Some(&json!("s-1")));
    }

    #[test]
    fn test_constraints_match_dotted_paths() {
        let doc = record();
        let filter: Filter = serde_json::from_value(json!({
            "properties.object_id": "abc",
            "properties.tags": "blue",
            "entries.source.id": { "$in": ["x", "y"] },
            "properties.missing": { "$exists": false },
            "geometry": { "$within": { "$box": [[0.0, 0.0], [10.0, 10.0]] } }
        }))
        .unwrap();

        let constraints = filter.constraints().unwrap();
        assert_eq!(constraints.len(), 5);
        assert!(constraints.iter().all(|c| c.matches(&doc)));
    }

    #[test]
    fn test_within_box_rejects_outside_geometry() {
        let doc = record();
        let filter = Filter::default().within_box("geometry", &BoundingBox::new(6.0, 6.0, 7.0, 7.0));
        let constraints = filter.constraints().unwrap();
        assert!(!constraints[0].matches(&doc));
    }

    #[test]
    fn test_within_box_includes_edges() {
        let doc = record();
        for bbox in [BoundingBox::new(5.0, 0.0, 9.0, 9.0), BoundingBox::new(0.0, 0.0, 5.0, 5.0)] {
            let filter = Filter::default().within_box("geometry", &bbox);
            assert!(filter.constraints().unwrap()[0].matches(&doc), "{:?}", bbox);
        }
    }

    #[test]
    fn test_unsupported_operator() {
        let filter: Filter = serde_json::from_value(json!({ "a": { "$near": [0, 0] } })).unwrap();
        assert!(matches!(
            filter.constraints(),
            Err(StoreError::UnsupportedOperator { operator, .. }) if operator == "$near"
        ));
    }

    #[test]
    fn test_record_defaults_keep_last_entry_and_drop_heavy_fields() {
        let mut doc = record();
        FieldMask::record_defaults().apply(&mut doc);

        assert_eq!(doc["entries"].as_array().unwrap().len(), 1);
        assert_eq!(doc["entries"][0]["responses"], json!({ "q": 2 }));
        assert!(doc["entries"][0].get("created").is_none());
        assert!(doc["entries"][0].get("files").is_none());
        assert_eq!(doc["entries"][0]["source"], json!({ "id": "x" }));
        assert!(doc["properties"].get("centroid").is_none());
        assert!(doc["properties"].get("survey").is_none());
        assert!(doc.get("indexedGeometry").is_none());
        assert_eq!(doc["properties"]["object_id"], "abc");
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let overrides =
            FieldMask::from_value(&json!({ "properties.survey": 1, "entries": { "$slice": 2 } }))
                .unwrap();
        let mask = FieldMask::record_defaults().merged(&overrides);

        assert_eq!(mask.get("properties.survey"), Some(FieldProjection::Include));
        assert_eq!(mask.get("entries"), Some(FieldProjection::Slice(2)));
        assert_eq!(mask.get("indexedGeometry"), Some(FieldProjection::Exclude));
    }

    #[test]
    fn test_include_reduces_document() {
        let mut doc = record();
        let mask = FieldMask::new()
            .with("properties.object_id", FieldProjection::Include)
            .with("entries.responses", FieldProjection::Include);
        mask.apply(&mut doc);

        assert_eq!(
            doc,
            json!({
                "properties": { "object_id": "abc" },
                "entries": [ { "responses": { "q": 1 } }, { "responses": { "q": 2 } } ]
            })
        );
    }

    #[test]
    fn test_invalid_mask() {
        assert!(FieldMask::from_value(&json!({ "a": "yes" })).is_err());
        assert!(FieldMask::from_value(&json!([1])).is_err());
    }

    #[test]
    fn test_find_request_paging_shares_filter() {
        let request = FindRequest::new(Filter::default(), FieldMask::new(), 5);
        let next = request.next_page().next_page();

        assert_eq!(next.skip, 10);
        assert_eq!(next.limit, 5);
        assert!(Arc::ptr_eq(&request.filter, &next.filter));
    }
}
