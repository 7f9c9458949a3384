//! CRS-to-CRS transforms for points, geometries and feature collections.

use geo_common::{CrsCode, FeatureCollection, Geometry, Position};
use tracing::trace;

use crate::proj4::Proj4Transform;
use crate::{ProjectionError, WebMercator};

/// A resolved transform between two CRSs.
#[derive(Debug)]
pub enum Transform {
    /// Source and target share the same coordinate space.
    Identity,
    /// Geographic degrees to Web Mercator meters.
    ToMercator(WebMercator),
    /// Web Mercator meters to geographic degrees.
    FromMercator(WebMercator),
    /// Any other pair, through the proj4 definition database.
    Proj4(Box<Proj4Transform>),
}

impl Transform {
    /// Resolve the transform between two CRS identifiers.
    ///
    /// NAD83 and WGS84 geographic coordinates are treated as the same space;
    /// the datum shift is well below the precision of web maps.
    pub fn between(from: &str, to: &str) -> Result<Self, ProjectionError> {
        let from = CrsCode::from_identifier(from)?;
        let to = CrsCode::from_identifier(to)?;

        let mercator = WebMercator::default();

        let transform = match (from.is_geographic(), to.is_geographic()) {
            (Some(true), Some(true)) | (Some(false), Some(false)) => Transform::Identity,
            (Some(true), Some(false)) => Transform::ToMercator(mercator),
            (Some(false), Some(true)) => Transform::FromMercator(mercator),
            _ if from == to => Transform::Identity,
            _ => Transform::Proj4(Box::new(Proj4Transform::new(from, to)?)),
        };

        trace!(%from, %to, ?transform, "Resolved CRS transform");
        Ok(transform)
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    /// Transform a single position.
    pub fn apply(&self, p: Position) -> Result<Position, ProjectionError> {
        match self {
            Transform::Identity => Ok(p),
            Transform::ToMercator(mercator) => mercator.forward(p),
            Transform::FromMercator(mercator) => mercator.inverse(p),
            Transform::Proj4(transform) => transform.apply(p),
        }
    }

    /// Transform every position of a geometry in place.
    pub fn apply_geometry(&self, geometry: &mut Geometry) -> Result<(), ProjectionError> {
        if self.is_identity() {
            return Ok(());
        }
        geometry.try_for_each_position_mut(&mut |p: &mut Position| -> Result<(), ProjectionError> {
            *p = self.apply(*p)?;
            Ok(())
        })
    }
}

/// Project a point from one CRS into another.
pub fn project_point(from: &str, to: &str, p: Position) -> Result<Position, ProjectionError> {
    Transform::between(from, to)?.apply(p)
}

/// Project a geometry in place from one CRS into another.
pub fn project_geometry(
    from: &str,
    to: &str,
    geometry: &mut Geometry,
) -> Result<(), ProjectionError> {
    Transform::between(from, to)?.apply_geometry(geometry)
}

/// Project the top-level geometry of every feature in a collection.
///
/// Properties are opaque to this function; any geometry embedded in them is
/// left in its original CRS.
pub fn project_feature_collection<P>(
    from: &str,
    to: &str,
    mut collection: FeatureCollection<P>,
) -> Result<FeatureCollection<P>, ProjectionError> {
    let transform = Transform::between(from, to)?;
    if transform.is_identity() {
        return Ok(collection);
    }

    for feature in &mut collection.features {
        transform.apply_geometry(&mut feature.geometry)?;
    }

    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::Feature;
    use serde_json::json;

    #[test]
    fn test_same_crs_is_identity() {
        assert!(Transform::between("EPSG:4326", "epsg:4326")
            .unwrap()
            .is_identity());
        assert!(Transform::between("EPSG:4269", "EPSG:4326")
            .unwrap()
            .is_identity());
        assert!(Transform::between("EPSG:900913", "EPSG:3857")
            .unwrap()
            .is_identity());
    }

    #[test]
    fn test_unsupported_crs_is_error() {
        let err = project_point("EPSG:4326", "EPSG:99999", [0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedCrs(code) if code == "EPSG:99999"));

        let err = project_point("EPSG:4326", "EPSG:1", [0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedCrs(_)));
    }

    #[test]
    fn test_state_plane_goes_through_proj4() {
        let transform = Transform::between("EPSG:4326", "+init=epsg:2263").unwrap();
        assert!(matches!(transform, Transform::Proj4(_)));

        let original = [-73.9857, 40.7484];
        let projected = transform.apply(original).unwrap();
        let back = project_point("EPSG:2263", "EPSG:4326", projected).unwrap();
        assert!((back[0] - original[0]).abs() < 1e-6);
        assert!((back[1] - original[1]).abs() < 1e-6);
    }

    #[test]
    fn test_utm_zone_coordinates() {
        // Manhattan lies in UTM zone 18N
        let [x, y] = project_point("EPSG:4326", "EPSG:32618", [-73.9857, 40.7484]).unwrap();
        assert!(x > 580_000.0 && x < 590_000.0, "x = {}", x);
        assert!(y > 4_505_000.0 && y < 4_515_000.0, "y = {}", y);
    }

    #[test]
    fn test_same_database_code_is_identity() {
        assert!(Transform::between("EPSG:2263", "epsg:2263")
            .unwrap()
            .is_identity());
    }

    #[test]
    fn test_point_roundtrip_through_mercator() {
        let original = [13.405, 52.52];
        let projected = project_point("EPSG:4326", "EPSG:3857", original).unwrap();
        assert!(projected[0] > 1_000_000.0);

        let back = project_point("EPSG:3857", "EPSG:4326", projected).unwrap();
        assert!((back[0] - original[0]).abs() < 1e-9);
        assert!((back[1] - original[1]).abs() < 1e-9);
    }

    #[test]
    fn test_feature_collection_projects_only_top_level_geometry() {
        let embedded = json!({"type": "Point", "coordinates": [10.0, 10.0]});
        let fc = FeatureCollection::new(vec![Feature::new(
            Geometry::point(10.0, 10.0),
            json!({ "geometry": embedded.clone() }),
        )]);

        let projected = project_feature_collection("EPSG:4326", "EPSG:3857", fc).unwrap();
        let feature = &projected.features[0];

        assert_ne!(feature.geometry, Geometry::point(10.0, 10.0));
        assert_eq!(feature.properties["geometry"], embedded);
    }

    #[test]
    fn test_polygon_projection_keeps_ring_structure() {
        let mut polygon = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]);
        project_geometry("EPSG:4326", "EPSG:3857", &mut polygon).unwrap();

        match polygon {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0].len(), 4);
                assert!((coordinates[0][1].xy[0] - 111319.49079327357).abs() < 1e-6);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }
}
