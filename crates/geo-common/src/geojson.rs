//! GeoJSON geometry, Feature and FeatureCollection types.
//!
//! Features are generic over their properties so each data source can carry
//! its own typed property bag while sharing serialization and reprojection.
//!
//! See: <https://datatracker.ietf.org/doc/html/rfc7946>

use serde::{Deserialize, Serialize};

/// A coordinate pair `[x, y]` (longitude/easting, latitude/northing).
pub type Position = [f64; 2];

/// One GeoJSON position as stored: the horizontal pair plus any further
/// ordinates (altitude, measure) carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Coord {
    pub xy: Position,
    pub rest: Vec<f64>,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            xy: [x, y],
            rest: Vec::new(),
        }
    }
}

impl From<Position> for Coord {
    fn from(xy: Position) -> Self {
        Self { xy, rest: Vec::new() }
    }
}

impl TryFrom<Vec<f64>> for Coord {
    type Error = String;

    fn try_from(mut ordinates: Vec<f64>) -> Result<Self, Self::Error> {
        if ordinates.len() < 2 {
            return Err(format!(
                "position needs at least 2 ordinates, got {}",
                ordinates.len()
            ));
        }
        let rest = ordinates.split_off(2);
        Ok(Self {
            xy: [ordinates[0], ordinates[1]],
            rest,
        })
    }
}

impl From<Coord> for Vec<f64> {
    fn from(coord: Coord) -> Self {
        let mut ordinates = Vec::with_capacity(2 + coord.rest.len());
        ordinates.extend_from_slice(&coord.xy);
        ordinates.extend(coord.rest);
        ordinates
    }
}

/// GeoJSON geometry objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Coord,
    },

    MultiPoint {
        coordinates: Vec<Coord>,
    },

    LineString {
        coordinates: Vec<Coord>,
    },

    MultiLineString {
        coordinates: Vec<Vec<Coord>>,
    },

    /// Array of linear rings (first is exterior, rest are holes).
    Polygon {
        coordinates: Vec<Vec<Coord>>,
    },

    MultiPolygon {
        coordinates: Vec<Vec<Vec<Coord>>>,
    },

    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

fn ring(positions: Vec<Position>) -> Vec<Coord> {
    positions.into_iter().map(Coord::from).collect()
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point {
            coordinates: Coord::new(x, y),
        }
    }

    /// Create a polygon geometry from rings.
    pub fn polygon(rings: Vec<Vec<Position>>) -> Self {
        Geometry::Polygon {
            coordinates: rings.into_iter().map(ring).collect(),
        }
    }

    /// Visit the horizontal pair of every position, stopping at the first
    /// error. Extra ordinates are left as they are.
    pub fn try_for_each_position_mut<E, F>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut Position) -> Result<(), E>,
    {
        match self {
            Geometry::Point { coordinates } => f(&mut coordinates.xy),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter_mut().try_for_each(|c| f(&mut c.xy))
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates
                    .iter_mut()
                    .flatten()
                    .try_for_each(|c| f(&mut c.xy))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter_mut()
                .flatten()
                .flatten()
                .try_for_each(|c| f(&mut c.xy)),
            Geometry::GeometryCollection { geometries } => geometries
                .iter_mut()
                .try_for_each(|g| g.try_for_each_position_mut(f)),
        }
    }

    /// True if every position satisfies `predicate`.
    ///
    /// Empty geometries satisfy any predicate.
    pub fn all_positions<F>(&self, predicate: &F) -> bool
    where
        F: Fn(&Position) -> bool,
    {
        match self {
            Geometry::Point { coordinates } => predicate(&coordinates.xy),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().all(|c| predicate(&c.xy))
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().all(|c| predicate(&c.xy))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .all(|c| predicate(&c.xy)),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().all(|g| g.all_positions(predicate))
            }
        }
    }
}

/// A GeoJSON Feature with typed properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature<P = serde_json::Value> {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// The geometry of this feature.
    pub geometry: Geometry,

    pub properties: P,
}

impl<P> Feature<P> {
    pub fn new(geometry: Geometry, properties: P) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry,
            properties,
        }
    }
}

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection<P = serde_json::Value> {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    /// Create a collection from features, keeping their order.
    pub fn new(features: Vec<Feature<P>>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
