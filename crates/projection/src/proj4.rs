//! Arbitrary EPSG-to-EPSG transforms through proj4rs.
//!
//! Definitions come from the `crs-definitions` database. proj4rs works in
//! radians for geographic systems, so degrees are converted on the way in
//! and out.

use std::fmt;

use geo_common::{CrsCode, Position};
use proj4rs::proj::Proj;

use crate::ProjectionError;

/// A proj4 definition resolved for one CRS.
struct Definition {
    code: CrsCode,
    proj: Proj,
    geographic: bool,
}

impl Definition {
    fn lookup(code: CrsCode) -> Result<Self, ProjectionError> {
        let def = crs_definitions::from_code(code.epsg())
            .ok_or_else(|| ProjectionError::UnsupportedCrs(code.to_string()))?;

        let proj = Proj::from_proj_string(def.proj4).map_err(|e| {
            ProjectionError::InvalidDefinition {
                code: code.to_string(),
                message: format!("{:?}", e),
            }
        })?;

        Ok(Self {
            code,
            proj,
            geographic: def.proj4.contains("+proj=longlat"),
        })
    }
}

/// Point transform between two CRSs known to the definition database.
pub struct Proj4Transform {
    source: Definition,
    target: Definition,
}

impl Proj4Transform {
    pub fn new(from: CrsCode, to: CrsCode) -> Result<Self, ProjectionError> {
        Ok(Self {
            source: Definition::lookup(from)?,
            target: Definition::lookup(to)?,
        })
    }

    pub fn apply(&self, p: Position) -> Result<Position, ProjectionError> {
        let [x, y] = p;
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFiniteCoordinate { x, y });
        }

        let mut point = if self.source.geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(&self.source.proj, &self.target.proj, &mut point).map_err(
            |e| ProjectionError::TransformFailed {
                from: self.source.code.to_string(),
                to: self.target.code.to_string(),
                message: format!("{:?}", e),
            },
        )?;

        let (out_x, out_y) = if self.target.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if out_x.is_finite() && out_y.is_finite() {
            Ok([out_x, out_y])
        } else {
            Err(ProjectionError::NonFiniteCoordinate { x, y })
        }
    }
}

impl fmt::Debug for Proj4Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proj4Transform")
            .field("from", &self.source.code)
            .field("to", &self.target.code)
            .finish()
    }
}
