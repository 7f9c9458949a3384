//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed CRS identifier.
///
/// The three web-map codes get their own variants since they are handled
/// without a projection database; any other EPSG number is carried as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 Geographic
    Epsg4269,
    /// Any other EPSG code
    Epsg(u16),
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts anything [`normalize_crs_identifier`] understands, e.g.
    /// "EPSG:4326", "epsg:3857", "CRS:84", "+init=epsg:2263".
    pub fn from_identifier(s: &str) -> Result<Self, CrsParseError> {
        let normalized = normalize_crs_identifier(s);
        let code = normalized
            .strip_prefix("EPSG:")
            .and_then(|n| n.parse::<u16>().ok())
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        Ok(match code {
            4326 => CrsCode::Epsg4326,
            3857 => CrsCode::Epsg3857,
            4269 => CrsCode::Epsg4269,
            other => CrsCode::Epsg(other),
        })
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u16 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg(code) => *code,
        }
    }

    /// Whether a built-in code is geographic. `None` for codes that need a
    /// projection database to answer.
    pub fn is_geographic(&self) -> Option<bool> {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => Some(true),
            CrsCode::Epsg3857 => Some(false),
            CrsCode::Epsg(_) => None,
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Normalize a CRS identifier to its canonical `EPSG:NNNN` spelling.
///
/// Unknown identifiers are returned trimmed and upper-cased so that two
/// spellings of the same unknown code still compare equal.
pub fn normalize_crs_identifier(s: &str) -> String {
    let upper = s.trim().to_uppercase();

    let code = upper
        .strip_prefix("+INIT=")
        .unwrap_or(&upper)
        .trim_start_matches("URN:OGC:DEF:CRS:")
        .replace("EPSG::", "EPSG:");

    match code.as_str() {
        "CRS:84" | "OGC:1.3:CRS84" | "OGC::CRS84" => "EPSG:4326".to_string(),
        "EPSG:900913" | "EPSG:3785" | "EPSG:102113" => "EPSG:3857".to_string(),
        _ => code,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_identifier("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_identifier("epsg:3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::from_identifier("CRS:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_identifier("+init=epsg:2263").unwrap(),
            CrsCode::Epsg(2263)
        );
        assert!(CrsCode::from_identifier("EPSG:99999").is_err());
        assert!(CrsCode::from_identifier("ESRI:102003").is_err());
    }

    #[test]
    fn test_normalize_variants() {
        assert_eq!(normalize_crs_identifier(" epsg:4326 "), "EPSG:4326");
        assert_eq!(normalize_crs_identifier("+init=epsg:3857"), "EPSG:3857");
        assert_eq!(normalize_crs_identifier("EPSG:900913"), "EPSG:3857");
        assert_eq!(
            normalize_crs_identifier("urn:ogc:def:crs:EPSG::4269"),
            "EPSG:4269"
        );
        assert_eq!(normalize_crs_identifier("epsg:2263"), "EPSG:2263");
    }

    #[test]
    fn test_display_round_trips() {
        for code in [
            CrsCode::Epsg4326,
            CrsCode::Epsg3857,
            CrsCode::Epsg4269,
            CrsCode::Epsg(32633),
        ] {
            assert_eq!(CrsCode::from_identifier(&code.to_string()).unwrap(), code);
        }
    }
}
