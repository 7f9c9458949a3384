//! Construction-time configuration of a shape source.

use geo_common::normalize_crs_identifier;
use projection::Transform;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use storage::FieldMask;

use crate::ConfigError;

/// Configuration of one [`ResponsesSource`](crate::ResponsesSource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name reported to callers and used as the metrics component.
    #[serde(default = "default_name")]
    pub name: String,

    /// Base filter merged into every query.
    #[serde(default)]
    pub query: Map<String, Value>,

    /// Field holding the geometry used for box filtering.
    pub key: String,

    /// Native CRS of the stored geometries.
    #[serde(default = "default_projection")]
    pub projection: String,

    /// Field-mask overrides merged over the record defaults.
    #[serde(default)]
    pub select: Map<String, Value>,

    /// Maximum zoom advertised to tile clients.
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Documents requested per store round-trip.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_name() -> String {
    "localdata".to_string()
}

fn default_projection() -> String {
    "EPSG:4326".to_string()
}

fn default_zoom() -> u8 {
    17
}

fn default_page_size() -> usize {
    5000
}

impl SourceConfig {
    /// A configuration with defaults for everything but the geometry key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            query: Map::new(),
            key: key.into(),
            projection: default_projection(),
            select: Map::new(),
            zoom: default_zoom(),
            page_size: default_page_size(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        // Resolving a transform proves the definition is known
        Transform::between(&self.projection, "EPSG:4326")
            .map_err(|_| ConfigError::UnsupportedProjection(self.projection.clone()))?;
        self.field_mask()?;
        Ok(())
    }

    /// Normalized native CRS identifier.
    pub fn native_crs(&self) -> String {
        normalize_crs_identifier(&self.projection)
    }

    /// Record defaults with the configured overrides applied.
    pub fn field_mask(&self) -> Result<FieldMask, ConfigError> {
        let defaults = FieldMask::record_defaults();
        if self.select.is_empty() {
            return Ok(defaults);
        }
        let overrides = FieldMask::from_value(&Value::Object(self.select.clone()))?;
        Ok(defaults.merged(&overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::FieldProjection;

    #[test]
    fn test_yaml_defaults() {
        let config: SourceConfig = serde_yaml::from_str("key: indexedGeometry").unwrap();

        assert_eq!(config.name, "localdata");
        assert_eq!(config.projection, "EPSG:4326");
        assert_eq!(config.zoom, 17);
        assert_eq!(config.page_size, 5000);
        assert!(config.query.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_full() {
        let yaml = r#"
name: parcels
key: indexedGeometry
projection: "+init=epsg:3857"
query:
  properties.survey: survey-1
select:
  properties.survey: 1
zoom: 19
page_size: 250
"#;
        let config: SourceConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.native_crs(), "EPSG:3857");
        assert_eq!(config.query["properties.survey"], "survey-1");
        let mask = config.field_mask().unwrap();
        assert_eq!(mask.get("properties.survey"), Some(FieldProjection::Include));
        assert_eq!(mask.get("entries"), Some(FieldProjection::Slice(-1)));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = SourceConfig::new(" ");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyKey)));

        config.key = "geometry".into();
        config.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPageSize)));

        config.page_size = 10;
        config.projection = "EPSG:99999".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedProjection(_))
        ));

        config.projection = "EPSG:2263".into();
        assert!(config.validate().is_ok());

        config.select.insert("entries".into(), Value::String("all".into()));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSelect(_))));
    }
}
