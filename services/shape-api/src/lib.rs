//! Shape API Service Library
//!
//! HTTP surface over a single shape source: GeoJSON shapes by bounding box
//! or XYZ tile, health, Prometheus metrics and the latest pipeline report.

pub mod config;
pub mod handlers;
pub mod reporter;
pub mod router;
pub mod state;
