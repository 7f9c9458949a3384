//! Document storage for shape records.
//!
//! - [`DocumentStore`]: the paged query seam consumed by data sources
//! - [`Filter`], [`FieldMask`], [`FindRequest`]: the query model
//! - [`MemoryStore`]: local evaluation over a fixed document set
//! - [`PgDocumentStore`]: PostgreSQL JSONB table with PostGIS box filtering

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use query::{Constraint, Document, FieldMask, FieldProjection, Filter, FindRequest, Operator};
pub use store::DocumentStore;
