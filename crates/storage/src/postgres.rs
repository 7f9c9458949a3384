//! PostgreSQL/PostGIS document store.
//!
//! Documents live in a single JSONB column:
//!
//! ```sql
//! CREATE TABLE shapes (id BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL);
//! ```
//!
//! Equality constraints become JSONB containment (`doc @> ...`), `$in` an OR
//! of containments, `$exists` a path lookup and `$within/$box` a PostGIS
//! `ST_CoveredBy` against an envelope, so points on the edge match. Pages are
//! ordered by `id`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info};

use crate::query::{Constraint, Operator};
use crate::{Document, DocumentStore, FindRequest, StoreError, StoreResult};

#[derive(Debug, FromRow)]
struct DocumentRow {
    doc: Json<Value>,
}

/// Document store backed by a JSONB table.
pub struct PgDocumentStore {
    pool: PgPool,
    table: String,
    srid: i32,
}

impl PgDocumentStore {
    /// Connect a new pool.
    pub async fn connect(
        database_url: &str,
        table: &str,
        srid: i32,
        max_connections: u32,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(table, srid, max_connections, "Connected document store");
        Self::new(pool, table, srid)
    }

    /// Wrap an existing pool.
    pub fn new(pool: PgPool, table: &str, srid: i32) -> StoreResult<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
            srid,
        })
    }

    /// Create the PostGIS extension, table and containment index.
    pub async fn migrate(&self) -> StoreResult<()> {
        let schema = format!(
            "CREATE EXTENSION IF NOT EXISTS postgis;\
             CREATE TABLE IF NOT EXISTS {table} (id BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL);\
             CREATE INDEX IF NOT EXISTS {table}_doc_idx ON {table} USING GIN (doc jsonb_path_ops)",
            table = self.table
        );

        for statement in schema.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::Query(format!("Migration failed: {}", e)))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Document>> {
        let mut query = select_query(&self.table, self.srid, request)?;

        let rows: Vec<DocumentRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(table = %self.table, skip = request.skip, error = %e, "Document query failed");
                StoreError::from(e)
            })?;

        debug!(
            table = %self.table,
            skip = request.skip,
            limit = request.limit,
            returned = rows.len(),
            "Postgres store page"
        );

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut doc = row.doc.0;
                request.selection.apply(&mut doc);
                doc
            })
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

fn validate_table_name(table: &str) -> StoreResult<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(StoreError::Connection(format!(
            "invalid table name '{}'",
            table
        )))
    }
}

/// Nest `value` under a dotted path: `a.b` -> `{"a": {"b": value}}`.
fn containment(path: &str, value: &Value) -> Value {
    path.rsplit('.').fold(value.clone(), |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.to_string(), inner);
        Value::Object(map)
    })
}

fn path_array(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

fn push_constraint(builder: &mut QueryBuilder<'static, Postgres>, srid: i32, constraint: &Constraint) {
    let field = constraint.field.as_str();
    match &constraint.op {
        Operator::Eq(value) => {
            builder.push("doc @> ");
            builder.push_bind(Json(containment(field, value)));
        }
        Operator::In(values) if values.is_empty() => {
            builder.push("FALSE");
        }
        Operator::In(values) => {
            builder.push("(");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push("doc @> ");
                builder.push_bind(Json(containment(field, value)));
            }
            builder.push(")");
        }
        Operator::Exists(flag) => {
            builder.push("(doc #> ");
            builder.push_bind(path_array(field));
            builder.push(if *flag { ") IS NOT NULL" } else { ") IS NULL" });
        }
        Operator::WithinBox(bbox) => {
            builder.push("ST_CoveredBy(ST_SetSRID(ST_GeomFromGeoJSON((doc #> ");
            builder.push_bind(path_array(field));
            builder.push(format!(")::text), {}), ST_MakeEnvelope(", srid));
            builder.push_bind(bbox.min_x);
            builder.push(", ");
            builder.push_bind(bbox.min_y);
            builder.push(", ");
            builder.push_bind(bbox.max_x);
            builder.push(", ");
            builder.push_bind(bbox.max_y);
            builder.push(format!(", {}))", srid));
        }
    }
}

fn select_query(
    table: &str,
    srid: i32,
    request: &FindRequest,
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let constraints = request.filter.constraints()?;

    let mut builder = QueryBuilder::new(format!("SELECT doc FROM {} WHERE TRUE", table));
    for constraint in &constraints {
        builder.push(" AND ");
        push_constraint(&mut builder, srid, constraint);
    }
    builder.push(" ORDER BY id LIMIT ");
    builder.push_bind(request.limit as i64);
    builder.push(" OFFSET ");
    builder.push_bind(request.skip as i64);

    Ok(builder)
}
