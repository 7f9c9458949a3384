//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use datasource::ShapeCollection;
use geo_common::{tile::mercator_tile_bbox, BoundingBox, GeoError, TileCoord};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::state::AppState;

/// JSON error body with the status derived from the error.
#[derive(Debug)]
pub struct ApiError(pub GeoError);

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    description: String,
}

impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: self.0.code(),
            description: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ShapesQuery {
    /// `minx,miny,maxx,maxy` in `crs`.
    pub bbox: Option<String>,
    pub crs: Option<String>,
}

/// Run one fetch under the request timeout and a child of the shutdown token.
async fn fetch_shapes(
    state: &AppState,
    bbox: BoundingBox,
    crs: &str,
) -> Result<ShapeCollection, ApiError> {
    let cancel = state.shutdown.child_token();
    let fetch = state.source.get_shapes_with_cancel(
        bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y, crs, &cancel,
    );

    match tokio::time::timeout(state.request_timeout, fetch).await {
        Ok(result) => result.map_err(|e| ApiError(e.into())),
        Err(_) => {
            cancel.cancel();
            warn!(
                timeout_secs = state.request_timeout.as_secs_f64(),
                "Shape request timed out"
            );
            Err(GeoError::Timeout.into())
        }
    }
}

/// GET /shapes?bbox=minx,miny,maxx,maxy&crs=EPSG:4326
#[instrument(skip(state))]
pub async fn shapes_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ShapesQuery>,
) -> Result<Json<ShapeCollection>, ApiError> {
    let raw = query
        .bbox
        .ok_or_else(|| GeoError::MissingParameter("bbox".to_string()))?;
    let bbox = BoundingBox::parse(&raw).map_err(GeoError::from)?;
    if bbox.min_x > bbox.max_x || bbox.min_y > bbox.max_y {
        return Err(GeoError::InvalidBbox(format!("{}: min exceeds max", raw)).into());
    }
    let crs = query.crs.as_deref().unwrap_or("EPSG:4326");

    let collection = fetch_shapes(&state, bbox, crs).await?;
    Ok(Json(collection))
}

/// GET /shapes/:z/:x/:y - features of one XYZ tile, in Web Mercator
#[instrument(skip(state))]
pub async fn tile_shapes_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((z, x, y)): Path<(u32, u32, u32)>,
) -> Result<Json<ShapeCollection>, ApiError> {
    let coord = TileCoord::new(z, x, y);
    if !coord.is_valid() {
        return Err(GeoError::InvalidParameter {
            param: "tile".to_string(),
            message: format!("{}/{}/{} is outside the tile matrix", z, x, y),
        }
        .into());
    }
    let max_zoom = state.source.max_zoom();
    if z > u32::from(max_zoom) {
        return Err(GeoError::InvalidParameter {
            param: "z".to_string(),
            message: format!("zoom {} exceeds maximum {}", z, max_zoom),
        }
        .into());
    }

    let bbox = mercator_tile_bbox(&coord);
    let collection = fetch_shapes(&state, bbox, "EPSG:3857").await?;
    Ok(Json(collection))
}

/// GET /health - liveness plus store reachability
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            warn!(error = %e, "Store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable")
        }
    }
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// GET /api/pipeline - the most recent pipeline report
pub async fn pipeline_report_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match state.last_report.read().await.as_ref() {
        Some(report) => Json(report.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No pipeline report yet").into_response(),
    }
}
