//! HTTP handlers for the tile endpoints.
//!
//! Route shape: `/tiles/{key.../z/x/y.png}` for tiles and
//! `/tiles/{key...}/preview.png` for dataset overviews. Key path values
//! are positional and follow the driver's declared key order; the first
//! value names the data kind.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::{error, instrument};

use tile_common::{TileCoord, TileError, TileResult};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TileOptions {
    /// Pixel dimensions of the returned PNG (square).
    pub tile_size: Option<usize>,
}

/// Parsed form of the wildcard tile path.
#[derive(Debug, PartialEq)]
enum TileRequest {
    Tile {
        key_values: Vec<String>,
        tile: TileCoord,
    },
    Preview {
        key_values: Vec<String>,
    },
}

fn parse_tile_path(path: &str) -> TileResult<TileRequest> {
    let parts: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|p| !p.is_empty())
        .collect();

    let Some(&last) = parts.last() else {
        return Err(TileError::Validation("empty tile path".to_string()));
    };

    if last == "preview.png" {
        let key_values: Vec<String> =
            parts[..parts.len() - 1].iter().map(|s| s.to_string()).collect();
        if key_values.is_empty() {
            return Err(TileError::Validation(
                "preview path has no key values".to_string(),
            ));
        }
        return Ok(TileRequest::Preview { key_values });
    }

    // {key...}/{z}/{x}/{y}.png
    if parts.len() < 4 {
        return Err(TileError::Validation(format!(
            "expected {{keys...}}/z/x/y.png, got {:?}",
            path
        )));
    }

    let Some(y_str) = last.strip_suffix(".png") else {
        return Err(TileError::Validation(format!(
            "tile path must end in .png, got {:?}",
            last
        )));
    };
    let z = parse_coord(parts[parts.len() - 3], "z")?;
    let x = parse_coord(parts[parts.len() - 2], "x")?;
    let y = parse_coord(y_str, "y")?;

    let key_values: Vec<String> = parts[..parts.len() - 3]
        .iter()
        .map(|s| s.to_string())
        .collect();

    Ok(TileRequest::Tile {
        key_values,
        tile: TileCoord::new(z, x, y),
    })
}

fn parse_coord(s: &str, name: &str) -> TileResult<u32> {
    s.parse()
        .map_err(|_| TileError::Validation(format!("invalid {} coordinate: {:?}", name, s)))
}

#[instrument(skip(state))]
pub async fn tiles_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
    Query(options): Query<TileOptions>,
) -> Response {
    let request = match parse_tile_path(&path) {
        Ok(request) => request,
        Err(err) => return error_response(err),
    };

    let size = options.tile_size.map(|s| (s, s));
    let start = Instant::now();

    let (kind, result) = match &request {
        TileRequest::Tile { key_values, tile } => (
            key_values[0].clone(),
            state.compositor.render_tile(key_values, *tile, size).await,
        ),
        TileRequest::Preview { key_values } => (
            key_values[0].clone(),
            state.compositor.render_preview(key_values, size).await,
        ),
    };

    let plane = match result {
        Ok(plane) => plane,
        Err(err) => return error_response(err),
    };

    let compression = state.compositor.config().png_compression_level;
    let png = match renderer::plane_to_png(&plane, compression) {
        Ok(png) => png,
        Err(err) => return error_response(err),
    };

    counter!("tiles_rendered_total", "kind" => kind).increment(1);
    histogram!("tile_render_seconds").record(start.elapsed().as_secs_f64());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=60"),
        ],
        png,
    )
        .into_response()
}

/// Map a pipeline error onto its HTTP status.
///
/// Internal errors return 500 with a logged cause; no error class is
/// collapsed into an empty success response.
fn error_response(err: TileError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "tile request failed");
    }
    (status, err.to_string()).into_response()
}

pub async fn health_handler() -> &'static str {
    "OK"
}

pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> String {
    handle.render()
}
