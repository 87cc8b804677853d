//! The tile compositor: fan-out fetch, reconcile, merge, quantize.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, instrument, warn};

use storage::{DriverSession, RasterDriver, TileReadOptions};
use tile_common::{
    tile_intersects, DatasetKey, MaskedGrid, TileCoord, TileError, TileResult,
};

use crate::config::CompositorConfig;
use crate::enumerate::{expand_key, ConcreteKey};
use crate::kinds::{DataKind, DataKindRegistry};
use crate::merge::merge_into;
use crate::quantize::{quantize, QuantizedPlane};
use crate::reconcile::reconcile;

/// Result of one section fetch. Skips are not errors; failures are
/// collected and surfaced after the join barrier.
enum FetchOutcome {
    /// The key maps to no dataset.
    Missing,
    /// The dataset exists but does not intersect the requested tile.
    Outside,
    /// Pixel data fetched at the key's source resolution.
    Fetched { grid: MaskedGrid, resolution: u32 },
    /// Metadata indicated coverage but the data read failed.
    Failed(TileError),
}

/// Composites tiles from multiple raster sections and quantizes them
/// into transport planes.
///
/// One compositor is shared across requests; each request acquires its
/// own driver session and owns its canvas exclusively. Dropping the
/// returned future abandons in-flight fetches without producing a
/// partial canvas.
pub struct TileCompositor {
    driver: Arc<dyn RasterDriver>,
    registry: DataKindRegistry,
    config: CompositorConfig,
}

impl TileCompositor {
    pub fn new(
        driver: Arc<dyn RasterDriver>,
        registry: DataKindRegistry,
        config: CompositorConfig,
    ) -> TileResult<Self> {
        config.validate().map_err(TileError::Consistency)?;
        Ok(Self {
            driver,
            registry,
            config,
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn registry(&self) -> &DataKindRegistry {
        &self.registry
    }

    /// Render one tile as a quantized plane.
    ///
    /// `key_values` are the request's key path values in the driver's
    /// declared key order; compound section and resolution fields are
    /// expanded and fetched concurrently, then merged in enumeration
    /// order so output does not depend on fetch completion order.
    #[instrument(skip(self), fields(keys = %key_values.join("/")))]
    pub async fn render_tile(
        &self,
        key_values: &[String],
        tile: TileCoord,
        tile_size: Option<(usize, usize)>,
    ) -> TileResult<QuantizedPlane> {
        tile.validate()?;
        let tile_size = tile_size.unwrap_or(self.config.default_tile_size);
        let (template, kind) = self.resolve_kind(key_values)?;

        let enumeration = expand_key(&template)?;
        validate_canvas_divisibility(tile_size, &enumeration)?;
        let session = self.driver.connect().await?;

        let outcomes = {
            let session = session.as_ref();
            let fetches: Vec<_> = enumeration
                .keys
                .iter()
                .map(|concrete| {
                    fetch_tile_section(
                        session,
                        concrete,
                        &tile,
                        tile_size,
                        enumeration.max_resolution,
                    )
                })
                .collect();
            stream::iter(fetches)
                .buffered(self.config.fetch_concurrency)
                .collect::<Vec<_>>()
                .await
        };

        let plane = self.merge_and_quantize(
            outcomes,
            kind,
            tile_size,
            enumeration.max_resolution,
            || TileError::TileOutOfBounds {
                z: tile.z,
                x: tile.x,
                y: tile.y,
            },
        )?;

        debug!(tile = %tile, kind = kind.name.as_str(), "tile composited");
        Ok(plane)
    }

    /// Render a fixed-size overview of the dataset, without a tile
    /// coordinate. Every existing section contributes; there is no
    /// intersection test.
    #[instrument(skip(self), fields(keys = %key_values.join("/")))]
    pub async fn render_preview(
        &self,
        key_values: &[String],
        size: Option<(usize, usize)>,
    ) -> TileResult<QuantizedPlane> {
        let size = size.unwrap_or(self.config.preview_size);
        let (template, kind) = self.resolve_kind(key_values)?;

        let enumeration = expand_key(&template)?;
        validate_canvas_divisibility(size, &enumeration)?;
        let session = self.driver.connect().await?;

        let outcomes = {
            let session = session.as_ref();
            let fetches: Vec<_> = enumeration
                .keys
                .iter()
                .map(|concrete| {
                    fetch_preview_section(session, concrete, size, enumeration.max_resolution)
                })
                .collect();
            stream::iter(fetches)
                .buffered(self.config.fetch_concurrency)
                .collect::<Vec<_>>()
                .await
        };

        let template_name = template.to_string();
        self.merge_and_quantize(outcomes, kind, size, enumeration.max_resolution, || {
            TileError::DatasetNotFound(template_name.clone())
        })
    }

    /// Build the key template and look up its data-kind. The kind is the
    /// first key field's value.
    fn resolve_kind(&self, key_values: &[String]) -> TileResult<(DatasetKey, &DataKind)> {
        let template =
            DatasetKey::from_names_and_values(self.driver.key_names(), key_values)?;
        let kind_name = template
            .fields()
            .next()
            .map(|(_, v)| v.to_string())
            .ok_or_else(|| TileError::Validation("empty dataset key".to_string()))?;
        let kind = self.registry.get(&kind_name).ok_or_else(|| {
            TileError::Validation(format!("unknown data kind: {:?}", kind_name))
        })?;
        Ok((template, kind))
    }

    /// Join-barrier tail of the pipeline: apply the partial-failure
    /// policy, merge fetched grids in enumeration order, quantize.
    fn merge_and_quantize(
        &self,
        outcomes: Vec<FetchOutcome>,
        kind: &DataKind,
        canvas_size: (usize, usize),
        max_resolution: u32,
        no_coverage_error: impl Fn() -> TileError,
    ) -> TileResult<QuantizedPlane> {
        let mut fetched = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Missing | FetchOutcome::Outside => {}
                FetchOutcome::Fetched { grid, resolution } => {
                    fetched.push((grid, resolution))
                }
                FetchOutcome::Failed(err) => failures.push(err),
            }
        }

        if fetched.is_empty() {
            // A failed section did intersect, so this is a data problem,
            // not a no-coverage result.
            return match failures.into_iter().next() {
                Some(err) => Err(err),
                None => Err(no_coverage_error()),
            };
        }

        for err in &failures {
            warn!(kind = kind.name.as_str(), error = %err,
                "section fetch failed; continuing with partial result");
        }

        let mut canvas = MaskedGrid::fully_masked(canvas_size.0, canvas_size.1);
        for (mut grid, resolution) in fetched {
            kind.rule.apply_input_nodata(&mut grid);
            let grid = reconcile(grid, resolution, max_resolution, canvas_size)?;
            merge_into(&mut canvas, &grid, kind.merge)?;
        }

        Ok(quantize(&canvas, &kind.rule))
    }
}

/// Reject resolution factors that cannot land exactly on the canvas.
///
/// `fetch_size` truncates, so a factor that does not divide the canvas
/// dimensions would upsample to the wrong shape. That combination is a
/// request problem, caught here before any fetch is issued.
fn validate_canvas_divisibility(
    canvas_size: (usize, usize),
    enumeration: &crate::enumerate::KeyEnumeration,
) -> TileResult<()> {
    for concrete in &enumeration.keys {
        let factor = (enumeration.max_resolution / concrete.resolution).max(1) as usize;
        if canvas_size.0 % factor != 0 || canvas_size.1 % factor != 0 {
            return Err(TileError::Validation(format!(
                "tile size {}x{} is not divisible by resolution factor {} \
                 (resolution {} of {})",
                canvas_size.0,
                canvas_size.1,
                factor,
                concrete.resolution,
                enumeration.max_resolution
            )));
        }
    }
    Ok(())
}

/// Pixel dimensions to request for a section at `resolution` so that
/// integer upsampling lands exactly on the canvas.
fn fetch_size(
    canvas_size: (usize, usize),
    resolution: u32,
    max_resolution: u32,
) -> (usize, usize) {
    let factor = (max_resolution / resolution).max(1) as usize;
    (canvas_size.0 / factor, canvas_size.1 / factor)
}

async fn fetch_tile_section(
    session: &dyn DriverSession,
    concrete: &ConcreteKey,
    tile: &TileCoord,
    tile_size: (usize, usize),
    max_resolution: u32,
) -> FetchOutcome {
    let metadata = match session.get_metadata(&concrete.key).await {
        Ok(metadata) => metadata,
        Err(TileError::DatasetNotFound(_)) => return FetchOutcome::Missing,
        Err(err) => return FetchOutcome::Failed(err),
    };

    if let Err(err) = metadata.bounds.validate() {
        return FetchOutcome::Failed(err);
    }
    if !tile_intersects(&metadata.bounds, tile) {
        return FetchOutcome::Outside;
    }

    let size = fetch_size(tile_size, concrete.resolution, max_resolution);
    // Quantization needs exact stored values, never smoothed resamples
    let options = TileReadOptions {
        preserve_values: true,
    };
    match session
        .get_tile_data(&concrete.key, tile, size, options)
        .await
    {
        Ok(grid) => FetchOutcome::Fetched {
            grid,
            resolution: concrete.resolution,
        },
        Err(err) => FetchOutcome::Failed(err),
    }
}

async fn fetch_preview_section(
    session: &dyn DriverSession,
    concrete: &ConcreteKey,
    size: (usize, usize),
    max_resolution: u32,
) -> FetchOutcome {
    match session.get_metadata(&concrete.key).await {
        Ok(_) => {}
        Err(TileError::DatasetNotFound(_)) => return FetchOutcome::Missing,
        Err(err) => return FetchOutcome::Failed(err),
    }

    let size = fetch_size(size, concrete.resolution, max_resolution);
    match session.get_preview_data(&concrete.key, size).await {
        Ok(grid) => FetchOutcome::Fetched {
            grid,
            resolution: concrete.resolution,
        },
        Err(err) => FetchOutcome::Failed(err),
    }
}
