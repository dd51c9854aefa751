//! The three pipeline strategies over the region compositor.

use std::fmt;
use std::time::{Duration, Instant};

use image::RgbaImage;
use photomosaic_core::{Quadrant, Region, TileSize, partition_quadrants};
use photomosaic_library::TileLibrary;
use photomosaic_render::TileRenderer;

use crate::canvas::{encode_jpeg, paint_region};
use crate::compose::{Compositor, SkippedCell};
use crate::merge::merge_regions;
use crate::tasks::run_region_tasks;
use crate::{MosaicError, RequestContext};

/// JPEG quality used when a caller has no preference.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Orchestration used to compose a mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Quadrants composed one after another on the calling thread.
    Sequential,
    /// Four threads, each encoding its own quadrant independently.
    FanOut,
    /// Four threads whose quadrants are merged into one canvas.
    FanIn,
}

impl Strategy {
    /// Every strategy, in documentation order.
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::FanOut, Strategy::FanIn];

    /// Stable strategy name used in logs and responses.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::FanOut => "fan-out",
            Strategy::FanIn => "fan-in",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs of one mosaic request.
#[derive(Clone, Copy)]
pub struct MosaicJob<'a> {
    /// Decoded source image.
    pub source: &'a RgbaImage,
    /// Library snapshot captured at request start.
    pub library: &'a TileLibrary,
    /// Tile rendering backend.
    pub renderer: &'a dyn TileRenderer,
    /// Cell edge length.
    pub tile_size: TileSize,
    /// JPEG quality for every encode of the request.
    pub jpeg_quality: u8,
}

impl<'a> MosaicJob<'a> {
    /// Creates a job with [`DEFAULT_JPEG_QUALITY`].
    pub fn new(
        source: &'a RgbaImage,
        library: &'a TileLibrary,
        renderer: &'a dyn TileRenderer,
        tile_size: TileSize,
    ) -> Self {
        Self {
            source,
            library,
            renderer,
            tile_size,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Rejects configuration errors before any region work starts.
    ///
    /// # Errors
    /// Returns [`MosaicError::EmptyLibrary`] or [`MosaicError::EmptySource`].
    pub fn validate(&self) -> Result<(), MosaicError> {
        if self.library.is_empty() {
            return Err(MosaicError::EmptyLibrary);
        }
        let (width, height) = self.source.dimensions();
        if width == 0 || height == 0 {
            return Err(MosaicError::EmptySource { width, height });
        }
        Ok(())
    }

    fn compositor(&self) -> Compositor<'a> {
        Compositor::new(self.source, self.library, self.renderer, self.tile_size)
    }

    fn regions(&self) -> [Region; 4] {
        partition_quadrants(self.source.width(), self.source.height())
    }
}

/// Fully painted canvas awaiting encoding.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Canvas with the source image dimensions.
    pub canvas: RgbaImage,
    /// Number of cells visited.
    pub cells: usize,
    /// Cells left unpainted.
    pub skipped: Vec<SkippedCell>,
}

/// One independently encoded quadrant of a fan-out mosaic.
#[derive(Debug, Clone)]
pub struct EncodedPart {
    /// Quadrant this part covers; fixes its `part1..part4` label.
    pub quadrant: Quadrant,
    /// Canvas area of the part.
    pub region: Region,
    /// JPEG bytes; empty when the quadrant has no pixels.
    pub jpeg: Vec<u8>,
    /// Number of cells visited.
    pub cells: usize,
    /// Cells left unpainted.
    pub skipped: Vec<SkippedCell>,
}

/// Encoded output of a strategy.
#[derive(Debug, Clone)]
pub enum MosaicOutput {
    /// One JPEG for the whole canvas (sequential and fan-in).
    Single(Vec<u8>),
    /// Four JPEGs in [`Quadrant::ALL`] order (fan-out).
    Parts(Vec<EncodedPart>),
}

/// Result of one mosaic request.
#[derive(Debug, Clone)]
pub struct MosaicOutcome {
    /// Strategy that produced the output.
    pub strategy: Strategy,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Encoded image or parts.
    pub output: MosaicOutput,
    /// Number of cells visited.
    pub cells: usize,
    /// Cells left unpainted.
    pub skipped: Vec<SkippedCell>,
    /// Wall-clock time from validation to encoded output.
    pub elapsed: Duration,
}

/// Composes every quadrant on the calling thread into one canvas.
///
/// # Errors
/// Returns configuration errors from [`MosaicJob::validate`] and any region
/// or context failure.
pub fn compose_sequential(
    job: &MosaicJob<'_>,
    ctx: &RequestContext,
) -> Result<Composition, MosaicError> {
    job.validate()?;
    let compositor = job.compositor();
    let mut canvas = RgbaImage::new(job.source.width(), job.source.height());
    let mut cells = 0;
    let mut skipped = Vec::new();

    for region in job.regions() {
        let part = compositor.compose(region, ctx)?;
        paint_region(&mut canvas, part.region, &part.image);
        cells += part.cells;
        skipped.extend(part.skipped);
    }

    Ok(Composition {
        canvas,
        cells,
        skipped,
    })
}

/// Composes the quadrants concurrently and merges them into one canvas.
///
/// # Errors
/// Returns configuration errors from [`MosaicJob::validate`], region task
/// failures and merge failures.
pub fn compose_fan_in(
    job: &MosaicJob<'_>,
    ctx: &RequestContext,
) -> Result<Composition, MosaicError> {
    job.validate()?;
    let compositor = job.compositor();
    let work = |_quadrant: Quadrant, region: Region| compositor.compose(region, ctx);

    let parts = run_region_tasks(job.regions(), ctx, &work)?;
    merge_regions(job.source.width(), job.source.height(), parts)
}

/// Composes and encodes the quadrants concurrently, one JPEG per quadrant.
///
/// # Errors
/// Returns configuration errors from [`MosaicJob::validate`], region task
/// failures and encoder failures.
pub fn compose_fan_out(
    job: &MosaicJob<'_>,
    ctx: &RequestContext,
) -> Result<Vec<EncodedPart>, MosaicError> {
    job.validate()?;
    let compositor = job.compositor();
    let quality = job.jpeg_quality;
    let work = |quadrant: Quadrant, region: Region| -> Result<EncodedPart, MosaicError> {
        let part = compositor.compose(region, ctx)?;
        let jpeg = encode_jpeg(&part.image, quality)?;
        Ok(EncodedPart {
            quadrant,
            region: part.region,
            jpeg,
            cells: part.cells,
            skipped: part.skipped,
        })
    };

    let parts = run_region_tasks(job.regions(), ctx, &work)?;
    Ok(parts.into_iter().map(|(_, part)| part).collect())
}

/// Runs `strategy` end to end and encodes its output.
///
/// # Errors
/// Returns any [`MosaicError`] raised by the chosen strategy.
pub fn run(
    strategy: Strategy,
    job: &MosaicJob<'_>,
    ctx: &RequestContext,
) -> Result<MosaicOutcome, MosaicError> {
    let started = Instant::now();
    let (width, height) = job.source.dimensions();
    tracing::info!(
        strategy = %strategy,
        width,
        height,
        tile_size = job.tile_size.get(),
        tiles = job.library.len(),
        "mosaic request started"
    );

    let (output, cells, skipped) = match strategy {
        Strategy::Sequential | Strategy::FanIn => {
            let composition = if strategy == Strategy::Sequential {
                compose_sequential(job, ctx)?
            } else {
                compose_fan_in(job, ctx)?
            };
            let jpeg = encode_jpeg(&composition.canvas, job.jpeg_quality)?;
            (
                MosaicOutput::Single(jpeg),
                composition.cells,
                composition.skipped,
            )
        }
        Strategy::FanOut => {
            let parts = compose_fan_out(job, ctx)?;
            let cells = parts.iter().map(|part| part.cells).sum();
            let skipped = parts
                .iter()
                .flat_map(|part| part.skipped.iter().cloned())
                .collect();
            (MosaicOutput::Parts(parts), cells, skipped)
        }
    };

    let elapsed = started.elapsed();
    tracing::info!(
        strategy = %strategy,
        cells,
        skipped = skipped.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "mosaic request finished"
    );

    Ok(MosaicOutcome {
        strategy,
        width,
        height,
        output,
        cells,
        skipped,
        elapsed,
    })
}
