#![warn(missing_docs)]
//! # photomosaic-app
//!
//! ## Purpose
//! Wires configuration, the shared tile library, the renderer and the
//! pipeline strategies into one request surface for `photomosaic`.
//!
//! ## Responsibilities
//! - Parse request parameters (tile size, strategy) into typed values.
//! - Decode an uploaded image, compose it under the configured deadline and
//!   report the result as a serializable [`MosaicResponse`].
//! - Expose library status and tile directory counters.
//!
//! ## Data flow
//! Upload bytes -> decode -> library snapshot -> strategy run -> JPEG encode ->
//! base64 response.
//!
//! ## Ownership and lifetimes
//! Each request captures one `Arc` snapshot of the library at start. A reload
//! published mid-request never changes the tiles that request sees.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Configuration problems
//! (bad tile size, unknown strategy, empty library) are distinguishable from
//! runtime failures so a caller can map them to client errors.

pub mod config;
pub mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use photomosaic_core::{CoreError, Quadrant, Region, TileSize};
use photomosaic_library::{LibraryError, LibraryHolder};
use photomosaic_mosaic::{
    MosaicError, MosaicJob, MosaicOutcome, MosaicOutput, Strategy, encode_jpeg, run,
};
use photomosaic_render::TileRenderer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::AppConfig;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("PHOTOMOSAIC_VERSION");

/// Version tag carried by every serialized response.
pub const RESPONSE_SCHEMA_VERSION: &str = "v1";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Parses a tile size form value.
///
/// # Errors
/// Returns [`AppError::InvalidTileSize`] for non-numeric input and
/// [`AppError::Core`] for zero or negative sizes.
pub fn parse_tile_size(raw: &str) -> Result<TileSize, AppError> {
    let trimmed = raw.trim();
    let pixels = trimmed
        .parse::<i64>()
        .map_err(|_| AppError::InvalidTileSize(trimmed.to_string()))?;
    Ok(TileSize::from_signed(pixels)?)
}

/// Parses a strategy name, accepting the long-form aliases.
///
/// # Errors
/// Returns [`AppError::UnknownStrategy`] for any other name.
pub fn parse_strategy(raw: &str) -> Result<Strategy, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sequential" | "no-concurrency" => Ok(Strategy::Sequential),
        "fan-out" | "fanout-channel" => Ok(Strategy::FanOut),
        "fan-in" | "fanout-fanin" => Ok(Strategy::FanIn),
        _ => Err(AppError::UnknownStrategy(raw.trim().to_string())),
    }
}

/// One mosaic request as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicRequest {
    /// Encoded source image (JPEG or PNG).
    pub image: Vec<u8>,
    /// Cell size; [`AppConfig::default_tile_size`] when `None`.
    pub tile_size: Option<TileSize>,
    /// Orchestration to run.
    pub strategy: Strategy,
}

/// A finished request with raw encoded images.
#[derive(Debug, Clone)]
pub struct CompletedRequest {
    /// Source image re-encoded as JPEG.
    pub original_jpeg: Vec<u8>,
    /// Pipeline result.
    pub outcome: MosaicOutcome,
    /// Cell size used.
    pub tile_size: TileSize,
    /// Tile count of the snapshot the request used.
    pub library_tiles: usize,
    /// Fingerprint of the snapshot the request used.
    pub library_fingerprint: String,
    /// Wall-clock time from decode to encoded output.
    pub duration: Duration,
}

impl CompletedRequest {
    /// Builds the serializable response with base64 images.
    pub fn to_response(&self) -> MosaicResponse {
        let (mosaic, parts) = match &self.outcome.output {
            MosaicOutput::Single(jpeg) => (Some(STANDARD.encode(jpeg)), Vec::new()),
            MosaicOutput::Parts(encoded) => (
                None,
                encoded
                    .iter()
                    .map(|part| PartImage {
                        label: part.quadrant.label().to_string(),
                        quadrant: part.quadrant,
                        region: part.region,
                        jpeg_base64: STANDARD.encode(&part.jpeg),
                    })
                    .collect(),
            ),
        };

        MosaicResponse {
            schema_version: RESPONSE_SCHEMA_VERSION.to_string(),
            strategy: self.outcome.strategy.name().to_string(),
            width: self.outcome.width,
            height: self.outcome.height,
            tile_size: self.tile_size.get(),
            original: STANDARD.encode(&self.original_jpeg),
            mosaic,
            parts,
            duration: format!("{:?}", self.duration),
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            cells: self.outcome.cells,
            skipped_cells: self.outcome.skipped.len(),
            library_tiles: self.library_tiles,
            library_fingerprint: self.library_fingerprint.clone(),
        }
    }
}

/// One labelled fan-out part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartImage {
    /// `part1` (top-left) through `part4` (bottom-right).
    pub label: String,
    /// Quadrant covered by the part.
    pub quadrant: Quadrant,
    /// Canvas area covered by the part.
    pub region: Region,
    /// Base64 JPEG; empty when the quadrant has no pixels.
    pub jpeg_base64: String,
}

/// Serializable result of one mosaic request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosaicResponse {
    /// Response schema version.
    pub schema_version: String,
    /// Strategy name.
    pub strategy: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Cell size in pixels.
    pub tile_size: u32,
    /// Base64 JPEG of the source image.
    pub original: String,
    /// Base64 JPEG of the whole mosaic (sequential and fan-in).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mosaic: Option<String>,
    /// Labelled parts (fan-out).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<PartImage>,
    /// Human-readable elapsed time.
    pub duration: String,
    /// Elapsed time in milliseconds.
    pub duration_ms: u64,
    /// Number of cells visited.
    pub cells: usize,
    /// Number of cells left unpainted.
    pub skipped_cells: usize,
    /// Tile count of the library snapshot used.
    pub library_tiles: usize,
    /// Fingerprint of the library snapshot used.
    pub library_fingerprint: String,
}

impl MosaicResponse {
    /// Serializes to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`AppError::Json`] if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, AppError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Runs one request end to end and keeps the raw encoded images.
///
/// # Errors
/// Returns [`AppError::Decode`] for unreadable uploads, [`AppError::Library`]
/// when the snapshot cannot be taken and [`AppError::Mosaic`] for pipeline
/// failures, including an empty library and the deadline.
pub fn process_mosaic_request(
    holder: &LibraryHolder,
    renderer: &dyn TileRenderer,
    config: &AppConfig,
    request: &MosaicRequest,
) -> Result<CompletedRequest, AppError> {
    let started = Instant::now();
    let tile_size = request.tile_size.unwrap_or(config.default_tile_size);
    let library = holder.snapshot()?;

    let source = image::load_from_memory(&request.image)
        .map_err(AppError::Decode)?
        .to_rgba8();
    let original_jpeg = encode_jpeg(&source, config.jpeg_quality)?;

    let ctx = config.request_context();
    let job = MosaicJob {
        source: &source,
        library: &library,
        renderer,
        tile_size,
        jpeg_quality: config.jpeg_quality,
    };
    let outcome = run(request.strategy, &job, &ctx)?;
    let duration = started.elapsed();

    if !outcome.skipped.is_empty() {
        tracing::warn!(
            strategy = %outcome.strategy,
            skipped = outcome.skipped.len(),
            cells = outcome.cells,
            "mosaic finished with unpainted cells"
        );
    }

    Ok(CompletedRequest {
        original_jpeg,
        outcome,
        tile_size,
        library_tiles: library.len(),
        library_fingerprint: library.fingerprint(),
        duration,
    })
}

/// Runs one request and returns its serializable response.
///
/// # Errors
/// Same as [`process_mosaic_request`].
pub fn handle_mosaic_request(
    holder: &LibraryHolder,
    renderer: &dyn TileRenderer,
    config: &AppConfig,
    request: &MosaicRequest,
) -> Result<MosaicResponse, AppError> {
    process_mosaic_request(holder, renderer, config, request)
        .map(|completed| completed.to_response())
}

/// Writes the mosaic next to `output`.
///
/// A single mosaic goes to `output`; fan-out parts go to
/// `<stem>_part1.<ext>` through `<stem>_part4.<ext>`. Returns written paths.
///
/// # Errors
/// Returns [`AppError::Io`] when a file cannot be written.
pub fn write_outputs(output: &Path, outcome: &MosaicOutcome) -> Result<Vec<PathBuf>, AppError> {
    let targets: Vec<(PathBuf, &[u8])> = match &outcome.output {
        MosaicOutput::Single(jpeg) => vec![(output.to_path_buf(), jpeg.as_slice())],
        MosaicOutput::Parts(parts) => parts
            .iter()
            .map(|part| (part_path(output, part.quadrant), part.jpeg.as_slice()))
            .collect(),
    };

    for (path, bytes) in &targets {
        fs::write(path, bytes).map_err(|source| AppError::Io {
            path: path.clone(),
            source,
        })?;
    }
    Ok(targets.into_iter().map(|(path, _)| path).collect())
}

fn part_path(output: &Path, quadrant: Quadrant) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mosaic".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{stem}_{}.{}", quadrant.label(), ext.to_string_lossy()),
        None => format!("{stem}_{}", quadrant.label()),
    };
    output.with_file_name(name)
}

/// Summary of the current library snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStatus {
    /// Number of usable tiles.
    pub tiles: usize,
    /// Files skipped during the last build.
    pub skipped_files: usize,
    /// Snapshot fingerprint.
    pub fingerprint: String,
}

/// Reports the tile count of the current snapshot.
///
/// # Errors
/// Returns [`AppError::Library`] when the snapshot lock is poisoned.
pub fn library_status(holder: &LibraryHolder) -> Result<LibraryStatus, AppError> {
    let library = holder.snapshot()?;
    Ok(LibraryStatus {
        tiles: library.len(),
        skipped_files: library.skipped_files(),
        fingerprint: library.fingerprint(),
    })
}

/// Counts regular files in the tile directory.
///
/// # Errors
/// Returns [`AppError::Io`] when the directory cannot be read.
pub fn count_tile_files(dir: impl AsRef<Path>) -> Result<usize, AppError> {
    let dir = dir.as_ref();
    let io_error = |source| AppError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut count = 0;
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if entry.file_type().map_err(io_error)?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Builds a holder from the configured tile directory.
///
/// # Errors
/// Returns [`AppError::Library`] when the directory cannot be read.
pub fn load_library(config: &AppConfig) -> Result<LibraryHolder, AppError> {
    let holder = LibraryHolder::default();
    holder.reload(&config.tiles_dir)?;
    Ok(holder)
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Tile size form value is not a number.
    #[error("invalid tile size {0:?}: expected a positive integer")]
    InvalidTileSize(String),
    /// Strategy name is not recognized.
    #[error("unknown strategy {0:?}: expected sequential, fan-out or fan-in")]
    UnknownStrategy(String),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Tile library error.
    #[error("library error: {0}")]
    Library(#[from] LibraryError),
    /// Mosaic pipeline error.
    #[error("mosaic error: {0}")]
    Mosaic(#[from] MosaicError),
    /// Uploaded bytes are not a decodable image.
    #[error("failed to decode source image: {0}")]
    Decode(image::ImageError),
    /// Filesystem error.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Response serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Returns `true` when the caller supplied bad input or configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidTileSize(_)
                | AppError::UnknownStrategy(_)
                | AppError::Core(_)
                | AppError::Decode(_)
                | AppError::Mosaic(MosaicError::EmptyLibrary | MosaicError::EmptySource { .. })
        )
    }
}
