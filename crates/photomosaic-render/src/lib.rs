#![warn(missing_docs)]
//! # photomosaic-render
//!
//! ## Purpose
//! Turns a tile key chosen by nearest-color lookup into a square pixel block
//! ready to paint into one mosaic cell.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`TileRenderer`] trait.
//! - Render tiles from image files on disk ([`FileTileRenderer`]).
//! - Render deterministic flat-color tiles from library colors for tests and
//!   benchmarks ([`SolidColorRenderer`]).
//!
//! ## Data flow
//! Region compositor picks a tile key -> [`TileRenderer::render`] -> RGBA
//! block of `cell_size x cell_size` pixels -> painted into the region canvas.
//!
//! ## Ownership and lifetimes
//! Rendered tiles are owned buffers; renderers are shared by reference across
//! region threads and must be `Send + Sync`.
//!
//! ## Error model
//! Open and decode failures are reported as [`RenderError`]. Callers treat
//! them as per-cell failures and leave the cell unpainted.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::FilterType;
use photomosaic_core::TileSize;
use photomosaic_library::TileLibrary;
use thiserror::Error;

/// Trait implemented by tile rendering backends.
pub trait TileRenderer: Send + Sync {
    /// Renders the tile identified by `key` as a `cell_size x cell_size` block.
    ///
    /// # Errors
    /// Returns [`RenderError`] when the tile cannot be produced.
    fn render(&self, key: &Path, cell_size: TileSize) -> Result<RgbaImage, RenderError>;
}

/// Renders tiles by opening, decoding and resizing image files.
#[derive(Debug, Clone, Copy)]
pub struct FileTileRenderer {
    filter: FilterType,
}

impl FileTileRenderer {
    /// Creates a renderer using nearest-neighbour resampling.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Nearest,
        }
    }

    /// Creates a renderer with an explicit resampling filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for FileTileRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRenderer for FileTileRenderer {
    fn render(&self, key: &Path, cell_size: TileSize) -> Result<RgbaImage, RenderError> {
        let bytes = std::fs::read(key).map_err(|source| RenderError::Open {
            path: key.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| RenderError::Decode {
            path: key.to_path_buf(),
            source,
        })?;

        let edge = cell_size.get();
        Ok(image::imageops::resize(
            &decoded.to_rgba8(),
            edge,
            edge,
            self.filter,
        ))
    }
}

/// Deterministic renderer painting each tile in its library color.
///
/// Keys missing from the library fail with [`RenderError::UnknownTile`],
/// which makes the partial-failure path easy to exercise.
#[derive(Debug, Clone, Default)]
pub struct SolidColorRenderer {
    library: TileLibrary,
}

impl SolidColorRenderer {
    /// Creates a renderer backed by `library` colors.
    pub fn new(library: TileLibrary) -> Self {
        Self { library }
    }
}

impl TileRenderer for SolidColorRenderer {
    fn render(&self, key: &Path, cell_size: TileSize) -> Result<RgbaImage, RenderError> {
        let color = self
            .library
            .color_of(key)
            .ok_or_else(|| RenderError::UnknownTile(key.to_path_buf()))?;
        let [red, green, blue] = color.to_rgb8();
        let edge = cell_size.get();

        Ok(RgbaImage::from_pixel(
            edge,
            edge,
            image::Rgba([red, green, blue, 255]),
        ))
    }
}

/// Tile rendering error type.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tile file could not be opened or read.
    #[error("cannot open tile {}: {source}", path.display())]
    Open {
        /// Tile file path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Tile file could not be decoded.
    #[error("cannot decode tile {}: {source}", path.display())]
    Decode {
        /// Tile file path.
        path: PathBuf,
        /// Underlying decoder failure.
        source: image::ImageError,
    },
    /// Tile key is not known to the renderer.
    #[error("unknown tile {}", .0.display())]
    UnknownTile(PathBuf),
}
