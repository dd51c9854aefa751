//! Region compositor: samples cells, looks up tiles and paints them.

use std::path::PathBuf;

use image::RgbaImage;
use photomosaic_core::{AverageColor, Region, TileSize};
use photomosaic_library::TileLibrary;
use photomosaic_render::TileRenderer;

use crate::{MosaicError, RequestContext};

/// One cell left unpainted because its tile could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCell {
    /// Cell left edge in canvas coordinates.
    pub x: u32,
    /// Cell top edge in canvas coordinates.
    pub y: u32,
    /// Tile chosen for the cell.
    pub tile: PathBuf,
    /// Render failure description.
    pub reason: String,
}

/// Pixels and bookkeeping produced for one region.
#[derive(Debug, Clone)]
pub struct RegionComposition {
    /// Region actually composed, after clipping to the source bounds.
    pub region: Region,
    /// Region-sized RGBA buffer; unpainted cells stay transparent.
    pub image: RgbaImage,
    /// Number of cells visited.
    pub cells: usize,
    /// Cells whose tile failed to render.
    pub skipped: Vec<SkippedCell>,
}

/// Read-only inputs shared by every region of one request.
#[derive(Clone, Copy)]
pub struct Compositor<'a> {
    source: &'a RgbaImage,
    library: &'a TileLibrary,
    renderer: &'a dyn TileRenderer,
    tile_size: TileSize,
}

impl<'a> Compositor<'a> {
    /// Bundles the inputs of one mosaic request.
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
        }
    }

    /// Composes `region` of the source into a private region-sized buffer.
    ///
    /// Each cell samples the source pixel at its top-left corner, picks the
    /// nearest library tile and paints the rendered tile at the cell origin.
    /// Tiles overhanging the right or bottom edge are clipped. A tile that
    /// fails to render leaves its cell unpainted and is recorded in
    /// [`RegionComposition::skipped`].
    ///
    /// # Errors
    /// Returns [`MosaicError::EmptyLibrary`] when no tile can be matched and
    /// the context error when the request is cancelled or expires.
    pub fn compose(
        &self,
        region: Region,
        ctx: &RequestContext,
    ) -> Result<RegionComposition, MosaicError> {
        let region = region.clip(self.source.width(), self.source.height());
        let mut image = RgbaImage::new(region.width(), region.height());
        let mut cells = 0;
        let mut skipped = Vec::new();

        for cell in region.cells(self.tile_size) {
            ctx.checkpoint()?;

            let [red, green, blue, _] = self.source.get_pixel(cell.x, cell.y).0;
            let color = AverageColor::from_rgb8(red, green, blue);
            let tile = self
                .library
                .nearest(&color)
                .ok_or(MosaicError::EmptyLibrary)?;
            cells += 1;

            match self.renderer.render(&tile.key, self.tile_size) {
                Ok(block) => image::imageops::replace(
                    &mut image,
                    &block,
                    i64::from(cell.x - region.x1),
                    i64::from(cell.y - region.y1),
                ),
                Err(error) => {
                    tracing::warn!(
                        x = cell.x,
                        y = cell.y,
                        tile = %tile.key.display(),
                        error = %error,
                        "leaving cell unpainted"
                    );
                    skipped.push(SkippedCell {
                        x: cell.x,
                        y: cell.y,
                        tile: tile.key.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(RegionComposition {
            region,
            image,
            cells,
            skipped,
        })
    }
}
