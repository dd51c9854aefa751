#![warn(missing_docs)]
//! # photomosaic-core
//!
//! ## Purpose
//! Defines the pure geometry and color model shared by the `photomosaic`
//! workspace.
//!
//! ## Responsibilities
//! - Represent average tile colors and the distance metric between them.
//! - Represent canvas regions and their four-way quadrant partition.
//! - Validate cell sizes and enumerate the cells covering a region.
//!
//! ## Data flow
//! The pipeline partitions the canvas with [`partition_quadrants`], then walks
//! each [`Region`] cell by cell via [`Region::cells`], sampling an
//! [`AverageColor`] for every [`Cell`].
//!
//! ## Ownership and lifetimes
//! Every type here is a small `Copy` value; nothing borrows pixel memory.
//!
//! ## Error model
//! Invalid cell sizes return [`CoreError`] so callers can reject a request
//! before any composition work starts.
//!
//! ## Example
//! ```rust
//! use photomosaic_core::{partition_quadrants, Quadrant, TileSize};
//!
//! let regions = partition_quadrants(5, 3);
//! assert_eq!(regions[Quadrant::TopLeft.index()].width(), 2);
//! assert_eq!(regions[Quadrant::BottomRight.index()].width(), 3);
//! assert!(TileSize::new(0).is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean red, green and blue channel values on the 0..=255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageColor(pub [f64; 3]);

impl AverageColor {
    /// Builds a color from 8-bit channel values.
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self([f64::from(red), f64::from(green), f64::from(blue)])
    }

    /// Euclidean distance between two colors in RGB space.
    pub fn distance(&self, other: &AverageColor) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Rounds each channel back to an 8-bit value.
    pub fn to_rgb8(&self) -> [u8; 3] {
        self.0.map(|channel| channel.round().clamp(0.0, 255.0) as u8)
    }
}

/// Validated edge length, in pixels, of one square mosaic cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize(u32);

impl TileSize {
    /// Cell size used when a request does not name one.
    pub const DEFAULT: TileSize = TileSize(15);

    /// Creates a validated tile size.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTileSize`] when `pixels == 0`.
    pub fn new(pixels: u32) -> Result<Self, CoreError> {
        if pixels == 0 {
            return Err(CoreError::InvalidTileSize(i64::from(pixels)));
        }
        Ok(Self(pixels))
    }

    /// Creates a tile size from a signed value such as a parsed form field.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTileSize`] for zero, negative or
    /// out-of-range values.
    pub fn from_signed(pixels: i64) -> Result<Self, CoreError> {
        let pixels = u32::try_from(pixels).map_err(|_| CoreError::InvalidTileSize(pixels))?;
        Self::new(pixels)
    }

    /// Edge length in pixels.
    pub fn get(&self) -> u32 {
        self.0
    }
}

/// One of the four canvas partitions, in the fixed `part1..part4` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// `[0, mid_x) x [0, mid_y)`
    TopLeft,
    /// `[mid_x, width) x [0, mid_y)`
    TopRight,
    /// `[0, mid_x) x [mid_y, height)`
    BottomLeft,
    /// `[mid_x, width) x [mid_y, height)`
    BottomRight,
}

impl Quadrant {
    /// All quadrants in delivery order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Position of this quadrant in [`Quadrant::ALL`].
    pub fn index(self) -> usize {
        match self {
            Quadrant::TopLeft => 0,
            Quadrant::TopRight => 1,
            Quadrant::BottomLeft => 2,
            Quadrant::BottomRight => 3,
        }
    }

    /// Stable result label (`part1` .. `part4`).
    pub fn label(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "part1",
            Quadrant::TopRight => "part2",
            Quadrant::BottomLeft => "part3",
            Quadrant::BottomRight => "part4",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Half-open rectangle `[x1, x2) x [y1, y2)` in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Inclusive left edge.
    pub x1: u32,
    /// Inclusive top edge.
    pub y1: u32,
    /// Exclusive right edge.
    pub x2: u32,
    /// Exclusive bottom edge.
    pub y2: u32,
}

impl Region {
    /// Creates a region, normalizing inverted edges to an empty rectangle.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x1,
            y1,
            x2: x2.max(x1),
            y2: y2.max(y1),
        }
    }

    /// Region covering a whole `width x height` canvas.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Returns `true` when the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns `true` when `(x, y)` lies inside the region.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Returns `true` when the two regions share at least one pixel.
    pub fn overlaps(&self, other: &Region) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x1 < other.x2
            && other.x1 < self.x2
            && self.y1 < other.y2
            && other.y1 < self.y2
    }

    /// Clips the region to a `width x height` canvas.
    pub fn clip(&self, width: u32, height: u32) -> Region {
        let x1 = self.x1.min(width);
        let y1 = self.y1.min(height);
        Region::new(x1, y1, self.x2.min(width), self.y2.min(height))
    }

    /// Iterates the cells covering this region in row-major order.
    ///
    /// Cells are aligned to the region origin; cells on the right and bottom
    /// edges are clipped to the region when its size is not a multiple of
    /// `tile_size`.
    pub fn cells(&self, tile_size: TileSize) -> Cells {
        Cells {
            region: *self,
            step: tile_size.get(),
            next_x: self.x1,
            next_y: self.y1,
        }
    }
}

/// One tile-aligned square of a region, clipped to the region edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Left edge in canvas coordinates; also the sampled pixel column.
    pub x: u32,
    /// Top edge in canvas coordinates; also the sampled pixel row.
    pub y: u32,
    /// Visible width after clipping.
    pub width: u32,
    /// Visible height after clipping.
    pub height: u32,
}

/// Row-major cell iterator returned by [`Region::cells`].
#[derive(Debug, Clone)]
pub struct Cells {
    region: Region,
    step: u32,
    next_x: u32,
    next_y: u32,
}

impl Iterator for Cells {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.region.is_empty() || self.next_y >= self.region.y2 {
            return None;
        }

        let cell = Cell {
            x: self.next_x,
            y: self.next_y,
            width: self.step.min(self.region.x2 - self.next_x),
            height: self.step.min(self.region.y2 - self.next_y),
        };

        self.next_x = self.next_x.saturating_add(self.step);
        if self.next_x >= self.region.x2 {
            self.next_x = self.region.x1;
            self.next_y = self.next_y.saturating_add(self.step);
        }

        Some(cell)
    }
}

/// Splits a `width x height` canvas into four quadrants at
/// `(width / 2, height / 2)`.
///
/// The result is indexed by [`Quadrant::index`]. With odd dimensions the right
/// and bottom quadrants are one pixel larger; with a dimension of 1 the left
/// or top quadrants are empty. The four regions never overlap and together
/// cover every pixel exactly once.
pub fn partition_quadrants(width: u32, height: u32) -> [Region; 4] {
    let mid_x = width / 2;
    let mid_y = height / 2;

    [
        Region::new(0, 0, mid_x, mid_y),
        Region::new(mid_x, 0, width, mid_y),
        Region::new(0, mid_y, mid_x, height),
        Region::new(mid_x, mid_y, width, height),
    ]
}

/// Error type for core geometry validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Cell size must be a positive pixel count.
    #[error("invalid tile size {0}: must be a positive number of pixels")]
    InvalidTileSize(i64),
}

#[cfg(test)]
mod tests {
    //! Unit tests for color and geometry primitives.

    use super::*;

    #[test]
    fn distance_matches_euclidean_norm() {
        let a = AverageColor([1.0, 2.0, 3.0]);
        let b = AverageColor([4.0, 5.0, 6.0]);
        assert!((a.distance(&b) - 5.196152422706632).abs() < 1e-12);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn cells_clip_on_right_and_bottom_edges() {
        let region = Region::new(0, 0, 5, 3);
        let cells: Vec<Cell> = region.cells(TileSize::new(2).unwrap()).collect();

        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell { x: 0, y: 0, width: 2, height: 2 });
        assert_eq!(cells[2], Cell { x: 4, y: 0, width: 1, height: 2 });
        assert_eq!(cells[5], Cell { x: 4, y: 2, width: 1, height: 1 });
    }

    #[test]
    fn cells_are_aligned_to_region_origin() {
        let region = Region::new(3, 1, 7, 3);
        let origins: Vec<(u32, u32)> = region
            .cells(TileSize::new(2).unwrap())
            .map(|cell| (cell.x, cell.y))
            .collect();
        assert_eq!(origins, vec![(3, 1), (5, 1)]);
    }

    #[test]
    fn empty_region_has_no_cells() {
        let region = Region::new(0, 0, 0, 4);
        assert_eq!(region.cells(TileSize::new(1).unwrap()).count(), 0);
    }

    #[test]
    fn signed_tile_sizes_reject_non_positive_values() {
        assert_eq!(
            TileSize::from_signed(-3),
            Err(CoreError::InvalidTileSize(-3))
        );
        assert!(TileSize::from_signed(0).is_err());
        assert_eq!(TileSize::from_signed(15).map(|size| size.get()), Ok(15));
    }
}
