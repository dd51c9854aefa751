#![warn(missing_docs)]
//! # photomosaic-library
//!
//! ## Purpose
//! Indexes a directory of tile photographs by average color and answers
//! nearest-color queries.
//!
//! ## Responsibilities
//! - Build a [`TileLibrary`] from a tile directory, skipping unreadable files.
//! - Answer [`TileLibrary::nearest`] queries by linear Euclidean scan.
//! - Publish immutable snapshots through [`LibraryHolder`] so background
//!   reloads never disturb in-flight requests.
//!
//! ## Data flow
//! Tile directory -> [`TileLibrary::build`] -> [`LibraryHolder::replace`] ->
//! request captures [`LibraryHolder::snapshot`] -> region tasks call
//! [`TileLibrary::nearest`] per cell.
//!
//! ## Ownership and lifetimes
//! A library is never mutated after construction. Snapshots are shared as
//! `Arc<TileLibrary>`; a reload swaps the holder's pointer and leaves every
//! previously handed-out snapshot intact.
//!
//! ## Error model
//! An unreadable tile directory fails the build with [`LibraryError`]. A tile
//! file that cannot be read or decoded is logged and skipped.

mod holder;

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use photomosaic_core::AverageColor;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use holder::LibraryHolder;

/// One indexed tile image.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEntry {
    /// Stable tile identity; the tile file path for directory-built libraries.
    pub key: PathBuf,
    /// Mean RGB color of the decoded tile.
    pub color: AverageColor,
}

/// Immutable mapping from tile key to average color.
///
/// Entry order is the mapping order used to break distance ties in
/// [`TileLibrary::nearest`]; directory builds order entries by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileLibrary {
    entries: Vec<TileEntry>,
    skipped_files: usize,
}

impl TileLibrary {
    /// Creates a library from already-computed entries, keeping their order.
    pub fn from_entries(entries: Vec<TileEntry>) -> Self {
        Self {
            entries,
            skipped_files: 0,
        }
    }

    /// Scans `dir`, decodes every file and records its average color.
    ///
    /// Files that fail to open or decode are skipped with a warning. An
    /// empty directory yields an empty library.
    ///
    /// # Errors
    /// Returns [`LibraryError::ReadDir`] when the directory cannot be listed.
    pub fn build(dir: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let dir = dir.as_ref();
        let listing = fs::read_dir(dir).map_err(|source| LibraryError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = listing
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        let mut skipped_files = 0;
        for path in paths {
            match tile_average_color(&path) {
                Ok(color) => entries.push(TileEntry { key: path, color }),
                Err(error) => {
                    skipped_files += 1;
                    tracing::warn!(
                        tile = %path.display(),
                        error = %error,
                        "skipping tile that could not be indexed"
                    );
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            tiles = entries.len(),
            skipped = skipped_files,
            "tile library built"
        );

        Ok(Self {
            entries,
            skipped_files,
        })
    }

    /// Returns the key of the tile whose color is closest to `color`.
    ///
    /// Ties keep the first entry in mapping order. Returns `None` for an empty
    /// library.
    pub fn nearest(&self, color: &AverageColor) -> Option<&TileEntry> {
        let mut best: Option<(&TileEntry, f64)> = None;
        for entry in &self.entries {
            let distance = color.distance(&entry.color);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((entry, distance)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Looks up the color recorded for `key`.
    pub fn color_of(&self, key: &Path) -> Option<AverageColor> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.color)
    }

    /// Indexed entries in mapping order.
    pub fn entries(&self) -> &[TileEntry] {
        &self.entries
    }

    /// Number of indexed tiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no tiles are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of directory files skipped during the build.
    pub fn skipped_files(&self) -> usize {
        self.skipped_files
    }

    /// Hex SHA-256 digest over keys and colors in mapping order.
    ///
    /// Two libraries with the same fingerprint answer every `nearest` query
    /// identically.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.key.to_string_lossy().as_bytes());
            hasher.update([0_u8]);
            for channel in entry.color.0 {
                hasher.update(channel.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Computes the mean RGB color over every pixel of `image`.
///
/// Returns `None` for an image without pixels.
pub fn average_color(image: &DynamicImage) -> Option<AverageColor> {
    let rgb = image.to_rgb8();
    let pixel_count = u64::from(rgb.width()) * u64::from(rgb.height());
    if pixel_count == 0 {
        return None;
    }

    let mut sums = [0_u64; 3];
    for pixel in rgb.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    Some(AverageColor(
        sums.map(|sum| sum as f64 / pixel_count as f64),
    ))
}

fn tile_average_color(path: &Path) -> Result<AverageColor, LibraryError> {
    let bytes = fs::read(path).map_err(|source| LibraryError::ReadTile {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| LibraryError::DecodeTile {
        path: path.to_path_buf(),
        source,
    })?;
    average_color(&decoded).ok_or_else(|| LibraryError::EmptyTile(path.to_path_buf()))
}

/// Error type for library construction and snapshot publication.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Tile directory could not be listed.
    #[error("cannot read tile directory {}: {source}", dir.display())]
    ReadDir {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// One tile file could not be read.
    #[error("cannot read tile {}: {source}", path.display())]
    ReadTile {
        /// Tile file path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// One tile file could not be decoded.
    #[error("cannot decode tile {}: {source}", path.display())]
    DecodeTile {
        /// Tile file path.
        path: PathBuf,
        /// Underlying decoder failure.
        source: image::ImageError,
    },
    /// Tile decoded to an image without pixels.
    #[error("tile {} has no pixels", .0.display())]
    EmptyTile(PathBuf),
    /// Snapshot holder lock was poisoned by a panicking writer.
    #[error("tile library holder lock poisoned")]
    LockPoisoned,
    /// Background reload thread could not be started.
    #[error("failed to spawn tile library reload: {0}")]
    Spawn(std::io::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for nearest-color lookup.

    use super::*;

    fn entry(key: &str, red: u8, green: u8, blue: u8) -> TileEntry {
        TileEntry {
            key: PathBuf::from(key),
            color: AverageColor::from_rgb8(red, green, blue),
        }
    }

    #[test]
    fn nearest_selects_black_and_white_tiles() {
        let library =
            TileLibrary::from_entries(vec![entry("A", 0, 0, 0), entry("B", 255, 255, 255)]);

        let black = library.nearest(&AverageColor::from_rgb8(0, 0, 0)).unwrap();
        let white = library.nearest(&AverageColor::from_rgb8(250, 250, 250)).unwrap();

        assert_eq!(black.key, PathBuf::from("A"));
        assert_eq!(white.key, PathBuf::from("B"));
    }

    #[test]
    fn nearest_breaks_ties_by_mapping_order() {
        let library =
            TileLibrary::from_entries(vec![entry("first", 10, 10, 10), entry("second", 30, 30, 30)]);

        let chosen = library.nearest(&AverageColor::from_rgb8(20, 20, 20)).unwrap();
        assert_eq!(chosen.key, PathBuf::from("first"));
    }

    #[test]
    fn nearest_on_empty_library_is_none() {
        let library = TileLibrary::default();
        assert!(library.nearest(&AverageColor::from_rgb8(1, 2, 3)).is_none());
    }

    #[test]
    fn fingerprint_depends_on_contents() {
        let a = TileLibrary::from_entries(vec![entry("A", 0, 0, 0)]);
        let b = TileLibrary::from_entries(vec![entry("A", 0, 0, 1)]);

        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn average_color_of_two_pixel_image() {
        let mut image = image::RgbImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgb([0, 100, 200]));
        image.put_pixel(1, 0, image::Rgb([100, 100, 0]));

        let color = average_color(&DynamicImage::ImageRgb8(image)).unwrap();
        assert_eq!(color, AverageColor([50.0, 100.0, 100.0]));
    }
}
