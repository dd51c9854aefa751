//! Shared fixtures for mosaic integration tests.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use photomosaic_core::AverageColor;
use photomosaic_library::{TileEntry, TileLibrary};

/// Two-tile library: `A` is black, `B` is white.
#[allow(dead_code)]
pub fn black_and_white_library() -> TileLibrary {
    TileLibrary::from_entries(vec![
        TileEntry {
            key: PathBuf::from("A"),
            color: AverageColor::from_rgb8(0, 0, 0),
        },
        TileEntry {
            key: PathBuf::from("B"),
            color: AverageColor::from_rgb8(255, 255, 255),
        },
    ])
}

/// Eight-tile library spanning the RGB cube corners.
#[allow(dead_code)]
pub fn corner_library() -> TileLibrary {
    let mut entries = Vec::new();
    for index in 0..8_u8 {
        let channel = |bit: u8| if index & bit != 0 { 255 } else { 0 };
        entries.push(TileEntry {
            key: PathBuf::from(format!("corner-{index}")),
            color: AverageColor::from_rgb8(channel(1), channel(2), channel(4)),
        });
    }
    TileLibrary::from_entries(entries)
}

/// Deterministic color gradient source image.
#[allow(dead_code)]
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) * 31 % 256) as u8,
            255,
        ])
    })
}
