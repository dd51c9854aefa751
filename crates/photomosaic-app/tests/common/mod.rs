//! Shared fixtures for app integration tests.

use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use photomosaic_app::AppConfig;
use photomosaic_core::AverageColor;
use photomosaic_library::{TileEntry, TileLibrary};

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

/// PNG-encoded gradient upload.
#[allow(dead_code)]
pub fn png_upload(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("png fixture should encode");
    bytes.into_inner()
}

/// Config with defaults and no environment influence.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|_| None)
}
