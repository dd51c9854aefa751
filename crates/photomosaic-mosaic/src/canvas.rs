//! Canvas painting, quadrant splitting and JPEG encoding.

use image::RgbaImage;
use image::codecs::jpeg::JpegEncoder;
use photomosaic_core::{Quadrant, Region, partition_quadrants};

use crate::MosaicError;

const RGBA_CHANNELS: usize = 4;

/// Copies a composed region onto `canvas` at the region origin.
pub(crate) fn paint_region(canvas: &mut RgbaImage, region: Region, part: &RgbaImage) {
    image::imageops::replace(canvas, part, i64::from(region.x1), i64::from(region.y1));
}

/// Exclusive write access to one quadrant of a canvas.
///
/// Holds one mutable row slice per canvas row of the quadrant. Views produced
/// by [`split_quadrants`] borrow disjoint bytes, so they can be painted from
/// different threads without locking.
#[derive(Debug)]
pub(crate) struct QuadrantView<'a> {
    quadrant: Quadrant,
    region: Region,
    rows: Vec<&'a mut [u8]>,
}

impl QuadrantView<'_> {
    /// Copies `part` into the quadrant.
    ///
    /// # Errors
    /// Returns [`MosaicError::GeometryMismatch`] when `part` is not exactly
    /// the quadrant size.
    pub(crate) fn paint(self, part: &RgbaImage) -> Result<(), MosaicError> {
        let expected = (self.region.width(), self.region.height());
        if part.dimensions() != expected {
            return Err(MosaicError::GeometryMismatch {
                quadrant: self.quadrant,
                expected,
                actual: part.dimensions(),
            });
        }
        if self.region.is_empty() {
            return Ok(());
        }

        let row_len = self.region.width() as usize * RGBA_CHANNELS;
        for (target, source) in self.rows.into_iter().zip(part.as_raw().chunks_exact(row_len)) {
            target.copy_from_slice(source);
        }
        Ok(())
    }
}

/// Splits `canvas` into four disjoint quadrant views, indexed by
/// [`Quadrant::index`] and laid out by [`partition_quadrants`].
pub(crate) fn split_quadrants(canvas: &mut RgbaImage) -> [QuadrantView<'_>; 4] {
    let (width, height) = canvas.dimensions();
    let regions = partition_quadrants(width, height);
    let mid_x = regions[Quadrant::TopRight.index()].x1 as usize;
    let mid_y = regions[Quadrant::BottomLeft.index()].y1;

    let mut views = Quadrant::ALL.map(|quadrant| {
        let region = regions[quadrant.index()];
        QuadrantView {
            quadrant,
            region,
            rows: Vec::with_capacity(region.height() as usize),
        }
    });

    let stride = width as usize * RGBA_CHANNELS;
    if stride == 0 {
        return views;
    }

    let buffer: &mut [u8] = canvas;
    for (y, row) in buffer.chunks_exact_mut(stride).enumerate() {
        // Invariant: left half is [0, mid_x), right half is [mid_x, width).
        let (left, right) = row.split_at_mut(mid_x * RGBA_CHANNELS);
        let (left_quadrant, right_quadrant) = if (y as u32) < mid_y {
            (Quadrant::TopLeft, Quadrant::TopRight)
        } else {
            (Quadrant::BottomLeft, Quadrant::BottomRight)
        };
        views[left_quadrant.index()].rows.push(left);
        views[right_quadrant.index()].rows.push(right);
    }

    views
}

/// Encodes `image` as JPEG, dropping the alpha channel.
///
/// Unpainted (transparent) pixels encode as black. An image without pixels
/// encodes to an empty byte vector.
///
/// # Errors
/// Returns [`MosaicError::Encode`] when the encoder fails.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, MosaicError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let rgb = rgba_to_rgb(image.as_raw());
    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, quality.clamp(1, 100)).encode(
        &rgb,
        width,
        height,
        image::ColorType::Rgb8.into(),
    )?;
    Ok(jpeg_bytes)
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((rgba.len() / RGBA_CHANNELS) * 3);
    for px in rgba.chunks_exact(RGBA_CHANNELS) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}
