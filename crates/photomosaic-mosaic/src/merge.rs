//! Fan-in merge coordinator.

use std::thread;

use image::RgbaImage;
use photomosaic_core::Quadrant;

use crate::canvas::split_quadrants;
use crate::{Composition, MosaicError, RegionComposition};

/// Paints four gathered region results into one shared canvas.
///
/// Every quadrant must be delivered exactly once. Each paint runs on its own
/// thread against a disjoint [`split_quadrants`] view, and all paints are
/// joined before the canvas is returned, so callers never observe a partially
/// merged image.
///
/// # Errors
/// Returns [`MosaicError::DuplicateRegion`] or [`MosaicError::MissingRegion`]
/// when the deliveries are not one per quadrant,
/// [`MosaicError::GeometryMismatch`] when a result does not fit its quadrant,
/// and [`MosaicError::PaintPanicked`] / [`MosaicError::Spawn`] on thread
/// failures.
pub(crate) fn merge_regions(
    width: u32,
    height: u32,
    parts: Vec<(Quadrant, RegionComposition)>,
) -> Result<Composition, MosaicError> {
    let mut slots: [Option<RegionComposition>; 4] = [None, None, None, None];
    for (quadrant, part) in parts {
        let slot = &mut slots[quadrant.index()];
        if slot.is_some() {
            return Err(MosaicError::DuplicateRegion(quadrant));
        }
        *slot = Some(part);
    }

    let mut ordered = Vec::with_capacity(slots.len());
    for (quadrant, slot) in Quadrant::ALL.into_iter().zip(slots) {
        ordered.push(slot.ok_or(MosaicError::MissingRegion(quadrant))?);
    }

    let mut canvas = RgbaImage::new(width, height);
    paint_concurrently(&mut canvas, &ordered)?;

    let mut cells = 0;
    let mut skipped = Vec::new();
    for part in ordered {
        cells += part.cells;
        skipped.extend(part.skipped);
    }

    Ok(Composition {
        canvas,
        cells,
        skipped,
    })
}

fn paint_concurrently(
    canvas: &mut RgbaImage,
    ordered: &[RegionComposition],
) -> Result<(), MosaicError> {
    let views = split_quadrants(canvas);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(Quadrant::ALL.len());
        let mut outcome = Ok(());

        for ((quadrant, view), part) in Quadrant::ALL.into_iter().zip(views).zip(ordered) {
            let spawned = thread::Builder::new()
                .name(format!("photomosaic-paint-{quadrant}"))
                .spawn_scoped(scope, move || view.paint(&part.image));
            match spawned {
                Ok(handle) => handles.push((quadrant, handle)),
                Err(error) => {
                    outcome = Err(MosaicError::Spawn(error));
                    break;
                }
            }
        }

        // Barrier: the canvas is only released once every paint has landed.
        for (quadrant, handle) in handles {
            let painted = handle
                .join()
                .map_err(|_| MosaicError::PaintPanicked(quadrant))
                .and_then(|painted| painted);
            if outcome.is_ok() {
                outcome = painted;
            }
        }

        outcome
    })
}
