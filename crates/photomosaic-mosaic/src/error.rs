//! Error type for mosaic composition.

use photomosaic_core::Quadrant;
use thiserror::Error;

/// Error type for region composition, strategy orchestration and encoding.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// The tile library snapshot has no entries.
    #[error("tile library is empty; build or reload it before composing")]
    EmptyLibrary,
    /// The source image has no pixels.
    #[error("source image is empty ({width}x{height})")]
    EmptySource {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
    },
    /// The request deadline passed before composition finished.
    #[error("mosaic request deadline exceeded")]
    DeadlineExceeded,
    /// A sibling region failed and the request was cancelled.
    #[error("mosaic request cancelled")]
    Cancelled,
    /// A region task ended without delivering its result.
    #[error("region task {0} ended without delivering a result")]
    RegionTaskLost(Quadrant),
    /// A region task panicked.
    #[error("region task {0} panicked")]
    RegionTaskPanicked(Quadrant),
    /// A merge paint task panicked.
    #[error("paint task {0} panicked")]
    PaintPanicked(Quadrant),
    /// The merge received two results for the same quadrant.
    #[error("region {0} delivered more than once")]
    DuplicateRegion(Quadrant),
    /// The merge is missing the result for a quadrant.
    #[error("region {0} was never delivered")]
    MissingRegion(Quadrant),
    /// A region result does not match the size of its quadrant.
    #[error("region {quadrant} is {actual:?}, expected {expected:?}")]
    GeometryMismatch {
        /// Quadrant being merged.
        quadrant: Quadrant,
        /// Quadrant size on the canvas.
        expected: (u32, u32),
        /// Size of the delivered region image.
        actual: (u32, u32),
    },
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),
    /// JPEG encoding failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
