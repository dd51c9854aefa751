#![warn(missing_docs)]
//! # photomosaic-mosaic
//!
//! ## Purpose
//! Composes photomosaics: every cell of the source image is replaced by the
//! library tile whose average color is nearest to the cell's sampled color.
//!
//! ## Responsibilities
//! - Compose one canvas region cell by cell ([`Compositor`]).
//! - Orchestrate the four quadrants sequentially ([`compose_sequential`]),
//!   as independent encoded parts ([`compose_fan_out`]) or as a fan-out
//!   merged into one canvas ([`compose_fan_in`]).
//! - Encode the result as JPEG ([`encode_jpeg`]).
//!
//! ## Data flow
//! Decoded source + library snapshot + tile size -> [`MosaicJob`] ->
//! [`run`] with a [`Strategy`] -> four region compositions -> one encoded
//! mosaic or four encoded parts in a [`MosaicOutcome`].
//!
//! ## Ownership and lifetimes
//! The source image, library snapshot and renderer are borrowed immutably by
//! every region thread. Each region writes only its private buffer; the
//! fan-in merge hands each paint thread an exclusive view of one quadrant of
//! the shared canvas. All threads are scoped to the request and joined before
//! it returns.
//!
//! ## Error model
//! Configuration errors are raised before any thread starts. A tile that fails
//! to render leaves its cell unpainted and is reported as a [`SkippedCell`].
//! Lost, panicked or expired region tasks fail the request with
//! [`MosaicError`]; no path waits forever on a region that will not deliver.

mod canvas;
mod compose;
mod context;
mod error;
mod merge;
mod strategy;
mod tasks;

pub use canvas::encode_jpeg;
pub use compose::{Compositor, RegionComposition, SkippedCell};
pub use context::RequestContext;
pub use error::MosaicError;
pub use strategy::{
    Composition, DEFAULT_JPEG_QUALITY, EncodedPart, MosaicJob, MosaicOutcome, MosaicOutput,
    Strategy, compose_fan_in, compose_fan_out, compose_sequential, run,
};
