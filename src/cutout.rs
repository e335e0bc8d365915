//! Cutout provider abstraction
//!
//! A provider turns a source image into a foreground-only layer aligned to the
//! source's display size. Backends differ in what they produce internally
//! (a ready cutout, a segmentation mask); those differences stay inside the
//! backend and the controller only ever sees a [`Cutout`].

use crate::{
    config::ResizeFilter,
    error::{EditorError, Result},
    types::{Cutout, SourceImage},
};
use async_trait::async_trait;
use image::{imageops, RgbaImage};

/// Capability producing a foreground cutout for a source image
#[async_trait]
pub trait CutoutProvider: Send + Sync {
    /// Produce a cutout with the display dimensions of `source`
    ///
    /// # Errors
    /// - Network, credential or model-asset failures of the backend
    /// - Undecodable backend output
    /// - [`EditorError::NoSubject`] when nothing of the image was kept
    async fn request_cutout(&self, source: &SourceImage) -> Result<Cutout>;

    /// Short backend name used in logs
    fn name(&self) -> &'static str;
}

/// Resize `layer` to the display size of `source` if it differs
#[must_use]
pub fn fit_to_source(layer: RgbaImage, source: &SourceImage, filter: ResizeFilter) -> RgbaImage {
    let (width, height) = source.display_dimensions();
    if layer.dimensions() == (width, height) {
        layer
    } else {
        imageops::resize(&layer, width, height, filter.to_filter_type())
    }
}

/// Wrap a backend result, rejecting layers that kept nothing
pub fn finish_cutout(layer: RgbaImage) -> Result<Cutout> {
    let cutout = Cutout::new(layer);
    if cutout.has_subject() {
        Ok(cutout)
    } else {
        Err(EditorError::NoSubject)
    }
}
