//! Cutouts from a per-pixel segmentation mask
//!
//! The model classifies each pixel as subject or not; the mask is applied to
//! the source with `destination-in` semantics (source alpha multiplied by mask
//! coverage) to yield the cutout.

use crate::{
    config::ResizeFilter,
    cutout::{finish_cutout, CutoutProvider},
    error::{EditorError, Result},
    types::{Cutout, SourceImage},
};
use async_trait::async_trait;
use image::{imageops, GrayImage, RgbaImage};
use tracing::{debug, instrument};

/// Model producing a subject/background mask, 255 meaning fully subject
#[async_trait]
pub trait SegmentationModel: Send + Sync {
    async fn segment(&self, image: &RgbaImage) -> Result<GrayImage>;
}

/// Cutout provider adapting a [`SegmentationModel`]
pub struct MaskCutoutProvider<M> {
    model: M,
    invert: bool,
    filter: ResizeFilter,
}

impl<M: SegmentationModel> MaskCutoutProvider<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            invert: false,
            filter: ResizeFilter::default(),
        }
    }

    /// Treat the mask as marking the background instead of the subject
    #[must_use]
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Keep `image` only where `mask` covers it
///
/// `mask` must have the dimensions of `image`.
pub fn apply_mask_destination_in(image: &RgbaImage, mask: &GrayImage, invert: bool) -> Result<RgbaImage> {
    if image.dimensions() != mask.dimensions() {
        return Err(EditorError::internal(format!(
            "Mask is {:?} but image is {:?}",
            mask.dimensions(),
            image.dimensions()
        )));
    }

    let mut out = image.clone();
    for (pixel, coverage) in out.pixels_mut().zip(mask.pixels()) {
        let coverage = if invert { 255 - coverage[0] } else { coverage[0] };
        let alpha = u16::from(pixel[3]) * u16::from(coverage);
        pixel[3] = ((alpha + 127) / 255) as u8;
    }
    Ok(out)
}

#[async_trait]
impl<M: SegmentationModel> CutoutProvider for MaskCutoutProvider<M> {
    #[instrument(skip_all, fields(backend = "mask", invert = self.invert))]
    async fn request_cutout(&self, source: &SourceImage) -> Result<Cutout> {
        let mask = self.model.segment(&source.bitmap).await?;
        let (width, height) = source.display_dimensions();
        let mask = if mask.dimensions() == (width, height) {
            mask
        } else {
            debug!(
                mask_width = mask.width(),
                mask_height = mask.height(),
                "Resizing mask to display size"
            );
            imageops::resize(&mask, width, height, self.filter.to_filter_type())
        };

        let layer = apply_mask_destination_in(&source.bitmap, &mask, self.invert)?;
        finish_cutout(layer)
    }

    fn name(&self) -> &'static str {
        "mask"
    }
}
