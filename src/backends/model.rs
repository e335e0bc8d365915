//! Cutouts from a model that returns the foreground directly

use crate::{
    config::ResizeFilter,
    cutout::{finish_cutout, fit_to_source, CutoutProvider},
    error::Result,
    types::{Cutout, SourceImage},
};
use async_trait::async_trait;
use image::RgbaImage;
use tracing::instrument;

/// Model returning the subject on a transparent background
#[async_trait]
pub trait CutoutModel: Send + Sync {
    async fn cut_out(&self, image: &RgbaImage) -> Result<RgbaImage>;
}

/// Cutout provider adapting a [`CutoutModel`]
pub struct ModelCutoutProvider<M> {
    model: M,
    filter: ResizeFilter,
}

impl<M: CutoutModel> ModelCutoutProvider<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            filter: ResizeFilter::default(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait]
impl<M: CutoutModel> CutoutProvider for ModelCutoutProvider<M> {
    #[instrument(skip_all, fields(backend = "model"))]
    async fn request_cutout(&self, source: &SourceImage) -> Result<Cutout> {
        let layer = self.model.cut_out(&source.bitmap).await?;
        finish_cutout(fit_to_source(layer, source, self.filter))
    }

    fn name(&self) -> &'static str {
        "model"
    }
}
