//! Frame composition
//!
//! Every render is a full recomposition from the source image, the optional
//! cutout and the slider values. Draw order is fixed:
//!
//! 1. Base layer: the blurred background when a cutout is present and blur is
//!    above zero, otherwise the source as-is.
//! 2. The cutout, drawn over the base at full opacity.
//! 3. Grain over the whole composited buffer.

use crate::{
    blur::BackgroundBlurCompositor,
    config::EditorConfig,
    grain,
    types::{Cutout, EditorState, RenderFrame, SourceImage},
};
use image::{imageops, RgbaImage};
use instant::Instant;
use rand::Rng;
use tracing::{debug, instrument};

/// Combines source, cutout and grain into the visible frame
#[derive(Debug, Clone, Default)]
pub struct CompositionEngine {
    blur: BackgroundBlurCompositor,
}

impl CompositionEngine {
    #[must_use]
    pub fn new(blur: BackgroundBlurCompositor) -> Self {
        Self { blur }
    }

    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(BackgroundBlurCompositor::from_config(config))
    }

    /// Render a full frame for `source`
    ///
    /// Deterministic for a given input except for the grain pass, which draws
    /// from `rng`.
    #[instrument(skip_all, fields(
        width = source.width(),
        height = source.height(),
        blur = state.blur_amount,
        grain = state.grain_amount,
        has_cutout = cutout.is_some(),
    ))]
    pub fn render<R: Rng + ?Sized>(
        &self,
        source: &SourceImage,
        cutout: Option<&Cutout>,
        state: &EditorState,
        generation: u64,
        rng: &mut R,
    ) -> RenderFrame {
        let start = Instant::now();
        let (width, height) = source.display_dimensions();

        let background_blurred = cutout.is_some() && state.blur_amount > 0;
        let mut image = if background_blurred {
            self.blur
                .blur_background(&source.bitmap, width, height, u32::from(state.blur_amount))
        } else {
            source.bitmap.clone()
        };

        if let Some(cutout) = cutout {
            draw_layer(&mut image, &cutout.bitmap);
        }

        let grain_applied = state.grain_amount > 0;
        if grain_applied {
            grain::apply_grain_with_rng(&mut image, state.grain_amount, rng);
        }

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            background_blurred,
            grain_applied,
            "Rendered frame"
        );

        RenderFrame {
            image,
            generation,
            background_blurred,
            cutout_drawn: cutout.is_some(),
            grain_applied,
        }
    }
}

/// Source-over composite of `layer` onto `canvas`, stretching the layer to the canvas size
fn draw_layer(canvas: &mut RgbaImage, layer: &RgbaImage) {
    let (width, height) = canvas.dimensions();
    if layer.dimensions() == (width, height) {
        imageops::overlay(canvas, layer, 0, 0);
    } else {
        let fitted = imageops::resize(layer, width, height, imageops::FilterType::Triangle);
        imageops::overlay(canvas, &fitted, 0, 0);
    }
}
