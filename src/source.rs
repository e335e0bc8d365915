//! Bitmap decoding and display sizing for uploads

use crate::{
    config::ResizeFilter,
    error::{EditorError, Result},
    types::{FileInput, SourceImage},
};
use async_trait::async_trait;
use image::{imageops, DynamicImage, GenericImageView};
use tracing::{debug, instrument};

/// Turns raw file bytes into a drawable bitmap
#[async_trait]
pub trait BitmapDecoder: Send + Sync {
    /// Decode `bytes` into an image
    ///
    /// # Errors
    /// - Corrupt or unsupported image data
    async fn decode(&self, bytes: Vec<u8>) -> Result<DynamicImage>;
}

/// Decoder backed by the `image` crate, run on the blocking pool
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

#[async_trait]
impl BitmapDecoder for ImageCrateDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> Result<DynamicImage> {
        tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes)
                .map_err(|e| EditorError::decode(format!("Failed to decode image from bytes: {}", e)))
        })
        .await
        .map_err(|e| EditorError::internal(format!("Decode task failed: {}", e)))?
    }
}

/// Display size for an image of `width`×`height` constrained to `max_width`
///
/// Aspect ratio is preserved; images already narrow enough keep their size.
#[must_use]
pub fn display_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }

    let scale = f64::from(max_width) / f64::from(width);
    let scaled_height = (f64::from(height) * scale).round().max(1.0);
    (max_width, scaled_height as u32)
}

/// Build a `SourceImage` from a decoded bitmap, scaling it to the display size
#[instrument(skip(image))]
pub fn prepare_source(
    image: &DynamicImage,
    file_name: &str,
    max_width: u32,
    filter: ResizeFilter,
) -> Result<SourceImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EditorError::decode(format!(
            "Image '{}' has no pixels ({}x{})",
            file_name, width, height
        )));
    }

    let (display_width, display_height) = display_dimensions(width, height, max_width);
    let rgba = image.to_rgba8();
    let bitmap = if (display_width, display_height) == (width, height) {
        rgba
    } else {
        imageops::resize(&rgba, display_width, display_height, filter.to_filter_type())
    };

    debug!(
        width,
        height,
        display_width,
        display_height,
        "Prepared source image"
    );

    Ok(SourceImage {
        bitmap,
        intrinsic_dimensions: (width, height),
        file_name: file_name.to_string(),
    })
}

/// Reject anything that does not declare an image MIME type
pub fn validate_file_input(file: &FileInput) -> Result<()> {
    if file.is_image() {
        Ok(())
    } else {
        Err(EditorError::invalid_input(format!(
            "'{}' has type '{}', expected image/*",
            file.name, file.mime_type
        )))
    }
}
