#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Photo Backdrop
//!
//! Editor core for portrait-style photo edits: the background behind a
//! detected subject is blurred, film grain is layered on top and the result
//! is exported as PNG.
//!
//! ## Features
//!
//! - **Background Blur**: Gaussian blur over an edge-clamped padded surface, so
//!   frame edges never darken or fringe
//! - **Film Grain**: Per-pixel uniform luminance noise with adjustable strength
//! - **Pluggable Cutouts**: Any [`CutoutProvider`] can supply the subject layer,
//!   including a remote HTTP service (enable with `remote` feature)
//! - **Session Controller**: [`EditorController`] owns the editing state and
//!   drops cutouts that arrive for an image that has been replaced
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photo_backdrop::{
//!     backends::{ModelCutoutProvider, StaticCutout},
//!     EditorConfig, EditorController, FileInput,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = ModelCutoutProvider::new(StaticCutout::new("subject.png"));
//! let mut editor = EditorController::new(EditorConfig::default(), Arc::new(provider))?;
//!
//! let bytes = tokio::fs::read("portrait.jpg").await?;
//! editor.upload(FileInput::new("portrait.jpg", "image/jpeg", bytes)).await?;
//!
//! // Raising the blur starts a cutout request; hand its result back
//! if let Some(pending) = editor.set_blur(8)? {
//!     editor.drive_cutout(pending).await;
//! }
//! editor.set_grain(20)?;
//!
//! let exported = editor.export()?;
//! exported.save_to_dir(".")?; // portrait_edited.png
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `remote` (default): HTTP cutout backend built on `reqwest`
//! - `cli` (default): Command-line interface and progress reporting
//! - `tracing-json`: JSON log output for the CLI
//! - `webp-support`: WebP decoding for uploads
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! photo-backdrop = { version = "0.1", default-features = false }
//! ```

pub mod backends;
pub mod blur;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compose;
pub mod config;
pub mod controller;
pub mod cutout;
pub mod error;
pub mod export;
pub mod grain;
pub mod services;
pub mod source;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

use std::sync::Arc;
use tokio::io::AsyncRead;

// Public API exports
pub use blur::{blur_background, pad_edge_clamped, BackgroundBlurCompositor};
pub use compose::CompositionEngine;
pub use config::{
    EditorConfig, EditorConfigBuilder, RemoteCutoutConfig, ResizeFilter, BLUR_LIMIT, GRAIN_LIMIT,
};
pub use controller::{Completion, EditorController, PendingCutout, PendingDecode};
pub use cutout::CutoutProvider;
pub use error::{EditorError, Result};
pub use export::{edited_file_name, encode_png, ExportedImage};
pub use grain::{apply_grain, apply_grain_with_rng};
pub use services::ImageIOService;
pub use source::{BitmapDecoder, ImageCrateDecoder};
pub use types::{
    Cutout, EditorPhase, EditorState, FileInput, Notice, RenderFrame, SourceImage,
};

#[cfg(feature = "cli")]
pub use tracing_config::{events, init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Edit an image provided as bytes in one call
///
/// Runs a full session: upload, blur (requesting a cutout from `provider`
/// when `blur > 0`), grain and export. Unlike the interactive controller,
/// a failed cutout is returned as an error instead of a notice.
///
/// # Examples
///
/// ```rust,no_run
/// use photo_backdrop::{backends::{MaskCutoutProvider, StaticMask}, edit_image_bytes, EditorConfig};
/// use std::sync::Arc;
///
/// # async fn example(upload: Vec<u8>) -> anyhow::Result<()> {
/// let provider = Arc::new(MaskCutoutProvider::new(StaticMask::new("mask.png")));
/// let exported = edit_image_bytes(&upload, "beach.jpg", 8, 20, EditorConfig::default(), provider).await?;
/// assert_eq!(exported.file_name, "beach_edited.png");
/// # Ok(())
/// # }
/// ```
pub async fn edit_image_bytes(
    image_bytes: &[u8],
    file_name: &str,
    blur: u8,
    grain: u8,
    config: EditorConfig,
    provider: Arc<dyn CutoutProvider>,
) -> Result<ExportedImage> {
    let mime_type = match image::guess_format(image_bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => FileInput::mime_from_extension(file_name),
    };
    let file = FileInput::new(file_name, mime_type, image_bytes.to_vec());

    let mut editor = EditorController::new(config, provider)?;
    if editor.upload(file).await? != Completion::Applied {
        return Err(first_notice_error(&mut editor)
            .unwrap_or_else(|| EditorError::decode(format!("Failed to decode {}", file_name))));
    }

    if let Some(pending) = editor.set_blur(blur)? {
        if editor.drive_cutout(pending).await == Completion::Failed {
            return Err(first_notice_error(&mut editor)
                .unwrap_or_else(|| EditorError::cutout_backend("no cutout returned")));
        }
    }
    editor.set_grain(grain)?;
    editor.export()
}

/// Edit an image read from an async stream
///
/// Reads the stream to the end and delegates to [`edit_image_bytes`].
pub async fn edit_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    file_name: &str,
    blur: u8,
    grain: u8,
    config: EditorConfig,
    provider: Arc<dyn CutoutProvider>,
) -> Result<ExportedImage> {
    let mut buffer = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer).await?;
    edit_image_bytes(&buffer, file_name, blur, grain, config, provider).await
}

fn first_notice_error(editor: &mut EditorController) -> Option<EditorError> {
    editor.take_notices().into_iter().next().map(|notice| match notice {
        Notice::NotAnImage { .. } => EditorError::invalid_input(notice.message()),
        Notice::DecodeFailed { reason, .. } => EditorError::decode(reason),
        Notice::CutoutFailed { reason } => EditorError::cutout_backend(reason),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::{png_bytes, MockCutoutProvider};

    fn seeded_config() -> EditorConfig {
        EditorConfig::builder().grain_seed(3).build().unwrap()
    }

    #[tokio::test]
    async fn test_edit_image_bytes() {
        let provider = MockCutoutProvider::new();
        let exported = edit_image_bytes(
            &png_bytes(40, 30),
            "beach.png",
            6,
            10,
            seeded_config(),
            Arc::new(provider.clone()),
        )
        .await
        .unwrap();

        assert_eq!(exported.file_name, "beach_edited.png");
        assert_eq!(provider.call_count(), 1);
        let decoded = image::load_from_memory(&exported.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[tokio::test]
    async fn test_edit_image_bytes_without_blur_skips_provider() {
        let provider = MockCutoutProvider::new();
        edit_image_bytes(
            &png_bytes(8, 8),
            "plain.png",
            0,
            25,
            seeded_config(),
            Arc::new(provider.clone()),
        )
        .await
        .unwrap();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_image_bytes_surfaces_cutout_failure() {
        let provider = MockCutoutProvider::new_failing();
        let result = edit_image_bytes(
            &png_bytes(8, 8),
            "plain.png",
            4,
            0,
            seeded_config(),
            Arc::new(provider),
        )
        .await;
        assert!(matches!(result, Err(EditorError::CutoutBackend(_))));
    }

    #[tokio::test]
    async fn test_edit_image_bytes_rejects_garbage() {
        let result = edit_image_bytes(
            b"not an image",
            "notes.txt",
            0,
            0,
            seeded_config(),
            Arc::new(MockCutoutProvider::new()),
        )
        .await;
        assert!(matches!(result, Err(EditorError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_edit_from_reader() {
        let reader = std::io::Cursor::new(png_bytes(10, 10));
        let exported = edit_from_reader(
            reader,
            "stream.png",
            0,
            0,
            seeded_config(),
            Arc::new(MockCutoutProvider::new()),
        )
        .await
        .unwrap();
        assert_eq!(exported.file_name, "stream_edited.png");
    }
}
