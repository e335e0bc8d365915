//! Core types shared by the editor components

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A file handed over by the file-selection collaborator
#[derive(Debug, Clone)]
pub struct FileInput {
    /// File name as selected by the user (used to name the export)
    pub name: String,
    /// MIME type reported for the file
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl FileInput {
    #[must_use]
    pub fn new<N: Into<String>, M: Into<String>>(name: N, mime_type: M, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Whether the declared MIME type is an image type
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("image/")
    }

    /// Guess the MIME type from the file extension, as browsers do for file inputs
    #[must_use]
    pub fn mime_from_extension(name: &str) -> &'static str {
        let extension = std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            Some("tif" | "tiff") => "image/tiff",
            Some("bmp") => "image/bmp",
            Some("gif") => "image/gif",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// A decoded upload, scaled to its display size. Never mutated once created.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Display-sized RGBA bitmap
    pub bitmap: RgbaImage,
    /// Intrinsic dimensions of the decoded file
    pub intrinsic_dimensions: (u32, u32),
    /// Name of the uploaded file
    pub file_name: String,
}

impl SourceImage {
    /// Display width
    #[must_use]
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    /// Display height
    #[must_use]
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    #[must_use]
    pub fn display_dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }
}

/// Foreground-only layer drawn over a separately blurred background
#[derive(Debug, Clone)]
pub struct Cutout {
    pub bitmap: RgbaImage,
}

impl Cutout {
    #[must_use]
    pub fn new(bitmap: RgbaImage) -> Self {
        Self { bitmap }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    /// Whether any pixel of the layer is at least partly opaque
    #[must_use]
    pub fn has_subject(&self) -> bool {
        self.bitmap.pixels().any(|pixel| pixel[3] > 0)
    }
}

/// Slider values and async flags owned by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub blur_amount: u8,
    pub grain_amount: u8,
    pub processing: bool,
    pub has_cutout: bool,
}

impl EditorState {
    /// Whether a blur change to the current value should start a cutout request
    #[must_use]
    pub fn needs_cutout(&self) -> bool {
        self.blur_amount > 0 && !self.has_cutout && !self.processing
    }
}

/// Where the editor currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorPhase {
    /// No image loaded
    Empty,
    /// Image loaded, no cutout
    Ready,
    /// Cutout request in flight, controls disabled
    AwaitingCutout,
    /// Image loaded with its cutout
    ReadyWithCutout,
}

impl fmt::Display for EditorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Ready => write!(f, "ready"),
            Self::AwaitingCutout => write!(f, "awaiting-cutout"),
            Self::ReadyWithCutout => write!(f, "ready-with-cutout"),
        }
    }
}

/// One fully recomposed frame
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub image: RgbaImage,
    /// Generation of the source image this frame was rendered from
    pub generation: u64,
    /// The base layer is the blurred background rather than the source
    pub background_blurred: bool,
    /// The cutout was drawn over the base layer
    pub cutout_drawn: bool,
    /// Grain was applied as the final pass
    pub grain_applied: bool,
}

/// User-visible message raised by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A non-image file was selected
    NotAnImage { file_name: String },
    /// A file claiming to be an image could not be decoded
    DecodeFailed { file_name: String, reason: String },
    /// Background removal failed; blur stays inert until retried
    CutoutFailed { reason: String },
}

impl Notice {
    /// Text shown to the user
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NotAnImage { .. } => "Please upload an image file".to_string(),
            Self::DecodeFailed { file_name, .. } => {
                format!("Could not read '{}' as an image", file_name)
            },
            Self::CutoutFailed { reason } => {
                format!("Background removal failed: {}. Adjust the blur to try again.", reason)
            },
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
