//! PNG export of the current frame

use crate::error::{EditorError, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Suffix appended to the original base name of exported files
pub const EDITED_SUFFIX: &str = "_edited";

/// An encoded frame ready to be offered as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// `<original-basename>_edited.png`
    pub file_name: String,
    /// PNG-encoded bytes
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// Write the export into `dir` under its file name, returning the full path
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        log::debug!("Saved export to {}", path.display());
        Ok(path)
    }
}

/// Encode `image` as PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| EditorError::export(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// Download name for an upload called `original`
///
/// The extension is dropped and `_edited.png` appended; names without a
/// usable stem fall back to `image`.
#[must_use]
pub fn edited_file_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image");
    format!("{}{}.png", stem, EDITED_SUFFIX)
}

/// Encode `image` and name it after `original`
pub fn export_png(image: &RgbaImage, original: &str) -> Result<ExportedImage> {
    Ok(ExportedImage {
        file_name: edited_file_name(original),
        bytes: encode_png(image)?,
    })
}
