//! File input/output for front ends
//!
//! Turns files on disk into [`FileInput`]s the controller accepts and writes
//! exports back out, keeping file-system access out of the editor core.

use crate::{
    error::{EditorError, Result},
    export::ExportedImage,
    types::FileInput,
};
use std::path::{Path, PathBuf};

/// Service for handling file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Read a file from disk as an upload
    ///
    /// The MIME type is derived from the extension. Files without a known
    /// extension are sniffed by content, so an image saved without extension
    /// is still accepted.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use photo_backdrop::services::ImageIOService;
    ///
    /// # async fn example() -> photo_backdrop::Result<()> {
    /// let upload = ImageIOService::read_file_input("holiday.jpg").await?;
    /// assert_eq!(upload.mime_type, "image/jpeg");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read_file_input<P: AsRef<Path>>(path: P) -> Result<FileInput> {
        let path_ref = path.as_ref();
        let bytes = tokio::fs::read(path_ref).await.map_err(|e| {
            EditorError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read '{}': {}", path_ref.display(), e),
            ))
        })?;

        let name = path_ref
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        let mut mime_type = FileInput::mime_from_extension(&name).to_string();
        if mime_type == "application/octet-stream" {
            if let Ok(format) = image::guess_format(&bytes) {
                log::debug!(
                    "No known extension on {}, detected {:?} from content",
                    path_ref.display(),
                    format
                );
                mime_type = format.to_mime_type().to_string();
            }
        }

        Ok(FileInput::new(name, mime_type, bytes))
    }

    /// Write an export to `output`
    ///
    /// `output` may be a file path, or an existing directory in which case the
    /// export keeps its own `<name>_edited.png` file name. Without `output`
    /// the export lands in the current directory.
    pub fn write_export(exported: &ExportedImage, output: Option<&Path>) -> Result<PathBuf> {
        match output {
            None => exported.save_to_dir("."),
            Some(path) if path.is_dir() => exported.save_to_dir(path),
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &exported.bytes)?;
                log::debug!("Saved export to {}", path.display());
                Ok(path.to_path_buf())
            },
        }
    }
}
