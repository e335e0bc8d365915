//! File-backed models serving a precomputed mask or cutout

use crate::{
    backends::{mask::SegmentationModel, model::CutoutModel},
    error::{EditorError, Result},
};
use async_trait::async_trait;
use image::{GrayImage, RgbaImage};
use std::path::{Path, PathBuf};

async fn read_asset(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EditorError::cutout_backend(format!("Model asset not found: {}", path.display()))
        } else {
            EditorError::cutout_backend(format!(
                "Failed to read model asset '{}': {}",
                path.display(),
                e
            ))
        }
    })
}

fn decode_asset(path: &Path, bytes: &[u8]) -> Result<image::DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        EditorError::cutout_backend(format!(
            "Model asset '{}' is not a readable image: {}",
            path.display(),
            e
        ))
    })
}

/// Segmentation model that answers every request with a mask loaded from disk
#[derive(Debug, Clone)]
pub struct StaticMask {
    path: PathBuf,
}

impl StaticMask {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SegmentationModel for StaticMask {
    async fn segment(&self, _image: &RgbaImage) -> Result<GrayImage> {
        let bytes = read_asset(&self.path).await?;
        Ok(decode_asset(&self.path, &bytes)?.to_luma8())
    }
}

/// Cutout model that answers every request with a cutout loaded from disk
#[derive(Debug, Clone)]
pub struct StaticCutout {
    path: PathBuf,
}

impl StaticCutout {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CutoutModel for StaticCutout {
    async fn cut_out(&self, _image: &RgbaImage) -> Result<RgbaImage> {
        let bytes = read_asset(&self.path).await?;
        Ok(decode_asset(&self.path, &bytes)?.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[tokio::test]
    async fn test_static_mask_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        GrayImage::from_pixel(4, 3, Luma([200])).save(&path).unwrap();

        let mask = StaticMask::new(&path).segment(&RgbaImage::new(1, 1)).await.unwrap();
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.get_pixel(0, 0)[0], 200);
    }

    #[tokio::test]
    async fn test_static_cutout_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutout.png");
        RgbaImage::from_pixel(2, 2, Rgba([5, 6, 7, 128])).save(&path).unwrap();

        let layer = StaticCutout::new(&path).cut_out(&RgbaImage::new(1, 1)).await.unwrap();
        assert_eq!(*layer.get_pixel(1, 1), Rgba([5, 6, 7, 128]));
    }

    #[tokio::test]
    async fn test_missing_asset_is_backend_failure() {
        let result = StaticMask::new("/nonexistent/photo-backdrop/mask.png")
            .segment(&RgbaImage::new(1, 1))
            .await;
        let error = result.unwrap_err();
        assert!(error.is_backend_failure());
        assert!(error.to_string().contains("Model asset not found"));
    }

    #[tokio::test]
    async fn test_unreadable_asset_is_backend_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutout.png");
        std::fs::write(&path, b"not a png").unwrap();

        let result = StaticCutout::new(&path).cut_out(&RgbaImage::new(1, 1)).await;
        assert!(matches!(result, Err(EditorError::CutoutBackend(_))));
    }
}
