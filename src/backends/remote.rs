//! Remote HTTP cutout backend
//!
//! Uploads the display-sized source as a PNG in a multipart form and expects
//! a PNG cutout back.

use crate::{
    config::{RemoteCutoutConfig, ResizeFilter},
    cutout::{finish_cutout, fit_to_source, CutoutProvider},
    error::{EditorError, Result},
    export::encode_png,
    types::{Cutout, SourceImage},
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Form field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image_file";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Cutout provider calling a remote background-removal endpoint
#[derive(Debug, Clone)]
pub struct RemoteCutoutProvider {
    client: Client,
    config: RemoteCutoutConfig,
    filter: ResizeFilter,
}

impl RemoteCutoutProvider {
    /// Create a provider for `config`
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(config: RemoteCutoutConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EditorError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            config,
            filter: ResizeFilter::default(),
        })
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RemoteCutoutConfig {
        &self.config
    }

    fn build_form(&self, png: Vec<u8>) -> Result<Form> {
        let part = Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| EditorError::internal(format!("Invalid MIME type: {}", e)))?;

        Ok(Form::new()
            .part(IMAGE_FIELD, part)
            .text("size", self.config.size.clone()))
    }
}

/// Turn a non-success response into a backend error
fn status_error(status: StatusCode, body: &str) -> EditorError {
    let detail = body.trim();
    let detail = if detail.is_empty() {
        status.canonical_reason().unwrap_or("no details")
    } else {
        detail
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EditorError::cutout_backend(format!(
            "Remote service rejected the API key ({}): {}",
            status.as_u16(),
            detail
        )),
        _ => EditorError::cutout_backend(format!(
            "Remote service answered {}: {}",
            status.as_u16(),
            detail
        )),
    }
}

#[async_trait]
impl CutoutProvider for RemoteCutoutProvider {
    #[instrument(skip_all, fields(backend = "remote", endpoint = %self.config.endpoint))]
    async fn request_cutout(&self, source: &SourceImage) -> Result<Cutout> {
        let Some(api_key) = self.config.resolve_api_key() else {
            return Err(EditorError::cutout_backend(format!(
                "No API key configured; set {} or pass one explicitly",
                self.config.api_key_env
            )));
        };

        let png = encode_png(&source.bitmap)?;
        debug!(upload_bytes = png.len(), "Uploading image for background removal");
        let form = self.build_form(png)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EditorError::network_error("Cutout request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Remote background removal failed");
            return Err(status_error(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EditorError::network_error("Failed to read cutout response", e))?;
        info!(response_bytes = bytes.len(), "Received cutout");

        let layer = image::load_from_memory(&bytes)
            .map_err(|e| {
                EditorError::cutout_backend(format!("Remote service returned an unreadable image: {}", e))
            })?
            .to_rgba8();

        finish_cutout(fit_to_source(layer, source, self.filter))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn source() -> SourceImage {
        SourceImage {
            bitmap: RgbaImage::new(4, 4),
            intrinsic_dimensions: (4, 4),
            file_name: "remote.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let config = RemoteCutoutConfig {
            endpoint: "http://127.0.0.1:9/never-contacted".to_string(),
            api_key: None,
            api_key_env: "PHOTO_BACKDROP_TEST_MISSING_KEY".to_string(),
            ..RemoteCutoutConfig::default()
        };
        let provider = RemoteCutoutProvider::new(config).unwrap();

        let error = provider.request_cutout(&source()).await.unwrap_err();
        assert!(matches!(error, EditorError::CutoutBackend(_)));
        assert!(error.to_string().contains("PHOTO_BACKDROP_TEST_MISSING_KEY"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let config = RemoteCutoutConfig {
            endpoint: "http://127.0.0.1:1/removebg".to_string(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 5,
            ..RemoteCutoutConfig::default()
        };
        let provider = RemoteCutoutProvider::new(config).unwrap();

        let error = provider.request_cutout(&source()).await.unwrap_err();
        assert!(error.is_backend_failure(), "unexpected error: {}", error);
    }

    #[test]
    fn test_status_error_messages() {
        let error = status_error(StatusCode::FORBIDDEN, "");
        assert!(error.to_string().contains("rejected the API key"));
        assert!(error.to_string().contains("Forbidden"));

        let error = status_error(StatusCode::BAD_REQUEST, "{\"errors\":[{\"title\":\"No subject\"}]}");
        assert!(error.to_string().contains("400"));
        assert!(error.to_string().contains("No subject"));
    }

    #[test]
    fn test_provider_name_and_config() {
        let provider = RemoteCutoutProvider::new(RemoteCutoutConfig::default()).unwrap();
        assert_eq!(provider.name(), "remote");
        assert_eq!(provider.config().size, "auto");
        assert!(provider.build_form(vec![1, 2, 3]).is_ok());
    }
}
