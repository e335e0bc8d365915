//! Configuration types for the editor

use crate::error::{EditorError, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted for the remote API key when none is configured
pub const DEFAULT_API_KEY_ENV: &str = "BGREMOVE_API_KEY";

/// Largest blur radius the slider can reach
pub const BLUR_LIMIT: u8 = 15;

/// Largest grain intensity the slider can reach
pub const GRAIN_LIMIT: u8 = 50;

/// Resampling filter used when fitting images to the display size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    #[must_use]
    pub fn to_filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Settings for the remote HTTP cutout backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCutoutConfig {
    /// Endpoint accepting a multipart image upload and answering with a PNG cutout
    pub endpoint: String,

    /// API key sent as `X-Api-Key`; takes precedence over `api_key_env`
    pub api_key: Option<String>,

    /// Environment variable to read the API key from
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Requested output size, forwarded as the `size` form field
    pub size: String,
}

impl Default for RemoteCutoutConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.remove.bg/v1.0/removebg".to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 60,
            size: "auto".to_string(),
        }
    }
}

impl RemoteCutoutConfig {
    /// Resolve the API key from the explicit value or the configured environment variable
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Configuration for an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Images wider than this are scaled down, preserving aspect ratio
    pub max_display_width: u32,

    /// Upper bound of the blur slider
    pub max_blur: u8,

    /// Upper bound of the grain slider
    pub max_grain: u8,

    /// Blur padding is `radius * blur_padding_factor`, capped at `blur_padding_cap`
    pub blur_padding_factor: u32,

    /// Maximum padding in pixels on each side of the blur working surface
    pub blur_padding_cap: u32,

    /// Filter used to fit uploads and cutouts to the display size
    pub resize_filter: ResizeFilter,

    /// Fixed seed for grain synthesis (random per session when unset)
    pub grain_seed: Option<u64>,

    /// Remote cutout backend settings
    pub remote: RemoteCutoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_display_width: 1920,
            max_blur: BLUR_LIMIT,
            max_grain: GRAIN_LIMIT,
            blur_padding_factor: 3,
            blur_padding_cap: 100,
            resize_filter: ResizeFilter::default(),
            grain_seed: None,
            remote: RemoteCutoutConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use photo_backdrop::EditorConfig;
    ///
    /// let config = EditorConfig::builder()
    ///     .max_display_width(1280)
    ///     .grain_seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.max_display_width, 1280);
    /// ```
    #[must_use]
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::default()
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            EditorError::invalid_config(format!(
                "Failed to parse '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Display width of zero
    /// - Slider bounds of zero, or above 15 (blur) and 50 (grain)
    /// - Zero remote timeout or empty endpoint
    pub fn validate(&self) -> Result<()> {
        if self.max_display_width == 0 {
            return Err(EditorError::config_value_error(
                "max display width",
                self.max_display_width,
                "1 or more",
                Some(1920),
            ));
        }

        if !(1..=BLUR_LIMIT).contains(&self.max_blur) {
            return Err(EditorError::config_value_error(
                "max blur",
                self.max_blur,
                "1-15",
                Some(BLUR_LIMIT),
            ));
        }

        if !(1..=GRAIN_LIMIT).contains(&self.max_grain) {
            return Err(EditorError::config_value_error(
                "max grain",
                self.max_grain,
                "1-50",
                Some(GRAIN_LIMIT),
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(EditorError::config_value_error(
                "remote timeout",
                self.remote.timeout_secs,
                "1 or more seconds",
                Some(60),
            ));
        }

        if self.remote.endpoint.trim().is_empty() {
            return Err(EditorError::invalid_config("Remote endpoint must not be empty"));
        }

        Ok(())
    }

    /// Padding used around the blur working surface for `radius`
    #[must_use]
    pub fn blur_padding(&self, radius: u32) -> u32 {
        radius
            .saturating_mul(self.blur_padding_factor)
            .min(self.blur_padding_cap)
    }
}

/// Builder for `EditorConfig`
#[derive(Debug, Default)]
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    #[must_use]
    pub fn max_display_width(mut self, width: u32) -> Self {
        self.config.max_display_width = width;
        self
    }

    #[must_use]
    pub fn max_blur(mut self, max_blur: u8) -> Self {
        self.config.max_blur = max_blur;
        self
    }

    #[must_use]
    pub fn max_grain(mut self, max_grain: u8) -> Self {
        self.config.max_grain = max_grain;
        self
    }

    #[must_use]
    pub fn blur_padding(mut self, factor: u32, cap: u32) -> Self {
        self.config.blur_padding_factor = factor;
        self.config.blur_padding_cap = cap;
        self
    }

    #[must_use]
    pub fn resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.config.resize_filter = filter;
        self
    }

    /// Fix the grain seed so renders are reproducible
    #[must_use]
    pub fn grain_seed(mut self, seed: u64) -> Self {
        self.config.grain_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn remote(mut self, remote: RemoteCutoutConfig) -> Self {
        self.config.remote = remote;
        self
    }

    #[must_use]
    pub fn remote_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.remote.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn remote_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.config.remote.api_key = Some(api_key.into());
        self
    }

    /// Build the configuration, validating it first
    pub fn build(self) -> Result<EditorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.max_display_width, 1920);
        assert_eq!(config.max_blur, 15);
        assert_eq!(config.max_grain, 50);
        assert!(config.grain_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blur_padding_is_capped() {
        let config = EditorConfig::default();
        assert_eq!(config.blur_padding(0), 0);
        assert_eq!(config.blur_padding(8), 24);
        assert_eq!(config.blur_padding(15), 45);
        assert_eq!(config.blur_padding(40), 100);
        assert_eq!(config.blur_padding(u32::MAX), 100);
    }

    #[test]
    fn test_validation_rejects_zero_width() {
        let result = EditorConfig::builder().max_display_width(0).build();
        let error = result.unwrap_err();
        assert!(error.to_string().contains("max display width"));
    }

    #[test]
    fn test_validation_rejects_slider_bounds_past_limits() {
        let error = EditorConfig::builder().max_blur(200).build().unwrap_err();
        assert!(error.to_string().contains("max blur"));
        assert!(error.to_string().contains("1-15"));

        let error = EditorConfig::builder().max_grain(51).build().unwrap_err();
        assert!(error.to_string().contains("max grain"));

        let config = EditorConfig::builder()
            .max_blur(BLUR_LIMIT)
            .max_grain(GRAIN_LIMIT)
            .build()
            .unwrap();
        assert_eq!((config.max_blur, config.max_grain), (15, 50));
    }

    #[test]
    fn test_validation_rejects_empty_endpoint() {
        let result = EditorConfig::builder().remote_endpoint("  ").build();
        assert!(matches!(result, Err(EditorError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"max_display_width": 800, "resize_filter": "lanczos3"}"#)
                .unwrap();
        assert_eq!(config.max_display_width, 800);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert_eq!(config.max_grain, 50);
        assert_eq!(config.remote.size, "auto");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{"grain_seed": 42, "remote": {"timeout_secs": 5}}"#).unwrap();

        let config = EditorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.grain_seed, Some(42));
        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.remote.api_key_env, DEFAULT_API_KEY_ENV);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let remote = RemoteCutoutConfig {
            api_key: Some("abc123".to_string()),
            api_key_env: "PHOTO_BACKDROP_TEST_UNSET_VARIABLE".to_string(),
            ..RemoteCutoutConfig::default()
        };
        assert_eq!(remote.resolve_api_key().as_deref(), Some("abc123"));

        let blank = RemoteCutoutConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "PHOTO_BACKDROP_TEST_UNSET_VARIABLE".to_string(),
            ..RemoteCutoutConfig::default()
        };
        assert!(blank.resolve_api_key().is_none());
    }
}
