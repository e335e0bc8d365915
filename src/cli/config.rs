//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::EditorConfig;
use anyhow::{Context, Result};

/// Convert CLI arguments to an [`EditorConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the editor configuration from CLI arguments
    ///
    /// A `--config` file provides the base; explicit flags override it.
    pub(crate) fn from_cli(cli: &Cli) -> Result<EditorConfig> {
        let mut config = match &cli.config {
            Some(path) => EditorConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EditorConfig::default(),
        };

        if let Some(width) = cli.max_width {
            config.max_display_width = width;
        }
        if let Some(seed) = cli.seed {
            config.grain_seed = Some(seed);
        }
        if let Some(endpoint) = &cli.endpoint {
            config.remote.endpoint.clone_from(endpoint);
        }
        if let Some(api_key) = &cli.api_key {
            config.remote.api_key = Some(api_key.clone());
        }

        Self::validate_cli(cli, &config)?;
        Ok(config)
    }

    /// Validate CLI arguments against the resolved configuration
    pub(crate) fn validate_cli(cli: &Cli, config: &EditorConfig) -> Result<()> {
        config.validate().context("Invalid configuration")?;

        if cli.blur > config.max_blur {
            anyhow::bail!("--blur must be between 0 and {}, got {}", config.max_blur, cli.blur);
        }
        if cli.grain > config.max_grain {
            anyhow::bail!(
                "--grain must be between 0 and {}, got {}",
                config.max_grain,
                cli.grain
            );
        }
        Ok(())
    }
}
