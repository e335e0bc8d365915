//! Cutout provider selection for the CLI

use crate::backends::{MaskCutoutProvider, ModelCutoutProvider, StaticCutout, StaticMask};
#[cfg(feature = "remote")]
use crate::backends::RemoteCutoutProvider;
use crate::cli::main_impl::{Cli, CliBackend};
use crate::config::EditorConfig;
use crate::cutout::CutoutProvider;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Builds the cutout provider the CLI arguments ask for
#[derive(Debug)]
pub(crate) struct CliBackendFactory;

impl CliBackendFactory {
    /// Pick the backend: explicit `--backend`, else inferred from `--mask`/`--cutout`
    pub(crate) fn resolve_backend(cli: &Cli) -> CliBackend {
        if let Some(backend) = cli.backend {
            return backend;
        }
        if cli.mask.is_some() {
            return CliBackend::MaskFile;
        }
        if cli.cutout.is_some() {
            return CliBackend::CutoutFile;
        }
        CliBackend::Remote
    }

    #[cfg(feature = "remote")]
    fn create_remote(config: &EditorConfig) -> Result<Arc<dyn CutoutProvider>> {
        let provider = RemoteCutoutProvider::new(config.remote.clone())
            .context("Failed to create remote backend")?
            .with_filter(config.resize_filter);
        Ok(Arc::new(provider))
    }

    #[cfg(not(feature = "remote"))]
    fn create_remote(_config: &EditorConfig) -> Result<Arc<dyn CutoutProvider>> {
        anyhow::bail!("Remote backend not enabled. Rebuild with --features remote, or use --mask or --cutout.")
    }

    pub(crate) fn create(
        backend: CliBackend,
        cli: &Cli,
        config: &EditorConfig,
    ) -> Result<Arc<dyn CutoutProvider>> {
        match backend {
            CliBackend::Remote => Self::create_remote(config),
            CliBackend::MaskFile => {
                let path = cli
                    .mask
                    .clone()
                    .context("--backend mask-file requires --mask <PATH>")?;
                let provider = MaskCutoutProvider::new(StaticMask::new(path))
                    .inverted(cli.invert_mask)
                    .with_filter(config.resize_filter);
                Ok(Arc::new(provider))
            },
            CliBackend::CutoutFile => {
                let path = cli
                    .cutout
                    .clone()
                    .context("--backend cutout-file requires --cutout <PATH>")?;
                let provider = ModelCutoutProvider::new(StaticCutout::new(path))
                    .with_filter(config.resize_filter);
                Ok(Arc::new(provider))
            },
        }
    }
}
