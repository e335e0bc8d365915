//! Photo backdrop CLI
//!
//! Loads one photo, blurs its background behind the detected subject, adds
//! grain and writes `<name>_edited.png`.

use super::{backend_factory::CliBackendFactory, config::CliConfigBuilder};
use crate::{
    controller::{Completion, EditorController},
    error::EditorError,
    services::ImageIOService,
    tracing_config::{events, init_cli_tracing, spans},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, Instrument};

/// Background blur and film grain for photos
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "photo-backdrop")]
pub struct Cli {
    /// Input image
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file or directory [default: <name>_edited.png in the current directory]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Background blur radius (0-15); above zero requests a cutout
    #[arg(short, long, default_value_t = 0)]
    pub blur: u8,

    /// Film grain intensity (0-50)
    #[arg(short, long, default_value_t = 0)]
    pub grain: u8,

    /// Cutout backend [default: remote, or inferred from --mask/--cutout]
    #[arg(long, value_enum)]
    pub backend: Option<CliBackend>,

    /// Remote background-removal endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key for the remote endpoint [default: $BGREMOVE_API_KEY]
    #[arg(long)]
    pub api_key: Option<String>,

    /// Precomputed segmentation mask (white = subject)
    #[arg(long, value_name = "PATH")]
    pub mask: Option<PathBuf>,

    /// Treat the mask as marking the background
    #[arg(long)]
    pub invert_mask: bool,

    /// Precomputed cutout with transparent background
    #[arg(long, value_name = "PATH")]
    pub cutout: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum display width
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Grain seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackend {
    /// Remote HTTP service
    Remote,
    /// Segmentation mask read from --mask
    MaskFile,
    /// Cutout read from --cutout
    CutoutFile,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Invalid configuration")?;
    let backend = CliBackendFactory::resolve_backend(&cli);
    let provider = CliBackendFactory::create(backend, &cli, &config)
        .context("Failed to create cutout backend")?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let session = spans::session(&session_id, provider.name());
    let editor = EditorController::new(config, provider)?;

    let written = run_session(&cli, backend, editor).instrument(session).await?;
    println!("{}", written.display());
    Ok(())
}

/// Upload, blur, grain and export one image; returns the written path
///
/// A requested blur that could not be applied fails the run instead of
/// exporting an unblurred image.
async fn run_session(cli: &Cli, backend: CliBackend, mut editor: EditorController) -> Result<PathBuf> {
    let start_time = Instant::now();

    let upload = ImageIOService::read_file_input(&cli.input)
        .instrument(spans::upload(&cli.input))
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    match editor.upload(upload).await {
        Ok(Completion::Applied) => {},
        Ok(_) | Err(EditorError::InvalidInput(_)) => {
            print_notices(&mut editor);
            anyhow::bail!("Could not load {}", cli.input.display());
        },
        Err(error) => return Err(error.into()),
    }

    if let Some(source) = editor.source() {
        info!(
            width = source.intrinsic_dimensions.0,
            height = source.intrinsic_dimensions.1,
            display_width = source.width(),
            display_height = source.height(),
            "Loaded image"
        );
    }

    if let Some(pending) = editor.set_blur(cli.blur)? {
        let span = spans::cutout_request(backend_label(backend), pending.generation());
        let spinner = loading_spinner();
        let outcome = editor.drive_cutout(pending).instrument(span).await;
        spinner.finish_and_clear();
        debug!(?outcome, "Cutout request finished");
        if outcome != Completion::Applied {
            print_notices(&mut editor);
            anyhow::bail!("Background blur {} could not be applied", cli.blur);
        }
        events::progress("Background removed");
    }
    print_notices(&mut editor);

    {
        let _span = spans::render("grain", cli.grain).entered();
        editor.set_grain(cli.grain)?;
    }

    let exported = editor.export()?;
    let destination = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let written = {
        let _span = spans::export(&destination).entered();
        ImageIOService::write_export(&exported, cli.output.as_deref()).map_err(|e| {
            events::failure(&e, "export");
            e
        })?
    };

    events::timing("edit", start_time.elapsed());
    Ok(written)
}

fn loading_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Removing background...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_notices(editor: &mut EditorController) {
    for notice in editor.take_notices() {
        eprintln!("warning: {}", notice);
    }
}

fn backend_label(backend: CliBackend) -> &'static str {
    match backend {
        CliBackend::Remote => "remote",
        CliBackend::MaskFile => "mask-file",
        CliBackend::CutoutFile => "cutout-file",
    }
}
