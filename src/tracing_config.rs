//! Subscriber setup for front ends
//!
//! The library only emits spans and events. Binaries decide here how they are
//! filtered and rendered; everything goes to stderr so stdout stays free for
//! the exported file path.

use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Coloured single-line events
    #[default]
    Pretty,
    /// No colours, for CI logs and redirected output
    Plain,
    /// One JSON object per event, including the active spans
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Subscriber settings
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    verbosity: u8,
    format: TracingFormat,
    directives: Option<String>,
    respect_env: bool,
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `-v` flags given on the command line
    #[must_use]
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Explicit filter directives, taking precedence over verbosity and `RUST_LOG`
    #[must_use]
    pub fn directives<S: Into<String>>(mut self, directives: S) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Let a set `RUST_LOG` override the verbosity-derived filter
    #[must_use]
    pub fn respect_env(mut self, respect_env: bool) -> Self {
        self.respect_env = respect_env;
        self
    }

    /// Filter directives for the configured verbosity
    ///
    /// Extra verbosity raises this crate first; dependencies only get chatty
    /// at the highest level.
    #[must_use]
    pub fn verbosity_directives(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "warn,photo_backdrop=info",
            2 => "info,photo_backdrop=debug",
            _ => "trace",
        }
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        if let Some(directives) = &self.directives {
            return Ok(EnvFilter::try_new(directives)?);
        }
        if self.respect_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        Ok(EnvFilter::try_new(self.verbosity_directives())?)
    }

    fn output_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self.format {
            TracingFormat::Pretty => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .boxed(),
            TracingFormat::Plain => fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .without_time()
                .boxed(),
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => fmt::layer()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    /// - Malformed filter directives
    /// - A global subscriber is already set
    pub fn init(self) -> anyhow::Result<()> {
        let filter = self.env_filter()?;
        Registry::default()
            .with(self.output_layer())
            .with(filter)
            .try_init()?;
        Ok(())
    }
}

/// Subscriber used by the `photo-backdrop` binary
///
/// # Errors
/// - See [`TracingConfig::init`]
pub fn init_cli_tracing(verbosity: u8) -> anyhow::Result<()> {
    TracingConfig::new()
        .verbosity(verbosity)
        .respect_env(true)
        .init()
}

/// Spans for the stages of a CLI session
pub mod spans {
    use std::path::Path;
    use tracing::{debug_span, info_span, Span};

    pub fn session(session_id: &str, backend: &str) -> Span {
        info_span!("session", session_id = %session_id, backend = %backend)
    }

    pub fn upload(path: &Path) -> Span {
        info_span!("upload", path = %path.display())
    }

    pub fn cutout_request(backend: &str, generation: u64) -> Span {
        info_span!("cutout_request", backend = %backend, generation)
    }

    /// Re-render after a slider change
    pub fn render(control: &str, amount: u8) -> Span {
        debug_span!("render", control = %control, amount)
    }

    pub fn export(destination: &Path) -> Span {
        info_span!("export", destination = %destination.display())
    }
}

/// Events shared by front ends
pub mod events {
    use super::Duration;
    use tracing::{debug, error, info};

    /// User-facing progress line
    pub fn progress(message: &str) {
        info!("{}", message);
    }

    pub fn failure(error: &dyn std::error::Error, stage: &str) {
        error!(%error, stage, "Stage failed");
    }

    pub fn timing(operation: &str, elapsed: Duration) {
        debug!(operation, elapsed_ms = elapsed.as_millis() as u64, "Timing");
    }
}
