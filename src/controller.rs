//! Editor session controller
//!
//! The controller owns all mutable session state and moves it through
//! `Empty → Ready → AwaitingCutout → ReadyWithCutout`. It never holds
//! `&mut self` across an await: starting an asynchronous step (decoding an
//! upload, requesting a cutout) returns a `'static` pending future, and the
//! caller hands its completion back once it resolves. Each installed image
//! gets a new generation number, and completions carrying an outdated
//! generation are dropped on arrival.

use crate::{
    compose::CompositionEngine,
    config::EditorConfig,
    cutout::CutoutProvider,
    error::{EditorError, Result},
    export::{export_png, ExportedImage},
    source::{prepare_source, validate_file_input, BitmapDecoder, ImageCrateDecoder},
    types::{Cutout, EditorPhase, EditorState, FileInput, Notice, RenderFrame, SourceImage},
};
use futures::future::{BoxFuture, FutureExt};
use image::DynamicImage;
use rand::{rngs::StdRng, SeedableRng};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info, instrument, warn};

/// Result of handing a completion back to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was installed and the frame re-rendered
    Applied,
    /// The operation failed; a notice was raised and controls restored
    Failed,
    /// The result belonged to a superseded image and was ignored
    Discarded,
}

/// Outcome of a decode started by [`EditorController::begin_upload`]
pub struct DecodeCompletion {
    ticket: u64,
    file_name: String,
    result: Result<DynamicImage>,
}

/// In-flight decode of an upload
pub struct PendingDecode {
    ticket: u64,
    inner: BoxFuture<'static, DecodeCompletion>,
}

impl PendingDecode {
    #[must_use]
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Future for PendingDecode {
    type Output = DecodeCompletion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

/// Outcome of a cutout request started by [`EditorController::set_blur`]
pub struct CutoutCompletion {
    generation: u64,
    result: Result<Cutout>,
}

impl CutoutCompletion {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// In-flight cutout request for one source generation
pub struct PendingCutout {
    generation: u64,
    inner: BoxFuture<'static, CutoutCompletion>,
}

impl PendingCutout {
    /// Generation of the image this request was issued for
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Future for PendingCutout {
    type Output = CutoutCompletion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

/// Owns one editing session
pub struct EditorController {
    config: EditorConfig,
    engine: CompositionEngine,
    decoder: Arc<dyn BitmapDecoder>,
    provider: Arc<dyn CutoutProvider>,
    source: Option<Arc<SourceImage>>,
    cutout: Option<Cutout>,
    state: EditorState,
    generation: u64,
    upload_ticket: u64,
    frame: Option<RenderFrame>,
    notices: Vec<Notice>,
    rng: StdRng,
    render_count: u64,
    cutout_requests: u64,
}

impl EditorController {
    /// Create a controller decoding uploads with the `image` crate
    ///
    /// # Errors
    /// - Invalid configuration
    pub fn new(config: EditorConfig, provider: Arc<dyn CutoutProvider>) -> Result<Self> {
        Self::with_decoder(config, provider, Arc::new(ImageCrateDecoder))
    }

    /// Create a controller with an explicit decoder
    ///
    /// # Errors
    /// - Invalid configuration
    pub fn with_decoder(
        config: EditorConfig,
        provider: Arc<dyn CutoutProvider>,
        decoder: Arc<dyn BitmapDecoder>,
    ) -> Result<Self> {
        config.validate()?;
        let rng = match config.grain_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            engine: CompositionEngine::from_config(&config),
            config,
            decoder,
            provider,
            source: None,
            cutout: None,
            state: EditorState::default(),
            generation: 0,
            upload_ticket: 0,
            frame: None,
            notices: Vec::new(),
            rng,
            render_count: 0,
            cutout_requests: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> EditorState {
        self.state
    }

    #[must_use]
    pub fn phase(&self) -> EditorPhase {
        if self.source.is_none() {
            EditorPhase::Empty
        } else if self.state.processing {
            EditorPhase::AwaitingCutout
        } else if self.state.has_cutout {
            EditorPhase::ReadyWithCutout
        } else {
            EditorPhase::Ready
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn cutout(&self) -> Option<&Cutout> {
        self.cutout.as_ref()
    }

    /// Most recently rendered frame
    #[must_use]
    pub fn frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    /// Generation of the installed image, zero before the first upload
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sliders and download are usable
    #[must_use]
    pub fn controls_enabled(&self) -> bool {
        self.source.is_some() && !self.state.processing
    }

    #[must_use]
    pub fn download_enabled(&self) -> bool {
        self.controls_enabled() && self.frame.is_some()
    }

    /// Loading indicator visibility
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.processing
    }

    /// Number of renders performed so far
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Number of cutout requests issued so far
    #[must_use]
    pub fn cutout_requests(&self) -> u64 {
        self.cutout_requests
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain pending user-visible notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        warn!(notice = %notice, "User notice");
        self.notices.push(notice);
    }

    /// Start decoding an upload
    ///
    /// Non-image files are rejected here with a notice and leave the session
    /// untouched. Uploads are accepted in every phase; a newer upload
    /// supersedes older ones that have not finished decoding.
    ///
    /// # Errors
    /// - [`EditorError::InvalidInput`] when the file is not an image
    #[instrument(skip(self, file), fields(file_name = %file.name, mime_type = %file.mime_type))]
    pub fn begin_upload(&mut self, file: FileInput) -> Result<PendingDecode> {
        if let Err(error) = validate_file_input(&file) {
            self.notify(Notice::NotAnImage {
                file_name: file.name.clone(),
            });
            return Err(error);
        }

        self.upload_ticket += 1;
        let ticket = self.upload_ticket;
        let decoder = Arc::clone(&self.decoder);
        let FileInput { name, bytes, .. } = file;
        debug!(ticket, size_bytes = bytes.len(), "Decoding upload");

        let inner = async move {
            let result = decoder.decode(bytes).await;
            DecodeCompletion {
                ticket,
                file_name: name,
                result,
            }
        }
        .boxed();

        Ok(PendingDecode { ticket, inner })
    }

    /// Install a decoded upload as the new source image
    #[instrument(skip_all, fields(ticket = completion.ticket, file_name = %completion.file_name))]
    pub fn finish_upload(&mut self, completion: DecodeCompletion) -> Completion {
        if completion.ticket != self.upload_ticket {
            debug!(latest = self.upload_ticket, "Ignoring superseded upload");
            return Completion::Discarded;
        }

        let prepared = completion.result.and_then(|image| {
            prepare_source(
                &image,
                &completion.file_name,
                self.config.max_display_width,
                self.config.resize_filter,
            )
        });

        let source = match prepared {
            Ok(source) => source,
            Err(error) => {
                self.notify(Notice::DecodeFailed {
                    file_name: completion.file_name,
                    reason: error.to_string(),
                });
                return Completion::Failed;
            },
        };

        self.generation += 1;
        info!(
            generation = self.generation,
            width = source.width(),
            height = source.height(),
            "Installed new source image"
        );
        self.source = Some(Arc::new(source));
        self.cutout = None;
        self.state = EditorState::default();
        self.render();
        Completion::Applied
    }

    /// Decode and install an upload in one step
    ///
    /// # Errors
    /// - [`EditorError::InvalidInput`] when the file is not an image
    pub async fn upload(&mut self, file: FileInput) -> Result<Completion> {
        let pending = self.begin_upload(file)?;
        let completion = pending.await;
        Ok(self.finish_upload(completion))
    }

    fn ensure_controls_enabled(&self) -> Result<()> {
        if self.source.is_none() {
            return Err(EditorError::NoImage);
        }
        if self.state.processing {
            return Err(EditorError::ControlsDisabled("background removal in progress"));
        }
        Ok(())
    }

    /// Handle blur slider input
    ///
    /// Re-renders immediately. Raising blur above zero while no cutout exists
    /// and none is in flight disables the controls and returns the pending
    /// cutout request, which must be handed back through
    /// [`EditorController::complete_cutout`].
    ///
    /// # Errors
    /// - [`EditorError::NoImage`] before the first upload
    /// - [`EditorError::ControlsDisabled`] while a cutout is in flight
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn set_blur(&mut self, amount: u8) -> Result<Option<PendingCutout>> {
        self.ensure_controls_enabled()?;

        let clamped = amount.min(self.config.max_blur);
        if clamped != amount {
            warn!(requested = amount, max = self.config.max_blur, "Blur clamped");
        }
        self.state.blur_amount = clamped;

        let pending = if self.state.needs_cutout() {
            Some(self.start_cutout_request())
        } else {
            None
        };

        self.render();
        Ok(pending)
    }

    fn start_cutout_request(&mut self) -> PendingCutout {
        self.state.processing = true;
        self.cutout_requests += 1;

        let generation = self.generation;
        let provider = Arc::clone(&self.provider);
        let source = self.source.clone();
        info!(
            generation,
            backend = provider.name(),
            "Requesting background removal"
        );

        let inner = async move {
            let result = match source {
                Some(source) => provider.request_cutout(&source).await,
                None => Err(EditorError::NoImage),
            };
            CutoutCompletion { generation, result }
        }
        .boxed();

        PendingCutout { generation, inner }
    }

    /// Handle grain slider input; never starts a cutout request
    ///
    /// # Errors
    /// - [`EditorError::NoImage`] before the first upload
    /// - [`EditorError::ControlsDisabled`] while a cutout is in flight
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn set_grain(&mut self, amount: u8) -> Result<()> {
        self.ensure_controls_enabled()?;

        let clamped = amount.min(self.config.max_grain);
        if clamped != amount {
            warn!(requested = amount, max = self.config.max_grain, "Grain clamped");
        }
        self.state.grain_amount = clamped;
        self.render();
        Ok(())
    }

    /// Apply the result of a cutout request
    ///
    /// Results for an image that has since been replaced are discarded.
    /// Failures raise a notice, re-enable the controls and leave the session
    /// without a cutout so a later blur change can retry.
    #[instrument(skip_all, fields(request_generation = completion.generation, generation = self.generation))]
    pub fn complete_cutout(&mut self, completion: CutoutCompletion) -> Completion {
        if completion.generation != self.generation || !self.state.processing {
            debug!("Discarding cutout for a superseded image");
            return Completion::Discarded;
        }

        self.state.processing = false;
        match completion.result {
            Ok(cutout) => {
                info!("Background removal finished");
                self.cutout = Some(cutout);
                self.state.has_cutout = true;
                self.render();
                Completion::Applied
            },
            Err(error) => {
                self.notify(Notice::CutoutFailed {
                    reason: error.to_string(),
                });
                self.cutout = None;
                self.state.has_cutout = false;
                self.render();
                Completion::Failed
            },
        }
    }

    /// Await a pending request and apply its result
    pub async fn drive_cutout(&mut self, pending: PendingCutout) -> Completion {
        let completion = pending.await;
        self.complete_cutout(completion)
    }

    /// Recompose the visible frame from the current state
    pub fn render(&mut self) {
        let Some(source) = self.source.as_deref() else {
            return;
        };

        let frame = self.engine.render(
            source,
            self.cutout.as_ref(),
            &self.state,
            self.generation,
            &mut self.rng,
        );
        self.frame = Some(frame);
        self.render_count += 1;
    }

    /// Encode the current frame as `<original-basename>_edited.png`
    ///
    /// # Errors
    /// - [`EditorError::NoImage`] before the first upload
    /// - [`EditorError::ControlsDisabled`] while a cutout is in flight
    /// - [`EditorError::Export`] if encoding fails
    #[instrument(skip(self))]
    pub fn export(&self) -> Result<ExportedImage> {
        self.ensure_controls_enabled()?;
        let (Some(frame), Some(source)) = (self.frame.as_ref(), self.source.as_deref()) else {
            return Err(EditorError::NoImage);
        };
        export_png(&frame.image, &source.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::{png_file, MockCutoutProvider};

    fn controller(provider: &MockCutoutProvider) -> EditorController {
        let config = EditorConfig::builder().grain_seed(11).build().unwrap();
        EditorController::new(config, Arc::new(provider.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let provider = MockCutoutProvider::new();
        let mut editor = controller(&provider);

        assert_eq!(editor.phase(), EditorPhase::Empty);
        assert!(!editor.controls_enabled());
        assert!(!editor.download_enabled());
        assert!(matches!(editor.set_blur(3), Err(EditorError::NoImage)));
        assert!(matches!(editor.set_grain(3), Err(EditorError::NoImage)));
        assert!(matches!(editor.export(), Err(EditorError::NoImage)));
    }

    #[tokio::test]
    async fn test_upload_resets_state() {
        let provider = MockCutoutProvider::new();
        let mut editor = controller(&provider);

        let outcome = editor.upload(png_file("a.png", 20, 10)).await.unwrap();
        assert_eq!(outcome, Completion::Applied);
        assert_eq!(editor.phase(), EditorPhase::Ready);
        assert_eq!(editor.state(), EditorState::default());
        assert!(editor.download_enabled());
        assert_eq!(editor.generation(), 1);
        assert_eq!(editor.render_count(), 1);
    }

    #[tokio::test]
    async fn test_controls_disabled_while_processing() {
        let provider = MockCutoutProvider::new();
        let mut editor = controller(&provider);
        editor.upload(png_file("a.png", 20, 10)).await.unwrap();

        let pending = editor.set_blur(5).unwrap().expect("cutout request");
        assert_eq!(editor.phase(), EditorPhase::AwaitingCutout);
        assert!(editor.is_loading());
        assert!(!editor.download_enabled());
        assert!(matches!(editor.set_grain(1), Err(EditorError::ControlsDisabled(_))));
        assert!(matches!(editor.set_blur(6), Err(EditorError::ControlsDisabled(_))));
        assert!(matches!(editor.export(), Err(EditorError::ControlsDisabled(_))));

        assert_eq!(editor.drive_cutout(pending).await, Completion::Applied);
        assert_eq!(editor.phase(), EditorPhase::ReadyWithCutout);
        assert!(editor.controls_enabled());
    }

    #[tokio::test]
    async fn test_slider_values_are_clamped() {
        let provider = MockCutoutProvider::new();
        let mut editor = controller(&provider);
        editor.upload(png_file("a.png", 8, 8)).await.unwrap();

        editor.set_grain(200).unwrap();
        assert_eq!(editor.state().grain_amount, 50);

        let pending = editor.set_blur(99).unwrap().unwrap();
        assert_eq!(editor.state().blur_amount, 15);
        editor.drive_cutout(pending).await;
    }

    #[tokio::test]
    async fn test_completion_after_reupload_is_discarded() {
        let provider = MockCutoutProvider::new();
        let mut editor = controller(&provider);
        editor.upload(png_file("a.png", 8, 8)).await.unwrap();

        let stale = editor.set_blur(4).unwrap().unwrap();
        assert_eq!(stale.generation(), 1);
        editor.upload(png_file("b.png", 8, 8)).await.unwrap();

        let completion = stale.await;
        assert!(completion.is_ok());
        assert_eq!(editor.complete_cutout(completion), Completion::Discarded);
        assert!(editor.cutout().is_none());
        assert_eq!(editor.phase(), EditorPhase::Ready);
    }

    #[tokio::test]
    async fn test_superseded_decode_is_ignored() {
        let provider = MockCutoutProvider::new();
        let mut editor = controller(&provider);

        let first = editor.begin_upload(png_file("first.png", 4, 4)).unwrap();
        let second = editor.begin_upload(png_file("second.png", 6, 6)).unwrap();
        assert!(second.ticket() > first.ticket());

        let second_done = second.await;
        let first_done = first.await;
        assert_eq!(editor.finish_upload(second_done), Completion::Applied);
        assert_eq!(editor.finish_upload(first_done), Completion::Discarded);
        assert_eq!(editor.source().unwrap().file_name, "second.png");
    }
}
