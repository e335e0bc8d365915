//! Test utilities and a mock cutout provider
//!
//! The mock produces a cutout without any network or model dependency so the
//! controller's state machine can be exercised in isolation.

use crate::{
    cutout::CutoutProvider,
    error::{EditorError, Result},
    export::encode_png,
    types::{Cutout, FileInput, SourceImage},
};
use async_trait::async_trait;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

/// How the mock answers requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockBehavior {
    /// Opaque centre square, transparent border
    CentreSubject,
    /// Fully transparent result
    NoSubject,
    /// Backend error
    Fail,
}

/// Mock cutout provider recording every request
///
/// Clones share their call history, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone)]
pub struct MockCutoutProvider {
    behavior: Arc<Mutex<MockBehavior>>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl Default for MockCutoutProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCutoutProvider {
    /// Mock returning an opaque centre square as the subject
    #[must_use]
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(MockBehavior::CentreSubject)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock failing every request with a backend error
    #[must_use]
    pub fn new_failing() -> Self {
        let provider = Self::new();
        provider.set_behavior(MockBehavior::Fail);
        provider
    }

    /// Mock whose results contain no subject
    #[must_use]
    pub fn new_without_subject() -> Self {
        let provider = Self::new();
        provider.set_behavior(MockBehavior::NoSubject);
        provider
    }

    /// Switch subsequent requests to failing or succeeding
    pub fn set_failing(&self, failing: bool) {
        self.set_behavior(if failing {
            MockBehavior::Fail
        } else {
            MockBehavior::CentreSubject
        });
    }

    fn set_behavior(&self, behavior: MockBehavior) {
        if let Ok(mut current) = self.behavior.lock() {
            *current = behavior;
        }
    }

    /// File names of the sources requested so far, in order
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Number of requests made so far
    pub fn call_count(&self) -> usize {
        self.call_history.lock().map(|history| history.len()).unwrap_or(0)
    }

    fn record_call(&self, source: &SourceImage) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(source.file_name.clone());
        }
    }
}

/// Cutout with an opaque square covering the middle half of the canvas
#[must_use]
pub fn centre_subject(width: u32, height: u32) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let inside_x = x >= width / 4 && x < width - width / 4;
        let inside_y = y >= height / 4 && y < height - height / 4;
        if inside_x && inside_y {
            Rgba([220, 40, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

#[async_trait]
impl CutoutProvider for MockCutoutProvider {
    async fn request_cutout(&self, source: &SourceImage) -> Result<Cutout> {
        self.record_call(source);
        let behavior = self
            .behavior
            .lock()
            .map(|behavior| *behavior)
            .unwrap_or(MockBehavior::Fail);
        let (width, height) = source.display_dimensions();

        match behavior {
            MockBehavior::CentreSubject => Ok(Cutout::new(centre_subject(width, height))),
            MockBehavior::NoSubject => Err(EditorError::NoSubject),
            MockBehavior::Fail => Err(EditorError::cutout_backend("simulated backend failure")),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// PNG bytes of a `width`×`height` image with a horizontal stripe pattern
#[must_use]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, _| {
        if x % 2 == 0 {
            Rgba([30, 60, 90, 255])
        } else {
            Rgba([200, 210, 220, 255])
        }
    });
    encode_png(&image).unwrap_or_default()
}

/// A PNG upload named `name`
#[must_use]
pub fn png_file(name: &str, width: u32, height: u32) -> FileInput {
    FileInput::new(name, "image/png", png_bytes(width, height))
}
