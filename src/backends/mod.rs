//! Cutout backend implementations
//!
//! - Remote HTTP backend returning a ready cutout (feature `remote`)
//! - Segmentation-mask adapter, applying the mask to the source
//! - Full-cutout model adapter
//! - File-backed models serving precomputed masks and cutouts

pub mod file;
pub mod mask;
pub mod model;

#[cfg(feature = "remote")]
pub mod remote;

// Mock provider and fixtures for unit tests, integration tests and benches
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use self::file::{StaticCutout, StaticMask};
pub use self::mask::{apply_mask_destination_in, MaskCutoutProvider, SegmentationModel};
pub use self::model::{CutoutModel, ModelCutoutProvider};

#[cfg(feature = "remote")]
pub use self::remote::RemoteCutoutProvider;
