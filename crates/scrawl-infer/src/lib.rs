//! scrawl-infer — digit classification backends.
//!
//! Two interchangeable implementations of one capability: the fixed-point
//! software engine and the memory-mapped hardware accelerator. The session
//! layer only sees the `Classifier` trait and does not care which one is
//! wired in.

pub mod accel;
pub mod engine;

use anyhow::Result;
use scrawl_core::model::OUTPUT_CLASSES;
use scrawl_core::wire::IMAGE_BYTES;

/// Result of one inference call. Produced fresh per call, never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    /// Predicted class, 0..9.
    pub class: u8,
    /// Raw second-layer accumulator values. The accelerator backend only
    /// reports the class, so its logits are all zero.
    pub logits: [i32; OUTPUT_CLASSES],
}

/// Trait for classifier backends.
///
/// Intentionally minimal: a complete image in, a class out. No partial
/// images — the session layer guarantees full coverage before calling.
pub trait Classifier {
    /// Classify a complete 784-byte image.
    fn classify(&self, image: &[u8; IMAGE_BYTES]) -> Result<Prediction>;
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn classify(&self, image: &[u8; IMAGE_BYTES]) -> Result<Prediction> {
        (**self).classify(image)
    }
}

pub use accel::AccelClassifier;
pub use engine::SoftwareEngine;
