//! Fixed-point software inference engine.
//!
//! A two-layer quantized MLP: 784 → 32 (ReLU, right-shift) → 10, all in
//! i32 arithmetic. Pure and deterministic — no state beyond the immutable
//! weight set, so the same image always yields the same logits bit for bit.
//!
//! Accumulator headroom: 784 inputs × |weight| ≤ 127 × |centered pixel|
//! ≤ 255 plus bias stays well inside i32, so no saturation logic is needed.

use std::sync::Arc;

use anyhow::Result;
use scrawl_core::model::{ModelWeights, HIDDEN_UNITS, OUTPUT_CLASSES};
use scrawl_core::wire::IMAGE_BYTES;

use crate::{Classifier, Prediction};

/// Software classifier over a shared, immutable weight set.
#[derive(Clone)]
pub struct SoftwareEngine {
    weights: Arc<ModelWeights>,
}

impl SoftwareEngine {
    pub fn new(weights: Arc<ModelWeights>) -> Self {
        Self { weights }
    }

    /// Run the full forward pass and return class plus raw logits.
    pub fn predict(&self, image: &[u8; IMAGE_BYTES]) -> Prediction {
        let w = &self.weights;

        // Layer 1: h[j] = ReLU(w1[j] · (x + centering_offset) + b1[j]),
        // then the quantization shift. ReLU comes first so the operand of
        // the shift is non-negative, making the arithmetic shift equal to
        // division by 2^shift. That ordering is load-bearing.
        let mut hidden = [0i32; HIDDEN_UNITS];
        for (j, row) in w.w1.iter().enumerate() {
            let mut acc = w.b1[j];
            for (i, &weight) in row.iter().enumerate() {
                acc += weight as i32 * (image[i] as i32 + w.centering_offset);
            }
            hidden[j] = acc.max(0) >> w.post_layer1_shift;
        }

        // Layer 2: logits[k] = w2[k] · hidden + b2[k].
        let mut logits = [0i32; OUTPUT_CLASSES];
        for (k, row) in w.w2.iter().enumerate() {
            let mut acc = w.b2[k];
            for (j, &weight) in row.iter().enumerate() {
                acc += weight as i32 * hidden[j];
            }
            logits[k] = acc;
        }

        Prediction {
            class: argmax(&logits) as u8,
            logits,
        }
    }
}

impl Classifier for SoftwareEngine {
    fn classify(&self, image: &[u8; IMAGE_BYTES]) -> Result<Prediction> {
        Ok(self.predict(image))
    }
}

/// Index of the maximum logit. Strictly-greater comparison, so the lowest
/// index wins all ties.
fn argmax(logits: &[i32; OUTPUT_CLASSES]) -> usize {
    let mut best_idx = 0;
    let mut best_val = logits[0];
    for (k, &val) in logits.iter().enumerate().skip(1) {
        if val > best_val {
            best_val = val;
            best_idx = k;
        }
    }
    best_idx
}

// ── Tests ─────────────────────────────────────────────────────────────────────
