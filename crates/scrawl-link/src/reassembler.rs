//! Image reassembly — fixed buffer plus coverage map.
//!
//! Session-scoped state, constructed fresh (or reset) per receive
//! session. Coverage is monotonic within a session: a position once
//! covered stays covered, and the covered count always equals the number
//! of covered positions. Duplicate offsets overwrite unconditionally —
//! last writer wins, which matches a sender that retries until every
//! range is acknowledged.

use scrawl_core::wire::{Chunk, IMAGE_BYTES};

pub struct ImageReassembler {
    image: Box<[u8; IMAGE_BYTES]>,
    covered: Box<[bool; IMAGE_BYTES]>,
    covered_count: usize,
}

impl ImageReassembler {
    pub fn new() -> Self {
        Self {
            image: Box::new([0u8; IMAGE_BYTES]),
            covered: Box::new([false; IMAGE_BYTES]),
            covered_count: 0,
        }
    }

    /// Zero the buffer and clear all coverage. Called once per session
    /// before the first decode attempt.
    pub fn reset(&mut self) {
        self.image.fill(0);
        self.covered.fill(false);
        self.covered_count = 0;
    }

    /// Apply a validated chunk. The decoder guarantees the chunk is in
    /// bounds; only validated chunks ever reach this point.
    pub fn apply(&mut self, chunk: &Chunk) {
        debug_assert!(chunk.offset as usize + chunk.payload.len() <= IMAGE_BYTES);

        for (i, &byte) in chunk.payload.iter().enumerate() {
            let idx = chunk.offset as usize + i;
            if !self.covered[idx] {
                self.covered[idx] = true;
                self.covered_count += 1;
            }
            self.image[idx] = byte;
        }
    }

    /// True once every one of the 784 positions has been covered.
    pub fn is_complete(&self) -> bool {
        self.covered_count == IMAGE_BYTES
    }

    /// Number of covered positions so far.
    pub fn covered_count(&self) -> usize {
        self.covered_count
    }

    /// The image buffer. Only meaningful once `is_complete()`.
    pub fn image(&self) -> &[u8; IMAGE_BYTES] {
        &self.image
    }
}

impl Default for ImageReassembler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
