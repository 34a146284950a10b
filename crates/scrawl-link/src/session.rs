//! Session controller — decode, acknowledge, classify, reply, repeat.
//!
//! Owns the byte channel for the session's duration. Strictly sequential:
//! decode → apply → completion check, and inference never starts before
//! the coverage map reports all 784 positions, so the classifier never
//! sees a partially written buffer.
//!
//! There is deliberately no retry counter or timeout. Liveness rests on a
//! well-behaved sender that keeps retrying until every offset is
//! acknowledged; a watchdog, if wanted, belongs to an outer supervisor.

use anyhow::{Context, Result};
use scrawl_infer::Classifier;

use scrawl_core::wire::{ACK_BAD, ACK_OK};

use crate::channel::ByteChannel;
use crate::decoder::{DecodeOutcome, FrameDecoder};
use crate::reassembler::ImageReassembler;

pub struct SessionController<C, K> {
    channel: C,
    classifier: K,
    decoder: FrameDecoder,
    reassembler: ImageReassembler,
}

impl<C: ByteChannel, K: Classifier> SessionController<C, K> {
    pub fn new(channel: C, classifier: K) -> Self {
        Self {
            channel,
            classifier,
            decoder: FrameDecoder::new(),
            reassembler: ImageReassembler::new(),
        }
    }

    /// The underlying channel. Tests and diagnostics only.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Serve forever. Returns only on channel or classifier failure.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.run_session()?;
        }
    }

    /// Receive one complete image, classify it, and send the reply byte.
    /// Returns the predicted class.
    pub fn run_session(&mut self) -> Result<u8> {
        self.reassembler.reset();
        let mut accepted = 0u32;
        let mut rejected = 0u32;

        while !self.reassembler.is_complete() {
            let outcome = self
                .decoder
                .decode_one(&mut self.channel)
                .context("byte channel failed while decoding")?;

            // Exactly one acknowledgement byte per frame attempt.
            match outcome {
                DecodeOutcome::Accepted(chunk) => {
                    self.reassembler.apply(&chunk);
                    accepted += 1;
                    self.channel.send_byte(ACK_OK)?;
                    tracing::trace!(
                        offset = chunk.offset,
                        len = chunk.payload.len(),
                        covered = self.reassembler.covered_count(),
                        "chunk applied"
                    );
                }
                DecodeOutcome::Rejected(rejection) => {
                    rejected += 1;
                    self.channel.send_byte(ACK_BAD)?;
                    tracing::warn!(error = %rejection, "frame rejected");
                }
            }
        }

        let image = self.reassembler.image();
        let prediction = self.classifier.classify(image).context("classifier failed")?;
        self.channel.send_byte(prediction.class)?;

        tracing::info!(
            class = prediction.class,
            frames = accepted,
            rejected,
            image_head = hex::encode(&image[..8]),
            "image classified"
        );
        Ok(prediction.class)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
