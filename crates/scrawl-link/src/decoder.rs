//! Frame decoder — one validated chunk (or a classified rejection) per call.
//!
//! The decoder never assumes prior alignment: every call starts with a
//! resync scan that discards bytes until the START marker, so the link
//! heals itself after garbage, partial frames, or noise. Payload bytes
//! are staged in a scratch buffer and only surfaced as a Chunk once the
//! checksum verifies — a failed frame leaves no trace.

use std::io;

use bytes::Bytes;

use scrawl_core::wire::{Chunk, FrameHeader, Rejection, IMAGE_BYTES, START, TYPE_DATA};

use crate::channel::ByteChannel;

/// Outcome of one decode attempt. Both variants consume a whole frame
/// attempt off the wire and map 1:1 to one acknowledgement byte.
#[derive(Debug)]
pub enum DecodeOutcome {
    Accepted(Chunk),
    Rejected(Rejection),
}

/// Stateless between calls apart from a reused scratch buffer.
pub struct FrameDecoder {
    scratch: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            scratch: Vec::with_capacity(u8::MAX as usize),
        }
    }

    /// Block until one frame attempt completes. Errors are channel
    /// failures only; protocol violations come back as `Rejected`.
    pub fn decode_one<C: ByteChannel>(&mut self, chan: &mut C) -> io::Result<DecodeOutcome> {
        // Resync scan. Unconditionally discards anything before START.
        let mut skipped = 0usize;
        loop {
            if chan.recv_byte()? == START {
                break;
            }
            skipped += 1;
        }
        if skipped > 0 {
            tracing::debug!(skipped, "resynchronized after discarding bytes");
        }

        let header = FrameHeader {
            frame_type: chan.recv_byte()?,
            offset_lo: chan.recv_byte()?,
            offset_hi: chan.recv_byte()?,
            length: chan.recv_byte()?,
        };

        // An unknown type does not tell us how many payload bytes follow,
        // so there is nothing safe to drain; the next resync scan recovers.
        if header.frame_type != TYPE_DATA {
            return Ok(DecodeOutcome::Rejected(Rejection::BadType(header.frame_type)));
        }

        let offset = header.offset();
        let length = header.length;

        if length == 0 || offset as usize + length as usize > IMAGE_BYTES {
            // Drain payload + checksum so the stream stays aligned.
            for _ in 0..=length {
                chan.recv_byte()?;
            }
            return Ok(DecodeOutcome::Rejected(Rejection::BadBounds { offset, length }));
        }

        // Stage payload in scratch while accumulating the running XOR.
        self.scratch.clear();
        let mut computed = header.checksum_seed();
        for _ in 0..length {
            let byte = chan.recv_byte()?;
            computed ^= byte;
            self.scratch.push(byte);
        }
        let received = chan.recv_byte()?;

        if computed != received {
            return Ok(DecodeOutcome::Rejected(Rejection::ChecksumMismatch {
                computed,
                received,
            }));
        }

        Ok(DecodeOutcome::Accepted(Chunk {
            offset,
            payload: Bytes::copy_from_slice(&self.scratch),
        }))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
