//! Scrawl integration test harness.
//!
//! These tests exercise the whole receive path — decoder, reassembler,
//! session controller, inference — over an in-memory byte channel.
//! No hardware, no serial device; the MemoryChannel plays the sender.

use scrawl_core::wire::{checksum, FrameHeader, START, TYPE_DATA};
use scrawl_link::MemoryChannel;

mod inference;
mod transfer;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Build one well-formed frame for the given image offset and payload.
pub fn frame(offset: u16, payload: &[u8]) -> Vec<u8> {
    assert!(!payload.is_empty() && payload.len() <= u8::MAX as usize);
    let [offset_lo, offset_hi] = offset.to_le_bytes();
    let header = FrameHeader {
        frame_type: TYPE_DATA,
        offset_lo,
        offset_hi,
        length: payload.len() as u8,
    };

    let mut out = vec![START, TYPE_DATA, offset_lo, offset_hi, header.length];
    out.extend_from_slice(payload);
    out.push(checksum(&header, payload));
    out
}

/// Feed an entire image as frames of `chunk_size` bytes, in the order
/// given by `schedule` (indices into the chunk list, duplicates allowed).
pub fn feed_image(chan: &mut MemoryChannel, image: &[u8], chunk_size: usize, schedule: &[usize]) {
    let chunks: Vec<(u16, &[u8])> = image
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, c)| ((i * chunk_size) as u16, c))
        .collect();

    for &idx in schedule {
        let (offset, payload) = chunks[idx];
        chan.feed(&frame(offset, payload));
    }
}

/// Identity schedule: every chunk once, in order.
pub fn in_order(image_len: usize, chunk_size: usize) -> Vec<usize> {
    (0..image_len.div_ceil(chunk_size)).collect()
}
