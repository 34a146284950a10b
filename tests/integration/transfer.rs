//! Transfer-protocol properties: round-trip reassembly, resync,
//! corruption handling, bounds rejection.

use crate::*;
use scrawl_core::wire::{Rejection, IMAGE_BYTES, START, TYPE_DATA};
use scrawl_link::{DecodeOutcome, FrameDecoder, ImageReassembler};

/// A deterministic test image with structure at every offset.
fn test_image() -> [u8; IMAGE_BYTES] {
    let mut image = [0u8; IMAGE_BYTES];
    for (i, px) in image.iter_mut().enumerate() {
        *px = (i as u32).wrapping_mul(31).wrapping_add(7) as u8;
    }
    image
}

fn drain_to_completion(chan: &mut MemoryChannel, reassembler: &mut ImageReassembler) {
    let mut decoder = FrameDecoder::new();
    while !reassembler.is_complete() {
        match decoder.decode_one(chan).expect("channel script ran dry") {
            DecodeOutcome::Accepted(chunk) => reassembler.apply(&chunk),
            DecodeOutcome::Rejected(_) => {}
        }
    }
}

#[test]
fn round_trip_in_order() {
    let image = test_image();
    let mut chan = MemoryChannel::new();
    feed_image(&mut chan, &image, 112, &in_order(IMAGE_BYTES, 112));

    let mut reassembler = ImageReassembler::new();
    drain_to_completion(&mut chan, &mut reassembler);
    assert_eq!(reassembler.image(), &image);
}

#[test]
fn round_trip_out_of_order_with_duplicates() {
    let image = test_image();
    // 16 chunks of 49 bytes; reversed order, several sent twice, and
    // one uneven split layered on top (chunk size 200, 4 chunks).
    let mut schedule: Vec<usize> = (0..16).rev().collect();
    schedule.extend([0, 7, 15, 7]);

    let mut chan = MemoryChannel::new();
    feed_image(&mut chan, &image, 49, &schedule);
    feed_image(&mut chan, &image, 200, &in_order(IMAGE_BYTES, 200));

    let mut reassembler = ImageReassembler::new();
    drain_to_completion(&mut chan, &mut reassembler);
    assert_eq!(reassembler.image(), &image);
}

#[test]
fn round_trip_single_byte_chunks() {
    let image = test_image();
    let mut chan = MemoryChannel::new();
    feed_image(&mut chan, &image, 1, &in_order(IMAGE_BYTES, 1));

    let mut reassembler = ImageReassembler::new();
    drain_to_completion(&mut chan, &mut reassembler);
    assert_eq!(reassembler.image(), &image);
}

#[test]
fn resync_survives_long_garbage_prefix() {
    let image = test_image();
    let mut chan = MemoryChannel::new();

    // 4 KiB of noise that never contains START, then a valid frame.
    let noise: Vec<u8> = (0..4096)
        .map(|i| {
            let b = (i as u32).wrapping_mul(97) as u8;
            if b == START {
                b ^ 0x01
            } else {
                b
            }
        })
        .collect();
    chan.feed(&noise);
    chan.feed(&frame(0, &image[..100]));

    let mut decoder = FrameDecoder::new();
    match decoder.decode_one(&mut chan).unwrap() {
        DecodeOutcome::Accepted(chunk) => {
            assert_eq!(chunk.offset, 0);
            assert_eq!(chunk.payload.as_ref(), &image[..100]);
        }
        other => panic!("expected acceptance after resync, got {other:?}"),
    }
}

#[test]
fn garbage_between_frames_does_not_poison_the_image() {
    let image = test_image();
    let mut chan = MemoryChannel::new();

    for (i, chunk) in image.chunks(196).enumerate() {
        chan.feed(&[0x00, 0x13, 0x37]); // inter-frame noise
        chan.feed(&frame((i * 196) as u16, chunk));
    }

    let mut reassembler = ImageReassembler::new();
    drain_to_completion(&mut chan, &mut reassembler);
    assert_eq!(reassembler.image(), &image);
}

#[test]
fn bounds_rejection_is_side_effect_free() {
    let mut chan = MemoryChannel::new();
    let [lo, hi] = 700u16.to_le_bytes();
    // offset 700 + length 100 > 784
    chan.feed(&[START, TYPE_DATA, lo, hi, 100]);
    chan.feed(&vec![0x5A; 101]); // payload + checksum, drained
    chan.feed(&[0xD1]); // sentinel: must remain unconsumed

    let mut decoder = FrameDecoder::new();
    let mut reassembler = ImageReassembler::new();

    match decoder.decode_one(&mut chan).unwrap() {
        DecodeOutcome::Rejected(Rejection::BadBounds {
            offset: 700,
            length: 100,
        }) => {}
        other => panic!("expected BadBounds, got {other:?}"),
    }

    assert_eq!(reassembler.covered_count(), 0);
    assert!(reassembler.image().iter().all(|&b| b == 0));
    assert_eq!(chan.remaining(), 1, "exactly length + 1 bytes drained");
}

#[test]
fn checksum_mismatch_leaves_coverage_untouched() {
    let image = test_image();
    let mut chan = MemoryChannel::new();

    let mut corrupted = frame(0, &image[..196]);
    corrupted[20] ^= 0x10; // payload bit flip
    chan.feed(&corrupted);

    let mut decoder = FrameDecoder::new();
    let mut reassembler = ImageReassembler::new();

    match decoder.decode_one(&mut chan).unwrap() {
        DecodeOutcome::Rejected(Rejection::ChecksumMismatch { .. }) => {}
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }
    assert_eq!(reassembler.covered_count(), 0);
    assert!(reassembler.image().iter().all(|&b| b == 0));
}
