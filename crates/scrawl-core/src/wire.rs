//! Scrawl wire format — the serial chunk protocol.
//!
//! These constants and types ARE the protocol. The peer (host-side sender)
//! must agree on every byte here. Frame layout, in order:
//!
//!   START(1) | TYPE(1) | OFF_LO(1) | OFF_HI(1) | LENGTH(1) | PAYLOAD(LENGTH) | CHECKSUM(1)
//!
//! The header is #[repr(C, packed)] for deterministic layout and uses
//! zerocopy derives for allocation-free parsing. There is no unsafe code
//! in this module.

use bytes::Bytes;
use static_assertions::assert_eq_size;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Sentinel byte marking the start of a frame. The decoder discards
/// everything up to the next START, which is what makes the link
/// self-healing after corruption.
pub const START: u8 = 0xAA;

/// The only frame type currently recognized.
pub const TYPE_DATA: u8 = 0x01;

/// Acknowledgement sent after a frame passes validation.
pub const ACK_OK: u8 = 0x55;

/// Acknowledgement sent after any rejection. The sender retries the frame.
pub const ACK_BAD: u8 = 0xEE;

/// Image size in bytes: 28x28 grayscale, row-major.
pub const IMAGE_BYTES: usize = 784;

// ── Frame header ──────────────────────────────────────────────────────────────

/// The 4 header bytes that follow START on the wire.
///
/// The offset is a little-endian u16 split across two bytes so the
/// sender never has to emit a multi-byte integer.
///
/// Wire size: 4 bytes.
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct FrameHeader {
    /// Frame type. Only TYPE_DATA is recognized.
    pub frame_type: u8,
    /// Low byte of the image offset.
    pub offset_lo: u8,
    /// High byte of the image offset.
    pub offset_hi: u8,
    /// Payload length in bytes. Zero is invalid.
    pub length: u8,
}

// Compile-time size guard. If this fails, the wire format has silently changed.
assert_eq_size!(FrameHeader, [u8; 4]);

impl FrameHeader {
    /// Image offset this frame writes to, composed from the two offset bytes.
    pub fn offset(&self) -> u16 {
        u16::from_le_bytes([self.offset_lo, self.offset_hi])
    }

    /// XOR of the four header bytes — the seed of the frame checksum.
    pub fn checksum_seed(&self) -> u8 {
        self.frame_type ^ self.offset_lo ^ self.offset_hi ^ self.length
    }
}

/// Frame checksum: XOR over the header bytes and every payload byte.
///
/// Detects all odd-weight corruption, in particular every single-bit flip.
/// Certain even-weight multi-bit patterns cancel out — an inherent property
/// of XOR checksums the retrying sender is expected to tolerate.
pub fn checksum(header: &FrameHeader, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(header.checksum_seed(), |acc, byte| acc ^ byte)
}

// ── Chunk ─────────────────────────────────────────────────────────────────────

/// One validated chunk of image data.
///
/// Exists only between decoding a frame and applying it to the image
/// buffer; never persisted. Invariant (enforced by the decoder):
/// `offset + payload.len() <= IMAGE_BYTES`.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Image offset of the first payload byte.
    pub offset: u16,
    /// Payload bytes, 1..=255 of them.
    pub payload: Bytes,
}

// ── Rejections ────────────────────────────────────────────────────────────────

/// Classified reasons for rejecting a frame. All are non-fatal; every
/// rejection produces exactly one ACK_BAD and the next decode resyncs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Unrecognized frame type. The framing does not say how many payload
    /// bytes follow an unknown type, so nothing is drained; the resync
    /// scan recovers on the next decode.
    #[error("unrecognized frame type: 0x{0:02x}")]
    BadType(u8),

    /// Zero length, or offset + length past the end of the image.
    /// Payload and checksum bytes are drained to keep the stream aligned.
    #[error("chunk bounds out of range: offset {offset}, length {length}")]
    BadBounds { offset: u16, length: u8 },

    /// Computed XOR disagrees with the transmitted checksum.
    /// The chunk is discarded wholesale; nothing is applied.
    #[error("checksum mismatch: computed 0x{computed:02x}, received 0x{received:02x}")]
    ChecksumMismatch { computed: u8, received: u8 },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
