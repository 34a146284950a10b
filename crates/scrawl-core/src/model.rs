//! Weight file format and loading.
//!
//! The training side exports quantized weights as one flat binary file:
//! a fixed header followed by the four tensors in declaration order,
//! narrow weights as raw i8 bytes and biases as little-endian i32.
//!
//!   header (16) | w1 (32*784 i8) | b1 (32 i32) | w2 (10*32 i8) | b2 (10 i32)
//!
//! Weights are loaded once at process start and never mutated; every
//! inference call shares them read-only.

use static_assertions::assert_eq_size;
use std::path::Path;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::wire::IMAGE_BYTES;

/// First-layer width.
pub const HIDDEN_UNITS: usize = 32;

/// Number of output classes (digits 0..9).
pub const OUTPUT_CLASSES: usize = 10;

const MAGIC: [u8; 4] = *b"SCWL";
const FORMAT_VERSION: u8 = 1;

const W1_BYTES: usize = HIDDEN_UNITS * IMAGE_BYTES;
const B1_BYTES: usize = HIDDEN_UNITS * 4;
const W2_BYTES: usize = OUTPUT_CLASSES * HIDDEN_UNITS;
const B2_BYTES: usize = OUTPUT_CLASSES * 4;

/// Weight file header. All multi-byte fields little-endian.
///
/// Wire size: 16 bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
struct WeightFileHeader {
    magic: [u8; 4],
    version: u8,
    _reserved: [u8; 3],
    /// Added to each raw pixel before the first layer. Deployed weight
    /// sets use either -128 (centered) or 0 (uncentered).
    centering_offset: i32,
    /// Right-shift applied to ReLU output before the second layer.
    post_layer1_shift: u32,
}

assert_eq_size!(WeightFileHeader, [u8; 16]);

const HEADER_BYTES: usize = 16;
const FILE_BYTES: usize = HEADER_BYTES + W1_BYTES + B1_BYTES + W2_BYTES + B2_BYTES;

// ── Weights ───────────────────────────────────────────────────────────────────

/// Immutable quantized weight set for the two-layer MLP.
#[derive(Debug, Clone)]
pub struct ModelWeights {
    /// First-layer weight matrix, one row per hidden unit.
    pub w1: Box<[[i8; IMAGE_BYTES]; HIDDEN_UNITS]>,
    /// First-layer biases.
    pub b1: [i32; HIDDEN_UNITS],
    /// Second-layer weight matrix, one row per output class.
    pub w2: [[i8; HIDDEN_UNITS]; OUTPUT_CLASSES],
    /// Second-layer biases.
    pub b2: [i32; OUTPUT_CLASSES],
    /// Added to each raw pixel before layer 1.
    pub centering_offset: i32,
    /// Right-shift applied to ReLU output before layer 2. Always < 32.
    pub post_layer1_shift: u32,
}

impl ModelWeights {
    /// All-zero weight set. Used by tests and as a placeholder before
    /// real weights are exported.
    pub fn zeroed() -> Self {
        Self {
            w1: Box::new([[0i8; IMAGE_BYTES]; HIDDEN_UNITS]),
            b1: [0i32; HIDDEN_UNITS],
            w2: [[0i8; HIDDEN_UNITS]; OUTPUT_CLASSES],
            b2: [0i32; OUTPUT_CLASSES],
            centering_offset: 0,
            post_layer1_shift: 0,
        }
    }

    /// Load a weight file, validating magic, version, shift, and size.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Parse a weight file image from memory.
    pub fn parse(data: &[u8]) -> Result<Self, ModelError> {
        if data.len() < HEADER_BYTES {
            return Err(ModelError::Truncated {
                expected: FILE_BYTES,
                actual: data.len(),
            });
        }

        let header = WeightFileHeader::read_from_prefix(&data[..HEADER_BYTES])
            .ok_or(ModelError::BadHeader)?;

        if header.magic != MAGIC {
            return Err(ModelError::BadMagic(header.magic));
        }
        if header.version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(header.version));
        }
        // Copy packed fields to locals to avoid unaligned reference UB.
        let centering_offset = header.centering_offset;
        let post_layer1_shift = header.post_layer1_shift;
        if post_layer1_shift >= 32 {
            return Err(ModelError::ShiftOutOfRange(post_layer1_shift));
        }
        if data.len() != FILE_BYTES {
            return Err(ModelError::Truncated {
                expected: FILE_BYTES,
                actual: data.len(),
            });
        }

        let mut weights = ModelWeights::zeroed();
        weights.centering_offset = centering_offset;
        weights.post_layer1_shift = post_layer1_shift;

        let mut cursor = HEADER_BYTES;

        for row in weights.w1.iter_mut() {
            for (dst, src) in row.iter_mut().zip(&data[cursor..cursor + IMAGE_BYTES]) {
                *dst = *src as i8;
            }
            cursor += IMAGE_BYTES;
        }
        for bias in weights.b1.iter_mut() {
            *bias = i32::from_le_bytes(data[cursor..cursor + 4].try_into().unwrap());
            cursor += 4;
        }
        for row in weights.w2.iter_mut() {
            for (dst, src) in row.iter_mut().zip(&data[cursor..cursor + HIDDEN_UNITS]) {
                *dst = *src as i8;
            }
            cursor += HIDDEN_UNITS;
        }
        for bias in weights.b2.iter_mut() {
            *bias = i32::from_le_bytes(data[cursor..cursor + 4].try_into().unwrap());
            cursor += 4;
        }

        Ok(weights)
    }

    /// Serialize to the weight file format. Used by export tooling and tests.
    pub fn encode(&self) -> Vec<u8> {
        let header = WeightFileHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            _reserved: [0; 3],
            centering_offset: self.centering_offset,
            post_layer1_shift: self.post_layer1_shift,
        };

        let mut out = Vec::with_capacity(FILE_BYTES);
        out.extend_from_slice(header.as_bytes());
        for row in self.w1.iter() {
            out.extend(row.iter().map(|w| *w as u8));
        }
        for bias in &self.b1 {
            out.extend_from_slice(&bias.to_le_bytes());
        }
        for row in &self.w2 {
            out.extend(row.iter().map(|w| *w as u8));
        }
        for bias in &self.b2 {
            out.extend_from_slice(&bias.to_le_bytes());
        }
        out
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read weight file: {0}")]
    Io(#[from] std::io::Error),

    #[error("weight file header unreadable")]
    BadHeader,

    #[error("bad weight file magic: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported weight file version: {0}")]
    UnsupportedVersion(u8),

    #[error("weight file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("post-layer-1 shift {0} out of range (must be < 32)")]
    ShiftOutOfRange(u32),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
