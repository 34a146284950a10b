//! scrawl-link — the serial transfer layer.
//!
//! Owns everything between raw bytes and a complete image: the blocking
//! byte channel, frame decoding with resynchronization, image reassembly,
//! and the session loop that ties them to a classifier.

pub mod channel;
pub mod decoder;
pub mod reassembler;
pub mod session;

pub use channel::{ByteChannel, MemoryChannel, SerialChannel};
pub use decoder::{DecodeOutcome, FrameDecoder};
pub use reassembler::ImageReassembler;
pub use session::SessionController;
