//! scrawl-core — wire format, configuration, and weight loading.
//! All other scrawl crates depend on this one.

pub mod config;
pub mod model;
pub mod wire;

pub use model::ModelWeights;
pub use wire::{Chunk, Rejection};
