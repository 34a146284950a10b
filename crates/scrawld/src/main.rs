//! scrawld — serial-link digit recognition daemon.
//!
//! Receives 784-byte grayscale images over the chunk protocol, classifies
//! them with the configured backend, and replies with the predicted class.
//! Runs forever; liveness between images is the sender's problem.

use std::sync::Arc;

use anyhow::{Context, Result};

use scrawl_core::config::{Backend, ScrawlConfig};
use scrawl_core::model::ModelWeights;
use scrawl_infer::{AccelClassifier, Classifier, SoftwareEngine};
use scrawl_link::{SerialChannel, SessionController};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = ScrawlConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = ScrawlConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        ScrawlConfig::default()
    });

    let weights = ModelWeights::load(&config.model.weights_path).with_context(|| {
        format!(
            "failed to load weights from {}",
            config.model.weights_path.display()
        )
    })?;
    tracing::info!(
        path = %config.model.weights_path.display(),
        centering_offset = weights.centering_offset,
        shift = weights.post_layer1_shift,
        "weights loaded"
    );

    let classifier: Box<dyn Classifier> = match config.inference.backend {
        Backend::Software => Box::new(SoftwareEngine::new(Arc::new(weights))),
        Backend::Accel => Box::new(AccelClassifier::map(config.inference.accel_base)?),
    };

    let channel = SerialChannel::open(&config.link.device, config.link.baud)?;

    tracing::info!(
        device = %config.link.device.display(),
        backend = ?config.inference.backend,
        "ready — send 784-byte images via the chunk protocol"
    );

    SessionController::new(channel, classifier).run()
}
