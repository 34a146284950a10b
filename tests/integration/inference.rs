//! End-to-end inference: weight file → engine → session → reply byte.

use crate::*;
use std::sync::Arc;

use scrawl_core::model::ModelWeights;
use scrawl_core::wire::{ACK_OK, IMAGE_BYTES};
use scrawl_infer::{Classifier, SoftwareEngine};
use scrawl_link::SessionController;

#[test]
fn session_replies_with_argmax_of_bias2_for_zero_weights() {
    // Zero first layer: every hidden activation is ReLU(0) = 0 regardless
    // of the image, so the prediction is argmax(b2) with the lowest index
    // winning ties.
    let mut weights = ModelWeights::zeroed();
    weights.b2 = [0, 4, 4, 0, 0, 0, 0, 0, 0, 0];
    let engine = SoftwareEngine::new(Arc::new(weights));

    let mut chan = MemoryChannel::new();
    let image = [0xFFu8; IMAGE_BYTES];
    feed_image(&mut chan, &image, 240, &in_order(IMAGE_BYTES, 240));

    let mut controller = SessionController::new(chan, engine);
    assert_eq!(controller.run_session().unwrap(), 1);
}

#[test]
fn engine_survives_weight_file_round_trip() {
    let mut weights = ModelWeights::zeroed();
    weights.centering_offset = -128;
    weights.post_layer1_shift = 8;
    for (j, row) in weights.w1.iter_mut().enumerate() {
        for (i, cell) in row.iter_mut().enumerate() {
            *cell = (((i * 7 + j * 13) % 255) as u8) as i8;
        }
        weights.b1[j] = (j as i32 - 16) * 1000;
    }
    for (k, row) in weights.w2.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (((j * 11 + k * 3) % 255) as u8) as i8;
        }
        weights.b2[k] = k as i32 * 17 - 50;
    }

    let mut image = [0u8; IMAGE_BYTES];
    for (i, px) in image.iter_mut().enumerate() {
        *px = (i % 251) as u8;
    }

    let direct = SoftwareEngine::new(Arc::new(weights.clone())).predict(&image);
    let reloaded = ModelWeights::parse(&weights.encode()).unwrap();
    let via_file = SoftwareEngine::new(Arc::new(reloaded)).predict(&image);

    assert_eq!(direct, via_file, "file round-trip must be bit-exact");
}

#[test]
fn prediction_is_deterministic_through_the_session_layer() {
    let mut weights = ModelWeights::zeroed();
    weights.centering_offset = -128;
    weights.post_layer1_shift = 8;
    weights.w1[0][0] = 64;
    weights.w2[3][0] = 2;
    weights.b2[7] = 1;
    let engine = SoftwareEngine::new(Arc::new(weights));

    let mut image = [0u8; IMAGE_BYTES];
    image[0] = 255;
    let expected = engine.classify(&image).unwrap().class;

    let mut chan = MemoryChannel::new();
    feed_image(&mut chan, &image, 112, &in_order(IMAGE_BYTES, 112));
    feed_image(&mut chan, &image, 112, &in_order(IMAGE_BYTES, 112));

    let mut controller = SessionController::new(chan, engine);
    let first = controller.run_session().unwrap();
    let second = controller.run_session().unwrap();

    assert_eq!(first, expected);
    assert_eq!(first, second);
}

#[test]
fn all_zero_logits_tie_break_to_class_zero() {
    let engine = SoftwareEngine::new(Arc::new(ModelWeights::zeroed()));

    let mut chan = MemoryChannel::new();
    let image = [1u8; IMAGE_BYTES];
    feed_image(&mut chan, &image, 196, &in_order(IMAGE_BYTES, 196));

    let mut controller = SessionController::new(chan, engine);
    let class = controller.run_session().unwrap();
    assert_eq!(class, 0, "all-zero logits tie-break to class 0");
}

#[test]
fn centering_variants_disagree_as_expected() {
    // Same weights, two centering conventions — the deployed variants.
    // A single positive weight on one pixel makes the difference visible.
    let mut centered = ModelWeights::zeroed();
    centered.centering_offset = -128;
    centered.w1[0][0] = 1;
    centered.w2[1][0] = 1;

    let mut uncentered = centered.clone();
    uncentered.centering_offset = 0;

    let mut image = [0u8; IMAGE_BYTES];
    image[0] = 100;

    let centered_logit = SoftwareEngine::new(Arc::new(centered)).predict(&image).logits[1];
    let uncentered_logit = SoftwareEngine::new(Arc::new(uncentered))
        .predict(&image)
        .logits[1];

    assert_eq!(centered_logit, 0, "100 - 128 clamps to zero under ReLU");
    assert_eq!(uncentered_logit, 100);
}

#[test]
fn ack_stream_shape_matches_frame_count() {
    let engine = SoftwareEngine::new(Arc::new(ModelWeights::zeroed()));
    let mut chan = MemoryChannel::new();
    let image = [9u8; IMAGE_BYTES];
    feed_image(&mut chan, &image, 240, &in_order(IMAGE_BYTES, 240));

    let mut controller = SessionController::new(chan, engine);
    let class = controller.run_session().unwrap();

    // 784 bytes at 240 per frame = 4 frames: 4 ACK_OK then the class byte.
    let sent = controller.channel().sent();
    assert_eq!(sent.len(), 5);
    assert!(sent[..4].iter().all(|&b| b == ACK_OK));
    assert_eq!(sent[4], class);
}
