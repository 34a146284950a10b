//! scrawl-ctl — host-side sender for the scrawl daemon.
//!
//! `send` chunks a raw 784-byte image file into frames, transmits them
//! over the serial link with per-frame acknowledgement and retry, and
//! prints the class the device replies with. `check` runs the software
//! engine locally against a weight file — handy for verifying that the
//! device and the host agree on a prediction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use zerocopy::AsBytes;

use scrawl_core::model::ModelWeights;
use scrawl_core::wire::{checksum, FrameHeader, ACK_BAD, ACK_OK, IMAGE_BYTES, START, TYPE_DATA};
use scrawl_infer::SoftwareEngine;
use scrawl_link::{ByteChannel, SerialChannel};

/// Largest payload per frame. Matches what the device-side scratch
/// buffer and the original sender tooling use.
const MAX_PAYLOAD: usize = 240;

/// Retries per frame before giving up on the link.
const FRAME_RETRIES: u32 = 3;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("send") => cmd_send(&args[1..]),
        Some("check") => cmd_check(&args[1..]),
        _ => {
            eprintln!("usage:");
            eprintln!("  scrawl-ctl send <image.bin> [device] [baud]");
            eprintln!("  scrawl-ctl check <image.bin> <weights.scw>");
            std::process::exit(2);
        }
    }
}

// ── send ──────────────────────────────────────────────────────────────────────

fn cmd_send(args: &[String]) -> Result<()> {
    let Some(image_path) = args.first() else {
        bail!("send: missing image file argument");
    };
    let device = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/dev/ttyUSB0"));
    let baud: u32 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(9600);

    let image = read_image(Path::new(image_path))?;
    let mut channel = SerialChannel::open(&device, baud)?;

    let mut offset = 0usize;
    while offset < image.len() {
        let payload = &image[offset..(offset + MAX_PAYLOAD).min(image.len())];
        send_frame(&mut channel, offset as u16, payload)
            .with_context(|| format!("chunk at offset {offset} failed"))?;
        offset += payload.len();
    }
    println!("sent {} bytes to {}", image.len(), device.display());

    let class = channel.recv_byte().context("no prediction byte received")?;
    println!("device predicted: {class}");
    Ok(())
}

/// Transmit one frame, waiting for its acknowledgement. Retries on
/// ACK_BAD — the receiver keeps its buffer untouched on rejection, so a
/// retry is always safe.
fn send_frame<C: ByteChannel>(channel: &mut C, offset: u16, payload: &[u8]) -> Result<()> {
    let [offset_lo, offset_hi] = offset.to_le_bytes();
    let header = FrameHeader {
        frame_type: TYPE_DATA,
        offset_lo,
        offset_hi,
        length: payload.len() as u8,
    };

    let mut frame = Vec::with_capacity(payload.len() + 6);
    frame.push(START);
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(payload);
    frame.push(checksum(&header, payload));

    for attempt in 1..=FRAME_RETRIES {
        for &byte in &frame {
            channel.send_byte(byte)?;
        }
        match channel.recv_byte()? {
            ACK_OK => return Ok(()),
            ACK_BAD => {
                eprintln!("offset {offset}: ACK_BAD on attempt {attempt}, retrying");
            }
            other => {
                eprintln!("offset {offset}: unexpected reply 0x{other:02x}, retrying");
            }
        }
    }
    bail!("no ACK_OK after {FRAME_RETRIES} attempts")
}

// ── check ─────────────────────────────────────────────────────────────────────

fn cmd_check(args: &[String]) -> Result<()> {
    let (Some(image_path), Some(weights_path)) = (args.first(), args.get(1)) else {
        bail!("check: expected <image.bin> <weights.scw>");
    };

    let image = read_image(Path::new(image_path))?;
    let weights = ModelWeights::load(Path::new(weights_path))
        .with_context(|| format!("failed to load weights from {weights_path}"))?;

    let engine = SoftwareEngine::new(Arc::new(weights));
    let prediction = engine.predict(&image);

    println!("class:  {}", prediction.class);
    println!("logits: {:?}", prediction.logits);
    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn read_image(path: &Path) -> Result<[u8; IMAGE_BYTES]> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read image file {}", path.display()))?;
    if data.len() != IMAGE_BYTES {
        bail!(
            "image file must be exactly {IMAGE_BYTES} bytes (28x28 grayscale), got {}",
            data.len()
        );
    }
    let mut image = [0u8; IMAGE_BYTES];
    image.copy_from_slice(&data);
    Ok(image)
}
