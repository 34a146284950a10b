//! Memory-mapped hardware accelerator backend.
//!
//! The FPGA classifier exposes a 4-register AXI window. The driver writes
//! all 784 (index, value) pixel pairs, pulses CTRL, busy-polls STATUS
//! until the done bit rises, and reads the predicted class nibble.
//!
//! Register block layout:
//!
//!   0x00  CTRL         bit0 = start pulse
//!   0x04  PIXEL_VALUE  pixel byte being loaded
//!   0x08  PIXEL_INDEX  raster index 0..783; writing commits the pair
//!   0x0C  STATUS       bit0 = done, bits 4..7 = predicted class
//!
//! The window is mapped over /dev/mem with O_SYNC and accessed through
//! volatile reads/writes — the compiler must not elide or reorder them.

use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::ptr;

use anyhow::{Context, Result};
use memmap2::{MmapMut, MmapOptions};
use scrawl_core::model::OUTPUT_CLASSES;
use scrawl_core::wire::IMAGE_BYTES;

use crate::{Classifier, Prediction};

const REG_CTRL: usize = 0x00;
const REG_PIXEL_VALUE: usize = 0x04;
const REG_PIXEL_INDEX: usize = 0x08;
const REG_STATUS: usize = 0x0C;

const CTRL_START: u32 = 0x1;
const STATUS_DONE: u32 = 0x1;
const STATUS_CLASS_SHIFT: u32 = 4;

/// Size of the mapped register window. One page; the base address must be
/// page-aligned, which the AXI address map guarantees.
const REG_WINDOW: usize = 0x1000;

/// Classifier backed by the memory-mapped accelerator.
///
/// Holds the mapping for its lifetime. Not Send — the register window is
/// owned exclusively by the session thread.
pub struct AccelClassifier {
    _window: MmapMut,
    base: *mut u8,
}

impl AccelClassifier {
    /// Map the accelerator register block at the given physical address.
    pub fn map(phys_base: u64) -> Result<Self> {
        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .context("failed to open /dev/mem — accelerator backend needs root")?;

        let mut window = unsafe {
            MmapOptions::new()
                .offset(phys_base)
                .len(REG_WINDOW)
                .map_mut(&mem)
        }
        .with_context(|| format!("failed to map accelerator registers at {phys_base:#x}"))?;

        let base = window.as_mut_ptr();
        let base_hex = format!("{phys_base:#x}");
        tracing::info!(base = %base_hex, "accelerator mapped");
        Ok(Self {
            _window: window,
            base,
        })
    }

    /// Backend over an anonymous mapping — register plumbing tests only.
    #[cfg(test)]
    fn map_anon() -> Self {
        let mut window = MmapMut::map_anon(REG_WINDOW).unwrap();
        let base = window.as_mut_ptr();
        Self {
            _window: window,
            base,
        }
    }

    fn write_reg(&self, offset: usize, value: u32) {
        // Register offsets are 4-byte aligned within the page-aligned window.
        unsafe { ptr::write_volatile(self.base.add(offset) as *mut u32, value) }
    }

    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { ptr::read_volatile(self.base.add(offset) as *const u32) }
    }
}

impl Classifier for AccelClassifier {
    fn classify(&self, image: &[u8; IMAGE_BYTES]) -> Result<Prediction> {
        // Load the image. Writing PIXEL_INDEX commits the (value, index) pair.
        for (index, &value) in image.iter().enumerate() {
            self.write_reg(REG_PIXEL_VALUE, value as u32);
            self.write_reg(REG_PIXEL_INDEX, index as u32);
        }

        // Pulse start.
        self.write_reg(REG_CTRL, CTRL_START);
        self.write_reg(REG_CTRL, 0);

        // Busy-poll until the accelerator reports done. Liveness is the
        // hardware's contract; a watchdog would live outside this driver.
        let status = loop {
            let status = self.read_reg(REG_STATUS);
            if status & STATUS_DONE != 0 {
                break status;
            }
        };

        let class = ((status >> STATUS_CLASS_SHIFT) & 0xF) as u8;
        if class as usize >= OUTPUT_CLASSES {
            anyhow::bail!("accelerator reported class {class} out of range");
        }

        // The hardware does not expose raw accumulators.
        Ok(Prediction {
            class,
            logits: [0; OUTPUT_CLASSES],
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
