//! Blocking byte channel over the physical link.
//!
//! The contract is deliberately narrow: send one byte, receive one byte,
//! return only once the byte is transferred. Any backend that blocks
//! until transfer — termios read, spin-poll on a FIFO, an in-memory
//! script — satisfies it.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use nix::sys::termios::{self, BaudRate, ControlFlags, SetArg, SpecialCharacterIndices};

/// One byte in, one byte out, blocking.
pub trait ByteChannel {
    /// Receive the next byte, blocking until one is available.
    fn recv_byte(&mut self) -> io::Result<u8>;

    /// Send one byte, blocking until it is accepted for transmission.
    fn send_byte(&mut self, byte: u8) -> io::Result<()>;
}

// ── Serial backend ────────────────────────────────────────────────────────────

/// Byte channel over a serial tty configured raw, 8N1.
pub struct SerialChannel {
    file: File,
}

impl SerialChannel {
    /// Open and configure the serial device.
    pub fn open(device: &Path, baud: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .with_context(|| format!("failed to open serial device {}", device.display()))?;

        let mut tio = termios::tcgetattr(&file)
            .with_context(|| format!("{} is not a tty", device.display()))?;
        termios::cfmakeraw(&mut tio);
        tio.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
        // Block until exactly one byte is available, no inter-byte timer.
        tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::cfsetspeed(&mut tio, baud_rate(baud)?)
            .context("failed to set line speed")?;
        termios::tcsetattr(&file, SetArg::TCSANOW, &tio)
            .context("failed to apply tty settings")?;

        tracing::info!(device = %device.display(), baud, "serial channel open");
        Ok(Self { file })
    }
}

fn baud_rate(baud: u32) -> Result<BaudRate> {
    Ok(match baud {
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115200 => BaudRate::B115200,
        230400 => BaudRate::B230400,
        other => anyhow::bail!("unsupported baud rate: {other}"),
    })
}

impl ByteChannel for SerialChannel {
    fn recv_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.file.read(&mut buf) {
                Ok(1) => return Ok(buf[0]),
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial device closed",
                    ))
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn send_byte(&mut self, byte: u8) -> io::Result<()> {
        self.file.write_all(&[byte])
    }
}

// ── In-memory backend ─────────────────────────────────────────────────────────

/// In-memory channel: receives from a pre-loaded script, records sends.
/// Used by tests and host-side simulation.
#[derive(Default)]
pub struct MemoryChannel {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the receiver to consume.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> &[u8] {
        &self.outbound
    }

    /// Bytes fed but not yet consumed.
    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }
}

impl ByteChannel for MemoryChannel {
    fn recv_byte(&mut self) -> io::Result<u8> {
        self.inbound.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "memory channel script exhausted")
        })
    }

    fn send_byte(&mut self, byte: u8) -> io::Result<()> {
        self.outbound.push(byte);
        Ok(())
    }
}
