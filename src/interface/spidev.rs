// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use log::trace;
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};
use std::io;
use std::path::Path;

/// Blocking write followed by a read within one chip-select assertion
pub trait Transfer {
    /// Error type
    type Error;

    /// Sends `tx` to the slave, then clocks `rx.len()` bytes back into `rx`
    fn write_then_read(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;
}

/// Blocking write
pub trait Write {
    /// Error type
    type Error;

    /// Sends `words` to the slave, ignoring all the incoming words
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error>;
}

/// SPI clock polarity/phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    Mode0,
    Mode3,
}

impl SpiMode {
    fn flags(self) -> SpiModeFlags {
        match self {
            SpiMode::Mode0 => SpiModeFlags::SPI_MODE_0,
            SpiMode::Mode3 => SpiModeFlags::SPI_MODE_3,
        }
    }
}

/// Options applied to the spidev handle when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiOptions {
    pub max_speed_hz: u32,
    pub mode: SpiMode,
}

impl Default for SpiOptions {
    fn default() -> Self {
        Self {
            max_speed_hz: 5_000_000,
            mode: SpiMode::Mode3,
        }
    }
}

pub struct SpiDevice {
    spi: Spidev,
}

impl SpiDevice {
    pub fn new<P: AsRef<Path>>(path: P, options: SpiOptions) -> io::Result<SpiDevice> {
        let mut spi = Spidev::open(path)?;
        let spidev_options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(options.max_speed_hz)
            .mode(options.mode.flags())
            .lsb_first(false)
            .build();
        spi.configure(&spidev_options)?;
        trace!("spidev configured: {:?}", options);

        Ok(SpiDevice { spi })
    }
}

impl Transfer for SpiDevice {
    type Error = io::Error;

    fn write_then_read(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        let mut transfers = [SpidevTransfer::write(tx), SpidevTransfer::read(rx)];
        self.spi.transfer_multiple(&mut transfers)
    }
}

impl Write for SpiDevice {
    type Error = io::Error;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut transfer = SpidevTransfer::write(words);
        self.spi.transfer(&mut transfer)
    }
}
