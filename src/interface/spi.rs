// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{check_len, BusError, SensorInterface};
use crate::constants::SPI_READ_BIT;
use crate::interface::spidev::{Transfer, Write};
use log::trace;

/// How a device expects the leading address byte of a SPI transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiFraming {
    /// Set for reads, cleared for writes
    pub read_bit: u8,
    /// Set for burst reads on devices that do not auto-increment otherwise
    pub multi_byte_bit: Option<u8>,
}

impl SpiFraming {
    /// Address byte for a register write
    pub fn write_address(&self, address: u8) -> u8 {
        address & !(self.read_bit | self.multi_byte_bit.unwrap_or(0))
    }

    /// Address byte for a single register read
    pub fn read_address(&self, address: u8) -> u8 {
        self.write_address(address) | self.read_bit
    }

    /// Address byte for a multi-register read
    pub fn burst_address(&self, address: u8) -> u8 {
        self.read_address(address) | self.multi_byte_bit.unwrap_or(0)
    }
}

impl Default for SpiFraming {
    fn default() -> Self {
        Self {
            read_bit: SPI_READ_BIT,
            multi_byte_bit: None,
        }
    }
}

/// Register access over a full-duplex SPI device
pub struct SpiInterface<SPI> {
    spi: SPI,
    framing: SpiFraming,
}

impl<SPI> SpiInterface<SPI> {
    pub fn new(spi: SPI, framing: SpiFraming) -> Self {
        Self { spi, framing }
    }

    /// Returns the underlying SPI device
    pub fn free(self) -> SPI {
        self.spi
    }
}

impl<SPI, CommE> SensorInterface for SpiInterface<SPI>
where
    SPI: Write<Error = CommE> + Transfer<Error = CommE>,
    BusError: From<CommE>,
{
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        let frame = [self.framing.write_address(address), value];
        trace!("spi write {:02x?}", frame);
        self.spi.write(&frame)?;
        Ok(())
    }

    fn read_register(&mut self, address: u8) -> Result<u8, BusError> {
        let mut rx = [0u8; 1];
        self.spi
            .write_then_read(&[self.framing.read_address(address)], &mut rx)?;
        trace!("spi read {:#04x} -> {:#04x}", address, rx[0]);
        Ok(rx[0])
    }

    fn burst_read(&mut self, address: u8, count: usize) -> Result<Vec<u8>, BusError> {
        let mut rx = vec![0u8; count];
        self.spi
            .write_then_read(&[self.framing.burst_address(address)], &mut rx)?;
        check_len(&rx, count)?;
        trace!("spi burst {:#04x} -> {:02x?}", address, rx);
        Ok(rx)
    }
}
