// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bus transports.
//!
//! A [`SensorInterface`] turns register-level requests into framed bus
//! transactions. It owns the underlying handle and nothing else: no caching,
//! no retries. A failed transaction is reported to the caller as is.

use i2cdev::linux::LinuxI2CError;
use std::io;

pub mod delay;
pub mod i2c;
pub mod mock;
pub mod spi;
pub mod spidev;

pub use self::i2c::{I2cInterface, SmbusDevice};
pub use self::spi::{SpiFraming, SpiInterface};

/// Transport-level failures
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The character device reported an error (spidev, i2c-dev)
    #[error("bus I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The I2C adapter rejected the transaction
    #[error("I2C transaction failed: {0}")]
    I2c(#[from] LinuxI2CError),
    /// The device did not acknowledge an access to the given register
    #[error("no acknowledge for register {0:#04x}")]
    Nack(u8),
    /// Fewer bytes came back than were requested
    #[error("short transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer { expected: usize, actual: usize },
    /// The bus cannot move this many bytes in one transaction
    #[error("burst of {0} bytes exceeds the bus limit")]
    BurstTooLong(usize),
}

/// A method of communicating with the device
pub trait SensorInterface {
    /// Write a single register
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), BusError>;

    /// Read a single register
    fn read_register(&mut self, address: u8) -> Result<u8, BusError>;

    /// Read `count` contiguous registers starting at `address` in one
    /// transaction. The returned buffer always holds exactly `count` bytes.
    fn burst_read(&mut self, address: u8, count: usize) -> Result<Vec<u8>, BusError>;
}

impl<T: SensorInterface + ?Sized> SensorInterface for Box<T> {
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        (**self).write_register(address, value)
    }

    fn read_register(&mut self, address: u8) -> Result<u8, BusError> {
        (**self).read_register(address)
    }

    fn burst_read(&mut self, address: u8, count: usize) -> Result<Vec<u8>, BusError> {
        (**self).burst_read(address, count)
    }
}

/// Fail with [`BusError::ShortTransfer`] unless `buf` holds `expected` bytes
pub(crate) fn check_len(buf: &[u8], expected: usize) -> Result<(), BusError> {
    if buf.len() != expected {
        return Err(BusError::ShortTransfer {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}
