// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{check_len, BusError, SensorInterface};
use crate::constants::SMBUS_BLOCK_MAX;
use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::trace;
use std::path::Path;

/// The SMBus calls a register-mapped sensor needs.
///
/// Read/write direction is implicit in the call shape, so no address framing
/// is applied on this bus.
pub trait SmbusDevice {
    /// Error type
    type Error;

    fn write_byte_data(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;

    fn read_byte_data(&mut self, register: u8) -> Result<u8, Self::Error>;

    fn read_i2c_block_data(&mut self, register: u8, len: u8) -> Result<Vec<u8>, Self::Error>;
}

impl SmbusDevice for LinuxI2CDevice {
    type Error = LinuxI2CError;

    fn write_byte_data(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.smbus_write_byte_data(register, value)
    }

    fn read_byte_data(&mut self, register: u8) -> Result<u8, Self::Error> {
        self.smbus_read_byte_data(register)
    }

    fn read_i2c_block_data(&mut self, register: u8, len: u8) -> Result<Vec<u8>, Self::Error> {
        self.smbus_read_i2c_block_data(register, len)
    }
}

/// Register access over an I2C client
pub struct I2cInterface<DEV> {
    dev: DEV,
}

impl I2cInterface<LinuxI2CDevice> {
    /// Open `/dev/i2c-N` and bind it to the 7-bit slave `address`
    pub fn open<P: AsRef<Path>>(path: P, address: u16) -> Result<Self, BusError> {
        let dev = LinuxI2CDevice::new(path, address)?;
        Ok(Self::new(dev))
    }
}

impl<DEV> I2cInterface<DEV> {
    pub fn new(dev: DEV) -> Self {
        Self { dev }
    }

    /// Returns the underlying I2C client
    pub fn free(self) -> DEV {
        self.dev
    }
}

impl<DEV, CommE> SensorInterface for I2cInterface<DEV>
where
    DEV: SmbusDevice<Error = CommE>,
    BusError: From<CommE>,
{
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        trace!("i2c write {:#04x} = {:#04x}", address, value);
        self.dev.write_byte_data(address, value)?;
        Ok(())
    }

    fn read_register(&mut self, address: u8) -> Result<u8, BusError> {
        let value = self.dev.read_byte_data(address)?;
        trace!("i2c read {:#04x} -> {:#04x}", address, value);
        Ok(value)
    }

    fn burst_read(&mut self, address: u8, count: usize) -> Result<Vec<u8>, BusError> {
        if count > SMBUS_BLOCK_MAX {
            return Err(BusError::BurstTooLong(count));
        }
        let data = self.dev.read_i2c_block_data(address, count as u8)?;
        check_len(&data, count)?;
        trace!("i2c burst {:#04x} -> {:02x?}", address, data);
        Ok(data)
    }
}
