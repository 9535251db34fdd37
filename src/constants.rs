// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Register addresses and protocol constants for the supported sensors.
//!
//! Bit-field layouts are not listed here; they live in the per-variant
//! tables of [`crate::variant`].

// =============================================================================
// SPI framing
// =============================================================================

/// Set on the address byte to request a read
pub const SPI_READ_BIT: u8 = 0x80;
/// ADXL345 auto-increment flag for multi-byte transfers
pub const SPI_MULTI_BYTE_BIT: u8 = 0x40;

/// SMBus block reads are limited to 32 bytes
pub const SMBUS_BLOCK_MAX: usize = 32;

// =============================================================================
// ADXL345 accelerometer
// =============================================================================

pub const ADXL345_DEVID: u8 = 0x00;
pub const ADXL345_BW_RATE: u8 = 0x2C;
pub const ADXL345_POWER_CTL: u8 = 0x2D;
pub const ADXL345_DATA_FORMAT: u8 = 0x31;
/// DATAX0..DATAZ1, 2 registers per axis
pub const ADXL345_DATA_START: u8 = 0x32;
pub const ADXL345_FIFO_CTL: u8 = 0x38;
pub const ADXL345_CHIP_ID: u8 = 0xE5;

// =============================================================================
// BMP280 barometer
// =============================================================================

/// Start of the 24 byte factory trimming block
pub const BMP280_CALIB_START: u8 = 0x88;
pub const BMP280_CALIB_LEN: usize = 24;
pub const BMP280_ID: u8 = 0xD0;
pub const BMP280_RESET: u8 = 0xE0;
/// Writing this to the reset register triggers a power-on reset
pub const BMP280_RESET_VALUE: u8 = 0xB6;
pub const BMP280_CTRL_MEAS: u8 = 0xF4;
pub const BMP280_CONFIG: u8 = 0xF5;
/// press_msb, press_lsb, press_xlsb, temp_msb, temp_lsb, temp_xlsb
pub const BMP280_DATA_START: u8 = 0xF7;
pub const BMP280_CHIP_ID: u8 = 0x58;
/// Start-up time after a soft reset
pub const BMP280_STARTUP_MS: u64 = 2;

// =============================================================================
// HMC5883L magnetometer
// =============================================================================

pub const HMC5883L_CONFIG_REG_A: u8 = 0x00;
pub const HMC5883L_CONFIG_REG_B: u8 = 0x01;
pub const HMC5883L_MODE_REG: u8 = 0x02;
pub const HMC5883L_DATA_OUT_REG: u8 = 0x03;
/// Identification registers A, B and C read back "H43"
pub const HMC5883L_IDENT_A: u8 = 0x0A;
pub const HMC5883L_CHIP_ID: &[u8] = b"H43";
pub const HMC5883L_I2C_ADDRESS: u16 = 0x1E;

// =============================================================================
// Command interface
// =============================================================================

/// ioctl type byte shared by every command
pub const IOCTL_MAGIC: u8 = 0xF2;

pub const IOC_NRBITS: u32 = 8;
pub const IOC_TYPEBITS: u32 = 8;
pub const IOC_SIZEBITS: u32 = 14;
pub const IOC_NRSHIFT: u32 = 0;
pub const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
pub const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
pub const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;
pub const IOC_WRITE: u32 = 1;
pub const IOC_READ: u32 = 2;

// errno values reported by the command interface
pub const EIO: i32 = 5;
pub const EFAULT: i32 = 14;
pub const ENODEV: i32 = 19;
pub const EINVAL: i32 = 22;
pub const ENOTTY: i32 = 25;
