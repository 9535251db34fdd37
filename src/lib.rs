// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Register-level drivers for the ADXL345 accelerometer, BMP280 barometer
//! and HMC5883L magnetometer.
//!
//! One [`SensorDevice`] owns the bus handle of one physical sensor and keeps
//! its cached configuration and last sample behind a single lock, so it can
//! be shared between threads with an `Arc`. Configuration fields are
//! table-driven per [`Variant`]; requests arrive either as typed method
//! calls, as command codes through [`SensorDevice::ioctl`], or as named
//! attributes through [`SensorDevice::show`] / [`SensorDevice::store`].

pub mod attributes;
pub mod barometer;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod driver;
pub mod interface;
pub mod variant;

pub use barometer::{BarometricSample, Calibration};
pub use config::{CachePolicy, Config, DeviceOptions, Field};
pub use dispatch::{Command, Direction, NullBuffer, UserBuffer};
pub use driver::{AxisSample, SensorDevice};
pub use interface::{BusError, SensorInterface};
pub use variant::Variant;

use constants::{EFAULT, EINVAL, EIO, ENODEV, ENOTTY};

/// Errors in this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sensor communication error
    #[error(transparent)]
    Bus(#[from] BusError),
    /// A value outside its legal range, or a malformed request
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Data could not be copied to or from the caller's buffer
    #[error("data transfer fault: {0}")]
    DataTransferFault(&'static str),
    /// Unknown command or attribute, or one the sensor does not have
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// The identification registers did not match at probe time
    #[error("unexpected chip id {found:02x?}, expected {expected:02x?}")]
    IdentityMismatch { expected: Vec<u8>, found: Vec<u8> },
}

impl Error {
    /// Negative errno reported by the command interface
    pub fn errno(&self) -> i32 {
        match self {
            Error::Bus(_) => -EIO,
            Error::InvalidArgument(_) => -EINVAL,
            Error::DataTransferFault(_) => -EFAULT,
            Error::UnsupportedOperation(_) => -ENOTTY,
            Error::IdentityMismatch { .. } => -ENODEV,
        }
    }
}
