// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration fields and the cached configuration record.
//!
//! Every field is a small raw code that is bit-packed into one control
//! register. Which fields a sensor has, and where they live, is described by
//! the tables in [`crate::variant`]; this module only knows how to validate a
//! code against a [`FieldSpec`] and how to pack a register from the cache.

use crate::{variant::FieldSpec, Error};
use std::fmt;

pub const FIELD_COUNT: usize = 10;

/// Logical configuration fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Samples averaged per output (HMC5883L), pressure oversampling (BMP280)
    SampleAverage,
    /// Output data rate, or standby time between conversions (BMP280)
    OutputRate,
    /// Normal or self-test bias measurement (HMC5883L)
    MeasurementMode,
    /// Continuous / single-shot / idle conversion mode
    OperatingMode,
    /// Gain (HMC5883L) or g-range (ADXL345)
    Gain,
    /// Standby or measure (ADXL345)
    PowerMode,
    /// Full-resolution output flag (ADXL345)
    Resolution,
    /// FIFO mode (ADXL345)
    FifoMode,
    /// IIR filter coefficient (BMP280)
    Filter,
    /// Temperature oversampling (BMP280)
    TemperatureOversampling,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::SampleAverage,
        Field::OutputRate,
        Field::MeasurementMode,
        Field::OperatingMode,
        Field::Gain,
        Field::PowerMode,
        Field::Resolution,
        Field::FifoMode,
        Field::Filter,
        Field::TemperatureOversampling,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name of the attribute file exposing this field
    pub fn name(self) -> &'static str {
        match self {
            Field::SampleAverage => "sample_average",
            Field::OutputRate => "data_out_rate",
            Field::MeasurementMode => "measurement",
            Field::OperatingMode => "mode",
            Field::Gain => "gain",
            Field::PowerMode => "power",
            Field::Resolution => "resolution",
            Field::FifoMode => "fifo_mode",
            Field::Filter => "filter",
            Field::TemperatureOversampling => "temp_oversampling",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the cache holds after a configuration write fails on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Restore the previous value, so the cache mirrors what was last
    /// written successfully
    #[default]
    RollBack,
    /// Keep the requested value even though the register was not written
    LastRequested,
}

/// Per-device options applied at probe time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOptions {
    pub cache_policy: CachePolicy,
    /// Compare the identification registers against the expected chip ID
    pub verify_identity: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::default(),
            verify_identity: true,
        }
    }
}

/// Cached configuration of one device. Only fields present in the device's
/// table are ever `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    values: [Option<u8>; FIELD_COUNT],
}

impl Config {
    /// Configuration holding each field's default code
    pub fn from_defaults(fields: &[FieldSpec]) -> Self {
        let mut config = Config::default();
        for spec in fields {
            config.values[spec.field.index()] = Some(spec.default);
        }
        config
    }

    pub fn get(&self, field: Field) -> Option<u8> {
        self.values[field.index()]
    }

    pub(crate) fn set(&mut self, field: Field, value: u8) {
        self.values[field.index()] = Some(value);
    }

    /// Fields that hold a value, in table order
    pub fn iter(&self) -> impl Iterator<Item = (Field, u8)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f, v)))
    }

    /// Pack every field living in `register`; bits no field covers are zero
    pub fn pack(&self, fields: &[FieldSpec], register: u8) -> u8 {
        fields
            .iter()
            .filter(|spec| spec.register == register)
            .fold(0, |byte, spec| {
                let value = self.get(spec.field).unwrap_or(spec.default);
                byte | spec.encode(value)
            })
    }
}

impl FieldSpec {
    /// Register bits covered by this field
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) as u8) << self.offset
    }

    /// Shift `value` into place; bits outside the field are dropped
    pub const fn encode(&self, value: u8) -> u8 {
        (value << self.offset) & self.mask()
    }

    /// Extract this field's code from a register byte
    pub const fn decode(&self, register: u8) -> u8 {
        (register & self.mask()) >> self.offset
    }

    pub fn validate(&self, value: u8) -> Result<(), Error> {
        if value >= self.legal {
            return Err(Error::InvalidArgument(format!(
                "{} code {} out of range 0..{}",
                self.field, value, self.legal
            )));
        }
        Ok(())
    }

    /// Human readable meaning of a code, if the table has one
    pub fn label(&self, value: u8) -> Option<&'static str> {
        self.labels.get(value as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("hmc5883l_gain"), None);
    }

    #[test]
    fn test_mask_and_encode() {
        let spec = Variant::Hmc5883l.spec().field(Field::SampleAverage).unwrap();
        assert_eq!(spec.mask(), 0b0110_0000);
        assert_eq!(spec.encode(3), 0b0110_0000);
        assert_eq!(spec.decode(0b0111_0000), 3);

        let gain = Variant::Hmc5883l.spec().field(Field::Gain).unwrap();
        assert_eq!(gain.mask(), 0b1110_0000);
        assert_eq!(gain.encode(1), 0x20);
    }

    #[test]
    fn test_pack_shares_register() {
        let spec = Variant::Hmc5883l.spec();
        let mut config = Config::from_defaults(spec.fields);
        // 8-sample average, 15 Hz, normal measurement
        assert_eq!(config.pack(spec.fields, 0x00), 0x70);
        config.set(Field::MeasurementMode, 1);
        config.set(Field::OutputRate, 6);
        assert_eq!(config.pack(spec.fields, 0x00), 0x79);
        assert_eq!(config.pack(spec.fields, 0x01), 0x20);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let spec = Variant::Hmc5883l.spec().field(Field::OutputRate).unwrap();
        assert!(spec.validate(6).is_ok());
        assert!(matches!(spec.validate(7), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_defaults_only_cover_table_fields() {
        let spec = Variant::Bmp280.spec();
        let config = Config::from_defaults(spec.fields);
        assert_eq!(config.get(Field::Gain), None);
        assert_eq!(config.iter().count(), spec.fields.len());
    }
}
