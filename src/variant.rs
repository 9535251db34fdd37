// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-sensor register tables.
//!
//! All device-specific knowledge lives in one [`VariantSpec`] per sensor:
//! control registers and the order they are programmed at probe time, the
//! bit range and legal codes of every configuration field, data windows,
//! identification and SPI framing. The driver never hard-codes any of it.

use crate::{
    config::Field,
    constants::*,
    interface::{spidev::SpiMode, spidev::SpiOptions, SpiFraming},
    Error,
};
use std::{fmt, str::FromStr};

/// Bit range of one configuration field inside its control register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub register: u8,
    pub offset: u8,
    pub width: u8,
    /// Legal codes are `0..legal`
    pub legal: u8,
    /// Code programmed at probe time
    pub default: u8,
    /// Meaning of each legal code
    pub labels: &'static [&'static str],
}

/// Contiguous registers fetched with one burst read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWindow {
    pub address: u8,
    pub len: usize,
}

/// Expected content of the identification register(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub register: u8,
    pub expected: &'static [u8],
}

/// Full-scale range and the matching sensitivity for one gain code
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSetting {
    /// Full-scale range in the sensor's unit (gauss, g)
    pub range: f32,
    /// Counts per unit
    pub lsb_per_unit: f32,
}

/// How the axis words are laid out in the data window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLayout {
    pub little_endian: bool,
    /// Word index in the window of x, y and z
    pub order: [usize; 3],
}

impl AxisLayout {
    /// Decode a 6 byte window into [x, y, z]
    pub fn decode(&self, raw: &[u8]) -> [i16; 3] {
        self.order.map(|word| {
            let bytes = [raw[word * 2], raw[word * 2 + 1]];
            if self.little_endian {
                i16::from_le_bytes(bytes)
            } else {
                i16::from_be_bytes(bytes)
            }
        })
    }
}

/// Which bus a sensor is wired to by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Spi,
    I2c,
}

impl BusKind {
    /// Bus behind a Linux device node, if its name tells
    pub fn from_path(path: &str) -> Option<BusKind> {
        let name = path.rsplit('/').next().unwrap_or(path);
        if name.starts_with("spidev") {
            Some(BusKind::Spi)
        } else if name.starts_with("i2c-") {
            Some(BusKind::I2c)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct VariantSpec {
    pub name: &'static str,
    /// Device-tree compatible string
    pub compatible: &'static str,
    pub bus: BusKind,
    /// Programmed in this order at probe time
    pub registers: &'static [u8],
    pub fields: &'static [FieldSpec],
    pub identity: Identity,
    pub axis_window: Option<DataWindow>,
    /// Wire layout of the axis window, used for physical readings
    pub axis_layout: AxisLayout,
    pub barometric_window: Option<DataWindow>,
    pub calibration: Option<DataWindow>,
    /// Soft reset register and trigger value
    pub reset: Option<(u8, u8)>,
    pub spi_framing: SpiFraming,
    pub spi_options: SpiOptions,
    pub i2c_address: u16,
    /// Indexed by the gain code
    pub gain_table: &'static [GainSetting],
    /// Sensitivity that replaces the gain table when full resolution is on
    pub full_resolution_lsb: Option<f32>,
    /// Physical unit of scaled axis readings
    pub unit: &'static str,
}

impl VariantSpec {
    pub fn field(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.field == field)
    }

    pub fn supports(&self, field: Field) -> bool {
        self.field(field).is_some()
    }

    pub fn has_register(&self, address: u8) -> bool {
        self.registers.contains(&address)
    }
}

// =============================================================================
// HMC5883L
// =============================================================================

static HMC5883L_REGISTERS: [u8; 3] = [
    HMC5883L_MODE_REG,
    HMC5883L_CONFIG_REG_B,
    HMC5883L_CONFIG_REG_A,
];

static HMC5883L_FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        field: Field::SampleAverage,
        register: HMC5883L_CONFIG_REG_A,
        offset: 5,
        width: 2,
        legal: 4,
        default: 3,
        labels: &["1", "2", "4", "8"],
    },
    FieldSpec {
        field: Field::OutputRate,
        register: HMC5883L_CONFIG_REG_A,
        offset: 2,
        width: 3,
        legal: 7,
        default: 4,
        labels: &["0.75Hz", "1.5Hz", "3Hz", "7.5Hz", "15Hz", "30Hz", "75Hz"],
    },
    FieldSpec {
        field: Field::MeasurementMode,
        register: HMC5883L_CONFIG_REG_A,
        offset: 0,
        width: 2,
        legal: 3,
        default: 0,
        labels: &["normal", "positive bias", "negative bias"],
    },
    FieldSpec {
        field: Field::Gain,
        register: HMC5883L_CONFIG_REG_B,
        offset: 5,
        width: 3,
        legal: 8,
        default: 1,
        labels: &[
            "±0.88Ga", "±1.3Ga", "±1.9Ga", "±2.5Ga", "±4.0Ga", "±4.7Ga", "±5.6Ga", "±8.1Ga",
        ],
    },
    FieldSpec {
        field: Field::OperatingMode,
        register: HMC5883L_MODE_REG,
        offset: 0,
        width: 2,
        legal: 3,
        default: 0,
        labels: &["continuous", "single", "idle"],
    },
];

static HMC5883L_GAINS: [GainSetting; 8] = [
    GainSetting { range: 0.88, lsb_per_unit: 1370.0 },
    GainSetting { range: 1.3, lsb_per_unit: 1090.0 },
    GainSetting { range: 1.9, lsb_per_unit: 820.0 },
    GainSetting { range: 2.5, lsb_per_unit: 660.0 },
    GainSetting { range: 4.0, lsb_per_unit: 440.0 },
    GainSetting { range: 4.7, lsb_per_unit: 390.0 },
    GainSetting { range: 5.6, lsb_per_unit: 330.0 },
    GainSetting { range: 8.1, lsb_per_unit: 230.0 },
];

static HMC5883L: VariantSpec = VariantSpec {
    name: "hmc5883l",
    compatible: "honeywell,hmc5883l",
    bus: BusKind::I2c,
    registers: &HMC5883L_REGISTERS,
    fields: &HMC5883L_FIELDS,
    identity: Identity {
        register: HMC5883L_IDENT_A,
        expected: HMC5883L_CHIP_ID,
    },
    axis_window: Some(DataWindow {
        address: HMC5883L_DATA_OUT_REG,
        len: 6,
    }),
    // X, Z, Y on the wire
    axis_layout: AxisLayout {
        little_endian: false,
        order: [0, 2, 1],
    },
    barometric_window: None,
    calibration: None,
    reset: None,
    spi_framing: SpiFraming {
        read_bit: SPI_READ_BIT,
        multi_byte_bit: None,
    },
    spi_options: SpiOptions {
        max_speed_hz: 1_000_000,
        mode: SpiMode::Mode3,
    },
    i2c_address: HMC5883L_I2C_ADDRESS,
    gain_table: &HMC5883L_GAINS,
    full_resolution_lsb: None,
    unit: "Ga",
};

// =============================================================================
// ADXL345
// =============================================================================

static ADXL345_REGISTERS: [u8; 4] = [
    ADXL345_DATA_FORMAT,
    ADXL345_BW_RATE,
    ADXL345_FIFO_CTL,
    // measure bit last, once everything else is set up
    ADXL345_POWER_CTL,
];

static ADXL345_FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        field: Field::Gain,
        register: ADXL345_DATA_FORMAT,
        offset: 0,
        width: 2,
        legal: 4,
        default: 1,
        labels: &["±2g", "±4g", "±8g", "±16g"],
    },
    FieldSpec {
        field: Field::Resolution,
        register: ADXL345_DATA_FORMAT,
        offset: 3,
        width: 1,
        legal: 2,
        default: 0,
        labels: &["10-bit", "full"],
    },
    FieldSpec {
        field: Field::OutputRate,
        register: ADXL345_BW_RATE,
        offset: 0,
        width: 4,
        legal: 16,
        default: 0x0A,
        labels: &[
            "0.10Hz", "0.20Hz", "0.39Hz", "0.78Hz", "1.56Hz", "3.13Hz", "6.25Hz", "12.5Hz",
            "25Hz", "50Hz", "100Hz", "200Hz", "400Hz", "800Hz", "1600Hz", "3200Hz",
        ],
    },
    FieldSpec {
        field: Field::FifoMode,
        register: ADXL345_FIFO_CTL,
        offset: 6,
        width: 2,
        legal: 4,
        default: 0,
        labels: &["bypass", "fifo", "stream", "trigger"],
    },
    FieldSpec {
        field: Field::PowerMode,
        register: ADXL345_POWER_CTL,
        offset: 3,
        width: 1,
        legal: 2,
        default: 1,
        labels: &["standby", "measure"],
    },
];

static ADXL345_GAINS: [GainSetting; 4] = [
    GainSetting { range: 2.0, lsb_per_unit: 256.0 },
    GainSetting { range: 4.0, lsb_per_unit: 128.0 },
    GainSetting { range: 8.0, lsb_per_unit: 64.0 },
    GainSetting { range: 16.0, lsb_per_unit: 32.0 },
];

static ADXL345: VariantSpec = VariantSpec {
    name: "adxl345",
    compatible: "adxl345",
    bus: BusKind::Spi,
    registers: &ADXL345_REGISTERS,
    fields: &ADXL345_FIELDS,
    identity: Identity {
        register: ADXL345_DEVID,
        expected: &[ADXL345_CHIP_ID],
    },
    axis_window: Some(DataWindow {
        address: ADXL345_DATA_START,
        len: 6,
    }),
    axis_layout: AxisLayout {
        little_endian: true,
        order: [0, 1, 2],
    },
    barometric_window: None,
    calibration: None,
    reset: None,
    spi_framing: SpiFraming {
        read_bit: SPI_READ_BIT,
        multi_byte_bit: Some(SPI_MULTI_BYTE_BIT),
    },
    spi_options: SpiOptions {
        max_speed_hz: 5_000_000,
        mode: SpiMode::Mode3,
    },
    i2c_address: 0x53,
    gain_table: &ADXL345_GAINS,
    full_resolution_lsb: Some(256.0),
    unit: "g",
};

// =============================================================================
// BMP280
// =============================================================================

static BMP280_REGISTERS: [u8; 2] = [BMP280_CONFIG, BMP280_CTRL_MEAS];

const BMP280_OVERSAMPLING: &[&str] = &["skipped", "x1", "x2", "x4", "x8", "x16"];

static BMP280_FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        field: Field::TemperatureOversampling,
        register: BMP280_CTRL_MEAS,
        offset: 5,
        width: 3,
        legal: 6,
        default: 1,
        labels: BMP280_OVERSAMPLING,
    },
    FieldSpec {
        field: Field::SampleAverage,
        register: BMP280_CTRL_MEAS,
        offset: 2,
        width: 3,
        legal: 6,
        default: 3,
        labels: BMP280_OVERSAMPLING,
    },
    FieldSpec {
        field: Field::OperatingMode,
        register: BMP280_CTRL_MEAS,
        offset: 0,
        width: 2,
        legal: 4,
        default: 3,
        labels: &["sleep", "forced", "forced", "normal"],
    },
    FieldSpec {
        field: Field::OutputRate,
        register: BMP280_CONFIG,
        offset: 5,
        width: 3,
        legal: 8,
        default: 4,
        labels: &[
            "0.5ms", "62.5ms", "125ms", "250ms", "500ms", "1000ms", "2000ms", "4000ms",
        ],
    },
    FieldSpec {
        field: Field::Filter,
        register: BMP280_CONFIG,
        offset: 2,
        width: 3,
        legal: 5,
        default: 2,
        labels: &["off", "x2", "x4", "x8", "x16"],
    },
];

static BMP280: VariantSpec = VariantSpec {
    name: "bmp280",
    compatible: "bmp280",
    bus: BusKind::Spi,
    registers: &BMP280_REGISTERS,
    fields: &BMP280_FIELDS,
    identity: Identity {
        register: BMP280_ID,
        expected: &[BMP280_CHIP_ID],
    },
    axis_window: None,
    axis_layout: AxisLayout {
        little_endian: false,
        order: [0, 1, 2],
    },
    barometric_window: Some(DataWindow {
        address: BMP280_DATA_START,
        len: 6,
    }),
    calibration: Some(DataWindow {
        address: BMP280_CALIB_START,
        len: BMP280_CALIB_LEN,
    }),
    reset: Some((BMP280_RESET, BMP280_RESET_VALUE)),
    spi_framing: SpiFraming {
        read_bit: SPI_READ_BIT,
        multi_byte_bit: None,
    },
    spi_options: SpiOptions {
        max_speed_hz: 5_000_000,
        mode: SpiMode::Mode0,
    },
    i2c_address: 0x76,
    gain_table: &[],
    full_resolution_lsb: None,
    unit: "",
};

/// Supported sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Adxl345,
    Bmp280,
    Hmc5883l,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Adxl345, Variant::Bmp280, Variant::Hmc5883l];

    pub fn spec(self) -> &'static VariantSpec {
        match self {
            Variant::Adxl345 => &ADXL345,
            Variant::Bmp280 => &BMP280,
            Variant::Hmc5883l => &HMC5883L,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn default_spi_options(self) -> SpiOptions {
        self.spec().spi_options
    }

    pub fn default_i2c_address(self) -> u16 {
        self.spec().i2c_address
    }

    /// Bus to open `path` with: the node name decides, the sensor's usual
    /// wiring otherwise
    pub fn bus_for_path(self, path: &str) -> BusKind {
        BusKind::from_path(path).unwrap_or(self.spec().bus)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    /// Accepts the short name or the device-tree compatible string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Variant::ALL
            .into_iter()
            .find(|v| {
                let spec = v.spec();
                spec.name.eq_ignore_ascii_case(s) || spec.compatible == s
            })
            .ok_or_else(|| Error::UnsupportedOperation(format!("unknown sensor \"{}\"", s)))
    }
}
