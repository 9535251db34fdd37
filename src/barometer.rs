// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! BMP280 factory trimming and integer compensation.

use crate::{constants::BMP280_CALIB_LEN, interface::BusError};

/// Factory trimming parameters, read once at probe time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

impl Calibration {
    /// Parse the 24 little-endian bytes starting at 0x88
    pub fn from_bytes(buf: &[u8]) -> Result<Self, BusError> {
        if buf.len() != BMP280_CALIB_LEN {
            return Err(BusError::ShortTransfer {
                expected: BMP280_CALIB_LEN,
                actual: buf.len(),
            });
        }
        let u = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([buf[i], buf[i + 1]]);
        Ok(Self {
            dig_t1: u(0),
            dig_t2: s(2),
            dig_t3: s(4),
            dig_p1: u(6),
            dig_p2: s(8),
            dig_p3: s(10),
            dig_p4: s(12),
            dig_p5: s(14),
            dig_p6: s(16),
            dig_p7: s(18),
            dig_p8: s(20),
            dig_p9: s(22),
        })
    }

    /// Returns (t_fine, temperature in 0.01 °C)
    fn compensate_temperature(&self, adc_t: i32) -> (i32, i32) {
        let adc_t = adc_t as i64;
        let t1 = self.dig_t1 as i64;
        let var1 = (((adc_t >> 3) - (t1 << 1)) * self.dig_t2 as i64) >> 11;
        let delta = (adc_t >> 4) - t1;
        let var2 = (((delta * delta) >> 12) * self.dig_t3 as i64) >> 14;
        let t_fine = saturate_i32(var1 + var2);
        (t_fine, saturate_i32((t_fine as i64 * 5 + 128) >> 8))
    }

    /// Pressure in Pa, or 0 when the trimming data would divide by zero.
    ///
    /// Intermediates are 128-bit: garbage on the data lines (an all-ones
    /// window) must not overflow.
    fn compensate_pressure(&self, adc_p: i32, t_fine: i32) -> u32 {
        let mut var1 = t_fine as i128 - 128000;
        let mut var2 = var1 * var1 * self.dig_p6 as i128;
        var2 += (var1 * self.dig_p5 as i128) << 17;
        var2 += (self.dig_p4 as i128) << 35;
        var1 = ((var1 * var1 * self.dig_p3 as i128) >> 8) + ((var1 * self.dig_p2 as i128) << 12);
        var1 = (((1i128 << 47) + var1) * self.dig_p1 as i128) >> 33;
        if var1 == 0 {
            return 0;
        }
        let mut p = 1_048_576 - adc_p as i128;
        p = ((((p << 31) - var2) * 3125) / var1).clamp(i64::MIN as i128, i64::MAX as i128);
        let var1 = (self.dig_p9 as i128 * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (self.dig_p8 as i128 * p) >> 19;
        p = ((p + var1 + var2) >> 8) + ((self.dig_p7 as i128) << 4);
        // Q24.8 fixed point
        u32::try_from((p >> 8).max(0)).unwrap_or(u32::MAX)
    }

    /// Turn one raw conversion into a compensated sample
    pub fn compensate(&self, raw_pressure: u32, raw_temperature: u32) -> BarometricSample {
        let (t_fine, temperature) = self.compensate_temperature(raw_temperature as i32);
        let pressure = self.compensate_pressure(raw_pressure as i32, t_fine);
        BarometricSample {
            raw_pressure,
            raw_temperature,
            temperature,
            pressure,
        }
    }
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// One barometer conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarometricSample {
    /// 20-bit uncompensated pressure
    pub raw_pressure: u32,
    /// 20-bit uncompensated temperature
    pub raw_temperature: u32,
    /// Temperature in 0.01 °C
    pub temperature: i32,
    /// Pressure in Pa
    pub pressure: u32,
}

impl BarometricSample {
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature as f32 / 100.0
    }

    pub fn pressure_hpa(&self) -> f32 {
        self.pressure as f32 / 100.0
    }

    /// Wire layout of the command interface: temperature then pressure,
    /// native endian
    pub fn to_ne_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.temperature.to_ne_bytes());
        out[4..].copy_from_slice(&self.pressure.to_ne_bytes());
        out
    }
}

/// Split the 6 byte data window into (pressure, temperature) 20-bit values
pub fn raw_from_window(window: &[u8]) -> (u32, u32) {
    let assemble =
        |b: &[u8]| ((b[0] as u32) << 12) | ((b[1] as u32) << 4) | ((b[2] as u32) >> 4);
    (assemble(&window[0..3]), assemble(&window[3..6]))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimming values of the worked example in the BMP280 datasheet
    const DATASHEET_CALIB: [u8; 24] = [
        0x70, 0x6b, 0x43, 0x67, 0x18, 0xfc, 0x7d, 0x8e, 0x43, 0xd6, 0xd0, 0x0b, 0x27, 0x0b, 0x8c,
        0x00, 0xf9, 0xff, 0x8c, 0x3c, 0xf8, 0xc6, 0x70, 0x17,
    ];

    #[test]
    fn test_parse_calibration() {
        let cal = Calibration::from_bytes(&DATASHEET_CALIB).unwrap();
        assert_eq!(cal.dig_t1, 27504);
        assert_eq!(cal.dig_t2, 26435);
        assert_eq!(cal.dig_t3, -1000);
        assert_eq!(cal.dig_p1, 36477);
        assert_eq!(cal.dig_p2, -10685);
        assert_eq!(cal.dig_p6, -7);
        assert_eq!(cal.dig_p9, 6000);
    }

    #[test]
    fn test_short_calibration_rejected() {
        assert!(matches!(
            Calibration::from_bytes(&DATASHEET_CALIB[..20]),
            Err(BusError::ShortTransfer {
                expected: 24,
                actual: 20
            })
        ));
    }

    #[test]
    fn test_datasheet_example() {
        let cal = Calibration::from_bytes(&DATASHEET_CALIB).unwrap();
        let sample = cal.compensate(415148, 519888);
        assert_eq!(sample.temperature, 2508);
        assert_eq!(sample.pressure, 100653);
        assert!((sample.temperature_celsius() - 25.08).abs() < 0.001);
    }

    #[test]
    fn test_all_ones_window_does_not_overflow() {
        let mut cal = Calibration::from_bytes(&DATASHEET_CALIB).unwrap();
        cal.dig_t2 = 28300;
        let sample = cal.compensate(0xFFFFF, 0xFFFFF);
        assert_eq!(sample.raw_temperature, 0xFFFFF);
        // far outside the sensor's range, but defined
        assert!(sample.temperature > 8500);

        let extreme = Calibration {
            dig_t1: u16::MAX,
            dig_t2: i16::MAX,
            dig_t3: i16::MIN,
            dig_p1: u16::MAX,
            dig_p2: i16::MIN,
            dig_p3: i16::MAX,
            dig_p4: i16::MAX,
            dig_p5: i16::MIN,
            dig_p6: i16::MAX,
            dig_p7: i16::MAX,
            dig_p8: i16::MIN,
            dig_p9: i16::MAX,
        };
        for (raw_p, raw_t) in [(0xFFFFF, 0xFFFFF), (0, 0), (0xFFFFF, 0), (0, 0xFFFFF)] {
            extreme.compensate(raw_p, raw_t);
        }
    }

    #[test]
    fn test_zero_p1_does_not_divide() {
        let cal = Calibration::default();
        assert_eq!(cal.compensate(415148, 519888).pressure, 0);
    }

    #[test]
    fn test_raw_from_window() {
        // 0x65 0x5A 0xC0 -> 0x655AC, 0x7E 0xED 0x00 -> 0x7EED0
        let (p, t) = raw_from_window(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]);
        assert_eq!(p, 0x655AC);
        assert_eq!(t, 0x7EED0);
        assert_eq!(p, 415148);
        assert_eq!(t, 519888);
    }
}
