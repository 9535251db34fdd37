// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sensor device implementation.
//!
//! A [`SensorDevice`] is created by [`SensorDevice::probe`], which programs
//! the sensor's default configuration before the device is handed out. From
//! then on every configuration change and every sample goes through one
//! mutex that guards both the cached state and the bus, so concurrent
//! callers observe a strictly ordered sequence of complete updates.

use crate::{
    barometer::{raw_from_window, BarometricSample, Calibration},
    config::{CachePolicy, Config, DeviceOptions, Field},
    interface::{
        delay::delay_ms,
        i2c::I2cInterface,
        spi::SpiInterface,
        spidev::{SpiDevice, SpiOptions},
        SensorInterface,
    },
    variant::{DataWindow, FieldSpec, GainSetting, Variant, VariantSpec},
    Error,
};
use i2cdev::linux::LinuxI2CDevice;
use log::{debug, trace, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Latest axis reading [x, y, z] in raw counts
pub type AxisSample = [i16; 3];

/// Everything guarded by the device lock
struct DeviceState<SI> {
    sensor_interface: SI,
    config: Config,
    axis_sample: AxisSample,
    barometric: Option<BarometricSample>,
    calibration: Option<Calibration>,
}

/// One physical sensor on one bus endpoint
pub struct SensorDevice<SI> {
    variant: Variant,
    options: DeviceOptions,
    state: Mutex<DeviceState<SI>>,
}

impl SensorDevice<SpiInterface<SpiDevice>> {
    /// Open a SPI-attached sensor
    ///
    /// # Arguments
    /// * `spidevice` - Path to the SPI device (e.g., "/dev/spidev0.0")
    /// * `variant` - Which sensor sits behind the chip select
    /// * `spi_options` - Clock and mode, see [`Variant::default_spi_options`]
    /// * `options` - Probe options
    pub fn open_spi(
        spidevice: &str,
        variant: Variant,
        spi_options: SpiOptions,
        options: DeviceOptions,
    ) -> Result<Self, Error> {
        let spi = SpiDevice::new(spidevice, spi_options).map_err(crate::BusError::from)?;
        let interface = SpiInterface::new(spi, variant.spec().spi_framing);
        Self::probe(interface, variant, options)
    }
}

impl SensorDevice<I2cInterface<LinuxI2CDevice>> {
    /// Open an I2C-attached sensor
    ///
    /// # Arguments
    /// * `i2cdevice` - Path to the I2C adapter (e.g., "/dev/i2c-1")
    /// * `address` - 7-bit slave address, see [`Variant::default_i2c_address`]
    /// * `variant` - Which sensor answers at that address
    /// * `options` - Probe options
    pub fn open_i2c(
        i2cdevice: &str,
        address: u16,
        variant: Variant,
        options: DeviceOptions,
    ) -> Result<Self, Error> {
        let interface = I2cInterface::open(i2cdevice, address)?;
        Self::probe(interface, variant, options)
    }
}

/// Generates the named `set_<field>` / `get_<field>` pair for each field
macro_rules! field_accessors {
    ($($field:ident => $set:ident, $get:ident;)*) => {
        $(
            #[doc = concat!("Validate and apply a new `", stringify!($field), "` code")]
            pub fn $set(&self, value: u8) -> Result<(), Error> {
                self.set_field(Field::$field, value)
            }

            #[doc = concat!("Cached `", stringify!($field), "` code")]
            pub fn $get(&self) -> Result<u8, Error> {
                self.get_field(Field::$field)
            }
        )*
    };
}

impl<SI: SensorInterface> SensorDevice<SI> {
    /// Bind a sensor to its bus and bring it to its default configuration.
    ///
    /// The bus handle is owned by the device from here on; it can only be
    /// recovered by consuming the device with [`SensorDevice::free`].
    pub fn probe(sensor_interface: SI, variant: Variant, options: DeviceOptions) -> Result<Self, Error> {
        let spec = variant.spec();
        debug!("probing {} ({:?})", spec.name, options);

        let mut state = DeviceState {
            sensor_interface,
            config: Config::from_defaults(spec.fields),
            axis_sample: [0; 3],
            barometric: None,
            calibration: None,
        };

        if let Some((register, value)) = spec.reset {
            state.sensor_interface.write_register(register, value)?;
            delay_ms(crate::constants::BMP280_STARTUP_MS);
        }

        if options.verify_identity {
            let found = read_identity(&mut state.sensor_interface, spec)?;
            if found != spec.identity.expected {
                warn!("{}: unexpected chip id {:02x?}", spec.name, found);
                return Err(Error::IdentityMismatch {
                    expected: spec.identity.expected.to_vec(),
                    found,
                });
            }
        }

        if let Some(window) = spec.calibration {
            let raw = burst(&mut state.sensor_interface, window)?;
            let calibration = Calibration::from_bytes(&raw)?;
            debug!("{} calibration: {:?}", spec.name, calibration);
            state.calibration = Some(calibration);
        }

        program_registers(&mut state, spec)?;
        debug!("{} probe completed: {:?}", spec.name, state.config);

        Ok(Self {
            variant,
            options,
            state: Mutex::new(state),
        })
    }

    /// Returns the bus handle, dropping all cached state
    pub fn free(self) -> SI {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .sensor_interface
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn options(&self) -> DeviceOptions {
        self.options
    }

    /// The state it guards is only ever modified to completion, so a
    /// panicking holder leaves nothing half-written behind.
    fn lock(&self) -> MutexGuard<'_, DeviceState<SI>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn field_spec(&self, field: Field) -> Result<&'static FieldSpec, Error> {
        self.variant.spec().field(field).ok_or_else(|| {
            Error::UnsupportedOperation(format!("{} has no {} setting", self.variant, field))
        })
    }

    /// Snapshot of the cached configuration
    pub fn config(&self) -> Config {
        self.lock().config
    }

    /// Validate `value`, cache it and write the packed control register.
    ///
    /// The lock is held across the register write so that two fields sharing
    /// a register cannot overtake each other on the bus.
    pub fn set_field(&self, field: Field, value: u8) -> Result<(), Error> {
        let spec = self.field_spec(field)?;
        spec.validate(value)?;

        let mut state = self.lock();
        let previous = state.config.get(field);
        state.config.set(field, value);
        let byte = state.config.pack(self.variant.spec().fields, spec.register);
        debug!(
            "{}: {} = {} ({}), register {:#04x} <- {:#04x}",
            self.variant,
            field,
            value,
            spec.label(value).unwrap_or("?"),
            spec.register,
            byte
        );

        if let Err(e) = state.sensor_interface.write_register(spec.register, byte) {
            warn!("{}: writing {} failed: {}", self.variant, field, e);
            if self.options.cache_policy == CachePolicy::RollBack {
                if let Some(previous) = previous {
                    state.config.set(field, previous);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Cached code of `field`; never touches the bus
    pub fn get_field(&self, field: Field) -> Result<u8, Error> {
        self.field_spec(field)?;
        self.lock()
            .config
            .get(field)
            .ok_or_else(|| Error::UnsupportedOperation(field.to_string()))
    }

    field_accessors! {
        SampleAverage => set_sample_average, get_sample_average;
        OutputRate => set_output_rate, get_output_rate;
        MeasurementMode => set_measurement_mode, get_measurement_mode;
        OperatingMode => set_operating_mode, get_operating_mode;
        Gain => set_gain, get_gain;
        PowerMode => set_power_mode, get_power_mode;
        Resolution => set_resolution, get_resolution;
        FifoMode => set_fifo_mode, get_fifo_mode;
        Filter => set_filter, get_filter;
        TemperatureOversampling => set_temperature_oversampling, get_temperature_oversampling;
    }

    /// Burst-read the axis registers and convert them to [x, y, z].
    ///
    /// The burst read, the conversion and the cache update happen under one
    /// lock scope. On failure the cached sample is left untouched.
    ///
    /// Every sensor's window is read as three big-endian words in x, y, z
    /// order. That matches neither the ADXL345 (little-endian) nor the
    /// HMC5883L (x, z, y); [`SensorDevice::read_scaled`] decodes the real
    /// layout.
    pub fn read_axes(&self) -> Result<AxisSample, Error> {
        self.sample_axes().map(|(sample, _)| sample)
    }

    fn sample_axes(&self) -> Result<(AxisSample, Vec<u8>), Error> {
        let window = self.variant.spec().axis_window.ok_or_else(|| {
            Error::UnsupportedOperation(format!("{} has no axis data", self.variant))
        })?;

        let mut state = self.lock();
        let raw = burst(&mut state.sensor_interface, window)?;
        let sample = axes_from_be(&raw);
        state.axis_sample = sample;
        trace!("{} axes: {:?}", self.variant, sample);
        Ok((sample, raw))
    }

    /// Last sample produced by [`SensorDevice::read_axes`]
    pub fn axis_sample(&self) -> AxisSample {
        self.lock().axis_sample
    }

    /// Active full-scale range and sensitivity, if the sensor has a gain
    pub fn scale(&self) -> Option<GainSetting> {
        let spec = self.variant.spec();
        let config = self.config();
        let gain = spec.gain_table.get(config.get(Field::Gain)? as usize).copied()?;
        match (config.get(Field::Resolution), spec.full_resolution_lsb) {
            (Some(1), Some(lsb_per_unit)) => Some(GainSetting {
                lsb_per_unit,
                ..gain
            }),
            _ => Some(gain),
        }
    }

    /// Fresh axis sample in the sensor's physical unit (gauss, g).
    ///
    /// Unlike [`SensorDevice::read_axes`] this decodes the window with the
    /// sensor's own byte order and axis order. The raw counts cached for
    /// [`SensorDevice::axis_sample`] keep the `read_axes` conversion.
    pub fn read_scaled(&self) -> Result<[f32; 3], Error> {
        let scale = self.scale().ok_or_else(|| {
            Error::UnsupportedOperation(format!("{} has no gain table", self.variant))
        })?;
        let (_, raw) = self.sample_axes()?;
        let counts = self.variant.spec().axis_layout.decode(&raw);
        Ok(counts.map(|v| v as f32 / scale.lsb_per_unit))
    }

    /// Burst-read one pressure/temperature conversion and compensate it
    pub fn read_barometric(&self) -> Result<BarometricSample, Error> {
        let window = self.variant.spec().barometric_window.ok_or_else(|| {
            Error::UnsupportedOperation(format!("{} has no barometric data", self.variant))
        })?;

        let mut state = self.lock();
        let calibration = state.calibration.ok_or_else(|| {
            Error::UnsupportedOperation(format!("{} is not calibrated", self.variant))
        })?;
        let raw = burst(&mut state.sensor_interface, window)?;
        let (raw_pressure, raw_temperature) = raw_from_window(&raw);
        let sample = calibration.compensate(raw_pressure, raw_temperature);
        state.barometric = Some(sample);
        trace!("{} barometric: {:?}", self.variant, sample);
        Ok(sample)
    }

    /// Last sample produced by [`SensorDevice::read_barometric`]
    pub fn barometric_sample(&self) -> Option<BarometricSample> {
        self.lock().barometric
    }

    /// Factory calibration read at probe time
    pub fn calibration(&self) -> Option<Calibration> {
        self.lock().calibration
    }

    /// Read the identification register(s)
    pub fn chip_id(&self) -> Result<Vec<u8>, Error> {
        let mut state = self.lock();
        read_identity(&mut state.sensor_interface, self.variant.spec())
    }

    /// Power-on reset the sensor, then write the cached configuration back so
    /// that the registers match the cache again
    pub fn soft_reset(&self) -> Result<(), Error> {
        let spec = self.variant.spec();
        let (register, value) = spec
            .reset
            .ok_or_else(|| Error::UnsupportedOperation(format!("{} has no soft reset", spec.name)))?;
        trace!("{} soft_reset", spec.name);

        let mut state = self.lock();
        state.sensor_interface.write_register(register, value)?;
        delay_ms(crate::constants::BMP280_STARTUP_MS);
        program_registers(&mut *state, spec)
    }
}

/// Write every control register from the cached configuration, in table order
fn program_registers<SI: SensorInterface>(
    state: &mut DeviceState<SI>,
    spec: &VariantSpec,
) -> Result<(), Error> {
    for &register in spec.registers {
        let byte = state.config.pack(spec.fields, register);
        trace!("{} init {:#04x} <- {:#04x}", spec.name, register, byte);
        state.sensor_interface.write_register(register, byte)?;
    }
    Ok(())
}

fn read_identity<SI: SensorInterface>(bus: &mut SI, spec: &VariantSpec) -> Result<Vec<u8>, Error> {
    let identity = spec.identity;
    let id = match identity.expected.len() {
        1 => vec![bus.read_register(identity.register)?],
        len => burst(
            bus,
            DataWindow {
                address: identity.register,
                len,
            },
        )?,
    };
    trace!("{} id: {:02x?}", spec.name, id);
    Ok(id)
}

fn burst<SI: SensorInterface>(bus: &mut SI, window: DataWindow) -> Result<Vec<u8>, Error> {
    let raw = bus.burst_read(window.address, window.len)?;
    crate::interface::check_len(&raw, window.len)?;
    Ok(raw)
}

/// Convert three big-endian 16-bit words to host order
pub fn axes_from_be(raw: &[u8]) -> AxisSample {
    [
        i16::from_be_bytes([raw[0], raw[1]]),
        i16::from_be_bytes([raw[2], raw[3]]),
        i16::from_be_bytes([raw[4], raw[5]]),
    ]
}
