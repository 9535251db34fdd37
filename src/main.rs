// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{env, thread::sleep, time::Duration};
use trisense::{variant::BusKind, DeviceOptions, Error, SensorDevice, SensorInterface, Variant};

const POLL_INTERVAL_MS: u64 = 200;

fn usage() -> Error {
    Error::InvalidArgument(
        "usage: trisense <adxl345|bmp280|hmc5883l> <device> [i2c-address]".to_string(),
    )
}

fn parse_address(arg: &str) -> Result<u16, Error> {
    let parsed = match arg.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|_| Error::InvalidArgument(format!("bad i2c address \"{}\"", arg)))
}

fn run<SI: SensorInterface>(device: SensorDevice<SI>) -> Result<(), Error> {
    let spec = device.variant().spec();
    println!("{} id {:02x?}", spec.name, device.chip_id()?);
    for (field, value) in device.config().iter() {
        let label = spec.field(field).and_then(|f| f.label(value)).unwrap_or("?");
        println!("  {:<18} {} ({})", field.name(), value, label);
    }

    loop {
        if spec.barometric_window.is_some() {
            let sample = device.read_barometric()?;
            println!(
                "{:.2} °C  {:.2} hPa",
                sample.temperature_celsius(),
                sample.pressure_hpa()
            );
        } else {
            let raw = device.read_axes()?;
            match device.scale() {
                Some(scale) => {
                    let [x, y, z] = raw.map(|v| v as f32 / scale.lsb_per_unit);
                    println!(
                        "{:?}  {:.3} {:.3} {:.3} {}",
                        raw, x, y, z, spec.unit
                    );
                }
                None => println!("{:?}", raw),
            }
        }
        sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let variant: Variant = args.first().ok_or_else(usage)?.parse()?;
    let path = args.get(1).ok_or_else(usage)?;
    let options = DeviceOptions::default();

    match variant.bus_for_path(path) {
        BusKind::I2c => {
            let address = match args.get(2) {
                Some(arg) => parse_address(arg)?,
                None => variant.default_i2c_address(),
            };
            run(SensorDevice::open_i2c(path, address, variant, options)?)
        }
        BusKind::Spi => run(SensorDevice::open_spi(
            path,
            variant,
            variant.default_spi_options(),
            options,
        )?),
    }
}
