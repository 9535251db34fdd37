// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration engine and reading pipeline, driven through the mock bus.

use std::{
    collections::HashSet,
    sync::{Arc, Once},
    thread,
    time::Duration,
};
use trisense::{
    interface::mock::{MockBus, Transaction},
    BusError, CachePolicy, DeviceOptions, Error, SensorDevice, Variant,
};

static INIT: Once = Once::new();

fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Mock bus that answers every identity check correctly
fn identified_bus() -> MockBus {
    let bus = MockBus::new();
    bus.set_registers(0x00, &[0xE5]);
    bus.set_registers(0xD0, &[0x58]);
    bus.set_registers(0x0A, b"H43");
    bus
}

fn probe(variant: Variant, options: DeviceOptions) -> (MockBus, SensorDevice<MockBus>) {
    init_logger();
    let bus = identified_bus();
    let device = SensorDevice::probe(bus.clone(), variant, options).expect("probe failed");
    (bus, device)
}

// =============================================================================
// Probe
// =============================================================================

#[test]
fn test_probe_defaults_visible() {
    for variant in Variant::ALL {
        let (_bus, device) = probe(variant, DeviceOptions::default());
        for spec in variant.spec().fields {
            assert_eq!(
                device.get_field(spec.field).unwrap(),
                spec.default,
                "{} {}",
                variant,
                spec.field
            );
        }
    }

    let (_bus, hmc) = probe(Variant::Hmc5883l, DeviceOptions::default());
    assert_eq!(hmc.get_sample_average().unwrap(), 3);
    assert_eq!(hmc.get_output_rate().unwrap(), 4);
    assert_eq!(hmc.get_measurement_mode().unwrap(), 0);
    assert_eq!(hmc.get_gain().unwrap(), 1);
    assert_eq!(hmc.get_operating_mode().unwrap(), 0);
}

#[test]
fn test_probe_writes_packed_defaults() {
    let (bus, _device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    assert_eq!(bus.writes_to(0x02), vec![0x00]);
    assert_eq!(bus.writes_to(0x01), vec![0x20]);
    assert_eq!(bus.writes_to(0x00), vec![0x70]);

    let (bus, _device) = probe(Variant::Bmp280, DeviceOptions::default());
    assert_eq!(bus.writes_to(0xE0), vec![0xB6]);
    // standby 500ms, filter x4
    assert_eq!(bus.writes_to(0xF5), vec![0x88]);
    // temperature x1, pressure x4, normal mode
    assert_eq!(bus.writes_to(0xF4), vec![0x2F]);
}

#[test]
fn test_probe_identity_mismatch() {
    init_logger();
    let bus = MockBus::new();
    bus.set_registers(0x00, &[0x42]);
    let err = SensorDevice::probe(bus.clone(), Variant::Adxl345, DeviceOptions::default())
        .err()
        .expect("probe should fail");
    assert_eq!(err.errno(), -19);
    match err {
        Error::IdentityMismatch { expected, found } => {
            assert_eq!(expected, vec![0xE5]);
            assert_eq!(found, vec![0x42]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    // nothing was configured
    assert!(bus
        .transactions()
        .iter()
        .all(|t| !matches!(t, Transaction::Write { .. })));
}

#[test]
fn test_probe_bus_failure() {
    init_logger();
    let bus = identified_bus();
    bus.fail_reads(true);
    assert!(matches!(
        SensorDevice::probe(bus, Variant::Hmc5883l, DeviceOptions::default()),
        Err(Error::Bus(BusError::Nack(0x0A)))
    ));
}

#[test]
fn test_chip_id() {
    let (_bus, hmc) = probe(Variant::Hmc5883l, DeviceOptions::default());
    assert_eq!(hmc.chip_id().unwrap(), b"H43".to_vec());
    let (_bus, bmp) = probe(Variant::Bmp280, DeviceOptions::default());
    assert_eq!(bmp.chip_id().unwrap(), vec![0x58]);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_set_then_get_every_legal_code() {
    for variant in Variant::ALL {
        let (_bus, device) = probe(variant, DeviceOptions::default());
        for spec in variant.spec().fields {
            for value in 0..spec.legal {
                device.set_field(spec.field, value).unwrap();
                assert_eq!(device.get_field(spec.field).unwrap(), value);
            }
        }
    }
}

#[test]
fn test_illegal_codes_rejected_without_bus_traffic() {
    for variant in Variant::ALL {
        let (bus, device) = probe(variant, DeviceOptions::default());
        bus.clear_transactions();
        let before = device.config();
        for spec in variant.spec().fields {
            for value in spec.legal..=u8::MAX {
                assert!(
                    matches!(
                        device.set_field(spec.field, value),
                        Err(Error::InvalidArgument(_))
                    ),
                    "{} {} {}",
                    variant,
                    spec.field,
                    value
                );
            }
        }
        assert_eq!(device.config(), before);
        assert!(bus.transactions().is_empty());
    }
}

#[test]
fn test_hmc5883l_reserved_rate_rejected() {
    let (_bus, device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    assert!(matches!(
        device.set_output_rate(7),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(device.get_output_rate().unwrap(), 4);
}

#[test]
fn test_set_preserves_neighbour_fields() {
    let (bus, device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    device.set_measurement_mode(1).unwrap();
    device.set_output_rate(6).unwrap();
    assert_eq!(bus.register(0x00), 0x79);
    device.set_gain(7).unwrap();
    assert_eq!(bus.register(0x01), 0xE0);

    let (bus, adxl) = probe(Variant::Adxl345, DeviceOptions::default());
    adxl.set_resolution(1).unwrap();
    adxl.set_gain(3).unwrap();
    assert_eq!(bus.register(0x31), 0x0B);
}

#[test]
fn test_unsupported_fields() {
    let (bus, hmc) = probe(Variant::Hmc5883l, DeviceOptions::default());
    bus.clear_transactions();
    assert!(matches!(hmc.set_filter(1), Err(Error::UnsupportedOperation(_))));
    assert!(matches!(hmc.get_fifo_mode(), Err(Error::UnsupportedOperation(_))));
    assert!(bus.transactions().is_empty());

    let (_bus, bmp) = probe(Variant::Bmp280, DeviceOptions::default());
    assert!(matches!(bmp.set_gain(0), Err(Error::UnsupportedOperation(_))));
}

#[test]
fn test_failed_write_rolls_back() {
    let (bus, device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    bus.fail_writes(true);
    assert!(matches!(device.set_gain(5), Err(Error::Bus(_))));
    assert_eq!(device.get_gain().unwrap(), 1);

    // the device is still usable
    bus.fail_writes(false);
    device.set_gain(5).unwrap();
    assert_eq!(device.get_gain().unwrap(), 5);
    assert_eq!(bus.register(0x01), 0xA0);
}

#[test]
fn test_failed_write_keeps_request() {
    let options = DeviceOptions {
        cache_policy: CachePolicy::LastRequested,
        ..Default::default()
    };
    let (bus, device) = probe(Variant::Hmc5883l, options);
    bus.fail_writes(true);
    assert!(matches!(
        device.set_gain(5),
        Err(Error::Bus(BusError::Nack(0x01)))
    ));
    assert_eq!(device.get_gain().unwrap(), 5);
    assert_eq!(bus.register(0x01), 0x20);
}

#[test]
fn test_concurrent_sets_on_shared_register() {
    let (bus, device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    bus.set_latency(Some(Duration::from_micros(50)));
    let device = Arc::new(device);

    let averaging = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            for i in 0..100u8 {
                device.set_sample_average(i % 4).unwrap();
            }
            device.set_sample_average(2).unwrap();
        })
    };
    let rate = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            for i in 0..100u8 {
                device.set_output_rate(i % 7).unwrap();
            }
            device.set_output_rate(5).unwrap();
        })
    };
    averaging.join().unwrap();
    rate.join().unwrap();

    assert_eq!(device.get_sample_average().unwrap(), 2);
    assert_eq!(device.get_output_rate().unwrap(), 5);
    // the last write carries both final values
    let last = *bus.writes_to(0x00).last().unwrap();
    assert_eq!(last, (2 << 5) | (5 << 2));
    assert_eq!(bus.register(0x00), last);
}

// =============================================================================
// Reading pipeline
// =============================================================================

#[test]
fn test_read_axes_fixture() {
    let (bus, device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    bus.set_registers(0x03, &[0x00, 0x64, 0x00, 0xC8, 0xFF, 0x38]);
    bus.clear_transactions();
    assert_eq!(device.read_axes().unwrap(), [100, 200, -200]);
    assert_eq!(device.axis_sample(), [100, 200, -200]);
    assert_eq!(
        bus.transactions(),
        vec![Transaction::Burst {
            address: 0x03,
            count: 6
        }]
    );
}

#[test]
fn test_read_axes_failure_keeps_sample() {
    let (bus, device) = probe(Variant::Adxl345, DeviceOptions::default());
    bus.set_registers(0x32, &[0x00, 0x01, 0x00, 0x02, 0x00, 0x03]);
    assert_eq!(device.read_axes().unwrap(), [1, 2, 3]);
    bus.fail_reads(true);
    assert!(matches!(device.read_axes(), Err(Error::Bus(_))));
    assert_eq!(device.axis_sample(), [1, 2, 3]);
}

#[test]
fn test_read_scaled() {
    let (bus, device) = probe(Variant::Hmc5883l, DeviceOptions::default());
    // 1090 counts per gauss at the default gain; the window holds X, Z, Y
    bus.set_registers(0x03, &[0x04, 0x42, 0x00, 0x00, 0xFB, 0xBE]);
    let [x, y, z] = device.read_scaled().unwrap();
    assert!((x - 1.0).abs() < 1e-6);
    assert!((y + 1.0).abs() < 1e-6);
    assert_eq!(z, 0.0);
    assert_eq!(device.axis_sample(), [1090, 0, -1090]);
}

#[test]
fn test_read_scaled_adxl345_little_endian() {
    let (bus, device) = probe(Variant::Adxl345, DeviceOptions::default());
    device.set_resolution(1).unwrap();
    // flat on the bench, 1 g on z
    bus.set_registers(0x32, &[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
    assert_eq!(device.read_scaled().unwrap(), [0.0, 0.0, 1.0]);

    // 10-bit mode at ±2 g: 256 counts per g
    device.set_resolution(0).unwrap();
    device.set_gain(0).unwrap();
    bus.set_registers(0x32, &[0x80, 0xFF, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(device.read_scaled().unwrap(), [-0.5, 0.0, 0.0]);
}

#[test]
fn test_concurrent_reads_never_tear() {
    const THREADS: usize = 8;
    const READS: usize = 50;

    let (bus, device) = probe(Variant::Adxl345, DeviceOptions::default());
    bus.count_samples_at(0x32);
    bus.set_latency(Some(Duration::from_micros(20)));
    let device = Arc::new(device);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                (0..READS)
                    .map(|_| device.read_axes().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for [x, y, z] in handle.join().unwrap() {
            assert!(x == y && y == z, "torn sample [{}, {}, {}]", x, y, z);
            assert!(seen.insert(x), "sample {} delivered twice", x);
        }
    }
    assert_eq!(seen.len(), THREADS * READS);
}

#[test]
fn test_bmp280_has_no_axes() {
    let (_bus, device) = probe(Variant::Bmp280, DeviceOptions::default());
    assert!(matches!(
        device.read_axes(),
        Err(Error::UnsupportedOperation(_))
    ));
    let (_bus, hmc) = probe(Variant::Hmc5883l, DeviceOptions::default());
    assert!(matches!(
        hmc.read_barometric(),
        Err(Error::UnsupportedOperation(_))
    ));
}

// =============================================================================
// Barometer
// =============================================================================

const DATASHEET_CALIB: [u8; 24] = [
    0x70, 0x6b, 0x43, 0x67, 0x18, 0xfc, 0x7d, 0x8e, 0x43, 0xd6, 0xd0, 0x0b, 0x27, 0x0b, 0x8c,
    0x00, 0xf9, 0xff, 0x8c, 0x3c, 0xf8, 0xc6, 0x70, 0x17,
];

fn calibrated_bmp280() -> (MockBus, SensorDevice<MockBus>) {
    init_logger();
    let bus = identified_bus();
    bus.set_registers(0x88, &DATASHEET_CALIB);
    bus.set_registers(0xF7, &[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]);
    let device =
        SensorDevice::probe(bus.clone(), Variant::Bmp280, DeviceOptions::default()).unwrap();
    (bus, device)
}

#[test]
fn test_read_barometric() {
    let (_bus, device) = calibrated_bmp280();
    assert_eq!(device.calibration().unwrap().dig_t1, 27504);
    assert_eq!(device.barometric_sample(), None);

    let sample = device.read_barometric().unwrap();
    assert_eq!(sample.raw_pressure, 415148);
    assert_eq!(sample.raw_temperature, 519888);
    assert_eq!(sample.temperature, 2508);
    assert_eq!(sample.pressure, 100653);
    assert_eq!(device.barometric_sample(), Some(sample));
}

#[test]
fn test_soft_reset_restores_configuration() {
    let (bus, device) = calibrated_bmp280();
    device.set_filter(4).unwrap();
    device.set_operating_mode(0).unwrap();
    device.soft_reset().unwrap();
    assert_eq!(bus.writes_to(0xE0), vec![0xB6, 0xB6]);
    assert_eq!(bus.register(0xF5), (4 << 5) | (4 << 2));
    assert_eq!(bus.register(0xF4), (1 << 5) | (3 << 2));
    assert_eq!(device.get_filter().unwrap(), 4);

    let (_bus, adxl) = probe(Variant::Adxl345, DeviceOptions::default());
    assert!(matches!(
        adxl.soft_reset(),
        Err(Error::UnsupportedOperation(_))
    ));
}
