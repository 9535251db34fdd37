// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory bus for tests and bench work without hardware.
//!
//! The mock models a 256 byte register file with auto-incrementing burst
//! reads. Clones share the same register file, so a test can keep one handle
//! while the device under test owns another.

use super::{BusError, SensorInterface};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};

/// One bus transaction as seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write { address: u8, value: u8 },
    Read { address: u8 },
    Burst { address: u8, count: usize },
}

#[derive(Debug)]
struct MockState {
    registers: [u8; 256],
    transactions: Vec<Transaction>,
    fail_writes: bool,
    fail_reads: bool,
    latency: Option<Duration>,
    /// Burst reads at this address produce a fresh [k, k, k] sample each time
    counting_window: Option<u8>,
    counter: i16,
}

#[derive(Debug, Clone)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                registers: [0; 256],
                transactions: Vec::new(),
                fail_writes: false,
                fail_reads: false,
                latency: None,
                counting_window: None,
                counter: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preload registers starting at `address`
    pub fn set_registers(&self, address: u8, data: &[u8]) {
        let start = address as usize;
        self.state().registers[start..start + data.len()].copy_from_slice(data);
    }

    pub fn register(&self, address: u8) -> u8 {
        self.state().registers[address as usize]
    }

    /// Transaction log (for test verification)
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state().transactions.clone()
    }

    pub fn clear_transactions(&self) {
        self.state().transactions.clear();
    }

    /// Values written to `address`, oldest first
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.state()
            .transactions
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { address: a, value } if *a == address => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Make every write fail with a NACK
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Make every read and burst read fail with a NACK
    pub fn fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    /// Sleep inside every transaction to widen race windows
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state().latency = latency;
    }

    /// Each burst read at `address` returns a new sample whose three axes all
    /// equal a running counter (1, 2, 3, ...), big-endian on the wire.
    pub fn count_samples_at(&self, address: u8) {
        let mut state = self.state();
        state.counting_window = Some(address);
        state.counter = 0;
    }

    fn pause(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            thread::sleep(latency);
        }
    }
}

impl SensorInterface for MockBus {
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        self.pause();
        let mut state = self.state();
        if state.fail_writes {
            return Err(BusError::Nack(address));
        }
        state.transactions.push(Transaction::Write { address, value });
        state.registers[address as usize] = value;
        Ok(())
    }

    fn read_register(&mut self, address: u8) -> Result<u8, BusError> {
        self.pause();
        let mut state = self.state();
        if state.fail_reads {
            return Err(BusError::Nack(address));
        }
        state.transactions.push(Transaction::Read { address });
        Ok(state.registers[address as usize])
    }

    fn burst_read(&mut self, address: u8, count: usize) -> Result<Vec<u8>, BusError> {
        self.pause();
        let mut state = self.state();
        if state.fail_reads {
            return Err(BusError::Nack(address));
        }
        let start = address as usize;
        if start + count > state.registers.len() {
            return Err(BusError::BurstTooLong(count));
        }
        state.transactions.push(Transaction::Burst { address, count });
        if state.counting_window == Some(address) {
            state.counter = state.counter.wrapping_add(1);
            let word = state.counter.to_be_bytes();
            for axis in 0..3 {
                state.registers[start + axis * 2..start + axis * 2 + 2].copy_from_slice(&word);
            }
        }
        Ok(state.registers[start..start + count].to_vec())
    }
}
