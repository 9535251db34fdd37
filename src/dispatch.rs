// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-code interface.
//!
//! Commands are numbered with the Linux `_IOC` layout so the codes are the
//! same ones a character device node would accept. Every command carries a
//! fixed-size payload that crosses the caller boundary through a
//! [`UserBuffer`].

use crate::{
    config::Field,
    constants::{
        IOCTL_MAGIC, IOC_DIRSHIFT, IOC_NRBITS, IOC_NRSHIFT, IOC_READ, IOC_SIZESHIFT,
        IOC_TYPEBITS, IOC_TYPESHIFT, IOC_WRITE,
    },
    driver::SensorDevice,
    interface::{BusError, SensorInterface},
    Error,
};
use log::{debug, trace};

/// Payload direction, seen from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to caller
    Read,
    /// Caller to device
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReadAxes,
    ReadBarometric,
    ChipId,
    Get(Field),
    Set(Field),
}

/// Command numbers. 1 to 11 are the historical assignments.
const COMMANDS: [(u8, Command); 23] = [
    (1, Command::ReadAxes),
    (2, Command::Get(Field::OperatingMode)),
    (3, Command::Get(Field::SampleAverage)),
    (4, Command::Get(Field::Gain)),
    (5, Command::Get(Field::MeasurementMode)),
    (6, Command::Get(Field::OutputRate)),
    (7, Command::Set(Field::OperatingMode)),
    (8, Command::Set(Field::SampleAverage)),
    (9, Command::Set(Field::Gain)),
    (10, Command::Set(Field::MeasurementMode)),
    (11, Command::Set(Field::OutputRate)),
    (12, Command::Get(Field::PowerMode)),
    (13, Command::Set(Field::PowerMode)),
    (14, Command::Get(Field::Resolution)),
    (15, Command::Set(Field::Resolution)),
    (16, Command::Get(Field::FifoMode)),
    (17, Command::Set(Field::FifoMode)),
    (18, Command::Get(Field::Filter)),
    (19, Command::Set(Field::Filter)),
    (20, Command::Get(Field::TemperatureOversampling)),
    (21, Command::Set(Field::TemperatureOversampling)),
    (22, Command::ChipId),
    (23, Command::ReadBarometric),
];

const fn ioc(dir: u32, nr: u8, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((IOCTL_MAGIC as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

impl Command {
    pub const ALL: [Command; 23] = {
        let mut all = [Command::ReadAxes; 23];
        let mut i = 0;
        while i < COMMANDS.len() {
            all[i] = COMMANDS[i].1;
            i += 1;
        }
        all
    };

    pub fn number(self) -> u8 {
        COMMANDS
            .iter()
            .find(|(_, command)| *command == self)
            .map(|(nr, _)| *nr)
            .unwrap_or(0)
    }

    pub fn direction(self) -> Direction {
        match self {
            Command::Set(_) => Direction::Write,
            _ => Direction::Read,
        }
    }

    /// Fixed payload size in bytes
    pub fn size(self) -> usize {
        match self {
            Command::ReadAxes => 6,
            Command::ReadBarometric => 8,
            Command::ChipId | Command::Get(_) | Command::Set(_) => 1,
        }
    }

    /// Encoded command code
    pub fn code(self) -> u32 {
        let dir = match self.direction() {
            Direction::Read => IOC_READ,
            Direction::Write => IOC_WRITE,
        };
        ioc(dir, self.number(), self.size())
    }

    /// Decode a command code. Direction and size must match the command
    /// exactly.
    pub fn from_code(code: u32) -> Option<Command> {
        let kind = (code >> IOC_TYPESHIFT) & ((1 << IOC_TYPEBITS) - 1);
        if kind != IOCTL_MAGIC as u32 {
            return None;
        }
        let nr = ((code >> IOC_NRSHIFT) & ((1 << IOC_NRBITS) - 1)) as u8;
        COMMANDS
            .iter()
            .find(|(n, _)| *n == nr)
            .map(|(_, command)| *command)
            .filter(|command| command.code() == code)
    }
}

/// Memory on the far side of the command boundary.
///
/// Copies may fail independently of the device, e.g. for an unmapped
/// address; such failures are reported as [`Error::DataTransferFault`].
pub trait UserBuffer {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the caller's payload into `dst`
    fn copy_in(&self, dst: &mut [u8]) -> Result<(), Error>;

    /// Copy `src` out to the caller
    fn copy_out(&mut self, src: &[u8]) -> Result<(), Error>;
}

fn checked_copy(dst: &mut [u8], src: &[u8]) -> Result<(), Error> {
    if dst.len() != src.len() {
        return Err(Error::DataTransferFault("buffer size changed during copy"));
    }
    dst.copy_from_slice(src);
    Ok(())
}

impl<const N: usize> UserBuffer for [u8; N] {
    fn len(&self) -> usize {
        N
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), Error> {
        checked_copy(dst, self)
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), Error> {
        checked_copy(self, src)
    }
}

impl UserBuffer for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), Error> {
        checked_copy(dst, self)
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), Error> {
        checked_copy(self, src)
    }
}

/// A buffer that claims a size but cannot be accessed, like a NULL or
/// unmapped pointer passed with a valid command
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBuffer {
    pub len: usize,
}

impl UserBuffer for NullBuffer {
    fn len(&self) -> usize {
        self.len
    }

    fn copy_in(&self, _dst: &mut [u8]) -> Result<(), Error> {
        Err(Error::DataTransferFault("null user buffer"))
    }

    fn copy_out(&mut self, _src: &[u8]) -> Result<(), Error> {
        Err(Error::DataTransferFault("null user buffer"))
    }
}

impl<SI: SensorInterface> SensorDevice<SI> {
    /// Whether this sensor implements `command`
    pub fn supports(&self, command: Command) -> bool {
        let spec = self.variant().spec();
        match command {
            Command::ReadAxes => spec.axis_window.is_some(),
            Command::ReadBarometric => spec.barometric_window.is_some(),
            Command::ChipId => true,
            Command::Get(field) | Command::Set(field) => spec.supports(field),
        }
    }

    /// Execute one command code against the device.
    ///
    /// Write payloads are copied in completely before any state is touched;
    /// read payloads are copied out only after the operation succeeded.
    pub fn ioctl(&self, code: u32, arg: &mut dyn UserBuffer) -> Result<(), Error> {
        let command = Command::from_code(code)
            .filter(|command| self.supports(*command))
            .ok_or_else(|| {
                Error::UnsupportedOperation(format!(
                    "{}: command {:#010x}",
                    self.variant(),
                    code
                ))
            })?;
        trace!("{} ioctl {:?}", self.variant(), command);

        if arg.len() != command.size() {
            return Err(Error::InvalidArgument(format!(
                "{:?} takes {} bytes, got {}",
                command,
                command.size(),
                arg.len()
            )));
        }

        match command {
            Command::ReadAxes => {
                let sample = self.read_axes()?;
                let mut payload = [0u8; 6];
                for (chunk, axis) in payload.chunks_exact_mut(2).zip(sample) {
                    chunk.copy_from_slice(&axis.to_ne_bytes());
                }
                arg.copy_out(&payload)
            }
            Command::ReadBarometric => {
                let sample = self.read_barometric()?;
                arg.copy_out(&sample.to_ne_bytes())
            }
            Command::ChipId => {
                let id = self.chip_id()?;
                let first = id.first().copied().ok_or(Error::Bus(BusError::ShortTransfer {
                    expected: 1,
                    actual: 0,
                }))?;
                arg.copy_out(&[first])
            }
            Command::Get(field) => {
                let value = self.get_field(field)?;
                arg.copy_out(&[value])
            }
            Command::Set(field) => {
                let mut value = [0u8; 1];
                arg.copy_in(&mut value)?;
                debug!("{} ioctl set {} = {}", self.variant(), field, value[0]);
                self.set_field(field, value[0])
            }
        }
    }

    /// [`SensorDevice::ioctl`] with the result folded into a syscall-style
    /// return value: 0 on success, a negative errno on failure
    pub fn ioctl_errno(&self, code: u32, arg: &mut dyn UserBuffer) -> i32 {
        match self.ioctl(code, arg) {
            Ok(()) => 0,
            Err(e) => {
                debug!("{} ioctl {:#010x} failed: {}", self.variant(), code, e);
                e.errno()
            }
        }
    }
}
