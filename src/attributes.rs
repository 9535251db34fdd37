// Copyright 2025 Au-Zone Technologies Inc.
// SPDX-License-Identifier: Apache-2.0

//! Named text attributes, one per configuration field plus read-only data
//! files. Values are rendered as a decimal number and a newline.

use crate::{config::Field, driver::SensorDevice, interface::SensorInterface, Error};
use log::debug;

/// Read-only attributes that are not configuration fields
const AXIS_ATTRIBUTES: [&str; 3] = ["x", "y", "z"];
const BAROMETRIC_ATTRIBUTES: [&str; 2] = ["temperature", "pressure"];
const ID_ATTRIBUTE: &str = "id";

impl<SI: SensorInterface> SensorDevice<SI> {
    /// Attribute names this sensor exposes
    pub fn attributes(&self) -> Vec<&'static str> {
        let spec = self.variant().spec();
        let mut names: Vec<&'static str> = spec.fields.iter().map(|f| f.field.name()).collect();
        if spec.axis_window.is_some() {
            names.extend(AXIS_ATTRIBUTES);
        }
        if spec.barometric_window.is_some() {
            names.extend(BAROMETRIC_ATTRIBUTES);
        }
        names.push(ID_ATTRIBUTE);
        names
    }

    fn attribute_not_found(&self, name: &str) -> Error {
        Error::UnsupportedOperation(format!("{} has no attribute \"{}\"", self.variant(), name))
    }

    /// Render an attribute.
    ///
    /// `x` takes a fresh sample; `y` and `z` report the sample taken by the
    /// last read of `x` (or any other axis read).
    pub fn show(&self, name: &str) -> Result<String, Error> {
        if !self.attributes().contains(&name) {
            return Err(self.attribute_not_found(name));
        }
        let value = match name {
            "x" => self.read_axes()?[0].to_string(),
            "y" => self.axis_sample()[1].to_string(),
            "z" => self.axis_sample()[2].to_string(),
            "temperature" => self.read_barometric()?.temperature.to_string(),
            "pressure" => self.read_barometric()?.pressure.to_string(),
            ID_ATTRIBUTE => self
                .chip_id()?
                .first()
                .copied()
                .unwrap_or_default()
                .to_string(),
            _ => {
                let field = Field::from_name(name).ok_or_else(|| self.attribute_not_found(name))?;
                self.get_field(field)?.to_string()
            }
        };
        Ok(format!("{}\n", value))
    }

    /// Parse `buf` as a decimal code and apply it to a field attribute.
    /// Returns the number of bytes consumed, which is all of them.
    pub fn store(&self, name: &str, buf: &str) -> Result<usize, Error> {
        let field = Field::from_name(name)
            .filter(|field| self.variant().spec().supports(*field))
            .ok_or_else(|| {
                if self.attributes().contains(&name) {
                    Error::UnsupportedOperation(format!("\"{}\" is read-only", name))
                } else {
                    self.attribute_not_found(name)
                }
            })?;
        let value: u8 = buf.trim().parse().map_err(|_| {
            Error::InvalidArgument(format!("{}: cannot parse {:?} as a code", name, buf))
        })?;
        debug!("{} store {} = {}", self.variant(), name, value);
        self.set_field(field, value)?;
        Ok(buf.len())
    }
}
