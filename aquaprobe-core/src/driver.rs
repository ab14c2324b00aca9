//! Sensor driver capability
//!
//! ## Design Philosophy
//!
//! The lifecycle controller never knows which physical sensor it drives. A
//! driver exposes four primitives (presence check, raw multi-channel read,
//! command send, response receive) and everything above them (averaging,
//! range validation, compensation, calibration, status bookkeeping) is shared.
//!
//! The trait is object safe so a heterogeneous fleet can be stored as
//! `&mut dyn SensorDriver`. Drivers own their transport: there is no shared
//! global bus handle.
//!
//! ## Capabilities
//!
//! Not every sensor speaks the text protocol. Drivers without a command
//! channel return [`SensorError::Unsupported`] from
//! [`send_command`](SensorDriver::send_command) and
//! [`receive_response`](SensorDriver::receive_response); the controller only
//! calls them for drivers that advertise a calibration procedure or act as a
//! compensation target.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::errors::{SensorError, SensorResult};
use crate::time::Clock;

/// Family of a driver, used for logging and profile selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverKind {
    Particulate,
    HumidityTemperature,
    DissolvedOxygen,
    Conductivity,
    TemperatureProbe,
    /// Anything plugged in from outside this workspace
    Custom,
}

impl DriverKind {
    pub const fn name(&self) -> &'static str {
        match self {
            DriverKind::Particulate => "particulate",
            DriverKind::HumidityTemperature => "humidity-temperature",
            DriverKind::DissolvedOxygen => "dissolved-oxygen",
            DriverKind::Conductivity => "conductivity",
            DriverKind::TemperatureProbe => "temperature-probe",
            DriverKind::Custom => "custom",
        }
    }
}

/// Field calibration supported by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationProcedure {
    /// No physical procedure; calibration always succeeds
    #[default]
    None,
    /// Clear, wait for an operator trigger, then calibrate against air
    Atmospheric,
}

/// Capability every sensor adapter provides
pub trait SensorDriver {
    /// Presence check performed before each sample
    fn is_connected(&mut self) -> bool;

    /// Fill `values` with one raw reading per channel
    ///
    /// `values` has exactly the configured channel count. Drivers that need a
    /// conversion window wait through `clock`.
    fn raw_read(&mut self, values: &mut [f32], clock: &mut dyn Clock) -> SensorResult<()>;

    /// Send one text command on the probe channel
    fn send_command(&mut self, command: &str) -> SensorResult<()>;

    /// Receive the pending response into `buf` and return it as text
    fn receive_response<'b>(&mut self, buf: &'b mut [u8]) -> SensorResult<&'b str>;

    /// Hook run after power-up settle and before the first sample
    fn wake(&mut self, _clock: &mut dyn Clock) -> SensorResult<()> {
        Ok(())
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Custom
    }

    fn calibration_procedure(&self) -> CalibrationProcedure {
        CalibrationProcedure::None
    }
}

impl<D: SensorDriver + ?Sized> SensorDriver for &mut D {
    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }

    fn raw_read(&mut self, values: &mut [f32], clock: &mut dyn Clock) -> SensorResult<()> {
        (**self).raw_read(values, clock)
    }

    fn send_command(&mut self, command: &str) -> SensorResult<()> {
        (**self).send_command(command)
    }

    fn receive_response<'b>(&mut self, buf: &'b mut [u8]) -> SensorResult<&'b str> {
        (**self).receive_response(buf)
    }

    fn wake(&mut self, clock: &mut dyn Clock) -> SensorResult<()> {
        (**self).wake(clock)
    }

    fn kind(&self) -> DriverKind {
        (**self).kind()
    }

    fn calibration_procedure(&self) -> CalibrationProcedure {
        (**self).calibration_procedure()
    }
}

/// Decode a probe response buffer as text, stopping at the first NUL
pub fn response_text(buf: &[u8]) -> SensorResult<&str> {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    core::str::from_utf8(&buf[..end]).map_err(|_| SensorError::ReadFailure)
}

/// Power line placeholder for sensors without an enable pin
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpowered;

impl ErrorType for Unpowered {
    type Error = Infallible;
}

impl OutputPin for Unpowered {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_stops_at_nul() {
        let buf = *b"?T,23.45\0\0\0";
        assert_eq!(response_text(&buf), Ok("?T,23.45"));
    }

    #[test]
    fn response_text_rejects_invalid_utf8() {
        assert_eq!(response_text(&[0xff, 0xfe]), Err(SensorError::ReadFailure));
    }

    #[test]
    fn kinds_have_names() {
        assert_eq!(DriverKind::DissolvedOxygen.name(), "dissolved-oxygen");
        assert_eq!(CalibrationProcedure::default(), CalibrationProcedure::None);
    }
}
