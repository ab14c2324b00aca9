//! Error Types for Sensor Lifecycle Failures
//!
//! ## Design Philosophy
//!
//! Aquaprobe runs on controllers where a failed reading is routine, not
//! exceptional. A probe that has not finished warming up, a conductivity
//! sensor that answers a compensation query with stale text, or a particulate
//! sensor that misses a frame all end up here.
//!
//! 1. **Small Size**: Each variant carries only `Copy` data so errors can be
//!    returned from hot paths and stored in channel records.
//!
//! 2. **No Heap Allocation**: Free-form detail (the raw probe response, the
//!    expected text) goes to the [`ErrorReporter`](crate::report::ErrorReporter)
//!    at the point of detection. The error value itself only says *what* failed.
//!
//! 3. **Explicit Propagation**: Lifecycle operations return a
//!    [`SensorResult`] and also write a per-channel
//!    [`Status`](crate::status::Status). Nothing unwinds.
//!
//! ## Error Categories
//!
//! ### Acquisition
//! - `ReadFailure`: the driver could not produce a value within its protocol
//! - `ConnectionLost`: the driver reported not-connected before the read
//! - `RangeViolation`: the averaged value fell outside `[min, max]`
//!
//! ### Probe Protocol
//! - `CompensationMismatch`: compensation push was not confirmed
//! - `CalibrationMismatch`: calibration marker absent from the response
//! - `ResponsePending`: the probe is still processing the last command
//!
//! ### Lifecycle
//! - `StillResponding`: sensor kept answering after power-down
//! - `CalibrationTimeout`: trigger never changed within the wait budget
//! - `CalibrationNotStarted`: calibration polled without a session
//! - `SourceUnavailable`: an upstream compensation sensor is already in use
//!
//! ## Handling Strategy
//!
//! ```rust
//! use aquaprobe_core::SensorError;
//!
//! fn should_retry(err: SensorError) -> bool {
//!     match err {
//!         SensorError::ResponsePending | SensorError::ReadFailure => true,
//!         SensorError::RangeViolation { .. } => false,
//!         SensorError::CompensationMismatch { .. } => true,
//!         _ => false,
//!     }
//! }
//! # assert!(should_retry(SensorError::ReadFailure));
//! ```

use thiserror_no_std::Error;

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Compensation input pushed into a dependent probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompensationAxis {
    /// Ambient temperature, sourced from the temperature probe
    Temperature,
    /// Salinity, sourced from the conductivity probe
    Salinity,
}

impl CompensationAxis {
    /// Human-readable name used in diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            CompensationAxis::Temperature => "temperature",
            CompensationAxis::Salinity => "salinity",
        }
    }

    /// Command key understood by EZO-family probes (`T` or `S`)
    pub const fn key(&self) -> &'static str {
        match self {
            CompensationAxis::Temperature => "T",
            CompensationAxis::Salinity => "S",
        }
    }
}

/// Sensor errors - kept small and `Copy` for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SensorError {
    /// Driver could not produce a value within its protocol
    #[error("Sensor read failed")]
    ReadFailure,

    /// Averaged value outside the configured range
    #[error("Channel {channel} value {value} outside range [{min}, {max}]")]
    RangeViolation {
        /// Channel index the value belongs to
        channel: u8,
        /// Averaged and rounded value
        value: f32,
        /// Lower bound of the accepted range
        min: f32,
        /// Upper bound of the accepted range
        max: f32,
    },

    /// Compensation value was not echoed back by the dependent probe
    #[error("{} compensation not confirmed for {expected}", .axis.name())]
    CompensationMismatch {
        /// Which compensation input failed
        axis: CompensationAxis,
        /// Value that was pushed
        expected: f32,
    },

    /// Calibration status response did not carry the confirmation marker
    #[error("Calibration not confirmed by probe")]
    CalibrationMismatch,

    /// Driver reported not-connected before a read was attempted
    #[error("Sensor not connected")]
    ConnectionLost,

    /// Probe is still processing the previous command
    #[error("Probe response pending")]
    ResponsePending,

    /// Sensor still produced a reading after its power line was released
    #[error("Sensor still responding after power-down")]
    StillResponding,

    /// Calibration trigger did not change within the allowed wait
    #[error("Calibration trigger not received after {waited_ms} ms")]
    CalibrationTimeout {
        /// Milliseconds spent waiting for the trigger
        waited_ms: u64,
    },

    /// Calibration step requested without an open session
    #[error("No calibration in progress")]
    CalibrationNotStarted,

    /// Upstream compensation sensor is borrowed elsewhere
    #[error("Compensation source unavailable")]
    SourceUnavailable,

    /// Power line or trigger input could not be driven or sampled
    #[error("GPIO access failed")]
    Gpio,

    /// Driver does not implement the requested capability
    #[error("Operation not supported by driver")]
    Unsupported,

    /// Static configuration is inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ReadFailure =>
                defmt::write!(fmt, "Read failed"),
            Self::RangeViolation { channel, value, min, max } =>
                defmt::write!(fmt, "Channel {} value {} outside [{}, {}]", channel, value, min, max),
            Self::CompensationMismatch { axis, expected } =>
                defmt::write!(fmt, "{} compensation not confirmed for {}", axis.name(), expected),
            Self::CalibrationMismatch =>
                defmt::write!(fmt, "Calibration not confirmed"),
            Self::ConnectionLost =>
                defmt::write!(fmt, "Not connected"),
            Self::ResponsePending =>
                defmt::write!(fmt, "Response pending"),
            Self::StillResponding =>
                defmt::write!(fmt, "Still responding after power-down"),
            Self::CalibrationTimeout { waited_ms } =>
                defmt::write!(fmt, "Calibration trigger timeout after {} ms", waited_ms),
            Self::CalibrationNotStarted =>
                defmt::write!(fmt, "No calibration in progress"),
            Self::SourceUnavailable =>
                defmt::write!(fmt, "Compensation source unavailable"),
            Self::Gpio =>
                defmt::write!(fmt, "GPIO failure"),
            Self::Unsupported =>
                defmt::write!(fmt, "Unsupported"),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<SensorError>() <= 24);
    }

    #[test]
    fn axis_keys() {
        assert_eq!(CompensationAxis::Temperature.key(), "T");
        assert_eq!(CompensationAxis::Salinity.key(), "S");
    }
}
