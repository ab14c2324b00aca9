//! Constants for Aquaprobe Core
//!
//! Centralized numeric defaults used by the sampling engine, compensation
//! coordinator and lifecycle controller. Values that came from probe firmware
//! behaviour (settle windows, response buffer size, confirmation markers) are
//! kept here so a deployment can see every timing assumption in one place.
//!
//! ## Organization
//!
//! - **Time**: settle windows, polling intervals, timeouts
//! - **Buffers**: fixed capacities for channels, responses and diagnostics
//! - **Protocol**: command text and acknowledgment markers
//!
//! All durations are milliseconds and carry an `_MS` suffix.

/// Time-related constants for waits, polling and timeouts.
pub mod time;

/// Fixed capacities for channel arrays and text buffers.
pub mod buffers;

/// Probe command strings and acknowledgment markers.
pub mod protocol;

pub use time::{
    COMPENSATION_SETTLE_MS, CALIBRATION_SETTLE_MS, CALIBRATION_POLL_INTERVAL_MS,
    CALIBRATION_MAX_WAIT_MS, ACK_MAX_ATTEMPTS, ACK_BACKOFF_CAP_MS,
};

pub use buffers::{
    MAX_CHANNELS, RESPONSE_BUFFER_LEN, COMMAND_BUFFER_LEN, LABEL_LEN, UNIT_LEN,
    DIAGNOSTIC_CAPACITY, DIAGNOSTIC_MESSAGE_LEN,
};

pub use protocol::{CALIBRATION_CONFIRMED_MARKER, COMPENSATION_DECIMALS, MAX_DECIMALS};
