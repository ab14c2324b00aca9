//! Time-Related Constants
//!
//! Waits used by the lifecycle controller and the compensation coordinator.
//! EZO-family probes give no completion signal for configuration commands,
//! so most of these are fixed windows measured against the probe datasheets.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== PROBE COMMAND WINDOWS =====

/// Wait after pushing a compensation value before querying it back.
///
/// EZO probes need roughly 300 ms to process `T,<value>`; the firmware this
/// replaces used a full second and probes in the field were tuned to it.
pub const COMPENSATION_SETTLE_MS: u32 = 1000;

/// Wait after `Cal` / `Cal,?` before reading the reply.
pub const CALIBRATION_SETTLE_MS: u32 = 1000;

// ===== ACKNOWLEDGMENT RETRY =====

/// Number of query attempts before a compensation push is declared unconfirmed.
pub const ACK_MAX_ATTEMPTS: u8 = 3;

/// Upper bound for the doubling wait between acknowledgment queries.
pub const ACK_BACKOFF_CAP_MS: u32 = 8000;

// ===== CALIBRATION TRIGGER =====

/// Interval between trigger polls while waiting for the operator.
pub const CALIBRATION_POLL_INTERVAL_MS: u32 = 1000;

/// Longest wait for the calibration trigger before failing closed.
///
/// Five minutes is enough to pull a dissolved-oxygen probe out of the water
/// and let the membrane dry for an atmospheric calibration.
pub const CALIBRATION_MAX_WAIT_MS: u64 = 5 * 60 * MS_PER_SECOND;

// ===== SAMPLING DEFAULTS =====

/// Default number of raw readings averaged into one value.
pub const DEFAULT_AVERAGING_SAMPLES: u16 = 5;

/// Default wait between two raw readings.
pub const DEFAULT_SAMPLE_DELAY_MS: u32 = 1000;

/// Default wait after switching a power line.
pub const DEFAULT_POWER_SETTLE_MS: u32 = 500;
