//! Probe Protocol Constants
//!
//! Command text and acknowledgment markers shared by EZO-family probes.

/// Substring a calibration status reply must contain to count as calibrated.
///
/// `Cal,?` answers `?CAL,0` when uncalibrated and `?CAL,1` after a single
/// point calibration.
pub const CALIBRATION_CONFIRMED_MARKER: &str = "CAL,1";

/// Decimal places used when formatting a compensation value.
pub const COMPENSATION_DECIMALS: usize = 2;

/// Largest decimal precision accepted for a channel.
pub const MAX_DECIMALS: u8 = 6;

/// Tolerance when comparing a parsed acknowledgment to the pushed value.
///
/// Half of the last formatted digit.
pub const ACK_VALUE_TOLERANCE: f32 = 0.005;

/// Response prefix EZO probes put in front of query answers.
pub const QUERY_REPLY_PREFIX: char = '?';
