//! Buffer Sizes and Memory Constraints
//!
//! Every per-sensor structure in Aquaprobe is fixed-capacity so the whole
//! acquisition cycle runs without an allocator.

// ===== CHANNELS =====

/// Maximum channels a single sensor can expose.
///
/// Observed sensors use 1 (EZO probes), 2 (temperature + humidity) and
/// 3 (PM1.0 / PM2.5 / PM10). One spare slot keeps room for a fourth output.
pub const MAX_CHANNELS: usize = 4;

/// Capacity of a channel name.
pub const LABEL_LEN: usize = 24;

/// Capacity of a channel unit label.
pub const UNIT_LEN: usize = 8;

// ===== PROBE TEXT =====

/// Capacity of a probe response buffer.
///
/// EZO replies to status queries fit in 32 bytes, including the leading `?`.
pub const RESPONSE_BUFFER_LEN: usize = 32;

/// Capacity of a formatted outbound command.
pub const COMMAND_BUFFER_LEN: usize = 24;

// ===== DIAGNOSTICS =====

/// Number of diagnostics retained per sensor; older entries are overwritten.
pub const DIAGNOSTIC_CAPACITY: usize = 8;

/// Capacity of one diagnostic message.
///
/// Large enough for the axis name, the expected value and a full
/// [`RESPONSE_BUFFER_LEN`] probe response.
pub const DIAGNOSTIC_MESSAGE_LEN: usize = 96;
