//! Static sensor configuration
//!
//! A [`SensorConfig`] is built once at bring-up and never mutated by the
//! lifecycle. All per-channel settings live together in one [`ChannelConfig`],
//! so the channel-indexed views (name, unit, decimals, range, stabilization
//! delay) always share the same length.
//!
//! ```rust
//! use aquaprobe_core::config::{ChannelConfig, PowerConfig, SensorConfig};
//!
//! let config = SensorConfig::new()
//!     .with_channel(
//!         ChannelConfig::new("DISSOLVED_OXYGEN", "mg/L")
//!             .with_decimals(3)
//!             .with_range(0.01, 100.0)
//!             .with_stabilize_delay_ms(30_000),
//!     )
//!     .with_power(PowerConfig::active_high(13).with_settle_delay_ms(2000))
//!     .with_address(0x61)
//!     .with_averaging(5, 1000);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.channel_count(), 1);
//! ```

use crate::constants::buffers::{LABEL_LEN, MAX_CHANNELS, UNIT_LEN};
use crate::constants::protocol::MAX_DECIMALS;
use crate::constants::time::{DEFAULT_AVERAGING_SAMPLES, DEFAULT_POWER_SETTLE_MS, DEFAULT_SAMPLE_DELAY_MS};
use crate::errors::{SensorError, SensorResult};

/// Channel name storage
pub type Label = heapless::String<LABEL_LEN>;

/// Channel unit storage
pub type UnitLabel = heapless::String<UNIT_LEN>;

/// Copy `text` into a fixed-capacity string, truncating at a char boundary
pub fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Electrical level that switches a sensor on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// Power control line of a sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerConfig {
    /// Board-level identifier of the enable line (GPIO number)
    pub line: u8,

    /// Level that powers the sensor
    pub polarity: Polarity,

    /// Wait after switching the line before talking to the sensor
    pub settle_delay_ms: u32,
}

impl PowerConfig {
    pub const fn active_high(line: u8) -> Self {
        Self {
            line,
            polarity: Polarity::ActiveHigh,
            settle_delay_ms: DEFAULT_POWER_SETTLE_MS,
        }
    }

    pub const fn active_low(line: u8) -> Self {
        Self {
            line,
            polarity: Polarity::ActiveLow,
            settle_delay_ms: DEFAULT_POWER_SETTLE_MS,
        }
    }

    pub const fn with_settle_delay_ms(mut self, ms: u32) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Line level (`true` = high) that powers the sensor on or off
    pub const fn level_for(&self, on: bool) -> bool {
        match self.polarity {
            Polarity::ActiveHigh => on,
            Polarity::ActiveLow => !on,
        }
    }
}

/// One measured quantity of a sensor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    /// Output name, e.g. `"PM2_5"` or `"TEMPERATURE"`
    pub name: Label,

    /// Unit label, e.g. `"mg/L"`
    pub unit: UnitLabel,

    /// Decimal places kept after averaging
    pub decimals: u8,

    /// Lowest accepted averaged value
    pub min: f32,

    /// Highest accepted averaged value
    pub max: f32,

    /// Minimum time after power-up before the channel is trustworthy
    pub stabilize_delay_ms: u32,
}

impl ChannelConfig {
    /// Channel with two decimals, unbounded range and no stabilization delay
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: truncated(name),
            unit: truncated(unit),
            decimals: 2,
            min: f32::MIN,
            max: f32::MAX,
            stabilize_delay_ms: 0,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_stabilize_delay_ms(mut self, ms: u32) -> Self {
        self.stabilize_delay_ms = ms;
        self
    }

    /// Inclusive range check
    pub fn accepts(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Static configuration of one logical sensor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Per-channel settings, one entry per output
    pub channels: heapless::Vec<ChannelConfig, MAX_CHANNELS>,

    /// Power control line; `None` for always-on sensors
    pub power: Option<PowerConfig>,

    /// Bus address for addressed probes
    pub address: Option<u8>,

    /// Raw readings averaged into one value
    pub averaging_samples: u16,

    /// Wait between two raw readings
    pub sample_delay_ms: u32,

    /// Validate averaged values against each channel range
    pub check_range: bool,

    /// Set when more channels were added than fit
    #[cfg_attr(feature = "serde", serde(skip))]
    channel_overflow: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorConfig {
    pub fn new() -> Self {
        Self {
            channels: heapless::Vec::new(),
            power: None,
            address: None,
            averaging_samples: DEFAULT_AVERAGING_SAMPLES,
            sample_delay_ms: DEFAULT_SAMPLE_DELAY_MS,
            check_range: true,
            channel_overflow: false,
        }
    }

    /// Append a channel; overflowing [`MAX_CHANNELS`] is caught by [`validate`](Self::validate)
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        if self.channels.push(channel).is_err() {
            self.channel_overflow = true;
        }
        self
    }

    pub fn with_power(mut self, power: PowerConfig) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_averaging(mut self, samples: u16, sample_delay_ms: u32) -> Self {
        self.averaging_samples = samples;
        self.sample_delay_ms = sample_delay_ms;
        self
    }

    pub fn without_range_check(mut self) -> Self {
        self.check_range = false;
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelConfig> {
        self.channels.get(index)
    }

    /// Longest stabilization delay across channels
    pub fn max_stabilize_delay_ms(&self) -> u32 {
        self.channels
            .iter()
            .map(|c| c.stabilize_delay_ms)
            .max()
            .unwrap_or(0)
    }

    /// Settle delay of the power line, zero for always-on sensors
    pub fn settle_delay_ms(&self) -> u32 {
        self.power.map(|p| p.settle_delay_ms).unwrap_or(0)
    }

    /// Check the configuration is usable by a controller
    pub fn validate(&self) -> SensorResult<()> {
        if self.channel_overflow {
            return Err(SensorError::InvalidConfig { reason: "too many channels" });
        }
        if self.channels.is_empty() {
            return Err(SensorError::InvalidConfig { reason: "sensor has no channels" });
        }
        if self.averaging_samples == 0 {
            return Err(SensorError::InvalidConfig { reason: "averaging samples must be at least 1" });
        }
        for channel in &self.channels {
            if channel.decimals > MAX_DECIMALS {
                return Err(SensorError::InvalidConfig { reason: "decimal precision too large" });
            }
            if channel.min.is_nan() || channel.max.is_nan() || channel.min > channel.max {
                return Err(SensorError::InvalidConfig { reason: "channel range is empty" });
            }
        }
        Ok(())
    }
}
