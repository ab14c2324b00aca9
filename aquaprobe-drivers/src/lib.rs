//! Probe adapters for Aquaprobe
//!
//! Every driver owns its transport and implements
//! [`aquaprobe_core::SensorDriver`]:
//!
//! - [`DissolvedOxygenDriver`], [`ConductivityDriver`], [`TemperatureProbeDriver`]:
//!   EZO circuits over [`EzoTransport`] (I2C via [`I2cEzoTransport`])
//! - [`ParticulateDriver`]: PMS frames over [`PmsTransport`]
//! - [`HumidityTempDriver`]: SHT3x over [`HumidityTempTransport`] (I2C via [`Sht31Transport`])
//!
//! [`profiles`] holds the factory configuration of each probe.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

pub mod ezo;
pub mod humidity;
pub mod particulate;
pub mod profiles;

pub use ezo::{
    ConductivityDriver, DissolvedOxygenDriver, EzoProbe, EzoTransport, I2cEzoTransport, ResponseCode,
    TemperatureProbeDriver,
};
pub use humidity::{HumidityTempDriver, HumidityTempTransport, Measurement, Sht31Transport};
pub use particulate::{ParticulateDriver, PmsFrame, PmsTransport};
