//! Configuration presets for the supported probes
//!
//! Each function returns a validated-by-construction [`SensorConfig`] with
//! the factory defaults of one probe family. Override anything with the
//! `with_*` builders before handing the config to a controller:
//!
//! ```rust
//! use aquaprobe_drivers::profiles;
//!
//! let config = profiles::dissolved_oxygen().with_address(0x62);
//! assert_eq!(config.address, Some(0x62));
//! assert!(config.validate().is_ok());
//! ```
//!
//! By default a dissolved-oxygen probe is compensated for temperature only;
//! link a conductivity probe as salinity source to enable the second axis.

use aquaprobe_core::{ChannelConfig, PowerConfig, SensorConfig};

/// Default enable line of EZO circuits
pub const EZO_ENABLE_LINE: u8 = 13;

pub const DISSOLVED_OXYGEN_ADDRESS: u8 = 0x61;
pub const CONDUCTIVITY_ADDRESS: u8 = 0x64;
pub const TEMPERATURE_PROBE_ADDRESS: u8 = 0x66;

const EZO_POWER_SETTLE_MS: u32 = 2000;
const EZO_SAMPLES: u16 = 5;
const EZO_SAMPLE_DELAY_MS: u32 = 1000;

fn ezo(address: u8, channel: ChannelConfig) -> SensorConfig {
    SensorConfig::new()
        .with_channel(channel)
        .with_power(PowerConfig::active_high(EZO_ENABLE_LINE).with_settle_delay_ms(EZO_POWER_SETTLE_MS))
        .with_address(address)
        .with_averaging(EZO_SAMPLES, EZO_SAMPLE_DELAY_MS)
}

/// EZO-DO: mg/L, 3 decimals, 0.01 to 100, 30 s stabilization
pub fn dissolved_oxygen() -> SensorConfig {
    ezo(
        DISSOLVED_OXYGEN_ADDRESS,
        ChannelConfig::new("DISSOLVED_OXYGEN", "mg/L")
            .with_decimals(3)
            .with_range(0.01, 100.0)
            .with_stabilize_delay_ms(30_000),
    )
}

/// EZO-RTD: °C, 3 decimals, -126 to 1254, 28.6 s stabilization
pub fn temperature_probe() -> SensorConfig {
    ezo(
        TEMPERATURE_PROBE_ADDRESS,
        ChannelConfig::new("TEMPERATURE", "°C")
            .with_decimals(3)
            .with_range(-126.0, 1254.0)
            .with_stabilize_delay_ms(28_600),
    )
}

/// EZO-EC: µS/cm, 2 decimals, 0.07 to 500000, 30 s stabilization
pub fn conductivity() -> SensorConfig {
    ezo(
        CONDUCTIVITY_ADDRESS,
        ChannelConfig::new("CONDUCTIVITY", "uS/cm")
            .with_decimals(2)
            .with_range(0.07, 500_000.0)
            .with_stabilize_delay_ms(30_000),
    )
}

/// PMS particulate sensor: PM1.0, PM2.5, PM10 in µg/m³, whole numbers
pub fn particulate(enable_line: u8) -> SensorConfig {
    let channel = |name: &str| {
        ChannelConfig::new(name, "ug/m3")
            .with_decimals(0)
            .with_range(0.0, 1_000_000.0)
            .with_stabilize_delay_ms(30_000)
    };

    SensorConfig::new()
        .with_channel(channel("PM1_0"))
        .with_channel(channel("PM2_5"))
        .with_channel(channel("PM10_0"))
        .with_power(PowerConfig::active_high(enable_line).with_settle_delay_ms(500))
        .with_averaging(10, 50)
}

/// SHT3x: temperature -20 to 60 °C and humidity 0 to 110 %, 2 decimals
pub fn humidity_temperature(enable_line: u8) -> SensorConfig {
    SensorConfig::new()
        .with_channel(
            ChannelConfig::new("TEMPERATURE", "°C")
                .with_range(-20.0, 60.0)
                .with_stabilize_delay_ms(50),
        )
        .with_channel(
            ChannelConfig::new("HUMIDITY", "%")
                .with_range(0.0, 110.0)
                .with_stabilize_delay_ms(50),
        )
        .with_power(PowerConfig::active_high(enable_line).with_settle_delay_ms(500))
        .with_averaging(10, 50)
}
