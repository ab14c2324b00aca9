//! Core sensor lifecycle engine for Aquaprobe
//!
//! Drives power cycling, stabilization, averaging, range validation,
//! cross-sensor compensation and field calibration for water-quality probes.
//! Designed for small controllers.
//!
//! Key constraints:
//! - `no_std`, no heap: every buffer is a fixed-capacity `heapless` type
//! - Single-threaded and blocking: all waits go through a [`Clock`]
//! - One [`SensorDriver`] per sensor, owned by its [`SensorController`]
//!
//! ```no_run
//! use aquaprobe_core::{SensorController, SensorConfig, SensorDriver, StdClock};
//!
//! fn cycle<D: SensorDriver>(config: SensorConfig, driver: D) {
//!     let mut clock = StdClock::new();
//!     let mut sensor = match SensorController::new(config, driver) {
//!         Ok(sensor) => sensor,
//!         Err(_) => return, // Configuration rejected
//!     };
//!
//!     if sensor.enable(&mut clock).is_ok() {
//!         let _ = sensor.read(&mut clock);
//!     }
//!     let _ = sensor.disable(&mut clock);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

pub mod ack;
pub mod calibration;
pub mod command;
pub mod compensation;
pub mod config;
pub mod constants;
pub mod driver;
pub mod errors;
pub mod lifecycle;
pub mod report;
pub mod sampling;
pub mod status;
pub mod time;

// Public API
pub use calibration::{CalibrationConfig, CalibrationSession};
pub use command::ProbeCommand;
pub use compensation::{
    AckPolicy, CompensationConfig, CompensationCoordinator, CompensationLink, CompensationSource,
    CompensationState,
};
pub use config::{ChannelConfig, Polarity, PowerConfig, SensorConfig};
pub use driver::{CalibrationProcedure, DriverKind, SensorDriver, Unpowered};
pub use errors::{CompensationAxis, SensorError, SensorResult};
pub use lifecycle::{SensorController, SensorRecord};
pub use report::{Diagnostic, DiagnosticLog, ErrorReporter, NullReporter};
pub use sampling::{SampleOutcome, SamplingEngine};
pub use status::{LifecycleState, Status};
pub use time::{Clock, FixedTime, HalClock, SimulatedClock, TimeSource, Timestamp};

#[cfg(feature = "std")]
pub use time::StdClock;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
