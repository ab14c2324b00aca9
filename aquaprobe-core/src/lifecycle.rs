//! Sensor Lifecycle Controller
//!
//! ## Overview
//!
//! A [`SensorController`] owns one driver, its optional power line and its
//! diagnostic reporter, and sequences every lifecycle operation:
//!
//! ```text
//! enable:   Disabled → PoweringUp → Stabilizing → Sampling → Ready | Failed
//! read:     Stabilizing → (CompensationPending →) Sampling → Ready | Failed
//! disable:  PoweringDown → ConfirmingOff → Disabled | Failed
//! calibrate: Calibrating → Ready | Failed
//! ```
//!
//! ## Status Bookkeeping
//!
//! Each operation returns one aggregate [`SensorResult`] and writes every
//! channel status of the [`SensorRecord`] exactly once, early failures
//! included. `enable`, `disable` and `calibrate` broadcast the aggregate to
//! every channel; `read` keeps per-channel outcomes. A failed channel keeps
//! its last known good value.
//!
//! ## Example
//!
//! ```rust
//! use aquaprobe_core::{
//!     ChannelConfig, Clock, SensorConfig, SensorController, SensorDriver, SensorResult,
//!     SimulatedClock, Status,
//! };
//!
//! struct Fixed(f32);
//!
//! impl SensorDriver for Fixed {
//!     fn is_connected(&mut self) -> bool { true }
//!     fn raw_read(&mut self, values: &mut [f32], _clock: &mut dyn Clock) -> SensorResult<()> {
//!         values.fill(self.0);
//!         Ok(())
//!     }
//!     fn send_command(&mut self, _command: &str) -> SensorResult<()> { Ok(()) }
//!     fn receive_response<'b>(&mut self, _buf: &'b mut [u8]) -> SensorResult<&'b str> { Ok("") }
//! }
//!
//! let config = SensorConfig::new()
//!     .with_channel(ChannelConfig::new("TEMPERATURE", "C").with_range(-20.0, 60.0))
//!     .with_averaging(3, 100);
//!
//! let mut sensor = SensorController::new(config, Fixed(21.5)).unwrap();
//! let mut clock = SimulatedClock::default();
//!
//! sensor.enable(&mut clock).unwrap();
//! sensor.read(&mut clock).unwrap();
//! assert_eq!(sensor.record().value(0), 21.5);
//! assert_eq!(sensor.record().status(0), Status::Success);
//! ```

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::calibration::{CalibrationConfig, CalibrationSession};
use crate::compensation::{CompensationCoordinator, CompensationSource};
use crate::config::SensorConfig;
use crate::constants::buffers::MAX_CHANNELS;
use crate::driver::{CalibrationProcedure, SensorDriver, Unpowered};
use crate::errors::{SensorError, SensorResult};
use crate::report::{DiagnosticLog, ErrorReporter, NullReporter};
use crate::sampling::SamplingEngine;
use crate::status::{LifecycleState, Status};
use crate::time::{Clock, Timestamp};

/// Runtime values and statuses of one sensor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorRecord {
    values: heapless::Vec<f32, MAX_CHANNELS>,
    statuses: heapless::Vec<Status, MAX_CHANNELS>,
}

impl SensorRecord {
    /// Record for `channels` outputs, all zero and failed
    pub fn new(channels: usize) -> Self {
        let mut values = heapless::Vec::new();
        let mut statuses = heapless::Vec::new();
        for _ in 0..channels.min(MAX_CHANNELS) {
            let _ = values.push(0.0);
            let _ = statuses.push(Status::Fail);
        }
        Self { values, statuses }
    }

    /// Last known good value, zero for unknown channels
    pub fn value(&self, channel: usize) -> f32 {
        self.values.get(channel).copied().unwrap_or(0.0)
    }

    pub fn status(&self, channel: usize) -> Status {
        self.statuses.get(channel).copied().unwrap_or(Status::Fail)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    pub fn all_success(&self) -> bool {
        self.statuses.iter().all(|s| s.is_success())
    }

    fn broadcast(&mut self, status: Status) {
        self.statuses.iter_mut().for_each(|s| *s = status);
    }
}

/// Lifecycle controller for one sensor
pub struct SensorController<'a, D, P = Unpowered, R = DiagnosticLog> {
    config: SensorConfig,
    driver: D,
    power_pin: Option<P>,
    reporter: R,
    state: LifecycleState,
    record: SensorRecord,
    compensation: Option<CompensationCoordinator<'a>>,
    calibration: CalibrationConfig,
    session: Option<CalibrationSession>,
    powered_at: Option<Timestamp>,
}

impl<'a, D: SensorDriver> SensorController<'a, D> {
    /// Controller for an always-on sensor
    pub fn new(config: SensorConfig, driver: D) -> SensorResult<Self> {
        Self::build(config, driver, None, DiagnosticLog::new())
    }
}

impl<'a, D: SensorDriver, P: OutputPin> SensorController<'a, D, P> {
    /// Controller switching the sensor through `pin`
    pub fn with_power_pin(config: SensorConfig, driver: D, pin: P) -> SensorResult<Self> {
        Self::build(config, driver, Some(pin), DiagnosticLog::new())
    }
}

impl<'a, D, P, R> SensorController<'a, D, P, R>
where
    D: SensorDriver,
    P: OutputPin,
    R: ErrorReporter,
{
    fn build(config: SensorConfig, driver: D, power_pin: Option<P>, reporter: R) -> SensorResult<Self> {
        config.validate()?;
        let record = SensorRecord::new(config.channel_count());
        Ok(Self {
            config,
            driver,
            power_pin,
            reporter,
            state: LifecycleState::Disabled,
            record,
            compensation: None,
            calibration: CalibrationConfig::default(),
            session: None,
            powered_at: None,
        })
    }

    /// Swap the diagnostic sink
    pub fn with_reporter<R2: ErrorReporter>(self, reporter: R2) -> SensorController<'a, D, P, R2> {
        SensorController {
            config: self.config,
            driver: self.driver,
            power_pin: self.power_pin,
            reporter,
            state: self.state,
            record: self.record,
            compensation: self.compensation,
            calibration: self.calibration,
            session: self.session,
            powered_at: self.powered_at,
        }
    }

    /// Compensate from upstream sensors before every read
    pub fn with_compensation(mut self, coordinator: CompensationCoordinator<'a>) -> Self {
        self.compensation = Some(coordinator);
        self
    }

    pub fn with_calibration_config(mut self, config: CalibrationConfig) -> Self {
        self.calibration = config;
        self
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn record(&self) -> &SensorRecord {
        &self.record
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn compensation(&self) -> Option<&CompensationCoordinator<'a>> {
        self.compensation.as_ref()
    }

    pub fn compensation_mut(&mut self) -> Option<&mut CompensationCoordinator<'a>> {
        self.compensation.as_mut()
    }

    /// Time of the last successful power-up
    pub fn powered_at(&self) -> Option<Timestamp> {
        self.powered_at
    }

    /// Give back the driver and power pin
    pub fn release(self) -> (D, Option<P>) {
        (self.driver, self.power_pin)
    }

    fn transition(&mut self, next: LifecycleState) {
        log_debug!(
            "{} {} -> {}",
            self.driver.kind().name(),
            self.state.name(),
            next.name()
        );
        self.state = next;
    }

    fn finish(&mut self, result: SensorResult<()>, success: LifecycleState) -> SensorResult<()> {
        let next = if result.is_ok() { success } else { LifecycleState::Failed };
        log_debug!("{} status code {}", self.driver.kind().name(), Status::from(&result).code());
        self.transition(next);
        result
    }

    fn set_power(&mut self, on: bool) -> SensorResult<()> {
        let Some(pin) = self.power_pin.as_mut() else {
            return Ok(());
        };
        let level = self.config.power.map(|p| p.level_for(on)).unwrap_or(on);
        pin.set_state(PinState::from(level)).map_err(|_| {
            self.reporter.report(0, format_args!("power line could not be switched {}", if on { "on" } else { "off" }));
            SensorError::Gpio
        })
    }

    /// Power the sensor, wake it and take one sample
    pub fn enable(&mut self, clock: &mut dyn Clock) -> SensorResult<()> {
        self.transition(LifecycleState::PoweringUp);
        let result = self.power_up_and_sample(clock);
        self.record.broadcast(Status::from(&result));
        self.finish(result, LifecycleState::Ready)
    }

    fn power_up_and_sample(&mut self, clock: &mut dyn Clock) -> SensorResult<()> {
        self.set_power(true)?;

        self.transition(LifecycleState::Stabilizing);
        clock.delay_ms(self.config.settle_delay_ms());
        self.powered_at = Some(clock.now());
        self.driver.wake(clock).map_err(|err| {
            self.reporter.report(0, format_args!("wake failed: {}", err));
            err
        })?;

        self.transition(LifecycleState::Sampling);
        let outcome = SamplingEngine::sample_n(&mut self.driver, clock, &self.config, 1, &mut self.reporter);
        if outcome.is_success() {
            for (slot, value) in self.record.values.iter_mut().zip(&outcome.values) {
                *slot = *value;
            }
        }
        outcome.status
    }

    /// Cut power and confirm the sensor went silent
    pub fn disable(&mut self, clock: &mut dyn Clock) -> SensorResult<()> {
        self.transition(LifecycleState::PoweringDown);
        let result = self.power_down_and_confirm(clock);
        self.record.broadcast(Status::from(&result));
        self.finish(result, LifecycleState::Disabled)
    }

    fn power_down_and_confirm(&mut self, clock: &mut dyn Clock) -> SensorResult<()> {
        self.set_power(false)?;
        self.session = None;
        self.powered_at = None;
        clock.delay_ms(self.config.settle_delay_ms());

        self.transition(LifecycleState::ConfirmingOff);
        let probe = SamplingEngine::sample_n(&mut self.driver, clock, &self.config, 1, &mut NullReporter);
        // A silent sensor is the expected outcome
        if !Status::from(&probe.status).inverted().is_success() {
            self.reporter.report(0, format_args!("sensor still responding after power-down"));
            return Err(SensorError::StillResponding);
        }
        Ok(())
    }

    /// Remaining stabilization time since power-up
    pub fn stabilization_remaining_ms(&self, clock: &dyn Clock) -> u32 {
        match self.powered_at {
            Some(at) => {
                let elapsed = clock.elapsed_since(at);
                let needed = self.config.max_stabilize_delay_ms() as u64;
                needed.saturating_sub(elapsed) as u32
            }
            None => 0,
        }
    }

    /// Stabilize, compensate if linked, then take an averaged sample
    pub fn read(&mut self, clock: &mut dyn Clock) -> SensorResult<()> {
        self.transition(LifecycleState::Stabilizing);
        let remaining = self.stabilization_remaining_ms(clock);
        if remaining > 0 {
            log_debug!("waiting {} ms for stabilization", remaining);
            clock.delay_ms(remaining);
        }

        if let Some(coordinator) = self.compensation.as_mut() {
            if coordinator.is_configured() {
                self.state = LifecycleState::CompensationPending;
                if let Err(err) = coordinator.ensure_compensated(&mut self.driver, clock, &mut self.reporter) {
                    self.record.broadcast(Status::Fail);
                    return self.finish(Err(err), LifecycleState::Ready);
                }
            }
        }

        self.transition(LifecycleState::Sampling);
        let outcome = SamplingEngine::sample(&mut self.driver, clock, &self.config, &mut self.reporter);

        for channel in 0..self.record.statuses.len() {
            let status = outcome.channel_status(channel);
            if status.is_success() {
                if let Some(value) = outcome.value(channel) {
                    self.record.values[channel] = value;
                }
            }
            self.record.statuses[channel] = status;
        }

        self.finish(outcome.status, LifecycleState::Ready)
    }

    /// Start calibration; drivers without a procedure succeed immediately
    pub fn begin_calibration<T: InputPin>(&mut self, trigger: &mut T, clock: &mut dyn Clock) -> SensorResult<()> {
        if self.driver.calibration_procedure() == CalibrationProcedure::None {
            self.session = None;
            self.record.broadcast(Status::Success);
            return self.finish(Ok(()), LifecycleState::Ready);
        }

        self.transition(LifecycleState::Calibrating);
        match CalibrationSession::begin(&mut self.driver, trigger, clock) {
            Ok(session) => {
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                self.reporter.report(0, format_args!("calibration could not start: {}", err));
                self.record.broadcast(Status::Fail);
                self.finish(Err(err), LifecycleState::Ready)
            }
        }
    }

    /// Advance an open calibration by one step
    pub fn poll_calibration<T: InputPin>(&mut self, trigger: &mut T, clock: &mut dyn Clock) -> nb::Result<(), SensorError> {
        let Some(session) = self.session.as_mut() else {
            return match self.driver.calibration_procedure() {
                CalibrationProcedure::None => Ok(()),
                CalibrationProcedure::Atmospheric => Err(nb::Error::Other(SensorError::CalibrationNotStarted)),
            };
        };

        let step = session.poll(
            &mut self.driver,
            trigger,
            clock,
            &self.config,
            &self.calibration,
            &mut self.reporter,
        );

        let result = match step {
            Err(nb::Error::WouldBlock) => return Err(nb::Error::WouldBlock),
            Ok(()) => Ok(()),
            Err(nb::Error::Other(err)) => Err(err),
        };

        self.session = None;
        self.record.broadcast(Status::from(&result));
        self.finish(result, LifecycleState::Ready).map_err(nb::Error::Other)
    }

    /// Run a calibration to completion, polling the trigger at the configured interval
    pub fn calibrate<T: InputPin>(&mut self, trigger: &mut T, clock: &mut dyn Clock) -> SensorResult<()> {
        self.begin_calibration(trigger, clock)?;

        let interval = self.calibration.poll_interval_ms;
        loop {
            match self.poll_calibration(trigger, clock) {
                Ok(()) => return Ok(()),
                Err(nb::Error::Other(err)) => return Err(err),
                Err(nb::Error::WouldBlock) => {
                    clock.delay_ms(interval);
                    if let Some(session) = self.session.as_mut() {
                        session.note_wait(interval);
                    }
                }
            }
        }
    }

    /// True while a calibration session is open
    pub fn is_calibrating(&self) -> bool {
        self.session.is_some()
    }
}

impl<'a, D, P, R> CompensationSource for SensorController<'a, D, P, R>
where
    D: SensorDriver,
    P: OutputPin,
    R: ErrorReporter,
{
    fn sample_value(&mut self, clock: &mut dyn Clock) -> SensorResult<f32> {
        self.read(clock)?;
        Ok(self.record.value(0))
    }
}
