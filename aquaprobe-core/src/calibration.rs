//! Field calibration
//!
//! Atmospheric calibration of a dissolved-oxygen probe needs an operator: the
//! stored calibration is cleared, the probe is left in air until the reading
//! settles, and the operator flips a trigger input. Only then is the
//! calibration command issued and confirmed.
//!
//! The wait is a step function. [`CalibrationSession::poll`] returns
//! `nb::Error::WouldBlock` while the trigger is unchanged (sampling and
//! logging the live value on each poll) and gives up with
//! [`SensorError::CalibrationTimeout`] after [`CalibrationConfig::max_wait_ms`].

use embedded_hal::digital::InputPin;

use crate::ack::calibration_confirmed;
use crate::command::ProbeCommand;
use crate::config::SensorConfig;
use crate::constants::buffers::RESPONSE_BUFFER_LEN;
use crate::constants::time::{CALIBRATION_MAX_WAIT_MS, CALIBRATION_POLL_INTERVAL_MS, CALIBRATION_SETTLE_MS};
use crate::constants::protocol::CALIBRATION_CONFIRMED_MARKER;
use crate::driver::SensorDriver;
use crate::errors::{SensorError, SensorResult};
use crate::report::{ErrorReporter, NullReporter};
use crate::sampling::SamplingEngine;
use crate::time::{Clock, Timestamp};

const PRIMARY_CHANNEL: u8 = 0;

/// Timing of the operator-triggered calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationConfig {
    /// Wait between two trigger polls in the blocking wrapper
    pub poll_interval_ms: u32,

    /// Give up if the trigger has not changed after this long
    pub max_wait_ms: u64,

    /// Wait after `Cal` and after `Cal,?`
    pub settle_ms: u32,

    /// Sample and log the live value on each poll
    pub sample_while_waiting: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: CALIBRATION_POLL_INTERVAL_MS,
            max_wait_ms: CALIBRATION_MAX_WAIT_MS,
            settle_ms: CALIBRATION_SETTLE_MS,
            sample_while_waiting: true,
        }
    }
}

impl CalibrationConfig {
    /// Clamped to at least 1 ms
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    pub fn with_max_wait_ms(mut self, ms: u64) -> Self {
        self.max_wait_ms = ms;
        self
    }

    pub fn without_live_sampling(mut self) -> Self {
        self.sample_while_waiting = false;
        self
    }
}

/// An open calibration, waiting for the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationSession {
    started_at: Timestamp,
    initial_level: bool,
    waited_ms: u64,
    polls: u32,
}

impl CalibrationSession {
    /// Clear stored calibration and latch the trigger level
    pub fn begin<D, T>(driver: &mut D, trigger: &mut T, clock: &mut dyn Clock) -> SensorResult<Self>
    where
        D: SensorDriver + ?Sized,
        T: InputPin,
    {
        let clear = ProbeCommand::CalibrationClear.render()?;
        driver.send_command(clear.as_str())?;

        let initial_level = trigger.is_high().map_err(|_| SensorError::Gpio)?;
        log_info!("calibration started, waiting for trigger to leave {}", initial_level);

        Ok(Self {
            started_at: clock.now(),
            initial_level,
            waited_ms: 0,
            polls: 0,
        })
    }

    /// Trigger polls performed so far
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Account for a wait the caller performed outside `clock`
    ///
    /// Every poll is charged at least 1 ms so a zero interval still reaches
    /// `max_wait_ms`.
    pub fn note_wait(&mut self, ms: u32) {
        self.waited_ms = self.waited_ms.saturating_add(ms.max(1) as u64);
    }

    fn elapsed_ms(&self, clock: &dyn Clock) -> u64 {
        clock.elapsed_since(self.started_at).max(self.waited_ms)
    }

    /// Advance the calibration by one step
    pub fn poll<D, T, R>(
        &mut self,
        driver: &mut D,
        trigger: &mut T,
        clock: &mut dyn Clock,
        sensor: &SensorConfig,
        config: &CalibrationConfig,
        reporter: &mut R,
    ) -> nb::Result<(), SensorError>
    where
        D: SensorDriver + ?Sized,
        T: InputPin,
        R: ErrorReporter + ?Sized,
    {
        self.polls = self.polls.saturating_add(1);
        let level = trigger.is_high().map_err(|_| nb::Error::Other(SensorError::Gpio))?;

        if level == self.initial_level {
            let waited_ms = self.elapsed_ms(clock);
            if waited_ms >= config.max_wait_ms {
                reporter.report(
                    PRIMARY_CHANNEL,
                    format_args!("calibration trigger not received after {} ms", waited_ms),
                );
                return Err(nb::Error::Other(SensorError::CalibrationTimeout { waited_ms }));
            }

            if config.sample_while_waiting {
                let live = SamplingEngine::sample(driver, clock, sensor, &mut NullReporter);
                match live.value(0) {
                    Some(value) if live.is_success() => {
                        log_info!("calibration live value {}", value);
                    }
                    _ => {
                        log_debug!("calibration live sample failed");
                    }
                }
            }
            return Err(nb::Error::WouldBlock);
        }

        self.confirm(driver, clock, config, reporter).map_err(nb::Error::Other)
    }

    fn confirm<D, R>(
        &self,
        driver: &mut D,
        clock: &mut dyn Clock,
        config: &CalibrationConfig,
        reporter: &mut R,
    ) -> SensorResult<()>
    where
        D: SensorDriver + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        let calibrate = ProbeCommand::CalibrationAtmospheric.render()?;
        let query = ProbeCommand::CalibrationQuery.render()?;

        for command in [&calibrate, &query] {
            driver.send_command(command.as_str()).map_err(|err| {
                reporter.report(
                    PRIMARY_CHANNEL,
                    format_args!("calibration command '{}' failed: {}", command.as_str(), err),
                );
                err
            })?;
            clock.delay_ms(config.settle_ms);
        }

        let mut buf = [0u8; RESPONSE_BUFFER_LEN];
        let reply = driver.receive_response(&mut buf).map_err(|err| {
            reporter.report(PRIMARY_CHANNEL, format_args!("calibration query failed: {}", err));
            err
        })?;

        if calibration_confirmed(reply) {
            log_info!("calibration confirmed after {} polls", self.polls);
            Ok(())
        } else {
            reporter.report(
                PRIMARY_CHANNEL,
                format_args!(
                    "calibration not confirmed: expected '{}', response '{}'",
                    CALIBRATION_CONFIRMED_MARKER, reply
                ),
            );
            Err(SensorError::CalibrationMismatch)
        }
    }
}
