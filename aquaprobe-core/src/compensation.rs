//! Cross-Sensor Compensation
//!
//! ## Overview
//!
//! A dissolved-oxygen probe reports different values for the same water at
//! different temperatures and salinities. Before it samples, the coordinator
//! pulls a live reading from the temperature probe and from the conductivity
//! probe and pushes both into the dependent probe over its text channel:
//!
//! ```text
//! temperature source ──read──▶ T,23.45 ──▶ wait ──▶ T,? ──▶ wait ──▶ "?T,23.45" ✓
//!                                                                       │
//! salinity source    ──read──▶ S,35.00 ──▶ wait ──▶ S,? ──▶ wait ──▶ "?S,35.00" ✓
//! ```
//!
//! Temperature always runs first. A temperature failure skips salinity for
//! that cycle.
//!
//! ## Sharing Upstream Sensors
//!
//! Upstream controllers are owned elsewhere and cycled independently. The
//! coordinator holds non-owning links of type
//! `&RefCell<dyn CompensationSource>`. An upstream that is already borrowed
//! (for instance, a sensor compensating itself) is detected and reported as
//! [`SensorError::SourceUnavailable`] instead of panicking.
//!
//! ## Flags
//!
//! Each axis has a flag that is set *before* the attempt and stays set
//! whatever the outcome, so compensation is attempted at most once per
//! coordinator. Call [`CompensationCoordinator::reset`] or enable
//! [`CompensationConfig::recompensate_each_cycle`] to push again.
//!
//! ## Acknowledgment
//!
//! After the push, the value is queried back. A pending or unrecognised reply
//! is queried again with a doubling wait bounded by [`AckPolicy`]. A
//! structured reply carrying a different value fails immediately.

use core::cell::RefCell;

use crate::ack::{inspect_compensation, Acknowledgment};
use crate::command::ProbeCommand;
use crate::config::truncated;
use crate::constants::buffers::RESPONSE_BUFFER_LEN;
use crate::constants::time::{ACK_BACKOFF_CAP_MS, ACK_MAX_ATTEMPTS, COMPENSATION_SETTLE_MS};
use crate::driver::SensorDriver;
use crate::errors::{CompensationAxis, SensorError, SensorResult};
use crate::report::ErrorReporter;
use crate::time::Clock;

/// Reading slot diagnostics from the coordinator are attached to
const PRIMARY_CHANNEL: u8 = 0;

/// A sensor able to provide one live compensation value
pub trait CompensationSource {
    /// Run a full read cycle and return the primary channel value
    fn sample_value(&mut self, clock: &mut dyn Clock) -> SensorResult<f32>;
}

/// Non-owning link to an upstream sensor
pub type CompensationLink<'a> = &'a RefCell<dyn CompensationSource + 'a>;

/// Bounded re-query policy for compensation acknowledgments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AckPolicy {
    /// Queries sent before giving up (at least 1)
    pub max_attempts: u8,

    /// Wait between a query and reading its reply on the first attempt
    pub initial_wait_ms: u32,

    /// Upper bound for the doubled wait
    pub max_wait_ms: u32,
}

impl Default for AckPolicy {
    fn default() -> Self {
        Self {
            max_attempts: ACK_MAX_ATTEMPTS,
            initial_wait_ms: COMPENSATION_SETTLE_MS,
            max_wait_ms: ACK_BACKOFF_CAP_MS,
        }
    }
}

impl AckPolicy {
    /// One query with the fixed settle window
    pub fn single_shot() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    pub fn with_max_attempts(mut self, attempts: u8) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_waits(mut self, initial_ms: u32, max_ms: u32) -> Self {
        self.initial_wait_ms = initial_ms;
        self.max_wait_ms = max_ms.max(initial_ms);
        self
    }

    /// Wait before reading the reply of attempt `attempt` (zero-based)
    pub fn wait_for_attempt(&self, attempt: u8) -> u32 {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.initial_wait_ms.saturating_mul(factor).min(self.max_wait_ms)
    }
}

/// Compensation behaviour of one dependent sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompensationConfig {
    /// Wait after a push before the first query
    pub settle_ms: u32,

    pub ack: AckPolicy,

    /// Clear the flags at the start of every cycle
    pub recompensate_each_cycle: bool,

    /// Command key the salinity value is pushed and queried under
    ///
    /// `Salinity` sends `S,<value>`. `Temperature` sends the value as
    /// `T,<value>` for probes configured to take salinity on that key.
    pub salinity_command: CompensationAxis,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            settle_ms: COMPENSATION_SETTLE_MS,
            ack: AckPolicy::default(),
            recompensate_each_cycle: false,
            salinity_command: CompensationAxis::Salinity,
        }
    }
}

impl CompensationConfig {
    pub fn with_ack(mut self, ack: AckPolicy) -> Self {
        self.ack = ack;
        self
    }

    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn recompensating_each_cycle(mut self) -> Self {
        self.recompensate_each_cycle = true;
        self
    }

    pub fn with_salinity_command(mut self, key: CompensationAxis) -> Self {
        self.salinity_command = key;
        self
    }

    /// Key a value for `axis` travels under
    pub fn command_key(&self, axis: CompensationAxis) -> CompensationAxis {
        match axis {
            CompensationAxis::Salinity => self.salinity_command,
            CompensationAxis::Temperature => CompensationAxis::Temperature,
        }
    }
}

/// Which axes have been attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompensationState {
    pub temperature_compensated: bool,
    pub salinity_compensated: bool,
}

impl CompensationState {
    fn flag(&mut self, axis: CompensationAxis) -> &mut bool {
        match axis {
            CompensationAxis::Temperature => &mut self.temperature_compensated,
            CompensationAxis::Salinity => &mut self.salinity_compensated,
        }
    }
}

/// Pushes upstream readings into a dependent probe
pub struct CompensationCoordinator<'a> {
    temperature: Option<CompensationLink<'a>>,
    salinity: Option<CompensationLink<'a>>,
    config: CompensationConfig,
    state: CompensationState,
}

impl<'a> CompensationCoordinator<'a> {
    pub fn new(config: CompensationConfig) -> Self {
        Self {
            temperature: None,
            salinity: None,
            config,
            state: CompensationState::default(),
        }
    }

    pub fn with_temperature_source(mut self, source: CompensationLink<'a>) -> Self {
        self.temperature = Some(source);
        self
    }

    pub fn with_salinity_source(mut self, source: CompensationLink<'a>) -> Self {
        self.salinity = Some(source);
        self
    }

    /// True if at least one upstream link exists
    pub fn is_configured(&self) -> bool {
        self.temperature.is_some() || self.salinity.is_some()
    }

    pub fn state(&self) -> CompensationState {
        self.state
    }

    pub fn config(&self) -> &CompensationConfig {
        &self.config
    }

    /// Allow every axis to be pushed again
    pub fn reset(&mut self) {
        self.state = CompensationState::default();
    }

    /// Push every linked, not yet attempted axis into `driver`
    pub fn ensure_compensated<D, R>(
        &mut self,
        driver: &mut D,
        clock: &mut dyn Clock,
        reporter: &mut R,
    ) -> SensorResult<()>
    where
        D: SensorDriver + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        if self.config.recompensate_each_cycle {
            self.reset();
        }

        for (axis, link) in [
            (CompensationAxis::Temperature, self.temperature),
            (CompensationAxis::Salinity, self.salinity),
        ] {
            let Some(link) = link else { continue };
            let flag = self.state.flag(axis);
            if *flag {
                continue;
            }
            *flag = true;

            let value = Self::upstream_value(axis, link, clock, reporter)?;
            self.push_and_confirm(axis, value, driver, clock, reporter)?;
        }

        Ok(())
    }

    fn upstream_value<R>(
        axis: CompensationAxis,
        link: CompensationLink<'a>,
        clock: &mut dyn Clock,
        reporter: &mut R,
    ) -> SensorResult<f32>
    where
        R: ErrorReporter + ?Sized,
    {
        let mut source = match link.try_borrow_mut() {
            Ok(source) => source,
            Err(_) => {
                reporter.report(
                    PRIMARY_CHANNEL,
                    format_args!("{} source busy, compensation skipped", axis.name()),
                );
                return Err(SensorError::SourceUnavailable);
            }
        };

        source.sample_value(clock).map_err(|err| {
            reporter.report(
                PRIMARY_CHANNEL,
                format_args!("{} source read failed: {}", axis.name(), err),
            );
            SensorError::ReadFailure
        })
    }

    fn push_and_confirm<D, R>(
        &self,
        axis: CompensationAxis,
        value: f32,
        driver: &mut D,
        clock: &mut dyn Clock,
        reporter: &mut R,
    ) -> SensorResult<()>
    where
        D: SensorDriver + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        let key = self.config.command_key(axis);
        let push = ProbeCommand::Compensate { axis: key, value }.render()?;
        let query = ProbeCommand::QueryCompensation(key).render()?;

        log_debug!("compensation push {}", push.as_str());
        driver.send_command(push.as_str()).map_err(|err| {
            reporter.report(PRIMARY_CHANNEL, format_args!("{} push failed: {}", axis.name(), err));
            err
        })?;
        clock.delay_ms(self.config.settle_ms);

        let mut last_reply: heapless::String<RESPONSE_BUFFER_LEN> = heapless::String::new();
        let attempts = self.config.ack.max_attempts.max(1);

        for attempt in 0..attempts {
            driver.send_command(query.as_str()).map_err(|err| {
                reporter.report(PRIMARY_CHANNEL, format_args!("{} query send failed: {}", axis.name(), err));
                err
            })?;
            clock.delay_ms(self.config.ack.wait_for_attempt(attempt));

            let mut buf = [0u8; RESPONSE_BUFFER_LEN];
            let reply = match driver.receive_response(&mut buf) {
                Ok(reply) => reply,
                Err(SensorError::ResponsePending) => {
                    log_debug!("{} acknowledgment pending, attempt {}", axis.name(), attempt + 1);
                    last_reply = truncated("<pending>");
                    continue;
                }
                Err(err) => {
                    reporter.report(
                        PRIMARY_CHANNEL,
                        format_args!("{} query failed: {}", axis.name(), err),
                    );
                    return Err(err);
                }
            };
            last_reply = truncated(reply);

            match inspect_compensation(reply, key, value) {
                Acknowledgment::Confirmed(_) | Acknowledgment::ConfirmedByText => {
                    log_info!("{} compensation confirmed at {}", axis.name(), value);
                    return Ok(());
                }
                Acknowledgment::Mismatch(_) => break,
                Acknowledgment::Unconfirmed => continue,
            }
        }

        reporter.report(
            PRIMARY_CHANNEL,
            format_args!(
                "{} compensation not confirmed: expected {:.2}, response '{}'",
                axis.name(),
                value,
                last_reply.as_str()
            ),
        );
        Err(SensorError::CompensationMismatch { axis, expected: value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = AckPolicy::default();
        assert_eq!(policy.wait_for_attempt(0), 1000);
        assert_eq!(policy.wait_for_attempt(1), 2000);
        assert_eq!(policy.wait_for_attempt(2), 4000);
        assert_eq!(policy.wait_for_attempt(3), 8000);
        assert_eq!(policy.wait_for_attempt(10), 8000);
        assert_eq!(policy.wait_for_attempt(40), 8000);
    }

    #[test]
    fn single_shot_policy() {
        let policy = AckPolicy::single_shot();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.wait_for_attempt(0), COMPENSATION_SETTLE_MS);
    }

    #[test]
    fn salinity_key_is_configurable() {
        let config = CompensationConfig::default();
        assert_eq!(config.command_key(CompensationAxis::Salinity), CompensationAxis::Salinity);

        let config = config.with_salinity_command(CompensationAxis::Temperature);
        assert_eq!(config.command_key(CompensationAxis::Salinity), CompensationAxis::Temperature);
        assert_eq!(config.command_key(CompensationAxis::Temperature), CompensationAxis::Temperature);
    }

    #[test]
    fn unlinked_coordinator_is_idle() {
        let coordinator = CompensationCoordinator::new(CompensationConfig::default());
        assert!(!coordinator.is_configured());
        assert_eq!(coordinator.state(), CompensationState::default());
    }
}
