//! Multi-Sample Averaging Engine
//!
//! ## Overview
//!
//! One *sample* is `averaging_samples` raw readings from a driver, averaged
//! per channel, rounded to the channel's decimal precision and validated
//! against the channel range.
//!
//! ```text
//! is_connected? ──no──▶ ConnectionLost on every channel
//!      │
//!      ▼
//! raw_read ×N (inter-sample delay between reads)
//!      │ any failure ──▶ ReadFailure on every channel
//!      ▼
//! mean → round(decimals) → range check (per channel)
//! ```
//!
//! ## Design Notes
//!
//! - Accumulation is done in `f64` so long averaging runs of large values
//!   (particle counts) do not lose precision.
//! - A range violation fails only the offending channel; other channels keep
//!   their status.
//! - The engine owns no state. It touches nothing but the driver, the clock
//!   and the reporter.

use crate::config::SensorConfig;
use crate::constants::buffers::MAX_CHANNELS;
use crate::driver::SensorDriver;
use crate::errors::{SensorError, SensorResult};
use crate::report::ErrorReporter;
use crate::status::Status;
use crate::time::Clock;

/// Result of one averaged sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// Averaged and rounded value per channel (zero for channels never read)
    pub values: heapless::Vec<f32, MAX_CHANNELS>,

    /// Per-channel outcome
    pub statuses: heapless::Vec<Status, MAX_CHANNELS>,

    /// Aggregate: `Ok` only if every channel succeeded
    pub status: SensorResult<()>,
}

impl SampleOutcome {
    fn uniform(channels: usize, status: Status, result: SensorResult<()>) -> Self {
        let mut values = heapless::Vec::new();
        let mut statuses = heapless::Vec::new();
        for _ in 0..channels.min(MAX_CHANNELS) {
            let _ = values.push(0.0);
            let _ = statuses.push(status);
        }
        Self { values, statuses, status: result }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    pub fn value(&self, channel: usize) -> Option<f32> {
        self.values.get(channel).copied()
    }

    pub fn channel_status(&self, channel: usize) -> Status {
        self.statuses.get(channel).copied().unwrap_or(Status::Fail)
    }
}

/// Round `value` to `decimals` places
pub fn round_to(value: f64, decimals: u8) -> f32 {
    let scale = libm::pow(10.0, decimals as f64);
    (libm::round(value * scale) / scale) as f32
}

/// Stateless averaging engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplingEngine;

impl SamplingEngine {
    /// Take one averaged, validated sample over `config.averaging_samples` readings
    pub fn sample<D, R>(
        driver: &mut D,
        clock: &mut dyn Clock,
        config: &SensorConfig,
        reporter: &mut R,
    ) -> SampleOutcome
    where
        D: SensorDriver + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        Self::sample_n(driver, clock, config, config.averaging_samples, reporter)
    }

    /// Same as [`sample`](Self::sample) with an explicit reading count
    pub fn sample_n<D, R>(
        driver: &mut D,
        clock: &mut dyn Clock,
        config: &SensorConfig,
        samples: u16,
        reporter: &mut R,
    ) -> SampleOutcome
    where
        D: SensorDriver + ?Sized,
        R: ErrorReporter + ?Sized,
    {
        let channels = config.channel_count();

        if !driver.is_connected() {
            for channel in 0..channels {
                reporter.report(channel as u8, format_args!("sensor not connected"));
            }
            return SampleOutcome::uniform(channels, Status::Fail, Err(SensorError::ConnectionLost));
        }

        let samples = samples.max(1);
        let mut sums = [0.0f64; MAX_CHANNELS];
        let mut raw = [0.0f32; MAX_CHANNELS];

        for i in 0..samples {
            if let Err(err) = driver.raw_read(&mut raw[..channels], clock) {
                for channel in 0..channels {
                    reporter.report(
                        channel as u8,
                        format_args!("raw read {} of {} failed: {}", i + 1, samples, err),
                    );
                }
                return SampleOutcome::uniform(channels, Status::Fail, Err(SensorError::ReadFailure));
            }

            for (sum, value) in sums.iter_mut().zip(&raw[..channels]) {
                *sum += *value as f64;
            }

            if i + 1 < samples {
                clock.delay_ms(config.sample_delay_ms);
            }
        }

        let mut outcome = SampleOutcome::uniform(channels, Status::Success, Ok(()));

        for (index, channel) in config.channels.iter().enumerate() {
            let mean = round_to(sums[index] / samples as f64, channel.decimals);
            outcome.values[index] = mean;

            if config.check_range && !channel.accepts(mean) {
                reporter.report(
                    index as u8,
                    format_args!(
                        "{} value {} outside [{}, {}]",
                        channel.name.as_str(),
                        mean,
                        channel.min,
                        channel.max
                    ),
                );
                outcome.statuses[index] = Status::Fail;
                if outcome.status.is_ok() {
                    outcome.status = Err(SensorError::RangeViolation {
                        channel: index as u8,
                        value: mean,
                        min: channel.min,
                        max: channel.max,
                    });
                }
            }
        }

        log_debug!("sampled {} channels over {} readings", channels, samples);
        outcome
    }
}
