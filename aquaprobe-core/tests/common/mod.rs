//! Common test doubles for integration tests
//!
//! This module provides:
//! - A scripted driver with queued probe responses and a command transcript
//! - Power and trigger pins that share state with the driver
//! - Config fixtures for the probe families

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use aquaprobe_core::{
    CalibrationProcedure, ChannelConfig, Clock, DriverKind, PowerConfig, SensorConfig, SensorDriver,
    SensorError, SensorResult,
};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Shared power rail between a pin and the driver it feeds
pub type Rail = Rc<Cell<bool>>;

pub fn rail(on: bool) -> Rail {
    Rc::new(Cell::new(on))
}

/// Driver returning a fixed reading and scripted probe replies
pub struct ScriptedDriver {
    readings: Vec<f32>,
    rail: Option<Rail>,
    connected: bool,
    fail_read_at: Option<usize>,
    fail_command: Option<String>,
    replies: VecDeque<SensorResult<String>>,
    procedure: CalibrationProcedure,
    kind: DriverKind,
    pub reads: usize,
    pub wakes: usize,
    pub sent: Rc<RefCell<Vec<String>>>,
}

impl ScriptedDriver {
    pub fn constant(readings: &[f32]) -> Self {
        Self {
            readings: readings.to_vec(),
            rail: None,
            connected: true,
            fail_read_at: None,
            fail_command: None,
            replies: VecDeque::new(),
            procedure: CalibrationProcedure::None,
            kind: DriverKind::Custom,
            reads: 0,
            wakes: 0,
            sent: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Only answer while `rail` is on
    pub fn powered_by(mut self, rail: &Rail) -> Self {
        self.rail = Some(rail.clone());
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Fail the raw read with this zero-based index
    pub fn failing_read(mut self, index: usize) -> Self {
        self.fail_read_at = Some(index);
        self
    }

    /// Reject `command` with `ConnectionLost` (it is still transcribed)
    pub fn failing_command(mut self, command: &str) -> Self {
        self.fail_command = Some(command.to_string());
        self
    }

    pub fn with_reply(mut self, text: &str) -> Self {
        self.replies.push_back(Ok(text.to_string()));
        self
    }

    pub fn with_pending_reply(mut self) -> Self {
        self.replies.push_back(Err(SensorError::ResponsePending));
        self
    }

    pub fn atmospheric(mut self) -> Self {
        self.procedure = CalibrationProcedure::Atmospheric;
        self.kind = DriverKind::DissolvedOxygen;
        self
    }

    /// Shared handle to the command transcript
    pub fn transcript(&self) -> Rc<RefCell<Vec<String>>> {
        self.sent.clone()
    }
}

impl SensorDriver for ScriptedDriver {
    fn is_connected(&mut self) -> bool {
        self.connected && self.rail.as_ref().map_or(true, |r| r.get())
    }

    fn raw_read(&mut self, values: &mut [f32], _clock: &mut dyn Clock) -> SensorResult<()> {
        let index = self.reads;
        self.reads += 1;
        if self.fail_read_at == Some(index) {
            return Err(SensorError::ReadFailure);
        }
        values.copy_from_slice(&self.readings[..values.len()]);
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> SensorResult<()> {
        self.sent.borrow_mut().push(command.to_string());
        if self.fail_command.as_deref() == Some(command) {
            return Err(SensorError::ConnectionLost);
        }
        Ok(())
    }

    fn receive_response<'b>(&mut self, buf: &'b mut [u8]) -> SensorResult<&'b str> {
        let text = self.replies.pop_front().unwrap_or(Err(SensorError::ReadFailure))?;
        let len = text.len().min(buf.len());
        buf[..len].copy_from_slice(&text.as_bytes()[..len]);
        std::str::from_utf8(&buf[..len]).map_err(|_| SensorError::ReadFailure)
    }

    fn wake(&mut self, _clock: &mut dyn Clock) -> SensorResult<()> {
        self.wakes += 1;
        Ok(())
    }

    fn kind(&self) -> DriverKind {
        self.kind
    }

    fn calibration_procedure(&self) -> CalibrationProcedure {
        self.procedure
    }
}

/// Output pin recording every level and driving a rail
pub struct RecordingPin {
    pub levels: Rc<RefCell<Vec<bool>>>,
    rail: Rail,
    active_high: bool,
}

impl RecordingPin {
    pub fn new(rail: &Rail) -> Self {
        Self {
            levels: Rc::new(RefCell::new(Vec::new())),
            rail: rail.clone(),
            active_high: true,
        }
    }

    pub fn active_low(rail: &Rail) -> Self {
        Self { active_high: false, ..Self::new(rail) }
    }

    fn drive(&mut self, high: bool) {
        self.levels.borrow_mut().push(high);
        self.rail.set(high == self.active_high);
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// Trigger input replaying scripted levels, repeating the last one
pub struct TriggerPin {
    levels: VecDeque<bool>,
    last: bool,
    pub samples: usize,
}

impl TriggerPin {
    pub fn scripted(levels: &[bool]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
            last: levels.first().copied().unwrap_or(false),
            samples: 0,
        }
    }

    pub fn stuck(level: bool) -> Self {
        Self::scripted(&[level])
    }
}

impl ErrorType for TriggerPin {
    type Error = Infallible;
}

impl InputPin for TriggerPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.samples += 1;
        if let Some(level) = self.levels.pop_front() {
            self.last = level;
        }
        Ok(self.last)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Single-channel dissolved-oxygen style config with no waits
pub fn oxygen_config() -> SensorConfig {
    SensorConfig::new()
        .with_channel(ChannelConfig::new("DISSOLVED_OXYGEN", "mg/L").with_decimals(3).with_range(0.01, 100.0))
        .with_averaging(1, 0)
}

/// Single-channel temperature probe config with no waits
pub fn temperature_config() -> SensorConfig {
    SensorConfig::new()
        .with_channel(ChannelConfig::new("TEMPERATURE", "C").with_range(-126.0, 1254.0))
        .with_averaging(1, 0)
}

/// Single-channel conductivity config with no waits
pub fn salinity_config() -> SensorConfig {
    SensorConfig::new()
        .with_channel(ChannelConfig::new("SALINITY", "ppt").with_range(0.0, 100.0))
        .with_averaging(1, 0)
}

/// Two-channel humidity/temperature config behind a power line
pub fn humidity_config(settle_ms: u32) -> SensorConfig {
    SensorConfig::new()
        .with_channel(ChannelConfig::new("TEMPERATURE", "C").with_range(-20.0, 60.0))
        .with_channel(ChannelConfig::new("HUMIDITY", "%").with_range(0.0, 110.0))
        .with_power(PowerConfig::active_high(5).with_settle_delay_ms(settle_ms))
        .with_averaging(3, 50)
}
