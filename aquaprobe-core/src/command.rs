//! Text commands understood by EZO-family probes

use core::fmt::{self, Write};

use crate::constants::buffers::COMMAND_BUFFER_LEN;
use crate::constants::protocol::COMPENSATION_DECIMALS;
use crate::errors::{CompensationAxis, SensorError, SensorResult};

/// Formatted command text
pub type CommandText = heapless::String<COMMAND_BUFFER_LEN>;

/// Probe command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeCommand {
    /// Single reading (`R`)
    Read,
    /// Push a compensation value (`T,23.45` / `S,35.00`)
    Compensate { axis: CompensationAxis, value: f32 },
    /// Ask for the active compensation value (`T,?` / `S,?`)
    QueryCompensation(CompensationAxis),
    /// Drop stored calibration (`Cal,clear`)
    CalibrationClear,
    /// Calibrate against atmospheric oxygen (`Cal`)
    CalibrationAtmospheric,
    /// Zero-point calibration (`Cal,0`)
    CalibrationZero,
    /// Ask for calibration status (`Cal,?`)
    CalibrationQuery,
}

impl fmt::Display for ProbeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeCommand::Read => f.write_str("R"),
            ProbeCommand::Compensate { axis, value } => {
                write!(f, "{},{:.*}", axis.key(), COMPENSATION_DECIMALS, value)
            }
            ProbeCommand::QueryCompensation(axis) => write!(f, "{},?", axis.key()),
            ProbeCommand::CalibrationClear => f.write_str("Cal,clear"),
            ProbeCommand::CalibrationAtmospheric => f.write_str("Cal"),
            ProbeCommand::CalibrationZero => f.write_str("Cal,0"),
            ProbeCommand::CalibrationQuery => f.write_str("Cal,?"),
        }
    }
}

impl ProbeCommand {
    /// Render into a fixed buffer
    pub fn render(&self) -> SensorResult<CommandText> {
        let mut text = CommandText::new();
        write!(text, "{}", self).map_err(|_| SensorError::InvalidConfig {
            reason: "command does not fit the command buffer",
        })?;
        Ok(text)
    }
}

/// Format `value` the way it is pushed to a probe (two decimals)
pub fn format_compensation(value: f32) -> CommandText {
    let mut text = CommandText::new();
    // Keeps the text inside the buffer
    let clamped = value.clamp(-1.0e9, 1.0e9);
    let _ = write!(text, "{:.*}", COMPENSATION_DECIMALS, clamped);
    text
}
