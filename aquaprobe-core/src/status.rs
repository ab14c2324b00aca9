//! Channel status codes and lifecycle states

use crate::errors::SensorResult;

/// Outcome of the last lifecycle call for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i8)]
pub enum Status {
    /// Channel produced a trustworthy value
    Success = 1,
    /// Channel failed; its value is the last known good one
    #[default]
    Fail = -1,
}

impl Status {
    /// Fixed-size status code (1 success, -1 failure)
    pub const fn code(self) -> i8 {
        self as i8
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Inverted status, used when a failure is the expected outcome
    pub const fn inverted(self) -> Self {
        match self {
            Status::Success => Status::Fail,
            Status::Fail => Status::Success,
        }
    }
}

impl<T> From<&SensorResult<T>> for Status {
    fn from(result: &SensorResult<T>) -> Self {
        if result.is_ok() {
            Status::Success
        } else {
            Status::Fail
        }
    }
}

/// Per-sensor lifecycle state
///
/// ```text
/// Disabled → PoweringUp → Stabilizing → (CompensationPending →) Sampling → Ready | Failed
/// Ready | Disabled → PoweringDown → ConfirmingOff → Disabled | Failed
/// Ready → Calibrating → Ready | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    Disabled,
    PoweringUp,
    Stabilizing,
    CompensationPending,
    Sampling,
    Ready,
    Failed,
    PoweringDown,
    ConfirmingOff,
    Calibrating,
}

impl LifecycleState {
    pub const fn name(&self) -> &'static str {
        match self {
            LifecycleState::Disabled => "disabled",
            LifecycleState::PoweringUp => "powering-up",
            LifecycleState::Stabilizing => "stabilizing",
            LifecycleState::CompensationPending => "compensation-pending",
            LifecycleState::Sampling => "sampling",
            LifecycleState::Ready => "ready",
            LifecycleState::Failed => "failed",
            LifecycleState::PoweringDown => "powering-down",
            LifecycleState::ConfirmingOff => "confirming-off",
            LifecycleState::Calibrating => "calibrating",
        }
    }

    /// True while the sensor is expected to be powered
    pub const fn is_powered(&self) -> bool {
        !matches!(
            self,
            LifecycleState::Disabled | LifecycleState::PoweringDown | LifecycleState::ConfirmingOff
        )
    }
}
