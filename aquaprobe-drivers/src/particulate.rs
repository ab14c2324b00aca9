//! Plantower PMS-series particulate matter sensor
//!
//! The sensor streams 32-byte frames over a UART:
//!
//! ```text
//! 0x42 0x4D | len (2) | 13 × u16 data | checksum (2)
//! ```
//!
//! Data words 0..3 carry PM1.0, PM2.5 and PM10 in µg/m³ (standard particle).
//! The checksum is the 16-bit sum of every preceding byte. In passive mode the
//! host asks for a frame with [`REQUEST_READ`]; [`ACTIVE_MODE`] and
//! [`WAKE_UP`] are sent when the sensor is powered on.
//!
//! The serial link itself is abstracted by [`PmsTransport`].

use aquaprobe_core::{Clock, DriverKind, SensorDriver, SensorError, SensorResult};

/// Bytes in one data frame
pub const FRAME_LEN: usize = 32;

/// How long to wait for a frame after a read request
pub const FRAME_TIMEOUT_MS: u32 = 2000;

const START_1: u8 = 0x42;
const START_2: u8 = 0x4D;

/// Switch to active (streaming) mode
pub const ACTIVE_MODE: [u8; 7] = [0x42, 0x4D, 0xE1, 0x00, 0x01, 0x01, 0x71];

/// Leave sleep
pub const WAKE_UP: [u8; 7] = [0x42, 0x4D, 0xE4, 0x00, 0x01, 0x01, 0x74];

/// Request one frame in passive mode
pub const REQUEST_READ: [u8; 7] = [0x42, 0x4D, 0xE2, 0x00, 0x00, 0x01, 0x71];

/// Mass concentrations from one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PmsFrame {
    pub pm1_0: u16,
    pub pm2_5: u16,
    pub pm10_0: u16,
}

impl PmsFrame {
    /// Decode and verify a raw frame
    pub fn decode(raw: &[u8; FRAME_LEN]) -> SensorResult<Self> {
        if raw[0] != START_1 || raw[1] != START_2 {
            return Err(SensorError::ReadFailure);
        }
        let word = |i: usize| u16::from_be_bytes([raw[i], raw[i + 1]]);

        if word(2) as usize != FRAME_LEN - 4 {
            return Err(SensorError::ReadFailure);
        }
        let sum = raw[..FRAME_LEN - 2]
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(b as u16));
        if sum != word(FRAME_LEN - 2) {
            return Err(SensorError::ReadFailure);
        }

        Ok(Self {
            pm1_0: word(4),
            pm2_5: word(6),
            pm10_0: word(8),
        })
    }
}

/// Serial link to a PMS sensor
pub trait PmsTransport {
    fn request_read(&mut self) -> SensorResult<()>;

    /// Wait up to `timeout_ms` for the next valid frame
    fn read_frame(&mut self, timeout_ms: u32, clock: &mut dyn Clock) -> SensorResult<PmsFrame>;

    fn active_mode(&mut self) -> SensorResult<()>;

    fn wake_up(&mut self) -> SensorResult<()>;
}

/// Three-channel particulate driver (PM1.0, PM2.5, PM10)
pub struct ParticulateDriver<T> {
    transport: T,
    timeout_ms: u32,
}

impl<T: PmsTransport> ParticulateDriver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, timeout_ms: FRAME_TIMEOUT_MS }
    }

    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }
}

impl<T: PmsTransport> SensorDriver for ParticulateDriver<T> {
    fn is_connected(&mut self) -> bool {
        true
    }

    fn raw_read(&mut self, values: &mut [f32], clock: &mut dyn Clock) -> SensorResult<()> {
        self.transport.request_read()?;
        let frame = self.transport.read_frame(self.timeout_ms, clock)?;

        let readings = [frame.pm1_0, frame.pm2_5, frame.pm10_0];
        for (slot, reading) in values.iter_mut().zip(readings) {
            *slot = reading as f32;
        }
        Ok(())
    }

    fn send_command(&mut self, _command: &str) -> SensorResult<()> {
        Err(SensorError::Unsupported)
    }

    fn receive_response<'b>(&mut self, _buf: &'b mut [u8]) -> SensorResult<&'b str> {
        Err(SensorError::Unsupported)
    }

    fn wake(&mut self, _clock: &mut dyn Clock) -> SensorResult<()> {
        self.transport.active_mode()?;
        self.transport.wake_up()
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Particulate
    }
}
