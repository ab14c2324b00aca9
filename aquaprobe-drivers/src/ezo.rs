//! EZO-family probe adapters (dissolved oxygen, conductivity, RTD temperature)
//!
//! ## Protocol
//!
//! EZO circuits speak a text protocol. A command is written as ASCII bytes to
//! the circuit's bus address; after the command's processing window the host
//! reads a fixed-size reply whose first byte is a response code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 1    | success, payload follows |
//! | 2    | syntax error |
//! | 254  | still processing |
//! | 255  | no data to send |
//!
//! The payload is NUL-terminated ASCII, e.g. `8.21` for a reading or
//! `?T,23.45` for a compensation query. Multi-output circuits (conductivity)
//! answer `R` with comma-separated fields.
//!
//! ## Layout
//!
//! [`EzoTransport`] moves bytes; [`I2cEzoTransport`] implements it over any
//! `embedded_hal::i2c::I2c` bus. [`EzoProbe`] adds the read cycle and response
//! decoding. The three public drivers wrap an `EzoProbe` and differ only in
//! their kind and calibration procedure.

use aquaprobe_core::constants::buffers::RESPONSE_BUFFER_LEN;
use aquaprobe_core::driver::response_text;
use aquaprobe_core::{
    CalibrationProcedure, Clock, DriverKind, ProbeCommand, SensorDriver, SensorError, SensorResult,
};
use embedded_hal::i2c::I2c;

/// Processing window of the `R` command
pub const DEFAULT_READ_DELAY_MS: u32 = 1000;

/// Reply status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseCode {
    Success,
    SyntaxError,
    Pending,
    NoData,
    Unknown(u8),
}

impl From<u8> for ResponseCode {
    fn from(code: u8) -> Self {
        match code {
            1 => ResponseCode::Success,
            2 => ResponseCode::SyntaxError,
            254 => ResponseCode::Pending,
            255 => ResponseCode::NoData,
            other => ResponseCode::Unknown(other),
        }
    }
}

/// Byte transport to one EZO circuit
pub trait EzoTransport {
    /// Write one command
    fn send(&mut self, command: &str) -> SensorResult<()>;

    /// Read the pending reply; the payload (without the code byte) is copied
    /// into `buf` and its length returned
    fn receive(&mut self, buf: &mut [u8]) -> SensorResult<(ResponseCode, usize)>;
}

/// EZO transport over an I2C bus
pub struct I2cEzoTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cEzoTransport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> EzoTransport for I2cEzoTransport<I2C> {
    fn send(&mut self, command: &str) -> SensorResult<()> {
        self.i2c
            .write(self.address, command.as_bytes())
            .map_err(|_| SensorError::ReadFailure)
    }

    fn receive(&mut self, buf: &mut [u8]) -> SensorResult<(ResponseCode, usize)> {
        let mut raw = [0u8; RESPONSE_BUFFER_LEN];
        self.i2c
            .read(self.address, &mut raw)
            .map_err(|_| SensorError::ReadFailure)?;

        let payload = &raw[1..];
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let len = end.min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Ok((ResponseCode::from(raw[0]), len))
    }
}

/// Read cycle and reply decoding shared by every EZO driver
pub struct EzoProbe<T> {
    transport: T,
    read_delay_ms: u32,
    last_code: Option<ResponseCode>,
}

impl<T: EzoTransport> EzoProbe<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            read_delay_ms: DEFAULT_READ_DELAY_MS,
            last_code: None,
        }
    }

    pub fn with_read_delay_ms(mut self, ms: u32) -> Self {
        self.read_delay_ms = ms;
        self
    }

    /// Code of the most recent reply
    pub fn last_code(&self) -> Option<ResponseCode> {
        self.last_code
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    pub fn send(&mut self, command: &str) -> SensorResult<()> {
        self.transport.send(command)
    }

    /// Receive a reply and map its code to a result
    pub fn receive<'b>(&mut self, buf: &'b mut [u8]) -> SensorResult<&'b str> {
        let (code, len) = self.transport.receive(buf)?;
        self.last_code = Some(code);
        let buf: &'b [u8] = buf;

        match code {
            ResponseCode::Success => response_text(&buf[..len]),
            ResponseCode::Pending => Err(SensorError::ResponsePending),
            ResponseCode::SyntaxError => {
                log_warn!("EZO rejected the last command");
                Err(SensorError::ReadFailure)
            }
            ResponseCode::NoData | ResponseCode::Unknown(_) => Err(SensorError::ReadFailure),
        }
    }

    /// `R`, wait, then parse one value per slot of `values`
    pub fn read_into(&mut self, values: &mut [f32], clock: &mut dyn Clock) -> SensorResult<()> {
        let read = ProbeCommand::Read.render()?;
        self.send(read.as_str())?;
        clock.delay_ms(self.read_delay_ms);

        let mut buf = [0u8; RESPONSE_BUFFER_LEN];
        let reply = self.receive(&mut buf)?;
        parse_fields(reply, values)
    }
}

/// Parse comma-separated numeric fields into `values`
pub fn parse_fields(reply: &str, values: &mut [f32]) -> SensorResult<()> {
    let mut fields = reply.trim().split(',');
    for slot in values.iter_mut() {
        let field = fields.next().ok_or(SensorError::ReadFailure)?;
        *slot = field.trim().parse::<f32>().map_err(|_| SensorError::ReadFailure)?;
    }
    Ok(())
}

macro_rules! ezo_driver {
    ($(#[$meta:meta])* $name:ident, $kind:expr, $procedure:expr) => {
        $(#[$meta])*
        pub struct $name<T> {
            probe: EzoProbe<T>,
        }

        impl<T: EzoTransport> $name<T> {
            pub fn new(transport: T) -> Self {
                Self { probe: EzoProbe::new(transport) }
            }

            pub fn with_read_delay_ms(mut self, ms: u32) -> Self {
                self.probe = self.probe.with_read_delay_ms(ms);
                self
            }

            pub fn probe(&self) -> &EzoProbe<T> {
                &self.probe
            }

            pub fn probe_mut(&mut self) -> &mut EzoProbe<T> {
                &mut self.probe
            }

            pub fn release(self) -> T {
                self.probe.release()
            }
        }

        impl<T: EzoTransport> SensorDriver for $name<T> {
            fn is_connected(&mut self) -> bool {
                // Presence shows up as a failed read
                true
            }

            fn raw_read(&mut self, values: &mut [f32], clock: &mut dyn Clock) -> SensorResult<()> {
                self.probe.read_into(values, clock)
            }

            fn send_command(&mut self, command: &str) -> SensorResult<()> {
                self.probe.send(command)
            }

            fn receive_response<'b>(&mut self, buf: &'b mut [u8]) -> SensorResult<&'b str> {
                self.probe.receive(buf)
            }

            fn kind(&self) -> DriverKind {
                $kind
            }

            fn calibration_procedure(&self) -> CalibrationProcedure {
                $procedure
            }
        }
    };
}

ezo_driver!(
    /// EZO-DO dissolved oxygen circuit; compensated by temperature and
    /// salinity, calibrated against atmospheric oxygen
    DissolvedOxygenDriver,
    DriverKind::DissolvedOxygen,
    CalibrationProcedure::Atmospheric
);

ezo_driver!(
    /// EZO-EC conductivity circuit
    ConductivityDriver,
    DriverKind::Conductivity,
    CalibrationProcedure::None
);

ezo_driver!(
    /// EZO-RTD temperature circuit
    TemperatureProbeDriver,
    DriverKind::TemperatureProbe,
    CalibrationProcedure::None
);
