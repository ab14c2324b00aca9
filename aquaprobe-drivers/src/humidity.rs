//! SHT3x temperature and relative humidity sensor

use aquaprobe_core::{Clock, DriverKind, SensorDriver, SensorError, SensorResult};
use embedded_hal::i2c::I2c;

/// Default bus address (ADDR pin low)
pub const SHT31_ADDRESS: u8 = 0x44;

/// Single shot, high repeatability, no clock stretching
const MEASURE_HIGH_REPEATABILITY: [u8; 2] = [0x24, 0x00];

const READ_STATUS: [u8; 2] = [0xF3, 0x2D];

/// Worst-case conversion time for a high repeatability measurement
pub const MEASURE_DELAY_MS: u32 = 16;

/// One combined measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Degrees Celsius
    pub temperature: f32,
    /// Percent relative humidity
    pub humidity: f32,
}

/// Access to a temperature/humidity sensor
pub trait HumidityTempTransport {
    fn is_present(&mut self) -> bool;

    fn measure(&mut self, clock: &mut dyn Clock) -> SensorResult<Measurement>;
}

/// CRC-8 used by Sensirion sensors (poly 0x31, init 0xFF)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0xFFu8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x31 } else { crc << 1 };
        }
    }
    crc
}

fn checked_word(chunk: &[u8]) -> SensorResult<u16> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::ReadFailure);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

/// Convert raw words to engineering units
pub fn convert(raw_temperature: u16, raw_humidity: u16) -> Measurement {
    Measurement {
        temperature: -45.0 + 175.0 * raw_temperature as f32 / 65535.0,
        humidity: 100.0 * raw_humidity as f32 / 65535.0,
    }
}

/// SHT3x over I2C
pub struct Sht31Transport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Sht31Transport<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, address: SHT31_ADDRESS }
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> HumidityTempTransport for Sht31Transport<I2C> {
    fn is_present(&mut self) -> bool {
        let mut status = [0u8; 3];
        self.i2c
            .write_read(self.address, &READ_STATUS, &mut status)
            .map(|_| crc8(&status[..2]) == status[2])
            .unwrap_or(false)
    }

    fn measure(&mut self, clock: &mut dyn Clock) -> SensorResult<Measurement> {
        self.i2c
            .write(self.address, &MEASURE_HIGH_REPEATABILITY)
            .map_err(|_| SensorError::ReadFailure)?;
        clock.delay_ms(MEASURE_DELAY_MS);

        let mut raw = [0u8; 6];
        self.i2c
            .read(self.address, &mut raw)
            .map_err(|_| SensorError::ReadFailure)?;

        let temperature = checked_word(&raw[..3])?;
        let humidity = checked_word(&raw[3..])?;
        Ok(convert(temperature, humidity))
    }
}

/// Two-channel driver: channel 0 temperature, channel 1 humidity
pub struct HumidityTempDriver<T> {
    transport: T,
}

impl<T: HumidityTempTransport> HumidityTempDriver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn release(self) -> T {
        self.transport
    }
}

impl<T: HumidityTempTransport> SensorDriver for HumidityTempDriver<T> {
    fn is_connected(&mut self) -> bool {
        self.transport.is_present()
    }

    fn raw_read(&mut self, values: &mut [f32], clock: &mut dyn Clock) -> SensorResult<()> {
        if !self.transport.is_present() {
            return Err(SensorError::ReadFailure);
        }
        let measurement = self.transport.measure(clock)?;
        for (slot, value) in values.iter_mut().zip([measurement.temperature, measurement.humidity]) {
            *slot = value;
        }
        Ok(())
    }

    fn send_command(&mut self, _command: &str) -> SensorResult<()> {
        Err(SensorError::Unsupported)
    }

    fn receive_response<'b>(&mut self, _buf: &'b mut [u8]) -> SensorResult<&'b str> {
        Err(SensorError::Unsupported)
    }

    fn kind(&self) -> DriverKind {
        DriverKind::HumidityTemperature
    }
}
