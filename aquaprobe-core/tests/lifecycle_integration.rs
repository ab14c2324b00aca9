//! Integration tests for the sensor lifecycle
//!
//! Covers:
//! - enable: power, settle, wake, one sample, broadcast status
//! - disable: inverted confirmation
//! - read: stabilization wait, per-channel outcomes, last known good values

#![cfg(test)]

mod common;

use aquaprobe_core::{
    ChannelConfig, LifecycleState, PowerConfig, SensorConfig, SensorController, SensorError,
    SimulatedClock, Status, TimeSource,
};

use common::{humidity_config, rail, RecordingPin, ScriptedDriver};

#[test]
fn enable_formats_and_broadcasts_success() {
    let power = rail(false);
    let pin = RecordingPin::new(&power);
    let levels = pin.levels.clone();
    let driver = ScriptedDriver::constant(&[7.5, 40.0]).powered_by(&power);

    let mut sensor = SensorController::with_power_pin(humidity_config(500), driver, pin).unwrap();
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.enable(&mut clock), Ok(()));

    assert_eq!(sensor.record().value(0), 7.5);
    assert_eq!(format!("{:.2}", sensor.record().value(0)), "7.50");
    assert_eq!(sensor.record().statuses(), &[Status::Success, Status::Success]);
    assert_eq!(sensor.state(), LifecycleState::Ready);
    assert_eq!(*levels.borrow(), vec![true]);
    assert_eq!(sensor.driver().wakes, 1);
    // Settle only: a single reading has no inter-sample delay
    assert_eq!(clock.waits(), &[500]);
    assert_eq!(sensor.powered_at(), Some(500));
}

#[test]
fn enable_respects_active_low_polarity() {
    let power = rail(false);
    let pin = RecordingPin::active_low(&power);
    let levels = pin.levels.clone();
    let config = SensorConfig::new()
        .with_channel(ChannelConfig::new("PM2_5", "ug/m3").with_decimals(0).with_range(0.0, 1_000_000.0))
        .with_power(PowerConfig::active_low(7).with_settle_delay_ms(100));
    let driver = ScriptedDriver::constant(&[12.0]).powered_by(&power);

    let mut sensor = SensorController::with_power_pin(config, driver, pin).unwrap();
    let mut clock = SimulatedClock::default();

    assert!(sensor.enable(&mut clock).is_ok());
    assert_eq!(*levels.borrow(), vec![false]);
    assert!(power.get());
}

#[test]
fn enable_failure_broadcasts_fail_and_keeps_values() {
    let power = rail(false);
    let pin = RecordingPin::new(&power);
    // Out of range temperature fails the whole enable
    let driver = ScriptedDriver::constant(&[99.0, 40.0]).powered_by(&power);

    let mut sensor = SensorController::with_power_pin(humidity_config(0), driver, pin).unwrap();
    let mut clock = SimulatedClock::default();

    let result = sensor.enable(&mut clock);

    assert!(matches!(result, Err(SensorError::RangeViolation { channel: 0, .. })));
    assert_eq!(sensor.record().statuses(), &[Status::Fail, Status::Fail]);
    assert_eq!(sensor.record().values(), &[0.0, 0.0]);
    assert_eq!(sensor.state(), LifecycleState::Failed);
}

#[test]
fn disable_succeeds_when_sensor_goes_silent() {
    let power = rail(false);
    let pin = RecordingPin::new(&power);
    let levels = pin.levels.clone();
    let driver = ScriptedDriver::constant(&[21.0, 40.0]).powered_by(&power);

    let mut sensor = SensorController::with_power_pin(humidity_config(500), driver, pin).unwrap();
    let mut clock = SimulatedClock::default();

    sensor.enable(&mut clock).unwrap();
    assert_eq!(sensor.disable(&mut clock), Ok(()));

    assert_eq!(*levels.borrow(), vec![true, false]);
    assert_eq!(sensor.record().statuses(), &[Status::Success, Status::Success]);
    assert_eq!(sensor.state(), LifecycleState::Disabled);
    assert_eq!(sensor.powered_at(), None);
    // Values from enable are untouched
    assert_eq!(sensor.record().values(), &[21.0, 40.0]);
    assert!(sensor.reporter().is_empty());
}

#[test]
fn disable_fails_when_sensor_keeps_answering() {
    let config = SensorConfig::new().with_channel(ChannelConfig::new("TEMPERATURE", "C"));
    let mut sensor = SensorController::new(config, ScriptedDriver::constant(&[21.0])).unwrap();
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.disable(&mut clock), Err(SensorError::StillResponding));
    assert_eq!(sensor.record().status(0), Status::Fail);
    assert_eq!(sensor.state(), LifecycleState::Failed);
    assert!(sensor.reporter().contains("still responding"));
}

#[test]
fn read_waits_out_stabilization() {
    let power = rail(false);
    let pin = RecordingPin::new(&power);
    let config = SensorConfig::new()
        .with_channel(
            ChannelConfig::new("DISSOLVED_OXYGEN", "mg/L")
                .with_decimals(3)
                .with_range(0.01, 100.0)
                .with_stabilize_delay_ms(30_000),
        )
        .with_power(PowerConfig::active_high(13).with_settle_delay_ms(2000))
        .with_averaging(5, 1000);
    let driver = ScriptedDriver::constant(&[8.25]).powered_by(&power);

    let mut sensor = SensorController::with_power_pin(config, driver, pin).unwrap();
    let mut clock = SimulatedClock::default();

    sensor.enable(&mut clock).unwrap();
    clock.advance(10_000);
    clock.clear();

    assert_eq!(sensor.read(&mut clock), Ok(()));
    assert_eq!(clock.waits(), &[20_000, 1000, 1000, 1000, 1000]);
    assert_eq!(sensor.record().value(0), 8.25);

    // Already stable: the next read only waits between samples
    clock.clear();
    sensor.read(&mut clock).unwrap();
    assert_eq!(clock.waits(), &[1000, 1000, 1000, 1000]);
    assert_eq!(clock.now(), 2000 + 10_000 + 24_000 + 4000);
}

#[test]
fn out_of_range_channel_fails_alone() {
    let config = SensorConfig::new()
        .with_channel(ChannelConfig::new("PM1_0", "ug/m3").with_range(0.0, 100.0))
        .with_channel(ChannelConfig::new("PM2_5", "ug/m3").with_range(0.0, 100.0))
        .with_channel(ChannelConfig::new("PM10_0", "ug/m3").with_range(0.0, 100.0))
        .with_averaging(2, 0);
    let mut sensor = SensorController::new(config, ScriptedDriver::constant(&[5.0, 250.0, 9.0])).unwrap();
    let mut clock = SimulatedClock::default();

    let result = sensor.read(&mut clock);

    assert!(matches!(result, Err(SensorError::RangeViolation { channel: 1, .. })));
    assert_eq!(sensor.record().statuses(), &[Status::Success, Status::Fail, Status::Success]);
    assert_eq!(sensor.record().values(), &[5.0, 0.0, 9.0]);
    assert_eq!(sensor.reporter().for_channel(1).count(), 1);
    assert_eq!(sensor.reporter().len(), 1);
}

#[test]
fn failed_read_keeps_last_known_good_value() {
    let config = SensorConfig::new()
        .with_channel(ChannelConfig::new("TEMPERATURE", "C"))
        .with_averaging(3, 10);
    // Reads 0..3 succeed, read 4 (second sample of the second cycle) fails
    let driver = ScriptedDriver::constant(&[18.5]).failing_read(4);
    let mut sensor = SensorController::new(config, driver).unwrap();
    let mut clock = SimulatedClock::default();

    sensor.read(&mut clock).unwrap();
    assert_eq!(sensor.read(&mut clock), Err(SensorError::ReadFailure));

    assert_eq!(sensor.record().value(0), 18.5);
    assert_eq!(sensor.record().status(0), Status::Fail);
    assert_eq!(sensor.state(), LifecycleState::Failed);
}

#[test]
fn disconnected_driver_fails_every_channel() {
    let driver = ScriptedDriver::constant(&[1.0, 2.0]).disconnected();
    let mut sensor = SensorController::new(humidity_config(0), driver).unwrap();
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.read(&mut clock), Err(SensorError::ConnectionLost));
    assert_eq!(sensor.record().statuses(), &[Status::Fail, Status::Fail]);
    assert_eq!(sensor.driver().reads, 0);
    assert!(clock.waits().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let result = SensorController::new(SensorConfig::new(), ScriptedDriver::constant(&[]));
    assert!(matches!(result, Err(SensorError::InvalidConfig { .. })));
}
