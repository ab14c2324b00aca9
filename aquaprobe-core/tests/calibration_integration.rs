//! Integration tests for operator-triggered calibration

#![cfg(test)]

mod common;

use aquaprobe_core::{
    CalibrationConfig, LifecycleState, SensorController, SensorError, SimulatedClock, Status,
};

use common::{oxygen_config, ScriptedDriver, TriggerPin};

fn quiet() -> CalibrationConfig {
    CalibrationConfig::default().without_live_sampling()
}

#[test]
fn confirmed_calibration_succeeds() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric().with_reply("?CAL,1");
    let sent = driver.transcript();
    let mut sensor = SensorController::new(oxygen_config(), driver)
        .unwrap()
        .with_calibration_config(quiet());
    let mut trigger = TriggerPin::scripted(&[false, false, false, true]);
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.calibrate(&mut trigger, &mut clock), Ok(()));

    assert_eq!(*sent.borrow(), vec!["Cal,clear", "Cal", "Cal,?"]);
    assert_eq!(sensor.record().status(0), Status::Success);
    assert_eq!(sensor.state(), LifecycleState::Ready);
    assert!(!sensor.is_calibrating());
    // Two unchanged polls, then the settle after `Cal` and after `Cal,?`
    assert_eq!(clock.waits(), &[1000, 1000, 1000, 1000]);
}

#[test]
fn missing_marker_is_a_mismatch() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric().with_reply("?CAL,0");
    let mut sensor = SensorController::new(oxygen_config(), driver)
        .unwrap()
        .with_calibration_config(quiet());
    let mut trigger = TriggerPin::scripted(&[true, false]);
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.calibrate(&mut trigger, &mut clock), Err(SensorError::CalibrationMismatch));

    assert_eq!(sensor.record().status(0), Status::Fail);
    assert_eq!(sensor.state(), LifecycleState::Failed);
    assert!(!sensor.is_calibrating());
    assert!(sensor.reporter().contains("?CAL,0"));
    assert!(sensor.reporter().contains("CAL,1"));
}

#[test]
fn step_function_blocks_until_trigger_changes() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric().with_reply("?CAL,1");
    let mut sensor = SensorController::new(oxygen_config(), driver).unwrap();
    let mut trigger = TriggerPin::scripted(&[false, false, false, true]);
    let mut clock = SimulatedClock::default();

    sensor.begin_calibration(&mut trigger, &mut clock).unwrap();
    assert_eq!(sensor.state(), LifecycleState::Calibrating);

    assert_eq!(sensor.poll_calibration(&mut trigger, &mut clock), Err(nb::Error::WouldBlock));
    assert_eq!(sensor.poll_calibration(&mut trigger, &mut clock), Err(nb::Error::WouldBlock));
    assert!(sensor.is_calibrating());
    // Live value sampled on each unchanged poll
    assert_eq!(sensor.driver().reads, 2);

    assert_eq!(sensor.poll_calibration(&mut trigger, &mut clock), Ok(()));
    assert_eq!(sensor.record().status(0), Status::Success);
}

#[test]
fn trigger_timeout_is_bounded() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric();
    let sent = driver.transcript();
    let config = quiet().with_max_wait_ms(5000).with_poll_interval_ms(1000);
    let mut sensor = SensorController::new(oxygen_config(), driver)
        .unwrap()
        .with_calibration_config(config);
    let mut trigger = TriggerPin::stuck(false);
    let mut clock = SimulatedClock::default();

    let result = sensor.calibrate(&mut trigger, &mut clock);

    assert_eq!(result, Err(SensorError::CalibrationTimeout { waited_ms: 5000 }));
    assert_eq!(trigger.samples, 7);
    assert_eq!(*sent.borrow(), vec!["Cal,clear"]);
    assert_eq!(sensor.record().status(0), Status::Fail);
    assert!(!sensor.is_calibrating());
}

#[test]
fn zero_poll_interval_still_times_out() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric();
    let mut config = quiet().with_max_wait_ms(50);
    config.poll_interval_ms = 0;
    let mut sensor = SensorController::new(oxygen_config(), driver)
        .unwrap()
        .with_calibration_config(config);
    let mut trigger = TriggerPin::stuck(false);
    let mut clock = SimulatedClock::default();

    let result = sensor.calibrate(&mut trigger, &mut clock);

    // Each poll is charged 1 ms although the clock never moves
    assert_eq!(result, Err(SensorError::CalibrationTimeout { waited_ms: 50 }));
    assert_eq!(trigger.samples, 52);
    assert_eq!(clock.total_waited_ms(), 0);
    assert!(!sensor.is_calibrating());
}

#[test]
fn failed_calibration_command_is_reported() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric().failing_command("Cal,?");
    let sent = driver.transcript();
    let mut sensor = SensorController::new(oxygen_config(), driver)
        .unwrap()
        .with_calibration_config(quiet());
    let mut trigger = TriggerPin::scripted(&[false, true]);
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.calibrate(&mut trigger, &mut clock), Err(SensorError::ConnectionLost));

    assert_eq!(*sent.borrow(), vec!["Cal,clear", "Cal", "Cal,?"]);
    assert_eq!(sensor.record().status(0), Status::Fail);
    assert!(sensor.reporter().contains("Cal,?"));
}

#[test]
fn sensors_without_procedure_always_succeed() {
    let driver = ScriptedDriver::constant(&[21.0]);
    let sent = driver.transcript();
    let mut sensor = SensorController::new(oxygen_config(), driver).unwrap();
    let mut trigger = TriggerPin::stuck(false);
    let mut clock = SimulatedClock::default();

    assert_eq!(sensor.calibrate(&mut trigger, &mut clock), Ok(()));

    assert!(sent.borrow().is_empty());
    assert_eq!(trigger.samples, 0);
    assert_eq!(sensor.record().status(0), Status::Success);
    assert!(clock.waits().is_empty());
}

#[test]
fn polling_without_session_is_an_error() {
    let driver = ScriptedDriver::constant(&[8.2]).atmospheric();
    let mut sensor = SensorController::new(oxygen_config(), driver).unwrap();
    let mut trigger = TriggerPin::stuck(false);
    let mut clock = SimulatedClock::default();

    assert_eq!(
        sensor.poll_calibration(&mut trigger, &mut clock),
        Err(nb::Error::Other(SensorError::CalibrationNotStarted))
    );
}
