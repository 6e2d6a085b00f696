//! Unit tests for error handling and recovery

use crate::common::{
    MockError, Operation, create_enabled_driver, create_initialized_driver, create_mock_driver,
};
use bma250::{Error, LockError, Vector3};

#[test]
fn test_read_error_during_init() {
    let (mut driver, transport) = create_mock_driver();
    transport.fail_next_read();

    assert_eq!(driver.init(), Err(Error::Transport(MockError::Communication)));
    assert!(!driver.is_initialized());
    assert!(!transport.is_open());
    assert!(!transport.is_locked());

    // Recovers on retry
    driver.init().unwrap();
    assert!(driver.is_initialized());
}

#[test]
fn test_write_error_during_init() {
    let (mut driver, transport) = create_mock_driver();
    transport.fail_next_write();

    assert_eq!(driver.init(), Err(Error::Transport(MockError::Communication)));
    assert!(!driver.is_initialized());
    assert!(!transport.is_open());
}

#[test]
fn test_open_error_during_init() {
    let (mut driver, transport) = create_mock_driver();
    transport.fail_open();

    assert_eq!(driver.init(), Err(Error::Transport(MockError::Communication)));
    assert!(!driver.is_initialized());
    assert_eq!(transport.register_access_count(), 0);
    assert!(!transport.is_locked());
}

#[test]
fn test_read_error_during_measure() {
    let (mut driver, transport) = create_enabled_driver();
    transport.set_accel_data(1, 2, 3);
    driver.measure().unwrap();
    driver.take_report().unwrap();

    transport.fail_next_read();
    assert_eq!(
        driver.measure(),
        Err(Error::Transport(MockError::Communication))
    );

    assert!(!transport.is_locked());
    assert!(driver.take_report().unwrap().is_empty());
    assert_eq!(
        driver.last_sample().unwrap().map(|s| s.raw),
        Some(Vector3::new(1, 2, 3))
    );
}

#[test]
fn test_write_error_leaves_state_unchanged() {
    let (mut driver, transport) = create_enabled_driver();

    transport.fail_next_write();
    assert!(driver.set_delay(20).is_err());
    assert_eq!(driver.delay(), Ok(100));

    transport.fail_next_write();
    assert!(driver.set_enable(false).is_err());
    assert_eq!(driver.enabled(), Ok(true));
    assert!(!transport.is_locked());
}

#[test]
fn test_busy_lock() {
    let (mut driver, transport) = create_enabled_driver();
    transport.clear_operations();
    transport.set_lock_result(Err(LockError::Busy));

    assert_eq!(driver.measure(), Err(Error::Busy));
    assert_eq!(driver.set_enable(false), Err(Error::Busy));
    assert_eq!(driver.set_delay(20), Err(Error::Busy));
    assert_eq!(driver.read_register(0x00), Err(Error::Busy));
    assert_eq!(driver.set_offset(Vector3::new(1, 1, 1)), Err(Error::Busy));
    assert_eq!(driver.term(), Err(Error::Busy));

    assert_eq!(transport.register_access_count(), 0);
    assert!(driver.is_initialized());
    assert_eq!(driver.enabled(), Ok(true));
    assert_eq!(driver.delay(), Ok(100));
    assert_eq!(driver.offset(), Err(Error::HardOffsetNotWritten));

    transport.set_lock_result(Ok(()));
    assert!(driver.measure().is_ok());
}

#[test]
fn test_interrupted_lock() {
    let (mut driver, transport) = create_mock_driver();
    transport.set_lock_result(Err(LockError::Interrupted));

    assert_eq!(driver.init(), Err(Error::Interrupted));
    assert!(transport.operations().is_empty());
    assert!(!driver.is_initialized());
}

#[test]
fn test_lock_released_after_every_failure() {
    let (mut driver, transport) = create_initialized_driver();
    driver.set_enable(true).unwrap();

    transport.fail_next_read();
    let _ = driver.measure();
    transport.fail_next_read();
    let _ = driver.read_register(0x00);
    transport.fail_next_write();
    let _ = driver.set_enable(false);

    let operations = transport.operations();
    let locks = operations.iter().filter(|op| **op == Operation::Lock).count();
    let unlocks = operations.iter().filter(|op| **op == Operation::Unlock).count();
    assert_eq!(locks, unlocks);
    assert!(!transport.is_locked());
}

#[test]
fn test_read_register() {
    let (mut driver, transport) = create_initialized_driver();
    transport.set_register(0x0F, 0x05);

    assert_eq!(driver.read_register(0x00), Ok(bma250::CHIP_ID));
    assert_eq!(driver.read_register(0x0F), Ok(0x05));
    assert!(!transport.unlocked_access());
}

#[test]
fn test_error_codes() {
    assert_eq!(Error::<MockError>::InvalidArgument.code(), -1);
    assert_eq!(Error::<MockError>::NotInitialized.code(), -2);
    assert_eq!(Error::<MockError>::Busy.code(), -3);
    assert_eq!(Error::Transport(MockError::Communication).code(), -4);
    assert_eq!(Error::<MockError>::ChipIdMismatch(0).code(), -5);
    assert_eq!(Error::<MockError>::NotActive.code(), -6);
    assert_eq!(Error::<MockError>::Interrupted.code(), -7);
    assert_eq!(Error::<MockError>::HardOffsetNotWritten.code(), -8);
    assert_eq!(Error::<MockError>::AlreadyActive.code(), -9);
    assert_eq!(Error::<MockError>::Internal.code(), -128);
}

#[test]
fn test_status_of_driver_results() {
    let (mut driver, _transport) = create_mock_driver();

    assert_eq!(bma250::status(&driver.measure()), -2);
    assert_eq!(bma250::status(&driver.init()), 0);
    assert_eq!(bma250::status(&driver.measure()), -6);
    assert_eq!(bma250::status(&driver.set_position(9)), -1);
}
