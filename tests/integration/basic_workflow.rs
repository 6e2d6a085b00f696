//! Integration tests: driver and calibration engine working together

use crate::common::test_utils::{um_s2, um_s2_vector};
use crate::common::{MockTransport, Operation, create_mock_driver};
use bma250::calibration::WINDOW_LEN;
use bma250::{Calibration, LockError, NoLock, RawLock, Report, Vector3};
use std::cell::Cell;

#[test]
fn test_startup_and_first_sample() {
    let (mut driver, transport) = create_mock_driver();
    transport.set_accel_data(3, -5, 250);

    driver.init().unwrap();
    driver.set_delay(20).unwrap();
    driver.set_enable(true).unwrap();

    let sample = driver.measure().unwrap();

    assert_eq!(sample.raw, Vector3::new(3, -5, 250));
    assert_eq!(sample.xyz, um_s2_vector(sample.raw));
    assert!(driver.take_report().unwrap().contains(Report::DATA));
    assert_eq!(transport.last_write(0x10), Some(0x0A));
    assert!(!transport.unlocked_access());
}

#[test]
fn test_calibration_fed_from_driver() {
    let (mut driver, transport) = create_mock_driver();
    let calibration = Calibration::new(NoLock::new());
    transport.set_accel_sequence(vec![[4, -2, 256], [5, -2, 257], [4, -3, 256], [5, -3, 255]]);

    driver.init().unwrap();
    driver.set_delay(10).unwrap();
    driver.set_enable(true).unwrap();
    calibration.init().unwrap();

    for _ in 0..4 * WINDOW_LEN {
        let sample = driver.measure().unwrap();
        if driver.take_report().unwrap().contains(Report::DATA) {
            calibration.update(&sample.xyz).unwrap();
        }
    }

    let offset = calibration.offset().unwrap().expect("device was stationary");
    assert!((offset.x - (um_s2(4) + um_s2(5)) / 2).abs() <= 1);
    assert!((offset.z - um_s2(256)).abs() <= um_s2(1));
    assert!(calibration
        .take_report()
        .unwrap()
        .contains(Report::CALIB_OFFSET_CHANGED));

    driver.term().unwrap();
    calibration.term().unwrap();
    assert!(!transport.is_open());
}

/// Calibration lock that checks the bus lock is free whenever it is taken
struct BusFreeProbe {
    transport: MockTransport,
    taken: Cell<usize>,
}

// SAFETY: single-threaded test lock; the calibration engine never re-enters it.
unsafe impl RawLock for BusFreeProbe {
    fn lock(&self) -> Result<(), LockError> {
        assert!(!self.transport.is_locked(), "bus lock held during calibration");
        self.taken.set(self.taken.get() + 1);
        Ok(())
    }

    fn unlock(&self) {}
}

#[test]
fn test_locks_are_never_nested() {
    let (mut driver, transport) = create_mock_driver();
    let probe = BusFreeProbe {
        transport: transport.clone(),
        taken: Cell::new(0),
    };
    let calibration = Calibration::new(&probe);
    transport.set_accel_data(0, 0, 256);

    driver.init().unwrap();
    driver.set_enable(true).unwrap();
    calibration.init().unwrap();

    for _ in 0..WINDOW_LEN {
        let sample = driver.measure().unwrap();
        calibration.update(&sample.xyz).unwrap();
    }

    assert!(probe.taken.get() > WINDOW_LEN);
    assert_eq!(calibration.offset(), Ok(Some(Vector3::new(0, 0, 9_806_650))));
}

#[test]
fn test_full_session_transcript() {
    let (mut driver, transport) = create_mock_driver();
    transport.set_accel_data(1, 1, 256);

    driver.init().unwrap();
    driver.set_enable(true).unwrap();
    driver.measure().unwrap();
    driver.set_enable(false).unwrap();
    driver.term().unwrap();

    let operations = transport.operations();
    assert_eq!(operations.first(), Some(&Operation::Lock));
    assert_eq!(operations.last(), Some(&Operation::Unlock));
    assert!(operations.contains(&Operation::Open));
    assert!(operations.contains(&Operation::Close));

    // Every register access sits between a lock and its unlock
    let mut held = false;
    for op in &operations {
        match op {
            Operation::Lock => {
                assert!(!held);
                held = true;
            }
            Operation::Unlock => {
                assert!(held);
                held = false;
            }
            Operation::Read { .. } | Operation::Write { .. } | Operation::Sleep { .. } => {
                assert!(held, "{op:?} outside the bus lock");
            }
            Operation::Open | Operation::Close => {}
        }
    }
    assert!(!held);
    assert!(!transport.unlocked_access());
}
