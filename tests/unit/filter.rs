//! Unit tests for the software change filter

use crate::common::create_enabled_driver;
use bma250::{Filter, Report, Vector3};

#[test]
fn test_small_change_is_withheld() {
    let (mut driver, transport) = create_enabled_driver();
    driver.set_filter(Filter { threshold: 50 }).unwrap();
    driver.set_filter_enable(true).unwrap();

    transport.set_accel_data(0, 0, 256);
    driver.measure().unwrap();
    assert!(driver.take_report().unwrap().contains(Report::DATA));

    transport.set_accel_data(10, 0, 256);
    let sample = driver.measure().unwrap();
    assert!(!driver.take_report().unwrap().contains(Report::DATA));

    // The withheld sample is still the latest one
    assert_eq!(sample.raw, Vector3::new(10, 0, 256));
    assert_eq!(driver.last_sample().unwrap().map(|s| s.raw), Some(sample.raw));
}

#[test]
fn test_change_at_threshold_is_reported() {
    let (mut driver, transport) = create_enabled_driver();
    driver.set_filter(Filter { threshold: 50 }).unwrap();
    driver.set_filter_enable(true).unwrap();

    transport.set_accel_data(0, 0, 256);
    driver.measure().unwrap();
    driver.take_report().unwrap();

    transport.set_accel_data(0, -50, 256);
    driver.measure().unwrap();
    assert!(driver.take_report().unwrap().contains(Report::DATA));
}

#[test]
fn test_disabled_filter_reports_everything() {
    let (mut driver, transport) = create_enabled_driver();
    driver.set_filter(Filter { threshold: 50 }).unwrap();
    transport.set_accel_data(0, 0, 256);

    for _ in 0..3 {
        driver.measure().unwrap();
        assert_eq!(driver.take_report(), Ok(Report::DATA));
    }
}

#[test]
fn test_zero_threshold_reports_everything() {
    let (mut driver, transport) = create_enabled_driver();
    driver.set_filter(Filter { threshold: 0 }).unwrap();
    driver.set_filter_enable(true).unwrap();
    transport.set_accel_data(7, 7, 7);

    for _ in 0..3 {
        driver.measure().unwrap();
        assert_eq!(driver.take_report(), Ok(Report::DATA));
    }
}

#[test]
fn test_reenable_reports_first_sample() {
    let (mut driver, transport) = create_enabled_driver();
    driver.set_filter(Filter { threshold: 50 }).unwrap();
    driver.set_filter_enable(true).unwrap();
    transport.set_accel_data(0, 0, 256);
    driver.measure().unwrap();
    driver.take_report().unwrap();

    driver.set_enable(false).unwrap();
    driver.set_enable(true).unwrap();

    driver.measure().unwrap();
    assert!(driver.take_report().unwrap().contains(Report::DATA));
}

#[test]
fn test_filter_compares_oriented_counts() {
    let (mut driver, transport) = create_enabled_driver();
    driver.set_filter(Filter { threshold: 50 }).unwrap();
    driver.set_filter_enable(true).unwrap();
    driver.set_position(0).unwrap();

    transport.set_accel_data(0, 0, 256);
    driver.measure().unwrap();
    driver.take_report().unwrap();

    transport.set_accel_data(49, 49, 256 + 49);
    driver.measure().unwrap();
    assert!(!driver.take_report().unwrap().contains(Report::DATA));

    transport.set_accel_data(60, 0, 256);
    driver.measure().unwrap();
    assert!(driver.take_report().unwrap().contains(Report::DATA));
}
