use cascade_logger::clock::{hour_bucket, hour_stamp, Clock, ManualClock, SystemClock};
use chrono::{Local, TimeZone};
use std::thread;
use std::time::Duration;

#[test]
fn test_system_clock_monotonic_enough() {
    let clock = SystemClock;
    let mut prev = clock.now();
    for _ in 0..1000 {
        let current = clock.now();
        assert!(current >= prev, "Wall clock should not run backwards during a test");
        prev = current;
    }
}

#[test]
fn test_system_clock_advances() {
    let clock = SystemClock;
    let first = clock.now();
    thread::sleep(Duration::from_millis(2));
    assert!(clock.now() > first, "Subsequent readings should be later");
}

#[test]
fn test_manual_clock_moves_only_when_told() {
    let start = Local.with_ymd_and_hms(2021, 3, 7, 23, 59, 59).unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);
    assert_eq!(clock.now(), start, "Reading the clock must not move it");

    clock.advance(Duration::from_secs(1));
    assert_eq!(hour_stamp(&clock.now()), "2021030800");
    assert_eq!(hour_bucket(&clock.now()), hour_bucket(&start) + 1);

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn test_hour_bucket_is_shared_within_the_hour() {
    let top = Local.with_ymd_and_hms(2021, 3, 7, 9, 0, 0).unwrap();
    let bottom = Local.with_ymd_and_hms(2021, 3, 7, 9, 59, 59).unwrap();
    assert_eq!(hour_bucket(&top), hour_bucket(&bottom));
    assert_eq!(hour_stamp(&top), hour_stamp(&bottom));
}

#[test]
fn test_clock_is_object_safe() {
    let clocks: Vec<Box<dyn Clock>> = vec![Box::new(SystemClock), Box::new(ManualClock::new(Local::now()))];
    for clock in &clocks {
        let _ = hour_stamp(&clock.now());
    }
}
