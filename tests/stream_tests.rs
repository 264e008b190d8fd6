use cascade_logger::clock::{hour_stamp, Clock, ManualClock};
use cascade_logger::stream_set::{file_name, link_name, StreamSet};
use cascade_logger::{Level, LevelGate};
use chrono::{Local, TimeZone};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const NAME: &str = "svc";

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Local.with_ymd_and_hms(2021, 3, 7, 9, 30, 0).unwrap()))
}

fn read(dir: &Path, stamp: &str, index: u32, level: Level) -> String {
    fs::read_to_string(dir.join(file_name(NAME, stamp, index, level))).unwrap_or_default()
}

#[test]
fn test_cascade_into_lower_levels() {
    let tmp = TempDir::new().unwrap();
    let clock = clock();
    let stamp = hour_stamp(&clock.now());
    let mut set = StreamSet::open_dir(tmp.path(), NAME, LevelGate::new(Level::Info, false), 1 << 30, clock);

    set.write(Level::Error, b"boom\n").unwrap();
    set.write(Level::Info, b"hello\n").unwrap();
    set.write(Level::Debug, b"hidden\n").unwrap();
    set.close();

    assert_eq!(read(tmp.path(), &stamp, 0, Level::Info), "boom\nhello\n");
    assert_eq!(read(tmp.path(), &stamp, 0, Level::Warn), "boom\n");
    assert_eq!(read(tmp.path(), &stamp, 0, Level::Error), "boom\n");
    assert!(
        !tmp.path().join(file_name(NAME, &stamp, 0, Level::Debug)).exists(),
        "Disabled DEBUG stream must never create a file"
    );
}

#[test]
fn test_debug_flag_enables_debug_file() {
    let tmp = TempDir::new().unwrap();
    let clock = clock();
    let stamp = hour_stamp(&clock.now());
    let mut set = StreamSet::open_dir(tmp.path(), NAME, LevelGate::new(Level::Warn, true), 1 << 30, clock);

    set.write(Level::Warn, b"w\n").unwrap();
    set.write(Level::Debug, b"d\n").unwrap();
    set.close();

    assert_eq!(read(tmp.path(), &stamp, 0, Level::Debug), "w\nd\n");
    assert_eq!(read(tmp.path(), &stamp, 0, Level::Warn), "w\n");
    assert!(!tmp.path().join(file_name(NAME, &stamp, 0, Level::Info)).exists());
}

#[test]
fn test_size_rotation_moves_to_next_index() {
    let tmp = TempDir::new().unwrap();
    let clock = clock();
    let stamp = hour_stamp(&clock.now());
    let mut set = StreamSet::open_dir(tmp.path(), NAME, LevelGate::new(Level::Error, false), 10, clock);

    set.write(Level::Error, b"first line\n").unwrap();
    set.write(Level::Error, b"second\n").unwrap();
    set.write(Level::Error, b"third\n").unwrap();
    assert_eq!(set.stream(Level::Error).index(), 1);
    set.flush();

    assert_eq!(read(tmp.path(), &stamp, 0, Level::Error), "first line\n");
    assert_eq!(read(tmp.path(), &stamp, 1, Level::Error), "second\nthird\n");

    #[cfg(unix)]
    {
        let target = fs::read_link(tmp.path().join(link_name(NAME, Level::Error))).unwrap();
        assert_eq!(target, Path::new(&file_name(NAME, &stamp, 1, Level::Error)), "Symlink follows the newest file");
    }
}

#[test]
fn test_hour_rotation_resets_index() {
    let tmp = TempDir::new().unwrap();
    let clock = clock();
    let first = hour_stamp(&clock.now());
    let mut set = StreamSet::open_dir(
        tmp.path(),
        NAME,
        LevelGate::new(Level::Error, false),
        10,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );

    set.write(Level::Error, b"0123456789\n").unwrap();
    set.write(Level::Error, b"a\n").unwrap();
    assert_eq!(set.stream(Level::Error).index(), 1);

    clock.advance(Duration::from_secs(3600));
    let second = hour_stamp(&clock.now());
    set.write(Level::Error, b"b\n").unwrap();
    assert_eq!(set.stream(Level::Error).index(), 0, "Hour rotation starts over at index 0");
    set.close();

    assert_eq!(read(tmp.path(), &first, 1, Level::Error), "a\n");
    assert_eq!(read(tmp.path(), &second, 0, Level::Error), "b\n");
}

#[test]
fn test_restart_appends_to_newest_file() {
    let tmp = TempDir::new().unwrap();
    let clock = clock();
    let stamp = hour_stamp(&clock.now());
    fs::write(tmp.path().join(file_name(NAME, &stamp, 2, Level::Info)), "two\n").unwrap();
    fs::write(tmp.path().join(file_name(NAME, &stamp, 3, Level::Info)), "three\n").unwrap();
    fs::write(tmp.path().join(file_name(NAME, "2021030708", 7, Level::Info)), "old hour\n").unwrap();
    fs::write(tmp.path().join(file_name("other", &stamp, 9, Level::Info)), "other app\n").unwrap();
    fs::write(tmp.path().join("svc.notes.txt"), "noise").unwrap();

    let mut set = StreamSet::open_dir(tmp.path(), NAME, LevelGate::new(Level::Info, false), 1 << 30, clock);
    assert_eq!(set.stream(Level::Info).index(), 3);
    assert_eq!(set.stream(Level::Info).written(), 6, "Recovered size comes from the file on disk");
    assert_eq!(set.stream(Level::Warn).index(), 0);

    set.write(Level::Info, b"four\n").unwrap();
    set.close();
    assert_eq!(read(tmp.path(), &stamp, 3, Level::Info), "three\nfour\n");
    assert_eq!(read(tmp.path(), &stamp, 2, Level::Info), "two\n");
}

#[test]
fn test_creates_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("nested").join("logs");
    let clock = clock();
    let stamp = hour_stamp(&clock.now());
    let mut set = StreamSet::open_dir(&dir, NAME, LevelGate::default(), 1 << 30, clock);
    set.write(Level::Info, b"x\n").unwrap();
    set.close();
    assert_eq!(read(&dir, &stamp, 0, Level::Info), "x\n");
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_console_mode_writes_once() {
    let out = Capture::default();
    let err = Capture::default();
    let (o, e) = (out.clone(), err.clone());
    let mut set = StreamSet::console_with(LevelGate::new(Level::Info, false), clock(), move |level| {
        if level == Level::Error {
            Box::new(e.clone()) as Box<dyn Write + Send>
        } else {
            Box::new(o.clone())
        }
    });
    assert!(set.is_console());

    set.write(Level::Error, b"E\n").unwrap();
    set.write(Level::Warn, b"W\n").unwrap();
    set.write(Level::Debug, b"D\n").unwrap();
    set.flush();

    assert_eq!(out.text(), "W\n", "Console mode does not cascade");
    assert_eq!(err.text(), "E\n");
}
