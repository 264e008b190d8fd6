use cascade_logger::{Arg, Buffer, BufferPool, Level, LeveledLogger, Logger, LoggerConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::sync::Once;
use std::time::Instant;
use tempfile::tempdir;

const ITERATIONS: usize = 100_000;

static LOG4RS_INIT: Once = Once::new();

#[derive(Debug)]
struct TestEvent {
    id: i32,
    active: bool,
    large_number: u64,
    description: String,
}

impl std::fmt::Display for TestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Event[id={}, active={}, large_number={}, desc={}]",
            self.id, self.active, self.large_number, self.description
        )
    }
}

fn event() -> TestEvent {
    TestEvent {
        id: 42,
        active: true,
        large_number: u64::MAX,
        description: "A longer description with special characters !@#$%^&*() \
                      and some metrics like CPU: 95%, Memory: 2.5GB"
            .to_string(),
    }
}

fn setup_log4rs(log_file: &str) {
    LOG4RS_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} [{l}]:{m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();
        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();
        log4rs::init_config(config).unwrap();
    });
}

fn bench_logging_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logging Comparison");
    group.sample_size(10);

    group.bench_function("cascade_vs_log4rs", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let event = event();

            let config = LoggerConfig::default().with_directory(dir.path().join("cascade")).with_name("bench");
            let logger = Logger::new(config).unwrap();
            let cascade_start = Instant::now();
            for i in 0..ITERATIONS {
                logger.infof(format_args!("Test perf: iteration={}, event={}", i, event));
            }
            let submit_duration = cascade_start.elapsed();
            logger.shutdown();
            let cascade_duration = cascade_start.elapsed();

            let log4rs_file = dir.path().join("log4rs.log");
            setup_log4rs(&log4rs_file.to_string_lossy());
            let log4rs_start = Instant::now();
            for i in 0..ITERATIONS {
                info!("Test perf: iteration={}, event={}", i, event);
            }
            let log4rs_duration = log4rs_start.elapsed();

            println!("\nPerformance comparison ({} records):", ITERATIONS);
            println!("cascade submit (caller side): {:?}", submit_duration);
            println!("cascade end to end (with I/O): {:?}", cascade_duration);
            println!("log4rs (with I/O): {:?}", log4rs_duration);
            println!(
                "Caller-side speedup: {:.2}x",
                log4rs_duration.as_secs_f64() / submit_duration.as_secs_f64()
            );

            black_box((submit_duration, cascade_duration, log4rs_duration))
        });
    });

    group.finish();
}

fn bench_submit_args(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::default()
        .with_directory(dir.path())
        .with_name("args")
        .with_queue_capacity(4096);
    let logger = Logger::new(config).unwrap();

    c.bench_function("submit_args", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            logger.log(
                Level::Info,
                vec![Arg::from("iteration"), Arg::from(black_box(i)), Arg::from(true)],
            );
        });
    });
    logger.shutdown();
}

fn bench_render_header(c: &mut Criterion) {
    let pool = BufferPool::new();
    let now = chrono::Local::now();
    c.bench_function("render_header", |b| {
        b.iter(|| {
            let mut buf: Buffer = pool.acquire();
            cascade_logger::format::write_header(&mut buf, black_box(&now), Level::Warn);
            buf.append_uint(black_box(9876543210));
            pool.release(buf);
        });
    });
}

criterion_group!(benches, bench_logging_comparison, bench_submit_args, bench_render_header);
criterion_main!(benches);
