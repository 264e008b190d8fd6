use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use cascade_logger::{
    install_log_facade, log_record, Arg, Level, LeveledLogger, Logger, LoggerConfig, PrefixLogger,
};
use tracing_subscriber::EnvFilter;

/// Writes a handful of records through every entry point.
///
/// `cascade_logger [DIR]` logs into `DIR` (or `CASCADE_LOG_DIR`); with
/// neither, records go to stdout and stderr. Set `RUST_LOG=cascade_logger=debug`
/// to see the logger's own diagnostics.
fn main() -> ExitCode {
    let (diagnostics, _guard) = tracing_appender::non_blocking(std::io::stderr());
    // Installed directly so `log` stays free for the facade below.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(diagnostics)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("diagnostics disabled: {}", e);
    }

    let mut config = match LoggerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "bad logger configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = env::args_os().nth(1) {
        config = config.with_directory(dir);
    }

    let logger = match Logger::new(config.with_debug(true).with_source_location(true)) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            tracing::error!(error = %e, "failed to start logger");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = install_log_facade(Arc::clone(&logger)) {
        tracing::warn!(error = %e, "log facade not installed");
    }

    logger.info(vec![Arg::from("demo started, pid"), Arg::from(std::process::id())]);
    logger.debugf(format_args!("argv has {} entries", env::args_os().count()));

    let workers: Vec<_> = (0..4)
        .map(|id| {
            let worker = PrefixLogger::new(Arc::clone(&logger), format!("worker-{}", id));
            thread::spawn(move || {
                for step in 0..3 {
                    log_record!(worker, Level::Info, "step", step, "done");
                }
                if id == 3 {
                    worker.warnf(format_args!("worker {} saw a slow step", id));
                }
            })
        })
        .collect();
    for handle in workers {
        if handle.join().is_err() {
            tracing::error!("demo thread panicked");
        }
    }

    log::error!("routed through the log facade");
    logger.error(vec![Arg::from("demo finished")]);
    logger.shutdown();
    ExitCode::SUCCESS
}
