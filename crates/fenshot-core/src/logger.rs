//! Process-wide logging for the `fenshot` binary.
//!
//! Library code only uses the `log` macros. A binary calls [`init_logging`]
//! once: with the `tracing` feature it installs a `tracing-subscriber`
//! formatter (which also bridges `log` records), otherwise a small stderr
//! logger printing `[  0.012s  INFO board::corners] message`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

/// Short stage name for a log target: `fenshot_board::corners` -> `board::corners`.
fn stage_of(target: &str) -> &str {
    match target.strip_prefix("fenshot_") {
        Some(rest) => rest,
        None => target.strip_prefix("fenshot::").unwrap_or(target),
    }
}

fn format_line(elapsed: f64, level: log::Level, target: &str, msg: &std::fmt::Arguments) -> String {
    format!("[{elapsed:7.3}s {level:>5} {}] {msg}", stage_of(target))
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`),
/// falling back to `Info` for anything unknown.
pub fn level_from_str(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::Info)
}

/// `tracing` formatter filtered by `RUST_LOG`, or by `level` when unset.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: &str) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_from_str(level).to_string().to_lowercase()));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(fmt::time::Uptime::default())
        .finish()
        .try_init();
}

/// Install the logger matching the enabled features at `level`.
pub fn init_logging(level: &str) {
    #[cfg(feature = "tracing")]
    init_tracing(level);
    #[cfg(not(feature = "tracing"))]
    {
        let _ = init_with_level(level_from_str(level));
    }
}
