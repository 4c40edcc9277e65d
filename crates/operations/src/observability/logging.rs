//! Structured logging.
//!
//! Uses `slog` for structured JSON output in production and a terminal
//! format for development. The `slog-scope` + `slog-stdlog` bridge captures
//! the `log::*!` macro calls used throughout the workspace.

use slog::{o, Drain, Level};
use slog_async::OverflowStrategy;
use slog_scope::GlobalLoggerGuard;

pub use slog::Logger;

/// Log format for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for machine parsing (production).
    #[default]
    Json,
    /// Human-readable format (development).
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = std::convert::Infallible;

    /// Parse from string, case-insensitive. Defaults to Json for unknown values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "text" | "human" => Self::Pretty,
            _ => Self::Json,
        })
    }
}

/// Parse log level from string.
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" | "warning" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

/// Initialize the logging system from configuration strings.
///
/// Convenience wrapper that parses level and format from strings.
pub fn init_logging_from_config(level: &str, format: &str) -> (Logger, GlobalLoggerGuard) {
    let level = parse_level(level);
    let format: LogFormat = format.parse().unwrap_or_default();
    init_logging(level, format)
}

/// Initialize the logging system.
///
/// Returns the root logger and the global-scope guard. Both must be kept
/// alive for the process lifetime; dropping the guard detaches the `log`
/// bridge and dropping the logger tears down the async drain.
pub fn init_logging(level: Level, format: LogFormat) -> (Logger, GlobalLoggerGuard) {
    let base_drain: Box<dyn Drain<Ok = (), Err = slog::Never> + Send> = match format {
        LogFormat::Json => {
            let drain = slog_json::Json::new(std::io::stdout())
                .add_default_keys()
                .build()
                .fuse();
            Box::new(drain)
        }
        LogFormat::Pretty => {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            Box::new(drain)
        }
    };

    let filtered = base_drain.filter_level(level).ignore_res();

    let async_drain = slog_async::Async::new(filtered)
        .chan_size(4096)
        .overflow_strategy(OverflowStrategy::DropAndReport)
        .build()
        .fuse();

    let logger = Logger::root(async_drain, o!("service" => "quiesced"));

    // Bridge the standard `log` crate to slog via the scope global.
    let guard = slog_scope::set_global_logger(logger.clone());
    if let Err(e) = slog_stdlog::init_with_level(to_log_level(level)) {
        eprintln!("Warning: failed to set up log bridge: {}", e);
    }

    (logger, guard)
}

/// Convert slog Level to log::Level for the bridge.
fn to_log_level(level: Level) -> log::Level {
    match level {
        Level::Critical | Level::Error => log::Level::Error,
        Level::Warning => log::Level::Warn,
        Level::Info => log::Level::Info,
        Level::Debug => log::Level::Debug,
        Level::Trace => log::Level::Trace,
    }
}
