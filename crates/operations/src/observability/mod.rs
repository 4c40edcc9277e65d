//! Logging and metrics.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_from_config, parse_level, LogFormat, Logger};
pub use metrics::{MetricsRegistry, ShutdownMetrics};
