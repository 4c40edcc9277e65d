//! Operational core for quiesce daemons.
//!
//! This crate provides the pieces a multi-listener process needs to go from
//! "serving" to "stopped" without dropping work on the floor:
//!
//! - **Config**: YAML-based configuration with fail-fast validation
//! - **Shutdown**: the three-stage orchestrator (reject, drain, callbacks),
//!   the listener capability trait, and signal handling with force-exit
//!   escalation
//! - **Observability**: structured logging and Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use quiesce_operations::shutdown::{App, FnCallback, Listener};
//!
//! # async fn example(listeners: Vec<Arc<dyn Listener>>) {
//! let app = App::new(listeners)
//!     .with_drain_deadline(Duration::from_secs(10))
//!     .with_callback_deadline(Duration::from_secs(3))
//!     .with_shutdown_callbacks(vec![Arc::new(FnCallback::new(
//!         "flush-session-cache",
//!         |_budget| async { /* flush */ },
//!     ))]);
//!
//! // Blocks until a termination signal (or listener failure) has been
//! // handled and the shutdown sequence has run.
//! app.start_and_serve().await;
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod observability;
pub mod shutdown;

pub use config::{load_config, ObservabilityConfig, ServiceConfig, ShutdownConfig};
pub use errors::{ConfigError, ServeError};
pub use observability::{init_logging, init_logging_from_config, LogFormat, MetricsRegistry, ShutdownMetrics};
pub use shutdown::{
    App, Finalizer, FnCallback, FnFinalizer, Listener, ShutdownCallback, ShutdownHandle,
    SignalWatcher, TermSignal,
};
