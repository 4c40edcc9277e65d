//! Graceful shutdown orchestration.
//!
//! This module provides:
//! - [`App`], which runs a set of listeners and executes the three-stage
//!   shutdown sequence (reject, drain, callbacks) when triggered
//! - The [`Listener`] capability trait implemented by managed servers
//! - [`ShutdownCallback`] / [`Finalizer`] cleanup units
//! - [`SignalWatcher`] for termination-signal capture with force-exit
//!   escalation

mod app;
mod callbacks;
mod listener;
mod signals;

pub use app::{
    App, ShutdownHandle, DEFAULT_CALLBACK_DEADLINE, DEFAULT_DRAIN_DEADLINE,
    DEFAULT_ESCALATION_DEADLINE,
};
pub use callbacks::{Finalizer, FnCallback, FnFinalizer, ShutdownCallback};
pub use listener::Listener;
pub use signals::{SignalWatcher, TermSignal, DEFAULT_SIGNALS};
