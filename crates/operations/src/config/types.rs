//! Configuration types for a quiesce daemon.

use serde::Deserialize;
use std::time::Duration;

/// Root configuration for a daemon.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listeners to run. At least one is required.
    pub listeners: Vec<ListenerConfig>,

    /// Shutdown deadlines.
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// One network listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// Diagnostic name, used in logs only.
    pub name: String,

    /// Address to bind, in host:port form.
    pub addr: String,
}

/// Deadlines governing the shutdown sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShutdownConfig {
    /// Bound on waiting for in-flight requests after reject begins. Default: 10.
    #[serde(default = "ShutdownConfig::default_drain_deadline_secs")]
    pub drain_deadline_secs: u64,

    /// Bound on running all shutdown callbacks. Default: 3.
    #[serde(default = "ShutdownConfig::default_callback_deadline_secs")]
    pub callback_deadline_secs: u64,

    /// Bound on the entire shutdown sequence before force-exit. Default: 30.
    #[serde(default = "ShutdownConfig::default_escalation_deadline_secs")]
    pub escalation_deadline_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_deadline_secs: Self::default_drain_deadline_secs(),
            callback_deadline_secs: Self::default_callback_deadline_secs(),
            escalation_deadline_secs: Self::default_escalation_deadline_secs(),
        }
    }
}

impl ShutdownConfig {
    const fn default_drain_deadline_secs() -> u64 {
        10
    }

    const fn default_callback_deadline_secs() -> u64 {
        3
    }

    const fn default_escalation_deadline_secs() -> u64 {
        30
    }

    /// Drain deadline as a [`Duration`].
    pub fn drain_deadline(&self) -> Duration {
        Duration::from_secs(self.drain_deadline_secs)
    }

    /// Callback deadline as a [`Duration`].
    pub fn callback_deadline(&self) -> Duration {
        Duration::from_secs(self.callback_deadline_secs)
    }

    /// Escalation deadline as a [`Duration`].
    pub fn escalation_deadline(&self) -> Duration {
        Duration::from_secs(self.escalation_deadline_secs)
    }
}

/// Observability configuration for logging and metrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level: trace, debug, info, warn, error. Default: info.
    #[serde(default = "ObservabilityConfig::default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty. Default: json.
    #[serde(default = "ObservabilityConfig::default_log_format")]
    pub log_format: String,

    /// Whether Prometheus metrics are collected. Default: true.
    #[serde(default = "ObservabilityConfig::default_metrics_enabled")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_format: Self::default_log_format(),
            metrics_enabled: Self::default_metrics_enabled(),
        }
    }
}

impl ObservabilityConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_log_format() -> String {
        "json".to_string()
    }

    const fn default_metrics_enabled() -> bool {
        true
    }
}
