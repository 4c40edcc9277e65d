//! Service configuration: types, loading, validation.

mod loader;
mod types;
mod validation;

pub use loader::{load_config, load_config_from_str};
pub use types::{ListenerConfig, ObservabilityConfig, ServiceConfig, ShutdownConfig};
pub use validation::validate_config;
