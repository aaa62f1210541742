//! Settings loading and dependency wiring.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{resolve_records_path, SettingsLoader, DEFAULT_CONFIG_FILE, ENV_PREFIX};
