//! Configuration loading.
//!
//! This module loads engine settings and pipeline definitions from the
//! `.opsline/` directory structure, and single definition files.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_definition};
pub use models::{AppConfig, EngineSettings};
