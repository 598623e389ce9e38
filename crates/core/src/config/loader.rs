//! Loader for the `.opsline/` directory and single definition files.
//!
//! Layout:
//! - `.opsline/config.toml`: engine settings
//! - `.opsline/pipelines/*.yaml` (or `*.yml`): pipeline definitions

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, EngineSettings};
use ol_protocol::PipelineDefinition;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".opsline";

/// Loads all configuration from the `.opsline/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.opsline/` folder
///
/// # Returns
///
/// An `AppConfig` with the loaded settings and definitions. Missing
/// directories or files yield defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if a file exists but cannot be read or parsed, or
/// if the settings hold invalid values.
///
/// # Example
///
/// ```rust,no_run
/// use ol_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} pipelines", config.pipelines.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_dir = root.join(CONFIG_DIR);

    if !config_dir.exists() {
        return Ok(AppConfig::default());
    }

    let settings = load_settings(&config_dir)?;
    let pipelines = load_pipelines(&config_dir)?;
    debug!(
        dir = %config_dir.display(),
        pipelines = pipelines.len(),
        "configuration loaded"
    );

    Ok(AppConfig {
        settings,
        pipelines,
    })
}

/// Loads a single definition file. The format follows the extension:
/// `yaml`/`yml` or `json`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, has another extension,
/// or does not parse as a definition.
pub fn load_definition(path: &Path) -> ConfigResult<PipelineDefinition> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Loads engine settings from `config.toml`.
fn load_settings(config_dir: &Path) -> ConfigResult<EngineSettings> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(EngineSettings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: EngineSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if settings.default_node_timeout_secs == Some(0) {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "default_node_timeout_secs must be greater than zero".to_string(),
        });
    }
    if settings.extra_sensitive_keys.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "extra_sensitive_keys must not contain empty entries".to_string(),
        });
    }

    Ok(settings)
}

/// Loads all pipeline definitions from `pipelines/*.yaml`.
fn load_pipelines(config_dir: &Path) -> ConfigResult<Vec<PipelineDefinition>> {
    let pipelines_dir = config_dir.join("pipelines");

    if !pipelines_dir.exists() {
        return Ok(Vec::new());
    }

    let mut pipelines = Vec::new();

    for entry in WalkDir::new(&pipelines_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: pipelines_dir.clone(),
            source,
        })?;

        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        pipelines.push(load_definition(path)?);
    }

    Ok(pipelines)
}
