//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory),
//! and applying command-line overrides on top.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use siteplan::config::AppConfig;

use crate::{Args, CliError};

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (siteplan/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or holds invalid values
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CliError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("siteplan/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "siteplan", "siteplan") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Applies the search flags given on the command line.
pub fn apply_overrides(config: AppConfig, args: &Args) -> AppConfig {
    let mut search = config.search().clone();
    if let Some(mode) = args.mode {
        search = search.with_mode(mode);
    }
    if let Some(engine) = args.engine {
        search = search.with_engine(engine);
    }
    if let Some(max_solutions) = args.max_solutions {
        search = search.with_max_solutions(max_solutions);
    }
    if let Some(seed) = args.seed {
        search = search.with_rng_seed(seed);
    }
    if args.parallel {
        search = search.with_parallel(true);
    }
    config.with_search(search)
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
/// - A value is out of range
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CliError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigFileError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))?;
    config
        .validate()
        .map_err(|e| ConfigFileError::Validation(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use siteplan::config::{EngineKind, PerformanceMode};
    use tempfile::NamedTempFile;

    use super::*;

    fn args() -> Args {
        Args {
            input: "site.json".to_string(),
            output: "solutions.json".to_string(),
            config: None,
            mode: None,
            engine: None,
            max_solutions: None,
            seed: None,
            parallel: false,
            time_limit: None,
            log_level: "off".to_string(),
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_config_file() {
        let file = write_config(
            r#"
            [search]
            engine = "baseline"
            mode = "fast"

            [generator]
            gap_options = [0.0, 1.5]
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.search().engine(), EngineKind::Baseline);
        assert_eq!(config.search().mode(), PerformanceMode::Fast);
        assert_eq!(config.search().max_solutions(), 8);
        assert_eq!(config.generator().gap_options(), &[0.0, 1.5]);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(Some("does/not/exist.toml")).unwrap_err();
        assert!(matches!(
            err,
            CliError::ConfigFile(ConfigFileError::MissingFile(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[search\nmode = ");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::ConfigFile(ConfigFileError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_value() {
        let file = write_config("[search]\nmax_solutions = 0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(
            err,
            CliError::ConfigFile(ConfigFileError::Validation(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut args = args();
        args.mode = Some(PerformanceMode::Thorough);
        args.max_solutions = Some(3);
        args.seed = Some(9);
        args.parallel = true;

        let config = apply_overrides(AppConfig::default(), &args);
        assert_eq!(config.search().mode(), PerformanceMode::Thorough);
        assert_eq!(config.search().engine(), EngineKind::Improved);
        assert_eq!(config.search().max_solutions(), 3);
        assert_eq!(config.search().rng_seed(), 9);
        assert!(config.search().parallel());
    }
}
