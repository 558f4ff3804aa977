// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (or built-in defaults when no file exists)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, DualfilterConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "dualfilter.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "DUALFILTER_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `DUALFILTER_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if the env var names a missing file or
/// nothing is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "{} points to a missing file: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration
///
/// # Arguments
///
/// * `config_path` - Explicit config file. It must exist. If `None`, the file is
///   searched for and built-in defaults are used when none is found.
/// * `cli_args` - Optional CLI overrides keyed by dotted names
///
/// # Errors
///
/// Returns error if an explicit file is missing, unreadable or invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<DualfilterConfig> {
    let config_file = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            Some(path.to_path_buf())
        }
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(err) if env::var(CONFIG_PATH_ENV).is_ok() => return Err(err),
            Err(_) => None,
        },
    };

    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => DualfilterConfig::default(),
    };

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `DUALFILTER_INPUT` -> `pipeline.input`
/// - `DUALFILTER_OUTPUT` -> `pipeline.output`
/// - `DUALFILTER_THRESHOLD` -> `pipeline.threshold`
/// - `DUALFILTER_DISTRIBUTION_ENDPOINT` -> `channels.distribution_endpoint`
/// - `DUALFILTER_COLLECTION_ENDPOINT` -> `channels.collection_endpoint`
/// - `DUALFILTER_SETTLE_DELAY_MS` -> `channels.settle_delay_ms`
/// - `DUALFILTER_COLLECTION_TIMEOUT_MS` -> `channels.collection_timeout_ms`
/// - `DUALFILTER_BACKEND` -> `compute.backend`
/// - `DUALFILTER_RELIABILITY_ITERATIONS` -> `compute.reliability_iterations`
/// - `DUALFILTER_WORKER_COUNT` -> `workers.count`
/// - `DUALFILTER_STABILITY_ITERATIONS` -> `workers.stability_iterations`
/// - `DUALFILTER_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut DualfilterConfig) {
    let overrides: HashMap<String, String> = ENV_KEYS
        .iter()
        .filter_map(|(env_name, key)| env::var(env_name).ok().map(|v| (key.to_string(), v)))
        .collect();
    apply_cli_overrides(config, &overrides);
}

const ENV_KEYS: &[(&str, &str)] = &[
    ("DUALFILTER_INPUT", "pipeline.input"),
    ("DUALFILTER_OUTPUT", "pipeline.output"),
    ("DUALFILTER_THRESHOLD", "pipeline.threshold"),
    ("DUALFILTER_DISTRIBUTION_ENDPOINT", "channels.distribution_endpoint"),
    ("DUALFILTER_COLLECTION_ENDPOINT", "channels.collection_endpoint"),
    ("DUALFILTER_SETTLE_DELAY_MS", "channels.settle_delay_ms"),
    ("DUALFILTER_COLLECTION_TIMEOUT_MS", "channels.collection_timeout_ms"),
    ("DUALFILTER_BACKEND", "compute.backend"),
    ("DUALFILTER_RELIABILITY_ITERATIONS", "compute.reliability_iterations"),
    ("DUALFILTER_WORKER_COUNT", "workers.count"),
    ("DUALFILTER_STABILITY_ITERATIONS", "workers.stability_iterations"),
    ("DUALFILTER_LOG_LEVEL", "logging.level"),
];

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Dotted keys to values, e.g. `{"pipeline.threshold": "42.5"}`
pub fn apply_cli_overrides(config: &mut DualfilterConfig, cli_args: &HashMap<String, String>) {
    for (key, value) in cli_args {
        match key.as_str() {
            "pipeline.input" => config.pipeline.input = PathBuf::from(value),
            "pipeline.output" => config.pipeline.output = PathBuf::from(value),
            "pipeline.threshold" => set_parsed(&mut config.pipeline.threshold, value),
            "channels.distribution_endpoint" => {
                config.channels.distribution_endpoint = value.clone()
            }
            "channels.collection_endpoint" => config.channels.collection_endpoint = value.clone(),
            "channels.settle_delay_ms" => set_parsed(&mut config.channels.settle_delay_ms, value),
            "channels.collection_timeout_ms" => {
                if let Ok(ms) = value.parse::<u64>() {
                    config.channels.collection_timeout_ms = Some(ms);
                }
            }
            "channels.linger_ms" => set_parsed(&mut config.channels.linger_ms, value),
            "compute.backend" => config.compute.backend = value.to_lowercase(),
            "compute.reliability_iterations" => {
                set_parsed(&mut config.compute.reliability_iterations, value)
            }
            "compute.gpu_record_threshold" => {
                set_parsed(&mut config.compute.gpu_record_threshold, value)
            }
            "workers.count" => set_parsed(&mut config.workers.count, value),
            "workers.half_cpu" => {
                config.workers.half_cpu =
                    value.eq_ignore_ascii_case("true") || value == "1" || value.eq_ignore_ascii_case("yes")
            }
            "workers.stability_iterations" => {
                set_parsed(&mut config.workers.stability_iterations, value)
            }
            "workers.stability_threshold" => {
                set_parsed(&mut config.workers.stability_threshold, value)
            }
            "logging.level" => config.logging.level = value.clone(),
            "logging.log_dir" => config.logging.log_dir = PathBuf::from(value),
            "logging.format" => config.logging.format = value.to_lowercase(),
            _ => {}
        }
    }
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, value: &str) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_env_var_pointing_to_missing_file_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/definitely/not/here/dualfilter.toml");
        let result = load_config(None, None);
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")), None);
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("DUALFILTER_THRESHOLD");
        env::remove_var("DUALFILTER_SETTLE_DELAY_MS");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "threshold = 42.5").unwrap();
        writeln!(file, "[channels]").unwrap();
        writeln!(file, "settle_delay_ms = 10").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.pipeline.threshold, 42.5);
        assert_eq!(config.channels.settle_delay_ms, 10);
        assert_eq!(config.compute.backend, "auto");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[pipeline\nthreshold = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = DualfilterConfig::default();

        env::set_var("DUALFILTER_COLLECTION_ENDPOINT", "tcp://127.0.0.1:6000");
        env::set_var("DUALFILTER_COLLECTION_TIMEOUT_MS", "250");
        env::set_var("DUALFILTER_WORKER_COUNT", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("DUALFILTER_COLLECTION_ENDPOINT");
        env::remove_var("DUALFILTER_COLLECTION_TIMEOUT_MS");
        env::remove_var("DUALFILTER_WORKER_COUNT");

        assert_eq!(config.channels.collection_endpoint, "tcp://127.0.0.1:6000");
        assert_eq!(config.channels.collection_timeout_ms, Some(250));
        assert_eq!(config.workers.count, 0);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = DualfilterConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("compute.backend".to_string(), "CPU".to_string());
        cli_args.insert("workers.half_cpu".to_string(), "yes".to_string());
        cli_args.insert("pipeline.output".to_string(), "out/report.txt".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.compute.backend, "cpu");
        assert!(config.workers.half_cpu);
        assert_eq!(config.pipeline.output, PathBuf::from("out/report.txt"));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "threshold = 10.0").unwrap();
        writeln!(file, "[channels]").unwrap();
        writeln!(file, "settle_delay_ms = 100").unwrap();

        env::set_var("DUALFILTER_THRESHOLD", "20.0");
        env::set_var("DUALFILTER_SETTLE_DELAY_MS", "200");

        let mut cli_args = HashMap::new();
        cli_args.insert("pipeline.threshold".to_string(), "30.0".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("DUALFILTER_THRESHOLD");
        env::remove_var("DUALFILTER_SETTLE_DELAY_MS");

        // CLI wins for threshold, env wins for settle delay
        assert_eq!(config.pipeline.threshold, 30.0);
        assert_eq!(config.channels.settle_delay_ms, 200);
    }
}
