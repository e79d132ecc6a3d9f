//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `WB_*`
//! environment variables, and merging them with proper precedence rules.

use crate::error::LookupError;
use crate::types::BatchConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// pool_size = 5
/// delay = "1s"
/// timeout = "10s"
/// suffix = "com"
///
/// [api]
/// endpoint = "https://v2.xxapi.cn/api/whois"
/// user_agent = "xiaoxiaoapi/1.0.0 (https://xxapi.cn)"
///
/// [output]
/// directory = "results"
/// save = true
/// json = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for checking options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Upstream API settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Report output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Worker pool size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,

    /// Per-request delay (as string, e.g., "1s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    /// Request timeout (as string, e.g., "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Domain suffix appended to every prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Upstream WHOIS API settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory the timestamped report is written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Whether to write the report file at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<bool>,

    /// Print the full report as JSON on stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl FileConfig {
    /// Apply file values on top of `config`.
    ///
    /// Values that fail to parse were already rejected by validation, so
    /// they are skipped here.
    pub fn apply_to(&self, mut config: BatchConfig) -> BatchConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(pool_size) = defaults.pool_size {
                config = config.with_pool_size(pool_size);
            }
            if let Some(delay) = defaults.delay.as_deref().and_then(parse_duration_string) {
                config.per_request_delay = delay;
            }
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
                config.request_timeout = timeout;
            }
        }

        if let Some(api) = &self.api {
            if let Some(endpoint) = &api.endpoint {
                config.endpoint = endpoint.clone();
            }
            if let Some(user_agent) = &api.user_agent {
                config.user_agent = user_agent.clone();
            }
        }

        config
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if reading, parsing or
    /// validation fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, LookupError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LookupError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            LookupError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Later files win: XDG config, then the home directory, then the
    /// current directory. Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, LookupError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping config file"),
            }
        }

        if self.verbose {
            for path in &loaded_files {
                info!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Local configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./whois-batch.toml", "./.whois-batch.toml"]
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    /// Global configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".whois-batch.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// XDG configuration file, following the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-batch").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win field by field.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    pool_size: higher.pool_size.or(lower.pool_size),
                    delay: higher.delay.or(lower.delay),
                    timeout: higher.timeout.or(lower.timeout),
                    suffix: higher.suffix.or(lower.suffix),
                }),
                (lower, higher) => higher.or(lower),
            },
            api: match (lower.api, higher.api) {
                (Some(lower), Some(higher)) => Some(ApiConfig {
                    endpoint: higher.endpoint.or(lower.endpoint),
                    user_agent: higher.user_agent.or(lower.user_agent),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    directory: higher.directory.or(lower.directory),
                    save: higher.save.or(lower.save),
                    json: higher.json.or(lower.json),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), LookupError> {
        if let Some(defaults) = &config.defaults {
            if let Some(pool_size) = defaults.pool_size {
                if pool_size == 0 || pool_size > 100 {
                    return Err(LookupError::config("pool_size must be between 1 and 100"));
                }
            }

            for (name, value) in [("delay", &defaults.delay), ("timeout", &defaults.timeout)] {
                if let Some(value) = value {
                    if parse_duration_string(value).is_none() {
                        return Err(LookupError::config(format!(
                            "Invalid {} format '{}'. Use format like '500ms', '1s', '2m'",
                            name, value
                        )));
                    }
                }
            }

            if let Some(suffix) = &defaults.suffix {
                if suffix.trim().trim_start_matches('.').is_empty() || suffix.contains(' ') {
                    return Err(LookupError::config(format!("Invalid suffix '{}'", suffix)));
                }
            }
        }

        if let Some(api) = &config.api {
            if let Some(endpoint) = &api.endpoint {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(LookupError::config(format!(
                        "Endpoint '{}' must be an http(s) URL",
                        endpoint
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `WB_*` variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub pool_size: Option<usize>,
    pub delay: Option<Duration>,
    pub timeout: Option<Duration>,
    pub endpoint: Option<String>,
    pub user_agent: Option<String>,
    pub suffix: Option<String>,
    pub output_dir: Option<String>,
    pub save: Option<bool>,
    pub json: Option<bool>,
    pub file: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Apply environment values on top of `config`.
    pub fn apply_to(&self, mut config: BatchConfig) -> BatchConfig {
        if let Some(pool_size) = self.pool_size {
            config = config.with_pool_size(pool_size);
        }
        if let Some(delay) = self.delay {
            config.per_request_delay = delay;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok(), verbose)
}

/// Load `WB_*` configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(lookup: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();
    let used = |key: &str, value: &str| {
        if verbose {
            info!("Using {}={}", key, value);
        }
    };

    // WB_POOL_SIZE - concurrent lookups
    if let Some(val) = lookup("WB_POOL_SIZE") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=100).contains(&n) => {
                env_config.pool_size = Some(n);
                used("WB_POOL_SIZE", &val);
            }
            _ => warn!("Invalid WB_POOL_SIZE='{}', must be 1-100", val),
        }
    }

    for (key, slot) in [
        ("WB_DELAY", &mut env_config.delay),
        ("WB_TIMEOUT", &mut env_config.timeout),
    ] {
        if let Some(val) = lookup(key) {
            match parse_duration_string(&val) {
                Some(d) => {
                    *slot = Some(d);
                    used(key, &val);
                }
                None => warn!("Invalid {}='{}', use format like '500ms', '1s', '2m'", key, val),
            }
        }
    }

    for (key, slot) in [
        ("WB_ENDPOINT", &mut env_config.endpoint),
        ("WB_USER_AGENT", &mut env_config.user_agent),
        ("WB_SUFFIX", &mut env_config.suffix),
        ("WB_OUTPUT_DIR", &mut env_config.output_dir),
        ("WB_FILE", &mut env_config.file),
        ("WB_CONFIG", &mut env_config.config),
    ] {
        if let Some(val) = lookup(key) {
            if !val.trim().is_empty() {
                *slot = Some(val.trim().to_string());
                used(key, &val);
            }
        }
    }

    for (key, slot) in [
        ("WB_SAVE", &mut env_config.save),
        ("WB_JSON", &mut env_config.json),
    ] {
        if let Some(val) = lookup(key) {
            match parse_bool(&val) {
                Some(b) => {
                    *slot = Some(b);
                    used(key, &val);
                }
                None => warn!("Invalid {}='{}', use true/false", key, val),
            }
        }
    }

    env_config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration string like "500ms", "5s", "2m" or a bare number of seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = value.strip_suffix('s') {
        s.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = value.strip_suffix('m') {
        m.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        // Assume seconds if no unit
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration_string("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration_string("0s"), Some(Duration::ZERO));
        assert_eq!(parse_duration_string("soon"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
pool_size = 8
delay = "250ms"
timeout = "5s"
suffix = "net"

[api]
endpoint = "http://localhost:8080/whois"

[output]
directory = "results"
save = false
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();

        let defaults = config.defaults.clone().unwrap();
        assert_eq!(defaults.pool_size, Some(8));
        assert_eq!(defaults.suffix.as_deref(), Some("net"));
        assert_eq!(config.output.as_ref().unwrap().save, Some(false));

        let batch = config.apply_to(BatchConfig::default());
        assert_eq!(batch.pool_size, 8);
        assert_eq!(batch.per_request_delay, Duration::from_millis(250));
        assert_eq!(batch.request_timeout, Duration::from_secs(5));
        assert_eq!(batch.endpoint, "http://localhost:8080/whois");
        assert_eq!(batch.user_agent, crate::types::DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_pool_size() {
        let temp_file = write_config("[defaults]\npool_size = 0\n");
        let manager = ConfigManager::new(false);
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_delay_format() {
        let temp_file = write_config("[defaults]\ndelay = \"a while\"\n");
        let manager = ConfigManager::new(false);
        let err = manager.load_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("delay"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let temp_file = write_config("[api]\nendpoint = \"ftp://nope\"\n");
        let manager = ConfigManager::new(false);
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let temp_file = write_config("[defaults\npool_size = ");
        let manager = ConfigManager::new(false);
        assert!(matches!(
            manager.load_file(temp_file.path()),
            Err(LookupError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let manager = ConfigManager::new(false);
        assert!(matches!(
            manager.load_file("/definitely/not/here.toml"),
            Err(LookupError::FileError { .. })
        ));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                pool_size: Some(3),
                suffix: Some("com".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                directory: Some("low".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                pool_size: Some(10),
                ..Default::default()
            }),
            api: Some(ApiConfig {
                user_agent: Some("agent/2".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.pool_size, Some(10)); // Higher wins
        assert_eq!(defaults.suffix.as_deref(), Some("com")); // Lower preserved
        assert_eq!(merged.api.unwrap().user_agent.as_deref(), Some("agent/2"));
        assert_eq!(merged.output.unwrap().directory.as_deref(), Some("low"));
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("WB_POOL_SIZE", "7"),
            ("WB_DELAY", "0"),
            ("WB_TIMEOUT", "3s"),
            ("WB_SUFFIX", ".org"),
            ("WB_SAVE", "no"),
            ("WB_JSON", "maybe"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|k| vars.get(k).map(|v| v.to_string()), false);

        assert_eq!(env_config.pool_size, Some(7));
        assert_eq!(env_config.delay, Some(Duration::ZERO));
        assert_eq!(env_config.timeout, Some(Duration::from_secs(3)));
        assert_eq!(env_config.suffix.as_deref(), Some(".org"));
        assert_eq!(env_config.save, Some(false));
        assert_eq!(env_config.json, None); // invalid value ignored

        let batch = env_config.apply_to(BatchConfig::default());
        assert_eq!(batch.pool_size, 7);
        assert_eq!(batch.per_request_delay, Duration::ZERO);
    }

    #[test]
    fn test_env_invalid_pool_size_ignored() {
        let env_config = load_env_config_from(
            |k| (k == "WB_POOL_SIZE").then(|| "500".to_string()),
            false,
        );
        assert_eq!(env_config.pool_size, None);
    }
}
