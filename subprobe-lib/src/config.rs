//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `SP_*`
//! environment variables, and merging configurations with proper precedence
//! rules.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// This represents the structure of configuration files that users can create
/// to set default values for scans.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<usize>,

    /// Nameservers to query, in order. An empty list selects the system resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,

    /// Per-query timeout, e.g. "5s" or "1m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Resolver attempts per query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<usize>,

    /// Default wordlist path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordlist: Option<String>,

    /// Default pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default output format: "text", "json" or "csv"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    /// Include CSV headers by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_headers: Option<bool>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if reading, parsing or
    /// validation fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScanError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::config(format!(
                "Failed to read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        // Validate the loaded configuration
        self.validate_config(&config)?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them,
    /// later (more local) files winning.
    pub fn discover_and_load(&self) -> Result<FileConfig, ScanError> {
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

        if loaded_files.len() > 1 {
            debug!(
                files = ?loaded_files,
                "multiple config files found, later files take precedence"
            );
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    ///
    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./subprobe.toml", "./.subprobe.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path.
    ///
    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".subprobe.toml", "subprobe.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("subprobe").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.rate.is_some() {
                        lower_defaults.rate = higher_defaults.rate;
                    }
                    if higher_defaults.nameservers.is_some() {
                        lower_defaults.nameservers = higher_defaults.nameservers;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.attempts.is_some() {
                        lower_defaults.attempts = higher_defaults.attempts;
                    }
                    if higher_defaults.wordlist.is_some() {
                        lower_defaults.wordlist = higher_defaults.wordlist;
                    }
                    if higher_defaults.pretty.is_some() {
                        lower_defaults.pretty = higher_defaults.pretty;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: match (lower.output, higher.output) {
                (Some(mut lower_output), Some(higher_output)) => {
                    if higher_output.default_format.is_some() {
                        lower_output.default_format = higher_output.default_format;
                    }
                    if higher_output.csv_headers.is_some() {
                        lower_output.csv_headers = higher_output.csv_headers;
                    }
                    Some(lower_output)
                }
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ScanError> {
        if let Some(defaults) = &config.defaults {
            if defaults.rate == Some(0) {
                return Err(ScanError::config("Rate must be a positive integer"));
            }

            if defaults.attempts == Some(0) {
                return Err(ScanError::config("Attempts must be at least 1"));
            }

            if let Some(timeout_str) = &defaults.timeout {
                if positive_timeout(timeout_str).is_none() {
                    return Err(ScanError::config(format!(
                        "Invalid timeout '{}'. Use a positive duration like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(nameservers) = &defaults.nameservers {
                if nameservers.iter().any(|ns| ns.trim().is_empty()) {
                    return Err(ScanError::config("Nameserver entries cannot be empty"));
                }
            }
        }

        if let Some(output) = &config.output {
            if let Some(format) = &output.default_format {
                if !matches!(format.as_str(), "text" | "json" | "csv") {
                    return Err(ScanError::config(format!(
                        "Invalid output format '{}'. Use 'text', 'json' or 'csv'",
                        format
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `SP_*`
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub rate: Option<usize>,
    pub nameservers: Option<Vec<String>>,
    pub timeout: Option<String>,
    pub attempts: Option<usize>,
    pub wordlist: Option<String>,
    pub pretty: Option<bool>,
    pub json: Option<bool>,
    pub csv: Option<bool>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Check if output format conflicts exist (JSON and CSV both set).
    pub fn has_output_format_conflict(&self) -> bool {
        matches!((self.json, self.csv), (Some(true), Some(true)))
    }
}

/// Load configuration from environment variables.
///
/// Parses all `SP_*` environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // SP_RATE - concurrent in-flight queries
    if let Ok(val) = env::var("SP_RATE") {
        match val.trim().parse::<usize>() {
            Ok(rate) if rate > 0 => {
                env_config.rate = Some(rate);
                debug!("using SP_RATE={}", rate);
            }
            _ => warn!("invalid SP_RATE='{}', must be a positive integer", val),
        }
    }

    // SP_NAMESERVERS - comma-separated nameserver list
    if let Ok(ns_str) = env::var("SP_NAMESERVERS") {
        let nameservers = split_list(&ns_str);
        if !nameservers.is_empty() {
            debug!("using SP_NAMESERVERS={}", ns_str);
            env_config.nameservers = Some(nameservers);
        }
    }

    // SP_TIMEOUT - per-query timeout
    if let Ok(timeout_str) = env::var("SP_TIMEOUT") {
        if positive_timeout(&timeout_str).is_some() {
            debug!("using SP_TIMEOUT={}", timeout_str);
            env_config.timeout = Some(timeout_str);
        } else {
            warn!(
                "invalid SP_TIMEOUT='{}', use a positive duration like '5s', '30s', '2m'",
                timeout_str
            );
        }
    }

    // SP_ATTEMPTS - resolver attempts per query
    if let Ok(val) = env::var("SP_ATTEMPTS") {
        match val.trim().parse::<usize>() {
            Ok(attempts) if attempts > 0 => {
                env_config.attempts = Some(attempts);
                debug!("using SP_ATTEMPTS={}", attempts);
            }
            _ => warn!("invalid SP_ATTEMPTS='{}', must be a positive integer", val),
        }
    }

    // SP_WORDLIST - default wordlist path
    if let Ok(path) = env::var("SP_WORDLIST") {
        if !path.trim().is_empty() {
            debug!("using SP_WORDLIST={}", path);
            env_config.wordlist = Some(path);
        }
    }

    env_config.pretty = parse_bool_env("SP_PRETTY");
    env_config.json = parse_bool_env("SP_JSON");
    env_config.csv = parse_bool_env("SP_CSV");

    // SP_CONFIG - explicit config file
    if let Ok(config_path) = env::var("SP_CONFIG") {
        if !config_path.trim().is_empty() {
            debug!("using SP_CONFIG={}", config_path);
            env_config.config = Some(config_path);
        }
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Returns `None` if parsing fails.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

/// A timeout the resolver can use: parseable and not zero.
fn positive_timeout(timeout_str: &str) -> Option<u64> {
    parse_timeout_string(timeout_str).filter(|secs| *secs > 0)
}

fn parse_bool_env(name: &str) -> Option<bool> {
    let val = env::var(name).ok()?;
    match parse_bool(&val) {
        Some(flag) => {
            debug!("using {}={}", name, flag);
            Some(flag)
        }
        None => {
            warn!("invalid {}='{}', use true/false", name, val);
            None
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string(" 10S "), Some(10));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_parse_timeout_string_overflow() {
        assert_eq!(parse_timeout_string("307445734561825861m"), None);
        assert_eq!(parse_timeout_string("18446744073709551615s"), Some(u64::MAX));
        assert_eq!(parse_timeout_string("18446744073709551616"), None);
    }

    #[test]
    fn test_positive_timeout() {
        assert_eq!(positive_timeout("3s"), Some(3));
        assert_eq!(positive_timeout("0s"), None);
        assert_eq!(positive_timeout("0"), None);
        assert_eq!(positive_timeout("307445734561825861m"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("OFF"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("8.8.8.8, 1.1.1.1,,"),
            vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
rate = 1000
nameservers = ["1.1.1.1", "8.8.8.8"]
timeout = "3s"
wordlist = "words.txt"

[output]
default_format = "json"
"#,
        );

        let manager = ConfigManager::new();
        let config = manager.load_file(temp_file.path()).unwrap();

        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.rate, Some(1000));
        assert_eq!(
            defaults.nameservers,
            Some(vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()])
        );
        assert_eq!(defaults.timeout.as_deref(), Some("3s"));
        assert_eq!(defaults.wordlist.as_deref(), Some("words.txt"));
        assert_eq!(config.output.unwrap().default_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_invalid_rate() {
        let temp_file = write_config("[defaults]\nrate = 0\n");
        let result = ConfigManager::new().load_file(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let temp_file = write_config("[defaults]\ntimeout = \"soon\"\n");
        let result = ConfigManager::new().load_file(temp_file.path());
        assert!(matches!(result, Err(ScanError::Config { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_file = write_config("[defaults]\ntimeout = \"0s\"\n");
        let result = ConfigManager::new().load_file(temp_file.path());
        assert!(matches!(result, Err(ScanError::Config { .. })));
    }

    #[test]
    fn test_overflowing_timeout_rejected() {
        let temp_file = write_config("[defaults]\ntimeout = \"307445734561825861m\"\n");
        assert!(ConfigManager::new().load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_output_format() {
        let temp_file = write_config("[output]\ndefault_format = \"xml\"\n");
        assert!(ConfigManager::new().load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let temp_file = write_config("[defaults\nrate = ");
        let err = ConfigManager::new().load_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigManager::new()
            .load_file("/no/such/subprobe.toml")
            .unwrap_err();
        assert!(matches!(err, ScanError::Config { .. }));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new();

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                rate: Some(100),
                wordlist: Some("small.txt".to_string()),
                pretty: Some(false),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                default_format: Some("csv".to_string()),
                csv_headers: Some(true),
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                rate: Some(2500),
                pretty: Some(true),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                default_format: Some("json".to_string()),
                csv_headers: None,
            }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();
        let output = merged.output.unwrap();

        assert_eq!(defaults.rate, Some(2500)); // Higher wins
        assert_eq!(defaults.wordlist.as_deref(), Some("small.txt")); // Lower preserved
        assert_eq!(defaults.pretty, Some(true));
        assert_eq!(output.default_format.as_deref(), Some("json"));
        assert_eq!(output.csv_headers, Some(true));
    }

    #[test]
    fn test_merge_with_missing_sections() {
        let manager = ConfigManager::new();
        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                attempts: Some(3),
                ..Default::default()
            }),
            output: None,
        };

        let merged = manager.merge_configs(lower, FileConfig::default());
        assert_eq!(merged.defaults.unwrap().attempts, Some(3));
        assert!(merged.output.is_none());
    }

    #[test]
    fn test_env_output_conflict() {
        let env_config = EnvConfig {
            json: Some(true),
            csv: Some(true),
            ..Default::default()
        };
        assert!(env_config.has_output_format_conflict());
        assert!(!EnvConfig::default().has_output_format_conflict());
    }
}
