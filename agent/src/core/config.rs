use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, APP_NAME_LOWER, CONFIG_FILE_NAME, DEFAULT_CONSOLE_PUSH_INTERVAL_SECS,
    DEFAULT_DRIVER, DEFAULT_FAILURE_WARN_THRESHOLD, DEFAULT_SERVER_NAME,
    DEFAULT_SHUTDOWN_GRACE_SECS, ENV_HOSTNAME, SERVER_DIMENSION,
};
use crate::data::exporters::Dimension;
use crate::domain::drivers::DriverKind;

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// AWS credentials selection (nested under cloudwatch)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthenticationFileConfig {
    pub region_name: Option<String>,
    pub aws_profile_name: Option<String>,
}

/// CloudWatch driver section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CloudwatchFileConfig {
    pub push_interval_seconds: Option<u64>,
    pub namespace: Option<String>,
    pub base_dimensions: Option<BTreeMap<String, String>>,
    pub failure_warn_threshold: Option<u64>,
    pub authentication: Option<AuthenticationFileConfig>,
}

/// Console driver section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConsoleFileConfig {
    pub push_interval_seconds: Option<u64>,
    pub namespace: Option<String>,
    pub base_dimensions: Option<BTreeMap<String, String>>,
    pub failure_warn_threshold: Option<u64>,
    pub pretty: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server_name: Option<String>,
    /// Driver names, validated against the registry after merging
    pub drivers: Option<Vec<String>>,
    pub shutdown_grace_secs: Option<u64>,
    pub cloudwatch: Option<CloudwatchFileConfig>,
    pub console: Option<ConsoleFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if other.server_name.is_some() {
            tracing::trace!(server_name = ?other.server_name, "Merging server_name");
            self.server_name = other.server_name;
        }
        if other.drivers.is_some() {
            tracing::trace!(drivers = ?other.drivers, "Merging drivers");
            self.drivers = other.drivers;
        }
        if other.shutdown_grace_secs.is_some() {
            tracing::trace!(shutdown_grace_secs = ?other.shutdown_grace_secs, "Merging shutdown_grace_secs");
            self.shutdown_grace_secs = other.shutdown_grace_secs;
        }

        // CloudWatch (with nested authentication)
        if let Some(cw) = other.cloudwatch {
            let current = self
                .cloudwatch
                .get_or_insert_with(CloudwatchFileConfig::default);
            if cw.push_interval_seconds.is_some() {
                tracing::trace!(push_interval_seconds = ?cw.push_interval_seconds, "Merging cloudwatch.push_interval_seconds");
                current.push_interval_seconds = cw.push_interval_seconds;
            }
            if cw.namespace.is_some() {
                tracing::trace!(namespace = ?cw.namespace, "Merging cloudwatch.namespace");
                current.namespace = cw.namespace;
            }
            if cw.base_dimensions.is_some() {
                tracing::trace!(base_dimensions = ?cw.base_dimensions, "Merging cloudwatch.base_dimensions");
                current.base_dimensions = cw.base_dimensions;
            }
            if cw.failure_warn_threshold.is_some() {
                tracing::trace!(failure_warn_threshold = ?cw.failure_warn_threshold, "Merging cloudwatch.failure_warn_threshold");
                current.failure_warn_threshold = cw.failure_warn_threshold;
            }
            if let Some(auth) = cw.authentication {
                let current_auth = current
                    .authentication
                    .get_or_insert_with(AuthenticationFileConfig::default);
                if auth.region_name.is_some() {
                    tracing::trace!(region_name = ?auth.region_name, "Merging cloudwatch.authentication.region_name");
                    current_auth.region_name = auth.region_name;
                }
                if auth.aws_profile_name.is_some() {
                    tracing::trace!(aws_profile_name = ?auth.aws_profile_name, "Merging cloudwatch.authentication.aws_profile_name");
                    current_auth.aws_profile_name = auth.aws_profile_name;
                }
            }
        }

        // Console
        if let Some(console) = other.console {
            let current = self.console.get_or_insert_with(ConsoleFileConfig::default);
            if console.push_interval_seconds.is_some() {
                tracing::trace!(push_interval_seconds = ?console.push_interval_seconds, "Merging console.push_interval_seconds");
                current.push_interval_seconds = console.push_interval_seconds;
            }
            if console.namespace.is_some() {
                tracing::trace!(namespace = ?console.namespace, "Merging console.namespace");
                current.namespace = console.namespace;
            }
            if console.base_dimensions.is_some() {
                tracing::trace!(base_dimensions = ?console.base_dimensions, "Merging console.base_dimensions");
                current.base_dimensions = console.base_dimensions;
            }
            if console.failure_warn_threshold.is_some() {
                tracing::trace!(failure_warn_threshold = ?console.failure_warn_threshold, "Merging console.failure_warn_threshold");
                current.failure_warn_threshold = console.failure_warn_threshold;
            }
            if console.pretty.is_some() {
                tracing::trace!(pretty = ?console.pretty, "Merging console.pretty");
                current.pretty = console.pretty;
            }
        }
    }
}

// =============================================================================
// Resolved Config Structs
// =============================================================================

/// Settings shared by every push driver
#[derive(Debug, Clone, Serialize)]
pub struct DriverConfig {
    pub name: String,
    pub push_interval_secs: u64,
    pub namespace: String,
    /// `server` first, then configured dimensions in key order
    pub base_dimensions: Vec<Dimension>,
    pub failure_warn_threshold: u64,
    pub shutdown_grace_secs: u64,
}

impl DriverConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthenticationConfig {
    pub region_name: Option<String>,
    pub aws_profile_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloudwatchConfig {
    #[serde(flatten)]
    pub driver: DriverConfig,
    pub authentication: AuthenticationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleConfig {
    #[serde(flatten)]
    pub driver: DriverConfig,
    pub pretty: bool,
}

/// Final merged application configuration
///
/// Driver sections are present only for enabled drivers.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub server_name: String,
    pub drivers: Vec<DriverKind>,
    pub shutdown_grace_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudwatch: Option<CloudwatchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<ConsoleConfig>,
}

/// Values shared by both driver sections before validation
struct DriverSection<'a> {
    kind: DriverKind,
    push_interval_seconds: Option<u64>,
    namespace: Option<String>,
    base_dimensions: Option<&'a BTreeMap<String, String>>,
    failure_warn_threshold: Option<u64>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.unimetrics/unimetrics.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.unimetrics/unimetrics.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_sources(cli, file_config)
    }

    /// Layer defaults, merged file config and CLI/env overrides, then validate
    pub fn from_sources(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        // server_name: CLI/env, then file, then host name
        let server_name = cli
            .server_name
            .clone()
            .or(file_config.server_name)
            .or_else(|| std::env::var(ENV_HOSTNAME).ok())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        // drivers: CLI/env list replaces the file list
        let drivers = match (&cli.drivers, file_config.drivers) {
            (Some(kinds), _) => kinds.clone(),
            (None, Some(names)) => names
                .iter()
                .map(|name| name.parse::<DriverKind>())
                .collect::<Result<Vec<_>, _>>()?,
            (None, None) => vec![DEFAULT_DRIVER.parse::<DriverKind>()?],
        };
        let drivers = dedup_preserving_order(drivers);
        if drivers.is_empty() {
            anyhow::bail!(
                "No drivers configured. Available drivers: {}",
                DriverKind::available()
            );
        }

        let shutdown_grace_secs = file_config
            .shutdown_grace_secs
            .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS);

        let cloudwatch = if drivers.contains(&DriverKind::Cloudwatch) {
            let file_cw = file_config.cloudwatch.unwrap_or_default();
            let file_auth = file_cw.authentication.clone().unwrap_or_default();
            let section = DriverSection {
                kind: DriverKind::Cloudwatch,
                push_interval_seconds: file_cw.push_interval_seconds,
                namespace: file_cw.namespace.clone(),
                base_dimensions: file_cw.base_dimensions.as_ref(),
                failure_warn_threshold: file_cw.failure_warn_threshold,
            };
            if section
                .namespace
                .as_deref()
                .is_none_or(|ns| ns.trim().is_empty())
            {
                anyhow::bail!("cloudwatch.namespace is required when the cloudwatch driver is enabled");
            }
            Some(CloudwatchConfig {
                driver: section.resolve(&server_name, shutdown_grace_secs)?,
                authentication: AuthenticationConfig {
                    region_name: file_auth.region_name,
                    aws_profile_name: file_auth.aws_profile_name,
                },
            })
        } else {
            None
        };

        let console = if drivers.contains(&DriverKind::Console) {
            let file_console = file_config.console.unwrap_or_default();
            let section = DriverSection {
                kind: DriverKind::Console,
                push_interval_seconds: file_console
                    .push_interval_seconds
                    .or(Some(DEFAULT_CONSOLE_PUSH_INTERVAL_SECS)),
                namespace: file_console.namespace.clone(),
                base_dimensions: file_console.base_dimensions.as_ref(),
                failure_warn_threshold: file_console.failure_warn_threshold,
            };
            Some(ConsoleConfig {
                driver: section.resolve(&server_name, shutdown_grace_secs)?,
                pretty: file_console.pretty.unwrap_or(false),
            })
        } else {
            None
        };

        let config = Self {
            server_name,
            drivers,
            shutdown_grace_secs,
            cloudwatch,
            console,
        };
        tracing::debug!(
            server_name = %config.server_name,
            drivers = ?config.drivers,
            "Configuration resolved"
        );
        Ok(config)
    }
}

impl DriverSection<'_> {
    fn resolve(self, server_name: &str, shutdown_grace_secs: u64) -> Result<DriverConfig> {
        let Some(push_interval_secs) = self.push_interval_seconds else {
            anyhow::bail!("{}.push_interval_seconds is required", self.kind);
        };
        if push_interval_secs == 0 {
            anyhow::bail!(
                "{}.push_interval_seconds must be greater than 0",
                self.kind
            );
        }

        let mut base_dimensions = vec![Dimension::new(SERVER_DIMENSION, server_name)];
        for (name, value) in self.base_dimensions.into_iter().flatten() {
            if name == SERVER_DIMENSION {
                tracing::warn!(
                    driver = %self.kind,
                    "Ignoring base dimension '{}' (reserved for the server name)",
                    SERVER_DIMENSION
                );
                continue;
            }
            base_dimensions.push(Dimension::new(name, value));
        }

        Ok(DriverConfig {
            name: self.kind.to_string(),
            push_interval_secs,
            namespace: self
                .namespace
                .filter(|ns| !ns.trim().is_empty())
                .unwrap_or_else(|| APP_NAME_LOWER.to_string()),
            base_dimensions,
            failure_warn_threshold: self
                .failure_warn_threshold
                .unwrap_or(DEFAULT_FAILURE_WARN_THRESHOLD),
            shutdown_grace_secs,
        })
    }
}

fn dedup_preserving_order(kinds: Vec<DriverKind>) -> Vec<DriverKind> {
    let mut unique = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !unique.contains(&kind) {
            unique.push(kind);
        }
    }
    unique
}

fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(server_name: &str) -> CliConfig {
        CliConfig {
            server_name: Some(server_name.to_string()),
            ..Default::default()
        }
    }

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_file_config_parse_full() {
        let config = parse(
            r#"{
                "server_name": "lobby-1",
                "drivers": ["cloudwatch", "console"],
                "shutdown_grace_secs": 3,
                "cloudwatch": {
                    "push_interval_seconds": 60,
                    "namespace": "Minecraft/Servers",
                    "base_dimensions": { "region": "eu" },
                    "authentication": { "region_name": "us-east-1", "aws_profile_name": "metrics" }
                },
                "console": { "pretty": true }
            }"#,
        );

        assert_eq!(config.server_name.as_deref(), Some("lobby-1"));
        assert_eq!(config.drivers.as_ref().unwrap().len(), 2);
        let cw = config.cloudwatch.as_ref().unwrap();
        assert_eq!(cw.push_interval_seconds, Some(60));
        assert_eq!(cw.base_dimensions.as_ref().unwrap()["region"], "eu");
        assert_eq!(
            cw.authentication.as_ref().unwrap().aws_profile_name.as_deref(),
            Some("metrics")
        );
        assert_eq!(config.console.as_ref().unwrap().pretty, Some(true));
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let config = parse(r#"{ "server_name": "a", "push_interval": 5 }"#);
        assert_eq!(config.extra.get("push_interval").unwrap(), 5);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = parse(
            r#"{
                "server_name": "base",
                "cloudwatch": {
                    "namespace": "Base",
                    "push_interval_seconds": 30,
                    "authentication": { "region_name": "eu-west-1" }
                }
            }"#,
        );
        let overlay = parse(
            r#"{
                "cloudwatch": {
                    "namespace": "Overlay",
                    "authentication": { "aws_profile_name": "prod" }
                }
            }"#,
        );

        base.merge(overlay);

        assert_eq!(base.server_name.as_deref(), Some("base"));
        let cw = base.cloudwatch.unwrap();
        assert_eq!(cw.namespace.as_deref(), Some("Overlay"));
        assert_eq!(cw.push_interval_seconds, Some(30));
        let auth = cw.authentication.unwrap();
        assert_eq!(auth.region_name.as_deref(), Some("eu-west-1"));
        assert_eq!(auth.aws_profile_name.as_deref(), Some("prod"));
    }

    #[test]
    fn test_defaults_enable_console_only() {
        let config = AppConfig::from_sources(&cli("lobby-1"), FileConfig::default()).unwrap();

        assert_eq!(config.drivers, vec![DriverKind::Console]);
        assert!(config.cloudwatch.is_none());
        let console = config.console.unwrap();
        assert_eq!(console.driver.namespace, APP_NAME_LOWER);
        assert_eq!(console.driver.push_interval_secs, DEFAULT_CONSOLE_PUSH_INTERVAL_SECS);
        assert_eq!(console.driver.shutdown_grace_secs, DEFAULT_SHUTDOWN_GRACE_SECS);
        assert_eq!(
            console.driver.failure_warn_threshold,
            DEFAULT_FAILURE_WARN_THRESHOLD
        );
        assert_eq!(
            console.driver.base_dimensions,
            vec![Dimension::new("server", "lobby-1")]
        );
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse(r#"{ "server_name": "from-file", "drivers": ["cloudwatch"] }"#);
        let cli = CliConfig {
            server_name: Some("from-cli".to_string()),
            drivers: Some(vec![DriverKind::Console]),
            config: None,
        };

        let config = AppConfig::from_sources(&cli, file).unwrap();
        assert_eq!(config.server_name, "from-cli");
        assert_eq!(config.drivers, vec![DriverKind::Console]);
    }

    #[test]
    fn test_server_dimension_first_then_key_order() {
        let file = parse(
            r#"{
                "drivers": ["cloudwatch"],
                "cloudwatch": {
                    "push_interval_seconds": 60,
                    "namespace": "Minecraft",
                    "base_dimensions": { "zone": "b", "cluster": "main", "server": "spoof" }
                }
            }"#,
        );

        let config = AppConfig::from_sources(&cli("lobby-1"), file).unwrap();
        let dims = config.cloudwatch.unwrap().driver.base_dimensions;
        let names: Vec<&str> = dims.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["server", "cluster", "zone"]);
        assert_eq!(dims[0].value, "lobby-1");
    }

    #[test]
    fn test_cloudwatch_requires_namespace() {
        let file = parse(r#"{ "drivers": ["cloudwatch"] }"#);
        let err = AppConfig::from_sources(&cli("lobby-1"), file).unwrap_err();
        assert!(err.to_string().contains("cloudwatch.namespace is required"));
    }

    #[test]
    fn test_zero_push_interval_rejected() {
        let file = parse(r#"{ "console": { "push_interval_seconds": 0 } }"#);
        let err = AppConfig::from_sources(&cli("lobby-1"), file).unwrap_err();
        assert_eq!(
            err.to_string(),
            "console.push_interval_seconds must be greater than 0"
        );
    }

    #[test]
    fn test_cloudwatch_requires_push_interval() {
        let file = parse(r#"{ "drivers": ["cloudwatch"], "cloudwatch": { "namespace": "Minecraft" } }"#);
        let err = AppConfig::from_sources(&cli("lobby-1"), file).unwrap_err();
        assert_eq!(err.to_string(), "cloudwatch.push_interval_seconds is required");
    }

    #[test]
    fn test_unknown_driver_rejected_with_available_list() {
        let file = parse(r#"{ "drivers": ["console", "influx"] }"#);
        let err = AppConfig::from_sources(&cli("lobby-1"), file).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown driver 'influx'. Available drivers: cloudwatch, console"
        );
    }

    #[test]
    fn test_empty_driver_list_rejected() {
        let file = parse(r#"{ "drivers": [] }"#);
        assert!(AppConfig::from_sources(&cli("lobby-1"), file).is_err());
    }

    #[test]
    fn test_duplicate_drivers_collapsed() {
        let file = parse(r#"{ "drivers": ["console", "Console"] }"#);
        let config = AppConfig::from_sources(&cli("lobby-1"), file).unwrap();
        assert_eq!(config.drivers, vec![DriverKind::Console]);
    }

    #[test]
    fn test_load_from_cli_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        fs::write(
            &path,
            r#"{ "console": { "push_interval_seconds": 15, "namespace": "dev" } }"#,
        )
        .unwrap();

        let cli = CliConfig {
            server_name: Some("lobby-1".to_string()),
            drivers: Some(vec![DriverKind::Console]),
            config: Some(path),
        };
        let config = AppConfig::load(&cli).unwrap();
        let console = config.console.unwrap();
        assert_eq!(console.driver.push_interval_secs, 15);
        assert_eq!(console.driver.namespace, "dev");
    }

    #[test]
    fn test_load_missing_cli_path_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/unimetrics.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_effective_config_serializes_enabled_sections() {
        let config = AppConfig::from_sources(&cli("lobby-1"), FileConfig::default()).unwrap();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["drivers"], serde_json::json!(["console"]));
        assert_eq!(json["console"]["namespace"], "unimetrics");
        assert_eq!(json["console"]["pretty"], false);
        assert!(json.get("cloudwatch").is_none());
    }
}
