// GachaSniff - platform/config.rs
//
// Platform-specific directory resolution and config.json loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::ConnectionEndpoint;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Resolved platform paths for GachaSniff configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/gachasniff/ or %APPDATA%\GachaSniff\config\)
    pub config_dir: PathBuf,

    /// User rule directory (e.g. ~/.config/gachasniff/rules/)
    pub user_rules_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let user_rules_dir = config_dir.join(constants::RULES_DIR_NAME);

            tracing::debug!(
                config = %config_dir.display(),
                rules = %user_rules_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                user_rules_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                user_rules_dir: fallback.join(constants::RULES_DIR_NAME),
                config_dir: fallback,
            }
        }
    }
}

/// Pick the config file to load.
///
/// Priority: explicit `--config` path > `./config.json` > platform config dir.
/// Returns the platform path when nothing exists so the caller can report
/// where a config would be read from.
pub fn resolve_config_path(explicit: Option<&Path>, paths: &PlatformPaths) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let local = PathBuf::from(constants::CONFIG_FILE_NAME);
    if local.is_file() {
        return local;
    }

    paths.config_dir.join(constants::CONFIG_FILE_NAME)
}

// =============================================================================
// config.json loading and validation
// =============================================================================

/// Raw deserialisable shape of config.json.
///
/// Every key is optional; unknown keys are silently ignored so a newer
/// config file can be used with an older binary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Verbose diagnostic output.
    pub debug: Option<bool>,
    /// Run `adb connect` before listing devices.
    pub auto_connect: Option<bool>,
    /// Host for auto-connect.
    pub auto_connect_ip: Option<String>,
    /// Port for auto-connect; a string in the documented format, a number is
    /// tolerated.
    pub auto_connect_port: Option<PortValue>,
    /// Path to the adb executable.
    pub adb_path: Option<String>,
}

/// `auto_connect_port` as written in the file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Text(String),
    Number(i64),
}

/// Validated application configuration derived from `config.json`.
///
/// Built once at startup and passed by reference; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Verbose diagnostic output.
    pub debug: bool,
    /// Run `adb connect` to `endpoint` before listing devices.
    pub auto_connect: bool,
    /// Auto-connect target.
    pub endpoint: ConnectionEndpoint,
    /// Bridge executable.
    pub adb_program: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            auto_connect: false,
            endpoint: ConnectionEndpoint::new(
                constants::DEFAULT_CONNECT_HOST,
                constants::DEFAULT_CONNECT_PORT,
            ),
            adb_program: PathBuf::from(constants::DEFAULT_ADB_PROGRAM),
        }
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal errors.
/// A missing file yields defaults with no errors. An unreadable or
/// unparseable file yields defaults with one error; the caller reports it and
/// carries on. Individual invalid values keep their default.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<ConfigError>) {
    let mut warnings: Vec<ConfigError> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.json found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %config_path.display(), error = %e, "Could not read config file");
            warnings.push(ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            });
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match serde_json::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(path = %config_path.display(), error = %e, "Failed to parse config file");
            warnings.push(ConfigError::JsonParse {
                path: config_path.to_path_buf(),
                source: e,
            });
            return (AppConfig::default(), warnings);
        }
    };

    tracing::debug!(path = %config_path.display(), "Loaded config.json");

    let config = apply_raw(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::debug!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Validate each field of `raw` on top of the defaults, accumulating errors.
fn apply_raw(raw: RawConfig, warnings: &mut Vec<ConfigError>) -> AppConfig {
    let mut config = AppConfig::default();

    if let Some(debug) = raw.debug {
        config.debug = debug;
    }
    if let Some(auto_connect) = raw.auto_connect {
        config.auto_connect = auto_connect;
    }

    if let Some(host) = raw.auto_connect_ip {
        let host = host.trim();
        if host.is_empty() {
            warnings.push(ConfigError::ValueInvalid {
                field: "auto_connect_ip",
                value: String::new(),
                expected: "a non-empty host name or IP address",
            });
        } else {
            config.endpoint.host = host.to_string();
        }
    }

    if let Some(port) = raw.auto_connect_port {
        match validate_port(&port) {
            Some(p) => config.endpoint.port = p.to_string(),
            None => warnings.push(ConfigError::ValueInvalid {
                field: "auto_connect_port",
                value: match port {
                    PortValue::Text(s) => s,
                    PortValue::Number(n) => n.to_string(),
                },
                expected: "a TCP port between 1 and 65535",
            }),
        }
    }

    if let Some(adb) = raw.adb_path {
        let adb = adb.trim();
        if !adb.is_empty() {
            config.adb_program = PathBuf::from(adb);
        }
    }

    config
}

fn validate_port(port: &PortValue) -> Option<u16> {
    let parsed = match port {
        PortValue::Text(s) => s.trim().parse::<u16>().ok(),
        PortValue::Number(n) => u16::try_from(*n).ok(),
    };
    parsed.filter(|p| *p != 0)
}

// =============================================================================
// Tests
// =============================================================================
