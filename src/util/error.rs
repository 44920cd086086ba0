// GachaSniff - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every session failure is one of the `SniffError` variants; config and rule
// errors are non-fatal and surface as warnings.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Top-level error type for a sniffing session.
/// Errors are categorised by the pipeline stage that produced them.
#[derive(Debug)]
pub enum SniffError {
    /// The bridge command could not be run or exited abnormally.
    ToolInvocation(BridgeError),

    /// Auto-connect to the configured endpoint was rejected or could not run.
    Connection(ConnectError),

    /// The bridge reported no attached, authorised devices.
    NoDevices,

    /// The operator's device choice was invalid.
    Selection(SelectionError),

    /// The log-stream subprocess could not be started.
    Launch(LaunchError),
}

impl fmt::Display for SniffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolInvocation(e) => write!(f, "Bridge invocation error: {e}"),
            Self::Connection(e) => write!(f, "Connection error: {e}"),
            Self::NoDevices => f.write_str("No attached and authorised devices"),
            Self::Selection(e) => write!(f, "Selection error: {e}"),
            Self::Launch(e) => write!(f, "Launch error: {e}"),
        }
    }
}

impl std::error::Error for SniffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ToolInvocation(e) => Some(e),
            Self::Connection(e) => Some(e),
            Self::NoDevices => None,
            Self::Selection(e) => Some(e),
            Self::Launch(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Bridge errors
// ---------------------------------------------------------------------------

/// Errors from running a one-shot bridge command (`adb devices`, `adb connect`).
#[derive(Debug)]
pub enum BridgeError {
    /// The executable could not be started.
    Spawn {
        program: PathBuf,
        operation: &'static str,
        source: io::Error,
    },

    /// The command ran but exited with a non-success status.
    ExitStatus {
        operation: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn {
                program,
                operation,
                source,
            } => write!(
                f,
                "cannot run '{}' for {operation}: {source}",
                program.display()
            ),
            Self::ExitStatus {
                operation,
                status,
                stderr,
            } => {
                if stderr.is_empty() {
                    write!(f, "{operation} exited with {status}")
                } else {
                    write!(f, "{operation} exited with {status}: {stderr}")
                }
            }
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::ExitStatus { .. } => None,
        }
    }
}

impl From<BridgeError> for SniffError {
    fn from(e: BridgeError) -> Self {
        Self::ToolInvocation(e)
    }
}

// ---------------------------------------------------------------------------
// Connect errors
// ---------------------------------------------------------------------------

/// Errors from the optional network auto-connect.
#[derive(Debug)]
pub enum ConnectError {
    /// `adb connect` itself could not run or failed.
    Bridge(BridgeError),

    /// `adb connect` ran but did not acknowledge the connection.
    Rejected { endpoint: String, response: String },
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bridge(e) => write!(f, "{e}"),
            Self::Rejected { endpoint, response } => {
                write!(f, "{endpoint} rejected the connection: {response}")
            }
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bridge(e) => Some(e),
            Self::Rejected { .. } => None,
        }
    }
}

impl From<ConnectError> for SniffError {
    fn from(e: ConnectError) -> Self {
        Self::Connection(e)
    }
}

// ---------------------------------------------------------------------------
// Selection errors
// ---------------------------------------------------------------------------

/// Errors from the operator's device choice.
#[derive(Debug)]
pub enum SelectionError {
    /// The entered text is not an integer.
    NotANumber { input: String },

    /// The entered index is outside `1..=max`.
    OutOfRange { choice: i64, max: usize },

    /// A serial was requested up front but is not in the device list.
    UnknownSerial { serial: String },

    /// Reading the operator's input failed.
    Io(io::Error),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber { input } => write!(f, "'{input}' is not a number"),
            Self::OutOfRange { choice, max } => {
                write!(f, "{choice} is out of range (1-{max})")
            }
            Self::UnknownSerial { serial } => {
                write!(f, "device '{serial}' is not attached or not authorised")
            }
            Self::Io(e) => write!(f, "cannot read input: {e}"),
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SelectionError> for SniffError {
    fn from(e: SelectionError) -> Self {
        Self::Selection(e)
    }
}

// ---------------------------------------------------------------------------
// Launch errors
// ---------------------------------------------------------------------------

/// Errors starting the `logcat` stream subprocess.
#[derive(Debug)]
pub enum LaunchError {
    /// The subprocess could not be spawned.
    Spawn { device: String, source: io::Error },

    /// The subprocess started but its stdout pipe was not available.
    MissingStdout { device: String },
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { device, source } => {
                write!(f, "cannot start logcat on '{device}': {source}")
            }
            Self::MissingStdout { device } => {
                write!(f, "logcat on '{device}' has no stdout pipe")
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::MissingStdout { .. } => None,
        }
    }
}

impl From<LaunchError> for SniffError {
    fn from(e: LaunchError) -> Self {
        Self::Launch(e)
    }
}

// ---------------------------------------------------------------------------
// Rule errors
// ---------------------------------------------------------------------------

/// Errors related to pattern rule loading and validation.
#[derive(Debug)]
pub enum RuleError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Rule file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty.
    MissingField {
        rule_id: String,
        field: &'static str,
    },

    /// The rule's regex pattern is invalid.
    InvalidRegex {
        rule_id: String,
        pattern: String,
        source: regex::Error,
    },

    /// The rule's regex pattern exceeds the maximum allowed length.
    RegexTooLong {
        rule_id: String,
        length: usize,
        max_length: usize,
    },

    /// Maximum number of rules exceeded.
    TooManyRules { count: usize, max: usize },

    /// I/O error reading a rule file or directory.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Rule file '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { rule_id, field } => {
                write!(f, "Rule '{rule_id}': missing required field '{field}'")
            }
            Self::InvalidRegex {
                rule_id,
                pattern,
                source,
            } => write!(f, "Rule '{rule_id}': invalid regex '{pattern}': {source}"),
            Self::RegexTooLong {
                rule_id,
                length,
                max_length,
            } => write!(
                f,
                "Rule '{rule_id}': regex is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::TooManyRules { count, max } => {
                write!(f, "Too many rules loaded ({count}), maximum is {max}")
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading rule '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading. Never fatal: the loader reports
/// them and keeps defaults.
#[derive(Debug)]
pub enum ConfigError {
    /// JSON parsing failed.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A config value failed validation.
    ValueInvalid {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueInvalid {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is invalid. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::ValueInvalid { .. } => None,
        }
    }
}

/// Convenience type alias for session results.
pub type Result<T> = std::result::Result<T, SniffError>;
