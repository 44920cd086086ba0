// GachaSniff - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "GachaSniff";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "GachaSniff";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Bridge tool
// =============================================================================

/// Default bridge executable, resolved through `PATH`.
pub const DEFAULT_ADB_PROGRAM: &str = "adb";

/// Default host for the optional network auto-connect.
pub const DEFAULT_CONNECT_HOST: &str = "127.0.0.1";

/// Default port for the optional network auto-connect (MuMu emulator).
pub const DEFAULT_CONNECT_PORT: &str = "16384";

/// Substring in `adb connect` output that acknowledges a connection.
/// Also present in "already connected to ...".
pub const CONNECT_ACK_MARKER: &str = "connected to";

/// State marker for an attached, authorised device in `adb devices` output.
pub const DEVICE_STATE_MARKER: &str = "device";

/// State marker for a device that has not accepted the host's RSA key.
pub const UNAUTHORIZED_MARKER: &str = "unauthorized";

/// Maximum bytes of captured stderr carried in a bridge error message.
pub const MAX_STDERR_PREVIEW: usize = 512;

// =============================================================================
// Rule limits
// =============================================================================

/// Maximum number of pattern rules that can be loaded (built-in + user).
pub const MAX_RULES: usize = 64;

/// Maximum size of a rule TOML file in bytes.
pub const MAX_RULE_FILE_SIZE: u64 = 16 * 1024; // 16 KB

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 1_024;

// =============================================================================
// Logging
// =============================================================================

/// Default log level. Kept at `warn` so diagnostics never interleave with
/// the operator prompts on the console.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

/// Emit a progress debug event every this many scanned logcat lines.
pub const SCAN_PROGRESS_INTERVAL_LINES: u64 = 5_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// User rules subdirectory name.
pub const RULES_DIR_NAME: &str = "rules";
