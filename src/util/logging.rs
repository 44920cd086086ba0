// GachaSniff - util/logging.rs
//
// Diagnostic tracing with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: "debug": true
//
// Output: stderr only, so stdout stays reserved for operator-facing text.

use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `debug` is true when the user passed --debug or set `"debug": true` in
/// config.json.
///
/// Priority: RUST_LOG env var > debug flag > default level.
pub fn init(debug: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    // try_init so repeated initialisation (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(debug)
        .with_line_number(debug)
        .compact()
        .try_init();

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );
}

/// Truncate `line` to `DEBUG_MAX_LINE_PREVIEW` characters for debug output.
pub fn preview(line: &str) -> &str {
    match line.char_indices().nth(super::constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
