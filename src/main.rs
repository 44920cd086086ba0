// GachaSniff - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.json loading (non-fatal on errors)
// 3. Logging initialisation (debug mode support)
// 4. Rule loading (built-in + user-defined)
// 5. Running one session and pausing before exit

use clap::Parser;
use gachasniff::app::rule_mgr;
use gachasniff::app::session::Session;
use gachasniff::platform::bridge::AdbBridge;
use gachasniff::platform::config::{self, PlatformPaths};
use gachasniff::util;
use gachasniff::util::error::ConfigError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// GachaSniff - extract gacha record URLs from an Android device's logcat.
///
/// Lists devices through adb (optionally after `adb connect`), lets you pick
/// one, then watches its live log until a known game's record URL appears.
#[derive(Parser, Debug)]
#[command(name = "GachaSniff", version, about)]
struct Cli {
    /// Path to config.json (default: ./config.json, then the platform config dir).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Path to the adb executable (overrides `adb_path` in config.json).
    #[arg(long = "adb")]
    adb: Option<PathBuf>,

    /// Directory containing user-defined rule files (*.toml).
    #[arg(short = 'r', long = "rules-dir")]
    rules_dir: Option<PathBuf>,

    /// Device serial to use without prompting.
    #[arg(short = 's', long = "serial")]
    serial: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Exit immediately instead of waiting for Enter.
    #[arg(long = "no-pause")]
    no_pause: bool,
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let config_path = config::resolve_config_path(cli.config.as_deref(), &platform_paths);
    let (mut app_config, config_errors) = config::load_config(&config_path);

    if cli.debug {
        app_config.debug = true;
    }
    if let Some(adb) = cli.adb {
        app_config.adb_program = adb;
    }

    util::logging::init(app_config.debug);

    tracing::info!(
        version = util::constants::APP_VERSION,
        config = %config_path.display(),
        auto_connect = app_config.auto_connect,
        "GachaSniff starting"
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    for err in &config_errors {
        match err {
            ConfigError::ValueInvalid { .. } => {
                let _ = writeln!(output, "[WARN] config.json 配置项无效，已使用默认值: {err}");
            }
            _ => {
                let _ = writeln!(output, "[ERROR] 读取 config.json 失败: {err}");
            }
        }
    }

    let rules_dir = cli
        .rules_dir
        .as_deref()
        .unwrap_or(&platform_paths.user_rules_dir);
    let (rules, rule_errors) = rule_mgr::load_all_rules(Some(rules_dir));
    for err in &rule_errors {
        let _ = writeln!(output, "[WARN] 规则文件加载失败: {err}");
    }

    let bridge = AdbBridge::new(app_config.adb_program.clone());
    let outcome = Session::new(&app_config, &rules, &bridge)
        .with_preferred_serial(cli.serial.as_deref())
        .run(&mut input, &mut output);

    let _ = writeln!(output, "{}", outcome.message());

    if !cli.no_pause {
        wait_for_exit(&mut input, &mut output);
    }
}

/// Block until the operator presses Enter, so a double-clicked console
/// window stays open long enough to copy the URL.
fn wait_for_exit<R: BufRead, W: Write>(input: &mut R, output: &mut W) {
    let _ = write!(output, "\n按回车键退出...");
    let _ = output.flush();
    let mut line = String::new();
    let _ = input.read_line(&mut line);
}
