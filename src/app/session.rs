// GachaSniff - app/session.rs
//
// One sniffing session: the stage machine that sequences auto-connect,
// device lookup, selection and scanning, and maps the outcome to the final
// operator message.
//
//   Init -> [AutoConnect] -> DirectoryLookup -> Selecting -> Scanning
//        -> Reported | Failed
//
// Every stage runs exactly once; any failure ends the session. There is no
// retry and no loop-back.

use crate::core::matcher;
use crate::core::model::{RuleSet, ScanResult};
use crate::core::selector;
use crate::platform::bridge::Bridge;
use crate::platform::config::AppConfig;
use crate::util::error::SniffError;
use std::fmt;
use std::io::{BufRead, Write};

/// Pipeline stage, used for failure attribution and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    AutoConnect,
    DirectoryLookup,
    Selecting,
    Scanning,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::AutoConnect => "auto-connect",
            Stage::DirectoryLookup => "directory-lookup",
            Stage::Selecting => "selecting",
            Stage::Scanning => "scanning",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal state of a session.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The scan completed: either a URL was found or the stream ended.
    Reported(ScanResult),

    /// A stage failed and ended the session early.
    Failed { stage: Stage, error: SniffError },
}

impl SessionOutcome {
    /// Final operator-facing line for this outcome.
    pub fn message(&self) -> String {
        match self {
            Self::Reported(ScanResult::Matched { category, url }) => {
                format!("[{category}] 找到的URL: {url}")
            }
            Self::Reported(ScanResult::Exhausted) => "未找到符合条件的URL".to_string(),
            Self::Failed { error, .. } => match error {
                SniffError::Connection(e) => format!("[ERROR] 无法连接到设备: {e}"),
                SniffError::ToolInvocation(_) | SniffError::NoDevices => {
                    "未检测到设备，程序将退出。".to_string()
                }
                SniffError::Selection(e) => format!("[ERROR] 设备选择错误: {e}"),
                SniffError::Launch(e) => format!("[ERROR] 启动 adb logcat 失败: {e}"),
            },
        }
    }

    /// The matched URL, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Reported(ScanResult::Matched { url, .. }) => Some(url),
            _ => None,
        }
    }
}

/// A single run of the pipeline against one bridge.
///
/// Holds only borrowed, immutable inputs; all per-run state lives on the
/// stack of `run`.
pub struct Session<'a, B: Bridge> {
    config: &'a AppConfig,
    rules: &'a RuleSet,
    bridge: &'a B,
    preferred_serial: Option<&'a str>,
}

impl<'a, B: Bridge> Session<'a, B> {
    pub fn new(config: &'a AppConfig, rules: &'a RuleSet, bridge: &'a B) -> Self {
        Self {
            config,
            rules,
            bridge,
            preferred_serial: None,
        }
    }

    /// Select this serial without prompting (it must still be listed).
    pub fn with_preferred_serial(mut self, serial: Option<&'a str>) -> Self {
        self.preferred_serial = serial;
        self
    }

    /// Run every stage once. Progress lines and the selection prompt go to
    /// `output`; the selection answer is read from `input`. The final message
    /// is not written here; see `SessionOutcome::message`.
    pub fn run<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> SessionOutcome {
        let mut stage = Stage::Init;
        match self.run_stages(&mut stage, input, output) {
            Ok(result) => {
                tracing::debug!(?result, "Session reported");
                SessionOutcome::Reported(result)
            }
            Err(error) => {
                tracing::debug!(%stage, error = %error, "Session failed");
                SessionOutcome::Failed { stage, error }
            }
        }
    }

    fn run_stages<R: BufRead, W: Write>(
        &self,
        stage: &mut Stage,
        input: &mut R,
        output: &mut W,
    ) -> Result<ScanResult, SniffError> {
        // Console writes are best effort; a closed stdout must not change
        // which stage the session ends in.
        let _ = writeln!(output, "正在检查 ADB 连接状态...");

        if self.config.auto_connect {
            *stage = Stage::AutoConnect;
            let _ = writeln!(output, "自动连接到设备 {}...", self.config.endpoint);
            self.bridge.connect(&self.config.endpoint)?;
        }

        *stage = Stage::DirectoryLookup;
        let devices = self
            .bridge
            .list_devices()
            .map_err(|e| {
                tracing::warn!(error = %e, "Device listing failed");
                e
            })?;
        if devices.is_empty() {
            return Err(SniffError::NoDevices);
        }

        *stage = Stage::Selecting;
        let device = selector::select_device(&devices, self.preferred_serial, input, output)?;

        *stage = Stage::Scanning;
        let _ = writeln!(output, "正在监听日志，请打开抽卡界面...");
        let _ = output.flush();

        // The stream is dropped (and the subprocess killed) when this
        // statement ends, whatever the result.
        let result = matcher::scan_lines(self.bridge.open_log_stream(&device)?, self.rules);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ConnectionEndpoint, Device};
    use crate::core::rules::load_builtin_rules;
    use crate::util::error::{BridgeError, ConnectError, LaunchError, SelectionError};
    use std::cell::RefCell;
    use std::io::Cursor;

    /// Scripted bridge that records which operations were invoked.
    #[derive(Default)]
    struct FakeBridge {
        connect_ok: bool,
        devices: Option<Vec<&'static str>>,
        log_lines: Option<Vec<&'static str>>,
        calls: RefCell<Vec<String>>,
    }

    impl Bridge for FakeBridge {
        type Stream = std::vec::IntoIter<String>;

        fn list_devices(&self) -> Result<Vec<Device>, SniffError> {
            self.calls.borrow_mut().push("list".to_string());
            match &self.devices {
                Some(ids) => Ok(ids.iter().copied().map(Device::new).collect()),
                None => Err(BridgeError::Spawn {
                    program: "adb".into(),
                    operation: "adb devices",
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                }
                .into()),
            }
        }

        fn connect(&self, endpoint: &ConnectionEndpoint) -> Result<(), SniffError> {
            self.calls.borrow_mut().push(format!("connect {endpoint}"));
            if self.connect_ok {
                Ok(())
            } else {
                Err(ConnectError::Rejected {
                    endpoint: endpoint.to_string(),
                    response: format!("unable to connect to {endpoint}"),
                }
                .into())
            }
        }

        fn open_log_stream(&self, device: &Device) -> Result<Self::Stream, SniffError> {
            self.calls.borrow_mut().push(format!("logcat {device}"));
            match &self.log_lines {
                Some(lines) => Ok(lines
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .into_iter()),
                None => Err(LaunchError::MissingStdout {
                    device: device.to_string(),
                }
                .into()),
            }
        }
    }

    const GENSHIN_LINE: &str =
        "I Unity: https://webstatic.mihoyo.com/hk4e/event/e20190909gacha-v3/index.html?authkey=abc#/log";

    fn run(config: &AppConfig, bridge: &FakeBridge, typed: &str) -> (SessionOutcome, String) {
        let rules = RuleSet::new(load_builtin_rules());
        let mut input = Cursor::new(typed.as_bytes().to_vec());
        let mut output = Vec::new();
        let outcome = Session::new(config, &rules, bridge).run(&mut input, &mut output);
        (outcome, String::from_utf8(output).unwrap())
    }

    fn auto_connect_config() -> AppConfig {
        AppConfig {
            auto_connect: true,
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_single_device_match_reported() {
        let bridge = FakeBridge {
            devices: Some(vec!["ABC123"]),
            log_lines: Some(vec!["boot", GENSHIN_LINE, "after"]),
            ..Default::default()
        };
        let (outcome, shown) = run(&AppConfig::default(), &bridge, "");

        assert_eq!(
            outcome.url(),
            Some("https://webstatic.mihoyo.com/hk4e/event/e20190909gacha-v3/index.html?authkey=abc#/log")
        );
        assert!(outcome.message().starts_with("[原神] 找到的URL: https://"));
        assert!(shown.contains("正在监听日志"));
        assert_eq!(*bridge.calls.borrow(), vec!["list", "logcat ABC123"]);
    }

    #[test]
    fn test_exhausted_is_reported_not_failed() {
        let bridge = FakeBridge {
            devices: Some(vec!["ABC123"]),
            log_lines: Some(vec!["nothing", "here"]),
            ..Default::default()
        };
        let (outcome, _) = run(&AppConfig::default(), &bridge, "");
        assert!(matches!(outcome, SessionOutcome::Reported(ScanResult::Exhausted)));
        assert_eq!(outcome.message(), "未找到符合条件的URL");
    }

    #[test]
    fn test_auto_connect_failure_skips_listing() {
        let bridge = FakeBridge {
            connect_ok: false,
            devices: Some(vec!["ABC123"]),
            ..Default::default()
        };
        let (outcome, shown) = run(&auto_connect_config(), &bridge, "");

        assert!(matches!(
            outcome,
            SessionOutcome::Failed {
                stage: Stage::AutoConnect,
                error: SniffError::Connection(_)
            }
        ));
        assert!(outcome.message().starts_with("[ERROR] 无法连接到设备"));
        assert!(shown.contains("自动连接到设备 127.0.0.1:16384..."));
        assert_eq!(*bridge.calls.borrow(), vec!["connect 127.0.0.1:16384"]);
    }

    #[test]
    fn test_auto_connect_success_then_lists() {
        let bridge = FakeBridge {
            connect_ok: true,
            devices: Some(vec!["127.0.0.1:16384"]),
            log_lines: Some(vec![GENSHIN_LINE]),
            ..Default::default()
        };
        let (outcome, _) = run(&auto_connect_config(), &bridge, "");
        assert!(outcome.url().is_some());
        assert_eq!(
            *bridge.calls.borrow(),
            vec![
                "connect 127.0.0.1:16384",
                "list",
                "logcat 127.0.0.1:16384"
            ]
        );
    }

    #[test]
    fn test_no_devices_and_listing_error() {
        let empty = FakeBridge {
            devices: Some(vec![]),
            ..Default::default()
        };
        let (outcome, _) = run(&AppConfig::default(), &empty, "");
        assert!(matches!(
            outcome,
            SessionOutcome::Failed {
                stage: Stage::DirectoryLookup,
                error: SniffError::NoDevices
            }
        ));
        assert_eq!(outcome.message(), "未检测到设备，程序将退出。");

        let broken = FakeBridge::default();
        let (outcome, _) = run(&AppConfig::default(), &broken, "");
        assert!(matches!(
            outcome,
            SessionOutcome::Failed {
                stage: Stage::DirectoryLookup,
                error: SniffError::ToolInvocation(_)
            }
        ));
        assert_eq!(outcome.message(), "未检测到设备，程序将退出。");
    }

    #[test]
    fn test_multi_device_selection() {
        let bridge = FakeBridge {
            devices: Some(vec!["first", "second"]),
            log_lines: Some(vec![GENSHIN_LINE]),
            ..Default::default()
        };
        let (outcome, shown) = run(&AppConfig::default(), &bridge, "2\n");
        assert!(outcome.url().is_some());
        assert!(shown.contains("[2] second"));
        assert_eq!(*bridge.calls.borrow(), vec!["list", "logcat second"]);
    }

    #[test]
    fn test_invalid_selection_fails_without_scanning() {
        let bridge = FakeBridge {
            devices: Some(vec!["first", "second"]),
            log_lines: Some(vec![GENSHIN_LINE]),
            ..Default::default()
        };
        let (outcome, _) = run(&AppConfig::default(), &bridge, "5\n");
        assert!(matches!(
            outcome,
            SessionOutcome::Failed {
                stage: Stage::Selecting,
                error: SniffError::Selection(SelectionError::OutOfRange { .. })
            }
        ));
        assert!(outcome.message().starts_with("[ERROR] 设备选择错误"));
        assert_eq!(*bridge.calls.borrow(), vec!["list"]);
    }

    #[test]
    fn test_preferred_serial_skips_prompt() {
        let bridge = FakeBridge {
            devices: Some(vec!["first", "second"]),
            log_lines: Some(vec![GENSHIN_LINE]),
            ..Default::default()
        };
        let rules = RuleSet::new(load_builtin_rules());
        let config = AppConfig::default();
        let mut output = Vec::new();
        let outcome = Session::new(&config, &rules, &bridge)
            .with_preferred_serial(Some("first"))
            .run(&mut Cursor::new(Vec::<u8>::new()), &mut output);
        assert!(outcome.url().is_some());
        assert!(!String::from_utf8(output).unwrap().contains("[1] first"));
        assert_eq!(*bridge.calls.borrow(), vec!["list", "logcat first"]);
    }

    #[test]
    fn test_launch_failure() {
        let bridge = FakeBridge {
            devices: Some(vec!["ABC123"]),
            log_lines: None,
            ..Default::default()
        };
        let (outcome, _) = run(&AppConfig::default(), &bridge, "");
        assert!(matches!(
            outcome,
            SessionOutcome::Failed {
                stage: Stage::Scanning,
                error: SniffError::Launch(_)
            }
        ));
        assert!(outcome.message().starts_with("[ERROR] 启动 adb logcat 失败"));
    }
}
