// GachaSniff - platform/bridge.rs
//
// Android debug bridge access: one-shot commands (`adb devices`,
// `adb connect`) and the long-running `adb -s <serial> shell logcat` stream.
//
// Architecture:
//   - `Bridge` is the seam the session orchestrator talks to, so the whole
//     pipeline can run against a scripted fake in tests.
//   - `AdbBridge` is the real implementation. Output parsing is delegated to
//     core::devices; this module only runs processes.
//   - `LogStream` owns the logcat child process. It yields lines lazily and
//     kills + reaps the child when dropped, so every exit path (match, end of
//     stream, early return) releases the subprocess.
//
// Encoding: logcat output is decoded as lossy UTF-8 per line; a single
// malformed byte sequence never aborts the scan.

use crate::core::devices;
use crate::core::model::{ConnectionEndpoint, Device};
use crate::util::constants::MAX_STDERR_PREVIEW;
use crate::util::error::{BridgeError, ConnectError, LaunchError, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Output, Stdio};

// =============================================================================
// Bridge trait
// =============================================================================

/// Operations the session needs from the debug bridge.
pub trait Bridge {
    /// Line sequence produced by an open log stream.
    type Stream: Iterator<Item = String>;

    /// List attached, authorised devices in the tool's order.
    fn list_devices(&self) -> Result<Vec<Device>>;

    /// Ask the bridge to connect to a network device.
    fn connect(&self, endpoint: &ConnectionEndpoint) -> Result<()>;

    /// Start streaming the live system log of `device`.
    fn open_log_stream(&self, device: &Device) -> Result<Self::Stream>;
}

// =============================================================================
// AdbBridge
// =============================================================================

/// `Bridge` implementation that shells out to the `adb` executable.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    program: PathBuf,
}

impl AdbBridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run a one-shot bridge command to completion and capture its output.
    ///
    /// Fails if the process cannot start or exits with a non-success status.
    fn run(&self, operation: &'static str, args: &[&str]) -> std::result::Result<Output, BridgeError> {
        tracing::debug!(program = %self.program.display(), ?args, "Running bridge command");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BridgeError::Spawn {
                program: self.program.clone(),
                operation,
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::ExitStatus {
                operation,
                status: output.status,
                stderr: truncate(stderr.trim(), MAX_STDERR_PREVIEW).to_string(),
            });
        }

        Ok(output)
    }
}

impl Bridge for AdbBridge {
    type Stream = LogStream;

    fn list_devices(&self) -> Result<Vec<Device>> {
        let output = self.run("adb devices", &["devices"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let devices = devices::parse_device_list(&stdout);
        tracing::debug!(?devices, "Device list");
        Ok(devices)
    }

    fn connect(&self, endpoint: &ConnectionEndpoint) -> Result<()> {
        let target = endpoint.to_string();
        let output = self
            .run("adb connect", &["connect", &target])
            .map_err(ConnectError::Bridge)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(output = %stdout.trim(), "adb connect output");

        if devices::is_connect_ack(&stdout) {
            return Ok(());
        }

        // Some adb builds report the failure on stderr with an empty stdout.
        let response = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr).trim().to_string()
        } else {
            stdout.trim().to_string()
        };
        Err(ConnectError::Rejected {
            endpoint: target,
            response: truncate(&response, MAX_STDERR_PREVIEW).to_string(),
        }
        .into())
    }

    fn open_log_stream(&self, device: &Device) -> Result<LogStream> {
        Ok(LogStream::spawn(&self.program, device)?)
    }
}

// =============================================================================
// LogStream
// =============================================================================

/// A running `adb -s <serial> shell logcat` process, consumed as lines.
///
/// Iteration ends when the process closes its stdout (device disconnected,
/// logcat killed) or a read fails. Dropping the stream kills and reaps the
/// process.
#[derive(Debug)]
pub struct LogStream {
    child: Child,
    reader: BufReader<ChildStdout>,
    device: String,
    buf: Vec<u8>,
    finished: bool,
}

impl LogStream {
    /// Spawn the logcat subprocess for `device` using the bridge at `program`.
    pub fn spawn(program: &Path, device: &Device) -> std::result::Result<Self, LaunchError> {
        let mut child = Command::new(program)
            .args(["-s", device.as_str(), "shell", "logcat"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                device: device.to_string(),
                source: e,
            })?;

        let Some(stdout) = child.stdout.take() else {
            // Unreachable with Stdio::piped(), but never leak the child.
            let _ = child.kill();
            let _ = child.wait();
            return Err(LaunchError::MissingStdout {
                device: device.to_string(),
            });
        };

        tracing::debug!(device = %device, pid = child.id(), "logcat started");

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            device: device.to_string(),
            buf: Vec::new(),
            finished: false,
        })
    }

    /// OS process id of the logcat subprocess.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Iterator for LogStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                tracing::debug!(device = %self.device, "logcat stream closed");
                self.finished = true;
                None
            }
            Ok(_) => Some(decode_line(&self.buf)),
            Err(e) => {
                tracing::warn!(device = %self.device, error = %e, "logcat read error; ending scan");
                self.finished = true;
                None
            }
        }
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(device = %self.device, %status, "logcat already exited");
            }
            _ => {
                if let Err(e) = self.child.kill() {
                    tracing::warn!(device = %self.device, error = %e, "Failed to kill logcat");
                }
                let _ = self.child.wait();
                tracing::debug!(device = %self.device, "logcat terminated");
            }
        }
    }
}

/// Decode one raw line as lossy UTF-8 without its `\n` / `\r\n` terminator.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
