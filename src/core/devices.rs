// GachaSniff - core/devices.rs
//
// Parsing of the bridge tool's textual output. Pure functions: the process
// invocation lives in platform::bridge, which feeds stdout here.

use crate::core::model::Device;
use crate::util::constants::{CONNECT_ACK_MARKER, DEVICE_STATE_MARKER, UNAUTHORIZED_MARKER};

/// Parse `adb devices` output into the list of usable devices.
///
/// The first line is the "List of devices attached" header and is always
/// skipped, whatever it contains. Each remaining non-empty line yields its
/// first whitespace-delimited token when the line carries the `device` state
/// marker and does not carry `unauthorized`. Listing order is preserved.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output
        .lines()
        .skip(1)
        .filter(|line| line.contains(DEVICE_STATE_MARKER) && !line.contains(UNAUTHORIZED_MARKER))
        .filter_map(|line| line.split_whitespace().next())
        .map(Device::new)
        .collect()
}

/// Whether an `adb connect` response acknowledges the connection.
///
/// `adb connect` exits 0 even when it fails ("unable to connect to ..."),
/// so the text is the only reliable signal.
pub fn is_connect_ack(response: &str) -> bool {
    response.contains(CONNECT_ACK_MARKER)
}
