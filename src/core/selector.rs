// GachaSniff - core/selector.rs
//
// Device selection. Generic over the input/output streams so the prompt is
// testable with in-memory buffers; main wires it to stdin/stdout.

use crate::core::model::Device;
use crate::util::error::{SelectionError, SniffError};
use std::io::{BufRead, Write};

/// Choose one device from `devices`.
///
/// - An empty list is `SniffError::NoDevices`.
/// - With `preferred` set, that serial is returned if listed, otherwise
///   `SelectionError::UnknownSerial`. No prompt either way.
/// - A single device is returned without writing or reading anything.
/// - Otherwise a 1-based menu is written to `output` and one line is read
///   from `input`. Anything but an integer in `1..=len` fails; there is no
///   second attempt.
pub fn select_device<R, W>(
    devices: &[Device],
    preferred: Option<&str>,
    input: &mut R,
    output: &mut W,
) -> Result<Device, SniffError>
where
    R: BufRead,
    W: Write,
{
    if devices.is_empty() {
        return Err(SniffError::NoDevices);
    }

    if let Some(serial) = preferred {
        return devices
            .iter()
            .find(|d| d.as_str() == serial)
            .cloned()
            .ok_or_else(|| {
                SelectionError::UnknownSerial {
                    serial: serial.to_string(),
                }
                .into()
            });
    }

    if let [only] = devices {
        tracing::debug!(device = %only, "Single device, selecting without prompt");
        return Ok(only.clone());
    }

    prompt(devices, output).map_err(SelectionError::Io)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(SelectionError::Io)?;

    let index = parse_choice(line.trim(), devices.len())?;
    let device = devices[index].clone();
    tracing::debug!(device = %device, choice = index + 1, "Device selected");
    Ok(device)
}

fn prompt<W: Write>(devices: &[Device], output: &mut W) -> std::io::Result<()> {
    writeln!(output, "检测到多个设备，请输入编号选择设备:")?;
    for (i, device) in devices.iter().enumerate() {
        writeln!(output, "[{}] {device}", i + 1)?;
    }
    write!(output, "输入设备编号 (1 到 {}): ", devices.len())?;
    output.flush()
}

/// Parse a 1-based choice and return the 0-based index.
fn parse_choice(input: &str, max: usize) -> Result<usize, SelectionError> {
    let choice: i64 = input.parse().map_err(|_| SelectionError::NotANumber {
        input: input.to_string(),
    })?;

    match usize::try_from(choice) {
        Ok(n) if (1..=max).contains(&n) => Ok(n - 1),
        _ => Err(SelectionError::OutOfRange { choice, max }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    /// Reader that fails the test if anything tries to read from it.
    struct NoInput;

    impl Read for NoInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            panic!("selector read input when it should not have");
        }
    }

    impl BufRead for NoInput {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            panic!("selector read input when it should not have");
        }

        fn consume(&mut self, _amt: usize) {}
    }

    fn devices(ids: &[&str]) -> Vec<Device> {
        ids.iter().copied().map(Device::new).collect()
    }

    fn select_with(ids: &[&str], typed: &str) -> (Result<Device, SniffError>, String) {
        let list = devices(ids);
        let mut input = Cursor::new(typed.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = select_device(&list, None, &mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_single_device_no_io() {
        let list = devices(&["ABC123"]);
        let mut output = Vec::new();
        let chosen = select_device(&list, None, &mut NoInput, &mut output).unwrap();
        assert_eq!(chosen.as_str(), "ABC123");
        assert!(output.is_empty());
    }

    #[test]
    fn test_every_valid_index() {
        let ids = ["a", "b", "c"];
        for (i, id) in ids.iter().enumerate() {
            let (result, _) = select_with(&ids, &format!("{}\n", i + 1));
            assert_eq!(result.unwrap().as_str(), *id);
        }
    }

    #[test]
    fn test_menu_is_one_based() {
        let (result, shown) = select_with(&["first", "second"], " 2 \r\n");
        assert_eq!(result.unwrap().as_str(), "second");
        assert!(shown.contains("[1] first"));
        assert!(shown.contains("[2] second"));
        assert!(shown.contains("(1 到 2)"));
    }

    #[test]
    fn test_out_of_range() {
        for typed in ["0\n", "3\n", "-1\n"] {
            let (result, _) = select_with(&["a", "b"], typed);
            assert!(
                matches!(
                    result,
                    Err(SniffError::Selection(SelectionError::OutOfRange { max: 2, .. }))
                ),
                "input {typed:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_non_numeric_and_empty_input() {
        for typed in ["abc\n", "\n", ""] {
            let (result, _) = select_with(&["a", "b"], typed);
            assert!(
                matches!(
                    result,
                    Err(SniffError::Selection(SelectionError::NotANumber { .. }))
                ),
                "input {typed:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_empty_list() {
        let mut output = Vec::new();
        let result = select_device(&[], None, &mut NoInput, &mut output);
        assert!(matches!(result, Err(SniffError::NoDevices)));
    }

    #[test]
    fn test_preferred_serial() {
        let list = devices(&["a", "b"]);
        let mut output = Vec::new();

        let chosen = select_device(&list, Some("b"), &mut NoInput, &mut output).unwrap();
        assert_eq!(chosen.as_str(), "b");

        let missing = select_device(&list, Some("zzz"), &mut NoInput, &mut output);
        assert!(matches!(
            missing,
            Err(SniffError::Selection(SelectionError::UnknownSerial { .. }))
        ));
        assert!(output.is_empty());
    }
}
