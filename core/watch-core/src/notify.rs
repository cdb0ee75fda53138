//! Best-effort desktop notifications.
//!
//! Delivery failures are logged and swallowed; a missed toast must never turn
//! a successful check into a failed run.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Shells out to the platform notifier: `osascript` on macOS, `notify-send` elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let mut command = platform_command(title, message);
        match command.stdout(Stdio::null()).stderr(Stdio::null()).status() {
            Ok(status) if status.success() => debug!(title, "Notification delivered"),
            Ok(status) => warn!(title, status = %status, "Notifier exited with failure"),
            Err(err) => warn!(title, error = %err, "Failed to launch notifier"),
        }
    }
}

#[cfg(target_os = "macos")]
fn platform_command(title: &str, message: &str) -> Command {
    let mut command = Command::new("osascript");
    command.arg("-e").arg(applescript(title, message));
    command
}

#[cfg(not(target_os = "macos"))]
fn platform_command(title: &str, message: &str) -> Command {
    let mut command = Command::new("notify-send");
    command.arg(title).arg(message);
    command
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript(title: &str, message: &str) -> String {
    format!(
        r#"display notification "{}" with title "{}""#,
        escape_applescript(message),
        escape_applescript(title)
    )
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applescript_escapes_quotes() {
        let script = applescript("Watcher", r#"Lot "A" open"#);
        assert_eq!(
            script,
            r#"display notification "Lot \"A\" open" with title "Watcher""#
        );
    }
}
