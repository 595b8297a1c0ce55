pub mod booted;
pub mod completions;
pub mod devices;
pub mod install;
pub mod tail;

use indicatif::{ProgressBar, ProgressStyle};
use simsync_schema::DeviceState;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_VALIDATION_ERROR: u8 = 2;
pub const EXIT_NO_DEVICE: u8 = 3;
pub const EXIT_BRIDGE_ERROR: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finished_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(finished_style());
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(finished_style());
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_state(state: DeviceState) -> String {
    use console::Style;
    let text = state.to_string();
    match state {
        DeviceState::Booted => Style::new().green().apply_to(text).to_string(),
        DeviceState::Booting | DeviceState::ShuttingDown => {
            Style::new().yellow().apply_to(text).to_string()
        }
        DeviceState::Shutdown => Style::new().dim().apply_to(text).to_string(),
        DeviceState::Unknown => text,
    }
}

/// Map an error message to the process exit code by its prefix.
pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("validation error:") {
        EXIT_VALIDATION_ERROR
    } else if msg.starts_with("no matching device:") {
        EXIT_NO_DEVICE
    } else if msg.starts_with("bridge error:") {
        EXIT_BRIDGE_ERROR
    } else {
        EXIT_FAILURE
    }
}
