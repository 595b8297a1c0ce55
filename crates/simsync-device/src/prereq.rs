use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn simctl_works() -> bool {
    Command::new("xcrun")
        .args(["simctl", "help"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check prerequisites for the simctl backend.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_simctl_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists("xcrun") {
        missing.push(MissingPrereq {
            name: "xcrun",
            purpose: "locating Xcode developer tools",
            install_hint: "xcode-select --install, or install Xcode from the App Store",
        });
    } else if !simctl_works() {
        missing.push(MissingPrereq {
            name: "simctl",
            purpose: "controlling simulators",
            install_hint:
                "install Xcode and select it: sudo xcode-select -s /Applications/Xcode.app",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nsimsync needs Xcode's simulator tools to install apps.");
    msg
}
