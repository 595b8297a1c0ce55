use crate::arch::Arch;
use crate::types::Udid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Booted,
    Booting,
    Shutdown,
    ShuttingDown,
    Unknown,
}

impl DeviceState {
    /// Parse the state string reported by the device listing.
    pub fn parse(s: &str) -> Self {
        match s {
            "Booted" => Self::Booted,
            "Booting" => Self::Booting,
            "Shutdown" => Self::Shutdown,
            "Shutting Down" => Self::ShuttingDown,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Booted => "booted",
            Self::Booting => "booting",
            Self::Shutdown => "shutdown",
            Self::ShuttingDown => "shutting-down",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Which CPU the simulator process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorKind {
    /// 32-bit-only device models (iPhone 5 and earlier).
    Legacy32,
    Intel,
    AppleSilicon,
}

impl SimulatorKind {
    /// Simulator kind for a 64-bit model on the machine running this process.
    pub fn for_host() -> Self {
        if std::env::consts::ARCH == "aarch64" {
            Self::AppleSilicon
        } else {
            Self::Intel
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "class", content = "simulator")]
pub enum DeviceKind {
    Physical,
    Simulator(SimulatorKind),
}

impl DeviceKind {
    /// Architecture family a binary must contain at least one slice of.
    pub fn required_arches(self) -> &'static [Arch] {
        match self {
            Self::Physical => &[Arch::Arm64, Arch::Arm64e, Arch::Armv7, Arch::Armv7s],
            Self::Simulator(SimulatorKind::Legacy32) => &[Arch::I386],
            Self::Simulator(SimulatorKind::Intel) => &[Arch::X86_64, Arch::I386],
            Self::Simulator(SimulatorKind::AppleSilicon) => &[Arch::Arm64, Arch::X86_64],
        }
    }

    pub fn is_simulator(self) -> bool {
        matches!(self, Self::Simulator(_))
    }
}

/// A device instance as reported by the device listing. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub udid: Udid,
    pub name: String,
    pub runtime_version: String,
    pub instruments_identifier: String,
    pub state: DeviceState,
    pub kind: DeviceKind,
    pub log_file: PathBuf,
}

impl Device {
    pub fn new(
        udid: impl Into<Udid>,
        name: &str,
        runtime_version: &str,
        state: DeviceState,
        kind: DeviceKind,
        log_file: PathBuf,
    ) -> Self {
        Self {
            udid: udid.into(),
            name: name.to_owned(),
            runtime_version: runtime_version.to_owned(),
            instruments_identifier: instruments_identifier(name, runtime_version),
            state,
            kind,
            log_file,
        }
    }

    pub fn is_booted(&self) -> bool {
        self.state == DeviceState::Booted
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Simulator: {} {} {}>",
            self.instruments_identifier, self.udid, self.state
        )
    }
}

/// `"<name> (<runtime version>)"`, the form used to name a default simulator.
pub fn instruments_identifier(name: &str, runtime_version: &str) -> String {
    format!("{name} ({runtime_version})")
}
