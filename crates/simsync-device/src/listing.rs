//! Parsing of `xcrun simctl list devices --json`.

use crate::BridgeError;
use serde::Deserialize;
use simsync_schema::{Device, DeviceKind, DeviceState, SimulatorKind};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Simulator models that only run 32-bit code.
const LEGACY_32BIT_MODELS: &[&str] = &["iPhone 4s", "iPhone 5", "iPhone 5c", "iPad 2", "iPad Retina"];

#[derive(Debug, Deserialize)]
struct DeviceList {
    devices: BTreeMap<String, Vec<RawDevice>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDevice {
    udid: String,
    name: String,
    state: String,
    #[serde(default)]
    is_available: Option<bool>,
    /// Pre-Xcode 10 spelling: `"(available)"` / `"(unavailable, ...)"`.
    #[serde(default)]
    availability: Option<String>,
    #[serde(default)]
    log_path: Option<String>,
}

impl RawDevice {
    fn available(&self) -> bool {
        match (self.is_available, self.availability.as_deref()) {
            (Some(flag), _) => flag,
            (None, Some(a)) => !a.contains("unavailable"),
            (None, None) => true,
        }
    }
}

/// Version string for a runtime key such as
/// `com.apple.CoreSimulator.SimRuntime.iOS-17-0` (`17.0`) or `iOS 8.1` (`8.1`).
pub fn runtime_version(key: &str) -> String {
    if let Some((_, version)) = key.rsplit_once(' ') {
        return version.to_owned();
    }
    let last = key.rsplit('.').next().unwrap_or(key);
    match last.split_once('-') {
        Some((_, rest)) => rest.replace('-', "."),
        None => last.to_owned(),
    }
}

fn simulator_kind(name: &str, host: SimulatorKind) -> SimulatorKind {
    if LEGACY_32BIT_MODELS.contains(&name) {
        SimulatorKind::Legacy32
    } else {
        host
    }
}

fn default_log_file(udid: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    PathBuf::from(home)
        .join("Library/Logs/CoreSimulator")
        .join(udid)
        .join("system.log")
}

/// Parse the simctl JSON device list.
///
/// Runtimes are visited in key order and devices in listing order within a
/// runtime, so the result is stable for identical input. Unavailable devices
/// are skipped. `host` is the simulator kind used for 64-bit models.
pub fn parse_device_list(json: &str, host: SimulatorKind) -> Result<Vec<Device>, BridgeError> {
    let list: DeviceList =
        serde_json::from_str(json).map_err(|e| BridgeError::DeviceList(e.to_string()))?;

    let mut devices = Vec::new();
    for (runtime, raw_devices) in &list.devices {
        let version = runtime_version(runtime);
        for raw in raw_devices.iter().filter(|d| d.available()) {
            let log_file = match &raw.log_path {
                Some(dir) => PathBuf::from(dir).join("system.log"),
                None => default_log_file(&raw.udid),
            };
            devices.push(Device::new(
                raw.udid.as_str(),
                &raw.name,
                &version,
                DeviceState::parse(&raw.state),
                DeviceKind::Simulator(simulator_kind(&raw.name, host)),
                log_file,
            ));
        }
    }
    Ok(devices)
}
