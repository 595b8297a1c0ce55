use crate::backend::{DeviceBackend, InstallBridge};
use crate::listing::parse_device_list;
use crate::BridgeError;
use simsync_schema::{App, BundleId, Device, SimulatorKind};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

const XCRUN: &str = "xcrun";

/// Backend driving CoreSimulator through `xcrun simctl`.
pub struct SimctlBackend {
    host: SimulatorKind,
}

impl Default for SimctlBackend {
    fn default() -> Self {
        Self {
            host: SimulatorKind::for_host(),
        }
    }
}

impl SimctlBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn command_line(args: &[&str]) -> String {
    format!("{XCRUN} simctl {}", args.join(" "))
}

fn run_simctl(args: &[&str]) -> Result<Output, BridgeError> {
    debug!("running {}", command_line(args));
    Command::new(XCRUN)
        .arg("simctl")
        .args(args)
        .output()
        .map_err(|source| BridgeError::Spawn {
            command: command_line(args),
            source,
        })
}

/// Run simctl and return stdout, failing on a non-zero exit.
fn run_simctl_checked(args: &[&str]) -> Result<String, BridgeError> {
    let output = run_simctl(args)?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(command_failed(args, &output))
    }
}

fn command_failed(args: &[&str], output: &Output) -> BridgeError {
    BridgeError::CommandFailed {
        command: command_line(args),
        code: output.status.code().unwrap_or(1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    }
}

/// Whether simctl's stderr says the app simply is not there.
fn reports_not_installed(stderr: &str) -> bool {
    let msg = stderr.to_lowercase();
    msg.contains("no such file or directory")
        || msg.contains("not installed")
        || msg.contains("failed to get application container")
}

impl DeviceBackend for SimctlBackend {
    fn name(&self) -> &'static str {
        "simctl"
    }

    fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
        let json = run_simctl_checked(&["list", "devices", "--json"])?;
        parse_device_list(&json, self.host)
    }

    fn new_bridge(
        &self,
        device: &Device,
        app_path: &Path,
    ) -> Result<Box<dyn InstallBridge>, BridgeError> {
        Ok(Box::new(SimctlBridge {
            device: device.clone(),
            app_path: app_path.to_path_buf(),
            booted: device.is_booted(),
        }))
    }
}

pub struct SimctlBridge {
    device: Device,
    app_path: PathBuf,
    booted: bool,
}

impl SimctlBridge {
    /// simctl refuses app operations on a shut-down simulator.
    fn ensure_booted(&mut self) -> Result<(), BridgeError> {
        if self.booted {
            return Ok(());
        }
        let udid = self.device.udid.as_str();
        info!("booting {}", self.device.instruments_identifier);
        let output = run_simctl(&["boot", udid])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.contains("current state: Booted") {
                return Err(command_failed(&["boot", udid], &output));
            }
        }
        run_simctl_checked(&["bootstatus", udid, "-b"])?;
        self.booted = true;
        Ok(())
    }

    fn app_container(&mut self, bundle_id: &BundleId) -> Result<Option<PathBuf>, BridgeError> {
        self.ensure_booted()?;
        let args = [
            "get_app_container",
            self.device.udid.as_str(),
            bundle_id.as_str(),
            "app",
        ];
        let output = run_simctl(&args)?;
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_owned();
            return Ok(Some(PathBuf::from(path)));
        }
        if reports_not_installed(&String::from_utf8_lossy(&output.stderr)) {
            return Ok(None);
        }
        Err(command_failed(&args, &output))
    }
}

impl InstallBridge for SimctlBridge {
    fn is_installed(&mut self, bundle_id: &BundleId) -> Result<bool, BridgeError> {
        Ok(self.app_container(bundle_id)?.is_some())
    }

    fn install(&mut self, app: &App) -> Result<(), BridgeError> {
        self.ensure_booted()?;
        info!(
            "installing {} on {}",
            app.bundle_identifier(),
            self.device.instruments_identifier
        );
        let path = self.app_path.to_string_lossy();
        run_simctl_checked(&["install", self.device.udid.as_str(), &path])?;
        Ok(())
    }

    fn uninstall(&mut self, bundle_id: &BundleId) -> Result<(), BridgeError> {
        self.ensure_booted()?;
        info!(
            "uninstalling {bundle_id} from {}",
            self.device.instruments_identifier
        );
        run_simctl_checked(&["uninstall", self.device.udid.as_str(), bundle_id.as_str()])?;
        Ok(())
    }

    fn fetch_installed_bundle(&mut self, bundle_id: &BundleId) -> Result<PathBuf, BridgeError> {
        // Simulator containers already live on the host filesystem.
        let path = self
            .app_container(bundle_id)?
            .ok_or_else(|| BridgeError::NotInstalled(bundle_id.to_string()))?;
        if !path.is_dir() {
            return Err(BridgeError::InvalidContainer {
                bundle_id: bundle_id.to_string(),
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }
}
