use crate::backend::{DeviceBackend, InstallBridge};
use crate::listing::parse_device_list;
use crate::BridgeError;
use simsync_schema::{App, BundleId, Device, DeviceKind, DeviceState, SimulatorKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Operation a [`MockBackend`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    List,
    IsInstalled,
    Install,
    Uninstall,
    Fetch,
}

impl FromStr for MockOp {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Self::List),
            "is_installed" => Ok(Self::IsInstalled),
            "install" => Ok(Self::Install),
            "uninstall" => Ok(Self::Uninstall),
            "fetch" => Ok(Self::Fetch),
            other => Err(BridgeError::Injected(format!(
                "unknown mock operation '{other}'"
            ))),
        }
    }
}

/// Filesystem-backed backend: "installing" copies the bundle under
/// `<root>/devices/<udid>/apps/<bundle-id>.app`.
///
/// Devices come from `<root>/devices.json` (simctl JSON format) when present,
/// otherwise from a built-in pair of simulators.
pub struct MockBackend {
    root: PathBuf,
    fail: Option<MockOp>,
}

impl MockBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fail: None,
        }
    }

    #[must_use]
    pub fn failing(mut self, op: MockOp) -> Self {
        self.fail = Some(op);
        self
    }

    pub fn apps_dir(&self, device: &Device) -> PathBuf {
        self.root
            .join("devices")
            .join(device.udid.as_str())
            .join("apps")
    }

    fn builtin_devices(&self) -> Vec<Device> {
        let host = SimulatorKind::for_host();
        [
            ("MOCK-IPHONE-15", "iPhone 15", DeviceState::Booted),
            ("MOCK-IPAD-PRO", "iPad Pro (11-inch)", DeviceState::Shutdown),
        ]
        .into_iter()
        .map(|(udid, name, state)| {
            Device::new(
                udid,
                name,
                "17.0",
                state,
                DeviceKind::Simulator(host),
                self.root.join("logs").join(udid).join("system.log"),
            )
        })
        .collect()
    }
}

impl DeviceBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
        if self.fail == Some(MockOp::List) {
            return Err(BridgeError::Injected("list".to_owned()));
        }
        let listing = self.root.join("devices.json");
        if listing.is_file() {
            let json = fs::read_to_string(&listing)?;
            parse_device_list(&json, SimulatorKind::for_host())
        } else {
            Ok(self.builtin_devices())
        }
    }

    fn new_bridge(
        &self,
        device: &Device,
        app_path: &Path,
    ) -> Result<Box<dyn InstallBridge>, BridgeError> {
        Ok(Box::new(MockBridge {
            apps_dir: self.apps_dir(device),
            app_path: app_path.to_path_buf(),
            fail: self.fail,
        }))
    }
}

pub struct MockBridge {
    apps_dir: PathBuf,
    app_path: PathBuf,
    fail: Option<MockOp>,
}

impl MockBridge {
    fn installed_path(&self, bundle_id: &BundleId) -> PathBuf {
        self.apps_dir.join(format!("{bundle_id}.app"))
    }

    fn check(&self, op: MockOp) -> Result<(), BridgeError> {
        if self.fail == Some(op) {
            return Err(BridgeError::Injected(format!("{op:?}").to_lowercase()));
        }
        Ok(())
    }
}

impl InstallBridge for MockBridge {
    fn is_installed(&mut self, bundle_id: &BundleId) -> Result<bool, BridgeError> {
        self.check(MockOp::IsInstalled)?;
        Ok(self.installed_path(bundle_id).is_dir())
    }

    fn install(&mut self, app: &App) -> Result<(), BridgeError> {
        self.check(MockOp::Install)?;
        let dest = self.installed_path(app.bundle_identifier());
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        fs::create_dir_all(&dest)?;
        let copied = copy_tree(&self.app_path, &dest)?;
        debug!("mock install copied {copied} files to {}", dest.display());
        Ok(())
    }

    fn uninstall(&mut self, bundle_id: &BundleId) -> Result<(), BridgeError> {
        self.check(MockOp::Uninstall)?;
        let dest = self.installed_path(bundle_id);
        if dest.exists() {
            fs::remove_dir_all(dest)?;
        }
        Ok(())
    }

    fn fetch_installed_bundle(&mut self, bundle_id: &BundleId) -> Result<PathBuf, BridgeError> {
        self.check(MockOp::Fetch)?;
        let dest = self.installed_path(bundle_id);
        if dest.is_dir() {
            Ok(dest)
        } else {
            Err(BridgeError::NotInstalled(bundle_id.to_string()))
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<usize, BridgeError> {
    let mut count = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let ft = entry.file_type()?;

        if ft.is_dir() {
            fs::create_dir_all(&dst_path)?;
            count += copy_tree(&src_path, &dst_path)?;
        } else if ft.is_symlink() {
            #[cfg(unix)]
            std::os::unix::fs::symlink(fs::read_link(&src_path)?, &dst_path)?;
            #[cfg(not(unix))]
            fs::copy(&src_path, &dst_path)?;
            count += 1;
        } else {
            fs::copy(&src_path, &dst_path)?;
            count += 1;
        }
    }
    Ok(count)
}
