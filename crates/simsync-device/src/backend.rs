use crate::BridgeError;
use simsync_schema::{App, BundleId, Device};
use std::path::{Path, PathBuf};

/// Handle bound to one (device, app path) pair for a single reconciliation.
///
/// Implementations may hold connection state; callers must not share a bridge
/// across invocations.
pub trait InstallBridge {
    fn is_installed(&mut self, bundle_id: &BundleId) -> Result<bool, BridgeError>;

    /// Install the bundle this bridge is bound to.
    fn install(&mut self, app: &App) -> Result<(), BridgeError>;

    fn uninstall(&mut self, bundle_id: &BundleId) -> Result<(), BridgeError>;

    /// Make the installed copy of the bundle available on the local filesystem
    /// and return its directory.
    fn fetch_installed_bundle(&mut self, bundle_id: &BundleId) -> Result<PathBuf, BridgeError>;
}

/// Device listing plus bridge factory for one kind of device subsystem.
pub trait DeviceBackend {
    fn name(&self) -> &str;

    /// Enumerate known devices. Order is stable for a given listing.
    fn list_devices(&self) -> Result<Vec<Device>, BridgeError>;

    fn new_bridge(
        &self,
        device: &Device,
        app_path: &Path,
    ) -> Result<Box<dyn InstallBridge>, BridgeError>;
}

pub fn select_backend(name: &str, state_dir: &Path) -> Result<Box<dyn DeviceBackend>, BridgeError> {
    match name {
        "simctl" => Ok(Box::new(crate::simctl::SimctlBackend::new())),
        "mock" => {
            let mut backend = crate::mock::MockBackend::new(state_dir.join("mock"));
            if let Ok(op) = std::env::var("SIMSYNC_MOCK_FAIL") {
                backend = backend.failing(op.parse()?);
            }
            Ok(Box::new(backend))
        }
        other => Err(BridgeError::BackendUnavailable(other.to_owned())),
    }
}
