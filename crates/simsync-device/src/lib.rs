//! Device listing and install bridges for simsync.
//!
//! This crate implements the device-facing layer: the `DeviceBackend` trait
//! (enumerate devices, open a bridge) and the `InstallBridge` trait
//! (is-installed / install / uninstall / fetch installed copy), with a `simctl`
//! backend driving `xcrun simctl` and a filesystem-backed `mock` backend.
//! Also parses the simctl JSON device list and checks host prerequisites.

pub mod backend;
pub mod listing;
pub mod mock;
pub mod prereq;
pub mod simctl;

pub use backend::{select_backend, DeviceBackend, InstallBridge};
pub use listing::parse_device_list;
pub use mock::{MockBackend, MockOp};
pub use prereq::{check_simctl_prereqs, format_missing, MissingPrereq};
pub use simctl::SimctlBackend;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("could not parse device list: {0}")]
    DeviceList(String),
    #[error("backend '{0}' is not available on this system")]
    BackendUnavailable(String),
    #[error("app '{0}' is not installed")]
    NotInstalled(String),
    #[error("installed container for '{bundle_id}' is not a directory: {path}")]
    InvalidContainer { bundle_id: String, path: String },
    #[error("injected failure: {0}")]
    Injected(String),
}
