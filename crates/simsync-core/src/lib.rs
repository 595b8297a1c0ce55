//! Install reconciliation engine for simsync.
//!
//! This crate ties the device model, digest provider, and install bridges
//! together: `resolve_device` picks one device from a listing, `reconcile`
//! decides between skip / install / uninstall-then-install for a validated app,
//! `RetryPolicy` wraps a whole attempt for transient bridge failures, `Config`
//! supplies the default device and backend, and `DeviceLock` keeps two
//! processes from driving the same device at once.

pub mod concurrency;
pub mod config;
pub mod reconcile;
pub mod resolve;
pub mod retry;

pub use concurrency::DeviceLock;
pub use config::{Config, DEFAULT_BACKEND, DEFAULT_SIMULATOR};
pub use reconcile::{reconcile, InstallOutcome, InstallReport, ReconcileOptions};
pub use resolve::{booted_device, resolve_device};
pub use retry::RetryPolicy;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(#[from] simsync_schema::ValidationError),
    #[error("no matching device: could not find a simulator with name or UDID that matches {0}")]
    NoMatchingDevice(String),
    #[error("bridge error: {0}")]
    Bridge(#[from] simsync_device::BridgeError),
    #[error("digest error: {0}")]
    Digest(#[from] simsync_digest::DigestError),
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Only failures of the device subsystem may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bridge(_))
    }
}
