//! Device and application-bundle model for simsync.
//!
//! This crate defines the inputs to install reconciliation: string newtypes
//! (`Udid`, `BundleId`, `Digest`), the `Device` snapshot reported by a device
//! listing, Info.plist reading (`BundleInfo`), Mach-O slice inspection and
//! device compatibility (`expect_compatible_arch`), and the fail-fast bundle
//! validator (`validate_app`) that produces an immutable `App`.

pub mod arch;
pub mod bundle;
pub mod device;
pub mod types;
pub mod validate;

pub use arch::{binary_arches, expect_compatible_arch, is_compatible, Arch, ArchError};
pub use bundle::{App, BundleError, BundleInfo, APP_EXTENSION, INFO_PLIST};
pub use device::{instruments_identifier, Device, DeviceKind, DeviceState, SimulatorKind};
pub use types::{BundleId, Digest, Udid};
pub use validate::{validate_app, ValidationError};
