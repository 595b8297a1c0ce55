use crate::arch::{expect_compatible_arch, ArchError};
use crate::bundle::{App, BundleError, BundleInfo, APP_EXTENSION};
use crate::device::Device;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// The one error kind the bundle validator produces. Every variant renders as a
/// single actionable line.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("expected '{0}' to exist")]
    Missing(String),
    #[error("expected '{0}' to be a directory")]
    NotADirectory(String),
    #[error("expected '{0}' to end in .app")]
    WrongExtension(String),
    #[error("{0}")]
    MalformedBundle(#[source] BundleError),
    #[error("{0}")]
    IncompatibleArchitecture(#[source] ArchError),
}

/// Validate that `path` is a well-formed app bundle runnable on `device`.
///
/// Checks run in a fixed order and stop at the first failure: existence,
/// directory, `.app` extension, Info.plist identity, executable architecture.
pub fn validate_app(path: &Path, device: &Device) -> Result<App, ValidationError> {
    let shown = path.display().to_string();

    if !path.exists() {
        return Err(ValidationError::Missing(shown));
    }
    if !path.is_dir() {
        return Err(ValidationError::NotADirectory(shown));
    }
    if path.extension().and_then(|e| e.to_str()) != Some(APP_EXTENSION) {
        return Err(ValidationError::WrongExtension(shown));
    }

    let info = BundleInfo::read(path).map_err(ValidationError::MalformedBundle)?;
    let executable = path.join(&info.executable_name);
    if !executable.is_file() {
        return Err(ValidationError::MalformedBundle(
            BundleError::MissingExecutable(executable.display().to_string()),
        ));
    }
    let arches = expect_compatible_arch(&executable, device).map_err(|e| match e {
        ArchError::Unreadable { path, source } => {
            ValidationError::MalformedBundle(BundleError::UnreadableExecutable { path, source })
        }
        other => ValidationError::IncompatibleArchitecture(other),
    })?;

    debug!(
        "validated {} ({}) executable '{}'",
        shown, info.bundle_id, info.executable_name
    );
    Ok(App::new(path.to_path_buf(), info, arches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::fixtures::thin;
    use crate::arch::Arch;
    use crate::device::{DeviceKind, DeviceState, SimulatorKind};
    use goblin::mach::cputype::{CPU_TYPE_ARM64, CPU_TYPE_X86, CPU_TYPE_X86_64};
    use std::path::PathBuf;

    fn sim(kind: SimulatorKind) -> Device {
        Device::new(
            "UDID-VALIDATE",
            "iPhone 15",
            "17.0",
            DeviceState::Booted,
            DeviceKind::Simulator(kind),
            PathBuf::from("/tmp/system.log"),
        )
    }

    fn intel_sim() -> Device {
        sim(SimulatorKind::Intel)
    }

    fn make_bundle(root: &Path, name: &str, binary: &[u8]) -> PathBuf {
        let bundle = root.join(name);
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(
            bundle.join("Info.plist"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
  <key>CFBundleIdentifier</key><string>com.example.Demo</string>
  <key>CFBundleExecutable</key><string>Demo</string>
</dict>
</plist>
"#,
        )
        .unwrap();
        std::fs::write(bundle.join("Demo"), binary).unwrap();
        bundle
    }

    #[test]
    fn valid_bundle_produces_app() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Demo.app", &thin(CPU_TYPE_X86_64, 3));

        let app = validate_app(&bundle, &intel_sim()).unwrap();
        assert_eq!(app.bundle_identifier(), "com.example.Demo");
        assert_eq!(app.executable_name(), "Demo");
        assert_eq!(app.executable_path(), bundle.join("Demo"));
        assert_eq!(app.arches(), &[Arch::X86_64]);
    }

    #[test]
    fn existence_checked_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nothing-here.zip");
        let err = validate_app(&missing, &intel_sim()).unwrap_err();
        assert!(matches!(err, ValidationError::Missing(_)));
        assert!(err.to_string().contains("to exist"));
    }

    #[test]
    fn file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Demo.app");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            validate_app(&file, &intel_sim()),
            Err(ValidationError::NotADirectory(_))
        ));
    }

    #[test]
    fn directory_without_app_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Demo.bundle", &thin(CPU_TYPE_X86_64, 3));
        let err = validate_app(&bundle, &intel_sim()).unwrap_err();
        assert!(matches!(err, ValidationError::WrongExtension(_)));
        assert!(err.to_string().ends_with("to end in .app"));
    }

    #[test]
    fn malformed_metadata_becomes_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Empty.app");
        std::fs::create_dir_all(&bundle).unwrap();
        let err = validate_app(&bundle, &intel_sim()).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBundle(_)));
        assert!(err.to_string().contains("Info.plist"));
    }

    #[test]
    fn incompatible_architecture_becomes_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Demo.app", &thin(CPU_TYPE_ARM64, 0));
        let err = validate_app(&bundle, &intel_sim()).unwrap_err();
        assert!(matches!(err, ValidationError::IncompatibleArchitecture(_)));
        assert!(err.to_string().contains("arm64"));
    }

    #[test]
    fn missing_executable_is_malformed_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Demo.app", b"");
        std::fs::remove_file(bundle.join("Demo")).unwrap();
        let err = validate_app(&bundle, &intel_sim()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MalformedBundle(BundleError::MissingExecutable(_))
        ));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn executable_directory_is_malformed_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Demo.app", b"");
        std::fs::remove_file(bundle.join("Demo")).unwrap();
        std::fs::create_dir(bundle.join("Demo")).unwrap();
        assert!(matches!(
            validate_app(&bundle, &intel_sim()),
            Err(ValidationError::MalformedBundle(_))
        ));
    }

    #[test]
    fn i386_bundle_runs_on_every_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Old.app", &thin(CPU_TYPE_X86, 3));

        for kind in [
            SimulatorKind::Legacy32,
            SimulatorKind::Intel,
            SimulatorKind::AppleSilicon,
        ] {
            let app = validate_app(&bundle, &sim(kind)).unwrap();
            assert_eq!(app.arches(), &[Arch::I386]);
        }
    }

    #[test]
    fn i386_bundle_rejected_on_physical_device() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = make_bundle(dir.path(), "Old.app", &thin(CPU_TYPE_X86, 3));
        let mut phone = intel_sim();
        phone.kind = DeviceKind::Physical;
        let err = validate_app(&bundle, &phone).unwrap_err();
        assert!(matches!(err, ValidationError::IncompatibleArchitecture(_)));
        assert!(err.to_string().contains("[i386]"));
    }
}
