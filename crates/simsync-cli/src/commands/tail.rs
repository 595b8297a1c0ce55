use simsync_core::{booted_device, CoreError};
use simsync_device::DeviceBackend;
use std::process::Command;

/// Follow the booted simulator's system log with `tail -F`.
pub fn run(backend: &dyn DeviceBackend) -> Result<u8, String> {
    let devices = backend
        .list_devices()
        .map_err(|e| CoreError::from(e).to_string())?;
    let device = booted_device(&devices)
        .ok_or_else(|| "no matching device: no simulator is booted".to_owned())?;

    let mut cmd = Command::new("tail");
    cmd.arg("-F").arg(&device.log_file);
    follow(cmd)
}

/// Replaces the current process; only returns on failure.
#[cfg(unix)]
fn follow(mut cmd: Command) -> Result<u8, String> {
    use std::os::unix::process::CommandExt;
    let err = cmd.exec();
    Err(format!("failed to run tail: {err}"))
}

#[cfg(not(unix))]
fn follow(mut cmd: Command) -> Result<u8, String> {
    let status = cmd
        .status()
        .map_err(|e| format!("failed to run tail: {e}"))?;
    Ok(status
        .code()
        .and_then(|c| u8::try_from(c).ok())
        .unwrap_or(1))
}
