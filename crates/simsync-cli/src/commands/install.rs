use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use simsync_core::{
    reconcile, resolve_device, Config, CoreError, DeviceLock, InstallReport, ReconcileOptions,
    RetryPolicy,
};
use simsync_device::DeviceBackend;
use simsync_digest::TreeDigester;
use simsync_schema::{validate_app, App, Device};
use std::path::Path;
use tracing::{debug, info};

pub struct InstallRequest<'a> {
    pub app: &'a Path,
    pub device: Option<&'a str>,
    pub force: bool,
    pub retry: RetryPolicy,
}

pub fn run(
    backend: &dyn DeviceBackend,
    config: &Config,
    state_dir: &Path,
    request: &InstallRequest<'_>,
    json: bool,
) -> Result<u8, String> {
    let pb = if json {
        None
    } else {
        Some(spinner(&format!("installing {}...", request.app.display())))
    };

    let result = install(backend, config, state_dir, request);

    let (device, app, report) = match result {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, &format!("{} in {:.2}s", r.2.outcome, r.2.elapsed.as_secs_f64()));
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "install failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "app": app.path(),
            "bundle_id": app.bundle_identifier(),
            "executable": app.executable_path(),
            "arches": app.arches(),
            "device": {
                "udid": device.udid,
                "instruments_identifier": device.instruments_identifier,
            },
            "outcome": report.outcome,
            "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "local_digest": report.local_digest,
            "installed_digest": report.installed_digest,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} {} on {} ({})",
            app.bundle_identifier(),
            report.outcome,
            device.instruments_identifier,
            device.udid
        );
    }
    Ok(EXIT_SUCCESS)
}

/// Resolve and validate once, hold the device lock, then reconcile under the
/// retry policy. Only the bridge work is repeated.
fn install(
    backend: &dyn DeviceBackend,
    config: &Config,
    state_dir: &Path,
    request: &InstallRequest<'_>,
) -> Result<(Device, App, InstallReport), CoreError> {
    let devices = backend.list_devices()?;
    let device = resolve_device(request.device, &config.default_device, &devices)?;
    let app = validate_app(request.app, &device)?;

    let _lock = if let Some(lock) = DeviceLock::try_acquire(state_dir, &device.udid)? {
        lock
    } else {
        info!(
            "waiting for another simsync process to finish with {}",
            device.instruments_identifier
        );
        DeviceLock::acquire(state_dir, &device.udid)?
    };

    let digester = TreeDigester::new();
    let options = ReconcileOptions {
        force_reinstall: request.force,
    };
    let report = request.retry.run(|attempt| {
        if attempt > 1 {
            debug!("reconcile attempt {attempt}");
        }
        let mut bridge = backend.new_bridge(&device, app.path())?;
        reconcile(&app, &device, bridge.as_mut(), &digester, options)
    })?;
    Ok((device, app, report))
}
