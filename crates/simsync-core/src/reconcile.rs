use crate::CoreError;
use serde::Serialize;
use simsync_device::InstallBridge;
use simsync_digest::DigestProvider;
use simsync_schema::{App, Device, Digest};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub force_reinstall: bool,
}

/// What `reconcile` did to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    InstalledFresh,
    ReinstalledForced,
    SkippedUpToDate,
    ReinstalledStale,
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InstalledFresh => "installed",
            Self::ReinstalledForced => "reinstalled (forced)",
            Self::SkippedUpToDate => "already up to date",
            Self::ReinstalledStale => "reinstalled (bundle changed)",
        })
    }
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    pub elapsed: Duration,
    /// Only computed when the app was already installed and not forced.
    pub local_digest: Option<Digest>,
    pub installed_digest: Option<Digest>,
}

/// Bring `device` to a state where it runs exactly `app`.
///
/// The uninstall and install of a reinstall are two separate bridge calls: an
/// interruption between them leaves the app uninstalled.
pub fn reconcile(
    app: &App,
    device: &Device,
    bridge: &mut dyn InstallBridge,
    digester: &dyn DigestProvider,
    options: ReconcileOptions,
) -> Result<InstallReport, CoreError> {
    let started = Instant::now();
    let bundle_id = app.bundle_identifier();

    if !bridge.is_installed(bundle_id)? {
        debug!("{bundle_id} is not installed on {device}; installing");
        bridge.install(app)?;
        return Ok(finish(started, InstallOutcome::InstalledFresh, None, None));
    }

    debug!("{bundle_id} is already installed on {device}");
    if options.force_reinstall {
        debug!("forced reinstall requested");
        reinstall(bridge, app)?;
        return Ok(finish(
            started,
            InstallOutcome::ReinstalledForced,
            None,
            None,
        ));
    }

    let local = digester.digest(app.path())?;
    debug!("local bundle digest: {local}");
    let installed_copy = bridge.fetch_installed_bundle(bundle_id)?;
    let installed = digester.digest(&installed_copy)?;
    debug!(
        "installed bundle digest: {installed} ({})",
        installed_copy.display()
    );

    if local == installed {
        debug!("digests match; skipping install");
        Ok(finish(
            started,
            InstallOutcome::SkippedUpToDate,
            Some(local),
            Some(installed),
        ))
    } else {
        debug!("digests differ; reinstalling");
        reinstall(bridge, app)?;
        Ok(finish(
            started,
            InstallOutcome::ReinstalledStale,
            Some(local),
            Some(installed),
        ))
    }
}

fn finish(
    started: Instant,
    outcome: InstallOutcome,
    local_digest: Option<Digest>,
    installed_digest: Option<Digest>,
) -> InstallReport {
    let elapsed = started.elapsed();
    debug!("{outcome} in {:.3}s", elapsed.as_secs_f64());
    InstallReport {
        outcome,
        elapsed,
        local_digest,
        installed_digest,
    }
}

fn reinstall(bridge: &mut dyn InstallBridge, app: &App) -> Result<(), CoreError> {
    bridge.uninstall(app.bundle_identifier())?;
    bridge.install(app)?;
    Ok(())
}
