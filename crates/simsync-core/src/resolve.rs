use crate::CoreError;
use simsync_schema::Device;
use tracing::{debug, warn};

/// Pick the device an install targets.
///
/// With no explicit request the default identifier is matched against
/// instruments identifiers only. An explicit request matches either a UDID or
/// an instruments identifier. When several devices match, the first in listing
/// order wins.
pub fn resolve_device(
    requested: Option<&str>,
    default_id: &str,
    devices: &[Device],
) -> Result<Device, CoreError> {
    let mut matches: Vec<&Device> = match requested {
        None => devices
            .iter()
            .filter(|d| d.instruments_identifier == default_id)
            .collect(),
        Some(id) => devices
            .iter()
            .filter(|d| d.udid == id || d.instruments_identifier == id)
            .collect(),
    };

    if matches.is_empty() {
        return Err(CoreError::NoMatchingDevice(match requested {
            Some(id) => format!("'{id}'"),
            None => format!("the default '{default_id}'"),
        }));
    }

    if matches.len() > 1 {
        let udids: Vec<&str> = matches.iter().map(|d| d.udid.as_str()).collect();
        warn!(
            "{} devices match '{}', using the first: {}",
            matches.len(),
            requested.unwrap_or(default_id),
            udids.join(", ")
        );
    }

    let device = matches.remove(0).clone();
    debug!("resolved device {device}");
    Ok(device)
}

/// First booted device in listing order.
pub fn booted_device(devices: &[Device]) -> Option<&Device> {
    devices.iter().find(|d| d.is_booted())
}
