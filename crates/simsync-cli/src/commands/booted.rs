use super::{json_pretty, EXIT_SUCCESS};
use simsync_core::{booted_device, CoreError};
use simsync_device::DeviceBackend;

pub fn run(backend: &dyn DeviceBackend, json: bool) -> Result<u8, String> {
    let devices = backend
        .list_devices()
        .map_err(|e| CoreError::from(e).to_string())?;
    let device = booted_device(&devices);
    if json {
        println!("{}", json_pretty(&device)?);
    } else if let Some(device) = device {
        println!("{device}");
    } else {
        println!("No simulator is booted.");
    }
    Ok(EXIT_SUCCESS)
}
