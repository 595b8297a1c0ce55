use super::{colorize_state, json_pretty, EXIT_SUCCESS};
use simsync_core::CoreError;
use simsync_device::DeviceBackend;

pub fn run(backend: &dyn DeviceBackend, json: bool) -> Result<u8, String> {
    let devices = backend
        .list_devices()
        .map_err(|e| CoreError::from(e).to_string())?;
    if json {
        println!("{}", json_pretty(&devices)?);
    } else if devices.is_empty() {
        println!("no devices found");
    } else {
        println!("{:<38} {:<14} IDENTIFIER", "UDID", "STATE");
        for device in &devices {
            println!(
                "{:<38} {:<14} {}",
                device.udid.as_str(),
                colorize_state(device.state),
                device.instruments_identifier
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
