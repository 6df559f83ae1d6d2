//! Platforms 命令

use anyhow::Result;
use oclkit_core::DeviceCapability;
use oclkit_device::{ComputeManager, probe};

pub fn run(json: bool) -> Result<()> {
    let manager = ComputeManager::instance();
    let platforms = manager.platforms();

    if json {
        println!("{}", serde_json::to_string_pretty(platforms)?);
        return Ok(());
    }

    if platforms.is_empty() {
        println!("No compute platforms found ({} runtime).", manager.runtime_name());
        return Ok(());
    }

    println!("{} platforms on the {} runtime:\n", platforms.len(), manager.runtime_name());
    for (i, platform) in platforms.iter().enumerate() {
        println!("Platform {}: {} ({})", i, platform.name, platform.vendor);
        if platform.devices.is_empty() {
            println!("  (no devices)");
        }
        for (j, device) in platform.devices.iter().enumerate() {
            let interop = probe::supports(manager.probe(), device, DeviceCapability::OpenGlInterop);
            let mismatch = if platform.vendor_mismatch(device) {
                "  [vendor mismatch]"
            } else {
                ""
            };
            println!(
                "  Device {}: [{}] {} ({}) - {} compute units, {} MiB, OpenGL interop: {}{}",
                j,
                device.kind,
                device.name,
                device.vendor,
                device.compute_units,
                device.global_mem_mib(),
                if interop { "yes" } else { "no" },
                mismatch
            );
        }
        println!();
    }

    Ok(())
}
