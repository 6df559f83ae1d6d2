//! Select 命令

use anyhow::Result;
use oclkit_core::OclKitConfig;
use oclkit_device::{ComputeManager, Device, GlContextHandle};
use oclkit_timing::{RuntimeMeasurement, RuntimeMeasurementsManager};
use serde::Serialize;

#[derive(Serialize)]
struct SelectReport<'a> {
    context_id: String,
    platform: &'a str,
    vendor: &'a str,
    platform_score: i64,
    vendor_mismatch: bool,
    graphics_interop: bool,
    profiling: bool,
    devices: &'a [Device],
    timings: Vec<&'a RuntimeMeasurement>,
}

/// 解析十进制或 `0x` 开头的十六进制句柄
pub fn parse_handle(value: &str) -> Result<usize, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid handle {}: {}", value, e))
}

pub fn run(
    config: &OclKitConfig,
    tokens: &[String],
    gl_context: Option<usize>,
    profile: bool,
    json: bool,
) -> Result<()> {
    let manager = ComputeManager::instance();

    let mut criteria = config.default_criteria();
    criteria.apply_args(tokens);
    tracing::debug!("Selecting devices with {:?}", criteria);

    let profiling = profile || config.context.enable_profiling;
    let mut timings = RuntimeMeasurementsManager::new();
    if profiling {
        timings.enable();
    }

    let selection = timings.time("selection", || manager.select_devices(&criteria))?;
    let context = timings.time("context", || {
        manager.create_context_from_devices(
            selection.devices.clone(),
            gl_context.map(GlContextHandle),
            profiling,
        )
    })?;

    let mut recorded: Vec<_> = ["selection", "context"]
        .iter()
        .filter_map(|name| timings.timing(name).ok())
        .collect();
    recorded.sort_by(|a, b| a.name().cmp(b.name()));

    if json {
        let report = SelectReport {
            context_id: context.id.to_string(),
            platform: &selection.platform_name,
            vendor: &selection.vendor,
            platform_score: selection.platform_score,
            vendor_mismatch: selection.vendor_mismatch,
            graphics_interop: context.supports_graphics_interop(),
            profiling: context.profiling_enabled(),
            devices: context.devices(),
            timings: recorded,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Selected platform: {} ({})", selection.platform_name, selection.vendor);
    println!("Platform score: {}", selection.platform_score);
    if selection.vendor_mismatch {
        println!("Note: the platform exposes devices from another vendor");
    }
    println!("Execution context {}:", context.id);
    for (i, device) in context.devices().iter().enumerate() {
        println!(
            "  Device {}: [{}] {} - {} compute units, {} MiB",
            i,
            device.kind,
            device.name,
            device.compute_units,
            device.global_mem_mib()
        );
    }
    if let Some(handle) = context.graphics_context() {
        println!("Sharing OpenGL context {}", handle);
    }
    if profiling {
        for measurement in recorded {
            println!("{}", measurement);
        }
    }

    Ok(())
}
