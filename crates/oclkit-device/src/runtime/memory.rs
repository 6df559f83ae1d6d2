//! 内存运行时
//!
//! 根据 `HostDescription` 模拟一台主机上的平台与设备，
//! 用于没有驱动的机器上的演练以及测试。

use oclkit_core::{DeviceKind, OclKitError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::{ComputeRuntime, DeviceDescriptor, PlatformDescriptor, RuntimeError, RuntimeResult};
use crate::platform::{DeviceId, PlatformId};
use crate::probe::StaticInteropProbe;

/// 主机描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDescription {
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
    /// 是否有可用的图形显示；为 false 时互操作检测报告图形子系统不可用
    #[serde(default = "default_true")]
    pub display: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HostDescription {
    fn default() -> Self {
        Self {
            platforms: Vec::new(),
            display: true,
        }
    }
}

impl HostDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(mut self, platform: PlatformSpec) -> Self {
        self.platforms.push(platform);
        self
    }

    pub fn without_display(mut self) -> Self {
        self.display = false;
        self
    }

    pub fn from_file(path: &Path) -> oclkit_core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OclKitError::Config(format!("读取主机描述失败: {}", e)))?;
        let description = serde_json::from_str(&content)
            .map_err(|e| OclKitError::Config(format!("解析主机描述失败: {}", e)))?;
        Ok(description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub name: String,
    pub vendor: String,
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
    /// 模拟驱动在查询设备时出错
    #[serde(default)]
    pub fail_device_query: bool,
}

impl PlatformSpec {
    pub fn new(name: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
            devices: Vec::new(),
            fail_device_query: false,
        }
    }

    pub fn device(mut self, device: DeviceSpec) -> Self {
        self.devices.push(device);
        self
    }

    pub fn failing_device_query(mut self) -> Self {
        self.fail_device_query = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    /// 未设置时使用所属平台的厂商
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub kind: DeviceKind,
    #[serde(default)]
    pub compute_units: u32,
    #[serde(default)]
    pub global_mem_bytes: u64,
    #[serde(default)]
    pub graphics_interop: bool,
}

impl DeviceSpec {
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            vendor: None,
            kind,
            compute_units: 0,
            global_mem_bytes: 0,
            graphics_interop: false,
        }
    }

    pub fn gpu(name: impl Into<String>) -> Self {
        Self::new(name, DeviceKind::Gpu)
    }

    pub fn cpu(name: impl Into<String>) -> Self {
        Self::new(name, DeviceKind::Cpu)
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn compute_units(mut self, units: u32) -> Self {
        self.compute_units = units;
        self
    }

    pub fn global_mem_mib(mut self, mib: u64) -> Self {
        self.global_mem_bytes = mib * 1024 * 1024;
        self
    }

    pub fn global_mem_bytes(mut self, bytes: u64) -> Self {
        self.global_mem_bytes = bytes;
        self
    }

    pub fn with_graphics_interop(mut self) -> Self {
        self.graphics_interop = true;
        self
    }
}

struct SimulatedPlatform {
    descriptor: PlatformDescriptor,
    devices: RuntimeResult<Vec<DeviceDescriptor>>,
}

/// 内存运行时
pub struct InMemoryRuntime {
    platforms: Vec<SimulatedPlatform>,
    interop_devices: HashSet<DeviceId>,
    display: bool,
}

impl Default for InMemoryRuntime {
    fn default() -> Self {
        Self::new(HostDescription::default())
    }
}

impl InMemoryRuntime {
    pub fn new(description: HostDescription) -> Self {
        let mut interop_devices = HashSet::new();

        let platforms = description
            .platforms
            .into_iter()
            .enumerate()
            .map(|(i, spec)| {
                let platform_id = Self::platform_id(i);
                let descriptor = PlatformDescriptor {
                    id: platform_id,
                    name: spec.name,
                    vendor: spec.vendor.clone(),
                };

                let devices = if spec.fail_device_query {
                    Err(RuntimeError::Driver {
                        code: -1,
                        message: format!("device query failed on {}", descriptor.name),
                    })
                } else {
                    Ok(spec
                        .devices
                        .into_iter()
                        .enumerate()
                        .map(|(j, device)| {
                            let id = Self::device_id(i, j);
                            if device.graphics_interop {
                                interop_devices.insert(id);
                            }
                            DeviceDescriptor {
                                id,
                                name: device.name,
                                vendor: device.vendor.unwrap_or_else(|| spec.vendor.clone()),
                                kind: device.kind,
                                compute_units: device.compute_units,
                                global_mem_bytes: device.global_mem_bytes,
                            }
                        })
                        .collect())
                };

                SimulatedPlatform { descriptor, devices }
            })
            .collect();

        Self {
            platforms,
            interop_devices,
            display: description.display,
        }
    }

    pub fn from_file(path: &Path) -> oclkit_core::Result<Self> {
        Ok(Self::new(HostDescription::from_file(path)?))
    }

    /// 第 `platform` 个平台的句柄
    pub fn platform_id(platform: usize) -> PlatformId {
        PlatformId(platform as u64 + 1)
    }

    /// 第 `platform` 个平台上第 `device` 个设备的句柄
    pub fn device_id(platform: usize, device: usize) -> DeviceId {
        DeviceId(((platform as u64 + 1) << 32) | (device as u64 + 1))
    }

    /// 与主机描述一致的互操作检测器
    pub fn interop_probe(&self) -> StaticInteropProbe {
        if self.display {
            StaticInteropProbe::new(self.interop_devices.iter().copied())
        } else {
            StaticInteropProbe::unavailable()
        }
    }
}

impl ComputeRuntime for InMemoryRuntime {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn platforms(&self) -> RuntimeResult<Vec<PlatformDescriptor>> {
        Ok(self.platforms.iter().map(|p| p.descriptor.clone()).collect())
    }

    fn devices(&self, platform: &PlatformDescriptor) -> RuntimeResult<Vec<DeviceDescriptor>> {
        self.platforms
            .iter()
            .find(|p| p.descriptor.id == platform.id)
            .ok_or_else(|| RuntimeError::Driver {
                code: -32,
                message: format!("invalid platform {}", platform.id),
            })?
            .devices
            .clone()
    }

    fn devices_for_gl_context(
        &self,
        platform: PlatformId,
        _gl_context: usize,
        _display: usize,
    ) -> RuntimeResult<Vec<DeviceId>> {
        let devices = self
            .platforms
            .iter()
            .find(|p| p.descriptor.id == platform)
            .map(|p| p.devices.clone())
            .unwrap_or_else(|| Ok(Vec::new()))?;

        Ok(devices
            .into_iter()
            .map(|d| d.id)
            .filter(|id| self.interop_devices.contains(id))
            .collect())
    }
}
