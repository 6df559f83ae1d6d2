//! 平台枚举模块
//!
//! 在构造时一次性枚举运行时上的所有平台和设备，之后只读。

use oclkit_core::{DeviceKind, DeviceTypeFilter, Vendor, VendorFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::runtime::ComputeRuntime;

/// 平台句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformId(pub u64);

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 设备句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 计算设备
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// 所属平台，仅用于查找
    pub platform: PlatformId,
    pub name: String,
    pub vendor: String,
    pub kind: DeviceKind,
    pub compute_units: u32,
    pub global_mem_bytes: u64,
}

impl Device {
    pub fn vendor_kind(&self) -> Option<Vendor> {
        Vendor::from_vendor_string(&self.vendor)
    }

    pub fn global_mem_mib(&self) -> u64 {
        self.global_mem_bytes / (1024 * 1024)
    }
}

/// 计算平台
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub name: String,
    pub vendor: String,
    pub devices: Vec<Device>,
}

impl Platform {
    pub fn vendor_kind(&self) -> Option<Vendor> {
        Vendor::from_vendor_string(&self.vendor)
    }

    /// 设备厂商与平台厂商不一致，例如 Intel 平台上暴露的独立显卡
    pub fn vendor_mismatch(&self, device: &Device) -> bool {
        self.vendor_kind() != device.vendor_kind()
    }
}

/// 平台枚举器
pub struct PlatformEnumerator {
    platforms: Vec<Platform>,
}

impl PlatformEnumerator {
    /// 枚举运行时上的所有平台与设备
    ///
    /// 查询失败不会向上传播：平台列表失败视为没有平台，
    /// 设备列表失败的平台不贡献设备。
    pub fn new(runtime: &dyn ComputeRuntime) -> Self {
        let descriptors = match runtime.platforms() {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!("Failed to list platforms on {} runtime: {}", runtime.name(), e);
                Vec::new()
            }
        };

        let platforms = descriptors
            .into_iter()
            .map(|descriptor| {
                let devices = match runtime.devices(&descriptor) {
                    Ok(devices) => devices,
                    Err(e) => {
                        warn!("Failed to list devices of platform {}: {}", descriptor.name, e);
                        Vec::new()
                    }
                };
                debug!("Platform {} exposes {} devices", descriptor.name, devices.len());

                Platform {
                    id: descriptor.id,
                    devices: devices
                        .into_iter()
                        .map(|d| Device {
                            id: d.id,
                            platform: descriptor.id,
                            name: d.name,
                            vendor: d.vendor,
                            kind: d.kind,
                            compute_units: d.compute_units,
                            global_mem_bytes: d.global_mem_bytes,
                        })
                        .collect(),
                    name: descriptor.name,
                    vendor: descriptor.vendor,
                }
            })
            .collect::<Vec<_>>();

        info!("Enumerated {} platforms on {} runtime", platforms.len(), runtime.name());

        Self { platforms }
    }

    pub fn list_platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn platform_of(&self, device: &Device) -> Option<&Platform> {
        self.platform(device.platform)
    }

    /// 平台上符合类型过滤的设备，保持枚举顺序
    pub fn devices_of_type(&self, platform: &Platform, filter: DeviceTypeFilter) -> Vec<Device> {
        platform
            .devices
            .iter()
            .filter(|d| filter.matches(d.kind))
            .cloned()
            .collect()
    }

    /// 按厂商过滤平台
    ///
    /// `Any` 返回全部平台；否则只返回厂商字符串包含对应子串的第一个平台。
    pub fn filter_by_vendor(&self, filter: VendorFilter) -> Vec<&Platform> {
        match filter.vendor() {
            None => self.platforms.iter().collect(),
            Some(vendor) => self
                .platforms
                .iter()
                .find(|p| p.vendor.contains(vendor.search_token()))
                .into_iter()
                .collect(),
        }
    }
}
