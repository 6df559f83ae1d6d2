//! 平台选择模块
//!
//! 过滤平台与设备、评分、处理厂商不一致，最终选出一个平台及其设备子集。

use oclkit_core::{DeviceCriteria, DevicePreference, DeviceTypeFilter, OclKitError};
use tracing::{debug, info};

use crate::platform::{Device, Platform, PlatformEnumerator, PlatformId};
use crate::probe::{self, CapabilityProbe};
use crate::scorer::DeviceScorer;

pub type SelectionResult<T> = Result<T, SelectionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// 运行时报告主机上没有任何平台
    #[error("No compute platforms are installed on this host")]
    NoPlatformsInstalled,

    /// 有平台，但没有平台满足条件；放宽条件后可以重试
    #[error("No platform satisfies the device criteria")]
    NoValidPlatforms,
}

impl From<SelectionError> for OclKitError {
    fn from(e: SelectionError) -> Self {
        match e {
            SelectionError::NoPlatformsInstalled => OclKitError::NoPlatformsInstalled,
            SelectionError::NoValidPlatforms => OclKitError::NoValidPlatforms,
        }
    }
}

/// 通过过滤的候选平台
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCandidate {
    pub platform: PlatformId,
    pub name: String,
    pub vendor: String,
    /// 满足类型与能力条件的设备，保持枚举顺序
    pub accepted: Vec<Device>,
    /// 评分排序并截断后保留的设备；偏好为 None 时与 `accepted` 相同
    pub retained: Vec<Device>,
    /// 保留设备的分数之和；偏好为 None 时为 0
    pub platform_score: i64,
    pub vendor_mismatch: bool,
}

/// 选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub platform: PlatformId,
    pub platform_name: String,
    pub vendor: String,
    pub devices: Vec<Device>,
    pub platform_score: i64,
    pub vendor_mismatch: bool,
}

pub struct PlatformSelector<'a> {
    enumerator: &'a PlatformEnumerator,
    probe: &'a dyn CapabilityProbe,
}

impl<'a> PlatformSelector<'a> {
    pub fn new(enumerator: &'a PlatformEnumerator, probe: &'a dyn CapabilityProbe) -> Self {
        Self { enumerator, probe }
    }

    /// 过滤并评分后的候选平台，按枚举顺序排列
    pub fn candidates(&self, criteria: &DeviceCriteria) -> SelectionResult<Vec<PlatformCandidate>> {
        if self.enumerator.is_empty() {
            return Err(SelectionError::NoPlatformsInstalled);
        }
        info!("Found {} compute platforms", self.enumerator.list_platforms().len());

        let platforms = self.enumerator.filter_by_vendor(criteria.platform);
        info!("{} platforms selected for inspection", platforms.len());

        match criteria.device_type {
            DeviceTypeFilter::Any => info!("Looking for all types of devices"),
            DeviceTypeFilter::Gpu => info!("Looking for GPU devices only"),
            DeviceTypeFilter::Cpu => info!("Looking for CPU devices only"),
        }

        let scorer = DeviceScorer::new(self.probe);
        let max_count = criteria.device_max_count.max(1);

        let candidates = platforms
            .into_iter()
            .filter_map(|platform| {
                let accepted = self.accepted_devices(platform, criteria);
                if accepted.is_empty() {
                    return None;
                }

                let vendor_mismatch = accepted.iter().any(|d| platform.vendor_mismatch(d));
                if vendor_mismatch {
                    info!("A device-platform mismatch was detected on {}", platform.name);
                }

                let (retained, platform_score) = match criteria.preference {
                    DevicePreference::None => (accepted.clone(), 0),
                    preference => {
                        let ranked = scorer.rank_devices(&accepted, preference, max_count);
                        let platform_score = ranked.platform_score;
                        info!("The platform {} got a score of {}", platform.name, platform_score);
                        (ranked.into_devices(), platform_score)
                    }
                };

                Some(PlatformCandidate {
                    platform: platform.id,
                    name: platform.name.clone(),
                    vendor: platform.vendor.clone(),
                    accepted,
                    retained,
                    platform_score,
                    vendor_mismatch,
                })
            })
            .collect();

        Ok(candidates)
    }

    /// 选出最佳平台及其设备
    pub fn select(&self, criteria: &DeviceCriteria) -> SelectionResult<Selection> {
        let candidates = self.candidates(criteria)?;
        let min_count = criteria.device_min_count.max(1);

        let mut best: Option<&PlatformCandidate> = None;
        for candidate in &candidates {
            if candidate.accepted.len() < min_count {
                debug!(
                    "Platform {} has {} devices, fewer than the required {}",
                    candidate.name,
                    candidate.accepted.len(),
                    min_count
                );
                continue;
            }

            best = match best {
                None => Some(candidate),
                Some(current) if current.vendor_mismatch && !candidate.vendor_mismatch => {
                    Some(candidate)
                }
                Some(current)
                    if current.vendor_mismatch == candidate.vendor_mismatch
                        && candidate.platform_score > current.platform_score =>
                {
                    Some(candidate)
                }
                current => current,
            };
        }

        let best = best.ok_or(SelectionError::NoValidPlatforms)?;

        let mut devices = best.retained.clone();
        devices.truncate(criteria.device_max_count.max(1));

        info!("The platform {} was selected as the best platform", best.name);
        info!("A total of {} devices were selected for the context from this platform:", devices.len());
        for (i, device) in devices.iter().enumerate() {
            info!("Device {}: {}", i, device.name);
        }

        Ok(Selection {
            platform: best.platform,
            platform_name: best.name.clone(),
            vendor: best.vendor.clone(),
            devices,
            platform_score: best.platform_score,
            vendor_mismatch: best.vendor_mismatch,
        })
    }

    /// 满足类型条件以及全部必需能力的设备
    fn accepted_devices(&self, platform: &Platform, criteria: &DeviceCriteria) -> Vec<Device> {
        let devices = self.enumerator.devices_of_type(platform, criteria.device_type);
        debug!("{} devices found for platform {}", devices.len(), platform.name);

        devices
            .into_iter()
            .filter(|device| {
                let accepted = criteria
                    .capabilities
                    .iter()
                    .all(|&capability| probe::supports(self.probe, device, capability));
                debug!(
                    "Device {} was {}",
                    device.name,
                    if accepted { "accepted" } else { "rejected" }
                );
                accepted
            })
            .collect()
    }
}
