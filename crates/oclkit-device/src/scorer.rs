//! 设备评分模块

use oclkit_core::{DeviceCapability, DevicePreference};
use tracing::info;

use crate::platform::Device;
use crate::probe::{self, CapabilityProbe};

/// 带分数的设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredDevice {
    pub device: Device,
    pub score: i64,
}

/// 一个平台按分数排序并截断后的设备
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedDevices {
    pub devices: Vec<ScoredDevice>,
    /// 保留设备的分数之和
    pub platform_score: i64,
}

impl RankedDevices {
    pub fn into_devices(self) -> Vec<Device> {
        self.devices.into_iter().map(|d| d.device).collect()
    }
}

pub struct DeviceScorer<'a> {
    probe: &'a dyn CapabilityProbe,
}

impl<'a> DeviceScorer<'a> {
    pub fn new(probe: &'a dyn CapabilityProbe) -> Self {
        Self { probe }
    }

    pub fn score(&self, device: &Device, preference: DevicePreference) -> i64 {
        match preference {
            DevicePreference::None => 0,
            DevicePreference::NotConnectedToScreen => {
                if probe::supports(self.probe, device, DeviceCapability::OpenGlInterop) {
                    0
                } else {
                    1
                }
            }
            DevicePreference::ComputeUnits => i64::from(device.compute_units),
            DevicePreference::GlobalMemory => device.global_mem_mib() as i64,
        }
    }

    /// 按分数稳定降序排列并保留前 `max_count` 个设备
    pub fn rank_devices(
        &self,
        devices: &[Device],
        preference: DevicePreference,
        max_count: usize,
    ) -> RankedDevices {
        let mut scored: Vec<ScoredDevice> = devices
            .iter()
            .map(|device| {
                let score = self.score(device, preference);
                info!("The device {} got a score of {}", device.name, score);
                ScoredDevice {
                    device: device.clone(),
                    score,
                }
            })
            .collect();

        // sort_by 是稳定排序，同分设备保持枚举顺序
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(max_count);

        let platform_score = scored.iter().map(|d| d.score).sum();

        RankedDevices {
            devices: scored,
            platform_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{DeviceId, PlatformId};
    use crate::probe::{NoInteropProbe, StaticInteropProbe};
    use oclkit_core::DeviceKind;

    fn device(id: u64, compute_units: u32, global_mem_mib: u64) -> Device {
        Device {
            id: DeviceId(id),
            platform: PlatformId(1),
            name: format!("D{}", id),
            vendor: "Advanced Micro Devices, Inc.".to_string(),
            kind: DeviceKind::Gpu,
            compute_units,
            global_mem_bytes: global_mem_mib * 1024 * 1024,
        }
    }

    fn names(ranked: &RankedDevices) -> Vec<String> {
        ranked.devices.iter().map(|d| d.device.name.clone()).collect()
    }

    #[test]
    fn test_score_formulas() {
        let probe = StaticInteropProbe::new([DeviceId(2)]);
        let scorer = DeviceScorer::new(&probe);

        let plain = device(1, 8, 2048);
        let interop = device(2, 16, 4096);

        assert_eq!(scorer.score(&plain, DevicePreference::NotConnectedToScreen), 1);
        assert_eq!(scorer.score(&interop, DevicePreference::NotConnectedToScreen), 0);
        assert_eq!(scorer.score(&interop, DevicePreference::ComputeUnits), 16);
        assert_eq!(scorer.score(&interop, DevicePreference::GlobalMemory), 4096);
    }

    #[test]
    fn test_global_memory_truncates_to_mib() {
        let probe = NoInteropProbe;
        let scorer = DeviceScorer::new(&probe);
        let mut d = device(1, 1, 0);
        d.global_mem_bytes = 3 * 1024 * 1024 - 1;
        assert_eq!(scorer.score(&d, DevicePreference::GlobalMemory), 2);
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let probe = NoInteropProbe;
        let scorer = DeviceScorer::new(&probe);
        let devices = vec![
            device(1, 4, 0),
            device(2, 16, 0),
            device(3, 4, 0),
            device(4, 8, 0),
            device(5, 16, 0),
        ];

        let ranked = scorer.rank_devices(&devices, DevicePreference::ComputeUnits, usize::MAX);
        assert_eq!(names(&ranked), vec!["D2", "D5", "D4", "D1", "D3"]);
        assert_eq!(ranked.platform_score, 48);
    }

    #[test]
    fn test_platform_score_counts_retained_devices_only() {
        let probe = NoInteropProbe;
        let scorer = DeviceScorer::new(&probe);
        let devices = vec![device(1, 8, 0), device(2, 16, 0), device(3, 2, 0)];

        let ranked = scorer.rank_devices(&devices, DevicePreference::ComputeUnits, 2);
        assert_eq!(names(&ranked), vec!["D2", "D1"]);
        assert_eq!(ranked.platform_score, 24);
    }

    #[test]
    fn test_probe_failure_scores_as_off_screen() {
        let probe = StaticInteropProbe::unavailable();
        let scorer = DeviceScorer::new(&probe);
        assert_eq!(
            scorer.score(&device(1, 1, 0), DevicePreference::NotConnectedToScreen),
            1
        );
    }
}
