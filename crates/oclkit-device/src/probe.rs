//! 设备能力检测模块
//!
//! 检测设备是否支持可选能力（目前只有 OpenGL 互操作）。
//! 各窗口系统的实现放在各自的子模块中，不支持的平台总是报告能力缺失。

use oclkit_core::DeviceCapability;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::platform::{Device, DeviceId};
use crate::runtime::ComputeRuntime;

#[cfg(all(feature = "glx", target_os = "linux"))]
pub mod glx;

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("Graphics subsystem unavailable: {0}")]
    GraphicsSubsystemUnavailable(String),

    #[error("Capability query failed: {0}")]
    Query(String),
}

/// 能力检测 Trait
///
/// 创建原生图形上下文的实现不可重入，并发调用需要由调用方串行化。
pub trait CapabilityProbe: Send + Sync {
    /// 检测器名称
    fn name(&self) -> &'static str;

    /// 设备能否与原生图形上下文共享资源
    fn has_graphics_interop(&self, device: &Device) -> ProbeResult<bool>;
}

/// 设备是否具备某项能力，检测失败视为不具备
pub fn supports(probe: &dyn CapabilityProbe, device: &Device, capability: DeviceCapability) -> bool {
    match capability {
        DeviceCapability::OpenGlInterop => match probe.has_graphics_interop(device) {
            Ok(present) => present,
            Err(e) => {
                warn!(
                    "{} probe failed for device {}, treating capability as absent: {}",
                    probe.name(),
                    device.name,
                    e
                );
                false
            }
        },
    }
}

/// 不支持互操作检测的平台使用的实现
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInteropProbe;

impl CapabilityProbe for NoInteropProbe {
    fn name(&self) -> &'static str {
        "none"
    }

    fn has_graphics_interop(&self, _device: &Device) -> ProbeResult<bool> {
        Ok(false)
    }
}

/// 预先给定互操作设备集合的检测器
#[derive(Debug, Default, Clone)]
pub struct StaticInteropProbe {
    devices: HashSet<DeviceId>,
    available: bool,
}

impl StaticInteropProbe {
    pub fn new(devices: impl IntoIterator<Item = DeviceId>) -> Self {
        Self {
            devices: devices.into_iter().collect(),
            available: true,
        }
    }

    /// 模拟无法创建图形上下文（例如没有显示器）
    pub fn unavailable() -> Self {
        Self {
            devices: HashSet::new(),
            available: false,
        }
    }
}

impl CapabilityProbe for StaticInteropProbe {
    fn name(&self) -> &'static str {
        "static"
    }

    fn has_graphics_interop(&self, device: &Device) -> ProbeResult<bool> {
        if !self.available {
            return Err(ProbeError::GraphicsSubsystemUnavailable(
                "no display available".to_string(),
            ));
        }
        Ok(self.devices.contains(&device.id))
    }
}

/// 当前构建目标上的原生检测器
pub fn native(runtime: Arc<dyn ComputeRuntime>) -> Arc<dyn CapabilityProbe> {
    #[cfg(all(feature = "glx", target_os = "linux"))]
    {
        Arc::new(glx::GlxInteropProbe::new(runtime))
    }

    #[cfg(not(all(feature = "glx", target_os = "linux")))]
    {
        let _ = runtime;
        Arc::new(NoInteropProbe)
    }
}
