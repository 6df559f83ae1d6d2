//! 计算运行时抽象
//!
//! 平台和设备的原始查询都经过 `ComputeRuntime`，
//! 原生驱动 (OpenCL) 与内存运行时实现同一接口。

use oclkit_core::DeviceKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::platform::{DeviceId, PlatformId};

pub mod memory;
#[cfg(feature = "opencl")]
pub mod opencl;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("Driver error {code}: {message}")]
    Driver { code: i32, message: String },

    #[error("Operation not supported by runtime: {0}")]
    Unsupported(String),
}

/// 运行时上报的平台信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub id: PlatformId,
    pub name: String,
    pub vendor: String,
}

/// 运行时上报的设备信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub name: String,
    pub vendor: String,
    pub kind: DeviceKind,
    pub compute_units: u32,
    pub global_mem_bytes: u64,
}

/// 计算运行时 Trait
pub trait ComputeRuntime: Send + Sync {
    /// 运行时名称
    fn name(&self) -> &'static str;

    /// 列出所有平台
    fn platforms(&self) -> RuntimeResult<Vec<PlatformDescriptor>>;

    /// 列出平台上的所有设备
    fn devices(&self, platform: &PlatformDescriptor) -> RuntimeResult<Vec<DeviceDescriptor>>;

    /// 查询能与给定 GLX 上下文关联的设备
    fn devices_for_gl_context(
        &self,
        _platform: PlatformId,
        _gl_context: usize,
        _display: usize,
    ) -> RuntimeResult<Vec<DeviceId>> {
        Err(RuntimeError::Unsupported(format!(
            "{} cannot query devices for a GL context",
            self.name()
        )))
    }
}

/// 编译进来的原生运行时；没有可用驱动时返回一个空的内存运行时
pub fn native() -> Arc<dyn ComputeRuntime> {
    #[cfg(feature = "opencl")]
    {
        Arc::new(opencl::OpenClRuntime::new())
    }

    #[cfg(not(feature = "opencl"))]
    {
        tracing::warn!("oclkit was built without the `opencl` feature, no native platforms available");
        Arc::new(memory::InMemoryRuntime::default())
    }
}
