//! 执行上下文模块
//!
//! 把选中的设备、可选的外部 OpenGL 上下文句柄和性能分析开关封装为执行上下文。
//! 命令队列和缓冲区由下游的内核调度层负责。

use chrono::{DateTime, Utc};
use oclkit_core::OclKitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

use crate::platform::{Device, PlatformId};

pub type ContextResult<T> = Result<T, ContextError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("An execution context needs at least one device")]
    EmptyDeviceList,
}

impl From<ContextError> for OclKitError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::EmptyDeviceList => OclKitError::EmptyDeviceList,
        }
    }
}

/// 外部原生 OpenGL 上下文句柄，不透明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlContextHandle(pub usize);

impl fmt::Display for GlContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 执行上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub id: Uuid,
    pub platform: PlatformId,
    devices: Vec<Device>,
    graphics_context: Option<GlContextHandle>,
    profiling: bool,
    pub created_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn graphics_context(&self) -> Option<GlContextHandle> {
        self.graphics_context
    }

    /// 创建时提供了外部 OpenGL 上下文
    pub fn supports_graphics_interop(&self) -> bool {
        self.graphics_context.is_some()
    }

    pub fn profiling_enabled(&self) -> bool {
        self.profiling
    }
}

/// 执行上下文工厂 Trait
pub trait ContextFactory: Send + Sync {
    fn create_context(
        &self,
        devices: Vec<Device>,
        graphics_context: Option<GlContextHandle>,
        enable_profiling: bool,
    ) -> ContextResult<ExecutionContext>;
}

/// 默认工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicContextFactory;

impl ContextFactory for BasicContextFactory {
    fn create_context(
        &self,
        devices: Vec<Device>,
        graphics_context: Option<GlContextHandle>,
        enable_profiling: bool,
    ) -> ContextResult<ExecutionContext> {
        let platform = devices
            .first()
            .map(|d| d.platform)
            .ok_or(ContextError::EmptyDeviceList)?;

        let context = ExecutionContext {
            id: Uuid::new_v4(),
            platform,
            devices,
            graphics_context,
            profiling: enable_profiling,
            created_at: Utc::now(),
        };

        info!(
            "Created execution context {} with {} devices (interop: {}, profiling: {})",
            context.id,
            context.devices.len(),
            context.supports_graphics_interop(),
            context.profiling
        );

        Ok(context)
    }
}
