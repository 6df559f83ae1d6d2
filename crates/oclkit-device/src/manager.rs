//! 计算管理器
//!
//! 持有枚举结果、能力检测器与上下文工厂，提供设备选择与上下文创建的入口。
//! 进程级实例在首次访问时于互斥锁内构造，`shutdown` 之后可以重新构造。

use oclkit_core::{DeviceCriteria, OclKitConfig, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use crate::context::{BasicContextFactory, ContextFactory, ExecutionContext, GlContextHandle};
use crate::platform::{Device, Platform, PlatformEnumerator};
use crate::probe::{self, CapabilityProbe};
use crate::runtime::memory::{HostDescription, InMemoryRuntime};
use crate::runtime::{self, ComputeRuntime};
use crate::selector::{PlatformCandidate, PlatformSelector, Selection, SelectionResult};

static INSTANCE: Mutex<Option<Arc<ComputeManager>>> = Mutex::new(None);

pub struct ComputeManager {
    runtime: Arc<dyn ComputeRuntime>,
    probe: Arc<dyn CapabilityProbe>,
    factory: Arc<dyn ContextFactory>,
    enumerator: PlatformEnumerator,
}

impl ComputeManager {
    /// 枚举运行时上的平台，之后不再重新枚举
    pub fn new(runtime: Arc<dyn ComputeRuntime>, probe: Arc<dyn CapabilityProbe>) -> Self {
        let enumerator = PlatformEnumerator::new(runtime.as_ref());
        Self {
            runtime,
            probe,
            factory: Arc::new(BasicContextFactory),
            enumerator,
        }
    }

    pub fn native() -> Self {
        let runtime = runtime::native();
        let probe = probe::native(runtime.clone());
        Self::new(runtime, probe)
    }

    pub fn simulated(description: HostDescription) -> Self {
        let runtime = InMemoryRuntime::new(description);
        let probe = Arc::new(runtime.interop_probe());
        Self::new(Arc::new(runtime), probe)
    }

    pub fn from_config(config: &OclKitConfig) -> Result<Self> {
        match &config.runtime.host_description {
            Some(path) => {
                info!("Using simulated host from {}", path.display());
                Ok(Self::simulated(HostDescription::from_file(path)?))
            }
            None => Ok(Self::native()),
        }
    }

    pub fn with_factory(mut self, factory: Arc<dyn ContextFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// 进程级实例，首次调用时使用原生运行时构造
    pub fn instance() -> Arc<Self> {
        let mut instance = INSTANCE.lock().unwrap_or_else(PoisonError::into_inner);
        instance.get_or_insert_with(|| Arc::new(Self::native())).clone()
    }

    /// 用给定的管理器替换进程级实例
    pub fn install(manager: Self) -> Arc<Self> {
        let manager = Arc::new(manager);
        let mut instance = INSTANCE.lock().unwrap_or_else(PoisonError::into_inner);
        *instance = Some(manager.clone());
        manager
    }

    /// 释放进程级实例，下次访问时重新构造
    pub fn shutdown() {
        let mut instance = INSTANCE.lock().unwrap_or_else(PoisonError::into_inner);
        if instance.take().is_some() {
            info!("Compute manager shut down");
        }
    }

    pub fn runtime_name(&self) -> &'static str {
        self.runtime.name()
    }

    pub fn platforms(&self) -> &[Platform] {
        self.enumerator.list_platforms()
    }

    pub fn enumerator(&self) -> &PlatformEnumerator {
        &self.enumerator
    }

    pub fn probe(&self) -> &dyn CapabilityProbe {
        self.probe.as_ref()
    }

    fn selector(&self) -> PlatformSelector<'_> {
        PlatformSelector::new(&self.enumerator, self.probe.as_ref())
    }

    pub fn candidates(&self, criteria: &DeviceCriteria) -> SelectionResult<Vec<PlatformCandidate>> {
        self.selector().candidates(criteria)
    }

    pub fn select_devices(&self, criteria: &DeviceCriteria) -> SelectionResult<Selection> {
        self.selector().select(criteria)
    }

    pub fn create_context(&self, criteria: &DeviceCriteria) -> Result<ExecutionContext> {
        self.create_context_with(criteria, None, false)
    }

    pub fn create_context_with(
        &self,
        criteria: &DeviceCriteria,
        graphics_context: Option<GlContextHandle>,
        enable_profiling: bool,
    ) -> Result<ExecutionContext> {
        let selection = self.select_devices(criteria)?;
        self.create_context_from_devices(selection.devices, graphics_context, enable_profiling)
    }

    pub fn create_shared_context(
        &self,
        criteria: &DeviceCriteria,
        graphics_context: Option<GlContextHandle>,
        enable_profiling: bool,
    ) -> Result<Arc<ExecutionContext>> {
        self.create_context_with(criteria, graphics_context, enable_profiling)
            .map(Arc::new)
    }

    /// 用进程参数覆盖 `defaults` 后选择设备
    ///
    /// `argv` 与 `std::env::args()` 一致，第一个元素是程序名。
    pub fn create_context_from_args<S: AsRef<str>>(
        &self,
        argv: &[S],
        defaults: &mut DeviceCriteria,
    ) -> Result<ExecutionContext> {
        defaults.apply_args(argv.get(1..).unwrap_or(&[]));
        self.create_context(defaults)
    }

    /// 跳过选择，直接用调用方给定的设备
    pub fn create_context_for_device(
        &self,
        device: Device,
        graphics_context: Option<GlContextHandle>,
        enable_profiling: bool,
    ) -> Result<ExecutionContext> {
        self.create_context_from_devices(vec![device], graphics_context, enable_profiling)
    }

    pub fn create_context_from_devices(
        &self,
        devices: Vec<Device>,
        graphics_context: Option<GlContextHandle>,
        enable_profiling: bool,
    ) -> Result<ExecutionContext> {
        Ok(self
            .factory
            .create_context(devices, graphics_context, enable_profiling)?)
    }
}
