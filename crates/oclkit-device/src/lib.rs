//! oclkit Device - 计算设备选择
//!
//! 枚举计算平台和设备，检测可选能力，按偏好评分，
//! 选出最佳平台及其设备子集并封装为执行上下文。

pub mod context;
pub mod manager;
pub mod platform;
pub mod probe;
pub mod runtime;
pub mod scorer;
pub mod selector;

pub use context::{BasicContextFactory, ContextError, ContextFactory, ExecutionContext, GlContextHandle};
pub use manager::ComputeManager;
pub use platform::{Device, DeviceId, Platform, PlatformEnumerator, PlatformId};
pub use probe::{CapabilityProbe, NoInteropProbe, ProbeError, StaticInteropProbe};
pub use runtime::memory::{DeviceSpec, HostDescription, InMemoryRuntime, PlatformSpec};
pub use runtime::{ComputeRuntime, DeviceDescriptor, PlatformDescriptor, RuntimeError};
pub use scorer::{DeviceScorer, RankedDevices, ScoredDevice};
pub use selector::{PlatformCandidate, PlatformSelector, Selection, SelectionError};
