//! oclkit Timing - 运行时间测量
//!
//! 按名称记录计时样本并统计总和、均值、标准差与极值。

pub mod manager;
pub mod measurement;

pub use manager::{RuntimeMeasurementsManager, TimingError, TimingResult};
pub use measurement::RuntimeMeasurement;
