//! oclkit Core - 核心类型和抽象
//!
//! 提供设备选择条件、错误处理、配置等基础功能。

pub mod config;
pub mod config_loader;
pub mod criteria;
pub mod error;

pub use config::*;
pub use criteria::*;
pub use error::*;
