//! 统一错误处理

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OclKitError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("主机上没有安装任何计算平台")]
    NoPlatformsInstalled,

    #[error("没有满足设备条件的计算平台")]
    NoValidPlatforms,

    #[error("执行上下文至少需要一个设备")]
    EmptyDeviceList,
}

pub type Result<T> = std::result::Result<T, OclKitError>;
