//! 子命令实现

pub mod init;
pub mod platforms;
pub mod select;
