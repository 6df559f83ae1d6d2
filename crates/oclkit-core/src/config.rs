//! 配置管理

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::criteria::DeviceCriteria;

/// 主配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OclKitConfig {
    /// 默认设备选择条件
    #[serde(default)]
    pub criteria: CriteriaSection,
    /// 执行上下文配置
    #[serde(default)]
    pub context: ContextSection,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingSection,
    /// 计算运行时配置
    #[serde(default)]
    pub runtime: RuntimeSection,
}

/// 默认设备选择条件
///
/// 取值与命令行参数相同，例如 `"gpu"`、`"nvidia"`、`"compute-units"`。
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CriteriaSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_min_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_max_count: Option<usize>,
}

impl CriteriaSection {
    pub fn from_criteria(criteria: &DeviceCriteria) -> Self {
        Self {
            device: Some(criteria.device_type.as_token().to_string()),
            platform: Some(criteria.platform.as_token().to_string()),
            capabilities: criteria
                .capabilities
                .iter()
                .map(|c| c.as_token().to_string())
                .collect(),
            preference: Some(criteria.preference.as_token().to_string()),
            device_min_count: Some(criteria.device_min_count),
            device_max_count: (criteria.device_max_count != usize::MAX)
                .then_some(criteria.device_max_count),
        }
    }
}

/// 执行上下文配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContextSection {
    #[serde(default)]
    pub enable_profiling: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "oclkit=info,warn".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// 计算运行时配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeSection {
    /// 主机描述文件；设置后使用内存运行时代替原生驱动
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_description: Option<PathBuf>,
}
