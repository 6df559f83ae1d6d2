//! 配置加载器
//!
//! 从 JSON 文件读取配置，并把字符串形式的默认条件转换为 `DeviceCriteria`

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{CriteriaSection, OclKitConfig};
use crate::criteria::DeviceCriteria;
use crate::error::{OclKitError, Result};

impl OclKitConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| OclKitError::Config(format!("读取配置失败: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| OclKitError::Config(format!("解析配置失败: {}", e)))?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| OclKitError::Config(format!("创建目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| OclKitError::Config(format!("序列化配置失败: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| OclKitError::Config(format!("写入配置失败: {}", e)))?;

        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".oclkit")
            .join("config.json")
    }

    pub fn default_criteria(&self) -> DeviceCriteria {
        self.criteria.to_criteria()
    }
}

impl CriteriaSection {
    /// 转换为设备条件，无法识别的取值记录警告并保留默认值
    pub fn to_criteria(&self) -> DeviceCriteria {
        let mut criteria = DeviceCriteria::default();

        if let Some(device_type) = parse_or_warn(self.device.as_deref()) {
            criteria.device_type = device_type;
        }
        if let Some(platform) = parse_or_warn(self.platform.as_deref()) {
            criteria.platform = platform;
        }
        for capability in &self.capabilities {
            if let Some(capability) = parse_or_warn(Some(capability)) {
                criteria.add_capability(capability);
            }
        }
        if let Some(preference) = parse_or_warn(self.preference.as_deref()) {
            criteria.preference = preference;
        }
        if let Some(min) = self.device_min_count {
            criteria.device_min_count = min;
        }
        if let Some(max) = self.device_max_count {
            criteria.device_max_count = max;
        }

        criteria
    }
}

fn parse_or_warn<T>(value: Option<&str>) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("{}, keeping default", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{
        DeviceCapability, DevicePreference, DeviceTypeFilter, VendorFilter,
    };

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = OclKitConfig::load(&dir.path().join("missing.json")).unwrap();

        assert!(!config.context.enable_profiling);
        assert_eq!(config.default_criteria(), DeviceCriteria::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let criteria = DeviceCriteria::default()
            .device_type(DeviceTypeFilter::Gpu)
            .platform(VendorFilter::Amd)
            .capability(DeviceCapability::OpenGlInterop)
            .preference(DevicePreference::GlobalMemory)
            .device_count(1, 2);

        let mut config = OclKitConfig::default();
        config.criteria = CriteriaSection::from_criteria(&criteria);
        config.context.enable_profiling = true;
        config.save(&path).unwrap();

        let loaded = OclKitConfig::load(&path).unwrap();
        assert!(loaded.context.enable_profiling);
        assert_eq!(loaded.default_criteria(), criteria);
    }

    #[test]
    fn test_unbounded_max_count_is_not_written() {
        let section = CriteriaSection::from_criteria(&DeviceCriteria::default());
        assert_eq!(section.device_max_count, None);
        assert_eq!(section.to_criteria(), DeviceCriteria::default());
    }

    #[test]
    fn test_unknown_values_keep_defaults() {
        let json = r#"{
            "criteria": {
                "device": "fpga",
                "platform": "nvidia",
                "capabilities": ["ray-tracing"],
                "preference": "fastest"
            }
        }"#;
        let config: OclKitConfig = serde_json::from_str(json).unwrap();
        let criteria = config.default_criteria();

        assert_eq!(criteria.device_type, DeviceTypeFilter::Any);
        assert_eq!(criteria.platform, VendorFilter::Nvidia);
        assert!(criteria.capabilities.is_empty());
        assert_eq!(criteria.preference, DevicePreference::None);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = OclKitConfig::load(&path).unwrap_err();
        assert!(matches!(err, OclKitError::Config(_)));
    }
}
