//! 设备选择条件
//!
//! 描述调用方想要的设备：类型、平台厂商、必需能力、数量范围以及评分偏好。
//! 条件也可以从命令行参数解析得到，无法识别的参数会被静默忽略。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized {kind} token: {value}")]
pub struct ParseTokenError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseTokenError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// 设备类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    Gpu,
    Cpu,
    Accelerator,
}

impl DeviceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
            Self::Accelerator => "accelerator",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 设备类型过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceTypeFilter {
    #[default]
    Any,
    Gpu,
    Cpu,
}

impl DeviceTypeFilter {
    pub fn matches(&self, kind: DeviceKind) -> bool {
        match self {
            Self::Any => true,
            Self::Gpu => kind == DeviceKind::Gpu,
            Self::Cpu => kind == DeviceKind::Cpu,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

impl FromStr for DeviceTypeFilter {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(ParseTokenError::new("device", other)),
        }
    }
}

/// 平台/设备厂商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
    Amd,
    Apple,
    Intel,
    Nvidia,
}

impl Vendor {
    /// 从驱动上报的厂商字符串识别厂商（区分大小写的子串匹配）
    pub fn from_vendor_string(vendor: &str) -> Option<Self> {
        if vendor.contains("Advanced Micro Devices, Inc.") {
            Some(Self::Amd)
        } else if vendor.contains("Apple") {
            Some(Self::Apple)
        } else if vendor.contains("Intel") {
            Some(Self::Intel)
        } else if vendor.contains("NVIDIA") {
            Some(Self::Nvidia)
        } else {
            None
        }
    }

    /// 在平台厂商字符串中查找时使用的子串
    pub fn search_token(&self) -> &'static str {
        match self {
            Self::Amd => "Advanced Micro Devices",
            Self::Apple => "Apple",
            Self::Intel => "Intel",
            Self::Nvidia => "NVIDIA",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.search_token())
    }
}

/// 平台厂商过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VendorFilter {
    #[default]
    Any,
    Amd,
    Apple,
    Intel,
    Nvidia,
}

impl VendorFilter {
    pub fn vendor(&self) -> Option<Vendor> {
        match self {
            Self::Any => None,
            Self::Amd => Some(Vendor::Amd),
            Self::Apple => Some(Vendor::Apple),
            Self::Intel => Some(Vendor::Intel),
            Self::Nvidia => Some(Vendor::Nvidia),
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Amd => "amd",
            Self::Apple => "apple",
            Self::Intel => "intel",
            Self::Nvidia => "nvidia",
        }
    }
}

impl From<Vendor> for VendorFilter {
    fn from(vendor: Vendor) -> Self {
        match vendor {
            Vendor::Amd => Self::Amd,
            Vendor::Apple => Self::Apple,
            Vendor::Intel => Self::Intel,
            Vendor::Nvidia => Self::Nvidia,
        }
    }
}

impl FromStr for VendorFilter {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "amd" => Ok(Self::Amd),
            "apple" => Ok(Self::Apple),
            "intel" => Ok(Self::Intel),
            "nvidia" => Ok(Self::Nvidia),
            other => Err(ParseTokenError::new("platform", other)),
        }
    }
}

/// 可选设备能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCapability {
    /// 与 OpenGL 上下文共享资源
    #[serde(rename = "opengl-interop")]
    OpenGlInterop,
}

impl DeviceCapability {
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::OpenGlInterop => "opengl-interop",
        }
    }
}

impl FromStr for DeviceCapability {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opengl-interop" => Ok(Self::OpenGlInterop),
            other => Err(ParseTokenError::new("capability", other)),
        }
    }
}

/// 设备评分偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DevicePreference {
    /// 不评分，保持枚举顺序
    #[default]
    None,
    /// 优先选择没有连接显示器的设备
    #[serde(rename = "no-screen")]
    NotConnectedToScreen,
    ComputeUnits,
    GlobalMemory,
}

impl DevicePreference {
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NotConnectedToScreen => "no-screen",
            Self::ComputeUnits => "compute-units",
            Self::GlobalMemory => "global-memory",
        }
    }
}

impl FromStr for DevicePreference {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "no-screen" => Ok(Self::NotConnectedToScreen),
            "compute-units" => Ok(Self::ComputeUnits),
            "global-memory" => Ok(Self::GlobalMemory),
            other => Err(ParseTokenError::new("preference", other)),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// 设备选择条件
///
/// 一次选择调用期间只读。`device_max_count` 默认不设上限。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCriteria {
    pub device_type: DeviceTypeFilter,
    pub platform: VendorFilter,
    pub capabilities: Vec<DeviceCapability>,
    pub preference: DevicePreference,
    pub device_min_count: usize,
    pub device_max_count: usize,
}

impl Default for DeviceCriteria {
    fn default() -> Self {
        Self {
            device_type: DeviceTypeFilter::Any,
            platform: VendorFilter::Any,
            capabilities: Vec::new(),
            preference: DevicePreference::None,
            device_min_count: 1,
            device_max_count: usize::MAX,
        }
    }
}

impl DeviceCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_type(mut self, device_type: DeviceTypeFilter) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn platform(mut self, platform: VendorFilter) -> Self {
        self.platform = platform;
        self
    }

    pub fn capability(mut self, capability: DeviceCapability) -> Self {
        self.add_capability(capability);
        self
    }

    pub fn preference(mut self, preference: DevicePreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn device_count(mut self, min: usize, max: usize) -> Self {
        self.device_min_count = min;
        self.device_max_count = max;
        self
    }

    pub fn add_capability(&mut self, capability: DeviceCapability) {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
    }

    pub fn requires(&self, capability: DeviceCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// 用参数覆盖当前条件
    ///
    /// `tokens` 不包含程序名。支持的参数：
    /// `--device any|gpu|cpu`、`--platform any|amd|apple|intel|nvidia`、
    /// `--capability opengl-interop`、`--preference none|no-screen|compute-units|global-memory`、
    /// `--device-min-count N`、`--device-max-count N`。
    /// 无法识别的参数或取值保持原条件不变。
    pub fn apply_args<S: AsRef<str>>(&mut self, tokens: &[S]) {
        for pair in tokens.windows(2) {
            let (token, value) = (pair[0].as_ref(), pair[1].as_ref());
            match token {
                "--device" => {
                    if let Some(device_type) = parse_or_warn(value) {
                        self.device_type = device_type;
                    }
                }
                "--platform" => {
                    if let Some(platform) = parse_or_warn(value) {
                        self.platform = platform;
                    }
                }
                "--capability" => {
                    if let Some(capability) = parse_or_warn(value) {
                        self.add_capability(capability);
                    }
                }
                "--preference" => {
                    if let Some(preference) = parse_or_warn(value) {
                        self.preference = preference;
                    }
                }
                "--device-min-count" => match value.parse() {
                    Ok(count) => self.device_min_count = count,
                    Err(_) => warn!("Ignoring invalid device min count: {}", value),
                },
                "--device-max-count" => match value.parse() {
                    Ok(count) => self.device_max_count = count,
                    Err(_) => warn!("Ignoring invalid device max count: {}", value),
                },
                _ => {}
            }
        }
    }
}

fn parse_or_warn<T: FromStr<Err = ParseTokenError>>(value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("{}, keeping the previous value", e);
            None
        }
    }
}
