//! # 模型枚举类型模块
//!
//! 系统中使用的枚举类型。数据库中以小写文本存储，
//! JSON 中与存储值保持一致，通过 Display / FromStr 双向转换。

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// 为文本存储的枚举实现 Display / FromStr
macro_rules! impl_text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// 所有取值
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("未知的{}取值: {}", stringify!($name), s)),
                }
            }
        }
    };
}

/// 波形类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    /// 正弦波
    #[default]
    Sine,
    /// 方波
    Square,
    /// 三角波
    Triangle,
    /// PWM波
    Pwm,
}

impl_text_enum!(WaveformType {
    Sine => "sine",
    Square => "square",
    Triangle => "triangle",
    Pwm => "pwm",
});

/// 导入批次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImportBatchStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl_text_enum!(ImportBatchStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

/// 待导入文件在队列中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileImportStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Error,
}

impl_text_enum!(FileImportStatus {
    Pending => "pending",
    Processing => "processing",
    Success => "success",
    Error => "error",
});

/// 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

impl_text_enum!(DeviceStatus {
    Active => "active",
    Inactive => "inactive",
    Maintenance => "maintenance",
});

/// 告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl_text_enum!(AlertSeverity {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// 分析报告类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl_text_enum!(AnalysisType {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Custom => "custom",
});

/// 控制面板运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Manual,
    Auto,
}

impl_text_enum!(ControlMode {
    Manual => "manual",
    Auto => "auto",
});
