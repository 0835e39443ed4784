//! # 控制阶段
//!
//! 跳跃过程只有两个阶段：先开环恒力矩起跳（`Launch`），
//! 位置越过阈值后切换到 PD 闭环稳定（`Stabilize`）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 控制阶段
///
/// 一次运行中只允许 `Launch -> Stabilize` 单向切换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPhase {
    /// 恒力矩起跳（初始状态）
    Launch,

    /// PD 稳定（终态）
    Stabilize,
}

impl ControlPhase {
    /// 日志中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlPhase::Launch => "launch",
            ControlPhase::Stabilize => "stabilize",
        }
    }

    pub fn is_launch(&self) -> bool {
        matches!(self, ControlPhase::Launch)
    }
}

impl fmt::Display for ControlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "launch" => Ok(ControlPhase::Launch),
            "stabilize" => Ok(ControlPhase::Stabilize),
            other => Err(format!("unknown control phase: {other:?}")),
        }
    }
}

/// 阈值方向
///
/// 由配置显式给出，不从运动方向推断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdDirection {
    /// `position >= threshold` 时越过
    Increasing,

    /// `position <= threshold` 时越过
    Decreasing,
}

impl ThresholdDirection {
    /// 判断位置是否已越过阈值
    #[inline]
    pub fn is_crossed(self, position: f64, threshold: f64) -> bool {
        match self {
            ThresholdDirection::Increasing => position >= threshold,
            ThresholdDirection::Decreasing => position <= threshold,
        }
    }

    /// `from` 是否位于阈值之前（即阈值在行进方向上可达）
    #[inline]
    pub fn is_before(self, from: f64, threshold: f64) -> bool {
        match self {
            ThresholdDirection::Increasing => from < threshold,
            ThresholdDirection::Decreasing => from > threshold,
        }
    }

    /// 行进方向的符号（+1 / -1）
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            ThresholdDirection::Increasing => 1.0,
            ThresholdDirection::Decreasing => -1.0,
        }
    }
}
