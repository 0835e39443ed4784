//! 错误类型定义
//!
//! - `SensorFault` / `ActuatorFault`: 硬件边界上的故障（由适配器返回）
//! - `ControlError`: 控制循环对外报告的错误，运行期错误都带有发生时的周期序号

use luxo_tools::{ConfigError, LogError};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// 传感器故障
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorFault {
    /// 测量不可用（通信失败、驱动未响应等）
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    /// 读取超过周期超时
    #[error("Sensor read timeout: took {elapsed:?}, limit {timeout:?}")]
    Timeout { elapsed: Duration, timeout: Duration },

    /// 位置超出有效范围（含 NaN / 无穷）
    #[error("Position {position} outside valid range [{min}, {max}]")]
    OutOfRange { position: f64, min: f64, max: f64 },
}

/// 执行器故障
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuatorFault {
    /// 命令被驱动器拒绝
    #[error("Torque command rejected: {0}")]
    Rejected(String),

    /// 硬件层错误
    #[error("Actuator hardware error: {0}")]
    Hardware(String),

    /// 写入超过周期超时
    #[error("Actuator write timeout: took {elapsed:?}, limit {timeout:?}")]
    Timeout { elapsed: Duration, timeout: Duration },
}

/// 控制循环错误
#[derive(Error, Debug)]
pub enum ControlError {
    /// 配置无效（致命，运行不会开始）
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),

    /// 连续传感器故障达到阈值
    #[error("Sensor fault at cycle {cycle} ({consecutive} consecutive): {source}")]
    SensorFault {
        cycle: u64,
        consecutive: u32,
        #[source]
        source: SensorFault,
    },

    /// 执行器故障（总是致命）
    #[error("Actuator fault at cycle {cycle}: {source}")]
    ActuatorFault {
        cycle: u64,
        #[source]
        source: ActuatorFault,
    },

    /// 连续超时周期超过阈值
    #[error("Deadline miss at cycle {cycle}: {consecutive} consecutive overruns (limit {limit})")]
    DeadlineMiss { cycle: u64, consecutive: u32, limit: u32 },

    /// 日志写入失败
    #[error("Log sink failure at cycle {cycle}: {source}")]
    Log {
        cycle: u64,
        #[source]
        source: LogError,
    },

    /// 控制循环只能运行一次
    #[error("Control loop already ran; build a new loop for another run")]
    AlreadyRun,
}

impl ControlError {
    /// 故障类别
    pub fn kind(&self) -> FaultKind {
        match self {
            ControlError::ConfigInvalid(_) => FaultKind::ConfigInvalid,
            ControlError::SensorFault { .. } => FaultKind::SensorFault,
            ControlError::ActuatorFault { .. } => FaultKind::ActuatorFault,
            ControlError::DeadlineMiss { .. } => FaultKind::DeadlineMiss,
            ControlError::Log { .. } => FaultKind::LogFailure,
            ControlError::AlreadyRun => FaultKind::Usage,
        }
    }

    /// 发生故障的周期序号（加载期错误没有周期）
    pub fn cycle(&self) -> Option<u64> {
        match self {
            ControlError::SensorFault { cycle, .. }
            | ControlError::ActuatorFault { cycle, .. }
            | ControlError::DeadlineMiss { cycle, .. }
            | ControlError::Log { cycle, .. } => Some(*cycle),
            ControlError::ConfigInvalid(_) | ControlError::AlreadyRun => None,
        }
    }
}

/// 故障类别（诊断输出与退出码使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ConfigInvalid,
    SensorFault,
    ActuatorFault,
    DeadlineMiss,
    LogFailure,
    Usage,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::ConfigInvalid => "ConfigInvalid",
            FaultKind::SensorFault => "SensorFault",
            FaultKind::ActuatorFault => "ActuatorFault",
            FaultKind::DeadlineMiss => "DeadlineMiss",
            FaultKind::LogFailure => "LogFailure",
            FaultKind::Usage => "Usage",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
