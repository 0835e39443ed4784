//! 错误到退出码的映射

use luxo_control::{ControlError, FaultKind};
use luxo_tools::{ConfigError, LogError};

/// 按错误链中第一个可识别的错误选择退出码
pub fn exit_code(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<ControlError>() {
            return kind_code(e.kind());
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if cause.downcast_ref::<LogError>().is_some() {
            return 6;
        }
    }
    1
}

fn kind_code(kind: FaultKind) -> u8 {
    match kind {
        FaultKind::ConfigInvalid => 2,
        FaultKind::SensorFault => 3,
        FaultKind::ActuatorFault => 4,
        FaultKind::DeadlineMiss => 5,
        FaultKind::LogFailure => 6,
        FaultKind::Usage => 1,
    }
}

/// 诊断信息：故障类别 + 周期序号 + 完整错误链
pub fn diagnostic(error: &anyhow::Error) -> String {
    let control = error.chain().find_map(|c| c.downcast_ref::<ControlError>());
    match control {
        Some(e) => match e.cycle() {
            Some(cycle) => format!("{} at cycle {}: {:#}", e.kind(), cycle, error),
            None => format!("{}: {:#}", e.kind(), error),
        },
        None => format!("{:#}", error),
    }
}
