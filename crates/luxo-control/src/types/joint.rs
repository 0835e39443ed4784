//! 关节状态快照
//!
//! 每个控制周期采样一次，只在本周期内有效，下一周期即被替换。
//! 除了日志记录中的拷贝，不会跨周期保留。

use super::units::{NewtonMeter, Rad, RadPerSecond};
use std::time::Duration;

/// 单关节状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    /// 采样时间（相对运行开始）
    ///
    /// 由控制循环在读取完成时打上；传感器适配器构造时可保持为零。
    pub timestamp: Duration,

    /// 关节位置
    pub position: Rad,

    /// 关节速度
    ///
    /// `None` 表示本次速度测量短暂不可用（位置仍然有效）。
    pub velocity: Option<RadPerSecond>,

    /// 测得的力矩（可选，取决于驱动器是否上报）
    pub torque: Option<NewtonMeter>,
}

impl JointState {
    /// 创建包含位置与速度的状态
    pub fn new(position: Rad, velocity: RadPerSecond) -> Self {
        Self {
            timestamp: Duration::ZERO,
            position,
            velocity: Some(velocity),
            torque: None,
        }
    }

    /// 只有位置（速度不可用）
    pub fn position_only(position: Rad) -> Self {
        Self {
            timestamp: Duration::ZERO,
            position,
            velocity: None,
            torque: None,
        }
    }

    /// 附加测得力矩
    pub fn with_torque(mut self, torque: NewtonMeter) -> Self {
        self.torque = Some(torque);
        self
    }

    /// 附加时间戳
    pub fn at(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 速度是否可用且有限
    pub fn has_velocity(&self) -> bool {
        self.velocity.is_some_and(|v| v.is_finite())
    }
}
