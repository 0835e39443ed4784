//! 跳跃控制器
//!
//! 把阶段状态机与力矩命令生成器组合成一个按周期调用的控制器。
//!
//! # 设计理念
//!
//! - **Tick 模式**: 控制循环负责定时与 IO，控制器只负责计算
//! - **纯计算**: 不接触硬件，便于单元测试
//! - **顺序固定**: 先更新阶段，再计算力矩（越过阈值的那个周期已经使用 PD）
//!
//! # 示例
//!
//! ```rust
//! use luxo_control::control::JumpController;
//! use luxo_control::types::{JointState, Rad, RadPerSecond};
//! use luxo_tools::{ControlPhase, JumpConfig};
//!
//! let mut controller = JumpController::from_config(&JumpConfig::default());
//! let output = controller.tick(0, Some(&JointState::new(Rad(0.1), RadPerSecond(0.0))));
//! assert_eq!(output.phase, ControlPhase::Launch);
//! ```

use super::command::{TorqueCommand, TorqueCommandGenerator};
use super::phase::PhaseMachine;
use crate::types::JointState;
use luxo_tools::{ControlPhase, JumpConfig};

/// 单周期控制输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// 本周期的阶段（已包含本周期的切换）
    pub phase: ControlPhase,
    /// 本周期是否发生了 Launch -> Stabilize 切换
    pub transitioned: bool,
    /// 力矩命令
    pub command: TorqueCommand,
}

/// 跳跃控制器
#[derive(Debug, Clone)]
pub struct JumpController {
    phase: PhaseMachine,
    generator: TorqueCommandGenerator,
}

impl JumpController {
    pub fn new(phase: PhaseMachine, generator: TorqueCommandGenerator) -> Self {
        Self { phase, generator }
    }

    pub fn from_config(config: &JumpConfig) -> Self {
        Self::new(
            PhaseMachine::from_config(config),
            TorqueCommandGenerator::from_config(config),
        )
    }

    /// 计算一步控制输出
    ///
    /// # 参数
    ///
    /// - `cycle`: 当前周期序号
    /// - `sample`: 已通过范围检查的样本；`None` 表示本周期传感器故障
    pub fn tick(&mut self, cycle: u64, sample: Option<&JointState>) -> ControlOutput {
        let transitioned = self.phase.update(sample.map(|s| s.position), cycle);
        let phase = self.phase.phase();
        let command = self.generator.compute(phase, sample);

        ControlOutput {
            phase,
            transitioned,
            command,
        }
    }

    /// 当前阶段
    pub fn phase(&self) -> ControlPhase {
        self.phase.phase()
    }

    /// 切换发生的周期
    pub fn transition_cycle(&self) -> Option<u64> {
        self.phase.transition_cycle()
    }
}
