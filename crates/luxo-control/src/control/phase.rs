//! 阶段状态机
//!
//! `Launch` 为初始状态，`Stabilize` 为终态。
//! 处于 `Launch` 时，每个有效位置样本都与阈值比较（单样本判定，无滞回），
//! 第一个越过阈值的样本即触发切换，之后不可逆。
//!
//! 传感器故障（或样本超出有效范围）的周期不会发生切换，
//! 是否中止运行由控制循环决定。

use crate::types::Rad;
use luxo_tools::{ControlPhase, JumpConfig, ThresholdDirection};

/// 纯切换函数
///
/// 同一组输入总是得到同一结果；`Stabilize` 永远返回 `Stabilize`。
///
/// # 示例
///
/// ```rust
/// use luxo_control::control::next_phase;
/// use luxo_control::types::Rad;
/// use luxo_tools::{ControlPhase, ThresholdDirection};
///
/// let inc = ThresholdDirection::Increasing;
/// assert_eq!(next_phase(ControlPhase::Launch, Rad(0.3), Rad(0.5), inc), ControlPhase::Launch);
/// assert_eq!(next_phase(ControlPhase::Launch, Rad(0.5), Rad(0.5), inc), ControlPhase::Stabilize);
/// assert_eq!(next_phase(ControlPhase::Stabilize, Rad(0.0), Rad(0.5), inc), ControlPhase::Stabilize);
/// ```
pub fn next_phase(
    phase: ControlPhase,
    position: Rad,
    threshold: Rad,
    direction: ThresholdDirection,
) -> ControlPhase {
    match phase {
        ControlPhase::Launch if direction.is_crossed(position.0, threshold.0) => {
            ControlPhase::Stabilize
        },
        other => other,
    }
}

/// 带状态的阶段机
///
/// 记录切换发生的周期序号，用于与回放日志比对。
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseMachine {
    phase: ControlPhase,
    threshold: Rad,
    direction: ThresholdDirection,
    transition_cycle: Option<u64>,
}

impl PhaseMachine {
    pub fn new(threshold: Rad, direction: ThresholdDirection) -> Self {
        Self {
            phase: ControlPhase::Launch,
            threshold,
            direction,
            transition_cycle: None,
        }
    }

    pub fn from_config(config: &JumpConfig) -> Self {
        Self::new(Rad(config.launch.threshold), config.launch.direction)
    }

    /// 当前阶段
    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    /// 切换发生的周期（尚未切换时为 `None`）
    pub fn transition_cycle(&self) -> Option<u64> {
        self.transition_cycle
    }

    /// 用本周期的样本更新阶段
    ///
    /// # 参数
    ///
    /// - `position`: 有效位置样本；`None` 表示本周期传感器故障，不切换
    /// - `cycle`: 当前周期序号
    ///
    /// # 返回
    ///
    /// 本周期是否发生了切换
    pub fn update(&mut self, position: Option<Rad>, cycle: u64) -> bool {
        let Some(position) = position else {
            return false;
        };

        let next = next_phase(self.phase, position, self.threshold, self.direction);
        if next != self.phase {
            self.phase = next;
            self.transition_cycle = Some(cycle);
            return true;
        }
        false
    }
}
