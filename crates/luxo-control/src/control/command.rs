//! 力矩命令生成器
//!
//! # 算法
//!
//! ```text
//! Launch:    raw = launch_torque
//! Stabilize: raw = Kp * (target_position - position) + Kd * (target_velocity - velocity)
//! output = clamp(raw, -torque_max, +torque_max)
//! ```
//!
//! # 回退
//!
//! 本周期没有有效样本（或只缺速度）时，使用最近一次有效读数计算，
//! 并把命令标记为 `degraded`。`Launch` 阶段的力矩与传感器无关，
//! 但回退标记照常设置，日志才能反映传感器状况。
//!
//! # 示例
//!
//! ```rust
//! use luxo_control::control::{PdGains, TorqueCommandGenerator};
//! use luxo_control::types::{JointState, NewtonMeter, Rad, RadPerSecond};
//! use luxo_tools::ControlPhase;
//!
//! let gains = PdGains::new(10.0, 1.0, Rad(0.0), RadPerSecond(0.0));
//! let mut generator = TorqueCommandGenerator::new(NewtonMeter(2.0), gains, NewtonMeter(5.0));
//!
//! let state = JointState::new(Rad(0.7), RadPerSecond(2.0));
//! let command = generator.compute(ControlPhase::Stabilize, Some(&state));
//! assert!((command.raw.0 + 9.0).abs() < 1e-12);
//! assert_eq!(command.commanded, NewtonMeter(-5.0));
//! assert!(command.saturated);
//! ```

use crate::types::{JointState, NewtonMeter, Rad, RadPerSecond};
use luxo_tools::{ControlPhase, JumpConfig};

/// PD 增益与目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdGains {
    /// 比例增益 (Kp)
    pub kp: f64,
    /// 微分增益 (Kd)
    pub kd: f64,
    /// 目标位置
    pub target_position: Rad,
    /// 目标速度
    pub target_velocity: RadPerSecond,
}

impl PdGains {
    pub fn new(kp: f64, kd: f64, target_position: Rad, target_velocity: RadPerSecond) -> Self {
        Self {
            kp,
            kd,
            target_position,
            target_velocity,
        }
    }
}

/// PD 律（未钳位）
#[inline]
pub fn pd_torque(gains: &PdGains, position: Rad, velocity: RadPerSecond) -> NewtonMeter {
    NewtonMeter::from_pd(
        gains.kp,
        gains.target_position - position,
        gains.kd,
        gains.target_velocity - velocity,
    )
}

/// 钳位到 `[-torque_max, +torque_max]`
///
/// # 返回
///
/// `(钳位后的力矩, 是否被钳位)`
#[inline]
pub fn saturate(raw: NewtonMeter, torque_max: NewtonMeter) -> (NewtonMeter, bool) {
    let limit = torque_max.abs();
    let clamped = raw.clamp(-limit, limit);
    (clamped, clamped != raw)
}

/// 单周期的力矩命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorqueCommand {
    /// 钳位前的力矩
    pub raw: NewtonMeter,
    /// 实际下发的力矩
    pub commanded: NewtonMeter,
    /// 是否被钳位
    pub saturated: bool,
    /// 是否使用了回退读数
    pub degraded: bool,
    /// 本周期实际使用的位置（从未有有效样本时为 `None`）
    pub position: Option<Rad>,
    /// 本周期实际使用的速度
    pub velocity: Option<RadPerSecond>,
}

/// 力矩命令生成器
///
/// 保存最近一次有效的位置 / 速度读数（last-known-good）。
#[derive(Debug, Clone)]
pub struct TorqueCommandGenerator {
    launch_torque: NewtonMeter,
    gains: PdGains,
    torque_max: NewtonMeter,
    safe_torque: NewtonMeter,
    last_position: Option<Rad>,
    last_velocity: Option<RadPerSecond>,
}

impl TorqueCommandGenerator {
    /// 创建生成器（安全力矩默认为零）
    pub fn new(launch_torque: NewtonMeter, gains: PdGains, torque_max: NewtonMeter) -> Self {
        Self {
            launch_torque,
            gains,
            torque_max,
            safe_torque: NewtonMeter::ZERO,
            last_position: None,
            last_velocity: None,
        }
    }

    /// 设置无法计算 PD 时使用的安全力矩
    pub fn with_safe_torque(mut self, safe_torque: NewtonMeter) -> Self {
        self.safe_torque = safe_torque;
        self
    }

    pub fn from_config(config: &JumpConfig) -> Self {
        let gains = PdGains::new(
            config.stabilize.kp,
            config.stabilize.kd,
            Rad(config.stabilize.target_position),
            RadPerSecond(config.stabilize.target_velocity),
        );
        Self::new(
            NewtonMeter(config.launch.torque),
            gains,
            NewtonMeter(config.limits.torque_max),
        )
        .with_safe_torque(NewtonMeter(config.limits.safe_torque))
    }

    /// 最近一次有效位置
    pub fn last_position(&self) -> Option<Rad> {
        self.last_position
    }

    /// 最近一次有效速度
    pub fn last_velocity(&self) -> Option<RadPerSecond> {
        self.last_velocity
    }

    /// 计算本周期的命令
    ///
    /// # 参数
    ///
    /// - `phase`: 本周期（已更新过的）阶段
    /// - `sample`: 有效样本；`None` 表示本周期传感器故障
    pub fn compute(&mut self, phase: ControlPhase, sample: Option<&JointState>) -> TorqueCommand {
        let mut degraded = false;

        match sample {
            Some(state) => {
                self.last_position = Some(state.position);
                if state.has_velocity() {
                    self.last_velocity = state.velocity;
                } else {
                    degraded = true;
                }
            },
            None => degraded = true,
        }

        let position = self.last_position;
        let velocity = self.last_velocity;

        let raw = match phase {
            ControlPhase::Launch => self.launch_torque,
            ControlPhase::Stabilize => match position {
                // 从未见过速度时 D 项按零误差处理
                Some(p) => pd_torque(&self.gains, p, velocity.unwrap_or(self.gains.target_velocity)),
                None => {
                    degraded = true;
                    self.safe_torque
                },
            },
        };

        let (commanded, saturated) = saturate(raw, self.torque_max);
        TorqueCommand {
            raw,
            commanded,
            saturated,
            degraded,
            position,
            velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TorqueCommandGenerator {
        let gains = PdGains::new(10.0, 1.0, Rad(0.0), RadPerSecond(0.0));
        TorqueCommandGenerator::new(NewtonMeter(2.0), gains, NewtonMeter(5.0))
    }

    #[test]
    fn test_launch_ignores_sensor() {
        let mut generator = generator();
        for position in [-3.0, 0.0, 0.4, 9.0] {
            let state = JointState::new(Rad(position), RadPerSecond(position * 2.0));
            let command = generator.compute(ControlPhase::Launch, Some(&state));
            assert_eq!(command.commanded, NewtonMeter(2.0));
            assert!(!command.saturated);
            assert!(!command.degraded);
        }
    }

    #[test]
    fn test_pd_saturates() {
        let mut generator = generator();
        let state = JointState::new(Rad(0.7), RadPerSecond(2.0));
        let command = generator.compute(ControlPhase::Stabilize, Some(&state));
        assert!((command.raw.0 + 9.0).abs() < 1e-12);
        assert_eq!(command.commanded, NewtonMeter(-5.0));
        assert!(command.saturated);
    }

    #[test]
    fn test_pd_within_limit() {
        let mut generator = generator();
        let state = JointState::new(Rad(0.1), RadPerSecond(0.5));
        let command = generator.compute(ControlPhase::Stabilize, Some(&state));
        assert!((command.commanded.0 + 1.5).abs() < 1e-12);
        assert!(!command.saturated);
        assert_eq!(command.raw, command.commanded);
    }

    #[test]
    fn test_failed_read_uses_last_known_good() {
        let mut generator = generator();
        let state = JointState::new(Rad(0.2), RadPerSecond(1.2));
        generator.compute(ControlPhase::Stabilize, Some(&state));

        let command = generator.compute(ControlPhase::Stabilize, None);
        assert!(command.degraded);
        assert_eq!(command.position, Some(Rad(0.2)));
        assert_eq!(command.velocity, Some(RadPerSecond(1.2)));
        // 10 * (0 - 0.2) + 1 * (0 - 1.2) = -3.2
        assert!((command.raw.0 + 3.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_velocity_uses_last_velocity() {
        let mut generator = generator();
        generator.compute(
            ControlPhase::Stabilize,
            Some(&JointState::new(Rad(0.2), RadPerSecond(1.2))),
        );

        let command = generator.compute(
            ControlPhase::Stabilize,
            Some(&JointState::position_only(Rad(0.3))),
        );
        assert!(command.degraded);
        assert_eq!(command.position, Some(Rad(0.3)));
        assert_eq!(command.velocity, Some(RadPerSecond(1.2)));
    }

    #[test]
    fn test_no_sample_ever_commands_safe_torque() {
        let mut generator = generator().with_safe_torque(NewtonMeter(0.1));
        let command = generator.compute(ControlPhase::Stabilize, None);
        assert!(command.degraded);
        assert_eq!(command.commanded, NewtonMeter(0.1));
        assert_eq!(command.position, None);
    }

    #[test]
    fn test_saturate_symmetric() {
        assert_eq!(saturate(NewtonMeter(7.0), NewtonMeter(5.0)), (NewtonMeter(5.0), true));
        assert_eq!(saturate(NewtonMeter(-5.0), NewtonMeter(5.0)), (NewtonMeter(-5.0), false));
    }

    #[test]
    fn test_from_config() {
        let config = JumpConfig::default();
        let mut generator = TorqueCommandGenerator::from_config(&config);
        let command = generator.compute(ControlPhase::Launch, None);
        assert_eq!(command.commanded, NewtonMeter(config.launch.torque));
        assert!(command.degraded);
    }
}
