//! # Luxo Control - 单关节跳跃控制
//!
//! 先以恒定力矩开环起跳，关节位置越过阈值后切换到 PD 闭环稳定。
//!
//! # 模块
//!
//! - [`types`] - 强类型单位（`Rad`、`RadPerSecond`、`NewtonMeter`）与关节状态
//! - [`hardware`] - 传感器 / 执行器 trait 及仿真、回放适配器
//! - [`control`] - 阶段机、力矩命令、固定周期控制循环
//! - [`error`] - 错误类型
//!
//! # 快速开始
//!
//! ```rust
//! use luxo_control::control::{ControlLoop, ManualClock, StopReason};
//! use luxo_control::hardware::{SimulatedJoint, SimulationParams};
//! use luxo_tools::{ControlPhase, JumpConfig, MemoryLog};
//!
//! let joint = SimulatedJoint::new(SimulationParams::default());
//! let (sensor, actuator) = joint.split();
//! let mut log = MemoryLog::new();
//!
//! let mut control = ControlLoop::with_clock(
//!     JumpConfig::default(),
//!     sensor,
//!     actuator,
//!     &mut log,
//!     ManualClock::new(),
//! )?;
//! let report = control.run()?;
//! assert_eq!(report.stop_reason, StopReason::DurationElapsed);
//! assert_eq!(report.final_phase, ControlPhase::Stabilize);
//! # Ok::<(), luxo_control::ControlError>(())
//! ```

pub mod control;
pub mod error;
pub mod hardware;
pub mod types;

// 重新导出常用类型
pub use control::{ControlLoop, LoopState, RunReport, StopReason, StopSignal};
pub use error::{ActuatorFault, ControlError, FaultKind, SensorFault};
pub use hardware::{JointSensor, TorqueActuator};
pub use types::{JointState, NewtonMeter, Rad, RadPerSecond};
