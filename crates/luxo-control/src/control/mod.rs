//! 控制模块
//!
//! - `phase` - 阶段状态机（Launch -> Stabilize）
//! - `command` - 力矩命令生成器（恒力矩 / PD + 钳位 + 回退）
//! - `controller` - 组合二者的每周期控制器
//! - `clock` - 时钟抽象（真实 / 虚拟）
//! - `stop` - 外部停止信号
//! - `stats` - 循环定时统计
//! - Loop Runner - 固定周期控制循环

pub mod clock;
pub mod command;
pub mod controller;
pub mod loop_runner;
pub mod phase;
pub mod stats;
pub mod stop;

// 重新导出常用类型
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use command::{PdGains, TorqueCommand, TorqueCommandGenerator, pd_torque, saturate};
pub use controller::{ControlOutput, JumpController};
pub use loop_runner::{ControlLoop, LoopState, RunReport, StopReason};
pub use phase::{PhaseMachine, next_phase};
pub use stats::{LoopTimingStats, TimingSummary};
pub use stop::StopSignal;
