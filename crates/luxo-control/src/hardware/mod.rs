//! 硬件抽象层
//!
//! 控制循环只通过两个 trait 与硬件交互：
//!
//! - [`JointSensor`]: 每周期读取一次关节状态
//! - [`TorqueActuator`]: 接受力矩命令（不做钳位，钳位由命令生成器负责）
//!
//! 两者都以显式参数传给控制循环，没有全局句柄。
//!
//! # 适配器
//!
//! - [`sim::SimulatedJoint`]（`sim` feature）: 刚体惯量 + 粘性阻尼的台架替身
//! - [`replay::ReplaySensor`]: 按周期回放已记录日志中的位置

use crate::error::{ActuatorFault, SensorFault};
use crate::types::{JointState, NewtonMeter};
use std::time::Duration;

pub mod replay;
#[cfg(feature = "sim")]
pub mod sim;

pub use replay::ReplaySensor;
#[cfg(feature = "sim")]
pub use sim::{COMMAND_HISTORY, SimActuator, SimSensor, SimulatedJoint, SimulationParams};

/// 关节传感器
pub trait JointSensor {
    /// 读取一次关节状态
    ///
    /// # 参数
    ///
    /// - `timeout`: 本次读取的时间上限；适配器应自行限制阻塞时间，
    ///   控制循环在返回后还会再检查一次实际耗时
    ///
    /// # 返回
    ///
    /// - `Ok(state)`: 位置有效；速度可以为 `None`
    /// - `Err(SensorFault)`: 本周期没有可用测量
    fn read(&mut self, timeout: Duration) -> Result<JointState, SensorFault>;
}

/// 力矩执行器
pub trait TorqueActuator {
    /// 下发力矩命令
    fn write(&mut self, torque: NewtonMeter, timeout: Duration) -> Result<(), ActuatorFault>;

    /// 释放执行器（清除锁存的驱动故障 / 进入停止状态）
    ///
    /// 运行开始前调用一次，停机流程末尾再调用一次。默认无操作。
    fn release(&mut self) -> Result<(), ActuatorFault> {
        Ok(())
    }
}

impl<S: JointSensor + ?Sized> JointSensor for &mut S {
    fn read(&mut self, timeout: Duration) -> Result<JointState, SensorFault> {
        (**self).read(timeout)
    }
}

impl<S: JointSensor + ?Sized> JointSensor for Box<S> {
    fn read(&mut self, timeout: Duration) -> Result<JointState, SensorFault> {
        (**self).read(timeout)
    }
}

impl<A: TorqueActuator + ?Sized> TorqueActuator for &mut A {
    fn write(&mut self, torque: NewtonMeter, timeout: Duration) -> Result<(), ActuatorFault> {
        (**self).write(torque, timeout)
    }

    fn release(&mut self) -> Result<(), ActuatorFault> {
        (**self).release()
    }
}

impl<A: TorqueActuator + ?Sized> TorqueActuator for Box<A> {
    fn write(&mut self, torque: NewtonMeter, timeout: Duration) -> Result<(), ActuatorFault> {
        (**self).write(torque, timeout)
    }

    fn release(&mut self) -> Result<(), ActuatorFault> {
        (**self).release()
    }
}
