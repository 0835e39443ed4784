//! 仿真关节
//!
//! 刚体惯量 + 粘性阻尼的单关节替身，用于台架调试与集成测试。
//! 不追求物理保真度。
//!
//! 每次 `read` 将仿真时间推进一个固定步长（通常等于控制周期），
//! 因此在虚拟时钟下也能得到确定的轨迹。
//!
//! # 示例
//!
//! ```rust
//! use luxo_control::hardware::{JointSensor, SimulatedJoint, SimulationParams, TorqueActuator};
//! use luxo_control::types::NewtonMeter;
//! use std::time::Duration;
//!
//! let (mut sensor, mut actuator) = SimulatedJoint::new(SimulationParams::default()).split();
//! actuator.write(NewtonMeter(1.0), Duration::from_millis(10)).unwrap();
//! let state = sensor.read(Duration::from_millis(10)).unwrap();
//! assert!(state.position.0 > 0.0);
//! ```

use super::{JointSensor, TorqueActuator};
use crate::error::{ActuatorFault, SensorFault};
use crate::types::{JointState, NewtonMeter, Rad, RadPerSecond};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// 仿真参数
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    /// 转动惯量（kg·m²）
    pub inertia: f64,
    /// 粘性阻尼（N·m·s/rad）
    pub damping: f64,
    /// 每次读取推进的仿真步长
    pub step: Duration,
    /// 初始位置（rad）
    pub initial_position: f64,
    /// 机械限位（rad），到达限位时速度清零
    pub hard_stops: (f64, f64),
    /// 位置测量噪声幅值（rad，均匀分布）
    pub position_noise: f64,
    /// 整次读取失败的概率
    pub read_dropout: f64,
    /// 只有速度缺失的概率
    pub velocity_dropout: f64,
    /// 随机数种子
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            inertia: 0.05,
            damping: 0.05,
            step: Duration::from_micros(2_500),
            initial_position: 0.0,
            hard_stops: (-10.0, 10.0),
            position_noise: 0.0,
            read_dropout: 0.0,
            velocity_dropout: 0.0,
            seed: 0,
        }
    }
}

/// 保留的力矩命令历史长度
pub const COMMAND_HISTORY: usize = 1024;

#[derive(Debug)]
struct SimState {
    params: SimulationParams,
    position: f64,
    velocity: f64,
    applied: f64,
    released: bool,
    steps: u64,
    commands: VecDeque<f64>,
    rng: StdRng,
}

impl SimState {
    fn advance(&mut self) {
        let dt = self.params.step.as_secs_f64();
        let torque = if self.released { 0.0 } else { self.applied };
        let accel = (torque - self.params.damping * self.velocity) / self.params.inertia;

        // 半隐式欧拉
        self.velocity += accel * dt;
        self.position += self.velocity * dt;

        let (lo, hi) = self.params.hard_stops;
        if self.position <= lo || self.position >= hi {
            self.position = self.position.clamp(lo, hi);
            self.velocity = 0.0;
        }
        self.steps += 1;
    }
}

/// 仿真关节
///
/// 通过 [`split`](Self::split) 拆成传感器与执行器两个句柄，共享同一个仿真状态。
#[derive(Debug, Clone)]
pub struct SimulatedJoint {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedJoint {
    pub fn new(params: SimulationParams) -> Self {
        let rng = StdRng::seed_from_u64(params.seed);
        let position = params.initial_position;
        Self {
            state: Rc::new(RefCell::new(SimState {
                params,
                position,
                velocity: 0.0,
                applied: 0.0,
                released: true,
                steps: 0,
                commands: VecDeque::with_capacity(COMMAND_HISTORY),
                rng,
            })),
        }
    }

    /// 拆分为传感器与执行器
    pub fn split(&self) -> (SimSensor, SimActuator) {
        (
            SimSensor {
                state: Rc::clone(&self.state),
            },
            SimActuator {
                state: Rc::clone(&self.state),
            },
        )
    }

    /// 当前真实位置（不含噪声）
    pub fn position(&self) -> Rad {
        Rad(self.state.borrow().position)
    }

    /// 当前真实速度
    pub fn velocity(&self) -> RadPerSecond {
        RadPerSecond(self.state.borrow().velocity)
    }

    /// 已推进的仿真步数
    pub fn steps(&self) -> u64 {
        self.state.borrow().steps
    }

    /// 最近收到的力矩命令（最多 [`COMMAND_HISTORY`] 条，旧的在前）
    pub fn commands(&self) -> Vec<f64> {
        self.state.borrow().commands.iter().copied().collect()
    }

    /// 执行器是否处于释放状态
    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }
}

/// 仿真传感器句柄
#[derive(Debug)]
pub struct SimSensor {
    state: Rc<RefCell<SimState>>,
}

impl JointSensor for SimSensor {
    fn read(&mut self, _timeout: Duration) -> Result<JointState, SensorFault> {
        let mut sim = self.state.borrow_mut();
        sim.advance();

        let read_dropout = sim.params.read_dropout;
        if read_dropout > 0.0 && sim.rng.gen_bool(read_dropout.min(1.0)) {
            return Err(SensorFault::Unavailable("simulated read dropout".to_string()));
        }

        let noise = sim.params.position_noise;
        let mut position = sim.position;
        if noise > 0.0 {
            position += sim.rng.gen_range(-noise..=noise);
        }

        let velocity_dropout = sim.params.velocity_dropout;
        let velocity = if velocity_dropout > 0.0 && sim.rng.gen_bool(velocity_dropout.min(1.0)) {
            None
        } else {
            Some(RadPerSecond(sim.velocity))
        };

        let torque = if sim.released { 0.0 } else { sim.applied };
        Ok(JointState {
            timestamp: Duration::ZERO,
            position: Rad(position),
            velocity,
            torque: Some(NewtonMeter(torque)),
        })
    }
}

/// 仿真执行器句柄
#[derive(Debug)]
pub struct SimActuator {
    state: Rc<RefCell<SimState>>,
}

impl TorqueActuator for SimActuator {
    fn write(&mut self, torque: NewtonMeter, _timeout: Duration) -> Result<(), ActuatorFault> {
        if !torque.0.is_finite() {
            return Err(ActuatorFault::Rejected(format!("non-finite torque {}", torque.0)));
        }
        let mut sim = self.state.borrow_mut();
        sim.applied = torque.0;
        sim.released = false;
        if sim.commands.len() == COMMAND_HISTORY {
            sim.commands.pop_front();
        }
        sim.commands.push_back(torque.0);
        Ok(())
    }

    fn release(&mut self) -> Result<(), ActuatorFault> {
        let mut sim = self.state.borrow_mut();
        sim.applied = 0.0;
        sim.released = true;
        Ok(())
    }
}
