//! 测试替身
//!
//! - `ScriptedSensor`: 按脚本逐周期返回样本，可在读取内部推进虚拟时钟
//! - `RecordingActuator`: 记录每次写入，可按写入序号注入故障
//! - `FailingLog`: 第 N 次追加时失败的日志输出端

#![allow(dead_code)]

use luxo_control::control::{ManualClock, StopSignal};
use luxo_control::{ActuatorFault, JointSensor, JointState, NewtonMeter, SensorFault, TorqueActuator};
use luxo_control::{Rad, RadPerSecond};
use luxo_tools::{JumpConfig, LogError, LogRecord, LogSink, ThresholdDirection};
use std::collections::{HashSet, VecDeque};
use std::io;
use std::time::Duration;

/// 单个脚本步骤
#[derive(Debug, Clone)]
pub struct Step {
    pub sample: Result<JointState, SensorFault>,
    /// 读取耗时（推进虚拟时钟）
    pub delay: Duration,
}

pub fn ok(position: f64, velocity: f64) -> Step {
    Step {
        sample: Ok(JointState::new(Rad(position), RadPerSecond(velocity))),
        delay: Duration::ZERO,
    }
}

pub fn position_only(position: f64) -> Step {
    Step {
        sample: Ok(JointState::position_only(Rad(position))),
        delay: Duration::ZERO,
    }
}

pub fn fail() -> Step {
    Step {
        sample: Err(SensorFault::Unavailable("scripted dropout".to_string())),
        delay: Duration::ZERO,
    }
}

impl Step {
    pub fn taking(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// 脚本传感器
pub struct ScriptedSensor {
    script: VecDeque<Step>,
    clock: Option<ManualClock>,
    stop_after: Option<(usize, StopSignal)>,
    reads: usize,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            clock: None,
            stop_after: None,
            reads: 0,
        }
    }

    /// 从位置序列构造（速度为 0）
    pub fn positions(positions: &[f64]) -> Self {
        Self::new(positions.iter().map(|&p| ok(p, 0.0)))
    }

    /// 读取耗时推进此时钟
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 第 `reads` 次读取后置位停止信号
    pub fn stop_after(mut self, reads: usize, stop: StopSignal) -> Self {
        self.stop_after = Some((reads, stop));
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl JointSensor for ScriptedSensor {
    fn read(&mut self, _timeout: Duration) -> Result<JointState, SensorFault> {
        self.reads += 1;
        if let Some((after, stop)) = &self.stop_after
            && self.reads >= *after
        {
            stop.trigger();
        }

        let Some(step) = self.script.pop_front() else {
            return Err(SensorFault::Unavailable("script exhausted".to_string()));
        };
        if let Some(clock) = &self.clock {
            clock.advance(step.delay);
        }
        step.sample
    }
}

/// 记录执行器
#[derive(Debug, Default)]
pub struct RecordingActuator {
    /// 所有写入尝试（含失败的）
    pub writes: Vec<f64>,
    pub releases: u32,
    /// 失败的写入序号（从 0 开始）
    pub fail_writes: HashSet<usize>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_writes: indices.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl TorqueActuator for RecordingActuator {
    fn write(&mut self, torque: NewtonMeter, _timeout: Duration) -> Result<(), ActuatorFault> {
        let index = self.writes.len();
        self.writes.push(torque.0);
        if self.fail_writes.contains(&index) {
            return Err(ActuatorFault::Hardware(format!("injected failure on write {index}")));
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), ActuatorFault> {
        self.releases += 1;
        Ok(())
    }
}

/// 第 `fail_at` 次追加失败的日志
#[derive(Debug, Default)]
pub struct FailingLog {
    pub records: Vec<LogRecord>,
    pub fail_at: usize,
}

impl LogSink for FailingLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        if self.records.len() == self.fail_at {
            return Err(LogError::Io(io::Error::other("disk full")));
        }
        self.records.push(record);
        Ok(())
    }
}

/// 基础测试配置
///
/// 阈值 0.5（递增），起跳力矩 2.0，Kp 4 / Kd 0.5，目标 1.0，力矩上限 5.0，
/// 周期 2.5ms，`cycles` 个周期后停止。
pub fn test_config(cycles: u64) -> JumpConfig {
    let mut config = JumpConfig::default();
    config.launch.torque = 2.0;
    config.launch.threshold = 0.5;
    config.launch.direction = ThresholdDirection::Increasing;
    config.launch.start_position = Some(0.0);
    config.stabilize.kp = 4.0;
    config.stabilize.kd = 0.5;
    config.stabilize.target_position = 1.0;
    config.stabilize.target_velocity = 0.0;
    config.limits.torque_max = 5.0;
    config.limits.safe_torque = 0.0;
    config.timing.period_us = 2_500;
    config.timing.io_timeout_us = 10_000;
    config.timing.max_cycles = Some(cycles);
    config
}

/// PD 参考值（与 `test_config` 的增益一致）
pub fn pd(config: &JumpConfig, position: f64, velocity: f64) -> f64 {
    config.stabilize.kp * (config.stabilize.target_position - position)
        + config.stabilize.kd * (config.stabilize.target_velocity - velocity)
}

pub fn assert_float_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
