//! Loop Runner - 固定周期控制循环
//!
//! # 生命周期
//!
//! ```text
//! NotStarted --run()--> Running --停止条件--> Stopped
//! ```
//!
//! # 周期顺序（固定）
//!
//! 1. 检查停止条件（外部信号 / 时长 / 周期数）
//! 2. 读取传感器（范围检查 + 超时检查）
//! 3. 更新阶段
//! 4. 计算力矩并钳位
//! 5. 写执行器
//! 6. 追加日志
//! 7. 等待下一个周期边界
//!
//! # 核心功能
//!
//! - **循环锚点**: `next_tick += period`，抖动不累积；超时后锚点重置为当前时间，不补跑
//! - **容错**: 单次传感器故障使用回退读数；连续故障达到阈值才停止
//! - **安全停机**: 任何退出路径（包括故障）都先下发安全力矩再释放执行器
//! - **安全网**: 运行中被 drop（例如适配器 panic 展开）时自动下发安全力矩
//!
//! # 示例
//!
//! ```rust
//! use luxo_control::control::{ControlLoop, ManualClock};
//! use luxo_control::hardware::{SimulatedJoint, SimulationParams};
//! use luxo_tools::{JumpConfig, MemoryLog};
//!
//! let config = JumpConfig::default();
//! let joint = SimulatedJoint::new(SimulationParams::default());
//! let (sensor, actuator) = joint.split();
//! let mut log = MemoryLog::new();
//!
//! let mut control = ControlLoop::with_clock(config, sensor, actuator, &mut log, ManualClock::new())?;
//! let report = control.run()?;
//! assert!(report.transition_cycle.is_some());
//! # Ok::<(), luxo_control::ControlError>(())
//! ```

use super::clock::{Clock, MonotonicClock};
use super::controller::{ControlOutput, JumpController};
use super::stats::{LoopTimingStats, TimingSummary};
use super::stop::StopSignal;
use crate::error::{ActuatorFault, ControlError, FaultKind, SensorFault};
use crate::hardware::{JointSensor, TorqueActuator};
use crate::types::{JointState, NewtonMeter};
use luxo_tools::{ControlPhase, JumpConfig, LogRecord, LogSink};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    NotStarted,
    Running,
    Stopped,
}

/// 停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "fault")]
pub enum StopReason {
    /// 达到最长运行时间
    DurationElapsed,
    /// 达到最大周期数
    CycleLimit,
    /// 外部停止信号
    StopSignal,
    /// 不可恢复的故障
    Fault(FaultKind),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::DurationElapsed => f.write_str("duration elapsed"),
            StopReason::CycleLimit => f.write_str("cycle limit reached"),
            StopReason::StopSignal => f.write_str("stop signal"),
            StopReason::Fault(kind) => write!(f, "fault ({kind})"),
        }
    }
}

/// 运行报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// 完成（已写日志）的周期数
    pub cycles: u64,
    /// 运行时长（s）
    pub duration_s: f64,
    pub stop_reason: StopReason,
    /// 停止时的阶段
    pub final_phase: ControlPhase,
    /// Launch -> Stabilize 切换发生的周期
    pub transition_cycle: Option<u64>,
    pub deadline_misses: u64,
    pub degraded_cycles: u64,
    pub saturated_cycles: u64,
    /// 停机流程是否全部成功（安全力矩 + 释放 + 日志 flush）
    pub shutdown_clean: bool,
    pub timing: TimingSummary,
}

/// 周期计数器
#[derive(Debug, Default)]
struct Counters {
    cycles: u64,
    deadline_misses: u64,
    consecutive_misses: u32,
    degraded: u64,
    saturated: u64,
    consecutive_sensor_faults: u32,
}

/// 固定周期控制循环
///
/// 传感器、执行器、日志输出端都以显式参数传入；可以传 `&mut` 引用，
/// 运行结束后调用方仍持有它们。
pub struct ControlLoop<S, A, L, C = MonotonicClock>
where
    S: JointSensor,
    A: TorqueActuator,
    L: LogSink,
    C: Clock,
{
    config: JumpConfig,
    sensor: S,
    actuator: A,
    log: L,
    clock: C,
    stop: StopSignal,
    controller: JumpController,
    state: LoopState,
    counters: Counters,
    timing: LoopTimingStats,
    report: Option<RunReport>,
}

impl<S, A, L> ControlLoop<S, A, L, MonotonicClock>
where
    S: JointSensor,
    A: TorqueActuator,
    L: LogSink,
{
    /// 使用真实时钟创建控制循环
    ///
    /// # 错误
    ///
    /// 配置无效时返回 `ControlError::ConfigInvalid`，循环不会进入 `Running`。
    pub fn new(config: JumpConfig, sensor: S, actuator: A, log: L) -> Result<Self, ControlError> {
        Self::with_clock(config, sensor, actuator, log, MonotonicClock::new())
    }
}

impl<S, A, L, C> ControlLoop<S, A, L, C>
where
    S: JointSensor,
    A: TorqueActuator,
    L: LogSink,
    C: Clock,
{
    /// 使用指定时钟创建控制循环
    pub fn with_clock(
        config: JumpConfig,
        sensor: S,
        actuator: A,
        log: L,
        clock: C,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        let controller = JumpController::from_config(&config);
        Ok(Self {
            config,
            sensor,
            actuator,
            log,
            clock,
            stop: StopSignal::new(),
            controller,
            state: LoopState::NotStarted,
            counters: Counters::default(),
            timing: LoopTimingStats::new(),
            report: None,
        })
    }

    /// 使用外部停止信号（例如由 Ctrl-C 处理器置位）
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// 停止信号的句柄
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// 当前阶段
    pub fn phase(&self) -> ControlPhase {
        self.controller.phase()
    }

    pub fn config(&self) -> &JumpConfig {
        &self.config
    }

    /// 运行结束后的报告（正常停止和故障停止都会生成）
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// 运行控制循环（阻塞）
    ///
    /// # 返回
    ///
    /// - `Ok(report)`: 因时长 / 周期数 / 停止信号正常停止
    /// - `Err(ControlError)`: 因故障停止；报告仍可通过 [`report`](Self::report) 获取
    ///
    /// 两种情况下停机流程都已执行，循环处于 `Stopped`。
    pub fn run(&mut self) -> Result<RunReport, ControlError> {
        if self.state != LoopState::NotStarted {
            return Err(ControlError::AlreadyRun);
        }
        self.state = LoopState::Running;

        let timing = &self.config.timing;
        info!(
            "Jump control starting: period {:?} ({:.1} Hz), max duration {:?}, threshold {} ({:?})",
            timing.period(),
            timing.frequency_hz(),
            timing.max_duration(),
            self.config.launch.threshold,
            self.config.launch.direction,
        );

        let start = self.clock.now();
        let outcome = self.release_at_start().and_then(|()| self.cycle_loop(start));
        let elapsed = self.clock.now().saturating_sub(start);

        let shutdown_clean = self.shutdown();
        self.state = LoopState::Stopped;

        let stop_reason = match &outcome {
            Ok(reason) => *reason,
            Err(e) => StopReason::Fault(e.kind()),
        };
        let report = RunReport {
            cycles: self.counters.cycles,
            duration_s: elapsed.as_secs_f64(),
            stop_reason,
            final_phase: self.controller.phase(),
            transition_cycle: self.controller.transition_cycle(),
            deadline_misses: self.counters.deadline_misses,
            degraded_cycles: self.counters.degraded,
            saturated_cycles: self.counters.saturated,
            shutdown_clean,
            timing: self.timing.summary(),
        };
        self.report = Some(report.clone());

        match outcome {
            Ok(reason) => {
                info!(
                    "Jump control stopped ({}): {} cycles in {:.3}s, {} deadline misses, {} degraded",
                    reason,
                    report.cycles,
                    report.duration_s,
                    report.deadline_misses,
                    report.degraded_cycles
                );
                if let Some(hz) = report.timing.filtered_frequency_hz() {
                    debug!("Filtered loop rate: {:.1} Hz", hz);
                }
                Ok(report)
            },
            Err(e) => {
                error!("Jump control aborted: {}", e);
                Err(e)
            },
        }
    }

    /// 启动前释放一次执行器，清除之前锁存的驱动故障
    fn release_at_start(&mut self) -> Result<(), ControlError> {
        self.actuator
            .release()
            .map_err(|source| ControlError::ActuatorFault { cycle: 0, source })
    }

    fn cycle_loop(&mut self, start: Duration) -> Result<StopReason, ControlError> {
        let period = self.config.timing.period();
        let max_duration = self.config.timing.max_duration();
        let max_cycles = self.config.timing.max_cycles;

        // 绝对时间锚点
        let mut next_tick = start;

        loop {
            let cycle = self.counters.cycles;
            let cycle_start = self.clock.now();
            let t = cycle_start.saturating_sub(start);

            if self.stop.is_triggered() {
                info!("Stop signal received at cycle {}", cycle);
                return Ok(StopReason::StopSignal);
            }
            if t >= max_duration {
                return Ok(StopReason::DurationElapsed);
            }
            if max_cycles.is_some_and(|max| cycle >= max) {
                return Ok(StopReason::CycleLimit);
            }

            self.timing.record_cycle_start(cycle_start);
            next_tick += period;

            let flagged = self.step(cycle, t, next_tick)?;
            self.counters.cycles += 1;

            // 日志追加之后才越过边界的周期在这里计数
            let now = self.clock.now();
            if !flagged {
                if now > next_tick {
                    self.on_deadline_miss(cycle, next_tick);
                    self.check_deadline_policy(cycle)?;
                } else {
                    self.counters.consecutive_misses = 0;
                }
            }

            // 睡眠到下一个锚点
            if next_tick > now {
                self.clock.sleep_until(next_tick);
            } else {
                // 不补跑：锚点重置为当前时间
                next_tick = now;
            }
        }
    }

    /// 执行一个周期
    ///
    /// 返回本周期在写日志前是否已判定超时。
    fn step(&mut self, cycle: u64, t: Duration, deadline: Duration) -> Result<bool, ControlError> {
        let sample = self.read_sample(t);
        let fault = self.track_sensor_health(cycle, &sample)?;
        let sample = sample.ok();

        let output = self.controller.tick(cycle, sample.as_ref());
        if output.transitioned {
            info!(
                "Phase transition Launch -> Stabilize at cycle {} (t = {:.4}s, position {})",
                cycle,
                t.as_secs_f64(),
                output
                    .command
                    .position
                    .map_or_else(|| "n/a".to_string(), |p| p.to_string()),
            );
        }
        if output.command.degraded {
            match &fault {
                Some(e) => warn!("Cycle {} degraded, using last known good reading: {}", cycle, e),
                None => warn!("Cycle {} degraded, using last known good reading", cycle),
            }
        }

        self.write_torque(cycle, output.command.commanded)?;

        let deadline_missed = self.clock.now() > deadline;
        if deadline_missed {
            self.on_deadline_miss(cycle, deadline);
        }

        if output.command.degraded {
            self.counters.degraded += 1;
        }
        if output.command.saturated {
            self.counters.saturated += 1;
        }

        let record = build_record(cycle, t, &output, sample.as_ref(), deadline_missed);
        trace!(
            "cycle {} t={:.4} phase={} pos={:?} torque={:.3}",
            cycle, record.time, record.phase, record.position, record.torque
        );
        self.log
            .append(record)
            .map_err(|source| ControlError::Log { cycle, source })?;

        self.check_deadline_policy(cycle)?;
        Ok(deadline_missed)
    }

    /// 读取并校验一个样本（超时与范围检查）
    fn read_sample(&mut self, t: Duration) -> Result<JointState, SensorFault> {
        let timeout = self.config.timing.io_timeout();
        let begin = self.clock.now();
        let result = self.sensor.read(timeout);
        let elapsed = self.clock.now().saturating_sub(begin);

        let state = result?;
        if elapsed > timeout {
            return Err(SensorFault::Timeout { elapsed, timeout });
        }
        if !self.config.check_position(state.position.0) {
            return Err(SensorFault::OutOfRange {
                position: state.position.0,
                min: self.config.limits.position_min,
                max: self.config.limits.position_max,
            });
        }
        Ok(state.at(t))
    }

    /// 更新连续传感器故障计数
    ///
    /// 缺速度也计为一次故障。达到阈值时返回致命错误（本周期不写日志）。
    fn track_sensor_health(
        &mut self,
        cycle: u64,
        sample: &Result<JointState, SensorFault>,
    ) -> Result<Option<SensorFault>, ControlError> {
        let fault = match sample {
            Ok(state) if state.has_velocity() => None,
            Ok(_) => Some(SensorFault::Unavailable(
                "velocity measurement unavailable".to_string(),
            )),
            Err(e) => Some(e.clone()),
        };

        let Some(fault) = fault else {
            self.counters.consecutive_sensor_faults = 0;
            return Ok(None);
        };

        self.counters.consecutive_sensor_faults += 1;
        let consecutive = self.counters.consecutive_sensor_faults;
        if consecutive >= self.config.faults.max_consecutive_sensor_faults {
            error!(
                "Consecutive sensor faults ({}) at cycle {}: {}. Aborting run.",
                consecutive, cycle, fault
            );
            return Err(ControlError::SensorFault {
                cycle,
                consecutive,
                source: fault,
            });
        }
        Ok(Some(fault))
    }

    fn write_torque(&mut self, cycle: u64, torque: NewtonMeter) -> Result<(), ControlError> {
        let timeout = self.config.timing.io_timeout();
        let begin = self.clock.now();
        let result = self.actuator.write(torque, timeout);
        let elapsed = self.clock.now().saturating_sub(begin);

        let fault = match result {
            Err(e) => Some(e),
            Ok(()) if elapsed > timeout => Some(ActuatorFault::Timeout { elapsed, timeout }),
            Ok(()) => None,
        };
        match fault {
            Some(source) => {
                error!("Actuator fault at cycle {}: {}", cycle, source);
                Err(ControlError::ActuatorFault { cycle, source })
            },
            None => Ok(()),
        }
    }

    fn on_deadline_miss(&mut self, cycle: u64, deadline: Duration) {
        self.counters.deadline_misses += 1;
        self.counters.consecutive_misses += 1;
        self.timing.record_overrun();

        let late = self.clock.now().saturating_sub(deadline);
        warn!(
            "Control loop overrun at cycle {}: {:?} past the tick boundary ({} consecutive)",
            cycle, late, self.counters.consecutive_misses
        );
    }

    fn check_deadline_policy(&self, cycle: u64) -> Result<(), ControlError> {
        let consecutive = self.counters.consecutive_misses;
        match self.config.faults.max_consecutive_deadline_misses {
            Some(limit) if consecutive > limit => {
                error!(
                    "Consecutive deadline misses ({}) exceed limit {} at cycle {}",
                    consecutive, limit, cycle
                );
                Err(ControlError::DeadlineMiss {
                    cycle,
                    consecutive,
                    limit,
                })
            },
            _ => Ok(()),
        }
    }

    /// 停机流程
    ///
    /// 下发安全力矩（失败重试一次）→ 释放执行器 → flush 日志。
    /// 任何一步失败都只记录，流程继续。
    fn shutdown(&mut self) -> bool {
        let safe = NewtonMeter(self.config.limits.safe_torque);
        let timeout = self.config.timing.io_timeout();
        let mut clean = true;

        if let Err(first) = self.actuator.write(safe, timeout) {
            warn!("Safe torque command failed: {}. Retrying once.", first);
            if let Err(second) = self.actuator.write(safe, timeout) {
                error!("Safe torque retry failed: {}", second);
                clean = false;
            }
        }
        if let Err(e) = self.actuator.release() {
            warn!("Failed to release actuator: {}. Continuing anyway.", e);
            clean = false;
        }
        if let Err(e) = self.log.flush() {
            warn!("Failed to flush log: {}", e);
            clean = false;
        }

        debug!("Shutdown complete (safe torque {}, clean: {})", safe, clean);
        clean
    }
}

fn build_record(
    cycle: u64,
    t: Duration,
    output: &ControlOutput,
    sample: Option<&JointState>,
    deadline_missed: bool,
) -> LogRecord {
    let command = &output.command;
    LogRecord {
        time: t.as_secs_f64(),
        position: command.position.map(|p| p.0),
        velocity: command.velocity.map(|v| v.0),
        torque: command.commanded.0,
        phase: output.phase,
        saturated: command.saturated,
        degraded: command.degraded,
        cycle,
        raw_torque: Some(command.raw.0),
        measured_torque: sample.and_then(|s| s.torque).map(|m| m.0),
        deadline_missed,
    }
}

impl<S, A, L, C> Drop for ControlLoop<S, A, L, C>
where
    S: JointSensor,
    A: TorqueActuator,
    L: LogSink,
    C: Clock,
{
    /// 安全网：运行中被丢弃时下发安全力矩并释放执行器
    fn drop(&mut self) {
        if self.state != LoopState::Running {
            return;
        }
        warn!("Control loop dropped while running; commanding safe torque");
        let safe = NewtonMeter(self.config.limits.safe_torque);
        if let Err(e) = self.actuator.write(safe, self.config.timing.io_timeout()) {
            error!("Safe torque on drop failed: {}", e);
        }
        if let Err(e) = self.actuator.release() {
            warn!("Failed to release actuator on drop: {}", e);
        }
        self.state = LoopState::Stopped;
    }
}
