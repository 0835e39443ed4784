//! run 命令
//!
//! 加载配置，选择后端，驱动一次完整的跳跃并写入 CSV 日志。
//!
//! # 后端
//!
//! - `sim`: 仿真关节（惯量 + 阻尼）
//! - `replay`: 回放已记录日志中的位置，执行器只记录命令（不接触硬件）

use super::config::load_config;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use luxo_control::control::{Clock, ControlLoop, ManualClock, MonotonicClock, StopSignal};
use luxo_control::hardware::{ReplaySensor, SimulatedJoint, SimulationParams};
use luxo_control::{
    ActuatorFault, ControlError, JointSensor, NewtonMeter, RunReport, TorqueActuator,
};
use luxo_tools::{CsvLogWriter, JumpConfig, RunLog};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 传感器 / 执行器后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// 仿真关节
    Sim,
    /// 日志回放
    Replay,
}

/// run 命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 配置文件路径（默认 <config_dir>/luxo/jump.toml）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出日志路径
    #[arg(short, long, default_value = "jump_log.csv")]
    pub log: PathBuf,

    /// 后端
    #[arg(short, long, value_enum, default_value_t = Backend::Sim)]
    pub backend: Backend,

    /// 回放用的日志（`--backend replay` 时必需）
    #[arg(long)]
    pub replay_log: Option<PathBuf>,

    /// 使用虚拟时钟（不等待真实时间）
    #[arg(long)]
    pub fast: bool,

    /// 将运行报告写为 JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// 覆盖最大周期数
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// 仿真：整次读取失败的概率
    #[arg(long, default_value_t = 0.0)]
    pub read_dropout: f64,

    /// 仿真：位置噪声幅值（rad）
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// 仿真：随机数种子
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// 回放时使用的执行器：只记录命令
#[derive(Debug, Default)]
struct DryRunActuator {
    commands: u64,
}

impl TorqueActuator for DryRunActuator {
    fn write(&mut self, torque: NewtonMeter, _timeout: Duration) -> Result<(), ActuatorFault> {
        self.commands += 1;
        tracing::trace!("dry-run torque command {}", torque);
        Ok(())
    }
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(max_cycles) = self.max_cycles {
            config.timing.max_cycles = Some(max_cycles);
        }

        let (sensor, actuator) = self.build_backend(&mut config)?;

        let writer = CsvLogWriter::create(&self.log)
            .with_context(|| format!("创建日志文件失败: {}", self.log.display()))?;

        // 🚨 安全关键：Ctrl-C 只置位停止信号，停机流程由控制循环完成
        let stop = StopSignal::new();
        let handler_stop = stop.clone();
        ctrlc::set_handler(move || {
            eprintln!("\n⚠️  收到中断信号，正在安全停机...");
            handler_stop.trigger();
        })
        .context("注册 Ctrl-C 处理器失败")?;

        println!("🚀 开始跳跃（后端: {:?}）", self.backend);
        println!("📁 日志: {}", self.log.display());

        let (outcome, report) = if self.fast {
            drive(config, sensor, actuator, writer, ManualClock::new(), stop)?
        } else {
            drive(config, sensor, actuator, writer, MonotonicClock::new(), stop)?
        };

        if let Some(report) = &report {
            print_report(report);
            if let Some(path) = &self.report_json {
                write_report(path, report)?;
            }
        }

        outcome.context("跳跃运行失败")?;
        println!("✅ 完成");
        Ok(())
    }

    fn build_backend(
        &self,
        config: &mut JumpConfig,
    ) -> Result<(Box<dyn JointSensor>, Box<dyn TorqueActuator>)> {
        match self.backend {
            Backend::Sim => {
                anyhow::ensure!(
                    self.noise.is_finite(),
                    "--noise 必须是有限值: {}",
                    self.noise
                );
                anyhow::ensure!(
                    self.read_dropout.is_finite(),
                    "--read-dropout 必须是有限值: {}",
                    self.read_dropout
                );

                let params = SimulationParams {
                    step: config.timing.period(),
                    initial_position: config.launch.start_position.unwrap_or(0.0),
                    read_dropout: self.read_dropout.clamp(0.0, 1.0),
                    position_noise: self.noise.abs(),
                    seed: self.seed,
                    ..Default::default()
                };
                let (sensor, actuator) = SimulatedJoint::new(params).split();
                Ok((Box::new(sensor), Box::new(actuator)))
            },
            Backend::Replay => {
                let path = self
                    .replay_log
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("--backend replay 需要 --replay-log"))?;
                let log = RunLog::load(path)
                    .with_context(|| format!("加载回放日志失败: {}", path.display()))?;
                if log.is_empty() {
                    anyhow::bail!("回放日志为空: {}", path.display());
                }

                // 回放长度限制周期数
                let len = log.len() as u64;
                config.timing.max_cycles = Some(config.timing.max_cycles.map_or(len, |m| m.min(len)));

                println!("📼 回放 {} 个周期: {}", len, path.display());
                Ok((
                    Box::new(ReplaySensor::new(log)),
                    Box::new(DryRunActuator::default()),
                ))
            },
        }
    }
}

type Outcome = (Result<RunReport, ControlError>, Option<RunReport>);

fn drive<C: Clock>(
    config: JumpConfig,
    sensor: Box<dyn JointSensor>,
    actuator: Box<dyn TorqueActuator>,
    writer: CsvLogWriter<fs::File>,
    clock: C,
    stop: StopSignal,
) -> Result<Outcome> {
    let mut control = ControlLoop::with_clock(config, sensor, actuator, writer, clock)?
        .with_stop_signal(stop);
    let outcome = control.run();
    let report = control.report().cloned();
    Ok((outcome, report))
}

fn print_report(report: &RunReport) {
    println!();
    println!("════════════════════════════════════════");
    println!("           运行报告");
    println!("════════════════════════════════════════");
    println!("停止原因: {}", report.stop_reason);
    println!("周期数: {}", report.cycles);
    println!("时长: {:.3} s", report.duration_s);
    println!("最终阶段: {}", report.final_phase);
    match report.transition_cycle {
        Some(cycle) => println!("切换周期: {}", cycle),
        None => println!("切换周期: (未切换)"),
    }
    println!("降级周期: {}", report.degraded_cycles);
    println!("钳位周期: {}", report.saturated_cycles);
    println!("超时周期: {}", report.deadline_misses);
    if let Some(hz) = report.timing.filtered_frequency_hz() {
        println!("滤波循环频率: {:.1} Hz", hz);
    }
    if !report.shutdown_clean {
        println!("⚠️  停机流程未完全成功（详见日志）");
    }
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("序列化运行报告失败")?;
    fs::write(path, json).with_context(|| format!("写入报告失败: {}", path.display()))?;
    println!("📝 报告: {}", path.display());
    Ok(())
}
