//! # 日志统计
//!
//! 对重新加载的运行日志做离线汇总（可选模块）
//!
//! 需要启用 `statistics` feature：
//! ```toml
//! luxo-tools = { workspace = true, features = ["statistics"] }
//! ```

use crate::phase::ControlPhase;
use crate::recording::RunLog;
use serde::{Deserialize, Serialize};

/// 运行日志汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// 周期总数
    pub cycle_count: u64,

    /// 时间跨度（s）
    pub duration_s: f64,

    /// 阶段切换周期
    pub transition_cycle: Option<u64>,

    /// 阶段切换时间（s）
    pub transition_time_s: Option<f64>,

    /// 起跳阶段周期数
    pub launch_cycles: u64,

    /// 力矩被钳位的周期数
    pub saturated_cycles: u64,

    /// 降级周期数
    pub degraded_cycles: u64,

    /// 超时周期数
    pub deadline_misses: u64,

    /// 最大 |力矩命令|（N·m）
    pub peak_abs_torque: f64,

    /// 最大位置（rad）
    pub peak_position: Option<f64>,

    /// 最小位置（rad）
    pub min_position: Option<f64>,

    /// 实际周期统计
    pub period: PeriodStatistics,
}

impl RunStatistics {
    /// 计算日志汇总
    pub fn calculate(log: &RunLog) -> Self {
        let records = &log.records;

        let count = |pred: fn(&crate::recording::LogRecord) -> bool| {
            records.iter().filter(|r| pred(r)).count() as u64
        };

        let positions = records.iter().filter_map(|r| r.position);
        let (min_position, peak_position) = positions.fold((None, None), |(lo, hi), p| {
            (
                Some(lo.map_or(p, |l: f64| l.min(p))),
                Some(hi.map_or(p, |h: f64| h.max(p))),
            )
        });

        let deltas: Vec<f64> = records.windows(2).map(|w| w[1].time - w[0].time).collect();

        Self {
            cycle_count: records.len() as u64,
            duration_s: log.duration().map(|d| d.as_secs_f64()).unwrap_or(0.0),
            transition_cycle: log.transition_cycle(),
            transition_time_s: log.transition_time(),
            launch_cycles: count(|r| r.phase == ControlPhase::Launch),
            saturated_cycles: count(|r| r.saturated),
            degraded_cycles: count(|r| r.degraded),
            deadline_misses: count(|r| r.deadline_missed),
            peak_abs_torque: records.iter().map(|r| r.torque.abs()).fold(0.0, f64::max),
            peak_position,
            min_position,
            period: PeriodStatistics::calculate(&deltas),
        }
    }

    /// 钳位周期占比（%）
    pub fn saturation_rate(&self) -> f64 {
        if self.cycle_count == 0 {
            return 0.0;
        }
        self.saturated_cycles as f64 / self.cycle_count as f64 * 100.0
    }
}

/// 周期统计（相邻记录的时间差）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    /// 平均周期（s）
    pub mean_s: f64,

    /// 最小周期（s）
    pub min_s: f64,

    /// 最大周期（s）
    pub max_s: f64,

    /// 标准差（s）
    pub std_dev_s: f64,

    /// 样本数量
    pub sample_count: u64,
}

impl PeriodStatistics {
    /// 计算周期统计
    pub fn calculate(periods: &[f64]) -> Self {
        if periods.is_empty() {
            return Self {
                mean_s: 0.0,
                min_s: 0.0,
                max_s: 0.0,
                std_dev_s: 0.0,
                sample_count: 0,
            };
        }

        let n = periods.len() as f64;
        let mean = periods.iter().sum::<f64>() / n;
        let min = periods.iter().copied().fold(f64::INFINITY, f64::min);
        let max = periods.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // 计算标准差
        let variance = periods
            .iter()
            .map(|&x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;

        Self {
            mean_s: mean,
            min_s: min,
            max_s: max,
            std_dev_s: variance.sqrt(),
            sample_count: periods.len() as u64,
        }
    }

    /// 平均频率（Hz）
    pub fn mean_frequency_hz(&self) -> f64 {
        if self.mean_s <= 0.0 {
            return 0.0;
        }
        1.0 / self.mean_s
    }
}
