//! 循环定时统计
//!
//! 记录相邻周期开始时刻的间隔：指数滑动平均（α = 0.01）、最小 / 最大值，
//! 以及超时周期数。用于运行结束时的性能报告。

use serde::Serialize;
use std::time::Duration;

/// 滑动平均系数
pub const EMA_ALPHA: f64 = 0.01;

/// 循环定时统计
#[derive(Debug, Clone, Default)]
pub struct LoopTimingStats {
    last_start: Option<Duration>,
    intervals: u64,
    filtered: f64,
    min: Option<Duration>,
    max: Option<Duration>,
    overruns: u64,
}

impl LoopTimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个周期的开始时刻
    pub fn record_cycle_start(&mut self, start: Duration) {
        if let Some(last) = self.last_start {
            let dt = start.saturating_sub(last);
            let secs = dt.as_secs_f64();

            // 第一次间隔直接作为初值，避免从 0 开始的慢速收敛
            self.filtered = if self.intervals == 0 {
                secs
            } else {
                (1.0 - EMA_ALPHA) * self.filtered + EMA_ALPHA * secs
            };
            self.intervals += 1;
            self.min = Some(self.min.map_or(dt, |m| m.min(dt)));
            self.max = Some(self.max.map_or(dt, |m| m.max(dt)));
        }
        self.last_start = Some(start);
    }

    /// 记录一次超时
    pub fn record_overrun(&mut self) {
        self.overruns += 1;
    }

    /// 滤波后的周期
    pub fn filtered_period(&self) -> Option<Duration> {
        (self.intervals > 0).then(|| Duration::from_secs_f64(self.filtered))
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// 生成快照
    pub fn summary(&self) -> TimingSummary {
        TimingSummary {
            intervals: self.intervals,
            filtered_period_s: self.filtered_period().map(|d| d.as_secs_f64()),
            min_period_s: self.min.map(|d| d.as_secs_f64()),
            max_period_s: self.max.map(|d| d.as_secs_f64()),
            overruns: self.overruns,
        }
    }
}

/// 定时统计快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub intervals: u64,
    pub filtered_period_s: Option<f64>,
    pub min_period_s: Option<f64>,
    pub max_period_s: Option<f64>,
    pub overruns: u64,
}

impl TimingSummary {
    /// 滤波后的频率（Hz）
    pub fn filtered_frequency_hz(&self) -> Option<f64> {
        self.filtered_period_s.filter(|p| *p > 0.0).map(|p| 1.0 / p)
    }
}
