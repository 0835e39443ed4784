//! analyze 命令
//!
//! 重新加载 CSV 日志并输出汇总统计

use anyhow::{Context, Result};
use clap::Args;
use luxo_tools::RunLog;
use luxo_tools::statistics::RunStatistics;
use std::path::PathBuf;

/// analyze 命令参数
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// 日志文件路径
    pub log: PathBuf,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub fn execute(&self) -> Result<()> {
        let log = RunLog::load(&self.log)
            .with_context(|| format!("加载日志失败: {}", self.log.display()))?;
        let stats = RunStatistics::calculate(&log);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("📊 日志: {}", self.log.display());
        println!("  周期数: {}", stats.cycle_count);
        println!("  时长: {:.3} s", stats.duration_s);
        match (stats.transition_cycle, stats.transition_time_s) {
            (Some(cycle), Some(t)) => println!("  切换: 周期 {}（t = {:.4} s）", cycle, t),
            _ => println!("  切换: (未切换)"),
        }
        println!("  起跳周期: {}", stats.launch_cycles);
        println!(
            "  钳位周期: {}（{:.1}%）",
            stats.saturated_cycles,
            stats.saturation_rate()
        );
        println!("  降级周期: {}", stats.degraded_cycles);
        println!("  超时周期: {}", stats.deadline_misses);
        println!("  最大 |力矩|: {:.3} N·m", stats.peak_abs_torque);
        if let (Some(lo), Some(hi)) = (stats.min_position, stats.peak_position) {
            println!("  位置范围: [{:.4}, {:.4}] rad", lo, hi);
        }
        if stats.period.sample_count > 0 {
            println!(
                "  周期: 平均 {:.3} ms，标准差 {:.3} ms（{:.1} Hz）",
                stats.period.mean_s * 1e3,
                stats.period.std_dev_s * 1e3,
                stats.period.mean_frequency_hz()
            );
        }
        if !log.is_monotonic() {
            println!("  ⚠️  阶段序列出现 Stabilize -> Launch 回退");
        }
        Ok(())
    }
}
