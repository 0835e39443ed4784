//! # 运行日志格式
//!
//! 每个控制周期追加一行记录，离线分析工具（绘图 notebook）按表格加载。
//!
//! 格式：带表头的 CSV，一行一个周期。
//!
//! ```text
//! time,position,velocity,torque,phase,saturated,degraded,cycle,raw_torque,measured_torque,deadline_missed
//! 0.0025,0.1,1.2,2.0,launch,false,false,0,2.0,,false
//! ```
//!
//! 前 7 列的名称和顺序是兼容性约定；读取方必须容忍额外的尾部列。
//! 缺失值写为空单元格。

use crate::phase::ControlPhase;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 日志列（按顺序）
pub const COLUMNS: [&str; 11] = [
    "time",
    "position",
    "velocity",
    "torque",
    "phase",
    "saturated",
    "degraded",
    "cycle",
    "raw_torque",
    "measured_torque",
    "deadline_missed",
];

/// 兼容性约定覆盖的列数（`COLUMNS` 的前缀）
pub const REQUIRED_COLUMNS: usize = 7;

/// 日志错误
#[derive(Error, Debug)]
pub enum LogError {
    /// 文件 IO 错误
    #[error("Log IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV 编解码错误
    #[error("Log CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// 表头与约定不符
    #[error("Log schema mismatch: {0}")]
    Schema(String),
}

/// 单个周期的日志记录（不可变快照）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 距运行开始的时间（s）
    pub time: f64,

    /// 关节位置（rad）
    ///
    /// 降级周期记录的是实际用于计算的回退值；从未取得有效样本时为空。
    pub position: Option<f64>,

    /// 关节速度（rad/s），语义同 `position`
    pub velocity: Option<f64>,

    /// 下发的力矩命令（N·m，已钳位）
    pub torque: f64,

    /// 本周期的控制阶段
    pub phase: ControlPhase,

    /// 力矩是否被钳位
    pub saturated: bool,

    /// 是否使用了回退的传感器数据
    pub degraded: bool,

    /// 周期序号（从 0 开始）
    #[serde(default)]
    pub cycle: u64,

    /// 钳位前的力矩（N·m）
    #[serde(default)]
    pub raw_torque: Option<f64>,

    /// 传感器测得的力矩（N·m）
    #[serde(default)]
    pub measured_torque: Option<f64>,

    /// 本周期是否超出控制周期
    #[serde(default)]
    pub deadline_missed: bool,
}

/// 日志输出端
///
/// 只追加；记录的所有权在 `append` 时交给输出端。
pub trait LogSink {
    /// 追加一条记录
    fn append(&mut self, record: LogRecord) -> Result<(), LogError>;

    /// 刷新缓冲
    fn flush(&mut self) -> Result<(), LogError> {
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        (**self).append(record)
    }

    fn flush(&mut self) -> Result<(), LogError> {
        (**self).flush()
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        (**self).append(record)
    }

    fn flush(&mut self) -> Result<(), LogError> {
        (**self).flush()
    }
}

/// CSV 日志写入器
///
/// 创建时立即写表头；每条记录写入后立即 flush，
/// 进程中途退出时已完成的周期都留在磁盘上。
pub struct CsvLogWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvLogWriter<File> {
    /// 创建日志文件（覆盖已有文件）
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let file = File::create(path.as_ref())?;
        Self::new(file)
    }
}

impl<W: Write> CsvLogWriter<W> {
    /// 包装任意写入端并写表头
    pub fn new(inner: W) -> Result<Self, LogError> {
        // 表头手动写入，serialize 不再自动生成
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(COLUMNS)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// 已写入的行数（不含表头）
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// 取回内部写入端
    pub fn into_inner(self) -> Result<W, LogError> {
        self.writer.into_inner().map_err(|e| LogError::Io(e.into_error()))
    }
}

impl<W: Write> LogSink for CsvLogWriter<W> {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        self.writer.serialize(&record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LogError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// 内存日志（测试与仿真使用）
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    records: Vec<LogRecord>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn into_run_log(self) -> RunLog {
        RunLog::new(self.records)
    }
}

impl LogSink for MemoryLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        self.records.push(record);
        Ok(())
    }
}

/// 重新加载的运行日志
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunLog {
    pub records: Vec<LogRecord>,
}

impl RunLog {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// 从任意读取端加载
    ///
    /// 只要求前 7 列与约定一致；尾部未知列忽略。
    /// 旧日志缺少 `cycle` 列时按行号补齐。
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LogError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let prefix: Vec<&str> = headers.iter().take(REQUIRED_COLUMNS).collect();
        if prefix != COLUMNS[..REQUIRED_COLUMNS] {
            return Err(LogError::Schema(format!(
                "expected leading columns {:?}, found {:?}",
                &COLUMNS[..REQUIRED_COLUMNS],
                prefix
            )));
        }
        let has_cycle = headers.iter().any(|h| h == "cycle");

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<LogRecord>().enumerate() {
            let mut record = result?;
            if !record.time.is_finite() {
                return Err(LogError::Schema(format!(
                    "row {}: time must be finite, found {}",
                    row + 1,
                    record.time
                )));
            }
            if !has_cycle {
                record.cycle = row as u64;
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 时间跨度
    ///
    /// 跨度无法表示为 `Duration`（溢出或非有限值）时返回 `None`。
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.first()?.time;
        let last = self.records.last()?.time;
        Duration::try_from_secs_f64((last - first).max(0.0)).ok()
    }

    /// 阶段序列
    pub fn phases(&self) -> Vec<ControlPhase> {
        self.records.iter().map(|r| r.phase).collect()
    }

    /// 第一个处于 `Stabilize` 的周期（即阶段切换发生的周期）
    pub fn transition_cycle(&self) -> Option<u64> {
        self.transition_record().map(|r| r.cycle)
    }

    /// 阶段切换发生的时间（s）
    pub fn transition_time(&self) -> Option<f64> {
        self.transition_record().map(|r| r.time)
    }

    fn transition_record(&self) -> Option<&LogRecord> {
        self.records.iter().find(|r| r.phase == ControlPhase::Stabilize)
    }

    /// 阶段序列是否满足单向切换（不存在 Stabilize -> Launch）
    pub fn is_monotonic(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| !(w[0].phase == ControlPhase::Stabilize && w[1].phase == ControlPhase::Launch))
    }

    /// 按时间范围过滤
    pub fn filter_by_time(&self, start: f64, end: f64) -> RunLog {
        RunLog::new(
            self.records
                .iter()
                .filter(|r| r.time >= start && r.time <= end)
                .cloned()
                .collect(),
        )
    }
}
