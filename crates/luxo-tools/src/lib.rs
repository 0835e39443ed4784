//! # Luxo Tools - 共享数据结构
//!
//! **依赖原则**: 纯数据 + 文件 IO，不依赖 `luxo-control`
//!
//! ## 包含模块
//!
//! - `phase` - 控制阶段与阈值方向（纯数据）
//! - `config` - 跳跃控制配置（TOML，只读结构）
//! - `recording` - 每周期日志记录格式（CSV）
//! - `statistics` - 日志统计（纯函数，可选）
//!
//! ## Feature Flags
//!
//! - `default` - 无默认 features
//! - `full` - 启用所有功能（包含 statistics）
//! - `statistics` - 启用统计模块
//!
//! ## 使用示例
//!
//! ```toml
//! # apps/cli/Cargo.toml - 需要统计
//! [dependencies]
//! luxo-tools = { workspace = true, features = ["full"] }
//! ```

pub mod config;
pub mod phase;
pub mod recording;

// ⭐ 可选模块（通过 feature flags 控制）
#[cfg(feature = "statistics")]
pub mod statistics;

// 重新导出常用类型
pub use config::{
    ConfigError, FaultPolicy, JumpConfig, LaunchConfig, LimitsConfig, StabilizeConfig,
    TimingConfig,
};
pub use phase::{ControlPhase, ThresholdDirection};
pub use recording::{CsvLogWriter, LogError, LogRecord, LogSink, MemoryLog, RunLog};
