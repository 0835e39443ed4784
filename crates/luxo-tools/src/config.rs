//! # 跳跃控制配置
//!
//! 一次运行的全部参数。运行开始前加载并校验一次，运行期间只读（不支持热加载）。
//!
//! 配置文件示例：
//!
//! ```toml
//! [launch]
//! torque = 1.5
//! threshold = 2.0
//! direction = "increasing"
//! start_position = 0.0
//!
//! [stabilize]
//! kp = 4.0
//! kd = 0.2
//! target_position = 2.5
//! target_velocity = 0.0
//!
//! [limits]
//! torque_max = 1.5
//!
//! [timing]
//! period_us = 2500
//! max_duration_ms = 1200
//! ```

use crate::phase::ThresholdDirection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置错误
///
/// 加载期发现的错误都是致命的：运行不会进入 `Running`。
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("Config file IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 参数不满足约束
    #[error("Invalid config `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// 跳跃控制配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JumpConfig {
    /// 起跳阶段参数
    pub launch: LaunchConfig,

    /// 稳定阶段参数
    pub stabilize: StabilizeConfig,

    /// 力矩与位置限制
    pub limits: LimitsConfig,

    /// 控制周期与停止条件
    #[serde(default)]
    pub timing: TimingConfig,

    /// 故障升级策略
    #[serde(default)]
    pub faults: FaultPolicy,
}

/// 起跳阶段参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchConfig {
    /// 起跳恒定力矩（N·m）
    pub torque: f64,

    /// 结束起跳阶段的位置阈值（rad）
    pub threshold: f64,

    /// 阈值方向
    pub direction: ThresholdDirection,

    /// 预期起始位置（rad）
    ///
    /// 给出时在加载期检查阈值是否沿行进方向可达。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<f64>,
}

/// 稳定阶段参数（PD）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StabilizeConfig {
    /// 比例增益（N·m/rad）
    pub kp: f64,

    /// 微分增益（N·m/(rad/s)）
    pub kd: f64,

    /// 目标位置（rad）
    pub target_position: f64,

    /// 目标速度（rad/s）
    #[serde(default)]
    pub target_velocity: f64,
}

/// 力矩与位置限制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// 力矩饱和上限（N·m），输出钳位到 `[-torque_max, +torque_max]`
    pub torque_max: f64,

    /// 停机时下发的安全力矩（N·m）
    #[serde(default)]
    pub safe_torque: f64,

    /// 传感器有效位置下限（rad），超出视为传感器故障
    #[serde(default = "default_position_min")]
    pub position_min: f64,

    /// 传感器有效位置上限（rad）
    #[serde(default = "default_position_max")]
    pub position_max: f64,
}

fn default_position_min() -> f64 {
    -100.0
}

fn default_position_max() -> f64 {
    100.0
}

/// 控制周期与停止条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TimingConfig {
    /// 控制周期（μs）
    pub period_us: u64,

    /// 最长运行时间（ms）
    pub max_duration_ms: u64,

    /// 最大周期数（None 表示只按时长停止）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u64>,

    /// 单次传感器读取 / 执行器写入的超时（μs）
    pub io_timeout_us: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            period_us: 2_500,       // 400Hz
            max_duration_ms: 1_200, // 1.2s
            max_cycles: None,
            io_timeout_us: 10_000,
        }
    }
}

impl TimingConfig {
    /// 控制周期
    pub fn period(&self) -> Duration {
        Duration::from_micros(self.period_us)
    }

    /// 最长运行时间
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    /// IO 超时
    pub fn io_timeout(&self) -> Duration {
        Duration::from_micros(self.io_timeout_us)
    }

    /// 控制频率（Hz）
    pub fn frequency_hz(&self) -> f64 {
        1_000_000.0 / self.period_us as f64
    }
}

/// 故障升级策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FaultPolicy {
    /// 连续传感器故障达到此值时停止运行
    pub max_consecutive_sensor_faults: u32,

    /// 连续超时周期超过此值时停止运行（None 表示超时永不致命）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_consecutive_deadline_misses: Option<u32>,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_sensor_faults: 5,
            max_consecutive_deadline_misses: None,
        }
    }
}

impl Default for JumpConfig {
    /// 与原始跳跃脚本一致的参数
    fn default() -> Self {
        Self {
            launch: LaunchConfig {
                torque: 1.5,
                threshold: 2.0,
                direction: ThresholdDirection::Increasing,
                start_position: Some(0.0),
            },
            stabilize: StabilizeConfig {
                kp: 4.0,
                kd: 0.2,
                target_position: 2.5,
                target_velocity: 0.0,
            },
            limits: LimitsConfig {
                torque_max: 1.5,
                safe_torque: 0.0,
                position_min: default_position_min(),
                position_max: default_position_max(),
            },
            timing: TimingConfig::default(),
            faults: FaultPolicy::default(),
        }
    }
}

impl JumpConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: JumpConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验全部约束
    ///
    /// - 所有浮点数有限
    /// - 增益、限制非负
    /// - 起跳力矩与安全力矩不超过 `torque_max`
    /// - 起跳力矩沿阈值方向推动关节
    /// - 阈值位于有效位置范围内，且从起始位置沿方向可达
    /// - 周期、时长、超时、故障阈值为正
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("launch.torque", self.launch.torque),
            ("launch.threshold", self.launch.threshold),
            ("stabilize.kp", self.stabilize.kp),
            ("stabilize.kd", self.stabilize.kd),
            ("stabilize.target_position", self.stabilize.target_position),
            ("stabilize.target_velocity", self.stabilize.target_velocity),
            ("limits.torque_max", self.limits.torque_max),
            ("limits.safe_torque", self.limits.safe_torque),
            ("limits.position_min", self.limits.position_min),
            ("limits.position_max", self.limits.position_max),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, format!("must be finite, got {value}")));
            }
        }

        for (field, value) in [
            ("stabilize.kp", self.stabilize.kp),
            ("stabilize.kd", self.stabilize.kd),
            ("limits.torque_max", self.limits.torque_max),
        ] {
            if value < 0.0 {
                return Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")));
            }
        }

        let torque_max = self.limits.torque_max;
        if self.launch.torque.abs() > torque_max {
            return Err(ConfigError::invalid(
                "launch.torque",
                format!("|{}| exceeds limits.torque_max = {}", self.launch.torque, torque_max),
            ));
        }
        if self.limits.safe_torque.abs() > torque_max {
            return Err(ConfigError::invalid(
                "limits.safe_torque",
                format!("|{}| exceeds limits.torque_max = {}", self.limits.safe_torque, torque_max),
            ));
        }
        if self.launch.torque * self.launch.direction.sign() <= 0.0 {
            return Err(ConfigError::invalid(
                "launch.torque",
                format!(
                    "{} does not drive the joint towards the {:?} threshold",
                    self.launch.torque, self.launch.direction
                ),
            ));
        }

        let (min, max) = (self.limits.position_min, self.limits.position_max);
        if min >= max {
            return Err(ConfigError::invalid(
                "limits.position_min",
                format!("{min} must be below limits.position_max = {max}"),
            ));
        }
        if !(min..=max).contains(&self.launch.threshold) {
            return Err(ConfigError::invalid(
                "launch.threshold",
                format!("{} outside sensor range [{min}, {max}]", self.launch.threshold),
            ));
        }
        if let Some(start) = self.launch.start_position {
            if !start.is_finite() || !(min..=max).contains(&start) {
                return Err(ConfigError::invalid(
                    "launch.start_position",
                    format!("{start} outside sensor range [{min}, {max}]"),
                ));
            }
            if !self.launch.direction.is_before(start, self.launch.threshold) {
                return Err(ConfigError::invalid(
                    "launch.threshold",
                    format!(
                        "{} is not reachable from start position {start} ({:?})",
                        self.launch.threshold, self.launch.direction
                    ),
                ));
            }
        }

        if self.timing.period_us == 0 {
            return Err(ConfigError::invalid("timing.period_us", "must be > 0"));
        }
        if self.timing.max_duration_ms == 0 {
            return Err(ConfigError::invalid("timing.max_duration_ms", "must be > 0"));
        }
        if self.timing.io_timeout_us == 0 {
            return Err(ConfigError::invalid("timing.io_timeout_us", "must be > 0"));
        }
        if self.timing.max_cycles == Some(0) {
            return Err(ConfigError::invalid("timing.max_cycles", "must be > 0 when set"));
        }
        if self.faults.max_consecutive_sensor_faults == 0 {
            return Err(ConfigError::invalid("faults.max_consecutive_sensor_faults", "must be > 0"));
        }
        if self.faults.max_consecutive_deadline_misses == Some(0) {
            return Err(ConfigError::invalid(
                "faults.max_consecutive_deadline_misses",
                "must be > 0 when set",
            ));
        }

        Ok(())
    }

    /// 检查位置是否在传感器有效范围内
    pub fn check_position(&self, position: f64) -> bool {
        position.is_finite()
            && position >= self.limits.position_min
            && position <= self.limits.position_max
    }
}
