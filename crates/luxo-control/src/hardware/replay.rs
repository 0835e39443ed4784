//! 回放传感器
//!
//! 按周期依次返回已记录日志中的位置 / 速度，用于离线复现一次运行的相位切换。
//! 日志中位置为空的周期回放为传感器故障。

use super::JointSensor;
use crate::error::SensorFault;
use crate::types::{JointState, NewtonMeter, Rad, RadPerSecond};
use luxo_tools::{LogRecord, RunLog};
use std::time::Duration;

/// 回放传感器
#[derive(Debug, Clone)]
pub struct ReplaySensor {
    samples: Vec<LogRecord>,
    cursor: usize,
}

impl ReplaySensor {
    pub fn new(log: RunLog) -> Self {
        Self {
            samples: log.records,
            cursor: 0,
        }
    }

    /// 总样本数
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 剩余样本数
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }
}

impl JointSensor for ReplaySensor {
    fn read(&mut self, _timeout: Duration) -> Result<JointState, SensorFault> {
        let Some(record) = self.samples.get(self.cursor) else {
            return Err(SensorFault::Unavailable("replay log exhausted".to_string()));
        };
        self.cursor += 1;

        // 降级周期在日志中记录的是回退值，回放时按原样作为测量
        let Some(position) = record.position else {
            return Err(SensorFault::Unavailable(format!(
                "no position recorded at cycle {}",
                record.cycle
            )));
        };

        Ok(JointState {
            timestamp: Duration::ZERO,
            position: Rad(position),
            velocity: record.velocity.map(RadPerSecond),
            torque: record.measured_torque.map(NewtonMeter),
        })
    }
}
