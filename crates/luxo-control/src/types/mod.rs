//! 类型系统
//!
//! 强类型单位与每周期的关节状态快照。

pub mod joint;
pub mod units;

pub use joint::JointState;
pub use units::{NewtonMeter, Rad, RadPerSecond};
