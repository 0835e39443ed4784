//! 强类型单位系统
//!
//! 使用 NewType 模式防止位置、速度、力矩混用，在编译期保证类型安全。
//!
//! # 示例
//!
//! ```rust
//! use luxo_control::types::{NewtonMeter, Rad, RadPerSecond};
//!
//! let error = Rad(0.0) - Rad(0.7);
//! let torque = NewtonMeter::from_pd(10.0, error, 1.0, RadPerSecond(0.0) - RadPerSecond(2.0));
//! assert!((torque.0 + 9.0).abs() < 1e-12);
//!
//! // 类型安全：以下代码无法编译
//! // let _ = Rad(1.0) + RadPerSecond(1.0);  // ❌ 类型不匹配
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 弧度（关节位置）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Rad(pub f64);

impl Rad {
    /// 零弧度常量
    pub const ZERO: Self = Rad(0.0);

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 取绝对值
    #[inline]
    pub fn abs(self) -> Self {
        Rad(self.0.abs())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

/// 弧度每秒（关节速度）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct RadPerSecond(pub f64);

impl RadPerSecond {
    pub const ZERO: Self = RadPerSecond(0.0);

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for RadPerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad/s", self.0)
    }
}

/// 牛顿·米（力矩）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct NewtonMeter(pub f64);

impl NewtonMeter {
    /// 零力矩常量
    pub const ZERO: Self = NewtonMeter(0.0);

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn abs(self) -> Self {
        NewtonMeter(self.0.abs())
    }

    /// 限制范围
    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        NewtonMeter(self.0.clamp(min.0, max.0))
    }

    /// PD 律：`kp * position_error + kd * velocity_error`
    #[inline]
    pub fn from_pd(kp: f64, position_error: Rad, kd: f64, velocity_error: RadPerSecond) -> Self {
        NewtonMeter(kp * position_error.0 + kd * velocity_error.0)
    }
}

impl fmt::Display for NewtonMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} N·m", self.0)
    }
}

// 运算符重载
macro_rules! impl_linear_ops {
    ($($unit:ident),*) => {$(
        impl Add for $unit {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $unit(self.0 + rhs.0)
            }
        }

        impl Sub for $unit {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $unit(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $unit {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $unit(self.0 * rhs)
            }
        }

        impl Neg for $unit {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $unit(-self.0)
            }
        }
    )*};
}

impl_linear_ops!(Rad, RadPerSecond, NewtonMeter);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rad_operations() {
        let a = Rad(1.0);
        let b = Rad(0.5);
        assert_eq!(a + b, Rad(1.5));
        assert_eq!(a - b, Rad(0.5));
        assert_eq!(a * 2.0, Rad(2.0));
        assert_eq!(-a, Rad(-1.0));
        assert_eq!(Rad(-0.3).abs(), Rad(0.3));
    }

    #[test]
    fn test_newton_meter_clamp() {
        let limit = NewtonMeter(5.0);
        assert_eq!(NewtonMeter(-9.0).clamp(-limit, limit), NewtonMeter(-5.0));
        assert_eq!(NewtonMeter(3.0).clamp(-limit, limit), NewtonMeter(3.0));
        assert_eq!(NewtonMeter(7.5).clamp(-limit, limit), NewtonMeter(5.0));
    }

    #[test]
    fn test_from_pd() {
        // 10 * (0 - 0.7) + 1 * (0 - 2.0) = -9.0
        let torque = NewtonMeter::from_pd(
            10.0,
            Rad::ZERO - Rad(0.7),
            1.0,
            RadPerSecond::ZERO - RadPerSecond(2.0),
        );
        assert!((torque.0 + 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Rad(0.5)), "0.5000 rad");
        assert_eq!(format!("{}", RadPerSecond(1.2)), "1.2000 rad/s");
        assert_eq!(format!("{}", NewtonMeter(-5.0)), "-5.000 N·m");
    }

    #[test]
    fn test_finite() {
        assert!(Rad(1.0).is_finite());
        assert!(!Rad(f64::NAN).is_finite());
        assert!(!RadPerSecond(f64::INFINITY).is_finite());
    }
}
