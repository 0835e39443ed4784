//! 时钟抽象
//!
//! 控制循环只通过 [`Clock`] 读取时间和等待周期边界：
//!
//! - [`MonotonicClock`]: 真实单调时钟，使用 `spin_sleep` 实现低抖动等待
//! - [`ManualClock`]: 虚拟时钟，等待即推进时间；仿真可快于实时，超时测试可确定复现
//!
//! 时间均以时钟创建时刻为原点的 `Duration` 表示。

use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 时钟
pub trait Clock {
    /// 当前时间（相对时钟原点）
    fn now(&self) -> Duration;

    /// 阻塞直到 `deadline`；`deadline` 已过时立即返回
    fn sleep_until(&self, deadline: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep_until(&self, deadline: Duration) {
        (**self).sleep_until(deadline)
    }
}

/// 真实单调时钟
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    sleeper: SpinSleeper,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            sleeper: SpinSleeper::default(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            self.sleeper.sleep(deadline - now);
        }
    }
}

/// 虚拟时钟
///
/// 克隆共享同一个时间；测试替身可持有一份克隆，在 IO 调用内部推进时间来模拟超时。
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进时间
    pub fn advance(&self, delta: Duration) {
        self.nanos.fetch_add(duration_to_nanos(delta), Ordering::SeqCst);
    }

    /// 直接设置时间（只能向前）
    pub fn set(&self, now: Duration) {
        self.nanos.fetch_max(duration_to_nanos(now), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep_until(&self, deadline: Duration) {
        self.set(deadline);
    }
}

fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
