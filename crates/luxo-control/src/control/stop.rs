//! 外部停止信号
//!
//! 控制循环中唯一跨线程共享的对象：Ctrl-C 处理器在另一个线程置位，
//! 循环在每个周期开始时检查。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 停止信号
///
/// 克隆共享同一个标志。
///
/// # 示例
///
/// ```rust
/// use luxo_control::control::StopSignal;
///
/// let stop = StopSignal::new();
/// let handle = stop.clone();
/// std::thread::spawn(move || handle.trigger()).join().unwrap();
/// assert!(stop.is_triggered());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// 是否已请求停止
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
