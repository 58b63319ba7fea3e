//! 跨线程停止信号
//!
//! 用于急停（运动线程轮询）和停止播放（显示线程轮询）。
//! 设置和清除都是幂等的原子操作。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 可克隆的共享停止标志
///
/// 所有克隆共享同一个原子变量。
///
/// # 示例
///
/// ```rust
/// use rover_protocol::StopSignal;
///
/// let estop = StopSignal::new();
/// let remote = estop.clone();
/// remote.set();
/// assert!(estop.is_set());
/// estop.clear();
/// assert!(!remote.is_set());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置停止标志
    ///
    /// 返回调用前是否已经设置。
    pub fn set(&self) -> bool {
        self.flag.swap(true, Ordering::AcqRel)
    }

    /// 清除停止标志
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// 是否已设置
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
