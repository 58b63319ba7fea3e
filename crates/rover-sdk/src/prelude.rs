//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use rover_sdk::prelude::*;
//! ```

pub use crate::system::{RoverSystem, SystemError};

// 协议层
pub use rover_protocol::{ActionEvent, ActionKind, MotionCommand, StopSignal};

// 驱动层
pub use rover_driver::{
    AbortCause, CommandExecutor, MotionConfig, MotionOutcome, RoverBuilder, action_channel,
};
#[cfg(feature = "sim")]
pub use rover_driver::SimHardware;

// 显示层
pub use rover_display::{AnimationCache, DisplayConfig, DisplayPlayer, PlayerState};

// 硬件能力
pub use rover_hal::{EchoDriver, MotorDriver, Panel};

// 错误类型
pub use rover_display::CacheError;
pub use rover_driver::DriverError;
pub use rover_hal::HalError;
