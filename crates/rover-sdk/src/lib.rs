//! Rover SDK - 避障小车统一入口
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 指令、动作事件、急停信号
//! - **硬件层** (`hal`): 电机、测距、显示屏能力抽象，以及模拟后端
//! - **驱动层** (`driver`): 运动引擎、指令执行器
//! - **显示层** (`display`): 动画缓存与播放线程
//!
//! # 快速开始
//!
//! ```rust
//! use rover_sdk::prelude::*;
//!
//! let hw = SimHardware::new();
//! let system = RoverSystem::headless(RoverBuilder::new(), &hw).unwrap();
//! assert!(system.submit_line("right turn 10"));
//! ```

pub mod logging;
pub mod prelude;
mod system;

pub use rover_display as display;
pub use rover_driver as driver;
pub use rover_hal as hal;
pub use rover_protocol as protocol;

// --- 常用类型 ---

pub use logging::{init_logger, init_logger_with};
pub use system::{RoverSystem, SystemError};

pub use rover_display::{AnimationCache, CacheError, DisplayConfig, PlayerState, PlayerStatus};
pub use rover_driver::{
    CommandExecutor, DriverError, ExecutorStatus, MotionConfig, MotionOutcome, RoverBuilder,
};
pub use rover_hal::{EchoDriver, HalError, MotorDriver, Panel, PinMap};
pub use rover_protocol::{ActionEvent, ActionKind, MotionCommand, StopSignal};
