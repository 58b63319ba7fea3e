//! # Rover Protocol
//!
//! 运动指令与动作事件的共享词汇层，不依赖任何硬件。
//!
//! ## 包含模块
//!
//! - `command` - 运动指令（`MotionCommand`）及边界解析
//! - `event` - 动作事件（`ActionKind` / `ActionEvent`），连接运动与显示
//! - `signal` - 跨线程取消标志（急停、停止播放）
//!
//! ## 使用示例
//!
//! ```rust
//! use rover_protocol::{ActionKind, MotionCommand};
//!
//! let cmd = MotionCommand::parse("forward", "2").unwrap();
//! assert_eq!(cmd, MotionCommand::Forward(2.0));
//! assert_eq!(cmd.action_kind(), ActionKind::Forward);
//! ```

pub mod command;
pub mod event;
pub mod signal;

pub use command::{CommandParseError, MotionCommand};
pub use event::{ActionEvent, ActionKind};
pub use signal::StopSignal;
