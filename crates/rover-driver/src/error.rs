//! 运动控制层错误类型定义

use rover_hal::HalError;
use rover_protocol::CommandParseError;
use thiserror::Error;

/// 运动控制层错误类型
///
/// 只出现在构造和指令入口处；`MotionEngine::execute` 内部的硬件错误
/// 一律折叠为 `MotionOutcome::Aborted`。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 硬件层错误（启动时引脚获取、初始刹车失败等）
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),

    /// 指令解析失败
    #[error("Command rejected: {0}")]
    Parse(#[from] CommandParseError),

    /// 配置非法
    #[error("Invalid motion config: {0}")]
    InvalidConfig(String),

    /// 引脚被重复分配
    #[error("Pin {0} is assigned more than once")]
    PinConflict(u8),

    /// 已有指令在执行
    #[error("Executor busy: another command is in flight")]
    Busy,
}
