//! # Rover Driver
//!
//! 运动控制层：把 `MotionCommand` 变成带障碍检测、可急停的定时电机动作。
//!
//! ## 组成
//!
//! - [`RangingSensor`]: 超声测距，超时按"无障碍"处理（返回 999cm 哨兵值）
//! - [`ActuatorPair`]: 双通道电机，提供前进、后退、原地转向、刹车原语
//! - [`MotionEngine`]: 直线移动（障碍检测）、旋转、组合动作，逐条产出 [`MotionOutcome`]
//! - [`ActionPublisher`]: 向显示线程发布 `ActionEvent` 的无界 FIFO
//! - [`CommandExecutor`]: 指令源入口，`submit(kind, parameter) -> bool`，带忙碌保护
//! - [`RoverBuilder`]: 链式构造引擎和执行器
//!
//! ## 线程模型
//!
//! `MotionEngine::execute` 阻塞调用线程直到物理动作结束。同一时间只允许一条指令在执行，
//! 由 `CommandExecutor` 的忙碌标志保证；其他线程通过共享的 `StopSignal` 打断当前动作。

pub mod actuator;
mod builder;
pub mod config;
pub mod engine;
mod error;
pub mod executor;
pub mod metrics;
pub mod plan;
pub mod publisher;
pub mod sensor;

pub use actuator::{ActuatorPair, ActuatorState};
#[cfg(feature = "sim")]
pub use builder::SimHardware;
pub use builder::RoverBuilder;
pub use config::MotionConfig;
pub use engine::{AbortCause, MotionEngine, MotionOutcome};
pub use error::DriverError;
pub use executor::{CommandExecutor, ExecutorStatus};
pub use metrics::{MetricsSnapshot, MotionMetrics};
pub use plan::{LinearDirection, MotionPlan, MotionStep};
pub use publisher::{ActionPublisher, action_channel};
pub use sensor::{RangingSensor, SENTINEL_DISTANCE_CM, SensorPosition};
