//! Builder 模式实现
//!
//! 提供链式构造 `MotionEngine` / `CommandExecutor` 的便捷方式。

use crate::actuator::ActuatorPair;
use crate::config::MotionConfig;
use crate::engine::MotionEngine;
use crate::error::DriverError;
use crate::executor::CommandExecutor;
use crate::publisher::ActionPublisher;
use crate::sensor::{RangingSensor, SensorPosition};
use rover_hal::{EchoDriver, MotorDriver, PinMap};
use rover_protocol::StopSignal;
use tracing::{error, info};

/// Rover Builder（链式构造）
///
/// # Example
///
/// ```
/// use rover_driver::{RoverBuilder, SimHardware, action_channel};
///
/// let (publisher, _events) = action_channel();
/// let hw = SimHardware::new();
/// let engine = RoverBuilder::new()
///     .publisher(publisher)
///     .build_sim(&hw)
///     .unwrap();
/// assert!(engine.actuator_state().is_idle());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoverBuilder {
    config: MotionConfig,
    pins: PinMap,
    estop: Option<StopSignal>,
    publisher: Option<ActionPublisher>,
}

impl RoverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置运动参数（可选，默认实车标定）
    pub fn motion_config(mut self, config: MotionConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置引脚分配（可选）
    pub fn pins(mut self, pins: PinMap) -> Self {
        self.pins = pins;
        self
    }

    /// 共享外部急停信号（可选，默认新建）
    pub fn estop(mut self, estop: StopSignal) -> Self {
        self.estop = Some(estop);
        self
    }

    /// 动作事件发布端（可选，默认丢弃事件）
    pub fn publisher(mut self, publisher: ActionPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// 构建运动引擎
    ///
    /// 启动时先刹车，把电机置于已知状态。失败时已获取的驱动随返回值一起释放。
    ///
    /// # 参数
    /// - `motors`: 电机驱动
    /// - `front` / `rear`: 前后测距驱动
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 运动参数非法
    /// - `DriverError::PinConflict`: 引脚重复分配
    /// - `DriverError::Hal`: 初始刹车失败
    pub fn build<M: MotorDriver, E: EchoDriver>(
        self,
        motors: M,
        front: E,
        rear: E,
    ) -> Result<MotionEngine<M, E>, DriverError> {
        self.config.validate()?;
        if let Some(pin) = self.pins.find_conflict() {
            return Err(DriverError::PinConflict(pin));
        }

        let mut actuators = ActuatorPair::new(motors);
        if let Err(e) = actuators.brake() {
            error!("Failed to bring actuators to a known state: {}", e);
            return Err(e.into());
        }

        let timeout = self.config.echo_timeout();
        let front = RangingSensor::new(front, self.pins.front, SensorPosition::Front)
            .with_timeout(timeout);
        let rear =
            RangingSensor::new(rear, self.pins.rear, SensorPosition::Rear).with_timeout(timeout);

        info!(
            "Motion engine ready: {:.2} m/s, {:.0} deg/s, obstacle threshold {:.0}cm",
            self.config.linear_speed_mps,
            self.config.rotation_speed_dps,
            self.config.obstacle_threshold_cm
        );

        MotionEngine::new(
            self.config,
            actuators,
            front,
            rear,
            self.estop.unwrap_or_default(),
            self.publisher.unwrap_or_else(ActionPublisher::detached),
        )
    }

    /// 构建指令执行器
    pub fn build_executor<M: MotorDriver, E: EchoDriver>(
        self,
        motors: M,
        front: E,
        rear: E,
    ) -> Result<CommandExecutor<M, E>, DriverError> {
        Ok(CommandExecutor::new(self.build(motors, front, rear)?))
    }
}

#[cfg(feature = "sim")]
pub use sim::SimHardware;

#[cfg(feature = "sim")]
mod sim {
    use super::*;
    use rover_hal::sim::{SimMotors, SimRanging};

    /// 一整套模拟硬件
    ///
    /// 字段是共享句柄：构建引擎后仍可通过它们注入读数、观察电机状态。
    #[derive(Debug, Clone)]
    pub struct SimHardware {
        pub motors: SimMotors,
        pub front: SimRanging,
        pub rear: SimRanging,
    }

    impl SimHardware {
        /// 前后方向都空旷（200cm）
        pub fn new() -> Self {
            Self {
                motors: SimMotors::new(),
                front: SimRanging::new(200.0),
                rear: SimRanging::new(200.0),
            }
        }

        /// 随机障碍模型（可复现）
        pub fn random(seed: u64) -> Self {
            Self {
                motors: SimMotors::new(),
                front: SimRanging::random(seed),
                rear: SimRanging::random(seed.wrapping_add(1)),
            }
        }
    }

    impl Default for SimHardware {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RoverBuilder {
        /// 基于模拟硬件构建运动引擎
        pub fn build_sim(
            self,
            hw: &SimHardware,
        ) -> Result<MotionEngine<SimMotors, SimRanging>, DriverError> {
            self.build(hw.motors.clone(), hw.front.clone(), hw.rear.clone())
        }

        /// 基于模拟硬件构建指令执行器
        pub fn build_sim_executor(
            self,
            hw: &SimHardware,
        ) -> Result<CommandExecutor<SimMotors, SimRanging>, DriverError> {
            self.build_executor(hw.motors.clone(), hw.front.clone(), hw.rear.clone())
        }
    }
}
