//! 运动引擎
//!
//! 把一条 `MotionCommand` 展开为运动计划并逐步执行：
//!
//! - **直线移动**：按固定间隔轮询，依次检查 (a) 已到时长 → 完成，
//!   (b) 行进方向的传感器读数低于阈值 → 障碍中止，(c) 急停信号 → 外部中止。
//!   任何中止都会立即把电机清零；仅障碍中止会反向低速回退一小段。
//! - **旋转**：不做障碍检测，但同样按轮询间隔检查急停。
//! - **组合动作**：任一步骤中止则整个序列中止，原因向上传递。
//!
//! 引擎从不返回错误：硬件写入失败折叠为 `Aborted { ActuatorFault }`。

use crate::actuator::{ActuatorPair, ActuatorState};
use crate::config::MotionConfig;
use crate::error::DriverError;
use crate::metrics::MotionMetrics;
use crate::plan::{LinearDirection, MotionPlan, MotionStep};
use crate::publisher::ActionPublisher;
use crate::sensor::{RangingSensor, SensorPosition};
use rover_hal::{EchoDriver, HalError, MotorDriver};
use rover_protocol::{ActionEvent, MotionCommand, StopSignal};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 中止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortCause {
    /// 指定位置的传感器检测到障碍
    Obstacle(SensorPosition),
    /// 急停信号
    ExternalStop,
    /// 电机写入失败
    ActuatorFault,
}

impl std::fmt::Display for AbortCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Obstacle(position) => write!(f, "obstacle detected by {} sensor", position),
            Self::ExternalStop => f.write_str("emergency stop"),
            Self::ActuatorFault => f.write_str("actuator fault"),
        }
    }
}

/// 指令执行结果（每次 `execute` 恰好产出一个）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MotionOutcome {
    Completed,
    Aborted { cause: AbortCause },
}

impl MotionOutcome {
    pub fn aborted(cause: AbortCause) -> Self {
        Self::Aborted { cause }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// 中止原因；完成时返回 `None`
    pub fn cause(&self) -> Option<AbortCause> {
        match self {
            Self::Completed => None,
            Self::Aborted { cause } => Some(*cause),
        }
    }
}

impl std::fmt::Display for MotionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted { cause } => write!(f, "aborted ({})", cause),
        }
    }
}

/// 运动引擎
///
/// 独占执行器和两个测距传感器。`execute` 需要 `&mut self`，
/// 因此同一实例上不可能有并发的运动原语。
pub struct MotionEngine<M: MotorDriver, E: EchoDriver> {
    config: MotionConfig,
    actuators: ActuatorPair<M>,
    front: RangingSensor<E>,
    rear: RangingSensor<E>,
    estop: StopSignal,
    publisher: ActionPublisher,
    metrics: Arc<MotionMetrics>,
}

impl<M: MotorDriver, E: EchoDriver> MotionEngine<M, E> {
    /// 创建引擎
    ///
    /// # 参数
    /// - `config`: 运动参数（会先校验）
    /// - `actuators`: 执行器
    /// - `front` / `rear`: 前后测距传感器
    /// - `estop`: 急停信号（与指令源共享）
    /// - `publisher`: 动作事件发布端
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 配置非法
    pub fn new(
        config: MotionConfig,
        actuators: ActuatorPair<M>,
        front: RangingSensor<E>,
        rear: RangingSensor<E>,
        estop: StopSignal,
        publisher: ActionPublisher,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        // 单次测距不得超过一个轮询间隔，否则急停响应会被回波等待拖慢
        let poll = config.poll_interval();
        let front_timeout = front.timeout().min(poll);
        let rear_timeout = rear.timeout().min(poll);

        Ok(Self {
            config,
            actuators,
            front: front.with_timeout(front_timeout),
            rear: rear.with_timeout(rear_timeout),
            estop,
            publisher,
            metrics: Arc::new(MotionMetrics::new()),
        })
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// 急停信号（克隆后可交给其他线程）
    pub fn estop(&self) -> StopSignal {
        self.estop.clone()
    }

    pub fn publisher(&self) -> &ActionPublisher {
        &self.publisher
    }

    pub fn metrics(&self) -> Arc<MotionMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn actuator_state(&self) -> ActuatorState {
        self.actuators.state()
    }

    /// 指令的预计时长（急停为 0）
    pub fn planned_duration(&self, command: MotionCommand) -> Duration {
        MotionPlan::for_command(command)
            .map(|plan| plan.duration(&self.config))
            .unwrap_or(Duration::ZERO)
    }

    /// 执行一条指令，阻塞到物理动作结束
    ///
    /// 除急停外，执行前先清除急停信号，并发布对应的动作事件。
    /// 障碍中止和急停指令会额外发布障碍动画事件。
    pub fn execute(&mut self, command: MotionCommand) -> MotionOutcome {
        if !command.is_stop() {
            self.estop.clear();
        }
        self.execute_cleared(command)
    }

    /// 执行指令，不清除急停信号
    ///
    /// 调用方已在接受指令时清除过信号，此后到达的急停必须生效。
    pub(crate) fn execute_cleared(&mut self, command: MotionCommand) -> MotionOutcome {
        let outcome = match MotionPlan::for_command(command) {
            None => self.stop(),
            Some(plan) => {
                let duration = plan.duration(&self.config);
                info!(
                    "Executing {} (planned {:.3}s)",
                    command,
                    duration.as_secs_f64()
                );
                self.publisher
                    .publish(ActionEvent::new(plan.kind, duration.as_secs_f64()));

                let outcome = self.run_plan(&plan);
                if let Some(AbortCause::Obstacle(_)) = outcome.cause() {
                    self.publisher
                        .publish_obstacle(self.config.obstacle_animation_s);
                }
                outcome
            },
        };

        match outcome {
            MotionOutcome::Completed => info!("{} completed", command),
            MotionOutcome::Aborted { cause } => warn!("{} aborted: {}", command, cause),
        }
        self.metrics.record_outcome(&outcome);
        outcome
    }

    /// 急停：设置信号并立即刹车
    fn stop(&mut self) -> MotionOutcome {
        info!("Emergency stop requested");
        self.estop.set();
        self.publisher
            .publish_obstacle(self.config.obstacle_animation_s);

        let result = self.actuators.brake().and_then(|()| {
            if self.actuators.state().pwm_running {
                self.actuators.stop_pwm()
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => MotionOutcome::Completed,
            Err(e) => {
                error!("Brake failed during emergency stop: {}", e);
                MotionOutcome::aborted(AbortCause::ExternalStop)
            },
        }
    }

    fn run_plan(&mut self, plan: &MotionPlan) -> MotionOutcome {
        for step in &plan.steps {
            let outcome = match *step {
                MotionStep::Linear {
                    direction,
                    distance_m,
                } => self.linear_move(direction, distance_m),
                MotionStep::Rotate { angle_deg } => self.rotate(angle_deg),
                MotionStep::Pause(pause) => {
                    if self.wait(pause) {
                        MotionOutcome::Completed
                    } else {
                        MotionOutcome::aborted(AbortCause::ExternalStop)
                    }
                },
            };
            if !outcome.is_completed() {
                return outcome;
            }
        }
        MotionOutcome::Completed
    }

    /// 带障碍检测的直线移动
    fn linear_move(&mut self, direction: LinearDirection, distance_m: f64) -> MotionOutcome {
        let duration = self.config.linear_duration(distance_m);
        if duration.is_zero() {
            debug!("Zero-length {:?} move skipped", direction);
            return MotionOutcome::Completed;
        }

        let guard = match direction {
            LinearDirection::Forward => SensorPosition::Front,
            LinearDirection::Backward => SensorPosition::Rear,
        };
        debug!(
            "Linear {:?} {:.2}m over {:.3}s, guarded by {} sensor",
            direction,
            distance_m,
            duration.as_secs_f64(),
            guard
        );

        if let Err(e) = self.start_linear(direction, self.config.drive_duty) {
            error!("Failed to start {:?} move: {}", direction, e);
            return self.finish(MotionOutcome::aborted(AbortCause::ActuatorFault));
        }

        let poll = self.config.poll_interval();
        let threshold = self.config.obstacle_threshold_cm;
        let started = Instant::now();

        let mut outcome = loop {
            let tick = Instant::now();
            if started.elapsed() >= duration {
                break MotionOutcome::Completed;
            }
            if self.estop.is_set() {
                break MotionOutcome::aborted(AbortCause::ExternalStop);
            }

            let sensor = match guard {
                SensorPosition::Front => &mut self.front,
                SensorPosition::Rear => &mut self.rear,
            };
            let distance_cm = sensor.measure_cm();
            if distance_cm < threshold {
                warn!(
                    "Obstacle at {:.2}cm on {} sensor (threshold {:.0}cm)",
                    distance_cm, guard, threshold
                );
                break MotionOutcome::aborted(AbortCause::Obstacle(guard));
            }

            if self.estop.is_set() {
                break MotionOutcome::aborted(AbortCause::ExternalStop);
            }

            // 测距耗时计入本次轮询
            let remaining = duration.saturating_sub(started.elapsed());
            spin_sleep::sleep(poll.saturating_sub(tick.elapsed()).min(remaining));
        };

        let elapsed = started.elapsed().min(duration);
        self.metrics
            .add_distance(elapsed.as_secs_f64() * self.config.linear_speed_mps);

        if let Err(e) = self.actuators.brake() {
            error!("Failed to brake after {:?} move: {}", direction, e);
            outcome = MotionOutcome::aborted(AbortCause::ActuatorFault);
        }

        if let Some(AbortCause::Obstacle(_)) = outcome.cause() {
            self.recover(direction.reverse());
        }

        self.finish(outcome)
    }

    /// 避障回退：反方向低速移动固定时长，期间仍响应急停
    fn recover(&mut self, direction: LinearDirection) {
        let duration = self.config.recovery_duration();
        info!(
            "Recovering {:?} for {}ms at {}% duty",
            direction,
            duration.as_millis(),
            self.config.recovery_duty
        );

        match self.start_linear(direction, self.config.recovery_duty) {
            Ok(()) => {
                if !self.wait(duration) {
                    debug!("Recovery interrupted by emergency stop");
                }
            },
            Err(e) => error!("Recovery nudge failed: {}", e),
        }

        if let Err(e) = self.actuators.brake() {
            error!("Failed to brake after recovery: {}", e);
        }
    }

    /// 原地旋转；负角度左转，正角度右转
    fn rotate(&mut self, angle_deg: f64) -> MotionOutcome {
        if angle_deg == 0.0 || !angle_deg.is_finite() {
            debug!("Rotation of {} degrees skipped", angle_deg);
            return MotionOutcome::Completed;
        }

        let duration = self.config.rotation_duration(angle_deg);
        debug!(
            "Rotating {:.1}° over {:.3}s",
            angle_deg,
            duration.as_secs_f64()
        );

        let duty = self.config.drive_duty;
        let started = self
            .actuators
            .start_pwm(self.config.rotate_pwm_hz)
            .and_then(|()| {
                if angle_deg < 0.0 {
                    self.actuators.rotate_left(duty)
                } else {
                    self.actuators.rotate_right(duty)
                }
            });
        if let Err(e) = started {
            error!("Failed to start rotation: {}", e);
            return self.finish(MotionOutcome::aborted(AbortCause::ActuatorFault));
        }

        let began = Instant::now();
        let mut outcome = if self.wait(duration) {
            MotionOutcome::Completed
        } else {
            MotionOutcome::aborted(AbortCause::ExternalStop)
        };

        let elapsed = began.elapsed().min(duration);
        self.metrics
            .add_rotation(elapsed.as_secs_f64() * self.config.rotation_speed_dps);

        if let Err(e) = self.actuators.brake() {
            error!("Failed to brake after rotation: {}", e);
            outcome = MotionOutcome::aborted(AbortCause::ActuatorFault);
        }

        self.finish(outcome)
    }

    fn start_linear(&mut self, direction: LinearDirection, duty: f64) -> Result<(), HalError> {
        if !self.actuators.state().pwm_running {
            self.actuators.start_pwm(self.config.linear_pwm_hz)?;
        }
        match direction {
            LinearDirection::Forward => self.actuators.drive_forward(duty),
            LinearDirection::Backward => self.actuators.drive_backward(duty),
        }
    }

    /// 原语收尾：确保刹车并释放 PWM
    fn finish(&mut self, mut outcome: MotionOutcome) -> MotionOutcome {
        if !self.actuators.state().stopped
            && let Err(e) = self.actuators.brake()
        {
            error!("Failed to brake: {}", e);
            outcome = MotionOutcome::aborted(AbortCause::ActuatorFault);
        }
        if self.actuators.state().pwm_running
            && let Err(e) = self.actuators.stop_pwm()
        {
            warn!("Failed to stop PWM: {}", e);
        }
        outcome
    }

    /// 可被急停打断的等待
    ///
    /// 按轮询间隔分段睡眠，返回 `true` 表示等满时长，`false` 表示被急停打断。
    fn wait(&self, duration: Duration) -> bool {
        let poll = self.config.poll_interval();
        let started = Instant::now();
        loop {
            if self.estop.is_set() {
                return false;
            }
            let remaining = duration.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return true;
            }
            spin_sleep::sleep(poll.min(remaining));
        }
    }
}
