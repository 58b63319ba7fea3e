//! 指令执行器
//!
//! 指令源（表格轮询、Web Socket、REPL、脚本）的统一入口。
//! 负责边界解码、忙碌保护和状态快照；运动本身交给 `MotionEngine`。

use crate::engine::{MotionEngine, MotionOutcome};
use crate::error::DriverError;
use crate::metrics::{MetricsSnapshot, MotionMetrics};
use crate::publisher::ActionPublisher;
use parking_lot::Mutex;
use rover_hal::{EchoDriver, MotorDriver};
use rover_protocol::{MotionCommand, StopSignal};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// 执行器状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutorStatus {
    /// 是否有指令正在执行
    pub executing: bool,
    /// 最近一条被接受的指令
    pub last_command: Option<String>,
    /// 最近一条指令的结果
    pub last_outcome: Option<MotionOutcome>,
    /// 最近一次拒绝或失败的原因
    pub last_error: Option<String>,
    /// 已执行的指令数
    pub command_count: u64,
    pub total_distance_m: f64,
    pub total_rotation_deg: f64,
}

#[derive(Debug, Default)]
struct StatusRecord {
    last_command: Option<String>,
    last_outcome: Option<MotionOutcome>,
    last_error: Option<String>,
}

/// 忙碌标志守卫，离开作用域时释放
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 指令执行器
///
/// 可在多个线程间共享（`Arc<CommandExecutor<_, _>>`）。同一时间只执行一条指令：
/// 忙碌时新的运动指令被拒绝，急停指令则直接设置急停信号打断当前动作。
///
/// # 示例
///
/// ```
/// use rover_driver::{MotionConfig, RoverBuilder, SimHardware};
///
/// let hw = SimHardware::new();
/// let executor = RoverBuilder::new()
///     .motion_config(MotionConfig {
///         linear_speed_mps: 10.0,
///         poll_interval_ms: 10,
///         ..MotionConfig::default()
///     })
///     .build_sim_executor(&hw)
///     .unwrap();
///
/// assert!(executor.submit("forward", "0.5"));
/// assert!(!executor.submit("fly", "1"));
/// assert_eq!(executor.status().command_count, 1);
/// ```
pub struct CommandExecutor<M: MotorDriver, E: EchoDriver> {
    engine: Mutex<MotionEngine<M, E>>,
    /// 忙碌判定与急停清除在此锁内完成，避免急停落在两者之间被吞掉
    claim: Mutex<()>,
    busy: AtomicBool,
    estop: StopSignal,
    publisher: ActionPublisher,
    metrics: Arc<MotionMetrics>,
    obstacle_animation_s: f64,
    record: Mutex<StatusRecord>,
}

impl<M: MotorDriver, E: EchoDriver> CommandExecutor<M, E> {
    pub fn new(engine: MotionEngine<M, E>) -> Self {
        Self {
            claim: Mutex::new(()),
            busy: AtomicBool::new(false),
            estop: engine.estop(),
            publisher: engine.publisher().clone(),
            metrics: engine.metrics(),
            obstacle_animation_s: engine.config().obstacle_animation_s,
            engine: Mutex::new(engine),
            record: Mutex::new(StatusRecord::default()),
        }
    }

    /// 提交 `(kind, parameter)` 指令，阻塞到执行结束
    ///
    /// 返回指令是否成功完成：未知指令、忙碌拒绝和中止都返回 `false`。
    pub fn submit(&self, kind: &str, parameter: &str) -> bool {
        match MotionCommand::parse(kind, parameter) {
            Ok(command) => self.submit_command(command),
            Err(e) => {
                warn!("Rejected command {:?}: {}", kind, e);
                self.record.lock().last_error = Some(DriverError::from(e).to_string());
                false
            },
        }
    }

    /// 提交单行文本指令（如 `"left turn 45"`）
    pub fn submit_line(&self, line: &str) -> bool {
        match MotionCommand::parse_line(line) {
            Ok(command) => self.submit_command(command),
            Err(e) => {
                warn!("Rejected command line {:?}: {}", line, e);
                self.record.lock().last_error = Some(DriverError::from(e).to_string());
                false
            },
        }
    }

    /// 提交已解码的指令
    pub fn submit_command(&self, command: MotionCommand) -> bool {
        match self.execute(command) {
            Ok(outcome) => outcome.is_completed(),
            Err(e) => {
                warn!("Rejected {}: {}", command, e);
                self.record.lock().last_error = Some(e.to_string());
                false
            },
        }
    }

    /// 执行指令
    ///
    /// # 错误
    /// - `DriverError::Busy`: 另一条运动指令正在执行
    pub fn execute(&self, command: MotionCommand) -> Result<MotionOutcome, DriverError> {
        let _guard = {
            let _claim = self.claim.lock();
            if self.busy.load(Ordering::Acquire) {
                if command.is_stop() {
                    info!("Emergency stop while busy, interrupting current motion");
                    self.estop.set();
                    self.publisher.publish_obstacle(self.obstacle_animation_s);
                    return Ok(MotionOutcome::Completed);
                }
                return Err(DriverError::Busy);
            }
            self.busy.store(true, Ordering::Release);
            if !command.is_stop() {
                self.estop.clear();
            }
            BusyGuard(&self.busy)
        };

        self.record.lock().last_command = Some(command.to_string());
        let outcome = self.engine.lock().execute_cleared(command);

        let mut record = self.record.lock();
        record.last_outcome = Some(outcome);
        record.last_error = outcome.cause().map(|cause| cause.to_string());
        Ok(outcome)
    }

    /// 当前是否有指令在执行
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 急停信号（可交给 Ctrl-C 等处理器）
    pub fn estop(&self) -> StopSignal {
        self.estop.clone()
    }

    /// 空闲时通知显示线程播放空闲动画
    pub fn publish_idle(&self) -> bool {
        self.publisher.publish_idle()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn status(&self) -> ExecutorStatus {
        let record = self.record.lock();
        let metrics = self.metrics.snapshot();
        ExecutorStatus {
            executing: self.is_busy(),
            last_command: record.last_command.clone(),
            last_outcome: record.last_outcome,
            last_error: record.last_error.clone(),
            command_count: metrics.commands,
            total_distance_m: metrics.total_distance_m,
            total_rotation_deg: metrics.total_rotation_deg,
        }
    }
}
