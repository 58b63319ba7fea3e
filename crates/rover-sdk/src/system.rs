//! 运动 + 显示整机装配
//!
//! 两条长期运行的线程只通过动作事件通道和急停信号相连：
//! 指令线程（调用方）驱动 `CommandExecutor`，显示线程运行 `DisplayPlayer`。

use rover_display::{AnimationCache, CacheError, DisplayConfig, DisplayPlayer, PlayerHandle, PlayerStatus};
use rover_driver::{
    CommandExecutor, DriverError, ExecutorStatus, MotionOutcome, RoverBuilder, action_channel,
};
use rover_hal::{EchoDriver, MotorDriver, Panel};
use rover_protocol::{MotionCommand, StopSignal};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// 启动失败
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Display error: {0}")]
    Display(#[from] CacheError),

    /// 显示线程创建失败
    #[error("Failed to spawn display thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// 整机：指令执行器 + 可选的显示播放线程
///
/// Drop 时停止显示线程（清屏），随后执行器释放电机（刹车）。
pub struct RoverSystem<M: MotorDriver, E: EchoDriver> {
    executor: Arc<CommandExecutor<M, E>>,
    cache: Option<Arc<AnimationCache>>,
    player: Option<PlayerHandle>,
}

impl<M: MotorDriver, E: EchoDriver> RoverSystem<M, E> {
    /// 启动带显示屏的整机
    ///
    /// 先构建执行器（启动刹车），再创建显示线程；任一步失败时已获取的硬件随返回值释放。
    ///
    /// # 参数
    /// - `builder`: 运动参数、引脚和急停配置（发布端由这里接管）
    /// - `motors` / `front` / `rear`: 运动硬件
    /// - `panel`: 显示屏
    /// - `display`: 显示与缓存配置
    ///
    /// # 错误
    /// - `SystemError::Driver`: 配置非法、引脚冲突或启动刹车失败
    /// - `SystemError::Display`: 显示配置非法或屏幕尺寸与配置不一致
    /// - `SystemError::Spawn`: 显示线程创建失败
    pub fn start<P: Panel + 'static>(
        builder: RoverBuilder,
        motors: M,
        front: E,
        rear: E,
        panel: P,
        display: DisplayConfig,
    ) -> Result<Self, SystemError> {
        let cache = Arc::new(AnimationCache::new(display)?);

        let (publisher, events) = action_channel();
        let executor = builder.publisher(publisher).build_executor(motors, front, rear)?;

        let player = DisplayPlayer::new(panel, Arc::clone(&cache), events)?.spawn()?;
        info!("Rover system started with display");

        Ok(Self {
            executor: Arc::new(executor),
            cache: Some(cache),
            player: Some(player),
        })
    }

    /// 启动无显示屏的整机（动作事件被丢弃）
    pub fn start_headless(
        builder: RoverBuilder,
        motors: M,
        front: E,
        rear: E,
    ) -> Result<Self, SystemError> {
        let executor = builder.build_executor(motors, front, rear)?;
        info!("Rover system started without display");

        Ok(Self {
            executor: Arc::new(executor),
            cache: None,
            player: None,
        })
    }

    /// 指令执行器（可跨线程共享）
    pub fn executor(&self) -> &Arc<CommandExecutor<M, E>> {
        &self.executor
    }

    /// 动画缓存；无显示屏时为 `None`
    pub fn cache(&self) -> Option<&Arc<AnimationCache>> {
        self.cache.as_ref()
    }

    /// 急停信号
    pub fn estop(&self) -> StopSignal {
        self.executor.estop()
    }

    /// 提交 `(kind, parameter)` 指令
    pub fn submit(&self, kind: &str, parameter: &str) -> bool {
        self.executor.submit(kind, parameter)
    }

    /// 提交单行文本指令
    pub fn submit_line(&self, line: &str) -> bool {
        self.executor.submit_line(line)
    }

    /// 执行已解码的指令
    pub fn execute(&self, command: MotionCommand) -> Result<MotionOutcome, DriverError> {
        self.executor.execute(command)
    }

    /// 指令源空闲：让显示线程立即切回待机动画
    ///
    /// 待机播放会被下一条指令的事件抢占。
    pub fn idle(&self) -> bool {
        self.executor.publish_idle()
    }

    pub fn status(&self) -> ExecutorStatus {
        self.executor.status()
    }

    /// 显示线程状态；无显示屏时为 `None`
    pub fn player_status(&self) -> Option<PlayerStatus> {
        self.player.as_ref().map(|p| p.status())
    }

    /// 停止显示线程并释放硬件
    pub fn shutdown(mut self) {
        if let Some(player) = self.player.take() {
            player.stop();
        }
        info!("Rover system shut down");
    }
}

#[cfg(feature = "sim")]
mod sim {
    use super::*;
    use rover_driver::SimHardware;
    use rover_hal::sim::{SimMotors, SimRanging};

    impl RoverSystem<SimMotors, SimRanging> {
        /// 基于模拟硬件启动带显示屏的整机
        pub fn start_sim<P: Panel + 'static>(
            builder: RoverBuilder,
            hw: &SimHardware,
            panel: P,
            display: DisplayConfig,
        ) -> Result<Self, SystemError> {
            Self::start(
                builder,
                hw.motors.clone(),
                hw.front.clone(),
                hw.rear.clone(),
                panel,
                display,
            )
        }

        /// 基于模拟硬件启动无显示屏的整机
        pub fn headless(builder: RoverBuilder, hw: &SimHardware) -> Result<Self, SystemError> {
            Self::start_headless(builder, hw.motors.clone(), hw.front.clone(), hw.rear.clone())
        }
    }
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use rover_driver::{MotionConfig, SimHardware};
    use rover_hal::sim::SimPanel;

    #[test]
    fn test_panel_mismatch_releases_motors() {
        let hw = SimHardware::new();
        let dir = std::env::temp_dir().join("rover-sdk-mismatch");
        let result = RoverSystem::start_sim(
            RoverBuilder::new(),
            &hw,
            SimPanel::new(10, 10),
            DisplayConfig {
                cache_dir: dir,
                ..DisplayConfig::default()
            },
        );

        assert!(matches!(result, Err(SystemError::Display(_))));
        assert!(hw.motors.is_idle());
    }

    #[test]
    fn test_headless_has_no_player() {
        let hw = SimHardware::new();
        let system = RoverSystem::headless(
            RoverBuilder::new().motion_config(MotionConfig {
                rotation_speed_dps: 3600.0,
                poll_interval_ms: 5,
                ..MotionConfig::default()
            }),
            &hw,
        )
        .unwrap();

        assert!(system.player_status().is_none());
        assert!(system.cache().is_none());
        assert!(system.submit("left turn", "90"));
        assert_eq!(system.status().command_count, 1);
        system.shutdown();
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let hw = SimHardware::new();
        let result = RoverSystem::headless(
            RoverBuilder::new().motion_config(MotionConfig {
                poll_interval_ms: 0,
                ..MotionConfig::default()
            }),
            &hw,
        );
        assert!(matches!(
            result,
            Err(SystemError::Driver(DriverError::InvalidConfig(_)))
        ));
    }
}
