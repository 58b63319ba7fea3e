//! 硬件会话
//!
//! 根据配置和后端选择装配 `RoverSystem`，并把 Ctrl-C 接到急停信号上。

use crate::config::RoverConfig;
use anyhow::{Context, Result};
use clap::ValueEnum;
use rover_sdk::driver::SimHardware;
use rover_sdk::hal::sim::{SimMotors, SimPanel, SimRanging};
use rover_sdk::{RoverBuilder, RoverSystem};

/// 硬件后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// 模拟硬件，前后方向始终空旷
    Sim,
    /// 模拟硬件，随机障碍（5% 概率 5-15cm）
    Random,
}

/// 会话选项
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub backend: Backend,
    /// 随机障碍模型的种子
    pub seed: u64,
    /// 是否启动显示线程
    pub display: bool,
}

/// 一次 CLI 运行期间持有的整机
pub struct Session {
    system: RoverSystem<SimMotors, SimRanging>,
    hardware: SimHardware,
}

impl Session {
    /// 按配置和后端装配整机
    pub fn start(config: &RoverConfig, options: &SessionOptions) -> Result<Self> {
        let hardware = match options.backend {
            Backend::Sim => SimHardware::new(),
            Backend::Random => SimHardware::random(options.seed),
        };

        let builder = RoverBuilder::new()
            .motion_config(config.motion.clone())
            .pins(config.pins);

        let system = if options.display {
            let (width, height) = config.display.display_size();
            RoverSystem::start_sim(
                builder,
                &hardware,
                SimPanel::new(width, height),
                config.display.clone(),
            )
        } else {
            RoverSystem::headless(builder, &hardware)
        }
        .context("启动小车失败")?;

        Ok(Self { system, hardware })
    }

    /// 安装 Ctrl-C 处理器：设置急停信号
    ///
    /// 每个进程只能安装一次。
    pub fn install_ctrlc(&self) -> Result<()> {
        let estop = self.system.estop();
        ctrlc::set_handler(move || {
            if !estop.set() {
                eprintln!("\n🛑 收到 Ctrl+C，执行急停...");
            }
        })
        .context("安装 Ctrl+C 处理器失败")
    }

    pub fn system(&self) -> &RoverSystem<SimMotors, SimRanging> {
        &self.system
    }

    pub fn hardware(&self) -> &SimHardware {
        &self.hardware
    }

    /// 打印会话摘要
    pub fn print_summary(&self) {
        let status = self.system.status();
        println!("📊 会话统计:");
        println!("  指令数: {}", status.command_count);
        println!("  累计距离: {:.2} m", status.total_distance_m);
        println!("  累计旋转: {:.1}°", status.total_rotation_deg);
        if let Some(player) = self.system.player_status() {
            println!("  已推送帧: {}", player.frames_rendered);
        }
    }

    /// 停止显示线程并释放硬件
    pub fn finish(self) {
        self.system.shutdown();
    }
}
