//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置
//! 2. 装配整机（启动刹车、显示线程）
//! 3. 执行指令或脚本
//! 4. 释放硬件

use anyhow::Result;
use rover_sdk::MotionCommand;

use crate::commands::RunCommand;
use crate::config::RoverConfig;
use crate::script::{self, Script};
use crate::session::{Session, SessionOptions};

/// One-shot 模式
pub struct OneShotMode {
    session: Session,
}

impl OneShotMode {
    /// 装配整机并接管 Ctrl+C
    pub fn new(config: &RoverConfig, options: &SessionOptions) -> Result<Self> {
        let session = Session::start(config, options)?;
        session.install_ctrlc()?;
        Ok(Self { session })
    }

    /// 执行单条指令
    ///
    /// # 错误
    /// 指令被中止（障碍、急停、执行器故障）时返回错误，进程以非零状态退出。
    pub fn exec(self, command: MotionCommand) -> Result<()> {
        println!("▶️  {}", command);
        let result = self.session.system().execute(command);
        self.session.finish();

        let outcome = result?;
        if outcome.is_completed() {
            println!("✅ 完成");
            Ok(())
        } else {
            anyhow::bail!("指令未完成: {}", outcome)
        }
    }

    /// 执行脚本
    pub fn run(self, program: &Script, keep_going: bool) -> Result<()> {
        let result = script::execute(self.session.system().executor(), program, keep_going);
        RunCommand::report(&result);
        self.session.print_summary();
        self.session.finish();

        if result.is_success() {
            Ok(())
        } else {
            anyhow::bail!("脚本执行失败（{} 条指令失败）", result.failed.len())
        }
    }
}
