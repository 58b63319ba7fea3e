//! exec 命令
//!
//! 执行单条指令后退出

use anyhow::{Context, Result};
use clap::Args;
use rover_sdk::MotionCommand;

/// 单条指令参数
#[derive(Args, Debug)]
pub struct ExecCommand {
    /// 指令（如 `forward 2`、`left turn 45`、`dance`）
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,
}

impl ExecCommand {
    /// 解析为运动指令
    pub fn command(&self) -> Result<MotionCommand> {
        let line = self.words.join(" ");
        MotionCommand::parse_line(&line).with_context(|| format!("无法识别的指令: {:?}", line))
    }
}
