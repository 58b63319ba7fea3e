//! run 命令
//!
//! 执行脚本文件

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::script::{Script, ScriptResult};

/// 脚本执行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 脚本文件路径（每行一条指令）
    pub script: PathBuf,

    /// 失败时继续执行
    #[arg(long)]
    pub keep_going: bool,
}

impl RunCommand {
    /// 加载并打印脚本概要
    pub fn load(&self) -> Result<Script> {
        println!("📜 加载脚本: {}", self.script.display());
        let script = Script::load(&self.script)?;
        println!("📋 {} 条指令", script.len());
        println!();
        Ok(script)
    }

    /// 打印执行结果
    pub fn report(result: &ScriptResult) {
        println!();
        println!("📊 执行结果:");
        println!("  总指令数: {}", result.total_commands);
        println!("  成功: {}", result.succeeded.len());
        println!("  失败: {}", result.failed.len());
        if result.skipped > 0 {
            println!("  跳过: {}", result.skipped);
        }
        println!("  耗时: {:.2} 秒", result.duration_secs);

        if !result.failed.is_empty() {
            println!();
            println!("❌ 失败的指令:");
            for (line_no, err) in &result.failed {
                println!("  第 {} 行: {}", line_no, err);
            }
        }
    }
}
