//! 配置管理命令

use crate::config::RoverConfig;
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置文件
    Init {
        /// 已存在时直接覆盖，不询问
        #[arg(short, long)]
        force: bool,
    },

    /// 显示生效的配置（TOML）
    Show,

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Init { force } => Self::init_(path, force),
            ConfigCommand::Show => Self::show_(path),
            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
        }
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            let confirmed = inquire::Confirm::new("配置文件已存在，是否覆盖？")
                .with_default(false)
                .prompt()
                .map_err(|e| anyhow::anyhow!("用户交互失败: {}", e))?;

            if !confirmed {
                println!("❌ 操作已取消");
                return Ok(());
            }
        }

        RoverConfig::default().save(path)?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(path: &Path) -> Result<()> {
        let config = RoverConfig::load(path)?;
        if path.exists() {
            println!("# 配置文件: {}", path.display());
        } else {
            println!("# 配置文件不存在，使用默认值: {}", path.display());
        }
        print!("{}", config.to_toml()?);
        Ok(())
    }
}
