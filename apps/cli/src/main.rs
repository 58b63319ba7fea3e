//! # Rover CLI
//!
//! Command-line interface for the obstacle-aware rover.
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（推荐用于 CI/脚本）
//!
//! ```bash
//! # 写入默认配置
//! rover-cli config init
//!
//! # 执行单条指令（内部：装配 -> 执行 -> 释放）
//! rover-cli exec forward 2
//! rover-cli exec left turn 45
//!
//! # 执行脚本
//! rover-cli run square.txt --keep-going
//! ```
//!
//! ### REPL 模式（推荐用于调试）
//!
//! ```bash
//! $ rover-cli shell
//! rover> forward 1
//! rover> obstacle front 10
//! rover> forward 1
//! rover> status
//! rover> exit
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod modes;
mod script;
mod session;

use commands::{CacheCommand, ConfigCommand, ExecCommand, RunCommand};
use config::RoverConfig;
use modes::oneshot::OneShotMode;
use modes::repl::run_repl;
use session::{Backend, SessionOptions};

/// Rover CLI - 避障小车命令行工具
#[derive(Parser, Debug)]
#[command(name = "rover-cli")]
#[command(about = "Command-line interface for the obstacle-aware rover", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/rover/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 硬件后端
    #[arg(long, value_enum, global = true, default_value_t = Backend::Sim)]
    backend: Backend,

    /// 随机障碍模型的种子（--backend random）
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    /// 不启动显示线程
    #[arg(long, global = true)]
    no_display: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 执行单条指令
    Exec {
        #[command(flatten)]
        args: ExecCommand,
    },

    /// 执行脚本
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 动画缓存维护
    #[command(subcommand)]
    Cache(CacheCommand),

    /// 启动交互式 Shell（REPL 模式）
    Shell,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rover_cli=info".parse::<tracing_subscriber::filter::Directive>()?),
        )
        .init();

    let cli = Cli::parse();
    let config_path = config::resolve_path(cli.config.as_deref())?;
    let options = SessionOptions {
        backend: cli.backend,
        seed: cli.seed,
        display: !cli.no_display,
    };

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config_path),

        Commands::Exec { args } => {
            // One-shot 模式：单条指令
            let command = args.command()?;
            let config = RoverConfig::load(&config_path)?;
            OneShotMode::new(&config, &options)?.exec(command)
        },

        Commands::Run { args } => {
            // One-shot 模式：脚本（先解析，解析失败不启动硬件）
            let script = args.load()?;
            let config = RoverConfig::load(&config_path)?;
            OneShotMode::new(&config, &options)?.run(&script, args.keep_going)
        },

        Commands::Cache(cmd) => {
            let config = RoverConfig::load(&config_path)?;
            cmd.execute(config.display)
        },

        Commands::Shell => {
            // REPL 模式：交互式 Shell
            let config = RoverConfig::load(&config_path)?;
            run_repl(&config, &options)
        },
    }
}
