//! REPL 模式（交互式 Shell）
//!
//! 专用输入线程 + 通道：运动指令在主线程阻塞执行期间，输入线程仍能读取
//! `stop` 和 Ctrl+C 并直接触发急停。

use anyhow::Result;
use crossbeam_channel::{Receiver, bounded};
use rover_sdk::hal::sim::{SimMotors, SimRanging, SimReading};
use rover_sdk::{CommandExecutor, MotionCommand};
use rustyline::Editor;
use std::sync::Arc;
use std::thread;

use crate::config::RoverConfig;
use crate::session::{Session, SessionOptions};

type SimExecutor = CommandExecutor<SimMotors, SimRanging>;

const HISTORY_PATH: &str = ".rover_history";

/// REPL 输入（专用输入线程）
pub struct ReplInput {
    command_rx: Receiver<String>,
    _input_thread: thread::JoinHandle<Result<()>>,
}

impl ReplInput {
    /// 创建专用输入线程（保留历史记录）
    ///
    /// `stop` 和 Ctrl+C 在输入线程内直接交给执行器，不排队。
    pub fn new(executor: Arc<SimExecutor>) -> Self {
        let (command_tx, command_rx) = bounded::<String>(10);

        let input_thread = thread::spawn(move || {
            use rustyline::history::DefaultHistory;

            let mut rl = Editor::<(), DefaultHistory>::new()
                .map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;
            rl.load_history(HISTORY_PATH).ok(); // 首次运行没有历史

            println!("Rover CLI v{} - 交互式 Shell", env!("CARGO_PKG_VERSION"));
            println!("输入 'help' 查看帮助，'exit' 退出");
            println!();

            loop {
                match rl.readline("rover> ") {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let _ = rl.add_history_entry(line.clone());

                        if MotionCommand::parse_line(&line).is_ok_and(|c| c.is_stop()) {
                            emergency_stop(&executor);
                            continue;
                        }

                        let exiting = line == "exit" || line == "quit";
                        if command_tx.send(line).is_err() || exiting {
                            break;
                        }
                    },

                    Err(rustyline::error::ReadlineError::Interrupted) => {
                        println!("^C");
                        emergency_stop(&executor);
                    },

                    Err(rustyline::error::ReadlineError::Eof) => break,

                    Err(err) => {
                        eprintln!("Error: {:?}", err);
                        break;
                    },
                }
            }

            rl.save_history(HISTORY_PATH).ok();
            Ok(())
        });

        Self {
            command_rx,
            _input_thread: input_thread,
        }
    }

    /// 阻塞等待下一行输入；输入线程退出后返回 `None`
    pub fn recv_command(&self) -> Option<String> {
        self.command_rx.recv().ok()
    }
}

fn emergency_stop(executor: &SimExecutor) {
    eprintln!("🛑 急停!");
    if !executor.submit_command(MotionCommand::Stop) {
        eprintln!("⚠️  刹车失败，请检查电机");
    }
}

/// 运行 REPL 模式
pub fn run_repl(config: &RoverConfig, options: &SessionOptions) -> Result<()> {
    let session = Session::start(config, options)?;
    let input = ReplInput::new(Arc::clone(session.system().executor()));

    println!();
    println!("💡 提示: 输入 'forward 1'、'left turn 45'、'dance' 等指令");
    println!();

    while let Some(line) = input.recv_command() {
        match line.as_str() {
            "exit" | "quit" => break,
            "help" => print_help(),
            _ => {
                if let Err(err) = handle_command(&line, &session) {
                    eprintln!("❌ Error: {}", err);
                    print_help_hint(&line);
                }
            },
        }
    }

    session.print_summary();
    session.finish();
    println!("👋 再见！");
    Ok(())
}

/// 处理一行输入
fn handle_command(line: &str, session: &Session) -> Result<()> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        ["status"] => {
            let status = session.system().status();
            println!("{}", serde_json::to_string_pretty(&status)?);
            if let Some(player) = session.system().player_status() {
                println!("{}", serde_json::to_string_pretty(&player)?);
            }
        },

        ["obstacle", position, distance] => {
            let distance: f64 = distance
                .parse()
                .map_err(|_| anyhow::anyhow!("无效的距离: {}", distance))?;
            let sensor = match *position {
                "front" => &session.hardware().front,
                "rear" => &session.hardware().rear,
                other => anyhow::bail!("未知传感器: {}（front 或 rear）", other),
            };
            sensor.set_steady(SimReading::Distance(distance));
            println!("🧱 {} 传感器读数设为 {:.1} cm", position, distance);
        },

        ["clear"] => {
            let hw = session.hardware();
            hw.front.set_steady(SimReading::Distance(200.0));
            hw.rear.set_steady(SimReading::Distance(200.0));
            println!("✅ 前后方向已清空");
        },

        _ => {
            let command = MotionCommand::parse_line(line)?;
            println!("▶️  {}", command);
            let outcome = session.system().execute(command)?;
            if outcome.is_completed() {
                println!("✅ 完成");
            } else {
                println!("⚠️  {}", outcome);
            }
            // 等待下一条输入期间播放待机动画
            session.system().idle();
        },
    }

    Ok(())
}

/// 打印帮助信息
fn print_help() {
    println!("运动指令:");
    println!("  forward [米]                  前进（默认 1 米）");
    println!("  backward [米]                 后退（默认 1 米）");
    println!("  left turn [度]                原地左转（默认 90°）");
    println!("  right turn [度]               原地右转（默认 90°）");
    println!("  dance                         跳舞");
    println!("  hi                            打招呼");
    println!("  stop                          急停（执行中也立即生效）");
    println!();
    println!("模拟硬件:");
    println!("  obstacle <front|rear> <cm>    设置传感器读数");
    println!("  clear                         清除障碍");
    println!();
    println!("其他:");
    println!("  status                        显示执行器和显示线程状态");
    println!("  help                          显示帮助");
    println!("  exit / quit                   退出");
    println!();
    println!("快捷键:");
    println!("  Ctrl+C                        急停");
    println!("  Ctrl+D                        退出");
    println!();
}

/// 提供基于错误的帮助提示
fn print_help_hint(command: &str) {
    if command.starts_with("obstacle") {
        eprintln!("💡 提示: 使用 'obstacle front 10' 在前方 10cm 处放置障碍");
    } else if command.starts_with("left") || command.starts_with("right") {
        eprintln!("💡 提示: 使用 'left turn 45' 左转 45°");
    } else {
        eprintln!("💡 提示: 输入 'help' 查看所有命令");
    }
}
