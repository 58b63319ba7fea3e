//! 脚本系统
//!
//! 纯文本脚本，每行一条 `kind parameter` 指令：
//!
//! ```text
//! # 绕一个小方块
//! forward 0.5
//! left turn 90
//! forward 0.5
//! dance
//! ```
//!
//! `#` 之后为注释，空行忽略。

use anyhow::{Context, Result};
use rover_sdk::{CommandExecutor, EchoDriver, MotionCommand, MotorDriver};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// 脚本中的一条指令
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    /// 行号（从 1 开始）
    pub line_no: usize,
    pub command: MotionCommand,
}

/// 已解析的脚本
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub lines: Vec<ScriptLine>,
}

impl Script {
    /// 加载脚本文件
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取脚本文件失败: {}", path.display()))?;
        Self::parse(&content)
    }

    /// 解析脚本文本
    ///
    /// # 错误
    /// 任一行无法识别时返回错误（带行号），脚本不会部分执行。
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let text = raw.split('#').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            let command = MotionCommand::parse_line(text)
                .with_context(|| format!("第 {} 行无法解析: {:?}", idx + 1, text))?;
            lines.push(ScriptLine {
                line_no: idx + 1,
                command,
            });
        }
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// 脚本执行结果
#[derive(Debug, Clone, Default)]
pub struct ScriptResult {
    /// 总指令数
    pub total_commands: usize,
    /// 成功的行号
    pub succeeded: Vec<usize>,
    /// 失败的 (行号, 原因)
    pub failed: Vec<(usize, String)>,
    /// 未执行的指令数（遇错停止时）
    pub skipped: usize,
    /// 执行耗时（秒）
    pub duration_secs: f64,
}

impl ScriptResult {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}

/// 执行脚本
///
/// # 参数
/// - `executor`: 指令执行器
/// - `script`: 已解析的脚本
/// - `keep_going`: 失败后是否继续执行后续指令
pub fn execute<M: MotorDriver, E: EchoDriver>(
    executor: &CommandExecutor<M, E>,
    script: &Script,
    keep_going: bool,
) -> ScriptResult {
    let start = Instant::now();
    let mut result = ScriptResult {
        total_commands: script.len(),
        ..ScriptResult::default()
    };

    for (idx, line) in script.lines.iter().enumerate() {
        println!("▶️  [{}/{}] {}", idx + 1, script.len(), line.command);

        match executor.execute(line.command) {
            Ok(outcome) if outcome.is_completed() => {
                println!("   ✅ 完成");
                result.succeeded.push(line.line_no);
                continue;
            },
            Ok(outcome) => {
                println!("   ❌ {}", outcome);
                result.failed.push((line.line_no, outcome.to_string()));
            },
            Err(e) => {
                println!("   ❌ {}", e);
                result.failed.push((line.line_no, e.to_string()));
            },
        }

        if !keep_going {
            result.skipped = script.len() - idx - 1;
            break;
        }
    }

    result.duration_secs = start.elapsed().as_secs_f64();
    result
}
