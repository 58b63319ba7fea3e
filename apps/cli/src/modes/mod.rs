//! 运行模式
//!
//! - One-shot：装配 → 执行 → 释放，适合脚本和 CI
//! - REPL：交互式 Shell，整机在会话期间保持运行

pub mod oneshot;
pub mod repl;
