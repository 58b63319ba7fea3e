//! 日志初始化
//!
//! 库代码只通过 `tracing` 宏记录日志；由应用在启动时调用一次 [`init_logger`]。
//! 过滤规则取自 `RUST_LOG`，未设置时使用默认级别。`log` crate 的记录经
//! `tracing-log` 桥接到同一个订阅者。

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// 初始化全局日志订阅者（默认 `info`）
///
/// 幂等：重复调用或已有其他订阅者时不做任何事。
pub fn init_logger() {
    init_logger_with("info");
}

/// 以指定默认过滤规则初始化日志
///
/// # 参数
/// - `default_directive`: `RUST_LOG` 未设置或非法时使用的过滤规则，如 `"rover_cli=info"`
pub fn init_logger_with(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        // `try_init` 在 tracing-log 特性下会顺带安装 LogTracer
        if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
            return;
        }
        let _ = tracing_log::LogTracer::init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logger();
        init_logger_with("debug");
        tracing::info!("logger initialised");
        log::info!("bridged from the log crate");
    }
}
