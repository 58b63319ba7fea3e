//! 动画缓存维护命令

use anyhow::{Context, Result};
use clap::Subcommand;
use rover_sdk::{AnimationCache, DisplayConfig};

/// 缓存命令
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// 预先解码所有动作的动画
    Warm,

    /// 删除超过保留期的缓存条目
    Sweep,

    /// 列出磁盘缓存条目
    Info,
}

impl CacheCommand {
    pub fn execute(self, display: DisplayConfig) -> Result<()> {
        let cache = AnimationCache::new(display).context("显示配置无效")?;
        if !cache.disk_enabled() {
            println!("⚠️  缓存目录不可用: {}", cache.config().cache_dir.display());
        }

        match self {
            CacheCommand::Warm => {
                println!("⏳ 预热动画缓存...");
                for (kind, frames) in cache.warm() {
                    match frames {
                        Some(n) => println!("  ✅ {:<10} {} 帧", kind.as_str(), n),
                        None => println!("  ⚠️  {:<10} 不可用", kind.as_str()),
                    }
                }
                let stats = cache.stats();
                println!(
                    "📊 解码 {} 个，磁盘命中 {} 个",
                    stats.decodes(),
                    stats.disk_hits()
                );
            },

            CacheCommand::Sweep => {
                let report = cache.sweep().context("清理缓存失败")?;
                println!(
                    "🧹 已删除 {} 个过期条目，保留 {} 个（保留期 {} 天）",
                    report.removed,
                    report.kept,
                    cache.config().retention_days
                );
            },

            CacheCommand::Info => {
                let entries = cache.entries().context("读取缓存目录失败")?;
                println!("📁 缓存目录: {}", cache.config().cache_dir.display());
                let mut total = 0;
                for entry in &entries {
                    total += entry.size_bytes;
                    let name = entry
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    println!(
                        "  {}  {:>8.1} KiB  {:>5.1} 天",
                        name,
                        entry.size_bytes as f64 / 1024.0,
                        entry.age.as_secs_f64() / 86_400.0
                    );
                }
                println!(
                    "📊 共 {} 个条目，{:.1} KiB",
                    entries.len(),
                    total as f64 / 1024.0
                );
            },
        }

        Ok(())
    }
}
