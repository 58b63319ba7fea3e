//! 显示配置

use crate::CacheError;
use rover_protocol::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// 显示与动画缓存配置
///
/// `animations` 以动作名称（`forward`、`hi`、`idle` 等）为键，值为 `animation_dir` 下的文件名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// 屏幕宽度（像素）
    pub width: u32,
    /// 屏幕高度（像素）
    pub height: u32,
    /// 动画源目录
    pub animation_dir: PathBuf,
    /// 磁盘缓存目录
    pub cache_dir: PathBuf,
    /// 缓存保留天数
    pub retention_days: u64,
    /// 等待动作事件的超时（毫秒），超时后播放待机动画
    pub queue_timeout_ms: u64,
    /// 队列空闲时一次待机播放的时长（秒）
    pub idle_window_s: f64,
    /// 动作 → 动画文件名
    pub animations: BTreeMap<String, String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let animations = [
            (ActionKind::Forward, "forward.gif"),
            (ActionKind::Backward, "backwards.gif"),
            (ActionKind::Left, "left.gif"),
            (ActionKind::Right, "right.gif"),
            (ActionKind::Dance, "dance.gif"),
            (ActionKind::Greet, "hi.gif"),
            (ActionKind::Obstacle, "obstacle.gif"),
            (ActionKind::Idle, "idle.gif"),
        ]
        .into_iter()
        .map(|(kind, file)| (kind.as_str().to_string(), file.to_string()))
        .collect();

        Self {
            width: 320,
            height: 480,
            animation_dir: PathBuf::from("gifs"),
            cache_dir: PathBuf::from("gif_cache"),
            retention_days: 7,
            queue_timeout_ms: 1000,
            idle_window_s: 3600.0,
            animations,
        }
    }
}

impl DisplayConfig {
    /// 校验配置
    ///
    /// # 错误
    /// - `CacheError::InvalidConfig`: 屏幕宽或高为 0
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.width == 0 || self.height == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "display size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// 屏幕尺寸 `(width, height)`
    pub fn display_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 动作对应的动画源路径；未配置返回 `None`
    pub fn source_path(&self, kind: ActionKind) -> Option<PathBuf> {
        self.animations
            .get(kind.as_str())
            .map(|file| self.animation_dir.join(file))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60))
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// 待机播放时长；非法值按 0 处理
    pub fn idle_window(&self) -> Duration {
        Duration::try_from_secs_f64(self.idle_window_s).unwrap_or(Duration::ZERO)
    }
}
