//! # Rover Display
//!
//! 动作同步的动画显示：
//!
//! - [`AnimationCache`]: 按动作类型解析动画，解码一次后归一化为屏幕尺寸的帧序列，
//!   以内容指纹为键持久化到磁盘，并按时间清理过期条目
//! - [`DisplayPlayer`]: 消费 `ActionEvent`，按事件时长循环播放对应动画；
//!   队列空闲时播放待机动画
//!
//! 帧处理：横向源图旋转 90° 适配竖屏 → 等比缩放 → 黑底居中 → 反色。

pub mod cache;
pub mod config;
mod error;
pub mod fingerprint;
pub mod normalize;
pub mod player;
pub mod record;

pub use cache::{AnimationCache, CacheEntryInfo, CacheStats, CachedAnimation, SweepReport};
pub use config::DisplayConfig;
pub use error::CacheError;
pub use fingerprint::Fingerprint;
pub use player::{DisplayPlayer, PlayerHandle, PlayerState, PlayerStatus};
pub use record::CacheRecord;
