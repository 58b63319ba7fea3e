//! 动画缓存
//!
//! 两级缓存：
//!
//! 1. 进程内：`源文件路径 → (最新指纹, Arc<CachedAnimation>)`，命中时零拷贝；
//!    源文件变化后旧指纹的帧数据被替换，内存占用只随源文件数量增长
//! 2. 磁盘：`<cache_dir>/anim_<fingerprint>.cache`，跨进程重启复用
//!
//! 同一源文件的并发解析通过按路径加锁串行化，避免重复解码；不同动作互不阻塞。
//! 磁盘读写失败只影响缓存本身，动画仍然照常返回。

use crate::config::DisplayConfig;
use crate::error::CacheError;
use crate::fingerprint::{CACHE_FILE_EXTENSION, Fingerprint};
use crate::normalize::decode_animation;
use crate::record::{CacheRecord, FORMAT_VERSION};
use parking_lot::Mutex;
use rover_hal::Frame;
use rover_protocol::ActionKind;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// 可直接推送到屏幕的动画
///
/// 保证 `frames.len() == frame_durations.len() >= 1`。
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnimation {
    frames: Vec<Frame>,
    frame_durations: Vec<f64>,
    was_landscape: bool,
    format_version: u8,
}

impl CachedAnimation {
    /// 创建动画
    ///
    /// # 错误
    /// - `CacheError::InvalidAnimation`: 帧为空或时长数量不一致
    pub fn new(
        frames: Vec<Frame>,
        frame_durations: Vec<f64>,
        was_landscape: bool,
    ) -> Result<Self, CacheError> {
        if frames.is_empty() {
            return Err(CacheError::InvalidAnimation("no frames".to_string()));
        }
        if frames.len() != frame_durations.len() {
            return Err(CacheError::InvalidAnimation(format!(
                "{} frames but {} durations",
                frames.len(),
                frame_durations.len()
            )));
        }
        Ok(Self {
            frames,
            frame_durations,
            was_landscape,
            format_version: FORMAT_VERSION,
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// 每帧时长（秒）
    pub fn frame_durations(&self) -> &[f64] {
        &self.frame_durations
    }

    pub fn was_landscape(&self) -> bool {
        self.was_landscape
    }

    pub fn format_version(&self) -> u8 {
        self.format_version
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 第 `index` 帧的时长（下标取模）；非法值返回 0
    pub fn frame_duration(&self, index: usize) -> Duration {
        let secs = self.frame_durations[index % self.frame_durations.len()];
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// 播放一遍的总时长
    pub fn cycle_duration(&self) -> Duration {
        (0..self.len()).map(|i| self.frame_duration(i)).sum()
    }

    fn to_record(&self, display_size: (u32, u32)) -> CacheRecord {
        CacheRecord {
            format_version: self.format_version,
            display_size,
            was_landscape: self.was_landscape,
            frame_durations: self.frame_durations.clone(),
            frames: self.frames.clone(),
        }
    }
}

impl TryFrom<CacheRecord> for CachedAnimation {
    type Error = CacheError;

    fn try_from(record: CacheRecord) -> Result<Self, Self::Error> {
        Self::new(record.frames, record.frame_durations, record.was_landscape)
    }
}

/// 缓存统计
#[derive(Debug, Default)]
pub struct CacheStats {
    /// 完整解码次数
    pub decodes: AtomicU64,
    /// 磁盘命中
    pub disk_hits: AtomicU64,
    /// 进程内命中
    pub memory_hits: AtomicU64,
    /// 回退到待机动画
    pub fallbacks: AtomicU64,
    /// 磁盘写入失败（动画未缓存但照常返回）
    pub write_failures: AtomicU64,
}

impl CacheStats {
    pub fn decodes(&self) -> u64 {
        self.decodes.load(Ordering::Relaxed)
    }

    pub fn disk_hits(&self) -> u64 {
        self.disk_hits.load(Ordering::Relaxed)
    }

    pub fn memory_hits(&self) -> u64 {
        self.memory_hits.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }
}

/// 清理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SweepReport {
    pub removed: usize,
    pub kept: usize,
}

/// 磁盘缓存条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// 距今时长
    pub age: Duration,
}

/// 动画缓存
pub struct AnimationCache {
    config: DisplayConfig,
    /// 磁盘缓存目录；无法创建时为 `None`（仅内存缓存）
    cache_dir: Option<PathBuf>,
    memory: Mutex<HashMap<PathBuf, (Fingerprint, Arc<CachedAnimation>)>>,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    stats: CacheStats,
}

impl AnimationCache {
    /// 创建缓存
    ///
    /// 缓存目录不存在时创建；创建失败只记录日志，退化为仅内存缓存。
    ///
    /// # 错误
    /// - `CacheError::InvalidConfig`: 显示配置非法
    pub fn new(config: DisplayConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let cache_dir = match std::fs::create_dir_all(&config.cache_dir) {
            Ok(()) => {
                info!("Using animation cache directory: {}", config.cache_dir.display());
                Some(config.cache_dir.clone())
            },
            Err(e) => {
                warn!(
                    "Failed to create cache directory {}: {}, caching disabled",
                    config.cache_dir.display(),
                    e
                );
                None
            },
        };

        Ok(Self {
            config,
            cache_dir,
            memory: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
        })
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn display_size(&self) -> (u32, u32) {
        self.config.display_size()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// 磁盘缓存是否可用
    pub fn disk_enabled(&self) -> bool {
        self.cache_dir.is_some()
    }

    /// 内存中驻留的动画数（每个源文件至多一份）
    pub fn memory_len(&self) -> usize {
        self.memory.lock().len()
    }

    /// 解析动作对应的动画
    ///
    /// 幂等：源文件和屏幕尺寸不变时，重复调用返回同一份帧数据且不再解码。
    /// 动作的动画缺失或损坏时回退到待机动画；连待机动画也没有时返回 `None`，
    /// 表示没有可渲染的内容。
    pub fn resolve(&self, kind: ActionKind) -> Option<Arc<CachedAnimation>> {
        match self.load_kind(kind) {
            Ok(animation) => Some(animation),
            Err(e) if kind == ActionKind::Idle => {
                warn!("Idle animation unavailable: {}", e);
                None
            },
            Err(e) => {
                warn!("Animation for {} unavailable ({}), falling back to idle", kind, e);
                self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
                match self.load_kind(ActionKind::Idle) {
                    Ok(animation) => Some(animation),
                    Err(e) => {
                        warn!("Idle animation unavailable: {}", e);
                        None
                    },
                }
            },
        }
    }

    /// 解析动作对应的动画，不做回退
    pub fn load_kind(&self, kind: ActionKind) -> Result<Arc<CachedAnimation>, CacheError> {
        let path = self.config.source_path(kind).ok_or_else(|| {
            CacheError::MissingSource(self.config.animation_dir.join(format!("<{}>", kind)))
        })?;
        self.load_path(&path)
    }

    /// 解析任意动画源文件
    pub fn load_path(&self, path: &Path) -> Result<Arc<CachedAnimation>, CacheError> {
        let display_size = self.display_size();
        let fingerprint = Fingerprint::of_file(path, display_size)?;

        if let Some(hit) = self.memory_hit(path, &fingerprint) {
            return Ok(hit);
        }

        // 同一源文件串行化，拿到锁后再查一次内存
        let lock = self.source_lock(path);
        let _guard = lock.lock();
        if let Some(hit) = self.memory_hit(path, &fingerprint) {
            return Ok(hit);
        }

        let cache_file = self
            .cache_dir
            .as_ref()
            .map(|dir| dir.join(fingerprint.cache_file_name()));

        if let Some(file) = &cache_file
            && let Some(animation) = self.load_from_disk(file, display_size)
        {
            self.stats.disk_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Loaded {} from disk cache ({})", path.display(), fingerprint);
            return Ok(self.remember(path, fingerprint, animation));
        }

        let normalized = decode_animation(path, display_size)?;
        self.stats.decodes.fetch_add(1, Ordering::Relaxed);
        let animation = CachedAnimation::new(
            normalized.frames,
            normalized.frame_durations,
            normalized.was_landscape,
        )?;

        if let Some(file) = &cache_file {
            match animation.to_record(display_size).save(file) {
                Ok(()) => info!(
                    "Cached {} frame(s) of {} as {}",
                    animation.len(),
                    path.display(),
                    fingerprint
                ),
                Err(e) => {
                    self.stats.write_failures.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to write cache for {}: {}, serving uncached", path.display(), e);
                },
            }
        }

        Ok(self.remember(path, fingerprint, animation))
    }

    /// 预先解析所有动作（返回每个动作的帧数，失败为 `None`）
    pub fn warm(&self) -> Vec<(ActionKind, Option<usize>)> {
        ActionKind::ALL
            .into_iter()
            .map(|kind| match self.load_kind(kind) {
                Ok(animation) => (kind, Some(animation.len())),
                Err(e) => {
                    warn!("Failed to warm {}: {}", kind, e);
                    (kind, None)
                },
            })
            .collect()
    }

    /// 删除超过保留期的磁盘缓存条目
    pub fn sweep(&self) -> Result<SweepReport, CacheError> {
        self.sweep_at(SystemTime::now())
    }

    /// 以指定时刻为"现在"执行清理
    ///
    /// 纯时间策略：只看文件修改时间，不管条目是否仍被使用。
    pub fn sweep_at(&self, now: SystemTime) -> Result<SweepReport, CacheError> {
        let mut report = SweepReport::default();
        let retention = self.config.retention();

        for entry in self.entries_at(now)? {
            if entry.age > retention {
                match std::fs::remove_file(&entry.path) {
                    Ok(()) => {
                        info!("Removed old cache file: {}", entry.path.display());
                        report.removed += 1;
                    },
                    Err(e) => {
                        warn!("Failed to remove {}: {}", entry.path.display(), e);
                        report.kept += 1;
                    },
                }
            } else {
                report.kept += 1;
            }
        }

        if report.removed > 0 {
            info!("Cache sweep removed {} file(s), kept {}", report.removed, report.kept);
        }
        Ok(report)
    }

    /// 列出磁盘缓存条目
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>, CacheError> {
        self.entries_at(SystemTime::now())
    }

    fn entries_at(&self, now: SystemTime) -> Result<Vec<CacheEntryInfo>, CacheError> {
        let Some(dir) = &self.cache_dir else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_FILE_EXTENSION) {
                continue;
            }
            let metadata = match std::fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            entries.push(CacheEntryInfo {
                path,
                size_bytes: metadata.len(),
                age,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn memory_hit(&self, path: &Path, fingerprint: &Fingerprint) -> Option<Arc<CachedAnimation>> {
        let hit = self
            .memory
            .lock()
            .get(path)
            .filter(|(cached, _)| cached == fingerprint)
            .map(|(_, animation)| Arc::clone(animation));
        if hit.is_some() {
            self.stats.memory_hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn remember(
        &self,
        path: &Path,
        fingerprint: Fingerprint,
        animation: CachedAnimation,
    ) -> Arc<CachedAnimation> {
        let animation = Arc::new(animation);
        let previous = self
            .memory
            .lock()
            .insert(path.to_path_buf(), (fingerprint, Arc::clone(&animation)));
        if let Some((stale, _)) = previous {
            debug!("Replaced in-memory frames of {} ({})", path.display(), stale);
        }
        animation
    }

    fn source_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// 读取磁盘记录；缺失、损坏或不兼容都返回 `None`（按未命中处理）
    fn load_from_disk(&self, file: &Path, display_size: (u32, u32)) -> Option<CachedAnimation> {
        match CacheRecord::load(file) {
            Ok(record) if record.is_compatible(display_size) => CachedAnimation::try_from(record).ok(),
            Ok(record) => {
                info!(
                    "Cache entry {} incompatible (version {}, size {:?}), regenerating",
                    file.display(),
                    record.format_version,
                    record.display_size
                );
                None
            },
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!("Unreadable cache entry {}: {}, regenerating", file.display(), e);
                None
            },
        }
    }
}
