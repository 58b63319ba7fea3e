//! 显示播放线程
//!
//! 状态机 `Idle ⇄ Playing(kind)`：
//!
//! - 有时长的事件：循环播放对应动画直到时长用完，不会被新事件打断
//! - 无时长的事件（`duration_s <= 0`）：无限循环，队列中一有新事件就让出
//! - 队列等待超时：播放待机动画一个窗口期，同样可被新事件打断
//!
//! 逐帧节奏：渲染后休眠 `max(0, 帧时长 - 渲染耗时)`，休眠期间轮询停止信号。

use crate::cache::{AnimationCache, CachedAnimation};
use crate::error::CacheError;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use rover_hal::Panel;
use rover_protocol::{ActionEvent, ActionKind, StopSignal};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// 休眠切片：停止信号和新事件的最大响应延迟
const PAUSE_SLICE: Duration = Duration::from_millis(10);

/// 播放器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "action")]
pub enum PlayerState {
    /// 没有动作（包括播放待机动画）
    Idle,
    /// 正在播放动作动画
    Playing(ActionKind),
}

/// 原子状态：0 = Idle，1 + kind = Playing(kind)
#[derive(Debug, Default)]
struct AtomicPlayerState(AtomicU8);

impl AtomicPlayerState {
    fn load(&self) -> PlayerState {
        match self.0.load(Ordering::Acquire) {
            0 => PlayerState::Idle,
            n => ActionKind::from_u8(n - 1)
                .map(PlayerState::Playing)
                .unwrap_or(PlayerState::Idle),
        }
    }

    fn store(&self, state: PlayerState) {
        let raw = match state {
            PlayerState::Idle | PlayerState::Playing(ActionKind::Idle) => 0,
            PlayerState::Playing(kind) => kind.as_u8() + 1,
        };
        self.0.store(raw, Ordering::Release);
    }
}

/// 播放统计
#[derive(Debug, Default)]
struct PlayerStats {
    events: AtomicU64,
    frames: AtomicU64,
    render_errors: AtomicU64,
    idle_plays: AtomicU64,
    preemptions: AtomicU64,
}

/// 播放器状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerStatus {
    pub state: PlayerState,
    /// 已处理的动作事件数
    pub events_played: u64,
    /// 已推送的帧数
    pub frames_rendered: u64,
    /// 推送失败次数
    pub render_errors: u64,
    /// 队列空闲触发的待机播放次数
    pub idle_plays: u64,
    /// 被新事件打断的播放次数
    pub preemptions: u64,
}

/// 播放线程与控制端共享的状态
#[derive(Debug, Default)]
struct Shared {
    state: AtomicPlayerState,
    stats: PlayerStats,
    stop: StopSignal,
}

impl Shared {
    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.state.load(),
            events_played: self.stats.events.load(Ordering::Relaxed),
            frames_rendered: self.stats.frames.load(Ordering::Relaxed),
            render_errors: self.stats.render_errors.load(Ordering::Relaxed),
            idle_plays: self.stats.idle_plays.load(Ordering::Relaxed),
            preemptions: self.stats.preemptions.load(Ordering::Relaxed),
        }
    }
}

/// 一次播放的结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackEnd {
    Elapsed,
    Preempted,
    Stopped,
    NothingToRender,
}

/// 显示播放器
///
/// # 示例
///
/// ```
/// use rover_display::{AnimationCache, DisplayConfig, DisplayPlayer};
/// use rover_hal::sim::SimPanel;
/// use std::sync::Arc;
///
/// let cache = Arc::new(AnimationCache::new(DisplayConfig {
///     animation_dir: std::env::temp_dir().join("rover-doc-no-gifs"),
///     cache_dir: std::env::temp_dir().join("rover-doc-cache"),
///     ..DisplayConfig::default()
/// })?);
/// let (tx, rx) = crossbeam_channel::unbounded();
/// let player = DisplayPlayer::new(SimPanel::new(320, 480), cache, rx)?;
/// let handle = player.spawn()?;
///
/// drop(tx);
/// handle.stop();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DisplayPlayer<P: Panel> {
    panel: P,
    cache: Arc<AnimationCache>,
    events: Receiver<ActionEvent>,
    queue_timeout: Duration,
    idle_window: Duration,
    shared: Arc<Shared>,
    /// 推送失败只在第一次以 warn 级别记录
    render_error_logged: bool,
}

impl<P: Panel> DisplayPlayer<P> {
    /// 创建播放器
    ///
    /// # 参数
    /// - `panel`: 显示屏
    /// - `cache`: 动画缓存（可与其他线程共享）
    /// - `events`: 动作事件接收端
    ///
    /// # 错误
    /// - `CacheError::PanelSizeMismatch`: 屏幕尺寸与缓存配置不一致
    pub fn new(
        panel: P,
        cache: Arc<AnimationCache>,
        events: Receiver<ActionEvent>,
    ) -> Result<Self, CacheError> {
        let configured = cache.display_size();
        if panel.size() != configured {
            return Err(CacheError::PanelSizeMismatch {
                panel: panel.size(),
                configured,
            });
        }

        let config = cache.config();
        Ok(Self {
            queue_timeout: config.queue_timeout(),
            idle_window: config.idle_window(),
            panel,
            cache,
            events,
            shared: Arc::new(Shared::default()),
            render_error_logged: false,
        })
    }

    /// 当前状态
    pub fn state(&self) -> PlayerState {
        self.shared.state.load()
    }

    /// 停止信号：设置后当前帧结束即退出播放循环
    pub fn stop_signal(&self) -> StopSignal {
        self.shared.stop.clone()
    }

    /// 在独立线程中运行播放循环
    pub fn spawn(self) -> std::io::Result<PlayerHandle>
    where
        P: 'static,
    {
        let shared = Arc::clone(&self.shared);
        let thread = std::thread::Builder::new()
            .name("rover-display".to_string())
            .spawn(move || self.run())?;

        Ok(PlayerHandle {
            shared,
            thread: Some(thread),
        })
    }

    /// 播放循环（阻塞）
    ///
    /// 启动时清理一次过期缓存。事件通道断开或停止信号被设置时返回，返回前清屏。
    pub fn run(mut self) {
        info!(
            "Display player started ({}x{}, queue timeout {:?})",
            self.panel.size().0,
            self.panel.size().1,
            self.queue_timeout
        );

        match self.cache.sweep() {
            Ok(report) => debug!(
                "Startup cache sweep: removed {}, kept {}",
                report.removed, report.kept
            ),
            Err(e) => warn!("Startup cache sweep failed: {}", e),
        }

        while !self.shared.stop.is_set() {
            match self.events.recv_timeout(self.queue_timeout) {
                Ok(event) => self.play_event(event),
                Err(RecvTimeoutError::Timeout) => {
                    self.shared.stats.idle_plays.fetch_add(1, Ordering::Relaxed);
                    self.play(ActionKind::Idle, Some(self.idle_window), true);
                },
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Action channel closed, display player exiting");
                    break;
                },
            }
        }

        self.shared.state.store(PlayerState::Idle);
        if let Err(e) = self.panel.clear() {
            warn!("Failed to clear panel on shutdown: {}", e);
        }
        info!("Display player stopped");
    }

    fn play_event(&mut self, event: ActionEvent) {
        self.shared.stats.events.fetch_add(1, Ordering::Relaxed);
        debug!("Playing {} for {:.3}s", event.kind, event.duration_s);

        match event.duration() {
            Some(limit) => self.play(event.kind, Some(limit), false),
            None => self.play(event.kind, None, true),
        };
    }

    /// 循环播放动画
    ///
    /// `limit` 为 `None` 时无限播放；`preemptible` 时队列非空即让出。
    fn play(&mut self, kind: ActionKind, limit: Option<Duration>, preemptible: bool) -> PlaybackEnd {
        let Some(animation) = self.cache.resolve(kind) else {
            debug!("Nothing to render for {}", kind);
            return PlaybackEnd::NothingToRender;
        };

        self.shared.state.store(PlayerState::Playing(kind));
        let end = self.loop_frames(&animation, limit, preemptible);
        self.shared.state.store(PlayerState::Idle);

        if end == PlaybackEnd::Preempted {
            self.shared.stats.preemptions.fetch_add(1, Ordering::Relaxed);
        }
        trace!("Playback of {} ended: {:?}", kind, end);
        end
    }

    fn loop_frames(
        &mut self,
        animation: &CachedAnimation,
        limit: Option<Duration>,
        preemptible: bool,
    ) -> PlaybackEnd {
        let start = Instant::now();
        let mut index = 0;

        loop {
            if self.shared.stop.is_set() {
                return PlaybackEnd::Stopped;
            }
            if preemptible && !self.events.is_empty() {
                return PlaybackEnd::Preempted;
            }
            if let Some(limit) = limit
                && start.elapsed() >= limit
            {
                return PlaybackEnd::Elapsed;
            }

            let frame_start = Instant::now();
            self.render(&animation.frames()[index]);
            let render_time = frame_start.elapsed();

            let mut pause = animation.frame_duration(index).saturating_sub(render_time);
            if let Some(limit) = limit {
                pause = pause.min(limit.saturating_sub(start.elapsed()));
            }
            if let Some(end) = self.pause(pause, preemptible) {
                return end;
            }

            index = (index + 1) % animation.len();
        }
    }

    fn render(&mut self, frame: &rover_hal::Frame) {
        match self.panel.blit_frame(frame) {
            Ok(()) => {
                self.shared.stats.frames.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                self.shared.stats.render_errors.fetch_add(1, Ordering::Relaxed);
                if self.render_error_logged {
                    debug!("Failed to render frame: {}", e);
                } else {
                    warn!("Failed to render frame: {} (further failures logged at debug)", e);
                    self.render_error_logged = true;
                }
            },
        }
    }

    /// 分片休眠；被停止或打断时返回结束原因
    fn pause(&self, duration: Duration, preemptible: bool) -> Option<PlaybackEnd> {
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            spin_sleep::sleep(PAUSE_SLICE.min(deadline - now));

            if self.shared.stop.is_set() {
                return Some(PlaybackEnd::Stopped);
            }
            if preemptible && !self.events.is_empty() {
                return Some(PlaybackEnd::Preempted);
            }
        }
    }
}

/// 播放线程句柄
///
/// Drop 时设置停止信号并等待线程退出（最多 2 秒）。
pub struct PlayerHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    pub fn state(&self) -> PlayerState {
        self.shared.state.load()
    }

    pub fn status(&self) -> PlayerStatus {
        self.shared.status()
    }

    /// 播放线程是否已退出
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// 停止播放并等待线程退出
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shared.stop.set();
        if let Some(thread) = self.thread.take() {
            join_with_timeout(thread, Duration::from_secs(2));
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_with_timeout(thread: JoinHandle<()>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !thread.is_finished() {
        if Instant::now() >= deadline {
            error!("Display thread failed to shut down within {:?}", timeout);
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    if thread.join().is_err() {
        error!("Display thread panicked");
    }
}
