//! 显示播放器集成测试
//!
//! 使用模拟屏幕 `SimPanel` 统计推送帧数，真实时间驱动。

use crossbeam_channel::Sender;
use image::codecs::gif::GifEncoder;
use image::{Delay, Rgba, RgbaImage};
use rover_display::{AnimationCache, DisplayConfig, DisplayPlayer, PlayerHandle, PlayerState};
use rover_hal::sim::SimPanel;
use rover_protocol::{ActionEvent, ActionKind};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WIDTH: u32 = 8;
const HEIGHT: u32 = 16;

fn write_gif(path: &Path, frames: usize, delay_ms: u32) {
    let mut encoder = GifEncoder::new(File::create(path).unwrap());
    let frames = (0..frames).map(|i| {
        let shade = (i * 40) as u8;
        let buffer = RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([shade, 0, 0, 255]));
        image::Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
    });
    encoder.encode_frames(frames).unwrap();
}

/// 生成全部动作的动画（每个 2 帧 × 100ms）
fn animated_config(dir: &TempDir) -> DisplayConfig {
    let config = bare_config(dir);
    for file in config.animations.values() {
        write_gif(&config.animation_dir.join(file), 2, 100);
    }
    config
}

fn bare_config(dir: &TempDir) -> DisplayConfig {
    let animation_dir = dir.path().join("gifs");
    std::fs::create_dir_all(&animation_dir).unwrap();
    DisplayConfig {
        width: WIDTH,
        height: HEIGHT,
        animation_dir,
        cache_dir: dir.path().join("cache"),
        queue_timeout_ms: 50,
        idle_window_s: 0.2,
        ..DisplayConfig::default()
    }
}

fn start(config: DisplayConfig, panel: SimPanel) -> (Sender<ActionEvent>, PlayerHandle) {
    let cache = Arc::new(AnimationCache::new(config).unwrap());
    cache.warm();
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = DisplayPlayer::new(panel, cache, rx)
        .unwrap()
        .spawn()
        .unwrap();
    (tx, handle)
}

fn wait_for(handle: &PlayerHandle, state: PlayerState, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if handle.state() == state {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_timed_event_plays_for_its_duration() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let (tx, handle) = start(animated_config(&dir), panel.clone());

    let sent = Instant::now();
    tx.send(ActionEvent::new(ActionKind::Forward, 0.35)).unwrap();
    assert!(wait_for(&handle, PlayerState::Playing(ActionKind::Forward), Duration::from_millis(100)));

    assert!(wait_for(&handle, PlayerState::Idle, Duration::from_secs(2)));
    let played = sent.elapsed();
    assert!(played >= Duration::from_millis(340), "{:?}", played);
    assert!(played < Duration::from_millis(600), "{:?}", played);

    // 100ms 一帧：0、100、200、300ms 各推送一次
    let status = handle.status();
    assert_eq!(status.events_played, 1);
    assert!((3..=5).contains(&status.frames_rendered), "{:?}", status);
}

#[test]
fn test_timed_playback_is_not_preempted() {
    let dir = TempDir::new().unwrap();
    let (tx, handle) = start(animated_config(&dir), SimPanel::new(WIDTH, HEIGHT));

    tx.send(ActionEvent::new(ActionKind::Left, 0.3)).unwrap();
    tx.send(ActionEvent::new(ActionKind::Right, 0.3)).unwrap();

    thread::sleep(Duration::from_millis(150));
    assert_eq!(handle.state(), PlayerState::Playing(ActionKind::Left));

    thread::sleep(Duration::from_millis(300));
    assert_eq!(handle.state(), PlayerState::Playing(ActionKind::Right));
    assert_eq!(handle.status().preemptions, 0);
}

#[test]
fn test_unbounded_playback_yields_to_new_event() {
    let dir = TempDir::new().unwrap();
    let (tx, handle) = start(animated_config(&dir), SimPanel::new(WIDTH, HEIGHT));

    tx.send(ActionEvent::new(ActionKind::Dance, 0.0)).unwrap();
    assert!(wait_for(&handle, PlayerState::Playing(ActionKind::Dance), Duration::from_millis(100)));
    thread::sleep(Duration::from_millis(250));
    assert_eq!(handle.state(), PlayerState::Playing(ActionKind::Dance));

    let sent = Instant::now();
    tx.send(ActionEvent::new(ActionKind::Backward, 1.0)).unwrap();
    assert!(wait_for(&handle, PlayerState::Playing(ActionKind::Backward), Duration::from_millis(100)));
    assert!(sent.elapsed() < Duration::from_millis(60));
    assert_eq!(handle.status().preemptions, 1);
}

#[test]
fn test_queue_timeout_plays_idle_animation() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let (_tx, handle) = start(animated_config(&dir), panel.clone());

    thread::sleep(Duration::from_millis(400));
    let status = handle.status();
    assert!(status.idle_plays >= 1);
    assert_eq!(status.events_played, 0);
    assert!(panel.blits() >= 2);
    assert_eq!(status.state, PlayerState::Idle);
}

#[test]
fn test_idle_event_is_preempted_by_next_command() {
    let dir = TempDir::new().unwrap();
    let (tx, handle) = start(
        DisplayConfig {
            queue_timeout_ms: 5_000,
            ..animated_config(&dir)
        },
        SimPanel::new(WIDTH, HEIGHT),
    );

    tx.send(ActionEvent::idle()).unwrap();
    thread::sleep(Duration::from_millis(150));
    tx.send(ActionEvent::new(ActionKind::Greet, 0.5)).unwrap();

    assert!(wait_for(&handle, PlayerState::Playing(ActionKind::Greet), Duration::from_millis(60)));
    assert_eq!(handle.status().events_played, 2);
}

#[test]
fn test_nothing_to_render_keeps_player_alive() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let (tx, handle) = start(bare_config(&dir), panel.clone());

    tx.send(ActionEvent::new(ActionKind::Forward, 0.2)).unwrap();
    thread::sleep(Duration::from_millis(200));

    assert!(!handle.is_finished());
    assert_eq!(handle.status().events_played, 1);
    assert_eq!(panel.blits(), 0);
}

#[test]
fn test_render_failures_are_counted_not_fatal() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let (tx, handle) = start(
        DisplayConfig {
            queue_timeout_ms: 5_000,
            ..animated_config(&dir)
        },
        panel.clone(),
    );

    panel.set_fail(true);
    tx.send(ActionEvent::new(ActionKind::Forward, 0.25)).unwrap();
    thread::sleep(Duration::from_millis(350));
    let failed = handle.status();
    assert!(failed.render_errors >= 2);
    assert_eq!(failed.frames_rendered, 0);

    panel.set_fail(false);
    tx.send(ActionEvent::new(ActionKind::Backward, 0.25)).unwrap();
    thread::sleep(Duration::from_millis(350));
    assert!(handle.status().frames_rendered >= 2);
    assert!(!handle.is_finished());
}

#[test]
fn test_slow_panel_keeps_source_timing() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT).with_render_delay(Duration::from_millis(40));
    let (tx, handle) = start(
        DisplayConfig {
            queue_timeout_ms: 5_000,
            ..animated_config(&dir)
        },
        panel.clone(),
    );

    let sent = Instant::now();
    tx.send(ActionEvent::new(ActionKind::Forward, 0.45)).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(wait_for(&handle, PlayerState::Idle, Duration::from_secs(2)));

    // 渲染耗时计入帧时长，不会拉长播放
    assert!(sent.elapsed() < Duration::from_millis(650));
    assert!((4..=6).contains(&panel.blits()), "{} blits", panel.blits());
}

#[test]
fn test_closed_channel_stops_player_and_clears_panel() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let (tx, handle) = start(animated_config(&dir), panel.clone());

    drop(tx);
    let deadline = Instant::now() + Duration::from_secs(2);
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    assert!(handle.is_finished());
    assert_eq!(panel.clears(), 1);
}

#[test]
fn test_stop_interrupts_unbounded_playback() {
    let dir = TempDir::new().unwrap();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let (tx, handle) = start(animated_config(&dir), panel.clone());

    tx.send(ActionEvent::idle()).unwrap();
    thread::sleep(Duration::from_millis(100));

    let stopping = Instant::now();
    handle.stop();
    assert!(stopping.elapsed() < Duration::from_millis(200));
    assert_eq!(panel.clears(), 1);
}
