//! 端到端测试：指令 → 运动引擎 → 动作事件 → 显示播放

use image::codecs::gif::GifEncoder;
use image::{Delay, Rgba, RgbaImage};
use rover_sdk::hal::sim::SimPanel;
use rover_sdk::prelude::*;
use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WIDTH: u32 = 8;
const HEIGHT: u32 = 16;

fn write_gif(path: &Path) {
    let mut encoder = GifEncoder::new(File::create(path).unwrap());
    let frames = [[255, 0, 0, 255], [0, 0, 255, 255]].map(|color| {
        image::Frame::from_parts(
            RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba(color)),
            0,
            0,
            Delay::from_numer_denom_ms(100, 1),
        )
    });
    encoder.encode_frames(frames).unwrap();
}

fn display_config(dir: &TempDir) -> DisplayConfig {
    let config = DisplayConfig {
        width: WIDTH,
        height: HEIGHT,
        animation_dir: dir.path().join("gifs"),
        cache_dir: dir.path().join("cache"),
        ..DisplayConfig::default()
    };
    std::fs::create_dir_all(&config.animation_dir).unwrap();
    for file in config.animations.values() {
        write_gif(&config.animation_dir.join(file));
    }
    config
}

fn wait_for_state<M: MotorDriver, E: EchoDriver>(
    system: &RoverSystem<M, E>,
    state: PlayerState,
    timeout: Duration,
) -> Option<Duration> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if system.player_status().map(|s| s.state) == Some(state) {
            return Some(start.elapsed());
        }
        thread::sleep(Duration::from_millis(2));
    }
    None
}

#[test]
fn test_forward_two_meters_plays_forward_animation_in_lockstep() {
    let dir = TempDir::new().unwrap();
    let hw = SimHardware::new();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let display = display_config(&dir);
    let queue_timeout = display.queue_timeout();

    // 默认标定：0.7 m/s
    let system = RoverSystem::start_sim(RoverBuilder::new(), &hw, panel.clone(), display).unwrap();
    let executor = std::sync::Arc::clone(system.executor());

    let started = Instant::now();
    let worker = thread::spawn(move || executor.submit("forward", "2"));

    let latency = wait_for_state(&system, PlayerState::Playing(ActionKind::Forward), queue_timeout)
        .expect("display never started the forward animation");
    assert!(latency <= queue_timeout);

    assert!(worker.join().unwrap());
    let elapsed = started.elapsed();
    let expected = Duration::from_secs_f64(2.0 / 0.7);
    assert!(elapsed >= expected, "{:?}", elapsed);
    assert!(elapsed < expected + Duration::from_millis(300), "{:?}", elapsed);

    let status = system.status();
    assert!((status.total_distance_m - 2.0).abs() < 0.1);
    assert!(panel.blits() > 0);
    system.shutdown();
}

#[test]
fn test_forward_event_carries_planned_duration() {
    let (publisher, events) = action_channel();
    let hw = SimHardware::new();
    let executor = std::sync::Arc::new(
        RoverBuilder::new()
            .publisher(publisher)
            .build_sim_executor(&hw)
            .unwrap(),
    );

    let worker = {
        let executor = std::sync::Arc::clone(&executor);
        thread::spawn(move || executor.submit("forward", "2"))
    };

    let event = events.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(event.kind, ActionKind::Forward);
    assert!((event.duration_s - 2.0 / 0.7).abs() < 1e-6);
    assert!(!worker.is_finished());

    // 中途急停
    executor.estop().set();
    assert!(!worker.join().unwrap());
    assert_eq!(
        executor.status().last_outcome,
        Some(MotionOutcome::aborted(AbortCause::ExternalStop))
    );
}

#[test]
fn test_obstacle_abort_shows_obstacle_animation() {
    let dir = TempDir::new().unwrap();
    let hw = SimHardware::new();
    let system = RoverSystem::start_sim(
        RoverBuilder::new().motion_config(MotionConfig {
            linear_speed_mps: 5.0,
            poll_interval_ms: 10,
            recovery_ms: 20,
            ..MotionConfig::default()
        }),
        &hw,
        SimPanel::new(WIDTH, HEIGHT),
        display_config(&dir),
    )
    .unwrap();

    hw.front.push_distances([150.0, 150.0, 12.0]);
    assert!(!system.submit("forward", "1"));

    // 前进动画（0.2s）播完后接着播放障碍动画
    assert!(
        wait_for_state(&system, PlayerState::Playing(ActionKind::Obstacle), Duration::from_secs(1))
            .is_some()
    );
    assert!(hw.motors.is_idle());
}

#[test]
fn test_shutdown_blanks_the_panel() {
    let dir = TempDir::new().unwrap();
    let hw = SimHardware::new();
    let panel = SimPanel::new(WIDTH, HEIGHT);
    let system =
        RoverSystem::start_sim(RoverBuilder::new(), &hw, panel.clone(), display_config(&dir))
            .unwrap();

    let status = serde_json::to_value(system.player_status().unwrap()).unwrap();
    assert_eq!(status["state"]["state"], "idle");

    system.shutdown();
    assert_eq!(panel.clears(), 1);
    assert!(hw.motors.is_idle());
}

#[test]
fn test_idle_publication_yields_to_next_command() {
    let dir = TempDir::new().unwrap();
    let hw = SimHardware::new();
    let system = RoverSystem::start_sim(
        RoverBuilder::new().motion_config(MotionConfig {
            rotation_speed_dps: 900.0,
            poll_interval_ms: 10,
            ..MotionConfig::default()
        }),
        &hw,
        SimPanel::new(WIDTH, HEIGHT),
        display_config(&dir),
    )
    .unwrap();

    assert!(system.submit("left turn", "45"));
    assert!(system.idle());

    // 左转事件（50ms）播完后进入无时限的待机播放
    let deadline = Instant::now() + Duration::from_secs(1);
    while system.player_status().unwrap().events_played < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(system.player_status().unwrap().events_played, 2);

    // 新指令的事件立即抢占待机播放，无需等待队列超时
    let executor = std::sync::Arc::clone(system.executor());
    let worker = thread::spawn(move || executor.submit("right turn", "180"));
    let latency = wait_for_state(
        &system,
        PlayerState::Playing(ActionKind::Right),
        Duration::from_millis(500),
    )
    .expect("idle playback was not preempted");
    assert!(latency < Duration::from_millis(200));
    assert!(worker.join().unwrap());
    assert!(system.player_status().unwrap().preemptions >= 1);

    system.shutdown();
}
