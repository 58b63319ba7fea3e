//! 运动统计
//!
//! 原子计数器，执行线程写入，任意线程读取快照。

use crate::engine::{AbortCause, MotionOutcome};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 运动统计计数器
#[derive(Debug, Default)]
pub struct MotionMetrics {
    commands: AtomicU64,
    completed: AtomicU64,
    aborted_obstacle: AtomicU64,
    aborted_stop: AtomicU64,
    aborted_fault: AtomicU64,
    /// 累计直线距离（毫米）
    distance_mm: AtomicU64,
    /// 累计旋转角度（千分之一度）
    rotation_mdeg: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub commands: u64,
    pub completed: u64,
    pub aborted_obstacle: u64,
    pub aborted_stop: u64,
    pub aborted_fault: u64,
    pub total_distance_m: f64,
    pub total_rotation_deg: f64,
}

impl MotionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条指令的结果
    pub fn record_outcome(&self, outcome: &MotionOutcome) {
        self.commands.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            MotionOutcome::Completed => &self.completed,
            MotionOutcome::Aborted { cause } => match cause {
                AbortCause::Obstacle(_) => &self.aborted_obstacle,
                AbortCause::ExternalStop => &self.aborted_stop,
                AbortCause::ActuatorFault => &self.aborted_fault,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 累加实际行驶距离（米）
    pub fn add_distance(&self, meters: f64) {
        self.distance_mm
            .fetch_add(to_milli(meters), Ordering::Relaxed);
    }

    /// 累加实际旋转角度（度，取绝对值）
    pub fn add_rotation(&self, degrees: f64) {
        self.rotation_mdeg
            .fetch_add(to_milli(degrees), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands: self.commands.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            aborted_obstacle: self.aborted_obstacle.load(Ordering::Relaxed),
            aborted_stop: self.aborted_stop.load(Ordering::Relaxed),
            aborted_fault: self.aborted_fault.load(Ordering::Relaxed),
            total_distance_m: self.distance_mm.load(Ordering::Relaxed) as f64 / 1000.0,
            total_rotation_deg: self.rotation_mdeg.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.commands,
            &self.completed,
            &self.aborted_obstacle,
            &self.aborted_stop,
            &self.aborted_fault,
            &self.distance_mm,
            &self.rotation_mdeg,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

fn to_milli(value: f64) -> u64 {
    let milli = (value.abs() * 1000.0).round();
    if milli.is_finite() { milli as u64 } else { 0 }
}
