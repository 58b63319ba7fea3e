//! 运动计划
//!
//! 每条非急停指令都展开为一串 [`MotionStep`]。引擎按计划执行，
//! 发布给显示线程的预计时长也由同一份计划算出，两者不会漂移。

use crate::config::MotionConfig;
use rover_protocol::{ActionKind, MotionCommand};
use std::time::Duration;

/// 直线方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearDirection {
    Forward,
    Backward,
}

impl LinearDirection {
    /// 反方向（用于避障回退）
    pub fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// 运动步骤
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    /// 带障碍检测的直线移动（米）
    Linear {
        direction: LinearDirection,
        distance_m: f64,
    },
    /// 原地旋转（度）；负数左转，正数右转
    Rotate { angle_deg: f64 },
    /// 停顿（期间仍响应急停）
    Pause(Duration),
}

impl MotionStep {
    /// 本步骤的预计时长
    pub fn duration(&self, config: &MotionConfig) -> Duration {
        match self {
            Self::Linear { distance_m, .. } => config.linear_duration(*distance_m),
            Self::Rotate { angle_deg } => config.rotation_duration(*angle_deg),
            Self::Pause(pause) => *pause,
        }
    }
}

const DANCE_PAUSE: Duration = Duration::from_millis(200);
const GREET_PAUSE: Duration = Duration::from_millis(300);

/// 跳舞：前进、后退、左右摆动
pub const DANCE: [MotionStep; 9] = [
    MotionStep::Linear {
        direction: LinearDirection::Forward,
        distance_m: 0.5,
    },
    MotionStep::Pause(DANCE_PAUSE),
    MotionStep::Linear {
        direction: LinearDirection::Backward,
        distance_m: 0.5,
    },
    MotionStep::Pause(DANCE_PAUSE),
    MotionStep::Rotate { angle_deg: -45.0 },
    MotionStep::Pause(DANCE_PAUSE),
    MotionStep::Rotate { angle_deg: 90.0 },
    MotionStep::Pause(DANCE_PAUSE),
    MotionStep::Rotate { angle_deg: -45.0 },
];

/// 打招呼：左右摇摆后回正
pub const GREET: [MotionStep; 5] = [
    MotionStep::Rotate { angle_deg: -30.0 },
    MotionStep::Pause(GREET_PAUSE),
    MotionStep::Rotate { angle_deg: 60.0 },
    MotionStep::Pause(GREET_PAUSE),
    MotionStep::Rotate { angle_deg: -30.0 },
];

/// 指令的执行计划
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlan {
    /// 显示动作
    pub kind: ActionKind,
    pub steps: Vec<MotionStep>,
}

impl MotionPlan {
    /// 由指令生成计划；急停没有计划，返回 `None`
    ///
    /// # 示例
    ///
    /// ```
    /// use rover_driver::{MotionConfig, MotionPlan};
    /// use rover_protocol::MotionCommand;
    ///
    /// let plan = MotionPlan::for_command(MotionCommand::RotateLeft(90.0)).unwrap();
    /// let secs = plan.duration(&MotionConfig::default()).as_secs_f64();
    /// assert!((secs - 1.0 / 3.0).abs() < 1e-9);
    /// assert!(MotionPlan::for_command(MotionCommand::Stop).is_none());
    /// ```
    pub fn for_command(command: MotionCommand) -> Option<Self> {
        let steps = match command {
            MotionCommand::Forward(distance_m) => vec![MotionStep::Linear {
                direction: LinearDirection::Forward,
                distance_m,
            }],
            MotionCommand::Backward(distance_m) => vec![MotionStep::Linear {
                direction: LinearDirection::Backward,
                distance_m,
            }],
            MotionCommand::RotateLeft(angle) => vec![MotionStep::Rotate {
                angle_deg: -angle.abs(),
            }],
            MotionCommand::RotateRight(angle) => vec![MotionStep::Rotate {
                angle_deg: angle.abs(),
            }],
            MotionCommand::Dance => DANCE.to_vec(),
            MotionCommand::Greet => GREET.to_vec(),
            MotionCommand::Stop => return None,
        };

        Some(Self {
            kind: command.action_kind(),
            steps,
        })
    }

    /// 整个计划的预计时长（各步骤时长之和）
    pub fn duration(&self, config: &MotionConfig) -> Duration {
        self.steps.iter().map(|step| step.duration(config)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_forward_plan_duration() {
        let plan = MotionPlan::for_command(MotionCommand::Forward(2.0)).unwrap();
        assert_eq!(plan.kind, ActionKind::Forward);
        let secs = plan.duration(&MotionConfig::default()).as_secs_f64();
        assert!((secs - 2.0 / 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_sign() {
        let left = MotionPlan::for_command(MotionCommand::RotateLeft(45.0)).unwrap();
        assert_eq!(left.steps, vec![MotionStep::Rotate { angle_deg: -45.0 }]);
        assert_eq!(left.kind, ActionKind::Left);

        let right = MotionPlan::for_command(MotionCommand::RotateRight(45.0)).unwrap();
        assert_eq!(right.steps, vec![MotionStep::Rotate { angle_deg: 45.0 }]);
    }

    #[test]
    fn test_gesture_durations() {
        let config = MotionConfig::default();

        // 2 × 0.5m / 0.7 + 180° / 270 + 4 × 0.2s
        let dance = MotionPlan::for_command(MotionCommand::Dance).unwrap();
        let expected = 1.0 / 0.7 + 180.0 / 270.0 + 0.8;
        assert!((dance.duration(&config).as_secs_f64() - expected).abs() < 1e-6);

        // 120° / 270 + 2 × 0.3s
        let greet = MotionPlan::for_command(MotionCommand::Greet).unwrap();
        assert_eq!(greet.kind, ActionKind::Greet);
        let expected = 120.0 / 270.0 + 0.6;
        assert!((greet.duration(&config).as_secs_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_gestures_return_to_heading() {
        for steps in [&DANCE[..], &GREET[..]] {
            let net: f64 = steps
                .iter()
                .map(|s| match s {
                    MotionStep::Rotate { angle_deg } => *angle_deg,
                    _ => 0.0,
                })
                .sum();
            assert_eq!(net, 0.0);
        }
    }

    proptest! {
        #[test]
        fn prop_linear_duration_matches_speed(d in 0.0f64..50.0) {
            let config = MotionConfig::default();
            let plan = MotionPlan::for_command(MotionCommand::Backward(d)).unwrap();
            let secs = plan.duration(&config).as_secs_f64();
            prop_assert!((secs - d / config.linear_speed_mps).abs() < 1e-6);
        }
    }
}
