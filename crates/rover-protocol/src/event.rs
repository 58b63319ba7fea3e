//! 动作事件
//!
//! 运动引擎在每条指令开始前发布一个 `ActionEvent`，显示线程按 FIFO 顺序消费，
//! 用事件携带的预计时长同步播放动画。

use std::str::FromStr;
use std::time::Duration;

/// 显示动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ActionKind {
    Forward,
    Backward,
    Left,
    Right,
    Dance,
    #[cfg_attr(feature = "serde", serde(rename = "hi", alias = "greet"))]
    Greet,
    Obstacle,
    Idle,
}

impl ActionKind {
    /// 所有动作类型
    pub const ALL: [ActionKind; 8] = [
        ActionKind::Forward,
        ActionKind::Backward,
        ActionKind::Left,
        ActionKind::Right,
        ActionKind::Dance,
        ActionKind::Greet,
        ActionKind::Obstacle,
        ActionKind::Idle,
    ];

    /// 动作名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::Dance => "dance",
            Self::Greet => "hi",
            Self::Obstacle => "obstacle",
            Self::Idle => "idle",
        }
    }

    /// 编码为 u8（用于原子状态）
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 从 u8 解码，无效值返回 `None`
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "dance" => Ok(Self::Dance),
            "hi" | "greet" => Ok(Self::Greet),
            "obstacle" => Ok(Self::Obstacle),
            "idle" => Ok(Self::Idle),
            other => Err(format!("unknown action kind: {other}")),
        }
    }
}

/// 动作事件
///
/// `duration_s <= 0` 表示无限播放（空闲），直到被打断。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEvent {
    pub kind: ActionKind,
    pub duration_s: f64,
}

impl ActionEvent {
    pub fn new(kind: ActionKind, duration_s: f64) -> Self {
        Self { kind, duration_s }
    }

    /// 无限时长的空闲事件
    pub fn idle() -> Self {
        Self::new(ActionKind::Idle, 0.0)
    }

    /// 是否为无限播放
    pub fn is_unbounded(&self) -> bool {
        !matches!(
            self.duration_s.partial_cmp(&0.0),
            Some(std::cmp::Ordering::Greater)
        )
    }

    /// 播放时长；无限播放返回 `None`
    ///
    /// 超出 `Duration` 表示范围的时长同样按无限播放处理。
    pub fn duration(&self) -> Option<Duration> {
        if self.is_unbounded() {
            return None;
        }
        Duration::try_from_secs_f64(self.duration_s).ok()
    }
}
