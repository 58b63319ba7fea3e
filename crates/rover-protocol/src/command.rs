//! 运动指令定义
//!
//! 指令源（表格轮询、Web Socket、REPL）只产生 `(kind, parameter)` 字符串对，
//! 在边界处一次性解码为封闭的 `MotionCommand`，引擎内部不再做字符串匹配。

use crate::event::ActionKind;
use thiserror::Error;

/// 指令解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    /// 空指令
    #[error("Empty command")]
    Empty,

    /// 未知指令类型
    #[error("Unknown command kind: {0:?}")]
    UnknownKind(String),
}

/// 运动指令
///
/// 距离单位为米，角度单位为度。参数缺失或解析失败时使用默认值，
/// 永远不会因为参数而拒绝指令。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    /// 前进指定距离（米）
    Forward(f64),
    /// 后退指定距离（米）
    Backward(f64),
    /// 原地左转指定角度（度）
    RotateLeft(f64),
    /// 原地右转指定角度（度）
    RotateRight(f64),
    /// 跳舞（组合动作）
    Dance,
    /// 打招呼（组合动作）
    Greet,
    /// 急停
    Stop,
}

impl MotionCommand {
    /// 默认直线距离（米）
    pub const DEFAULT_DISTANCE_M: f64 = 1.0;

    /// 默认旋转角度（度）
    pub const DEFAULT_ANGLE_DEG: f64 = 90.0;

    /// 所有指令源可用的指令名称
    pub const KINDS: [&'static str; 7] = [
        "forward",
        "backward",
        "left turn",
        "right turn",
        "dance",
        "hi",
        "stop",
    ];

    /// 从 `(kind, parameter)` 解析指令
    ///
    /// - `kind` 大小写不敏感，首尾空白忽略；`left`/`right` 作为 `left turn`/`right turn` 的别名
    /// - `parameter` 为十进制字符串，缺失、非法、负数或非有限值时回退到默认值
    ///
    /// # 错误
    /// - `CommandParseError::Empty`: `kind` 为空
    /// - `CommandParseError::UnknownKind`: 未知指令
    pub fn parse(kind: &str, parameter: &str) -> Result<Self, CommandParseError> {
        let kind = kind.trim().to_lowercase();
        if kind.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let command = match kind.as_str() {
            "forward" => Self::Forward(parse_amount(parameter, Self::DEFAULT_DISTANCE_M)),
            "backward" => Self::Backward(parse_amount(parameter, Self::DEFAULT_DISTANCE_M)),
            "left turn" | "left" => {
                Self::RotateLeft(parse_amount(parameter, Self::DEFAULT_ANGLE_DEG))
            },
            "right turn" | "right" => {
                Self::RotateRight(parse_amount(parameter, Self::DEFAULT_ANGLE_DEG))
            },
            "dance" => Self::Dance,
            "hi" => Self::Greet,
            "stop" => Self::Stop,
            _ => return Err(CommandParseError::UnknownKind(kind)),
        };

        Ok(command)
    }

    /// 从单行文本解析指令（如 `"left turn 45"`、`"forward"`）
    ///
    /// 先把整行当作指令名尝试；失败时把最后一个词当作参数。
    pub fn parse_line(line: &str) -> Result<Self, CommandParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandParseError::Empty);
        }

        match Self::parse(line, "") {
            Ok(command) => Ok(command),
            Err(whole_line_err) => match line.rsplit_once(char::is_whitespace) {
                Some((kind, parameter)) => Self::parse(kind, parameter),
                None => Err(whole_line_err),
            },
        }
    }

    /// 指令名称（与指令源使用的名称一致）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Forward(_) => "forward",
            Self::Backward(_) => "backward",
            Self::RotateLeft(_) => "left turn",
            Self::RotateRight(_) => "right turn",
            Self::Dance => "dance",
            Self::Greet => "hi",
            Self::Stop => "stop",
        }
    }

    /// 对应的显示动作
    ///
    /// 急停显示障碍动画。
    pub fn action_kind(&self) -> ActionKind {
        match self {
            Self::Forward(_) => ActionKind::Forward,
            Self::Backward(_) => ActionKind::Backward,
            Self::RotateLeft(_) => ActionKind::Left,
            Self::RotateRight(_) => ActionKind::Right,
            Self::Dance => ActionKind::Dance,
            Self::Greet => ActionKind::Greet,
            Self::Stop => ActionKind::Obstacle,
        }
    }

    /// 是否为急停指令
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

impl std::fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward(v) | Self::Backward(v) => write!(f, "{} {}m", self.name(), v),
            Self::RotateLeft(v) | Self::RotateRight(v) => write!(f, "{} {}°", self.name(), v),
            _ => f.write_str(self.name()),
        }
    }
}

fn parse_amount(parameter: &str, default: f64) -> f64 {
    match parameter.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(
            MotionCommand::parse("forward", "2").unwrap(),
            MotionCommand::Forward(2.0)
        );
        assert_eq!(
            MotionCommand::parse("Backward", "0.5").unwrap(),
            MotionCommand::Backward(0.5)
        );
        assert_eq!(
            MotionCommand::parse("LEFT TURN", "45").unwrap(),
            MotionCommand::RotateLeft(45.0)
        );
        assert_eq!(
            MotionCommand::parse("right turn", "180").unwrap(),
            MotionCommand::RotateRight(180.0)
        );
        assert_eq!(MotionCommand::parse("dance", "").unwrap(), MotionCommand::Dance);
        assert_eq!(MotionCommand::parse("hi", "3").unwrap(), MotionCommand::Greet);
        assert_eq!(MotionCommand::parse(" stop ", "").unwrap(), MotionCommand::Stop);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            MotionCommand::parse("left", "30").unwrap(),
            MotionCommand::RotateLeft(30.0)
        );
        assert_eq!(
            MotionCommand::parse("right", "").unwrap(),
            MotionCommand::RotateRight(90.0)
        );
    }

    #[test]
    fn test_parameter_defaults() {
        // 缺失
        assert_eq!(
            MotionCommand::parse("forward", "").unwrap(),
            MotionCommand::Forward(1.0)
        );
        // 非法
        assert_eq!(
            MotionCommand::parse("backward", "abc").unwrap(),
            MotionCommand::Backward(1.0)
        );
        // 负数
        assert_eq!(
            MotionCommand::parse("left turn", "-45").unwrap(),
            MotionCommand::RotateLeft(90.0)
        );
        // 非有限值
        assert_eq!(
            MotionCommand::parse("forward", "inf").unwrap(),
            MotionCommand::Forward(1.0)
        );
        assert_eq!(
            MotionCommand::parse("forward", "NaN").unwrap(),
            MotionCommand::Forward(1.0)
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert_eq!(
            MotionCommand::parse("fly", "1"),
            Err(CommandParseError::UnknownKind("fly".to_string()))
        );
        assert_eq!(MotionCommand::parse("   ", "1"), Err(CommandParseError::Empty));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            MotionCommand::parse_line("forward 2").unwrap(),
            MotionCommand::Forward(2.0)
        );
        assert_eq!(
            MotionCommand::parse_line("left turn 45").unwrap(),
            MotionCommand::RotateLeft(45.0)
        );
        assert_eq!(
            MotionCommand::parse_line("right turn").unwrap(),
            MotionCommand::RotateRight(90.0)
        );
        assert_eq!(MotionCommand::parse_line("dance").unwrap(), MotionCommand::Dance);
        assert!(matches!(
            MotionCommand::parse_line("jump 3"),
            Err(CommandParseError::UnknownKind(_))
        ));
        assert_eq!(MotionCommand::parse_line(""), Err(CommandParseError::Empty));
    }

    #[test]
    fn test_action_kind_mapping() {
        assert_eq!(MotionCommand::Forward(1.0).action_kind(), ActionKind::Forward);
        assert_eq!(MotionCommand::RotateLeft(1.0).action_kind(), ActionKind::Left);
        assert_eq!(MotionCommand::Greet.action_kind(), ActionKind::Greet);
        assert_eq!(MotionCommand::Stop.action_kind(), ActionKind::Obstacle);
    }

    #[test]
    fn test_name_round_trips_through_parse() {
        for kind in MotionCommand::KINDS {
            let cmd = MotionCommand::parse(kind, "").unwrap();
            assert_eq!(cmd.name(), kind);
        }
    }

    proptest! {
        #[test]
        fn prop_non_negative_distance_is_kept(d in 0.0f64..1000.0) {
            let cmd = MotionCommand::parse("forward", &d.to_string()).unwrap();
            prop_assert_eq!(cmd, MotionCommand::Forward(d));
        }

        #[test]
        fn prop_any_parameter_never_rejects(p in ".*") {
            prop_assert!(MotionCommand::parse("backward", &p).is_ok());
        }
    }
}
