//! 引脚分配（BCM 编号）

use serde::{Deserialize, Serialize};

/// 单个电机通道的引脚
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorPins {
    pub forward: u8,
    pub backward: u8,
    pub pwm: u8,
}

/// 超声测距模块的引脚
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoPins {
    pub trigger: u8,
    pub echo: u8,
}

/// 整车引脚分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    /// 左电机
    pub motor_a: MotorPins,
    /// 右电机
    pub motor_b: MotorPins,
    /// 前方测距
    pub front: EchoPins,
    /// 后方测距
    pub rear: EchoPins,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            motor_a: MotorPins {
                forward: 17,
                backward: 27,
                pwm: 22,
            },
            motor_b: MotorPins {
                forward: 18,
                backward: 23,
                pwm: 12,
            },
            front: EchoPins {
                trigger: 5,
                echo: 6,
            },
            rear: EchoPins {
                trigger: 13,
                echo: 19,
            },
        }
    }
}

impl PinMap {
    /// 所有引脚（用于冲突检查）
    pub fn all_pins(&self) -> [u8; 10] {
        [
            self.motor_a.forward,
            self.motor_a.backward,
            self.motor_a.pwm,
            self.motor_b.forward,
            self.motor_b.backward,
            self.motor_b.pwm,
            self.front.trigger,
            self.front.echo,
            self.rear.trigger,
            self.rear.echo,
        ]
    }

    /// 返回第一个被重复分配的引脚
    pub fn find_conflict(&self) -> Option<u8> {
        let pins = self.all_pins();
        pins.iter()
            .enumerate()
            .find(|&(i, pin)| pins[..i].contains(pin))
            .map(|(_, pin)| *pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_conflict() {
        assert_eq!(PinMap::default().find_conflict(), None);
    }

    #[test]
    fn test_conflict_detected() {
        let mut pins = PinMap::default();
        pins.rear.echo = pins.motor_a.pwm;
        assert_eq!(pins.find_conflict(), Some(22));
    }
}
