//! 运动参数配置

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 运动参数
///
/// 默认值对应实车标定：直线 0.7 m/s，旋转 270°/s，障碍阈值 20cm。
///
/// # Example
///
/// ```
/// use rover_driver::MotionConfig;
///
/// // 使用默认配置
/// let config = MotionConfig::default();
/// assert_eq!(config.linear_duration(1.4).as_millis(), 2000);
///
/// // 测试用的快速配置
/// let fast = MotionConfig {
///     linear_speed_mps: 10.0,
///     poll_interval_ms: 10,
///     ..MotionConfig::default()
/// };
/// assert!(fast.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// 直线速度（米/秒）
    pub linear_speed_mps: f64,
    /// 原地旋转角速度（度/秒）
    pub rotation_speed_dps: f64,
    /// 障碍阈值（厘米），读数严格小于该值时中止
    pub obstacle_threshold_cm: f64,
    /// 轮询间隔（毫秒），取值 1..=100
    pub poll_interval_ms: u64,
    /// 行驶占空比（%）
    pub drive_duty: f64,
    /// 避障回退占空比（%）
    pub recovery_duty: f64,
    /// 避障回退时长（毫秒）
    pub recovery_ms: u64,
    /// 直线移动 PWM 频率（Hz）
    pub linear_pwm_hz: u32,
    /// 旋转 PWM 频率（Hz）
    pub rotate_pwm_hz: u32,
    /// 避障/急停后障碍动画时长（秒）
    pub obstacle_animation_s: f64,
    /// 单次测距等待回波的超时（毫秒）
    pub echo_timeout_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            linear_speed_mps: 0.7,
            rotation_speed_dps: 270.0,
            obstacle_threshold_cm: 20.0,
            poll_interval_ms: 100,
            drive_duty: 50.0,
            recovery_duty: 30.0,
            recovery_ms: 500,
            linear_pwm_hz: 200,
            rotate_pwm_hz: 90,
            obstacle_animation_s: 2.0,
            echo_timeout_ms: 100,
        }
    }
}

impl MotionConfig {
    /// 轮询间隔上限（毫秒）
    pub const MAX_POLL_INTERVAL_MS: u64 = 100;

    /// 校验配置
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 速度非正、占空比越界、轮询间隔不在 1..=100 等
    pub fn validate(&self) -> Result<(), DriverError> {
        fn positive(name: &str, value: f64) -> Result<(), DriverError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DriverError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        }

        fn duty(name: &str, value: f64) -> Result<(), DriverError> {
            if (0.0..=100.0).contains(&value) {
                Ok(())
            } else {
                Err(DriverError::InvalidConfig(format!(
                    "{name} must be within 0..=100, got {value}"
                )))
            }
        }

        positive("linear_speed_mps", self.linear_speed_mps)?;
        positive("rotation_speed_dps", self.rotation_speed_dps)?;
        positive("obstacle_threshold_cm", self.obstacle_threshold_cm)?;
        duty("drive_duty", self.drive_duty)?;
        duty("recovery_duty", self.recovery_duty)?;

        if !(1..=Self::MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(DriverError::InvalidConfig(format!(
                "poll_interval_ms must be within 1..={}, got {}",
                Self::MAX_POLL_INTERVAL_MS,
                self.poll_interval_ms
            )));
        }
        if self.linear_pwm_hz == 0 || self.rotate_pwm_hz == 0 {
            return Err(DriverError::InvalidConfig(
                "PWM frequencies must be non-zero".to_string(),
            ));
        }
        if !self.obstacle_animation_s.is_finite() || self.obstacle_animation_s < 0.0 {
            return Err(DriverError::InvalidConfig(format!(
                "obstacle_animation_s must be non-negative, got {}",
                self.obstacle_animation_s
            )));
        }

        Ok(())
    }

    /// 直线移动指定距离所需时长
    pub fn linear_duration(&self, distance_m: f64) -> Duration {
        seconds(distance_m.abs() / self.linear_speed_mps)
    }

    /// 旋转指定角度所需时长
    pub fn rotation_duration(&self, angle_deg: f64) -> Duration {
        seconds(angle_deg.abs() / self.rotation_speed_dps)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn recovery_duration(&self) -> Duration {
        Duration::from_millis(self.recovery_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

/// 秒数转 `Duration`
///
/// NaN 和非正数返回 0；超出 `Duration` 表示范围的值饱和为 `Duration::MAX`。
fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}
