//! 超声测距
//!
//! 测距失败一律按"无障碍"处理（fail-open）：超时或硬件错误返回哨兵远距离，
//! 机器人继续按时长行驶。

use rover_hal::{ECHO_CM_PER_SECOND, EchoDriver, EchoPins, HalError};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// 测距失败时的哨兵距离（厘米）
pub const SENTINEL_DISTANCE_CM: f64 = 999.0;

/// 传感器安装位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorPosition {
    Front,
    Rear,
}

impl std::fmt::Display for SensorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Front => f.write_str("front"),
            Self::Rear => f.write_str("rear"),
        }
    }
}

/// 回波脉宽换算为距离（厘米，保留两位小数）
pub fn distance_from_pulse(pulse: Duration) -> f64 {
    (pulse.as_secs_f64() * ECHO_CM_PER_SECOND * 100.0).round() / 100.0
}

/// 超声测距传感器
pub struct RangingSensor<E: EchoDriver> {
    driver: E,
    pins: EchoPins,
    position: SensorPosition,
    timeout: Duration,
}

impl<E: EchoDriver> RangingSensor<E> {
    /// 默认回波超时
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    pub fn new(driver: E, pins: EchoPins, position: SensorPosition) -> Self {
        Self {
            driver,
            pins,
            position,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// 设置回波等待超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn position(&self) -> SensorPosition {
        self.position
    }

    pub fn pins(&self) -> EchoPins {
        self.pins
    }

    /// 测量距离（厘米）
    ///
    /// 永不失败：超时或硬件错误返回 [`SENTINEL_DISTANCE_CM`]。
    pub fn measure_cm(&mut self) -> f64 {
        match self.driver.measure_echo(self.pins, self.timeout) {
            Ok(pulse) => distance_from_pulse(pulse),
            Err(HalError::Timeout) => {
                debug!("{} sensor echo timeout, assuming clear path", self.position);
                SENTINEL_DISTANCE_CM
            },
            Err(e) => {
                warn!("{} sensor read failed: {}, assuming clear path", self.position, e);
                SENTINEL_DISTANCE_CM
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_hal::sim::{SimRanging, SimReading};

    const PINS: EchoPins = EchoPins {
        trigger: 5,
        echo: 6,
    };

    #[test]
    fn test_distance_from_pulse_rounds_to_two_decimals() {
        // 1ms -> 17.15cm
        assert_eq!(distance_from_pulse(Duration::from_millis(1)), 17.15);
        assert_eq!(distance_from_pulse(Duration::from_micros(583)), 10.0);
        assert_eq!(distance_from_pulse(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_measure_returns_distance() {
        let sim = SimRanging::new(42.0);
        let mut sensor = RangingSensor::new(sim, PINS, SensorPosition::Front);
        assert!((sensor.measure_cm() - 42.0).abs() < 0.01);
        assert_eq!(sensor.position(), SensorPosition::Front);
    }

    #[test]
    fn test_timeout_is_fail_open() {
        let sim = SimRanging::timeout();
        let mut sensor = RangingSensor::new(sim, PINS, SensorPosition::Rear);
        assert_eq!(sensor.measure_cm(), SENTINEL_DISTANCE_CM);
    }

    #[test]
    fn test_scripted_readings_in_order() {
        let sim = SimRanging::new(100.0);
        sim.push(SimReading::Distance(15.0));
        sim.push(SimReading::Timeout);
        let mut sensor = RangingSensor::new(sim.clone(), PINS, SensorPosition::Front);

        assert!((sensor.measure_cm() - 15.0).abs() < 0.01);
        assert_eq!(sensor.measure_cm(), SENTINEL_DISTANCE_CM);
        assert!((sensor.measure_cm() - 100.0).abs() < 0.01);
        assert_eq!(sim.reads(), 3);
    }
}
