//! 模拟硬件
//!
//! 无需 GPIO 即可运行整套运动与显示逻辑：
//! - `SimMotors`: 记录通道状态和所有写操作，可注入写入故障
//! - `SimRanging`: 按脚本返回测距结果，或使用随机障碍模型
//! - `SimPanel`: 统计推送的帧数，可模拟渲染延迟
//!
//! 所有模拟设备都可以 `clone()`，克隆共享同一份内部状态，
//! 便于测试在设备被移入引擎后继续观察和注入。

use crate::{
    Channel, ChannelDirection, ECHO_CM_PER_SECOND, EchoDriver, EchoPins, Frame, HalError,
    MotorDriver, Panel,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

// ==================== 电机 ====================

/// 单通道快照
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimChannel {
    pub duty: f64,
    pub direction: ChannelDirection,
    /// PWM 发生器频率；`None` 表示未启动
    pub pwm_hz: Option<u32>,
}

/// 电机写操作记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorOp {
    StartPwm(Channel, u32),
    StopPwm(Channel),
    Duty(Channel, f64),
    Direction(Channel, ChannelDirection),
}

#[derive(Debug, Default)]
struct SimMotorState {
    channels: [SimChannel; 2],
    history: Vec<MotorOp>,
    fail_writes: bool,
}

/// 模拟电机驱动
#[derive(Debug, Clone, Default)]
pub struct SimMotors {
    state: Arc<Mutex<SimMotorState>>,
}

impl SimMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 通道当前状态
    pub fn channel(&self, channel: Channel) -> SimChannel {
        self.state.lock().channels[channel.index()]
    }

    /// 两个通道占空比都为 0 且方向引脚释放
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state
            .channels
            .iter()
            .all(|c| c.duty == 0.0 && c.direction == ChannelDirection::Released)
    }

    /// 所有写操作记录
    pub fn history(&self) -> Vec<MotorOp> {
        self.state.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.state.lock().history.clear();
    }

    /// 之后的所有写操作都返回 `HalError::Fault`
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    fn write(&self, op: MotorOp) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(HalError::Fault(format!("injected failure on {:?}", op)));
        }

        match op {
            MotorOp::StartPwm(channel, hz) => {
                let c = &mut state.channels[channel.index()];
                c.pwm_hz = Some(hz);
                c.duty = 0.0;
            },
            MotorOp::StopPwm(channel) => {
                state.channels[channel.index()].pwm_hz = None;
            },
            MotorOp::Duty(channel, duty) => {
                if !(0.0..=100.0).contains(&duty) {
                    return Err(HalError::Fault(format!("duty cycle out of range: {duty}")));
                }
                state.channels[channel.index()].duty = duty;
            },
            MotorOp::Direction(channel, direction) => {
                state.channels[channel.index()].direction = direction;
            },
        }

        trace!("sim motor write: {:?}", op);
        state.history.push(op);
        Ok(())
    }
}

impl MotorDriver for SimMotors {
    fn start_pwm(&mut self, channel: Channel, frequency_hz: u32) -> Result<(), HalError> {
        self.write(MotorOp::StartPwm(channel, frequency_hz))
    }

    fn stop_pwm(&mut self, channel: Channel) -> Result<(), HalError> {
        self.write(MotorOp::StopPwm(channel))
    }

    fn set_channel_duty(&mut self, channel: Channel, percent: f64) -> Result<(), HalError> {
        self.write(MotorOp::Duty(channel, percent))
    }

    fn set_channel_direction(
        &mut self,
        channel: Channel,
        direction: ChannelDirection,
    ) -> Result<(), HalError> {
        self.write(MotorOp::Direction(channel, direction))
    }
}

// ==================== 测距 ====================

/// 模拟测距结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimReading {
    /// 距离（厘米）
    Distance(f64),
    /// 回波超时
    Timeout,
}

#[derive(Debug)]
struct SimRangingState {
    script: VecDeque<SimReading>,
    steady: SimReading,
    random: Option<StdRng>,
    reads: u64,
}

/// 模拟超声测距
///
/// 读取顺序：先消费脚本队列；队列为空时使用随机模型（若启用），否则返回稳定值。
#[derive(Debug, Clone)]
pub struct SimRanging {
    state: Arc<Mutex<SimRangingState>>,
}

impl SimRanging {
    /// 稳定返回指定距离
    pub fn new(steady_cm: f64) -> Self {
        Self::with_steady(SimReading::Distance(steady_cm))
    }

    /// 始终超时
    pub fn timeout() -> Self {
        Self::with_steady(SimReading::Timeout)
    }

    /// 随机障碍模型：5% 概率返回 5-15cm，其余 25-200cm
    pub fn random(seed: u64) -> Self {
        let sim = Self::new(200.0);
        sim.state.lock().random = Some(StdRng::seed_from_u64(seed));
        sim
    }

    fn with_steady(steady: SimReading) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimRangingState {
                script: VecDeque::new(),
                steady,
                random: None,
                reads: 0,
            })),
        }
    }

    /// 追加一条脚本读数
    pub fn push(&self, reading: SimReading) {
        self.state.lock().script.push_back(reading);
    }

    /// 追加多条距离读数
    pub fn push_distances(&self, distances: impl IntoIterator<Item = f64>) {
        let mut state = self.state.lock();
        state
            .script
            .extend(distances.into_iter().map(SimReading::Distance));
    }

    /// 修改稳定值（立即对后续读取生效）
    pub fn set_steady(&self, reading: SimReading) {
        self.state.lock().steady = reading;
    }

    /// 已读取次数
    pub fn reads(&self) -> u64 {
        self.state.lock().reads
    }

    fn next_reading(&self) -> SimReading {
        let mut state = self.state.lock();
        state.reads += 1;

        if let Some(reading) = state.script.pop_front() {
            return reading;
        }

        let steady = state.steady;
        match state.random.as_mut() {
            Some(rng) => {
                if rng.gen_bool(0.05) {
                    SimReading::Distance(rng.gen_range(5.0..15.0))
                } else {
                    SimReading::Distance(rng.gen_range(25.0..200.0))
                }
            },
            None => steady,
        }
    }
}

impl EchoDriver for SimRanging {
    fn measure_echo(&mut self, pins: EchoPins, _timeout: Duration) -> Result<Duration, HalError> {
        match self.next_reading() {
            SimReading::Distance(cm) => {
                trace!("sim echo on trigger {}: {:.2}cm", pins.trigger, cm);
                Ok(Duration::from_secs_f64(cm.max(0.0) / ECHO_CM_PER_SECOND))
            },
            SimReading::Timeout => Err(HalError::Timeout),
        }
    }
}

// ==================== 显示屏 ====================

#[derive(Debug, Default)]
struct SimPanelState {
    blits: u64,
    clears: u64,
    last_frame: Option<Frame>,
    fail: bool,
}

/// 模拟显示屏
#[derive(Debug, Clone)]
pub struct SimPanel {
    width: u32,
    height: u32,
    render_delay: Duration,
    state: Arc<Mutex<SimPanelState>>,
}

impl SimPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            render_delay: Duration::ZERO,
            state: Arc::new(Mutex::new(SimPanelState::default())),
        }
    }

    /// 每次推送帧额外阻塞的时间（模拟慢速 SPI）
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// 已推送帧数（不含清屏）
    pub fn blits(&self) -> u64 {
        self.state.lock().blits
    }

    /// 清屏次数
    pub fn clears(&self) -> u64 {
        self.state.lock().clears
    }

    /// 最近一次推送的帧
    pub fn last_frame(&self) -> Option<Frame> {
        self.state.lock().last_frame.clone()
    }

    /// 之后的推送都返回 `HalError::Fault`
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().fail = fail;
    }
}

impl Panel for SimPanel {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn blit_frame(&mut self, frame: &Frame) -> Result<(), HalError> {
        if frame.size() != self.size() {
            return Err(HalError::SizeMismatch {
                expected: self.size(),
                actual: frame.size(),
            });
        }
        if self.state.lock().fail {
            return Err(HalError::Fault("injected panel failure".to_string()));
        }

        if !self.render_delay.is_zero() {
            std::thread::sleep(self.render_delay);
        }

        let mut state = self.state.lock();
        state.blits += 1;
        state.last_frame = Some(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HalError> {
        let mut state = self.state.lock();
        state.clears += 1;
        state.last_frame = Some(Frame::black(self.width, self.height));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINS: EchoPins = EchoPins {
        trigger: 5,
        echo: 6,
    };

    #[test]
    fn test_sim_motors_record_state() {
        let motors = SimMotors::new();
        let mut driver = motors.clone();

        driver.start_pwm(Channel::A, 200).unwrap();
        driver.set_channel_direction(Channel::A, ChannelDirection::Forward).unwrap();
        driver.set_channel_duty(Channel::A, 50.0).unwrap();

        let a = motors.channel(Channel::A);
        assert_eq!(a.pwm_hz, Some(200));
        assert_eq!(a.duty, 50.0);
        assert_eq!(a.direction, ChannelDirection::Forward);
        assert!(!motors.is_idle());
        assert_eq!(motors.history().len(), 3);
    }

    #[test]
    fn test_sim_motors_injected_failure() {
        let motors = SimMotors::new();
        let mut driver = motors.clone();
        motors.set_fail_writes(true);

        assert!(matches!(
            driver.set_channel_duty(Channel::B, 10.0),
            Err(HalError::Fault(_))
        ));
        assert!(motors.history().is_empty());
    }

    #[test]
    fn test_sim_motors_reject_out_of_range_duty() {
        let mut motors = SimMotors::new();
        assert!(motors.set_channel_duty(Channel::A, 120.0).is_err());
    }

    #[test]
    fn test_sim_ranging_script_then_steady() {
        let sim = SimRanging::new(100.0);
        sim.push_distances([10.0]);
        sim.push(SimReading::Timeout);
        let mut driver = sim.clone();

        let pulse = driver.measure_echo(PINS, Duration::from_millis(100)).unwrap();
        assert!((pulse.as_secs_f64() * ECHO_CM_PER_SECOND - 10.0).abs() < 1e-6);

        assert!(matches!(
            driver.measure_echo(PINS, Duration::from_millis(100)),
            Err(HalError::Timeout)
        ));

        let pulse = driver.measure_echo(PINS, Duration::from_millis(100)).unwrap();
        assert!((pulse.as_secs_f64() * ECHO_CM_PER_SECOND - 100.0).abs() < 1e-6);
        assert_eq!(sim.reads(), 3);
    }

    #[test]
    fn test_sim_ranging_random_is_in_model_range() {
        let mut sim = SimRanging::random(7);
        for _ in 0..200 {
            let pulse = sim.measure_echo(PINS, Duration::from_millis(100)).unwrap();
            let cm = pulse.as_secs_f64() * ECHO_CM_PER_SECOND;
            assert!((5.0..15.0).contains(&cm) || (25.0..200.0).contains(&cm));
        }
    }

    #[test]
    fn test_sim_panel_checks_size() {
        let panel = SimPanel::new(4, 6);
        let mut driver = panel.clone();

        assert!(driver.blit_frame(&Frame::black(4, 6)).is_ok());
        assert!(matches!(
            driver.blit_frame(&Frame::black(6, 4)),
            Err(HalError::SizeMismatch { .. })
        ));
        driver.clear().unwrap();

        assert_eq!(panel.blits(), 1);
        assert_eq!(panel.clears(), 1);
    }
}
