//! 双通道电机执行器
//!
//! `ActuatorPair` 独占电机驱动，同一时间只有一个运动原语持有 PWM。
//! 方向约定：A 为左电机，B 为右电机；原地左转只驱动 A，原地右转只驱动 B。

use rover_hal::{Channel, ChannelDirection, HalError, MotorDriver};
use tracing::{trace, warn};

/// 执行器状态快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorState {
    /// 各通道占空比（%），下标见 [`Channel::index`]
    pub duty: [f64; 2],
    /// 是否处于刹车状态
    pub stopped: bool,
    /// PWM 发生器是否在运行
    pub pwm_running: bool,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self {
            duty: [0.0; 2],
            stopped: true,
            pwm_running: false,
        }
    }
}

impl ActuatorState {
    /// 两个通道占空比都为 0
    pub fn is_idle(&self) -> bool {
        self.duty.iter().all(|d| *d == 0.0)
    }
}

/// 双通道电机执行器
pub struct ActuatorPair<M: MotorDriver> {
    driver: M,
    state: ActuatorState,
}

impl<M: MotorDriver> ActuatorPair<M> {
    pub fn new(driver: M) -> Self {
        Self {
            driver,
            state: ActuatorState::default(),
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// 以指定频率启动两个通道的 PWM 发生器
    pub fn start_pwm(&mut self, frequency_hz: u32) -> Result<(), HalError> {
        for channel in Channel::BOTH {
            self.driver.start_pwm(channel, frequency_hz)?;
        }
        self.state.pwm_running = true;
        self.state.duty = [0.0; 2];
        trace!("PWM started at {} Hz", frequency_hz);
        Ok(())
    }

    /// 停止两个通道的 PWM 发生器
    ///
    /// 两个通道都会尝试，返回第一个错误。
    pub fn stop_pwm(&mut self) -> Result<(), HalError> {
        let mut result = Ok(());
        for channel in Channel::BOTH {
            if let Err(e) = self.driver.stop_pwm(channel)
                && result.is_ok()
            {
                result = Err(e);
            }
        }
        self.state.pwm_running = false;
        result
    }

    /// 两轮前进
    pub fn drive_forward(&mut self, duty: f64) -> Result<(), HalError> {
        self.apply(ChannelDirection::Forward, ChannelDirection::Forward, duty)
    }

    /// 两轮后退
    pub fn drive_backward(&mut self, duty: f64) -> Result<(), HalError> {
        self.apply(ChannelDirection::Backward, ChannelDirection::Backward, duty)
    }

    /// 原地左转（仅 A 通道前进）
    pub fn rotate_left(&mut self, duty: f64) -> Result<(), HalError> {
        self.apply(ChannelDirection::Forward, ChannelDirection::Released, duty)
    }

    /// 原地右转（仅 B 通道前进）
    pub fn rotate_right(&mut self, duty: f64) -> Result<(), HalError> {
        self.apply(ChannelDirection::Released, ChannelDirection::Forward, duty)
    }

    /// 刹车：方向引脚全部拉低，占空比清零
    ///
    /// 所有写操作都会尝试，返回第一个错误。
    pub fn brake(&mut self) -> Result<(), HalError> {
        let mut first_err = None;

        for channel in Channel::BOTH {
            if let Err(e) = self
                .driver
                .set_channel_direction(channel, ChannelDirection::Released)
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        for channel in Channel::BOTH {
            match self.driver.set_channel_duty(channel, 0.0) {
                Ok(()) => self.state.duty[channel.index()] = 0.0,
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                },
            }
        }

        match first_err {
            None => {
                self.state.stopped = true;
                Ok(())
            },
            Some(e) => Err(e),
        }
    }

    fn apply(
        &mut self,
        a: ChannelDirection,
        b: ChannelDirection,
        duty: f64,
    ) -> Result<(), HalError> {
        self.driver.set_channel_direction(Channel::A, a)?;
        self.driver.set_channel_direction(Channel::B, b)?;
        self.state.stopped = false;
        for channel in Channel::BOTH {
            self.driver.set_channel_duty(channel, duty)?;
            self.state.duty[channel.index()] = duty;
        }
        Ok(())
    }
}

impl<M: MotorDriver> Drop for ActuatorPair<M> {
    fn drop(&mut self) {
        if !self.state.stopped
            && let Err(e) = self.brake()
        {
            warn!("Failed to brake actuators on drop: {}", e);
        }
        if self.state.pwm_running
            && let Err(e) = self.stop_pwm()
        {
            warn!("Failed to stop PWM on drop: {}", e);
        }
    }
}
