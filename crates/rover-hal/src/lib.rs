//! # Rover HAL
//!
//! 硬件能力抽象层。运动引擎和显示播放器只通过这里的 trait 访问硬件：
//!
//! - [`MotorDriver`]: 设置通道占空比、方向，启停 PWM 发生器
//! - [`EchoDriver`]: 触发超声测距并测量回波脉宽
//! - [`Panel`]: 向显示屏推送一帧位图
//!
//! 真实 GPIO/SPI 后端由外部提供；`sim` feature 提供无硬件的模拟实现。

use std::time::Duration;
use thiserror::Error;

pub mod frame;
pub mod pins;

#[cfg(feature = "sim")]
pub mod sim;

pub use frame::Frame;
pub use pins::{EchoPins, MotorPins, PinMap};

/// 回波脉宽换算系数：声速 343 m/s 往返，折合 17150 cm/s
pub const ECHO_CM_PER_SECOND: f64 = 17150.0;

/// 硬件层统一错误类型
#[derive(Error, Debug)]
pub enum HalError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// 等待回波边沿超时
    #[error("Echo timeout")]
    Timeout,
    /// 硬件写入失败
    #[error("Hardware fault: {0}")]
    Fault(String),
    /// 引脚无法获取（被占用或不存在）
    #[error("Pin {pin} unavailable: {reason}")]
    PinUnavailable { pin: u8, reason: String },
    /// 帧尺寸与屏幕不符
    #[error("Frame size {actual:?} does not match panel size {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// 电机通道
///
/// A 为左电机，B 为右电机。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    pub const BOTH: [Channel; 2] = [Channel::A, Channel::B];

    /// 通道下标（0 或 1）
    pub fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

/// 通道方向引脚电平
///
/// - `Forward`: 前进引脚高，后退引脚低
/// - `Backward`: 后退引脚高，前进引脚低
/// - `Released`: 两个引脚都为低
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelDirection {
    Forward,
    Backward,
    #[default]
    Released,
}

/// 电机驱动能力
pub trait MotorDriver: Send {
    /// 以指定频率启动通道的占空比发生器（初始占空比 0）
    fn start_pwm(&mut self, channel: Channel, frequency_hz: u32) -> Result<(), HalError>;

    /// 停止通道的占空比发生器
    fn stop_pwm(&mut self, channel: Channel) -> Result<(), HalError>;

    /// 设置通道占空比（0-100）
    fn set_channel_duty(&mut self, channel: Channel, percent: f64) -> Result<(), HalError>;

    /// 设置通道方向引脚
    fn set_channel_direction(
        &mut self,
        channel: Channel,
        direction: ChannelDirection,
    ) -> Result<(), HalError>;
}

/// 超声测距能力
pub trait EchoDriver: Send {
    /// 发出触发脉冲并测量回波高电平宽度
    ///
    /// # 错误
    /// - `HalError::Timeout`: 在 `timeout` 内没有等到回波边沿
    fn measure_echo(&mut self, pins: EchoPins, timeout: Duration) -> Result<Duration, HalError>;
}

/// 显示屏能力
pub trait Panel: Send {
    /// 屏幕像素尺寸 `(width, height)`
    fn size(&self) -> (u32, u32);

    /// 推送一帧（尺寸必须与屏幕一致）
    fn blit_frame(&mut self, frame: &Frame) -> Result<(), HalError>;

    /// 清屏（黑色）
    fn clear(&mut self) -> Result<(), HalError> {
        let (width, height) = self.size();
        self.blit_frame(&Frame::black(width, height))
    }
}

impl<T: MotorDriver + ?Sized> MotorDriver for Box<T> {
    fn start_pwm(&mut self, channel: Channel, frequency_hz: u32) -> Result<(), HalError> {
        (**self).start_pwm(channel, frequency_hz)
    }

    fn stop_pwm(&mut self, channel: Channel) -> Result<(), HalError> {
        (**self).stop_pwm(channel)
    }

    fn set_channel_duty(&mut self, channel: Channel, percent: f64) -> Result<(), HalError> {
        (**self).set_channel_duty(channel, percent)
    }

    fn set_channel_direction(
        &mut self,
        channel: Channel,
        direction: ChannelDirection,
    ) -> Result<(), HalError> {
        (**self).set_channel_direction(channel, direction)
    }
}

impl<T: EchoDriver + ?Sized> EchoDriver for Box<T> {
    fn measure_echo(&mut self, pins: EchoPins, timeout: Duration) -> Result<Duration, HalError> {
        (**self).measure_echo(pins, timeout)
    }
}

impl<T: Panel + ?Sized> Panel for Box<T> {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn blit_frame(&mut self, frame: &Frame) -> Result<(), HalError> {
        (**self).blit_frame(frame)
    }

    fn clear(&mut self) -> Result<(), HalError> {
        (**self).clear()
    }
}
