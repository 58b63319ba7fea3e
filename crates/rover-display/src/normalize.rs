//! 帧归一化与动画解码
//!
//! 每帧处理顺序：方向与屏幕不一致时逆时针旋转 90° → 等比缩放到能放进屏幕的最大尺寸
//! （Lanczos3）→ 黑色画布居中 → 全图反色。

use crate::error::CacheError;
use image::codecs::gif::GifDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader, RgbImage};
use rover_hal::Frame;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// 源动画未声明帧时长时使用的默认值（秒）
pub const DEFAULT_FRAME_SECONDS: f64 = 0.1;

/// 解码后的原始帧
pub struct SourceFrame {
    pub image: RgbImage,
    /// 帧时长（秒）
    pub duration_s: f64,
}

/// 源图方向是否与屏幕不一致（正方形不旋转）
pub fn needs_rotation(source: (u32, u32), display: (u32, u32)) -> bool {
    source.0 != source.1 && (source.0 > source.1) != (display.0 > display.1)
}

/// 把一帧处理成屏幕尺寸的位图
pub fn normalize_frame(source: &RgbImage, display: (u32, u32)) -> Frame {
    let (width, height) = display;
    if width == 0 || height == 0 || source.width() == 0 || source.height() == 0 {
        return Frame::black(width, height);
    }

    let rotated;
    let image = if needs_rotation(source.dimensions(), display) {
        // rotate270 即逆时针 90°
        rotated = imageops::rotate270(source);
        &rotated
    } else {
        source
    };

    let (src_w, src_h) = image.dimensions();
    let scale = f64::min(
        width as f64 / src_w.max(1) as f64,
        height as f64 / src_h.max(1) as f64,
    );
    let new_w = ((src_w as f64 * scale) as u32).clamp(1, width);
    let new_h = ((src_h as f64 * scale) as u32).clamp(1, height);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Lanczos3);

    let mut canvas = RgbImage::new(width, height);
    let x = (width - new_w) / 2;
    let y = (height - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    imageops::invert(&mut canvas);

    Frame {
        width,
        height,
        rgb: canvas.into_raw(),
    }
}

/// 解码动画源的所有帧
///
/// GIF 逐帧解码并读取帧时长（0 视为未声明）；其他格式作为单帧静态图。
pub fn decode_source(path: &Path) -> Result<Vec<SourceFrame>, CacheError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;

    if reader.format() == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
        let mut frames = Vec::new();
        for frame in decoder.into_frames() {
            let frame = frame?;
            let (numer, denom) = frame.delay().numer_denom_ms();
            let duration_s = if numer == 0 || denom == 0 {
                DEFAULT_FRAME_SECONDS
            } else {
                numer as f64 / denom as f64 / 1000.0
            };
            frames.push(SourceFrame {
                image: DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8(),
                duration_s,
            });
        }
        Ok(frames)
    } else {
        Ok(vec![SourceFrame {
            image: reader.decode()?.to_rgb8(),
            duration_s: DEFAULT_FRAME_SECONDS,
        }])
    }
}

/// 解码并归一化后的帧序列
pub struct NormalizedAnimation {
    pub frames: Vec<Frame>,
    pub frame_durations: Vec<f64>,
    pub was_landscape: bool,
}

/// 解码动画源并把每帧归一化到屏幕尺寸
///
/// # 错误
/// - `CacheError::Decode`: 源文件无法解码
/// - `CacheError::InvalidAnimation`: 源文件没有任何帧
pub fn decode_animation(path: &Path, display: (u32, u32)) -> Result<NormalizedAnimation, CacheError> {
    let source = decode_source(path)?;
    let Some(first) = source.first() else {
        return Err(CacheError::InvalidAnimation(format!(
            "{} contains no frames",
            path.display()
        )));
    };

    let (src_w, src_h) = first.image.dimensions();
    let was_landscape = src_w > src_h;
    let total = source.len();
    info!(
        "Processing {} frame(s) of {} ({}x{}{})",
        total,
        path.display(),
        src_w,
        src_h,
        if was_landscape { ", landscape" } else { "" }
    );

    let mut frames = Vec::with_capacity(total);
    let mut frame_durations = Vec::with_capacity(total);
    for (i, frame) in source.iter().enumerate() {
        frames.push(normalize_frame(&frame.image, display));
        frame_durations.push(frame.duration_s);
        if total > 10 && (i + 1) % 5 == 0 {
            debug!("Processed {}/{} frames", i + 1, total);
        }
    }

    Ok(NormalizedAnimation {
        frames,
        frame_durations,
        was_landscape,
    })
}
