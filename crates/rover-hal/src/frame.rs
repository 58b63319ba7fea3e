//! 显示帧位图

use serde::{Deserialize, Serialize};

/// RGB 位图（每像素 3 字节，行优先）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Frame {
    /// 从原始 RGB 数据创建
    ///
    /// 数据长度不等于 `width * height * 3` 时返回 `None`。
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Option<Self> {
        if rgb.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self { width, height, rgb })
    }

    /// 全黑帧
    pub fn black(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgb: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 读取像素；越界返回 `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.rgb[offset], self.rgb[offset + 1], self.rgb[offset + 2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(Frame::from_rgb(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_pixel_access() {
        let mut rgb = vec![0; 2 * 2 * 3];
        // (1, 1) 设为白色
        rgb[9..12].copy_from_slice(&[255, 255, 255]);
        let frame = Frame::from_rgb(2, 2, rgb).unwrap();

        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(frame.pixel(1, 1), Some([255, 255, 255]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
