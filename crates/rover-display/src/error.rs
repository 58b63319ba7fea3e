//! 显示层错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 动画缓存与播放错误
///
/// `AnimationCache::resolve` 不会返回这些错误：它们在内部被记录，
/// 然后回退到待机动画或"无可渲染内容"。
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 动画源文件不存在或未配置
    #[error("Animation source not found: {0}")]
    MissingSource(PathBuf),

    /// 动画解码失败
    #[error("Failed to decode animation: {0}")]
    Decode(#[from] image::ImageError),

    /// 缓存记录序列化失败
    #[error("Cache record encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// 缓存文件魔数不匹配
    #[error("Not a rover animation cache file (bad magic)")]
    BadMagic,

    /// 缓存文件版本不受支持
    #[error("Unsupported cache record version: {0}")]
    UnsupportedVersion(u8),

    /// 显示配置非法
    #[error("Invalid display config: {0}")]
    InvalidConfig(String),

    /// 帧序列为空或与时长序列长度不一致
    #[error("Invalid animation: {0}")]
    InvalidAnimation(String),

    /// 显示屏尺寸与缓存配置不符
    #[error("Panel size {panel:?} does not match configured display size {configured:?}")]
    PanelSizeMismatch {
        panel: (u32, u32),
        configured: (u32, u32),
    },
}

impl CacheError {
    /// 是否为"文件不存在"
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::MissingSource(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        assert_eq!(
            CacheError::UnsupportedVersion(9).to_string(),
            "Unsupported cache record version: 9"
        );

        let err = CacheError::MissingSource(PathBuf::from("gifs/idle.gif"));
        assert!(err.to_string().contains("gifs/idle.gif"));
        assert!(err.is_not_found());

        let err = CacheError::PanelSizeMismatch {
            panel: (480, 320),
            configured: (320, 480),
        };
        assert!(err.to_string().contains("(480, 320)"));
    }

    #[test]
    fn test_io_not_found() {
        let err: CacheError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(err.is_not_found());
        assert!(!CacheError::BadMagic.is_not_found());
    }
}
