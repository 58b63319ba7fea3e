//! 动画源指纹
//!
//! 指纹 = SHA-256(文件名, 文件大小, 修改时间, 屏幕宽, 屏幕高)。
//! 源文件或屏幕尺寸任一变化都会得到新的缓存键。

use crate::error::CacheError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// 缓存文件名前缀
pub const CACHE_FILE_PREFIX: &str = "anim_";
/// 缓存文件扩展名
pub const CACHE_FILE_EXTENSION: &str = "cache";

/// 内容指纹（十六进制）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// 由文件身份和屏幕尺寸计算指纹
    pub fn compute(
        file_name: &str,
        size_bytes: u64,
        modified: SystemTime,
        display_size: (u32, u32),
    ) -> Self {
        let mtime = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
        let input = format!(
            "{}_{}_{}.{:09}_{}x{}",
            file_name,
            size_bytes,
            mtime.as_secs(),
            mtime.subsec_nanos(),
            display_size.0,
            display_size.1
        );
        Self(hex::encode(Sha256::digest(input.as_bytes())))
    }

    /// 读取文件元数据并计算指纹
    ///
    /// # 错误
    /// - `CacheError::MissingSource`: 路径不存在或不是文件
    /// - `CacheError::Io`: 元数据读取失败
    pub fn of_file(path: &Path, display_size: (u32, u32)) -> Result<Self, CacheError> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(CacheError::MissingSource(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::MissingSource(path.to_path_buf()));
            },
            Err(e) => return Err(e.into()),
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::compute(
            &file_name,
            metadata.len(),
            metadata.modified()?,
            display_size,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 缓存文件名：`anim_<fingerprint>.cache`
    pub fn cache_file_name(&self) -> String {
        format!("{}{}.{}", CACHE_FILE_PREFIX, self.0, CACHE_FILE_EXTENSION)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 日志中只显示前 12 位
        f.write_str(&self.0[..self.0.len().min(12)])
    }
}
