//! 缓存记录格式
//!
//! 每个指纹一个文件：
//!
//! ```text
//! [MAGIC: 8 bytes]
//! [Version: 1 byte]
//! [Data: bincode serialized CacheRecord]
//! ```
//!
//! 版本或屏幕尺寸不匹配视为缓存未命中（重新生成），不是错误。

use crate::error::CacheError;
use rover_hal::Frame;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件魔数
pub const MAGIC: &[u8; 8] = b"ROVERANI";

/// 当前记录格式版本
pub const FORMAT_VERSION: u8 = 1;

/// 持久化的动画记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub format_version: u8,
    /// 生成时的屏幕尺寸
    pub display_size: (u32, u32),
    /// 源动画是否为横向
    pub was_landscape: bool,
    /// 每帧时长（秒）
    pub frame_durations: Vec<f64>,
    /// 屏幕尺寸的帧
    pub frames: Vec<Frame>,
}

impl CacheRecord {
    /// 记录是否可直接用于当前屏幕
    pub fn is_compatible(&self, display_size: (u32, u32)) -> bool {
        self.format_version == FORMAT_VERSION
            && self.display_size == display_size
            && !self.frames.is_empty()
            && self.frames.len() == self.frame_durations.len()
            && self.frames.iter().all(|f| f.size() == display_size)
    }

    /// 写入文件
    ///
    /// 先写临时文件再重命名，并发写同一指纹时最后一个写入者胜出，不会留下半截文件。
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let tmp = path.with_extension(format!("{}.tmp", std::process::id()));

        let result = (|| -> Result<(), CacheError> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            writer.write_all(MAGIC)?;
            writer.write_all(&[self.format_version])?;
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                std::fs::rename(&tmp, path)?;
                Ok(())
            },
            Err(e) => {
                let _ = std::fs::remove_file(&tmp);
                Err(e)
            },
        }
    }

    /// 从文件读取
    ///
    /// # 错误
    /// - `CacheError::Io`: 文件不存在或读取失败
    /// - `CacheError::BadMagic`: 不是缓存文件
    /// - `CacheError::UnsupportedVersion`: 版本字节不匹配
    /// - `CacheError::Encoding`: 数据损坏
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CacheError::BadMagic);
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion(version[0]));
        }

        Ok(bincode::deserialize_from(reader)?)
    }
}
