//! CLI 配置文件
//!
//! TOML 格式，默认位置 `<config_dir>/rover/config.toml`。文件不存在时使用默认值，
//! 缺失的字段同样取默认值。

use anyhow::{Context, Result};
use rover_sdk::{DisplayConfig, MotionConfig, PinMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("rover");
    path.push("config.toml");
    Ok(path)
}

/// 解析配置文件路径：命令行指定优先
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_path(),
    }
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    /// 运动参数
    pub motion: MotionConfig,
    /// 引脚分配
    pub pins: PinMap,
    /// 显示与动画缓存
    pub display: DisplayConfig,
}

impl RoverConfig {
    /// 加载配置（文件不存在时返回默认值）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 保存配置（自动创建父目录）
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        Ok(())
    }

    /// 序列化为 TOML（带文件头注释）
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        Ok(format!("# Rover CLI Configuration\n\n{}", body))
    }
}
