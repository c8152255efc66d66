// 配置结构，放在 models 以便库内各层共享
use crate::data::cache::FingerprintStrategy;
use crate::data::connection::sqlite::MEMORY_PATH;
use crate::data::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// 日志目录（为空时使用 ~/.sqlsession/logs）
    pub file_path: Option<String>,
}

/// 会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 数据库文件路径，`":memory:"` 表示内存数据库
    pub database: PathBuf,
    /// 是否启用查询缓存
    pub caching_enabled: bool,
    /// 缓存指纹策略
    pub fingerprint: FingerprintStrategy,
    /// 类型解析失败时重试使用的遗留前缀
    pub legacy_prefix: Option<String>,
    pub log: LogConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(MEMORY_PATH),
            caching_enabled: false,
            fingerprint: FingerprintStrategy::default(),
            legacy_prefix: None,
            log: LogConfig::default(),
        }
    }
}

impl SessionConfig {
    /// 从文件加载配置（`.toml` 按 TOML 解析，其余按 JSON 解析）
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }
}
