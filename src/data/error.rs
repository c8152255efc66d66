//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义数据访问层的所有致命错误，并提供与 `anyhow` 的兼容层。
//!
//! # 错误策略
//!
//! | 情况               | 处理方式                     |
//! |--------------------|------------------------------|
//! | 语句预处理失败     | `DataError::Preparation`     |
//! | 参数数量不匹配     | 记录日志，继续执行           |
//! | 执行期数据库错误   | 记录日志，返回空结果 / 0     |
//! | 类型解析失败       | `DataError::TypeResolution`  |
//! | 构造参数缺失       | `DataError::MissingField`    |

use std::path::PathBuf;
use thiserror::Error;

/// 数据访问层的统一错误类型
#[derive(Error, Debug)]
pub enum DataError {
    /// SQL 语句无法被数据库编译
    #[error("语句预处理失败: {query}: {message}")]
    Preparation { query: String, message: String },

    /// 目标类型无法解析（含遗留前缀重试）
    #[error("无法解析类型: {name}{}", fallback.as_ref().map(|f| format!("（已尝试 {f}）")).unwrap_or_default())]
    TypeResolution {
        name: String,
        fallback: Option<String>,
    },

    /// 必需的构造参数在行中没有对应字段
    #[error("缺少字段: {type_name} 需要参数 {param}")]
    MissingField { type_name: String, param: String },

    /// 构造函数拒绝了转换后的参数
    #[error("无效参数: {type_name}.{param}: {message}")]
    InvalidArgument {
        type_name: String,
        param: String,
        message: String,
    },

    /// 数据库错误（连接建立阶段）
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化/反序列化错误
    #[error("JSON 序列化错误: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// TOML 反序列化错误
    #[error("TOML 反序列化错误: {0}")]
    TomlDeserialization(#[from] toml::de::Error),

    /// 并发错误
    #[error("并发错误: {0}")]
    Concurrency(String),
}

/// 便于与现有代码集成的类型别名
pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    /// 从 `std::io::Error` 和路径创建 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_field(type_name: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingField {
            type_name: type_name.into(),
            param: param.into(),
        }
    }

    pub fn invalid_argument(
        type_name: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            type_name: type_name.into(),
            param: param.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preparation_display() {
        let err = DataError::Preparation {
            query: "SELEC 1".to_string(),
            message: "syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "语句预处理失败: SELEC 1: syntax error");
    }

    #[test]
    fn test_type_resolution_display() {
        let err = DataError::TypeResolution {
            name: "User".to_string(),
            fallback: None,
        };
        assert_eq!(err.to_string(), "无法解析类型: User");

        let err = DataError::TypeResolution {
            name: "User".to_string(),
            fallback: Some("legacy::User".to_string()),
        };
        assert!(err.to_string().contains("legacy::User"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = DataError::missing_field("User", "email");
        assert_eq!(err.to_string(), "缺少字段: User 需要参数 email");
    }

    #[test]
    fn test_io_error_construction() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DataError::io("/path/to/file", io_err);
        assert!(err.to_string().contains("/path/to/file"));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err = DataError::missing_field("User", "id");
        let anyhow_err: anyhow::Error = err.into();
        assert!(anyhow_err.to_string().contains("缺少字段"));
    }
}
