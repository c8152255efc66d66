//! 数据库连接抽象
//!
//! 执行器只依赖这两个 trait：
//! - `Connection`: 已打开的数据库连接，可预处理语句并报告最近一次错误
//! - `PreparedStatement`: 单次调用内使用的预处理语句
//!
//! 预处理语句借用连接，离开作用域即释放，不跨调用复用。

pub mod sqlite;

pub use sqlite::SqliteConnection;

use crate::data::value::{Row, Value};
use std::fmt;

/// 驱动层错误（仅携带可读信息，由执行器决定是否致命）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DriverError {}

/// 已打开、已认证的数据库连接
pub trait Connection: Send {
    /// 预处理参数化语句
    fn prepare<'c>(
        &'c self,
        sql: &str,
    ) -> std::result::Result<Box<dyn PreparedStatement + 'c>, DriverError>;

    /// 最近一次错误描述
    fn last_error(&self) -> Option<String>;
}

/// 预处理语句
pub trait PreparedStatement {
    /// 语句声明的占位符数量
    fn param_count(&self) -> usize;

    /// 按位置绑定参数（从 0 开始）
    fn bind(&mut self, index: usize, value: &Value) -> std::result::Result<(), DriverError>;

    /// 执行写语句，返回生成的标识（不适用时为 0）
    fn execute(&mut self) -> std::result::Result<i64, DriverError>;

    /// 执行读语句并按返回顺序取出行；`limit` 为 `Some(n)` 时最多取 n 行
    fn query(&mut self, limit: Option<usize>) -> std::result::Result<Vec<Row>, DriverError>;
}
