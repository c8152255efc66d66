//! SQLite 连接实现
//!
//! 基于 `rusqlite` 实现 `Connection` / `PreparedStatement`：
//! - 单连接，由 `Session` 负责串行化访问
//! - 每次调用创建一条预处理语句，调用结束即释放
//! - 写语句逐步执行到结束，返回的结果行（`RETURNING`、`PRAGMA` 等）被丢弃
//! - 生成标识：INSERT/REPLACE 语句实际插入了行时取 `last_insert_rowid`，否则为 0
//!
//! # 使用示例
//!
//! ```rust
//! use std::path::Path;
//! use crate::data::connection::SqliteConnection;
//!
//! let conn = SqliteConnection::open(Path::new("app.db"))?;
//! let memory = SqliteConnection::open_in_memory()?;
//! ```

use super::{Connection, DriverError, PreparedStatement};
use crate::data::value::{Row, Value};
use crate::data::{DataError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// 内存数据库路径
pub const MEMORY_PATH: &str = ":memory:";

/// 会产生新行 ID 的语句
static INSERT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:insert|replace)\b").expect("insert statement pattern is valid")
});

/// SQLite 连接
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    /// 数据库路径（用于错误报告）
    path: PathBuf,
    last_error: RefCell<Option<String>>,
}

impl SqliteConnection {
    /// 打开（或创建）数据库文件，`":memory:"` 打开内存数据库
    pub fn open(path: &Path) -> Result<Self> {
        if path == Path::new(MEMORY_PATH) {
            return Self::open_in_memory();
        }

        // 创建父目录
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
        }

        let conn = rusqlite::Connection::open(path).map_err(DataError::Database)?;
        tracing::debug!(path = %path.display(), "SQLite 连接已打开");
        Ok(Self::from_connection(conn, path.to_path_buf()))
    }

    /// 打开内存数据库
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(DataError::Database)?;
        Ok(Self::from_connection(conn, PathBuf::from(MEMORY_PATH)))
    }

    fn from_connection(conn: rusqlite::Connection, path: PathBuf) -> Self {
        Self {
            conn,
            path,
            last_error: RefCell::new(None),
        }
    }

    /// 执行原始 SQL（建表等引导操作，不经过缓存与清洗）
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(DataError::Database)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_error(&self, err: &rusqlite::Error) -> DriverError {
        let message = err.to_string();
        *self.last_error.borrow_mut() = Some(message.clone());
        DriverError::new(message)
    }
}

impl Connection for SqliteConnection {
    fn prepare<'c>(
        &'c self,
        sql: &str,
    ) -> std::result::Result<Box<dyn PreparedStatement + 'c>, DriverError> {
        let stmt = self.conn.prepare(sql).map_err(|e| self.record_error(&e))?;
        Ok(Box::new(SqliteStatement {
            owner: self,
            stmt,
            inserts: INSERT_STATEMENT.is_match(sql),
        }))
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }
}

struct SqliteStatement<'c> {
    owner: &'c SqliteConnection,
    stmt: rusqlite::Statement<'c>,
    /// INSERT / REPLACE 语句
    inserts: bool,
}

impl PreparedStatement for SqliteStatement<'_> {
    fn param_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn bind(&mut self, index: usize, value: &Value) -> std::result::Result<(), DriverError> {
        self.stmt
            .raw_bind_parameter(index + 1, to_sql_value(value))
            .map_err(|e| self.owner.record_error(&e))
    }

    fn execute(&mut self) -> std::result::Result<i64, DriverError> {
        let owner = self.owner;
        let mut rows = self.stmt.raw_query();
        while rows.next().map_err(|e| owner.record_error(&e))?.is_some() {}
        drop(rows);

        if self.inserts && owner.conn.changes() > 0 {
            Ok(owner.conn.last_insert_rowid())
        } else {
            Ok(0)
        }
    }

    fn query(&mut self, limit: Option<usize>) -> std::result::Result<Vec<Row>, DriverError> {
        let owner = self.owner;
        let columns: Vec<String> = self
            .stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = self.stmt.raw_query();
        let mut out = Vec::new();
        while limit.map_or(true, |max| out.len() < max) {
            let Some(row) = rows.next().map_err(|e| owner.record_error(&e))? else {
                break;
            };
            let mut converted = Row::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(|e| owner.record_error(&e))?;
                converted.push(name.clone(), from_value_ref(value));
            }
            out.push(converted);
        }
        Ok(out)
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(f) => SqlValue::Real(*f),
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
