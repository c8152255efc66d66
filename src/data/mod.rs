//! SQL 数据访问层
//!
//! 在单个数据库连接之上提供参数化写入/读取、可选的查询结果缓存，
//! 以及把结果行构造为具体类型实例的能力。
//!
//! # 模块组织
//!
//! - `error`: 统一错误类型定义
//! - `value`: 标量值、结果行与参数类型标签
//! - `connection`: 连接抽象与 SQLite 实现
//! - `sanitizer`: 写入参数的文本清洗
//! - `executor`: 预处理、绑定与执行
//! - `cache`: 查询指纹与结果缓存
//! - `hydrator`: 行到类型实例的构造，以及按名称解析的类型注册表
//! - `session`: 统一入口 `Session`
//!
//! # 使用示例
//!
//! ```rust
//! use sqlsession::data::{Session, Value};
//!
//! let session = Session::in_memory(true)?;
//! session.iud_escaped("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", "", &[])?;
//! let id = session.iud("INSERT INTO users (name) VALUES (?)", "s", &[Value::from("<b>Ada</b>")])?;
//! let row = session.select("SELECT name FROM users WHERE id = ?", "i", &[Value::from(id)])?;
//! ```

pub mod cache;
pub mod connection;
pub mod error;
pub mod executor;
pub mod hydrator;
pub mod sanitizer;
pub mod session;
pub mod value;

pub use cache::{CachedResult, FingerprintStrategy, QueryCache};
pub use connection::{Connection, DriverError, PreparedStatement, SqliteConnection};
pub use error::{DataError, Result};
pub use executor::Executor;
pub use hydrator::{
    hydrate, hydrate_row, Arguments, ClassDescriptor, Hydrate, ParamKind, ParamSpec, TypeRegistry,
};
pub use session::Session;
pub use value::{ParamType, Row, Value};
