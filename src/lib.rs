// lib.rs - 暴露数据访问层给上层业务使用

pub mod core; // 核心基础设施层（日志）
pub mod data; // SQL 数据访问层
pub mod models; // 配置模型

pub use self::core::{init_logger, update_log_level};
pub use data::{
    DataError, FingerprintStrategy, Hydrate, ParamType, Result, Row, Session, SqliteConnection,
    TypeRegistry, Value,
};
pub use models::config::{LogConfig, LogFormat, LogLevel, LogOutput, SessionConfig};
