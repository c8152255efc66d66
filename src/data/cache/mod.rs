//! 缓存层实现
//!
//! 提供会话级查询结果缓存：
//! - `fingerprint`: 由查询文本、类型描述符与绑定值计算缓存键
//! - `query_cache`: 纯记忆化的结果存储（无过期、写入不失效）

pub mod fingerprint;
pub mod query_cache;

pub use fingerprint::FingerprintStrategy;
pub use query_cache::{CachedResult, QueryCache};
