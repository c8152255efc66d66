//! 数据库会话
//!
//! `Session` 持有一条数据库连接、缓存开关与查询结果缓存，是数据访问层的统一入口：
//! - 写入：`iud`（先清洗字符串值）/ `iud_escaped`（值已转义）
//! - 读取：`select` / `select_array` / `select_value`，开启缓存时经过结果缓存
//! - 映射：`select_into` / `select_as`，读取后构造领域对象
//!
//! 连接由互斥锁串行化，缓存自带读写锁，`Session` 可通过 `Arc` 在线程间共享。
//! 缓存不会因写入失效，需要时调用 `clear_cache`。
//!
//! # 使用示例
//!
//! ```rust
//! use crate::data::Session;
//!
//! let session = Session::in_memory(true)?;
//! session.iud_escaped("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", "", &[])?;
//!
//! let id = session.iud("INSERT INTO users (name) VALUES (?)", "s", &["<b>Ada</b>".into()])?;
//! let row = session.select("SELECT * FROM users WHERE id = ?", "i", &[id.into()])?;
//! let users: Vec<User> = session.select_into("SELECT * FROM users", "", &[])?;
//! ```

use crate::data::cache::{FingerprintStrategy, QueryCache};
use crate::data::connection::{Connection, SqliteConnection};
use crate::data::executor::Executor;
use crate::data::hydrator::{self, Hydrate, TypeRegistry};
use crate::data::sanitizer;
use crate::data::value::{Row, Value};
use crate::data::{DataError, Result};
use crate::models::config::SessionConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 数据库会话
pub struct Session {
    /// 数据库连接
    conn: Mutex<Box<dyn Connection>>,
    /// 是否启用查询缓存
    caching_enabled: AtomicBool,
    /// 查询结果缓存（仅在启用时读写）
    cache: QueryCache,
    /// 按名称映射时使用的类型注册表
    registry: TypeRegistry,
}

impl Session {
    /// 使用已打开的连接创建会话（旧式拼接指纹）
    pub fn new(conn: impl Connection + 'static, caching_enabled: bool) -> Self {
        Self::with_strategy(conn, caching_enabled, FingerprintStrategy::default())
    }

    /// 使用指定指纹策略创建会话
    pub fn with_strategy(
        conn: impl Connection + 'static,
        caching_enabled: bool,
        strategy: FingerprintStrategy,
    ) -> Self {
        Self {
            conn: Mutex::new(Box::new(conn)),
            caching_enabled: AtomicBool::new(caching_enabled),
            cache: QueryCache::new(strategy),
            registry: TypeRegistry::new(),
        }
    }

    /// 按配置打开 SQLite 会话
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let conn = SqliteConnection::open(&config.database)?;
        let mut session = Self::with_strategy(conn, config.caching_enabled, config.fingerprint);
        session.registry.set_legacy_prefix(config.legacy_prefix.clone());

        tracing::info!(
            database = %config.database.display(),
            caching = config.caching_enabled,
            fingerprint = ?config.fingerprint,
            "数据库会话已创建"
        );
        Ok(session)
    }

    /// 内存数据库会话（测试与临时数据）
    pub fn in_memory(caching_enabled: bool) -> Result<Self> {
        Ok(Self::new(SqliteConnection::open_in_memory()?, caching_enabled))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn Connection>>> {
        self.conn
            .lock()
            .map_err(|e| DataError::Concurrency(e.to_string()))
    }

    // ==================== 写入 ====================

    /// 清洗字符串值后执行插入/更新/删除，返回生成的标识
    pub fn iud(&self, query: &str, types: &str, values: &[Value]) -> Result<i64> {
        let escaped = sanitizer::sanitize(values);
        self.iud_escaped(query, types, &escaped)
    }

    /// 执行插入/更新/删除（值已转义，不再清洗）
    pub fn iud_escaped(&self, query: &str, types: &str, values: &[Value]) -> Result<i64> {
        let conn = self.lock()?;
        Executor::new(&**conn).write(query, types, values)
    }

    // ==================== 读取 ====================

    /// 查询第一行
    pub fn select(&self, query: &str, types: &str, values: &[Value]) -> Result<Option<Row>> {
        let fetch = || {
            let conn = self.lock()?;
            Executor::new(&**conn).read_one(query, types, values)
        };

        if self.caching_enabled() {
            self.cache.fetch_row(query, types, values, fetch)
        } else {
            fetch()
        }
    }

    /// 查询全部行
    pub fn select_array(&self, query: &str, types: &str, values: &[Value]) -> Result<Vec<Row>> {
        let fetch = || {
            let conn = self.lock()?;
            Executor::new(&**conn).read_all(query, types, values)
        };

        if self.caching_enabled() {
            self.cache.fetch_rows(query, types, values, fetch)
        } else {
            fetch()
        }
    }

    /// 查询第一行的第一列
    pub fn select_value(
        &self,
        query: &str,
        types: &str,
        values: &[Value],
    ) -> Result<Option<Value>> {
        Ok(self
            .select(query, types, values)?
            .and_then(|row| row.first().cloned()))
    }

    // ==================== 映射 ====================

    /// 查询全部行并构造为 `T`
    pub fn select_into<T: Hydrate>(
        &self,
        query: &str,
        types: &str,
        values: &[Value],
    ) -> Result<Vec<T>> {
        let rows = self.select_array(query, types, values)?;
        hydrator::hydrate(&rows)
    }

    /// 查询全部行并按注册名构造
    pub fn select_as<T: 'static>(
        &self,
        type_name: &str,
        query: &str,
        types: &str,
        values: &[Value],
    ) -> Result<Vec<T>> {
        let rows = self.select_array(query, types, values)?;
        self.registry.hydrate_as(type_name, &rows)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    // ==================== 缓存 ====================

    pub fn caching_enabled(&self) -> bool {
        self.caching_enabled.load(Ordering::Acquire)
    }

    /// 开关缓存；关闭时保留已有缓存项，只是不再读写
    pub fn set_caching(&self, enabled: bool) {
        self.caching_enabled.store(enabled, Ordering::Release);
    }

    /// 清空缓存
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// 获取当前缓存项数量
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("caching_enabled", &self.caching_enabled())
            .field("fingerprint", &self.cache.strategy())
            .field("cache_len", &self.cache_len())
            .field("registry", &self.registry)
            .finish()
    }
}
