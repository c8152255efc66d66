//! 查询结果缓存
//!
//! 以指纹为键保存执行器返回的原始结果：
//! - 命中时直接返回，不访问数据库
//! - 未命中时调用执行器，保存后返回
//! - 没有容量限制、过期或写入失效，生命周期随 `Session`
//!
//! # 使用示例
//!
//! ```rust
//! use crate::data::cache::{FingerprintStrategy, QueryCache};
//!
//! let cache = QueryCache::new(FingerprintStrategy::Legacy);
//! let rows = cache.fetch_rows("SELECT * FROM users", "", &[], || {
//!     executor.read_all("SELECT * FROM users", "", &[])
//! })?;
//! ```

use super::FingerprintStrategy;
use crate::data::value::{Row, Value};
use crate::data::Result;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 缓存的查询结果（按读取形态区分）
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResult {
    /// 单行读取的结果（含无匹配）
    Row(Option<Row>),
    /// 多行读取的结果
    Rows(Vec<Row>),
}

/// 查询结果缓存
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, CachedResult>>>,
    strategy: FingerprintStrategy,
}

impl QueryCache {
    pub fn new(strategy: FingerprintStrategy) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            strategy,
        }
    }

    pub fn strategy(&self) -> FingerprintStrategy {
        self.strategy
    }

    /// 计算查询指纹
    pub fn key(&self, query: &str, types: &str, values: &[Value]) -> String {
        self.strategy.fingerprint(query, types, values)
    }

    /// 获取缓存项
    pub fn get(&self, key: &str) -> Option<CachedResult> {
        let entries = self.entries.read().ok()?;
        entries.get(key).cloned()
    }

    /// 插入缓存项（覆盖同键旧值）
    pub fn insert(&self, key: String, result: CachedResult) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, result);
        }
    }

    /// 单行读取：命中返回缓存，未命中调用 `fetch` 并保存
    pub fn fetch_row<F>(
        &self,
        query: &str,
        types: &str,
        values: &[Value],
        fetch: F,
    ) -> Result<Option<Row>>
    where
        F: FnOnce() -> Result<Option<Row>>,
    {
        let key = self.key(query, types, values);
        if let Some(CachedResult::Row(row)) = self.get(&key) {
            tracing::debug!(query = query, "查询缓存命中");
            return Ok(row);
        }

        tracing::trace!(query = query, "查询缓存未命中");
        let row = fetch()?;
        self.insert(key, CachedResult::Row(row.clone()));
        Ok(row)
    }

    /// 多行读取：命中返回缓存，未命中调用 `fetch` 并保存
    pub fn fetch_rows<F>(
        &self,
        query: &str,
        types: &str,
        values: &[Value],
        fetch: F,
    ) -> Result<Vec<Row>>
    where
        F: FnOnce() -> Result<Vec<Row>>,
    {
        let key = self.key(query, types, values);
        if let Some(CachedResult::Rows(rows)) = self.get(&key) {
            tracing::debug!(query = query, "查询缓存命中");
            return Ok(rows);
        }

        tracing::trace!(query = query, "查询缓存未命中");
        let rows = fetch()?;
        self.insert(key, CachedResult::Rows(rows.clone()));
        Ok(rows)
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// 获取当前缓存项数量
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(FingerprintStrategy::default())
    }
}
