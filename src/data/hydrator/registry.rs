//! 类型注册表
//!
//! 按名称解析可构造类型。直接解析失败时，若配置了遗留前缀，
//! 会以 `前缀 + 名称` 再尝试一次；仍失败则返回 `DataError::TypeResolution`。

use super::{hydrate_row_with, Hydrate};
use crate::data::value::Row;
use crate::data::{DataError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type Factory = Arc<dyn Fn(&[Row]) -> Result<Vec<Box<dyn Any + Send>>> + Send + Sync>;

/// 类型注册表
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Factory>,
    legacy_prefix: Option<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置遗留命名空间前缀
    pub fn with_legacy_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.set_legacy_prefix(Some(prefix.into()));
        self
    }

    pub fn set_legacy_prefix(&mut self, prefix: Option<String>) {
        self.legacy_prefix = prefix.filter(|p| !p.is_empty());
    }

    pub fn legacy_prefix(&self) -> Option<&str> {
        self.legacy_prefix.as_deref()
    }

    /// 以类型描述中的名称注册
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Hydrate + Send + 'static,
    {
        let name = T::descriptor().name;
        self.register_as::<T>(name)
    }

    /// 以指定名称注册
    pub fn register_as<T>(&mut self, name: impl Into<String>) -> &mut Self
    where
        T: Hydrate + Send + 'static,
    {
        let factory: Factory = Arc::new(|rows: &[Row]| -> Result<Vec<Box<dyn Any + Send>>> {
            let descriptor = T::descriptor();
            rows.iter()
                .map(|row| {
                    hydrate_row_with::<T>(&descriptor, row)
                        .map(|instance| Box::new(instance) as Box<dyn Any + Send>)
                })
                .collect()
        });
        self.types.insert(name.into(), factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 解析类型名，返回实际命中的注册名
    pub fn resolve(&self, name: &str) -> Result<&str> {
        if let Some((key, _)) = self.types.get_key_value(name) {
            return Ok(key);
        }

        let fallback = self.legacy_prefix.as_ref().map(|p| format!("{p}{name}"));
        if let Some(candidate) = &fallback {
            if let Some((key, _)) = self.types.get_key_value(candidate.as_str()) {
                tracing::debug!(name = name, resolved = %key, "类型经遗留前缀解析");
                return Ok(key);
            }
        }

        tracing::error!(name = name, fallback = ?fallback, "无法解析类型");
        Err(DataError::TypeResolution {
            name: name.to_string(),
            fallback,
        })
    }

    /// 按名称构造整批（类型擦除）
    pub fn hydrate_named(&self, name: &str, rows: &[Row]) -> Result<Vec<Box<dyn Any + Send>>> {
        let key = self.resolve(name)?;
        let factory = &self.types[key];
        (**factory)(rows)
    }

    /// 按名称构造整批并还原为具体类型
    ///
    /// 注册在该名称下的类型不是 `T` 时返回 `DataError::TypeResolution`。
    pub fn hydrate_as<T: 'static>(&self, name: &str, rows: &[Row]) -> Result<Vec<T>> {
        self.hydrate_named(name, rows)?
            .into_iter()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map(|boxed| *boxed)
                    .map_err(|_| DataError::TypeResolution {
                        name: format!("{name} as {}", std::any::type_name::<T>()),
                        fallback: None,
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry")
            .field("types", &names)
            .field("legacy_prefix", &self.legacy_prefix)
            .finish()
    }
}
