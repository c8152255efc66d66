//! 行对象映射
//!
//! 把查询结果行转换为领域对象：
//! - `Hydrate`: 可由具名字段行构造的类型（描述构造参数 + 构造 + 构造后钩子）
//! - `ClassDescriptor` / `ParamSpec`: 构造参数列表（名称、声明类型、可选性、默认值）
//! - `TypeRegistry`: 按名称解析类型，失败时带遗留前缀重试
//!
//! 每行的处理：
//! 1. 没有必需构造参数的类型不读取行字段，全部取声明的默认值
//! 2. 否则按声明顺序为每个参数取同名字段并转换为声明类型；
//!    没有同名字段时取默认值，必需参数缺失则整批失败
//! 3. 构造完成后调用 `cast` 钩子，传入原始行
//!
//! 任意一行失败都会中止整批，不返回部分结果。
//!
//! # 使用示例
//!
//! ```rust
//! use crate::data::hydrator::{Arguments, ClassDescriptor, Hydrate, ParamKind, ParamSpec};
//!
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Hydrate for User {
//!     fn descriptor() -> ClassDescriptor {
//!         ClassDescriptor::new("User")
//!             .param(ParamSpec::required("id", ParamKind::Int))
//!             .param(ParamSpec::required("name", ParamKind::Str))
//!     }
//!
//!     fn construct(args: Arguments) -> Result<Self> {
//!         Ok(Self {
//!             id: args.int("id")?,
//!             name: args.string("name")?,
//!         })
//!     }
//! }
//!
//! let users: Vec<User> = hydrate(&rows)?;
//! ```

pub mod registry;

pub use registry::TypeRegistry;

use crate::data::value::{Row, Value};
use crate::data::{DataError, Result};

/// 构造参数的声明类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Str,
    Bool,
    /// 复杂或未声明的类型，原值透传
    Mixed,
}

impl ParamKind {
    /// 把行字段值转换为声明类型
    pub fn coerce(self, value: &Value) -> Value {
        match self {
            ParamKind::Int => Value::Integer(value.to_int()),
            ParamKind::Float => Value::Real(value.to_float()),
            ParamKind::Str => Value::Text(value.to_text()),
            ParamKind::Bool => Value::Bool(value.to_bool()),
            ParamKind::Mixed => value.clone(),
        }
    }
}

/// 单个构造参数
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    /// 允许 null（null 字段不做转换）
    pub nullable: bool,
    /// 可选参数的默认值
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: Some(default.into()),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    fn coerce(&self, value: &Value) -> Value {
        if self.nullable && value.is_null() {
            Value::Null
        } else {
            self.kind.coerce(value)
        }
    }
}

/// 目标类型描述：类型名 + 有序构造参数
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// 是否存在必需参数
    pub fn requires_arguments(&self) -> bool {
        self.params.iter().any(|p| !p.is_optional())
    }

    /// 只由默认值组成的参数（不读取行字段）
    pub fn defaults(&self) -> Arguments {
        let mut args = Arguments::new(&self.name);
        for spec in &self.params {
            args.push(&spec.name, spec.default.clone().unwrap_or_default());
        }
        args
    }

    /// 按声明顺序为一行解析构造参数
    pub fn resolve(&self, row: &Row) -> Result<Arguments> {
        let mut args = Arguments::new(&self.name);

        for spec in &self.params {
            let value = match row.get(&spec.name) {
                Some(field) => spec.coerce(field),
                None => match &spec.default {
                    Some(default) => default.clone(),
                    None => return Err(DataError::missing_field(&self.name, &spec.name)),
                },
            };
            args.push(&spec.name, value);
        }

        Ok(args)
    }
}

/// 已解析的构造参数
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    type_name: String,
    names: Vec<String>,
    values: Vec<Value>,
}

impl Arguments {
    fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, value: Value) {
        self.names.push(name.to_string());
        self.values.push(value);
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按声明顺序的参数值
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.values[idx])
    }

    /// 原始参数值（复杂类型使用）
    pub fn value(&self, name: &str) -> Result<Value> {
        self.get(name)
            .cloned()
            .ok_or_else(|| self.invalid(name, "未声明的参数"))
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.value(name)? {
            Value::Integer(i) => Ok(i),
            other => Err(self.invalid(name, format!("期望整数，实际为 {:?}", other))),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.value(name)? {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(self.invalid(name, format!("期望浮点数，实际为 {:?}", other))),
        }
    }

    pub fn string(&self, name: &str) -> Result<String> {
        match self.value(name)? {
            Value::Text(s) => Ok(s),
            other => Err(self.invalid(name, format!("期望字符串，实际为 {:?}", other))),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.value(name)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.invalid(name, format!("期望布尔值，实际为 {:?}", other))),
        }
    }

    /// 可空字符串（null → None）
    pub fn opt_string(&self, name: &str) -> Result<Option<String>> {
        match self.value(name)? {
            Value::Null => Ok(None),
            _ => self.string(name).map(Some),
        }
    }

    fn invalid(&self, name: &str, message: impl Into<String>) -> DataError {
        DataError::invalid_argument(&self.type_name, name, message)
    }
}

/// 可由具名字段行构造的类型
pub trait Hydrate: Sized {
    /// 构造参数描述
    fn descriptor() -> ClassDescriptor;

    /// 用已解析并转换好的参数构造实例
    fn construct(args: Arguments) -> Result<Self>;

    /// 构造后钩子，可用原始行填充构造参数之外的字段
    fn cast(&mut self, _row: &Row) {}
}

/// 用给定描述构造单行
pub fn hydrate_row_with<T: Hydrate>(descriptor: &ClassDescriptor, row: &Row) -> Result<T> {
    let args = if descriptor.requires_arguments() {
        descriptor.resolve(row)?
    } else {
        descriptor.defaults()
    };

    let mut instance = T::construct(args)?;
    instance.cast(row);
    Ok(instance)
}

/// 构造单行
pub fn hydrate_row<T: Hydrate>(row: &Row) -> Result<T> {
    hydrate_row_with(&T::descriptor(), row)
}

/// 构造整批；任意一行失败则整批失败
pub fn hydrate<T: Hydrate>(rows: &[Row]) -> Result<Vec<T>> {
    let descriptor = T::descriptor();
    rows.iter()
        .map(|row| hydrate_row_with(&descriptor, row))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    pub(crate) struct User {
        pub id: i64,
        pub name: String,
        pub active: bool,
        pub nickname: Option<String>,
        pub email: Option<String>,
    }

    impl Hydrate for User {
        fn descriptor() -> ClassDescriptor {
            ClassDescriptor::new("User")
                .param(ParamSpec::required("id", ParamKind::Int))
                .param(ParamSpec::required("name", ParamKind::Str))
                .param(ParamSpec::optional("active", ParamKind::Bool, true))
                .param(ParamSpec::optional("nickname", ParamKind::Str, Value::Null).nullable())
        }

        fn construct(args: Arguments) -> Result<Self> {
            Ok(Self {
                id: args.int("id")?,
                name: args.string("name")?,
                active: args.bool("active")?,
                nickname: args.opt_string("nickname")?,
                email: None,
            })
        }

        fn cast(&mut self, row: &Row) {
            self.email = row.get("email").and_then(Value::as_str).map(String::from);
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Marker {
        seen_columns: usize,
    }

    impl Hydrate for Marker {
        fn descriptor() -> ClassDescriptor {
            ClassDescriptor::new("Marker")
        }

        fn construct(args: Arguments) -> Result<Self> {
            assert!(args.is_empty());
            Ok(Self::default())
        }

        fn cast(&mut self, row: &Row) {
            self.seen_columns = row.len();
        }
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_hydrate_coerces_string_id() {
        let rows = vec![row(&[("id", "5".into()), ("name", "Ada".into())])];
        let users: Vec<User> = hydrate(&rows).unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, 5);
        assert_eq!(users[0].name, "Ada");
        assert!(users[0].active);
        assert_eq!(users[0].nickname, None);
    }

    #[test]
    fn test_hydrate_missing_required_field() {
        let rows = vec![row(&[("name", "Ada".into())])];
        let err = hydrate::<User>(&rows).unwrap_err();

        match err {
            DataError::MissingField { type_name, param } => {
                assert_eq!(type_name, "User");
                assert_eq!(param, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hydrate_aborts_whole_batch() {
        let rows = vec![
            row(&[("id", 1.into()), ("name", "Ada".into())]),
            row(&[("id", 2.into())]),
        ];
        assert!(hydrate::<User>(&rows).is_err());
    }

    #[test]
    fn test_hydrate_optional_and_nullable() {
        let rows = vec![row(&[
            ("id", 1.into()),
            ("name", 42.into()),
            ("active", "0".into()),
            ("nickname", Value::Null),
        ])];
        let users: Vec<User> = hydrate(&rows).unwrap();

        assert_eq!(users[0].name, "42");
        assert!(!users[0].active);
        assert_eq!(users[0].nickname, None);
    }

    #[test]
    fn test_cast_hook_receives_raw_row() {
        let rows = vec![row(&[
            ("id", 1.into()),
            ("name", "Ada".into()),
            ("email", "ada@example.com".into()),
        ])];
        let users: Vec<User> = hydrate(&rows).unwrap();
        assert_eq!(users[0].email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_no_argument_type() {
        let rows = vec![row(&[("a", 1.into()), ("b", 2.into())]), Row::new()];
        let markers: Vec<Marker> = hydrate(&rows).unwrap();
        assert_eq!(markers[0].seen_columns, 2);
        assert_eq!(markers[1].seen_columns, 0);
    }

    #[derive(Debug, PartialEq)]
    struct Page {
        size: i64,
        label: String,
    }

    impl Hydrate for Page {
        fn descriptor() -> ClassDescriptor {
            ClassDescriptor::new("Page")
                .param(ParamSpec::optional("size", ParamKind::Int, 20))
                .param(ParamSpec::optional("label", ParamKind::Str, "default"))
        }

        fn construct(args: Arguments) -> Result<Self> {
            Ok(Self {
                size: args.int("size")?,
                label: args.string("label")?,
            })
        }
    }

    #[test]
    fn test_all_optional_type_ignores_row_fields() {
        assert!(!Page::descriptor().requires_arguments());
        assert!(User::descriptor().requires_arguments());

        let rows = vec![row(&[("size", 5.into()), ("label", "custom".into())])];
        let pages: Vec<Page> = hydrate(&rows).unwrap();
        assert_eq!(
            pages[0],
            Page {
                size: 20,
                label: "default".to_string(),
            }
        );
    }

    #[test]
    fn test_mixed_passes_through() {
        let descriptor =
            ClassDescriptor::new("Blob").param(ParamSpec::required("data", ParamKind::Mixed));
        let args = descriptor
            .resolve(&row(&[("data", Value::Blob(vec![1, 2]))]))
            .unwrap();
        assert_eq!(args.values(), &[Value::Blob(vec![1, 2])]);
    }

    #[test]
    fn test_null_coerced_for_non_nullable() {
        let descriptor =
            ClassDescriptor::new("Counter").param(ParamSpec::required("n", ParamKind::Int));
        let args = descriptor.resolve(&row(&[("n", Value::Null)])).unwrap();
        assert_eq!(args.int("n").unwrap(), 0);
    }

    #[test]
    fn test_argument_type_mismatch() {
        let descriptor =
            ClassDescriptor::new("Thing").param(ParamSpec::required("raw", ParamKind::Mixed));
        let args = descriptor.resolve(&row(&[("raw", "x".into())])).unwrap();

        let err = args.int("raw").unwrap_err();
        assert!(matches!(err, DataError::InvalidArgument { .. }));
        assert!(args.value("undeclared").is_err());
    }

    #[test]
    fn test_empty_batch() {
        let users: Vec<User> = hydrate(&[]).unwrap();
        assert!(users.is_empty());
    }
}
