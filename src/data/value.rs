//! 绑定值与结果行
//!
//! - `Value`: 绑定参数 / 结果列的动态值
//! - `Row`: 单行结果（列名 → 值，保留列顺序与重名列）
//! - `ParamType`: 参数类型描述符中的单个类型标记（`i` / `d` / `s` / `b`）
//!
//! 标量转换遵循宽松语义：字符串取数字前缀转换为数值，空串与 `"0"` 视为假。

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// 字符串开头的数字前缀（允许前导空白、符号、小数与指数）
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t\n\r\x0B\x0C]*[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("numeric prefix pattern is valid")
});

/// 动态值
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 字符串值的引用（非字符串返回 None）
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 转换为整数
    ///
    /// 字符串取数字前缀，无前缀时为 0；浮点数向零截断。
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Integer(i) => *i,
            Value::Real(f) => float_to_int(*f),
            Value::Bool(b) => i64::from(*b),
            Value::Text(s) => str_to_int(s),
            Value::Blob(b) => str_to_int(&String::from_utf8_lossy(b)),
        }
    }

    /// 转换为浮点数
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Integer(i) => *i as f64,
            Value::Real(f) => *f,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => str_to_float(s),
            Value::Blob(b) => str_to_float(&String::from_utf8_lossy(b)),
        }
    }

    /// 转换为布尔值
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Integer(i) => *i != 0,
            Value::Real(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Text(s) => !(s.is_empty() || s == "0"),
            Value::Blob(b) => !(b.is_empty() || b.as_slice() == b"0"),
        }
    }

    /// 转换为字符串（null → ""，true → "1"，false → ""）
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

fn float_to_int(f: f64) -> i64 {
    if f.is_nan() {
        0
    } else {
        // `as` 对越界值饱和截断
        f.trunc() as i64
    }
}

fn str_to_int(s: &str) -> i64 {
    let Some(prefix) = NUMERIC_PREFIX.find(s) else {
        return 0;
    };
    let digits = prefix.as_str().trim_start();
    match digits.parse::<i64>() {
        Ok(i) => i,
        Err(_) => float_to_int(digits.parse::<f64>().unwrap_or(0.0)),
    }
}

fn str_to_float(s: &str) -> f64 {
    NUMERIC_PREFIX
        .find(s)
        .and_then(|m| m.as_str().trim_start().parse::<f64>().ok())
        .unwrap_or(0.0)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// 单行查询结果
///
/// 列按数据库返回顺序保存；重名列全部保留，按名称查找时后出现的列优先。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// 按列名取值
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// 第一列的值
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// 参数类型标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `i`
    Integer,
    /// `d`
    Double,
    /// `s`
    String,
    /// `b`
    Blob,
}

impl ParamType {
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'i' => Some(ParamType::Integer),
            'd' => Some(ParamType::Double),
            's' => Some(ParamType::String),
            'b' => Some(ParamType::Blob),
            _ => None,
        }
    }

    /// 按类型标记转换绑定值；null 保持为 null
    pub fn coerce(self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match self {
            ParamType::Integer => Value::Integer(value.to_int()),
            ParamType::Double => Value::Real(value.to_float()),
            ParamType::String => Value::Text(value.to_text()),
            ParamType::Blob => match value {
                Value::Blob(b) => Value::Blob(b.clone()),
                other => Value::Blob(other.to_text().into_bytes()),
            },
        }
    }
}
