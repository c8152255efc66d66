//! 查询指纹
//!
//! 两种缓存键构造方式：
//! - `Legacy`: 查询文本、类型描述符与各绑定值字符串形式直接拼接。
//!   没有分隔符，`("ab", "c")` 与 `("a", "bc")` 会得到相同指纹。
//! - `Structured`: 对带类型标记、带长度前缀的编码做 SHA-256，不同元组不会碰撞。

use crate::data::value::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 指纹构造策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintStrategy {
    /// 直接拼接（兼容旧行为，存在碰撞）
    #[default]
    Legacy,
    /// 长度前缀编码 + SHA-256
    Structured,
}

impl FingerprintStrategy {
    /// 计算指纹
    pub fn fingerprint(self, query: &str, types: &str, values: &[Value]) -> String {
        match self {
            FingerprintStrategy::Legacy => legacy(query, types, values),
            FingerprintStrategy::Structured => structured(query, types, values),
        }
    }
}

fn legacy(query: &str, types: &str, values: &[Value]) -> String {
    let mut key = String::with_capacity(query.len() + types.len());
    key.push_str(query);
    key.push_str(types);
    for value in values {
        key.push_str(&value.to_text());
    }
    key
}

fn structured(query: &str, types: &str, values: &[Value]) -> String {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, b'Q', query.as_bytes());
    update_field(&mut hasher, b'P', types.as_bytes());
    hasher.update((values.len() as u64).to_le_bytes());

    for value in values {
        match value {
            Value::Null => update_field(&mut hasher, b'N', &[]),
            Value::Integer(i) => update_field(&mut hasher, b'I', &i.to_le_bytes()),
            Value::Real(f) => update_field(&mut hasher, b'R', &f.to_bits().to_le_bytes()),
            Value::Bool(b) => update_field(&mut hasher, b'B', &[u8::from(*b)]),
            Value::Text(s) => update_field(&mut hasher, b'T', s.as_bytes()),
            Value::Blob(b) => update_field(&mut hasher, b'X', b),
        }
    }

    format!("{:x}", hasher.finalize())
}

fn update_field(hasher: &mut Sha256, tag: u8, bytes: &[u8]) {
    hasher.update([tag]);
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
