//! 写入值清洗
//!
//! 对写入路径上的字符串值做 HTML 中和：
//! 1. 去除标记标签
//! 2. 先解码已有的 HTML 实体，再统一编码（含引号），保证不会二次转义
//!
//! 非字符串值与序列化数据块原样通过。

use crate::data::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static SERIALIZED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([adObis]):").expect("serialized tag pattern is valid"));

/// `a` / `O` / `s`：`<tag>:<digits>:` 之后任意内容，以 `;` 或 `}` 结尾
static SERIALIZED_COMPOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^[aOs]:[0-9]+:.*[;}]$").expect("serialized compound pattern is valid")
});

/// `b` / `i` / `d`：`<tag>:` 之后由数字、`.`、`E`、`-` 组成，以 `;` 结尾
static SERIALIZED_SCALAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[bid]:[0-9.E-]+;$").expect("serialized scalar pattern is valid")
});

const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// 判断字符串是否为序列化数据块
///
/// # 示例
///
/// ```rust
/// assert!(is_serialized("N;"));
/// assert!(is_serialized("i:42;"));
/// assert!(is_serialized("a:1:{i:0;s:1:\"x\";}"));
/// assert!(!is_serialized("hello"));
/// ```
pub fn is_serialized(data: &str) -> bool {
    let data = data.trim_matches(TRIM_CHARS);
    if data == "N;" {
        return true;
    }
    let Some(caps) = SERIALIZED_TAG.captures(data) else {
        return false;
    };
    match &caps[1] {
        "a" | "O" | "s" => SERIALIZED_COMPOUND.is_match(data),
        "b" | "i" | "d" => SERIALIZED_SCALAR.is_match(data),
        _ => false,
    }
}

/// 去除标记标签与 HTML 注释
///
/// `<` 后紧跟空白或位于末尾时视为普通字符；未闭合的标签会吞掉其后全部内容。
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match after.chars().next() {
            None => {
                out.push('<');
                rest = "";
            }
            Some(c) if c.is_whitespace() => {
                out.push('<');
                rest = after;
            }
            Some(_) if after.starts_with("!--") => {
                rest = match after[3..].find("-->") {
                    Some(end) => &after[3 + end + 3..],
                    None => "",
                };
            }
            Some(_) => {
                rest = skip_tag(after);
            }
        }
    }

    out.push_str(rest);
    out
}

/// 跳过标签体，返回 `>` 之后的剩余部分（引号内的尖括号不计）
fn skip_tag(tag: &str) -> &str {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;

    for (idx, c) in tag.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '<') => depth += 1,
            (None, '>') => {
                depth -= 1;
                if depth == 0 {
                    return &tag[idx + 1..];
                }
            }
            _ => {}
        }
    }

    ""
}

/// 清洗单个纯文本字符串
pub fn escape_text(text: &str) -> String {
    let stripped = strip_tags(text);
    let decoded = html_escape::decode_html_entities(&stripped);
    html_escape::encode_quoted_attribute(&decoded).into_owned()
}

/// 清洗单个绑定值
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Text(s) if !is_serialized(s) => Value::Text(escape_text(s)),
        other => other.clone(),
    }
}

/// 清洗一组绑定值，保持顺序与长度
pub fn sanitize(values: &[Value]) -> Vec<Value> {
    values.iter().map(sanitize_value).collect()
}
