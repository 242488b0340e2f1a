use crate::schema::types::{LeafType, Schema};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// 覆盖值的字段类型
///
/// 由生成的默认值的运行时类型决定，schema 只用来区分 integer/number
/// 以及读取 maxLength。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String { max_length: Option<usize> },
    Bool,
    Number,
    Integer,
    Other,
}

impl FieldKind {
    /// 根据默认值和字段 schema 分类
    pub fn classify(default: Option<&Value>, schema: Option<&Schema>) -> Self {
        let leaf = schema.and_then(Schema::as_leaf);

        match default {
            Some(Value::String(_)) => FieldKind::String {
                max_length: leaf.and_then(|l| l.max_length),
            },
            Some(Value::Bool(_)) => FieldKind::Bool,
            Some(Value::Number(n)) => match leaf.map(|l| l.kind) {
                Some(LeafType::Integer) => FieldKind::Integer,
                Some(LeafType::Number) => FieldKind::Number,
                _ if n.is_f64() => FieldKind::Number,
                _ => FieldKind::Integer,
            },
            _ => FieldKind::Other,
        }
    }

    /// 将覆盖的原始字符串转换为对应类型的 JSON 值
    pub fn coerce(&self, raw: &str) -> Value {
        match self {
            FieldKind::String { max_length } => match max_length {
                Some(max) if raw.chars().count() > *max => {
                    Value::String(raw.chars().take(max.saturating_sub(1)).collect())
                }
                _ => Value::String(raw.to_string()),
            },
            FieldKind::Bool => Value::Bool(raw.eq_ignore_ascii_case("true")),
            FieldKind::Number => match parse_float_prefix(raw) {
                Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Value::from(n as i64),
                Some(n) => Value::from(n),
                None => Value::from(0),
            },
            FieldKind::Integer => Value::from(parse_int_prefix(raw).unwrap_or(0)),
            FieldKind::Other => Value::String(raw.to_string()),
        }
    }
}

/// 解析字符串开头的浮点数（"12.5kg" -> 12.5）
fn parse_float_prefix(raw: &str) -> Option<f64> {
    static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static float pattern")
    });

    re.find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// 解析字符串开头的整数（"42abc" -> 42）
fn parse_int_prefix(raw: &str) -> Option<i64> {
    static INT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = INT_PREFIX.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("static int pattern"));

    re.find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}
