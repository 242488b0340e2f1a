use crate::template::types::{GeneratorCall, Segment, Template};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const DELIMITER: &str = "$$";
const CALL_PREFIX: &str = "faker.";

/// 解析覆盖值模板
///
/// 支持的格式：
/// - `Ann` 纯文本
/// - `$$faker.person.firstName()$$` 生成器调用
/// - `+49 $$faker.phone.number(["### ####"])$$` 文本与调用混合
///
/// 解析不会失败：无法识别的片段都作为文本保留。
pub fn parse_template(input: &str) -> Template {
    let segments = input
        .split(DELIMITER)
        .filter(|piece| !piece.is_empty())
        .map(parse_segment)
        .collect();

    Template { segments }
}

fn parse_segment(piece: &str) -> Segment {
    if !piece.starts_with(CALL_PREFIX) {
        return Segment::Text(piece.to_string());
    }

    match parse_call(piece) {
        Some(call) => Segment::Call(call),
        None => Segment::Text(piece.to_string()),
    }
}

/// 解析 `faker.<module>.<fn>(<args>)`，括号可省略
fn parse_call(piece: &str) -> Option<GeneratorCall> {
    static CALL_PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = CALL_PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^faker\.([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)(?:\((.*)\))?$")
            .expect("static call pattern")
    });

    let caps = re.captures(piece)?;
    let args = caps.get(3).and_then(|m| parse_args(m.as_str()));

    Some(GeneratorCall {
        module: caps[1].to_string(),
        function: caps[2].to_string(),
        args,
        raw: piece.to_string(),
    })
}

/// 参数必须是 JSON 数组，否则视为无参数
fn parse_args(input: &str) -> Option<Vec<Value>> {
    let input = input.trim();
    if !(input.starts_with('[') && input.ends_with(']')) {
        return None;
    }

    match serde_json::from_str::<Value>(input) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}
