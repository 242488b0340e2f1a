use serde_json::Value;
use std::fmt;

/// 覆盖值模板
///
/// 原始文本按 `$$` 切分后的片段序列，求值时按顺序拼接。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// 不含任何生成器调用
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Text(_)))
    }

    pub fn calls(&self) -> impl Iterator<Item = &GeneratorCall> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Call(call) => Some(call),
            Segment::Text(_) => None,
        })
    }
}

/// 模板片段
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// 原样输出的文本
    Text(String),
    /// `faker.<module>.<fn>(<args>)`
    Call(GeneratorCall),
}

/// 生成器调用
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorCall {
    pub module: String,
    pub function: String,
    /// 参数列表；空列表、格式错误或非 JSON 数组都视为无参数
    pub args: Option<Vec<Value>>,
    /// 片段原文，调用无法求值时原样输出
    pub raw: String,
}

impl GeneratorCall {
    pub fn is_parameterized(&self) -> bool {
        self.args.as_ref().is_some_and(|args| !args.is_empty())
    }
}

impl fmt::Display for GeneratorCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faker.{}.{}", self.module, self.function)
    }
}
