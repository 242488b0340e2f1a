/// 模板模块 - 覆盖值中 `$$faker.<module>.<fn>(<args>)$$` 的解析与求值
mod evaluator;
mod parser;
mod types;

pub use evaluator::evaluate_template;
pub use parser::parse_template;
pub use types::{GeneratorCall, Segment, Template};
