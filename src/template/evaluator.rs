use crate::faker::{FakeContext, GeneratorRegistry};
use crate::template::types::{GeneratorCall, Segment, Template};
use serde_json::Value;

/// 模板求值
///
/// 已知调用替换为生成结果，其余片段原样拼接（`$$` 分隔符不保留）。
pub fn evaluate_template(
    template: &Template,
    registry: &GeneratorRegistry,
    ctx: &mut FakeContext,
) -> String {
    template
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.clone(),
            Segment::Call(call) => evaluate_call(call, registry, ctx).unwrap_or_else(|| {
                tracing::debug!("Generator call left literal: {}", call.raw);
                call.raw.clone()
            }),
        })
        .collect()
}

/// 单个调用求值；返回 None 表示保留原文
fn evaluate_call(
    call: &GeneratorCall,
    registry: &GeneratorRegistry,
    ctx: &mut FakeContext,
) -> Option<String> {
    let spec = registry.get(&call.module, &call.function)?;

    if !call.is_parameterized() {
        return Some(spec.call(ctx, &[]).render());
    }

    // 只有 phone.number 接受参数（掩码中的 `*` 为数字占位）
    if call.module == "phone" && call.function == "number" {
        let mask = call.args.as_ref()?.first()?.as_str()?.replace('*', "#");
        return Some(spec.call(ctx, &[Value::String(mask)]).render());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse_template;
    use chrono::{TimeZone, Utc};

    fn eval(input: &str) -> String {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut ctx = FakeContext::seeded("de", 1, now);
        evaluate_template(&parse_template(input), GeneratorRegistry::global(), &mut ctx)
    }

    #[test]
    fn test_literal_passthrough() {
        assert_eq!(eval("Ann"), "Ann");
        assert_eq!(eval(""), "");
    }

    #[test]
    fn test_known_call_is_evaluated() {
        let value = eval("$$faker.location.countryCode()$$");
        assert_eq!(value, "DE");
    }

    #[test]
    fn test_unknown_call_stays_literal_without_delimiters() {
        assert_eq!(eval("x$$faker.nope.nothing()$$y"), "xfaker.nope.nothing()y");
    }

    #[test]
    fn test_phone_mask_argument() {
        let value = eval(r#"$$faker.phone.number(["+49 ***-**"])$$"#);
        assert!(value.starts_with("+49 "));
        assert_eq!(value.len(), "+49 ***-**".len());
        assert!(!value.contains('*'));
    }

    #[test]
    fn test_parameterized_calls_stay_literal() {
        assert_eq!(
            eval(r#"$$faker.date.past([10])$$"#),
            r#"faker.date.past([10])"#
        );
        assert_eq!(
            eval(r#"$$faker.person.firstName(["x"])$$"#),
            r#"faker.person.firstName(["x"])"#
        );
    }

    #[test]
    fn test_date_call_is_normalized() {
        let value = eval("$$faker.date.recent()$$");
        assert_eq!(value.len(), 24);
        assert!(value.ends_with('Z'));
        assert_eq!(&value[10..11], "T");
    }
}
