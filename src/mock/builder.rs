use crate::collection::MetaGlobals;
use crate::error::{Result, ScenarioError};
use crate::faker::{FakeContext, GeneratorRegistry};
use crate::mock::overrides::{collect_overrides, select_one_of};
use crate::mock::path::{get_path, set_path, unset_path};
use crate::params::{LOCALE_MOCK, WORKSTEP_BODY, WORKSTEP_ENDPOINT, WORKSTEP_PREP_ONLY, WorkstepParams};
use crate::schema::{FieldKind, Schema, SchemaGenerator};
use crate::template::evaluate_template;
use serde_json::{Value, json};

/// 未解析的对象 mock 占位字段
pub const UNRESOLVED_OBJECT_MOCK: &str = "_unresolvedObjectmock";

/// 删除字段的覆盖值
const REMOVE_FIELD: &str = "null";

/// 请求体 mock 构建器
///
/// 构建流程：
/// 1. 从元数据读取 `workstep_schemas.request`
/// 2. oneOf 按覆盖键的下标选择候选
/// 3. 由 schema 生成默认值
/// 4. 有对象 mock 时以示例响应为基础
/// 5. 按请求顺序应用字段覆盖（模板求值 + 类型转换）
pub struct MockBuilder {
    registry: &'static GeneratorRegistry,
    default_locale: String,
}

impl MockBuilder {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            registry: GeneratorRegistry::global(),
            default_locale: default_locale.into(),
        }
    }

    /// 构建 mock；任何失败都记录日志并返回 `{}`
    pub fn build(&self, params: &WorkstepParams, globals: &MetaGlobals) -> Value {
        match self.try_build(params, globals) {
            Ok(mock) => mock,
            Err(e) => {
                tracing::error!(
                    "Mocker failed: {} (params: {:?}, metadata: {})",
                    e,
                    params,
                    serde_json::to_string(globals).unwrap_or_default()
                );
                json!({})
            }
        }
    }

    pub fn try_build(&self, params: &WorkstepParams, globals: &MetaGlobals) -> Result<Value> {
        let raw_schema = globals
            .get("workstep_schemas")
            .and_then(|schemas| schemas.get("request"))
            .ok_or_else(|| {
                ScenarioError::Configuration("Globals workstep_schemas not found".to_string())
            })?;
        let schema = Schema::from_value(raw_schema)?;
        let overrides = collect_overrides(params);

        let selected = match &schema {
            Schema::OneOf(alternatives) => alternatives
                .get(select_one_of(&overrides, alternatives.len()))
                .ok_or_else(|| ScenarioError::Builder("oneOf without alternatives".to_string()))?,
            other => other,
        };
        let generated = SchemaGenerator::generate(selected);

        let mut mock = self.base_mock(params, globals, &generated)?;

        let mut ctx = FakeContext::new(self.locale(params));
        for field in &overrides {
            let value = evaluate_template(&field.template, self.registry, &mut ctx);
            if value == REMOVE_FIELD {
                unset_path(&mut mock, &field.path);
                continue;
            }

            let kind = FieldKind::classify(get_path(&generated, &field.path), selected.at_path(&field.path));
            set_path(&mut mock, &field.path, kind.coerce(&value));
        }

        Ok(mock)
    }

    /// 对象 mock 基础值
    fn base_mock(&self, params: &WorkstepParams, globals: &MetaGlobals, generated: &Value) -> Result<Value> {
        let examples: &[Value] = globals
            .get("workstep_responses")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let Some(name) = lookup(examples, |key| key == "objectMock") else {
            return Ok(generated.clone());
        };

        let example_infix = format!("/request/{}/", name);
        let example = lookup(examples, |key| key == name || key.contains(&example_infix))
            .filter(|body| !body.is_empty());

        match example {
            Some(body) => Ok(serde_json::from_str(body)?),
            None if params.get(WORKSTEP_PREP_ONLY) == Some("true") => Ok(generated.clone()),
            None => Ok(json!({ UNRESOLVED_OBJECT_MOCK: name })),
        }
    }

    /// `_localeMock` 缺失或仍是 `{{…}}` 占位符时使用默认语言区域
    fn locale<'a>(&'a self, params: &'a WorkstepParams) -> &'a str {
        params
            .get_non_empty(LOCALE_MOCK)
            .filter(|locale| !locale.starts_with("{{"))
            .unwrap_or(&self.default_locale)
    }
}

/// 在 `[{key, value}]` 列表中查找第一个匹配的字符串值
fn lookup<'a>(entries: &'a [Value], matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    entries.iter().find_map(|entry| {
        let key = entry.get("key")?.as_str()?;
        if matches(key) {
            entry.get("value")?.as_str()
        } else {
            None
        }
    })
}

/// 请求体引用：`_workstep_body`，默认 `<endpoint>/request`
pub fn body_reference(params: &WorkstepParams) -> String {
    match params.get_non_empty(WORKSTEP_BODY) {
        Some(body) => body.to_string(),
        None => format!("{}/request", params.get(WORKSTEP_ENDPOINT).unwrap_or_default()),
    }
}

/// 只有请求体引用以 `/request` 结尾时才生成 mock
pub fn wants_mock(params: &WorkstepParams) -> bool {
    body_reference(params).ends_with("/request")
}
