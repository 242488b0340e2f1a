use crate::schema::types::{ArraySchema, LeafSchema, LeafType, ObjectSchema, Schema};
use serde_json::{Map, Value};

/// 确定性的时间戳默认值，和 date 类 faker 的输出格式一致
pub const DEFAULT_DATE_TIME: &str = "1970-01-01T00:00:00.000Z";

/// Schema 默认值生成器
///
/// 纯函数：同一个 schema 总是生成同一棵值树。
/// - 所有属性（必填和可选）都会生成
/// - `default` 优先，其次是 `enum` 的第一个值
/// - oneOf 取第 0 个候选（顶层候选的选择由 mock 构建器完成）
/// - allOf 先按属性并集合并再生成
pub struct SchemaGenerator;

impl SchemaGenerator {
    pub fn generate(schema: &Schema) -> Value {
        match schema {
            Schema::Object(object) => Self::generate_object(object),
            Schema::OneOf(alternatives) => alternatives
                .first()
                .map(Self::generate)
                .unwrap_or(Value::Null),
            Schema::AllOf(parts) => Self::generate(&Schema::merge_all_of(parts)),
            Schema::Array(array) => Self::generate_array(array),
            Schema::Leaf(leaf) => Self::generate_leaf(leaf),
        }
    }

    fn generate_object(object: &ObjectSchema) -> Value {
        if let Some(default) = &object.default {
            return default.clone();
        }

        let map: Map<String, Value> = object
            .properties
            .iter()
            .map(|(name, schema)| (name.clone(), Self::generate(schema)))
            .collect();
        Value::Object(map)
    }

    fn generate_array(array: &ArraySchema) -> Value {
        if let Some(default) = &array.default {
            return default.clone();
        }

        let Some(items) = array.items.as_deref() else {
            return Value::Array(Vec::new());
        };

        let count = array.min_items.max(1);
        Value::Array((0..count).map(|_| Self::generate(items)).collect())
    }

    fn generate_leaf(leaf: &LeafSchema) -> Value {
        if let Some(default) = &leaf.default {
            return default.clone();
        }
        if let Some(first) = leaf.enum_values.first() {
            return first.clone();
        }

        match leaf.kind {
            LeafType::String => Value::String(Self::default_string(leaf)),
            LeafType::Integer => {
                let min = leaf.minimum.map(|m| m.ceil() as i64).unwrap_or(0);
                let value = match leaf.maximum {
                    Some(max) if (min as f64) > max => max.floor() as i64,
                    _ => min,
                };
                Value::from(value)
            }
            LeafType::Number => {
                let min = leaf.minimum.unwrap_or(0.0);
                let value = match leaf.maximum {
                    Some(max) if min > max => max,
                    _ => min,
                };
                Value::from(value)
            }
            LeafType::Boolean => Value::Bool(false),
            LeafType::Null | LeafType::Any => Value::Null,
        }
    }

    fn default_string(leaf: &LeafSchema) -> String {
        let base = match leaf.format.as_deref() {
            Some("date-time") => DEFAULT_DATE_TIME,
            Some("date") => "1970-01-01",
            Some("time") => "00:00:00",
            Some("email") => "user@example.com",
            Some("uuid") => "00000000-0000-4000-8000-000000000000",
            Some("uri") | Some("url") => "https://example.com",
            Some("hostname") => "example.com",
            Some("ipv4") => "127.0.0.1",
            Some("ipv6") => "::1",
            _ => "string",
        };

        let mut value: String = base.to_string();
        if let Some(min) = leaf.min_length {
            let len = value.chars().count();
            if len < min {
                value.extend(std::iter::repeat_n('x', min - len));
            }
        }
        if let Some(max) = leaf.max_length {
            value = value.chars().take(max).collect();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generate(schema: Value) -> Value {
        SchemaGenerator::generate(&Schema::from_value(&schema).unwrap())
    }

    #[test]
    fn test_every_property_is_generated() {
        let value = generate(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string" },
                "active": { "type": "boolean" },
                "address": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } }
                },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));

        assert_eq!(
            value,
            json!({
                "id": 0,
                "name": "string",
                "active": false,
                "address": { "city": "string" },
                "tags": ["string"]
            })
        );
    }

    #[test]
    fn test_defaults_and_enums_win() {
        let value = generate(json!({
            "properties": {
                "currency": { "type": "string", "enum": ["EUR", "USD"] },
                "country": { "type": "string", "default": "DE" }
            }
        }));

        assert_eq!(value, json!({ "currency": "EUR", "country": "DE" }));
    }

    #[test]
    fn test_string_length_constraints() {
        assert_eq!(generate(json!({ "type": "string", "maxLength": 3 })), json!("str"));
        assert_eq!(
            generate(json!({ "type": "string", "minLength": 8 })),
            json!("stringxx")
        );
    }

    #[test]
    fn test_formats() {
        assert_eq!(
            generate(json!({ "type": "string", "format": "date-time" })),
            json!(DEFAULT_DATE_TIME)
        );
        assert_eq!(
            generate(json!({ "type": "string", "format": "email" })),
            json!("user@example.com")
        );
    }

    #[test]
    fn test_numeric_bounds() {
        assert_eq!(generate(json!({ "type": "integer", "minimum": 1.5 })), json!(2));
        assert_eq!(generate(json!({ "type": "number", "minimum": 2.5 })), json!(2.5));
    }

    #[test]
    fn test_one_of_defaults_to_first_alternative() {
        let value = generate(json!({
            "oneOf": [
                { "properties": { "iban": { "type": "string" } } },
                { "properties": { "card": { "type": "string" } } }
            ]
        }));
        assert_eq!(value, json!({ "iban": "string" }));
    }

    #[test]
    fn test_all_of_property_union() {
        let value = generate(json!({
            "allOf": [
                { "properties": { "a": { "type": "string" } } },
                { "properties": { "b": { "type": "integer" } } }
            ]
        }));
        assert_eq!(value, json!({ "a": "string", "b": 0 }));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let schema = json!({
            "properties": {
                "n": { "type": "number" },
                "items": { "type": "array", "minItems": 2, "items": { "type": "integer" } }
            }
        });
        assert_eq!(generate(schema.clone()), generate(schema));
    }
}
