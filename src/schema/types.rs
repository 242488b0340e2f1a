use crate::error::{Result, ScenarioError};
use serde_json::Value;

/// Schema 节点
///
/// 服务集合里的 schema 是已经解引用过的 JSON Schema 子集，
/// 这里只保留 mock 生成需要的部分。
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Object(ObjectSchema),
    /// 有序候选，生成时默认取第 0 个
    OneOf(Vec<Schema>),
    /// 按属性并集合并
    AllOf(Vec<Schema>),
    Array(ArraySchema),
    Leaf(LeafSchema),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    /// 保持声明顺序
    pub properties: Vec<(String, Schema)>,
    pub required: Vec<String>,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArraySchema {
    pub items: Option<Box<Schema>>,
    pub min_items: usize,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafSchema {
    pub kind: LeafType,
    pub format: Option<String>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub enum_values: Vec<Value>,
    pub default: Option<Value>,
}

impl LeafSchema {
    pub fn new(kind: LeafType) -> Self {
        Self {
            kind,
            format: None,
            max_length: None,
            min_length: None,
            minimum: None,
            maximum: None,
            enum_values: Vec::new(),
            default: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Any,
}

impl LeafType {
    fn parse(s: &str) -> Self {
        match s {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::Any,
        }
    }
}

impl Schema {
    /// 从 JSON 值解析 schema（递归下降）
    pub fn from_value(value: &Value) -> Result<Schema> {
        let node = match value {
            Value::Object(map) => map,
            Value::Bool(true) => return Ok(Schema::Leaf(LeafSchema::new(LeafType::Any))),
            other => {
                return Err(ScenarioError::Configuration(format!(
                    "schema node must be an object, got {}",
                    other
                )));
            }
        };

        if let Some(alternatives) = node.get("oneOf").or_else(|| node.get("anyOf")) {
            return Ok(Schema::OneOf(parse_list(alternatives, "oneOf")?));
        }

        if let Some(parts) = node.get("allOf") {
            return Ok(Schema::AllOf(parse_list(parts, "allOf")?));
        }

        let declared_type = declared_type(value);
        let default = node.get("default").cloned();

        match declared_type.as_deref() {
            Some("object") => parse_object(node, default),
            None if node.contains_key("properties") => parse_object(node, default),
            Some("array") => parse_array(node, default),
            None if node.contains_key("items") => parse_array(node, default),
            other => {
                let mut leaf = LeafSchema::new(other.map(LeafType::parse).unwrap_or(LeafType::Any));
                leaf.format = node.get("format").and_then(Value::as_str).map(str::to_string);
                leaf.max_length = node.get("maxLength").and_then(Value::as_u64).map(|n| n as usize);
                leaf.min_length = node.get("minLength").and_then(Value::as_u64).map(|n| n as usize);
                leaf.minimum = node.get("minimum").and_then(Value::as_f64);
                leaf.maximum = node.get("maximum").and_then(Value::as_f64);
                leaf.enum_values = node
                    .get("enum")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                leaf.default = default;
                Ok(Schema::Leaf(leaf))
            }
        }
    }

    /// 查找直接子属性（allOf 按合并后的结果查找）
    pub fn property(&self, name: &str) -> Option<&Schema> {
        match self {
            Schema::Object(object) => object
                .properties
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, schema)| schema),
            // 后出现的定义覆盖先出现的
            Schema::AllOf(parts) => parts.iter().rev().find_map(|part| part.property(name)),
            Schema::Array(array) if name.chars().all(|c| c.is_ascii_digit()) => {
                array.items.as_deref()
            }
            _ => None,
        }
    }

    /// 按点号路径查找 schema，例如 `billingAddress.firstName`
    pub fn at_path(&self, dotted: &str) -> Option<&Schema> {
        dotted
            .split('.')
            .try_fold(self, |current, segment| current.property(segment))
    }

    /// 叶子节点（用于 maxLength 等约束查询）
    pub fn as_leaf(&self) -> Option<&LeafSchema> {
        match self {
            Schema::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// 将 allOf 的各部分按属性并集合并为一个对象 schema
    pub fn merge_all_of(parts: &[Schema]) -> Schema {
        let mut merged = ObjectSchema::default();
        let mut has_object = false;

        for part in parts {
            let resolved = match part {
                Schema::AllOf(inner) => Schema::merge_all_of(inner),
                other => other.clone(),
            };
            if let Schema::Object(object) = resolved {
                has_object = true;
                for (name, schema) in object.properties {
                    match merged.properties.iter_mut().find(|(key, _)| *key == name) {
                        Some(slot) => slot.1 = schema,
                        None => merged.properties.push((name, schema)),
                    }
                }
                for name in object.required {
                    if !merged.required.contains(&name) {
                        merged.required.push(name);
                    }
                }
                if object.default.is_some() {
                    merged.default = object.default;
                }
            }
        }

        if has_object {
            Schema::Object(merged)
        } else {
            parts
                .first()
                .cloned()
                .unwrap_or(Schema::Leaf(LeafSchema::new(LeafType::Any)))
        }
    }
}

fn declared_type(value: &Value) -> Option<String> {
    match value.get("type")? {
        Value::String(s) => Some(s.clone()),
        // ["string", "null"] 取第一个非 null 类型
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .or(Some("null"))
            .map(str::to_string),
        _ => None,
    }
}

fn parse_list(value: &Value, keyword: &str) -> Result<Vec<Schema>> {
    value
        .as_array()
        .ok_or_else(|| ScenarioError::Configuration(format!("{} must be an array", keyword)))?
        .iter()
        .map(Schema::from_value)
        .collect()
}

fn parse_object(node: &serde_json::Map<String, Value>, default: Option<Value>) -> Result<Schema> {
    let mut properties = Vec::new();
    if let Some(props) = node.get("properties").and_then(Value::as_object) {
        for (name, child) in props {
            properties.push((name.clone(), Schema::from_value(child)?));
        }
    }

    let required = node
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Schema::Object(ObjectSchema {
        properties,
        required,
        default,
    }))
}

fn parse_array(node: &serde_json::Map<String, Value>, default: Option<Value>) -> Result<Schema> {
    let items = match node.get("items") {
        Some(items) => Some(Box::new(Schema::from_value(items)?)),
        None => None,
    };
    let min_items = node
        .get("minItems")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(0);

    Ok(Schema::Array(ArraySchema {
        items,
        min_items,
        default,
    }))
}
