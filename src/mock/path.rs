use serde_json::{Map, Value};

fn index_of(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// 按点号路径读取，数字段可索引数组
pub fn get_path<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => index_of(segment).and_then(|i| items.get(i)),
        _ => None,
    })
}

/// 按点号路径写入
///
/// 缺失或非容器的中间节点会被替换为新容器：下一段是数字时为数组，否则为对象。
pub fn set_path(target: &mut Value, dotted: &str, new_value: Value) {
    let segments: Vec<&str> = dotted.split('.').collect();
    let mut current = target;

    for (i, segment) in segments.iter().enumerate() {
        current = child_slot(current, segment);

        if i + 1 == segments.len() {
            *current = new_value;
            return;
        }

        if !current.is_object() && !current.is_array() {
            let next_is_index = segments.get(i + 1).is_some_and(|s| index_of(s).is_some());
            *current = if next_is_index {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
    }
}

fn child_slot<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    match (index_of(segment), current) {
        (Some(index), Value::Array(items)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (_, current) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            &mut current[segment]
        }
    }
}

/// 按点号路径删除；路径不存在时无操作
pub fn unset_path(target: &mut Value, dotted: &str) -> Option<Value> {
    let (parent_path, last) = match dotted.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, dotted),
    };

    let parent = match parent_path {
        Some(path) => get_path_mut(target, path)?,
        None => target,
    };

    match parent {
        Value::Object(map) => map.shift_remove(last),
        // 数组元素置空而不移动后续元素
        Value::Array(items) => index_of(last)
            .and_then(|i| items.get_mut(i))
            .map(|slot| std::mem::replace(slot, Value::Null)),
        _ => None,
    }
}

fn get_path_mut<'a>(value: &'a mut Value, dotted: &str) -> Option<&'a mut Value> {
    dotted.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => index_of(segment).and_then(|i| items.get_mut(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path() {
        let value = json!({ "a": { "b": [1, { "c": true }] } });
        assert_eq!(get_path(&value, "a.b.1.c"), Some(&json!(true)));
        assert_eq!(get_path(&value, "a.x"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut value = json!({});
        set_path(&mut value, "billingAddress.firstName", json!("Ann"));
        set_path(&mut value, "items.1.sku", json!("X"));
        assert_eq!(
            value,
            json!({
                "billingAddress": { "firstName": "Ann" },
                "items": [null, { "sku": "X" }]
            })
        );
    }

    #[test]
    fn test_set_replaces_primitive_intermediate() {
        let mut value = json!({ "a": "text" });
        set_path(&mut value, "a.b", json!(1));
        assert_eq!(value, json!({ "a": { "b": 1 } }));
    }

    #[test]
    fn test_set_keeps_property_order() {
        let mut value = json!({ "first": 1, "second": 2 });
        set_path(&mut value, "first", json!(3));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
    }

    #[test]
    fn test_unset() {
        let mut value = json!({ "a": { "b": 1, "c": 2 } });
        assert_eq!(unset_path(&mut value, "a.b"), Some(json!(1)));
        assert_eq!(unset_path(&mut value, "a.zz"), None);
        assert_eq!(unset_path(&mut value, "missing.path"), None);
        assert_eq!(value, json!({ "a": { "c": 2 } }));
    }
}
