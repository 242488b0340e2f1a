use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// 毫秒时间戳 <-> DateTime<Utc>
pub mod epoch_millis {
    use super::*;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid epoch milliseconds: {}", value))
        })
    }

    /// 数字或数字字符串
    pub(crate) fn from_value(value: &Value) -> Option<DateTime<Utc>> {
        let millis = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// 可选的毫秒时间戳
pub mod epoch_millis_option {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_i64(value.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(super::epoch_millis::from_value))
    }
}

/// 接受数字或数字字符串的计数（`"3"` 和 `3` 等价）
pub mod lenient_count {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let count = match &value {
            // 超出 u32 的值饱和为 u32::MAX，交给上限校验拒绝
            Value::Number(n) => n.as_u64().map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            Value::Null => Some(1),
            _ => None,
        };
        Ok(count.filter(|&n| n > 0).unwrap_or(1))
    }
}
