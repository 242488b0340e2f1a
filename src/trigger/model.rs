use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::trigger::serialization;

/// 透传给运行器的环境变量字段前缀
pub const SCENARIO_MODE_PREFIX: &str = "scenarioMode/";

/// 触发器类型，由触发 id 的后缀决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Scenario,
    QuickSync,
    SyncCollections,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::Scenario,
        TriggerKind::QuickSync,
        TriggerKind::SyncCollections,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            TriggerKind::Scenario => "_scenario",
            TriggerKind::QuickSync => "_quickSync",
            TriggerKind::SyncCollections => "_syncCollections",
        }
    }

    /// `<name>_scenario` -> Scenario
    pub fn from_trigger_id(trigger_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| trigger_id.ends_with(kind.suffix()))
    }

    pub fn is_sync(&self) -> bool {
        !matches!(self, TriggerKind::Scenario)
    }
}

/// 场景运行记录
///
/// 字段名为 camelCase，时间戳为毫秒。未知字段（如 `scenarioMode/<name>`）原样保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRecord {
    #[serde(default)]
    pub trigger_id: String,

    #[serde(default)]
    pub scenario_folder: String,

    #[serde(default)]
    pub scenario_folder_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_seed_folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_seed_folder_id: Option<String>,

    #[serde(default)]
    pub source_collection: String,

    #[serde(default)]
    pub environment: String,

    #[serde(
        default = "default_iterations",
        deserialize_with = "serialization::lenient_count::deserialize"
    )]
    pub iterations: u32,

    /// 展开后的迭代序号（1..=iterations）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,

    /// 调度时是否等待本次运行结束
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wait: bool,

    #[serde(default = "Utc::now", with = "serialization::epoch_millis")]
    pub timestamp_start: DateTime<Utc>,

    #[serde(
        default,
        with = "serialization::epoch_millis_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_stop: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(default)]
    pub console_log: Vec<String>,

    /// 完成时的内存快照
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub triggered_test_report: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_iterations() -> u32 {
    1
}

impl TriggerRecord {
    /// 迭代后缀：第 n 次（n > 1）为 `-n`
    pub fn iteration_suffix(&self) -> String {
        match self.iteration {
            Some(n) if n > 1 => format!("-{}", n),
            _ => String::new(),
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_start.timestamp_millis()
    }

    /// `<triggerId>-<timestampStart>[-n]`
    pub fn run_id(&self) -> String {
        format!(
            "{}-{}{}",
            self.trigger_id,
            self.timestamp_millis(),
            self.iteration_suffix()
        )
    }

    pub fn run_file_name(&self) -> String {
        format!("{}.json", self.run_id())
    }

    /// 批次内的排序键，按字符串比较
    pub fn sort_key(&self) -> String {
        format!("{}-{}", self.timestamp_millis(), self.iteration.unwrap_or(1))
    }

    pub fn is_complete(&self) -> bool {
        self.timestamp_stop.is_some()
    }

    /// 报告产物的基础名：`<folderId>[-n]`
    pub fn report_stem(&self) -> String {
        format!("{}{}", self.scenario_folder_id, self.iteration_suffix())
    }

    /// `scenarioMode/<name>` 透传字段
    pub fn scenario_modes(&self) -> impl Iterator<Item = (&str, String)> {
        self.extra.iter().filter_map(|(key, value)| {
            let name = key.strip_prefix(SCENARIO_MODE_PREFIX)?;
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((name, value))
        })
    }

    /// 从开始到现在（或结束）的秒数
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.timestamp_stop.unwrap_or(now);
        ((end - self.timestamp_start).num_milliseconds() as f64 / 1000.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> TriggerRecord {
        serde_json::from_value(json!({
            "triggerId": "checkout_scenario",
            "scenarioFolder": "Root/Checkout",
            "scenarioFolderId": "folder-1",
            "sourceCollection": "developer",
            "environment": "DEV",
            "iterations": "2",
            "timestampStart": 1700000000000i64,
            "scenarioMode/fast": true,
            "note": "kept"
        }))
        .unwrap()
    }

    #[test]
    fn test_kind_from_trigger_id() {
        assert_eq!(TriggerKind::from_trigger_id("a_scenario"), Some(TriggerKind::Scenario));
        assert_eq!(TriggerKind::from_trigger_id("a_quickSync"), Some(TriggerKind::QuickSync));
        assert_eq!(
            TriggerKind::from_trigger_id("a_syncCollections"),
            Some(TriggerKind::SyncCollections)
        );
        assert_eq!(TriggerKind::from_trigger_id("a_other"), None);
    }

    #[test]
    fn test_passthrough_fields_survive() {
        let record = record();
        assert_eq!(record.iterations, 2);
        assert_eq!(record.extra.get("note"), Some(&json!("kept")));
        assert_eq!(record.scenario_modes().collect::<Vec<_>>(), vec![("fast", "true".to_string())]);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["scenarioMode/fast"], json!(true));
        assert_eq!(value["timestampStart"], json!(1700000000000i64));
        assert!(value.get("wait").is_none());
        assert!(value.get("timestampStop").is_none());
    }

    #[test]
    fn test_run_naming() {
        let mut record = record();
        assert_eq!(record.run_file_name(), "checkout_scenario-1700000000000.json");
        assert_eq!(record.sort_key(), "1700000000000-1");

        record.iteration = Some(2);
        assert_eq!(record.run_id(), "checkout_scenario-1700000000000-2");
        assert_eq!(record.report_stem(), "folder-1-2");
    }
}
