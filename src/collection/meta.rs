use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 元数据全局变量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaGlobal {
    pub key: String,
    pub value: Value,
}

impl MetaGlobal {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 有序、key 唯一的元数据列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaGlobals(Vec<MetaGlobal>);

impl MetaGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加；已存在的 key 原位替换
    pub fn push(&mut self, global: MetaGlobal) {
        match self.0.iter_mut().find(|g| g.key == global.key) {
            Some(existing) => existing.value = global.value,
            None => self.0.push(global),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|g| g.key == key).map(|g| &g.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaGlobal> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<MetaGlobal> for MetaGlobals {
    fn extend<T: IntoIterator<Item = MetaGlobal>>(&mut self, iter: T) {
        for global in iter {
            self.push(global);
        }
    }
}

impl FromIterator<MetaGlobal> for MetaGlobals {
    fn from_iter<T: IntoIterator<Item = MetaGlobal>>(iter: T) -> Self {
        let mut globals = Self::new();
        globals.extend(iter);
        globals
    }
}

/// 元数据中的工作步骤摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkstepSummary {
    pub folder: String,
    pub request_name: String,
    pub request_id: String,
}
