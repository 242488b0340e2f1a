use std::collections::HashSet;

/// 工作步骤查询参数
///
/// 保留请求中的顺序，覆盖值按出现顺序应用。重复的键以第一次出现为准。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkstepParams {
    pairs: Vec<(String, String)>,
}

pub const WORKSTEP_ID: &str = "_workstep_id";
pub const WORKSTEP_NAME: &str = "_workstep_name";
pub const WORKSTEP_ENDPOINT: &str = "_workstep_endpoint";
pub const WORKSTEP_SERVICE: &str = "_workstep_service";
pub const WORKSTEP_BODY: &str = "_workstep_body";
pub const WORKSTEP_FAKER: &str = "_workstep_faker";
pub const WORKSTEP_PREP_ONLY: &str = "_workstep_prepOnly";
pub const LOCALE_MOCK: &str = "_localeMock";
pub const SESSION_REQUEST_ID: &str = "postman_request_id";

/// 工作步骤模式下必须出现的参数
pub const REQUIRED: [&str; 4] = [WORKSTEP_ID, WORKSTEP_NAME, WORKSTEP_ENDPOINT, WORKSTEP_SERVICE];

impl WorkstepParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 存在且非空
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 缺失的必需参数
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED
            .iter()
            .copied()
            .filter(|key| !self.contains(key))
            .collect()
    }

    pub fn is_workstep_call(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// 按请求顺序遍历，重复键只保留第一次出现
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen = HashSet::new();
        self.pairs.iter().filter_map(move |(k, v)| {
            seen.insert(k.as_str())
                .then_some((k.as_str(), v.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WorkstepParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
