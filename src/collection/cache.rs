use crate::collection::meta::MetaGlobals;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// 触发器元数据使用的固定槽位
pub const TRIGGERS_SLOT: &str = "triggers";

/// 当前使用的集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChoice {
    Primary,
    Working,
}

impl CollectionChoice {
    pub fn label(&self) -> &'static str {
        match self {
            CollectionChoice::Primary => "primary",
            CollectionChoice::Working => "working",
        }
    }
}

/// 进程级元数据缓存
///
/// 集合选择在第一次解析时确定，之后保持不变，直到 `invalidate`。
/// 每个 endpoint 一个槽位，同一 endpoint 的并发写入以最后一次为准。
#[derive(Debug, Default)]
pub struct MetadataCache {
    selection: RwLock<Option<CollectionChoice>>,
    slots: RwLock<HashMap<String, MetaGlobals>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<CollectionChoice> {
        *self.selection.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// 返回当前选择；尚未选择时用 `choose` 决定。第二个值表示是否为新选择
    pub fn select_with(&self, choose: impl FnOnce() -> CollectionChoice) -> (CollectionChoice, bool) {
        let mut selection = self.selection.write().unwrap_or_else(PoisonError::into_inner);
        match *selection {
            Some(choice) => (choice, false),
            None => {
                let choice = choose();
                *selection = Some(choice);
                (choice, true)
            }
        }
    }

    pub fn store(&self, slot: &str, globals: MetaGlobals) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot.to_string(), globals);
    }

    /// 读取槽位；不存在时为空列表
    pub fn get(&self, slot: &str) -> MetaGlobals {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slot)
            .cloned()
            .unwrap_or_default()
    }

    /// 清空集合选择和所有槽位
    pub fn invalidate(&self) {
        *self.selection.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("Metadata cache invalidated");
    }
}
