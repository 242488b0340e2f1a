use crate::collection::MetadataResolver;
use crate::config::RunnerSection;
use crate::error::{Result, ScenarioError};
use crate::trigger::model::TriggerKind;
use crate::trigger::runner::run_sync;
use crate::trigger::scheduler::Scheduler;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// 一个去抖窗口内收集到的触发
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerBatch {
    /// `*_scenario.json` 指针文件，按首次出现顺序
    pub scenarios: Vec<PathBuf>,
    pub syncs: Vec<(TriggerKind, PathBuf)>,
}

impl TriggerBatch {
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty() && self.syncs.is_empty()
    }

    fn add(&mut self, path: PathBuf) {
        let Some(kind) = classify(&path) else {
            return;
        };
        match kind {
            TriggerKind::Scenario => {
                if !self.scenarios.contains(&path) {
                    self.scenarios.push(path);
                }
            }
            kind => {
                if !self.syncs.iter().any(|(k, p)| *k == kind && *p == path) {
                    self.syncs.push((kind, path));
                }
            }
        }
    }
}

/// 只识别指针文件 `<name>_<kind>.json`；运行文件 `<id>-<ts>.json` 被忽略
pub fn classify(path: &Path) -> Option<TriggerKind> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    TriggerKind::from_trigger_id(stem)
}

/// 触发目录监听器
pub struct TriggerWatcher {
    // 持有以保持监听
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<PathBuf>,
    debounce: Duration,
}

impl TriggerWatcher {
    pub fn new(dir: &Path, debounce: Duration) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(ScenarioError::IoError)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
            }
            Err(e) => tracing::warn!("Trigger watch error: {}", e),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        tracing::info!("Watching triggers in {}", dir.display());
        Ok(Self {
            _watcher: watcher,
            rx,
            debounce,
        })
    }

    /// 等待下一批触发：收到第一个变化后，直到安静 `debounce` 为止的变化合并为一批
    pub async fn next_batch(&mut self) -> Option<TriggerBatch> {
        loop {
            let first = self.rx.recv().await?;
            let mut batch = TriggerBatch::default();
            batch.add(first);

            while let Ok(Some(path)) = tokio::time::timeout(self.debounce, self.rx.recv()).await {
                batch.add(path);
            }

            if !batch.is_empty() {
                return Some(batch);
            }
        }
    }
}

/// 处理触发批次的依赖
#[derive(Clone)]
pub struct TriggerDispatcher {
    pub scheduler: Scheduler,
    pub resolver: Arc<MetadataResolver>,
    pub runner: RunnerSection,
}

impl TriggerDispatcher {
    /// 同步触发先执行（之后重新加载集合），场景批次在后台调度
    pub async fn handle(&self, batch: TriggerBatch) {
        for (kind, path) in &batch.syncs {
            tracing::info!("Sync trigger {:?} from {}", kind, path.display());
            if let Err(e) = run_sync(&self.runner, *kind).await {
                tracing::error!("Sync {:?} failed: {}", kind, e);
            }
            self.resolver.reload();
        }

        if batch.scenarios.is_empty() {
            return;
        }

        let records = match Scheduler::load_batch(&batch.scenarios) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to load scenario triggers: {}", e);
                return;
            }
        };

        let scheduler = self.scheduler.clone();
        tokio::spawn(async move {
            match scheduler.run_batch(records).await {
                Ok(tickets) => {
                    for ticket in tickets {
                        ticket.wait().await;
                    }
                }
                Err(e) => tracing::error!("Scenario batch failed: {}", e),
            }
        });
    }

    pub async fn run(self, mut watcher: TriggerWatcher) {
        while let Some(batch) = watcher.next_batch().await {
            self.handle(batch).await;
        }
    }
}
