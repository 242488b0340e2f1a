use crate::error::{Result, ScenarioError};
use crate::trigger::memory;
use crate::trigger::model::TriggerRecord;
use crate::trigger::runner::{RunLog, ScenarioRunner};
use crate::trigger::store::TriggerStore;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// 已调度运行的句柄
pub enum RunTicket {
    /// 调度时已等待完成
    Waited { run_id: String, success: bool },
    /// 后台任务
    Detached {
        run_id: String,
        handle: JoinHandle<bool>,
    },
}

impl RunTicket {
    pub fn run_id(&self) -> &str {
        match self {
            RunTicket::Waited { run_id, .. } | RunTicket::Detached { run_id, .. } => run_id,
        }
    }

    /// 等待运行结束，返回是否成功
    pub async fn wait(self) -> bool {
        match self {
            RunTicket::Waited { success, .. } => success,
            RunTicket::Detached { run_id, handle } => match handle.await {
                Ok(success) => success,
                Err(e) => {
                    tracing::error!("Run {} task failed: {}", run_id, e);
                    false
                }
            },
        }
    }
}

/// 展开迭代：第 n 份（1..=N）带 `iteration = n`，n > 1 时报告链接加 `-n` 后缀
///
/// 只有最后一份保留调用方的 `wait`。
pub fn expand(record: &TriggerRecord) -> Vec<TriggerRecord> {
    let iterations = record.iterations.max(1);

    (1..=iterations)
        .map(|n| {
            let mut copy = record.clone();
            copy.iteration = Some(n);
            copy.triggered_test_report =
                format!("{}{}", record.triggered_test_report, copy.iteration_suffix());
            if n < iterations {
                copy.wait = false;
            }
            copy
        })
        .collect()
}

/// 场景调度器
///
/// 同一批次内的运行先全部落盘，再按 `"<timestampStart>-<iteration>"`
/// 的字符串顺序依次派发：`wait` 的运行等待完成，其余在后台并发执行。
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<TriggerStore>,
    runner: Arc<dyn ScenarioRunner>,
}

impl Scheduler {
    pub fn new(store: Arc<TriggerStore>, runner: Arc<dyn ScenarioRunner>) -> Self {
        Self { store, runner }
    }

    pub fn store(&self) -> &TriggerStore {
        &self.store
    }

    /// 读取触发文件；缺少 scenarioFolderId 的文件被跳过
    pub fn load_batch<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<TriggerRecord>> {
        let mut records = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let record: TriggerRecord = TriggerStore::read_json(path)?;
            if record.scenario_folder_id.is_empty() {
                tracing::warn!("{} has no scenarioFolderId, skipped", path.display());
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }

    /// 展开、落盘并排序
    pub fn prepare(&self, records: Vec<TriggerRecord>) -> Result<Vec<TriggerRecord>> {
        let mut batch = Vec::new();
        for record in &records {
            for copy in expand(record) {
                self.store.write_run(&copy)?;
                batch.push(copy);
            }
        }

        batch.sort_by_key(|record| record.sort_key());
        Ok(batch)
    }

    /// 按顺序派发一个已准备好的批次
    pub async fn dispatch(&self, batch: Vec<TriggerRecord>) -> Vec<RunTicket> {
        let mut tickets = Vec::with_capacity(batch.len());

        for record in batch {
            let run_id = record.run_id();
            if record.wait {
                tracing::info!("Scenario running synchronously: {}", run_id);
                let success = execute(self.store.clone(), self.runner.clone(), record).await;
                tickets.push(RunTicket::Waited { run_id, success });
            } else {
                tracing::info!("Scenario running async: {}", run_id);
                let handle = tokio::spawn(execute(self.store.clone(), self.runner.clone(), record));
                tickets.push(RunTicket::Detached { run_id, handle });
            }
        }

        tickets
    }

    pub async fn run_batch(&self, records: Vec<TriggerRecord>) -> Result<Vec<RunTicket>> {
        if records.is_empty() {
            return Err(ScenarioError::Validation("No scenarios found to run".to_string()));
        }
        let batch = self.prepare(records)?;
        Ok(self.dispatch(batch).await)
    }
}

/// 执行单次运行并写入完成字段
async fn execute(store: Arc<TriggerStore>, runner: Arc<dyn ScenarioRunner>, record: TriggerRecord) -> bool {
    let run_id = record.run_id();
    let log = RunLog::new(record.clone(), Some(store.clone()));

    let outcome = runner.run(&record, &log).await;
    if let Err(e) = &outcome {
        tracing::error!("Scenario {} failed: {}", run_id, e);
        log.push(format!("Run failed: {}", e));
    }
    let success = outcome.is_ok();

    let mut completed = log.into_record();
    complete(&mut completed, success);
    if let Err(e) = store.write_run(&completed) {
        tracing::error!("Failed to persist completion of {}: {}", run_id, e);
    }

    tracing::info!(
        "Scenario complete: {} ({}s, success={})",
        run_id,
        completed.duration_seconds.unwrap_or_default(),
        success
    );
    success
}

/// 写入完成字段：timestampStop, durationSeconds, success, mem
pub fn complete(record: &mut TriggerRecord, success: bool) {
    let now = Utc::now();
    record.timestamp_stop = Some(now);
    record.duration_seconds = Some(record.elapsed_seconds(now));
    record.success = Some(success);
    record.mem = Some(memory::snapshot());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn record(trigger_id: &str, ts: i64, iterations: u32, wait: bool) -> TriggerRecord {
        serde_json::from_value(json!({
            "triggerId": trigger_id,
            "scenarioFolder": "Root/A",
            "scenarioFolderId": "a",
            "iterations": iterations,
            "wait": wait,
            "timestampStart": ts,
            "triggeredTestReport": format!("http://localhost:3000/report/{}-{}", trigger_id, ts)
        }))
        .unwrap()
    }

    /// 记录调用顺序的运行器
    struct Recording {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ScenarioRunner for Recording {
        async fn run(&self, record: &TriggerRecord, log: &RunLog) -> Result<()> {
            self.calls.lock().unwrap().push(record.run_id());
            log.push("running");
            if self.fail {
                Err(ScenarioError::Runner("exit 1".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn scheduler(dir: &Path, fail: bool) -> (Scheduler, Arc<Recording>) {
        let runner = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
            fail,
        });
        let scheduler = Scheduler::new(Arc::new(TriggerStore::new(dir)), runner.clone());
        (scheduler, runner)
    }

    #[test]
    fn test_expand_keeps_wait_on_last_copy() {
        let copies = expand(&record("a_scenario", 1000, 3, true));
        assert_eq!(copies.len(), 3);
        assert_eq!(
            copies.iter().map(|c| c.wait).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(copies[0].triggered_test_report, "http://localhost:3000/report/a_scenario-1000");
        assert_eq!(copies[2].triggered_test_report, "http://localhost:3000/report/a_scenario-1000-3");
    }

    #[test]
    fn test_prepare_persists_every_copy() {
        let dir = tempdir().unwrap();
        let (scheduler, _) = scheduler(dir.path(), false);

        scheduler.prepare(vec![record("a_scenario", 1000, 3, true)]).unwrap();
        for name in ["a_scenario-1000", "a_scenario-1000-2", "a_scenario-1000-3"] {
            assert!(dir.path().join(format!("{}.json", name)).exists(), "{}", name);
        }

        let third: serde_json::Value = scheduler.store().read("a_scenario-1000-3").unwrap();
        assert_eq!(third["wait"], json!(true));
        let second: serde_json::Value = scheduler.store().read("a_scenario-1000-2").unwrap();
        assert!(second.get("wait").is_none());
    }

    #[test]
    fn test_prepare_sorts_by_string_key() {
        let dir = tempdir().unwrap();
        let (scheduler, _) = scheduler(dir.path(), false);

        let batch = scheduler
            .prepare(vec![record("late_scenario", 2000, 1, false), record("early_scenario", 1000, 1, false)])
            .unwrap();
        assert_eq!(batch[0].trigger_id, "early_scenario");
        assert_eq!(batch[1].trigger_id, "late_scenario");
    }

    #[tokio::test]
    async fn test_waited_runs_dispatch_in_order() {
        let dir = tempdir().unwrap();
        let (scheduler, runner) = scheduler(dir.path(), false);

        let tickets = scheduler
            .run_batch(vec![record("b_scenario", 2000, 1, true), record("a_scenario", 1000, 1, true)])
            .await
            .unwrap();
        for ticket in tickets {
            assert!(ticket.wait().await);
        }

        assert_eq!(
            *runner.calls.lock().unwrap(),
            vec!["a_scenario-1000".to_string(), "b_scenario-2000".to_string()]
        );

        let done: TriggerRecord = scheduler.store().read("a_scenario-1000").unwrap();
        assert!(done.is_complete());
        assert_eq!(done.success, Some(true));
        assert!(done.mem.is_some());
        assert!(done.console_log.iter().any(|line| line.ends_with("running")));
    }

    #[tokio::test]
    async fn test_failed_run_is_recorded() {
        let dir = tempdir().unwrap();
        let (scheduler, _) = scheduler(dir.path(), true);

        let tickets = scheduler
            .run_batch(vec![record("a_scenario", 1000, 1, false)])
            .await
            .unwrap();
        assert!(matches!(tickets[0], RunTicket::Detached { .. }));
        for ticket in tickets {
            assert!(!ticket.wait().await);
        }

        let done: TriggerRecord = scheduler.store().read("a_scenario-1000").unwrap();
        assert_eq!(done.success, Some(false));
        assert!(done.timestamp_stop.is_some());
        assert!(done.console_log.iter().any(|line| line.contains("Run failed")));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let dir = tempdir().unwrap();
        let (scheduler, _) = scheduler(dir.path(), false);
        assert!(scheduler.run_batch(Vec::new()).await.is_err());
    }
}
