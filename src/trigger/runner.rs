use crate::config::RunnerSection;
use crate::error::{Result, ScenarioError};
use crate::trigger::model::{TriggerKind, TriggerRecord};
use crate::trigger::store::TriggerStore;
use crate::variable::{VariableContext, VariableResolver};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// 运行中控制台日志的最短持久化间隔
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// 单次运行的控制台记录
///
/// 每行带时间戳追加到运行记录的 `consoleLog`，运行期间至多每秒写回一次运行文件。
pub struct RunLog {
    record: Mutex<TriggerRecord>,
    store: Option<Arc<TriggerStore>>,
    last_flush: Mutex<Instant>,
}

impl RunLog {
    pub fn new(record: TriggerRecord, store: Option<Arc<TriggerStore>>) -> Self {
        Self {
            record: Mutex::new(record),
            store,
            last_flush: Mutex::new(Instant::now()),
        }
    }

    pub fn push(&self, line: impl AsRef<str>) {
        let stamped = format!("[{}] {}", Utc::now().format("%H:%M:%S%.3f"), line.as_ref());
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .console_log
            .push(stamped);

        let due = {
            let mut last = self.last_flush.lock().unwrap_or_else(PoisonError::into_inner);
            if last.elapsed() >= FLUSH_INTERVAL {
                *last = Instant::now();
                true
            } else {
                false
            }
        };
        if due {
            self.flush();
        }
    }

    /// 写回运行文件；失败只记录日志
    pub fn flush(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let record = self.snapshot();
        if let Err(e) = store.write_run(&record) {
            tracing::warn!("Failed to persist console log for {}: {}", record.run_id(), e);
        }
    }

    pub fn snapshot(&self) -> TriggerRecord {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.snapshot().console_log
    }

    pub fn into_record(self) -> TriggerRecord {
        self.record.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 外部测试运行器
#[async_trait]
pub trait ScenarioRunner: Send + Sync {
    /// 执行一次场景运行；非零退出返回 `ScenarioError::Runner`
    async fn run(&self, record: &TriggerRecord, log: &RunLog) -> Result<()>;
}

/// 以子进程方式执行配置的运行器程序
pub struct CommandRunner {
    config: RunnerSection,
    trigger_dir: PathBuf,
    reports_dir: PathBuf,
}

impl CommandRunner {
    pub fn new(config: RunnerSection, trigger_dir: impl Into<PathBuf>, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            trigger_dir: trigger_dir.into(),
            reports_dir: reports_dir.into(),
        }
    }

    /// 参数模板可用的变量
    ///
    /// scenario_folder_id, scenario_folder, source_collection, environment, iteration,
    /// trigger_id, trigger_file, report_html, report_xml, seed_folder_id,
    /// collection_path, environment_path
    pub fn context(&self, record: &TriggerRecord) -> Result<VariableContext> {
        let suffix = record.iteration_suffix();
        let xml_name = format!(
            "{}-{}-{}{}.xml",
            record
                .scenario_folder
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .replace('/', "."),
            record.scenario_folder_id,
            record.timestamp_millis(),
            suffix
        );

        let mut ctx = VariableContext::new();
        ctx.insert("scenario_folder_id", record.scenario_folder_id.as_str());
        ctx.insert("scenario_folder", record.scenario_folder.as_str());
        ctx.insert("source_collection", record.source_collection.as_str());
        ctx.insert("environment", record.environment.as_str());
        ctx.insert("iteration", record.iteration.unwrap_or(1).to_string());
        ctx.insert("trigger_id", record.trigger_id.as_str());
        ctx.insert("trigger_file", path_string(&self.trigger_dir.join(record.run_file_name())));
        ctx.insert(
            "report_html",
            path_string(&self.reports_dir.join(format!("{}.html", record.report_stem()))),
        );
        ctx.insert("report_xml", path_string(&self.reports_dir.join(xml_name)));
        ctx.insert(
            "seed_folder_id",
            record.scenario_seed_folder_id.clone().unwrap_or_default(),
        );

        // collection_path / environment_path 本身也是模板
        let collection_path = VariableResolver::resolve(&self.config.collection_path, &ctx)?;
        let environment_path = VariableResolver::resolve(&self.config.environment_path, &ctx)?;
        ctx.insert("collection_path", collection_path);
        ctx.insert("environment_path", environment_path);
        Ok(ctx)
    }

    pub fn command(&self, record: &TriggerRecord) -> Result<Command> {
        let ctx = self.context(record)?;
        let args = self
            .config
            .args
            .iter()
            .map(|arg| VariableResolver::resolve(arg, &ctx))
            .collect::<Result<Vec<_>>>()?;

        let mut command = Command::new(&self.config.program);
        command
            .args(args)
            .envs(
                record
                    .scenario_modes()
                    .map(|(name, value)| (scenario_mode_env(name), value)),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        Ok(command)
    }
}

#[async_trait]
impl ScenarioRunner for CommandRunner {
    async fn run(&self, record: &TriggerRecord, log: &RunLog) -> Result<()> {
        if let Err(e) = std::fs::create_dir_all(&self.reports_dir) {
            tracing::warn!("Cannot create reports dir {}: {}", self.reports_dir.display(), e);
        }

        let mut command = self.command(record)?;
        log.push(format!("$ {} ({})", self.config.program, record.run_id()));

        let mut child = command.spawn().map_err(|e| {
            ScenarioError::Runner(format!("failed to start {}: {}", self.config.program, e))
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        while let Some(line) = rx.recv().await {
            log.push(line);
        }

        let status = child.wait().await.map_err(ScenarioError::IoError)?;
        if status.success() {
            Ok(())
        } else {
            Err(ScenarioError::Runner(format!(
                "{} exited with {}",
                self.config.program, status
            )))
        }
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// `scenarioMode/fastLane` -> `SCENARIO_MODE_FASTLANE`
pub fn scenario_mode_env(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SCENARIO_MODE_{}", normalized)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// 执行 quickSync / syncCollections 的同步命令
///
/// 未配置同步程序时直接返回。
pub async fn run_sync(config: &RunnerSection, kind: TriggerKind) -> Result<()> {
    let Some(program) = &config.sync_program else {
        tracing::info!("No sync program configured, skipping {:?}", kind);
        return Ok(());
    };

    let args = match kind {
        TriggerKind::QuickSync => &config.quick_sync_args,
        _ => &config.sync_args,
    };

    tracing::info!("Running sync: {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ScenarioError::Runner(format!("failed to start {}: {}", program, e)))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        tracing::info!(target: "scenario_server::sync", "{}", line);
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        tracing::warn!(target: "scenario_server::sync", "{}", line);
    }

    if output.status.success() {
        Ok(())
    } else {
        Err(ScenarioError::Runner(format!("{} exited with {}", program, output.status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> TriggerRecord {
        serde_json::from_value(json!({
            "triggerId": "checkout_scenario",
            "scenarioFolder": "Root/Check out",
            "scenarioFolderId": "f-1",
            "sourceCollection": "developer",
            "environment": "DEV",
            "iteration": 2,
            "timestampStart": 1000,
            "scenarioMode/fast-lane": "on"
        }))
        .unwrap()
    }

    #[test]
    fn test_template_context() {
        let runner = CommandRunner::new(RunnerSection::default(), "triggers", "reports");
        let ctx = runner.context(&record()).unwrap();

        assert_eq!(ctx.get("iteration"), Some("2"));
        assert_eq!(
            ctx.get("collection_path"),
            Some("collection/developer/e2e.postman_collection.json")
        );
        assert_eq!(
            ctx.get("environment_path"),
            Some("environment/DEV.postman_environment.json")
        );
        assert!(ctx.get("report_html").unwrap().ends_with("f-1-2.html"));
        assert!(ctx.get("report_xml").unwrap().ends_with("Root.Checkout-f-1-1000-2.xml"));
        assert!(ctx.get("trigger_file").unwrap().ends_with("checkout_scenario-1000-2.json"));
    }

    #[test]
    fn test_unknown_template_variable_is_rejected() {
        let config = RunnerSection {
            args: vec!["{{nope}}".to_string()],
            ..RunnerSection::default()
        };
        let runner = CommandRunner::new(config, "triggers", "reports");
        assert!(matches!(
            runner.command(&record()),
            Err(ScenarioError::Configuration(_))
        ));
    }

    #[test]
    fn test_scenario_mode_env() {
        assert_eq!(scenario_mode_env("fast-lane"), "SCENARIO_MODE_FAST_LANE");
    }

    #[test]
    fn test_run_log_lines_are_stamped() {
        let log = RunLog::new(record(), None);
        log.push("hello");
        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] hello"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_runner_streams_output() {
        let config = RunnerSection {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo run {{scenario_folder_id}}".to_string()],
            ..RunnerSection::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let runner = CommandRunner::new(config, dir.path(), dir.path().join("reports"));
        let log = RunLog::new(record(), None);

        runner.run(&record(), &log).await.unwrap();
        assert!(log.lines().iter().any(|line| line.ends_with("run f-1")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_runner_non_zero_exit() {
        let config = RunnerSection {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
            ..RunnerSection::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let runner = CommandRunner::new(config, dir.path(), dir.path());
        let err = runner.run(&record(), &RunLog::new(record(), None)).await.unwrap_err();
        assert!(matches!(err, ScenarioError::Runner(_)));
    }
}
