use crate::error::{Result, ScenarioError};
use crate::trigger::model::TriggerRecord;
use crate::trigger::store::TriggerStore;
use chrono::Utc;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 进度页自动刷新间隔（秒）
const REFRESH_SECONDS: u32 = 10;

/// 报告内容
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// 直接返回的 HTML
    Html(String),
    /// 运行器生成的 HTML 报告文件
    File(PathBuf),
}

/// 运行报告
pub struct ReportRenderer {
    store: Arc<TriggerStore>,
    reports_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(store: Arc<TriggerStore>, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// 生成 `<id>` 的报告
    ///
    /// - 未完成：自动刷新的进度页
    /// - 已完成且 `log`：控制台日志页
    /// - 已完成：运行器的 HTML 报告
    pub fn render(&self, id: &str, log: bool) -> Result<Report> {
        let mut record: TriggerRecord = self.store.read(id)?;
        let stem = record.report_stem();

        if !record.is_complete() {
            record.duration_seconds = Some(record.elapsed_seconds(Utc::now()));
            let html = progress_page(&record)?;
            self.write_artifact(&format!("{}-prelim.html", stem), &html);
            return Ok(Report::Html(html));
        }

        if log {
            let html = log_page(&record);
            self.write_artifact(&format!("{}-log.html", stem), &html);
            return Ok(Report::Html(html));
        }

        let path = self.reports_dir.join(format!("{}.html", stem));
        if !path.exists() {
            return Err(ScenarioError::NotFound(format!("report {}", path.display())));
        }
        Ok(Report::File(path))
    }

    /// 旁路写入报告目录；失败只记录日志
    fn write_artifact(&self, name: &str, html: &str) {
        let path = self.reports_dir.join(name);
        let result = std::fs::create_dir_all(&self.reports_dir).and_then(|_| std::fs::write(&path, html));
        if let Err(e) = result {
            tracing::warn!("Failed to write {}: {}", path.display(), e);
        }
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn progress_page(record: &TriggerRecord) -> Result<String> {
    let body = serde_json::to_string_pretty(record)?;
    let html = [
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        "<title>Preliminary Report</title>".to_string(),
        format!("<meta http-equiv=\"refresh\" content=\"{}\">", REFRESH_SECONDS),
        "</head>".to_string(),
        "<body>".to_string(),
        format!("<h2>Running {}</h2>", escape_html(&record.scenario_folder)),
        format!("<pre>{}</pre>", escape_html(&body)),
        "<div>".to_string(),
        "<p><strong>*** TEST IN PROGRESS ***</strong></p>".to_string(),
        format!(
            "<p>This page will auto-refresh every {} seconds until test is complete</p>",
            REFRESH_SECONDS
        ),
        "</div>".to_string(),
        "</body>".to_string(),
        "</html>".to_string(),
    ];
    Ok(html.join("\n"))
}

fn log_page(record: &TriggerRecord) -> String {
    let console = record.console_log.join("\r\n");
    [
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        "<title>Run Console Log</title>".to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        format!("<h2>{}</h2>", escape_html(&record.scenario_folder)),
        format!("<pre>{}</pre>", escape_html(&console)),
        "</body>".to_string(),
        "</html>".to_string(),
    ]
    .join("\n")
}

/// 打印批次运行摘要
pub fn print_summary(results: &[(String, bool)]) {
    let passed = results.iter().filter(|(_, ok)| *ok).count();
    let failed = results.len() - passed;

    println!("\n{}", "━".repeat(50));
    println!("{}", "Summary".bold());
    println!("{}", "━".repeat(50));

    for (run_id, ok) in results {
        let symbol = if *ok { "✓".green() } else { "✗".red() };
        println!(" {} {}", symbol, run_id);
    }

    if failed == 0 {
        println!(
            "  {}: {} passed, {} total",
            "Runs".bold(),
            passed.to_string().green(),
            results.len()
        );
    } else {
        println!(
            "  {}: {} passed, {} failed, {} total",
            "Runs".bold(),
            passed.to_string().green(),
            failed.to_string().red(),
            results.len()
        );
    }
    println!();
}
