use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use regex::Regex;
use scenario_server::config::{ConfigLoader, ServerConfig};
use scenario_server::trigger::report::print_summary;
use scenario_server::trigger::{CommandRunner, Scheduler, TriggerStore, printer};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 配置文件路径（默认查找 scenario-server.toml）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 启动 HTTP 服务（默认）
    Serve {
        #[arg(long)]
        port: Option<u16>,

        /// 不监听触发目录
        #[arg(long)]
        no_watch: bool,
    },

    /// 批量运行触发文件：--scenario0=<file> --scenario1=<file> ...
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// 列出最近的运行记录
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<ServerConfig> {
        ConfigLoader::load(self.config.as_deref()).context("failed to load configuration")
    }
}

/// 解析 `--scenarioN=<file>`，按 N 排序
pub fn parse_scenario_args(args: &[String]) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(r"^--scenario(\d+)=(.+)$").expect("static scenario pattern");

    let mut scenarios = Vec::new();
    for arg in args {
        let Some(caps) = pattern.captures(arg) else {
            bail!("unexpected argument {}, expected --scenarioN=<file>", arg);
        };
        let index: usize = caps[1].parse().context("invalid scenario index")?;
        scenarios.push((index, PathBuf::from(&caps[2])));
    }

    if scenarios.is_empty() {
        bail!("no scenario files given, use --scenario0=<file>");
    }

    scenarios.sort_by_key(|(index, _)| *index);
    Ok(scenarios.into_iter().map(|(_, path)| path).collect())
}

pub async fn serve(mut config: ServerConfig, port: Option<u16>, no_watch: bool) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    scenario_server::server::serve(config, !no_watch).await?;
    Ok(())
}

/// 运行一批场景并等待全部结束
pub async fn run(config: ServerConfig, args: Vec<String>) -> Result<()> {
    let paths = parse_scenario_args(&args)?;
    let records = Scheduler::load_batch(&paths)?;

    let store = Arc::new(TriggerStore::new(&config.triggers.dir));
    let runner = CommandRunner::new(
        config.runner.clone(),
        &config.triggers.dir,
        &config.triggers.reports_dir,
    );
    let scheduler = Scheduler::new(store, Arc::new(runner));

    let tickets = scheduler.run_batch(records).await?;
    let mut results = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let run_id = ticket.run_id().to_string();
        results.push((run_id, ticket.wait().await));
    }

    print_summary(&results);
    if results.iter().any(|(_, success)| !success) {
        bail!("{} of {} runs failed", results.iter().filter(|(_, s)| !s).count(), results.len());
    }
    Ok(())
}

pub fn runs(config: &ServerConfig, limit: usize) -> Result<()> {
    let store = TriggerStore::new(&config.triggers.dir);
    printer::list_runs(&store, limit)?;
    Ok(())
}
