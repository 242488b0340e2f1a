/// Server 模块 - HTTP 接口
pub mod response;
pub mod routes;
pub mod state;

pub use state::{AppState, SharedState};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::trigger::{CommandRunner, Scheduler, TriggerDispatcher, TriggerWatcher};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;

/// 触发请求体上限
pub const BODY_LIMIT: usize = 50 * 1024 * 1024;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::status))
        .route("/workflowStep", get(routes::workflow_step_root))
        .route("/workflowStep/", get(routes::workflow_step_root))
        .route("/workflowStep/{*path}", get(routes::workflow_step))
        .route("/trigger", post(routes::trigger_root))
        .route("/trigger/", post(routes::trigger_root))
        .route("/trigger/{*id}", post(routes::create_trigger))
        .route("/report", get(routes::report_root))
        .route("/report/", get(routes::report_root))
        .route("/report/{*id}", get(routes::report))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// 启动服务；`watch` 为 true 时同时监听触发目录
pub async fn serve(config: ServerConfig, watch: bool) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config)?);

    if watch && config.triggers.watch {
        let runner = CommandRunner::new(
            config.runner.clone(),
            &config.triggers.dir,
            &config.triggers.reports_dir,
        );
        let dispatcher = TriggerDispatcher {
            scheduler: Scheduler::new(state.store.clone(), Arc::new(runner)),
            resolver: state.resolver.clone(),
            runner: config.runner.clone(),
        };
        let watcher = TriggerWatcher::new(
            &config.triggers.dir,
            Duration::from_millis(config.triggers.debounce_ms),
        )?;
        tokio::spawn(dispatcher.run(watcher));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "scenario-server {} listening on {} ({})",
        state.server_id,
        addr,
        config.server.public_url()
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
