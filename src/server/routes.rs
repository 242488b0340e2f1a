use crate::collection::MetaGlobals;
use crate::error::{Result, ScenarioError};
use crate::mock::wants_mock;
use crate::params::{SESSION_REQUEST_ID, WORKSTEP_ID, WORKSTEP_NAME, WorkstepParams};
use crate::server::state::SharedState;
use crate::trigger::{Report, TriggerKind, TriggerRecord, memory};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde_json::{Value, json};

/// 工作步骤调用还需要的期望状态码参数
pub const EXPECT_CODE: &str = "_expectCode";

type QueryPairs = Query<Vec<(String, String)>>;

/// GET / - 服务状态
///
/// 带 `postman_request_id` 时同时解析元数据：工作步骤参数齐全时刷新该 endpoint 的缓存，
/// 否则返回场景目录列表。
pub async fn status(State(state): State<SharedState>, Query(query): QueryPairs) -> Result<Json<Value>> {
    let params = WorkstepParams::from_pairs(query);

    let globals = match params.get_non_empty(SESSION_REQUEST_ID) {
        Some(session_id) => state
            .resolver
            .resolve(Some(session_id), &params)
            .map_err(not_found)?,
        None => MetaGlobals::new(),
    };

    Ok(Json(json!({
        "serverId": state.server_id,
        "uptimeSeconds": state.uptime_seconds(),
        "memory": memory::snapshot(),
        "globals": globals,
    })))
}

/// GET /workflowStep 与 /workflowStep/ - 没有路径
pub async fn workflow_step_root() -> Result<Json<Value>> {
    Err(ScenarioError::Validation("workflowStep path is empty".to_string()))
}

/// GET /workflowStep/<path> - 准备工作步骤的请求体
pub async fn workflow_step(
    State(state): State<SharedState>,
    Path(path): Path<String>,
    Query(query): QueryPairs,
) -> Result<Json<Value>> {
    if path.trim_matches('/').is_empty() {
        return workflow_step_root().await;
    }

    let params = WorkstepParams::from_pairs(query);
    let mut missing = params.missing_required();
    if !params.contains(EXPECT_CODE) {
        missing.push(EXPECT_CODE);
    }
    if !missing.is_empty() {
        return Err(ScenarioError::Validation(format!(
            "missing query parameters: {}",
            missing.join(", ")
        )));
    }
    if params.get_non_empty(WORKSTEP_ID).is_none() || params.get_non_empty(WORKSTEP_NAME).is_none() {
        return Err(ScenarioError::Validation(format!(
            "{} and {} must not be empty",
            WORKSTEP_ID, WORKSTEP_NAME
        )));
    }

    let globals = metadata(&state, &params)?;
    tracing::debug!("workflowStep /{} resolved {} globals", path, globals.len());

    if !wants_mock(&params) {
        return Ok(Json(json!({})));
    }
    Ok(Json(state.builder.build(&params, &globals)))
}

fn metadata(state: &SharedState, params: &WorkstepParams) -> Result<MetaGlobals> {
    let cached = state.resolver.cached(params);
    if !cached.is_empty() {
        return Ok(cached);
    }

    state
        .resolver
        .resolve(params.get_non_empty(SESSION_REQUEST_ID), params)
        .map_err(not_found)
}

/// 解析失败一律视为 404
fn not_found(err: ScenarioError) -> ScenarioError {
    match err {
        ScenarioError::NotFound(_) => err,
        other => ScenarioError::NotFound(other.to_string()),
    }
}

/// POST /trigger - 缺少触发 id
pub async fn trigger_root() -> Result<Json<Value>> {
    Err(ScenarioError::Validation("trigger id is empty".to_string()))
}

/// POST /trigger/<id> - 写入触发文件
pub async fn create_trigger(
    State(state): State<SharedState>,
    Path(trigger_id): Path<String>,
    Query(query): QueryPairs,
    body: Bytes,
) -> Result<Json<Value>> {
    validate_id(&trigger_id)?;
    let kind = TriggerKind::from_trigger_id(&trigger_id).ok_or_else(|| {
        ScenarioError::Validation(format!("unknown trigger kind for {}", trigger_id))
    })?;

    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ScenarioError::Validation(format!("invalid trigger body: {}", e)))?
    };

    if kind.is_sync() {
        state.store.write_pointer(&trigger_id, &body)?;
        tracing::info!("Trigger {} written", trigger_id);
        return Ok(Json(json!({ "triggerId": trigger_id })));
    }

    let mut record: TriggerRecord = serde_json::from_value(body)
        .map_err(|e| ScenarioError::Validation(format!("invalid scenario trigger: {}", e)))?;
    record.trigger_id = trigger_id.clone();

    if record.scenario_folder.is_empty() {
        return Err(ScenarioError::Validation("scenarioFolder is required".to_string()));
    }
    if record.iterations > state.max_iterations {
        return Err(ScenarioError::Validation(format!(
            "iterations {} exceeds the maximum of {}",
            record.iterations, state.max_iterations
        )));
    }

    let session_id = WorkstepParams::from_pairs(query)
        .get_non_empty(SESSION_REQUEST_ID)
        .map(str::to_string);
    let session_id = session_id.as_deref();

    record.scenario_folder_id = state
        .resolver
        .scenario_folder_id(session_id, &record.scenario_folder)?
        .ok_or_else(|| {
            ScenarioError::NotFound(format!("scenario folder {}", record.scenario_folder))
        })?;

    if let Some(seed) = record.scenario_seed_folder.clone().filter(|s| !s.is_empty()) {
        match state.resolver.scenario_folder_id(session_id, &seed)? {
            Some(id) => record.scenario_seed_folder_id = Some(id),
            None => {
                tracing::warn!("Seed folder {} not found, ignored", seed);
                record.scenario_seed_folder = None;
                record.scenario_seed_folder_id = None;
            }
        }
    }

    record.triggered_test_report = state.report_url(&record.run_id());

    state.store.write_run(&record)?;
    state.store.write_pointer(&trigger_id, &record)?;
    tracing::info!(
        "Scenario trigger {} for {} ({})",
        record.run_id(),
        record.scenario_folder,
        record.scenario_folder_id
    );

    Ok(Json(serde_json::to_value(&record)?))
}

/// 触发 id 只能是单个文件名
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(ScenarioError::Validation(format!("invalid trigger id: {:?}", id)));
    }
    Ok(())
}

/// GET /report 与 /report/ - 缺少运行 id
pub async fn report_root() -> Result<Html<String>> {
    Err(ScenarioError::Validation("report id is empty".to_string()))
}

/// GET /report/<id>[?log]
pub async fn report(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): QueryPairs,
) -> Result<Html<String>> {
    validate_id(&id)?;
    let log = query.iter().any(|(key, _)| key == "log");

    match state.reports.render(&id, log)? {
        Report::Html(html) => Ok(Html(html)),
        Report::File(path) => Ok(Html(tokio::fs::read_to_string(&path).await?)),
    }
}
