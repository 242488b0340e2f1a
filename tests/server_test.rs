use scenario_server::config::ServerConfig;
use scenario_server::server::{AppState, router};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

/// 工作集合：Scenarios/Users 下两个工作步骤
fn working_collection() -> Value {
    json!({
        "item": [{
            "id": "root",
            "name": "Scenarios",
            "item": [{
                "id": "users-folder",
                "name": "Users",
                "item": [{
                    "id": "abc",
                    "name": "create",
                    "request": { "method": "{{M}}" }
                }, {
                    "id": "def",
                    "name": "create from mock",
                    "request": {
                        "method": "{{M}}",
                        "url": { "query": [{ "key": "_objectMock", "value": "{{missingMock}}" }] }
                    }
                }, {
                    "id": "ghi",
                    "name": "create small",
                    "request": {
                        "method": "{{M}}",
                        "url": { "query": [{ "key": "_objectMock", "value": "{{small}}" }] }
                    },
                    "response": [{ "name": "small", "body": "{\"name\":\"Small\",\"age\":1}" }]
                }]
            }, {
                "id": "orders-folder",
                "name": "Orders",
                "item": []
            }]
        }]
    })
}

fn service_collection() -> Value {
    let schema = json!({
        "request": {
            "type": "object",
            "properties": {
                "name": { "type": "string", "default": "Ann", "maxLength": 5 },
                "age": { "type": "integer" },
                "active": { "type": "boolean", "default": false },
                "billingAddress": {
                    "type": "object",
                    "properties": {
                        "firstName": { "type": "string", "default": "Bea" },
                        "city": { "type": "string", "default": "Berlin" }
                    }
                }
            }
        }
    });
    json!({ "variable": [{ "key": "users/post/users", "value": schema.to_string() }] })
}

struct TestServer {
    base: String,
    _dir: TempDir,
    dir: std::path::PathBuf,
}

async fn start_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();

    fs::write(root.join("dev.json"), working_collection().to_string()).unwrap();
    fs::write(root.join("dev-services.json"), service_collection().to_string()).unwrap();

    let mut config = ServerConfig::default();
    config.collections.primary = root.join("main.json");
    config.collections.primary_schemas = root.join("main-services.json");
    config.collections.working = root.join("dev.json");
    config.collections.working_schemas = root.join("dev-services.json");
    config.triggers.dir = root.join("triggers");
    config.triggers.reports_dir = root.join("reports");
    config.server.public_url = Some("http://ci.local:3000".to_string());

    let state = Arc::new(AppState::from_config(&config).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        _dir: dir,
        dir: root,
    }
}

fn workstep_query(id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("_workstep_id", id.to_string()),
        ("_workstep_name", "create".to_string()),
        ("_workstep_endpoint", "users/post".to_string()),
        ("_workstep_service", "users".to_string()),
        ("_expectCode", "201".to_string()),
    ]
}

#[tokio::test]
async fn test_workflow_step_default_payload() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&workstep_query("abc"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "name": "Ann",
            "age": 0,
            "active": false,
            "billingAddress": { "firstName": "Bea", "city": "Berlin" }
        })
    );
}

#[tokio::test]
async fn test_workflow_step_overrides() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let mut query = workstep_query("abc");
    query.push(("_billingAddress.firstName_mock", "Cleo".to_string()));
    query.push(("_name_mock", "abcdefgh".to_string()));
    query.push(("_age_mock", "42years".to_string()));
    query.push(("_active_mock", "TRUE".to_string()));
    query.push(("_billingAddress.city_mock", "null".to_string()));

    let body: Value = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&query)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["billingAddress"], json!({ "firstName": "Cleo" }));
    assert_eq!(body["name"], json!("abcd"));
    assert_eq!(body["age"], json!(42));
    assert_eq!(body["active"], json!(true));
}

#[tokio::test]
async fn test_workflow_step_is_idempotent() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let mut query = workstep_query("abc");
    query.push(("_name_mock", "Dora".to_string()));

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let body: Value = client
            .get(format!("{}/workflowStep/x", server.base))
            .query(&query)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        bodies.push(body);
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn test_workflow_step_object_mocks() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let unresolved: Value = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&workstep_query("def"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unresolved, json!({ "_unresolvedObjectmock": "missingMock" }));

    // 元数据按 endpoint 缓存：先用 prep 调用刷新 ghi 的元数据
    let mut prep = workstep_query("ghi");
    prep.push(("postman_request_id", "session-1".to_string()));
    let status: Value = client
        .get(format!("{}/", server.base))
        .query(&prep)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        status["globals"][0],
        json!({ "key": "workstep_id", "value": "ghi" })
    );

    let example: Value = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&workstep_query("ghi"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(example, json!({ "name": "Small", "age": 1 }));
}

#[tokio::test]
async fn test_workflow_step_without_request_body() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let mut query = workstep_query("abc");
    query.push(("_workstep_body", "users/post/response".to_string()));

    let response = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&query)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({}));
}

#[tokio::test]
async fn test_workflow_step_validation_errors() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    // 缺少 _expectCode
    let mut query = workstep_query("abc");
    query.pop();
    let response = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&query)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("_expectCode"));

    // 空的 _workstep_id
    let response = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&workstep_query(""))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // 空路径
    let response = client
        .get(format!("{}/workflowStep", server.base))
        .query(&workstep_query("abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_workflow_step_unknown_workstep_is_404() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/workflowStep/x", server.base))
        .query(&workstep_query("nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_status_lists_scenario_folders() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/", server.base))
        .query(&[("postman_request_id", "unknown-session")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(body["serverId"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["uptimeSeconds"].is_u64());
    assert!(body["memory"].is_object());
    assert_eq!(
        body["globals"],
        json!([
            { "key": "Scenarios/Users", "value": "users-folder" },
            { "key": "Scenarios/Orders", "value": "orders-folder" }
        ])
    );
}

#[tokio::test]
async fn test_scenario_trigger_and_progress_report() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/trigger/users_scenario", server.base))
        .json(&json!({
            "scenarioFolder": "Scenarios/Users",
            "scenarioSeedFolder": "Scenarios/Missing",
            "sourceCollection": "developer",
            "environment": "DEV",
            "timestampStart": 1700000000000i64,
            "scenarioMode/fast": "on"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let record: Value = response.json().await.unwrap();
    assert_eq!(record["scenarioFolderId"], json!("users-folder"));
    assert_eq!(record["triggerId"], json!("users_scenario"));
    assert_eq!(
        record["triggeredTestReport"],
        json!("http://ci.local:3000/report/users_scenario-1700000000000")
    );
    assert!(record.get("scenarioSeedFolder").is_none());
    assert_eq!(record["scenarioMode/fast"], json!("on"));

    let triggers = server.dir.join("triggers");
    assert!(triggers.join("users_scenario.json").exists());
    assert!(triggers.join("users_scenario-1700000000000.json").exists());

    let response = client
        .get(format!("{}/report/users_scenario-1700000000000", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("http-equiv=\"refresh\""));
    assert!(html.contains("TEST IN PROGRESS"));
    assert!(server.dir.join("reports").join("users-folder-prelim.html").exists());
}

#[tokio::test]
async fn test_completed_report_log_and_artifact() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let record = json!({
        "triggerId": "done_scenario",
        "scenarioFolder": "Scenarios/Users",
        "scenarioFolderId": "users-folder",
        "timestampStart": 1700000000000i64,
        "timestampStop": 1700000005000i64,
        "success": true,
        "consoleLog": ["[10:00:00.000] newman <started>"]
    });
    let triggers = server.dir.join("triggers");
    fs::create_dir_all(&triggers).unwrap();
    fs::write(triggers.join("done_scenario-1700000000000.json"), record.to_string()).unwrap();

    let html = client
        .get(format!("{}/report/done_scenario-1700000000000?log", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("newman &lt;started&gt;"));

    // 运行器报告尚未生成
    let response = client
        .get(format!("{}/report/done_scenario-1700000000000", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let reports = server.dir.join("reports");
    fs::create_dir_all(&reports).unwrap();
    fs::write(reports.join("users-folder.html"), "<html>newman report</html>").unwrap();
    let html = client
        .get(format!("{}/report/done_scenario-1700000000000", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(html, "<html>newman report</html>");
}

#[tokio::test]
async fn test_trigger_errors() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let unknown_kind = client
        .post(format!("{}/trigger/users_other", server.base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_kind.status(), 400);

    let unknown_folder = client
        .post(format!("{}/trigger/users_scenario", server.base))
        .json(&json!({ "scenarioFolder": "Scenarios/Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_folder.status(), 404);

    let missing_folder = client
        .post(format!("{}/trigger/users_scenario", server.base))
        .json(&json!({ "environment": "DEV" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_folder.status(), 400);

    let empty_id = client
        .post(format!("{}/trigger", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(empty_id.status(), 400);

    let missing_report = client
        .get(format!("{}/report/none-1", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_report.status(), 404);

    for path in ["report", "report/"] {
        let response = client
            .get(format!("{}/{}", server.base, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "GET /{}", path);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("report id"));
    }

    let too_many = client
        .post(format!("{}/trigger/users_scenario", server.base))
        .json(&json!({ "scenarioFolder": "Scenarios/Users", "iterations": 4000000000u64 }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status(), 400);
    assert!(!server.dir.join("triggers").join("users_scenario.json").exists());
}

#[tokio::test]
async fn test_sync_trigger_writes_pointer_only() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/trigger/nightly_quickSync", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "triggerId": "nightly_quickSync" }));

    let entries: Vec<_> = fs::read_dir(server.dir.join("triggers"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["nightly_quickSync.json".to_string()]);
}
