use serde::Deserialize;
use std::path::PathBuf;

/// 完整的服务配置文件（scenario-server.toml）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub collections: CollectionPaths,
    pub triggers: TriggerSection,
    pub runner: RunnerSection,
    pub mock: MockSection,
}

/// HTTP 监听配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,

    /// 对外可访问的地址，用于生成 triggeredTestReport 链接
    pub public_url: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_url: None,
        }
    }
}

impl ServerSection {
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }
}

/// 集合文件路径
///
/// primary 对应 "main" 集合，working 对应 "developer" 集合，
/// 每个集合都配有一个存放 schema 变量的服务集合。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionPaths {
    pub primary: PathBuf,
    pub primary_schemas: PathBuf,
    pub working: PathBuf,
    pub working_schemas: PathBuf,
}

impl Default for CollectionPaths {
    fn default() -> Self {
        Self {
            primary: PathBuf::from("collection/main/e2e.postman_collection.json"),
            primary_schemas: PathBuf::from("collection/main/e2e-services.postman_collection.json"),
            working: PathBuf::from("collection/developer/e2e.postman_collection.json"),
            working_schemas: PathBuf::from(
                "collection/developer/e2e-services.postman_collection.json",
            ),
        }
    }
}

/// 触发文件与报告目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerSection {
    pub dir: PathBuf,
    pub reports_dir: PathBuf,
    pub watch: bool,
    pub debounce_ms: u64,

    /// 单个场景触发允许的最大迭代次数
    pub max_iterations: u32,
}

impl Default for TriggerSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("triggers"),
            reports_dir: PathBuf::from("reports"),
            watch: true,
            debounce_ms: 500,
            max_iterations: 100,
        }
    }
}

/// 外部测试运行器配置
///
/// 参数支持 `{{variable}}` 模板，可用变量见 `trigger::runner`。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    pub program: String,
    pub args: Vec<String>,
    pub collection_path: String,
    pub environment_path: String,

    /// quickSync / syncCollections 触发时执行的同步命令（可选）
    pub sync_program: Option<String>,
    pub sync_args: Vec<String>,
    pub quick_sync_args: Vec<String>,
}

impl Default for RunnerSection {
    fn default() -> Self {
        let args = [
            "run",
            "{{collection_path}}",
            "--folder",
            "{{scenario_folder_id}}",
            "--environment",
            "{{environment_path}}",
            "--reporters",
            "cli,htmlextra,junit",
            "--reporter-htmlextra-export",
            "{{report_html}}",
            "--reporter-junit-export",
            "{{report_xml}}",
        ];

        Self {
            program: "newman".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            collection_path: "collection/{{source_collection}}/e2e.postman_collection.json"
                .to_string(),
            environment_path: "environment/{{environment}}.postman_environment.json".to_string(),
            sync_program: None,
            sync_args: Vec::new(),
            quick_sync_args: vec!["--downloadonly".to_string()],
        }
    }
}

/// Mock 生成配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockSection {
    pub default_locale: String,
}

impl Default for MockSection {
    fn default() -> Self {
        Self {
            default_locale: "de".to_string(),
        }
    }
}
