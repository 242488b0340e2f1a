use crate::collection::{MetadataCache, MetadataResolver};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::mock::MockBuilder;
use crate::trigger::{ReportRenderer, TriggerStore};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// 请求处理共享的服务状态
pub struct AppState {
    pub server_id: String,
    pub started: Instant,
    public_url: Url,
    pub resolver: Arc<MetadataResolver>,
    pub builder: MockBuilder,
    pub store: Arc<TriggerStore>,
    pub reports: ReportRenderer,
    pub max_iterations: u32,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let resolver = MetadataResolver::new(config.collections.clone(), Arc::new(MetadataCache::new()));
        Self::new(config, Arc::new(resolver))
    }

    pub fn new(config: &ServerConfig, resolver: Arc<MetadataResolver>) -> Result<Self> {
        let store = Arc::new(TriggerStore::new(&config.triggers.dir));
        let public_url = Url::parse(&config.server.public_url())?;

        Ok(Self {
            server_id: uuid::Uuid::new_v4().to_string(),
            started: Instant::now(),
            public_url,
            resolver,
            builder: MockBuilder::new(config.mock.default_locale.clone()),
            reports: ReportRenderer::new(store.clone(), &config.triggers.reports_dir),
            store,
            max_iterations: config.triggers.max_iterations,
        })
    }

    /// `<publicUrl>/report/<runId>`
    pub fn report_url(&self, run_id: &str) -> String {
        format!("{}/report/{}", self.public_url.as_str().trim_end_matches('/'), run_id)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs_f64().round() as u64
    }
}
