use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("校验错误: {0}")]
    Validation(String),

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("Mock 构建失败: {0}")]
    Builder(String),

    #[error("运行器错误: {0}")]
    Runner(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML 解析错误: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("文件监听错误: {0}")]
    WatchError(#[from] notify::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl ScenarioError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ScenarioError::Validation(_) => 400,
            ScenarioError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

// Add conversion from anyhow::Error
impl From<anyhow::Error> for ScenarioError {
    fn from(err: anyhow::Error) -> Self {
        ScenarioError::Other(err.to_string())
    }
}

/// Result type for scenario-server crate
pub type Result<T> = std::result::Result<T, ScenarioError>;
