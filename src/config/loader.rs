use crate::config::types::ServerConfig;
use crate::error::{Result, ScenarioError};
use crate::variable::VariableResolver;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "scenario-server.toml";

    const PORT_ENV: &'static str = "SCENARIO_SERVER_PORT";
    const TRIGGER_DIR_ENV: &'static str = "SCENARIO_SERVER_TRIGGER_DIR";

    /// 从指定路径加载配置文件
    ///
    /// 文件内容中的 `${VAR}` 会先替换为系统环境变量。
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ScenarioError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let content = VariableResolver::resolve_env_vars(&content);
        Ok(toml::from_str(&content)?)
    }

    /// 加载配置：显式路径优先，否则查找，找不到时使用默认值
    pub fn load(explicit: Option<&Path>) -> Result<ServerConfig> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => match Self::find_config_path() {
                Some(path) => {
                    info!("Loading config from {}", path.display());
                    Self::load_from_path(&path)?
                }
                None => {
                    debug!("No {} found, using defaults", Self::CONFIG_FILE);
                    ServerConfig::default()
                }
            },
        };

        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// 查找配置文件
    /// 查找顺序：
    /// 1. 当前目录及其父目录
    /// 2. 用户配置目录 ~/.config/scenario-server/
    pub fn find_config_path() -> Option<PathBuf> {
        Self::find_in_current_dir().or_else(Self::find_in_user_dir)
    }

    fn find_in_current_dir() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    fn find_in_user_dir() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let config_path = home
            .join(".config")
            .join("scenario-server")
            .join(Self::CONFIG_FILE);

        config_path.exists().then_some(config_path)
    }

    /// 环境变量覆盖（优先级最高）
    pub fn apply_env_overrides(config: &mut ServerConfig) {
        if let Ok(port) = std::env::var(Self::PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring invalid {}={}", Self::PORT_ENV, port),
            }
        }

        if let Ok(dir) = std::env::var(Self::TRIGGER_DIR_ENV)
            && !dir.trim().is_empty()
        {
            config.triggers.dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_path() {
        let config_content = r#"
[server]
port = 3100
public_url = "http://e2e.local:3100"

[collections]
primary = "c/main.json"
working = "c/dev.json"

[mock]
default_locale = "en"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = ConfigLoader::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3100);
        assert_eq!(config.server.public_url(), "http://e2e.local:3100");
        assert_eq!(config.collections.primary, PathBuf::from("c/main.json"));
        assert_eq!(config.mock.default_locale, "en");
    }

    #[test]
    fn test_load_resolves_env_vars() {
        unsafe {
            std::env::set_var("SCENARIO_LOADER_TEST_RUNNER", "/opt/bin/newman");
        }

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[runner]\nprogram = \"${SCENARIO_LOADER_TEST_RUNNER}\"\n")
            .unwrap();
        temp_file.flush().unwrap();

        let config = ConfigLoader::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.runner.program, "/opt/bin/newman");

        unsafe {
            std::env::remove_var("SCENARIO_LOADER_TEST_RUNNER");
        }
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let err = ConfigLoader::load_from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ScenarioError::Configuration(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[server\nport = ").unwrap();
        temp_file.flush().unwrap();

        let err = ConfigLoader::load_from_path(temp_file.path()).unwrap_err();
        assert!(matches!(err, ScenarioError::TomlError(_)));
    }
}
