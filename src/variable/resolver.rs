use crate::error::{Result, ScenarioError};
use crate::variable::types::VariableContext;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn var_regex() -> &'static Regex {
    static VAR_REGEX: OnceLock<Regex> = OnceLock::new();
    VAR_REGEX.get_or_init(|| {
        Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").expect("static variable pattern")
    })
}

fn env_regex() -> &'static Regex {
    static ENV_REGEX: OnceLock<Regex> = OnceLock::new();
    ENV_REGEX.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static env pattern"))
}

/// 变量替换器
pub struct VariableResolver;

impl VariableResolver {
    /// 替换文本中的所有 {{variable}} 占位符，缺失的变量保持原样
    pub fn substitute(text: &str, context: &VariableContext) -> String {
        var_regex()
            .replace_all(text, |caps: &Captures| {
                let var_name = &caps[1];
                context.get(var_name).unwrap_or(&caps[0]).to_string()
            })
            .to_string()
    }

    /// 严格替换：任何缺失的变量都返回错误
    ///
    /// 运行器参数必须完全解析，否则外部进程会拿到字面量 `{{...}}`。
    pub fn substitute_strict(text: &str, context: &VariableContext) -> Result<String> {
        let missing: Vec<String> = var_regex()
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .filter(|name| context.get(name).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(ScenarioError::Configuration(format!(
                "unresolved template variable(s) {} in '{}'",
                missing.join(","),
                text
            )));
        }

        Ok(Self::substitute(text, context))
    }

    /// 解析并替换系统环境变量 ${VAR}
    pub fn resolve_env_vars(text: &str) -> String {
        env_regex()
            .replace_all(text, |caps: &Captures| {
                let env_name = &caps[1];
                std::env::var(env_name).unwrap_or_else(|_| caps[0].to_string())
            })
            .to_string()
    }

    /// 完整的变量解析流程：先解析环境变量，再严格替换模板变量
    pub fn resolve(text: &str, context: &VariableContext) -> Result<String> {
        let with_env = Self::resolve_env_vars(text);
        Self::substitute_strict(&with_env, context)
    }
}
