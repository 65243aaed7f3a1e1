//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FORMBEE__*` 覆盖（双下划线表示嵌套，
//! 如 `FORMBEE__AGENT__MAX_ATTEMPTS=20`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::state::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_MAX_FIELD_ATTEMPTS,
    DEFAULT_MAX_RUN_TIME_MS,
};
use crate::core::RunBudget;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub llm: LlmSection,
}

/// [agent] 段：运行预算
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// 工具调用总数上限
    pub max_attempts: u32,
    /// 连续错误熔断阈值
    pub max_consecutive_errors: u32,
    /// 墙钟预算（毫秒）
    pub max_run_time_ms: u64,
    /// 单字段失败上限
    pub max_field_attempts: u32,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            max_run_time_ms: DEFAULT_MAX_RUN_TIME_MS,
            max_field_attempts: DEFAULT_MAX_FIELD_ATTEMPTS,
        }
    }
}

impl AgentSection {
    pub fn budget(&self) -> RunBudget {
        RunBudget {
            max_attempts: self.max_attempts,
            max_consecutive_errors: self.max_consecutive_errors,
            max_run_time: Duration::from_millis(self.max_run_time_ms),
            max_field_attempts: self.max_field_attempts,
        }
    }
}

/// [llm] 段：后端端点与采样参数
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI 兼容端点；None 用官方默认
    pub base_url: Option<String>,
    /// 未设置时从 OPENAI_API_KEY 读取
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// 从 config 目录加载配置，环境变量 FORMBEE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FORMBEE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FORMBEE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_matches_constants() {
        let cfg = AppConfig::default();
        let budget = cfg.agent.budget();
        assert_eq!(budget.max_attempts, 15);
        assert_eq!(budget.max_consecutive_errors, 5);
        assert_eq!(budget.max_run_time, Duration::from_millis(300_000));
        assert_eq!(budget.max_field_attempts, 3);
    }
}
