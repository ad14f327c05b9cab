//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use crate::observability::ObservabilityConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// 指针移动超过该距离（像素）才进入拖拽状态
    pub drag_activation_distance: f64,
    /// 克隆节点的放置位置：root（追加到根组）或 sibling（紧跟原节点）
    pub clone_placement: String,
    /// 计分时是否记录评估追踪
    pub trace_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_activation_distance: 5.0,
            clone_placement: "root".to_string(),
            trace_enabled: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub observability: ObservabilityConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. .env 文件（写入进程环境变量，不覆盖已有变量）
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. config/{service_name}.toml（服务特定配置）
    /// 5. 环境变量（ADMISSIONS_ 前缀，层级用双下划线，如
    ///    ADMISSIONS_ENGINE__TRACE_ENABLED -> engine.trace_enabled）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();

        let env = std::env::var("ADMISSIONS_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::builder(service_name, &env, Path::new(&config_dir))?
            .build()?
            .try_deserialize()
    }

    fn builder(
        service_name: &str,
        env: &str,
        config_dir: &Path,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("ADMISSIONS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ))
    }

    /// 可观测性配置，注入服务名
    ///
    /// 生产环境始终输出 JSON 日志。
    pub fn observability(&self) -> ObservabilityConfig {
        let mut config = self
            .observability
            .clone()
            .with_service_name(&self.service_name);
        config.json_logs |= self.is_production();
        config
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.drag_activation_distance, 5.0);
        assert_eq!(config.engine.clone_placement, "root");
        assert!(!config.engine.trace_enabled);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let config: AppConfig = AppConfig::builder(
            "ruleset-engine",
            "test",
            Path::new("/nonexistent-config-dir"),
        )
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(config.service_name, "ruleset-engine");
        assert_eq!(config.environment, "test");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_partial_engine_section() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[engine]\nclone_placement = \"sibling\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.engine.clone_placement, "sibling");
        assert_eq!(config.engine.drag_activation_distance, 5.0);
    }

    #[test]
    fn test_observability_carries_service_name() {
        let config = AppConfig {
            service_name: "ruleset-engine".to_string(),
            ..Default::default()
        };
        assert_eq!(config.observability().service_name, "ruleset-engine");
    }
}
