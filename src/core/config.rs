//! 注册表配置
//!
//! 定义注册表自身的配置结构和加载逻辑（日志、解析策略）。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::module::range::RangeOptions;
use crate::module::registry::DuplicatePolicy;
use crate::utils::CoreError;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件目录
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 日志轮转策略
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_dir: None,
            json_format: false,
            rotation: default_rotation(),
        }
    }
}

/// 解析策略配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// 允许预发布版本像正式版本一样参与范围匹配
    #[serde(default)]
    pub include_prerelease: bool,

    /// 同名模块条目的选择策略
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl ResolverConfig {
    /// 范围匹配选项
    pub fn range_options(&self) -> RangeOptions {
        RangeOptions {
            include_prerelease: self.include_prerelease,
        }
    }
}

/// 注册表配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// 配置文件路径
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// 日志配置
    #[serde(default)]
    pub logging: LogConfig,

    /// 解析策略配置
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl RegistryConfig {
    /// 创建配置构建器
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::new()
    }

    /// 从 YAML 字符串解析
    pub fn from_yaml_str(content: &str) -> crate::utils::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// 从文件加载配置
    ///
    /// `.json` 按 JSON 解析，其余按 YAML 解析；内容无法解析时返回
    /// [`CoreError::ConfigLoadFailed`]，消息中带文件路径。
    pub async fn from_file(path: impl Into<PathBuf>) -> crate::utils::Result<Self> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path).await?;

        let parsed = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str::<RegistryConfig>(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<RegistryConfig>(&content).map_err(|e| e.to_string())
        };
        let mut config = parsed
            .map_err(|reason| CoreError::ConfigLoadFailed(format!("{}: {}", path.display(), reason)))?;

        config.config_path = Some(path);
        Ok(config)
    }

    /// 合并另一个配置（用于覆盖）
    pub fn merge(&mut self, other: RegistryConfig) {
        // 只覆盖非默认值的配置
        if other.logging.level != default_log_level() {
            self.logging.level = other.logging.level;
        }
        if other.logging.file_output {
            self.logging.file_output = true;
            self.logging.log_dir = other.logging.log_dir;
        }
        if other.logging.json_format {
            self.logging.json_format = true;
        }
        if other.logging.rotation != default_rotation() {
            self.logging.rotation = other.logging.rotation;
        }
        if other.resolver.include_prerelease {
            self.resolver.include_prerelease = true;
        }
        if other.resolver.duplicate_policy != DuplicatePolicy::default() {
            self.resolver.duplicate_policy = other.resolver.duplicate_policy;
        }
    }
}

/// 配置构建器
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
        }
    }

    /// 设置日志级别
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// 启用文件日志
    pub fn file_logging(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.config.logging.file_output = true;
        self.config.logging.log_dir = Some(log_dir.into());
        self
    }

    /// 启用 JSON 格式日志
    pub fn json_logging(mut self) -> Self {
        self.config.logging.json_format = true;
        self
    }

    /// 允许预发布版本参与范围匹配
    pub fn include_prerelease(mut self) -> Self {
        self.config.resolver.include_prerelease = true;
        self
    }

    /// 设置同名模块策略
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.resolver.duplicate_policy = policy;
        self
    }

    /// 构建配置
    pub fn build(self) -> RegistryConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.resolver.include_prerelease);
        assert_eq!(config.resolver.duplicate_policy, DuplicatePolicy::FirstMatch);
    }

    #[test]
    fn test_config_builder() {
        let config = RegistryConfig::builder()
            .log_level("debug")
            .include_prerelease()
            .duplicate_policy(DuplicatePolicy::LastMatch)
            .build();

        assert_eq!(config.logging.level, "debug");
        assert!(config.resolver.range_options().include_prerelease);
        assert_eq!(config.resolver.duplicate_policy, DuplicatePolicy::LastMatch);
    }

    #[test]
    fn test_config_merge() {
        let mut base = RegistryConfig::default();
        let override_config = RegistryConfig::builder()
            .log_level("trace")
            .duplicate_policy(DuplicatePolicy::LastMatch)
            .build();

        base.merge(override_config);

        assert_eq!(base.logging.level, "trace");
        assert_eq!(base.resolver.duplicate_policy, DuplicatePolicy::LastMatch);
        assert!(!base.resolver.include_prerelease);
    }

    #[test]
    fn test_config_from_yaml() {
        let config = RegistryConfig::from_yaml_str(
            r#"
logging:
  level: warn
resolver:
  include_prerelease: true
  duplicate_policy: last_match
"#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.rotation, "daily");
        assert!(config.resolver.include_prerelease);
        assert_eq!(config.resolver.duplicate_policy, DuplicatePolicy::LastMatch);
    }

    #[test]
    fn test_config_serialization() {
        let config = RegistryConfig::builder().log_level("warn").build();

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: RegistryConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.logging.level, "warn");
    }

    #[tokio::test]
    async fn test_unparsable_file_is_load_failure() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("registry.yaml");
        tokio::fs::write(&path, "resolver:\n  duplicate_policy: [nope").await.unwrap();

        match RegistryConfig::from_file(&path).await {
            Err(CoreError::ConfigLoadFailed(message)) => {
                assert!(message.contains("registry.yaml"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
