//! 模块注册表 SDK
//!
//! 注册表对外提供的查询接口，每个操作都接受模块引用与宿主：
//!
//! - [`has_module`]：模块是否已安装
//! - [`get_module_version`]：模块的有效版本
//! - [`has_module_compatibility`]：模块版本是否满足范围
//! - [`get_module_options`]：模块实例最终看到的配置
//!
//! 以及模块对宿主版本的兼容性检查。自由函数使用默认解析策略，
//! 需要自定义策略时使用 [`Registry`]。
//!
//! # 示例
//!
//! ```rust
//! use chips_registry::{get_module_options, has_module_compatibility, HostBuilder, ModuleDescriptor};
//! use serde_json::json;
//!
//! let foo = ModuleDescriptor::builder("nuxt-module-foo")
//!     .version("1.0.0")
//!     .config_key("foo")
//!     .defaults(json!({ "defaultVal": "foo" }))
//!     .build()
//!     .unwrap();
//!
//! let host = HostBuilder::new()
//!     .config_value("foo", json!({ "number": 10 }))
//!     .module((foo.clone(), json!({ "inlineVal": "bar" })))
//!     .build();
//!
//! assert!(has_module_compatibility(&foo, "^1.0.0", &host));
//!
//! let options = get_module_options(&foo, &host).unwrap();
//! assert_eq!(
//!     serde_json::Value::Object(options),
//!     json!({ "defaultVal": "foo", "inlineVal": "bar", "number": 10 })
//! );
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::config::{RegistryConfig, ResolverConfig};
use crate::host::ModuleHost;
use crate::module::metadata::{ActiveModuleEntry, ModuleDescriptor, ModuleRef};
use crate::module::options::{resolve_options, Options};
use crate::module::range::{satisfies_with, VersionRange};
use crate::module::registry::{find_all, DuplicatePolicy};
use crate::module::version::{parse_version, resolve_version};
use crate::utils::{CoreError, Result};

// ============================================================================
// 辅助类型
// ============================================================================

/// 兼容性问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityIssue {
    /// 问题所属的约束（目前只有 `host`）
    pub name: String,
    /// 问题描述
    pub message: String,
}

impl fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// 活动模块摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    /// 模块名称
    pub name: String,
    /// 有效版本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// 配置键
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,
    /// 是否存在运行时实例
    pub has_runtime: bool,
    /// 条目加入宿主的时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Registry
// ============================================================================

/// 带解析策略的注册表查询入口
///
/// 本身不持有任何宿主状态，所有操作都是对宿主的只读查询。
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry {
    config: ResolverConfig,
}

impl Registry {
    /// 使用指定的解析策略创建
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// 从注册表配置创建
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.resolver)
    }

    /// 当前解析策略
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// 单次遍历活动模块列表，按策略选出条目并统计同名条目数
    fn locate<'h>(&self, reference: ModuleRef<'_>, host: &'h dyn ModuleHost) -> Option<&'h ActiveModuleEntry> {
        let name = reference.name();
        let policy = self.config.duplicate_policy;

        let mut entries = 0usize;
        let mut selected = None;
        for entry in host.active_modules().iter().filter(|entry| entry.name() == name) {
            entries += 1;
            if selected.is_none() || policy == DuplicatePolicy::LastMatch {
                selected = Some(entry);
            }
        }

        match entries {
            0 => debug!(module = name, "模块未在宿主中找到"),
            1 => {}
            _ => warn!(module = name, entries, policy = ?policy, "宿主中存在同名模块条目"),
        }
        selected
    }

    /// 模块是否已安装
    pub fn has_module<'a>(&self, reference: impl Into<ModuleRef<'a>>, host: &dyn ModuleHost) -> bool {
        self.locate(reference.into(), host).is_some()
    }

    /// 获取模块的有效版本
    ///
    /// 模块未安装或版本未知时返回 `None`。
    pub fn get_module_version<'a>(
        &self,
        reference: impl Into<ModuleRef<'a>>,
        host: &dyn ModuleHost,
    ) -> Option<String> {
        let reference = reference.into();
        let entry = self.locate(reference, host)?;
        let version = resolve_version(entry);
        if version.is_none() {
            debug!(module = %reference, "模块已安装但版本未知");
        }
        version.map(str::to_string)
    }

    /// 模块版本是否满足范围
    ///
    /// 模块未安装、版本未知、版本或范围无法解析时都返回 `false`。
    #[instrument(level = "debug", skip(self, reference, host))]
    pub fn has_module_compatibility<'a>(
        &self,
        reference: impl Into<ModuleRef<'a>>,
        range: &str,
        host: &dyn ModuleHost,
    ) -> bool {
        match self.get_module_version(reference, host) {
            Some(version) => satisfies_with(&version, range, self.config.range_options()),
            None => false,
        }
    }

    /// 获取模块实例的最终配置
    ///
    /// # Errors
    ///
    /// 模块未安装时返回 `ModuleNotInstalled`，而不是空配置
    pub fn get_module_options<'a>(
        &self,
        reference: impl Into<ModuleRef<'a>>,
        host: &dyn ModuleHost,
    ) -> Result<Options> {
        let reference = reference.into();
        let entry = self
            .locate(reference, host)
            .ok_or_else(|| CoreError::ModuleNotInstalled(reference.name().to_string()))?;

        Ok(resolve_options(entry, host))
    }

    /// 获取模块配置并反序列化为指定类型
    pub fn get_module_options_as<'a, T>(
        &self,
        reference: impl Into<ModuleRef<'a>>,
        host: &dyn ModuleHost,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let options = self.get_module_options(reference, host)?;
        Ok(serde_json::from_value(serde_json::Value::Object(options))?)
    }

    /// 检查模块对宿主版本的要求
    ///
    /// 没有声明要求时返回空列表。宿主未报告版本时，任何声明的要求都不满足。
    pub fn check_host_compatibility(
        &self,
        descriptor: &ModuleDescriptor,
        host: &dyn ModuleHost,
    ) -> Vec<CompatibilityIssue> {
        let mut issues = Vec::new();

        let Some(required) = descriptor.compatibility().host.as_deref() else {
            return issues;
        };

        let issue = |message: String| CompatibilityIssue {
            name: "host".to_string(),
            message,
        };

        let range = match VersionRange::parse_with(required, self.config.range_options()) {
            Ok(range) => range,
            Err(e) => {
                issues.push(issue(e.to_string()));
                return issues;
            }
        };

        match host.host_version() {
            None => issues.push(issue(format!("需要宿主版本 {}，但宿主未报告版本", required))),
            Some(current) => match parse_version(current) {
                Ok(version) if range.matches(&version) => {}
                Ok(_) => issues.push(issue(format!(
                    "需要宿主版本 {}，当前为 {}",
                    required, current
                ))),
                Err(e) => issues.push(issue(e.to_string())),
            },
        }

        issues
    }

    /// 模块是否与宿主兼容
    pub fn has_host_compatibility(&self, descriptor: &ModuleDescriptor, host: &dyn ModuleHost) -> bool {
        self.check_host_compatibility(descriptor, host).is_empty()
    }

    /// 断言模块与宿主兼容
    ///
    /// # Errors
    ///
    /// 存在兼容性问题时返回 `IncompatibleHost`
    pub fn assert_host_compatibility(
        &self,
        descriptor: &ModuleDescriptor,
        host: &dyn ModuleHost,
    ) -> Result<()> {
        let issues = self.check_host_compatibility(descriptor, host);
        if issues.is_empty() {
            return Ok(());
        }

        Err(CoreError::IncompatibleHost {
            module: descriptor.name().to_string(),
            issues: issues.iter().map(ToString::to_string).collect(),
        })
    }

    /// 列出宿主中所有活动模块
    pub fn list_modules(&self, host: &dyn ModuleHost) -> Vec<ModuleSummary> {
        host.active_modules()
            .iter()
            .map(|entry| ModuleSummary {
                name: entry.name().to_string(),
                version: resolve_version(entry).map(str::to_string),
                config_key: entry.descriptor.config_key().map(str::to_string),
                has_runtime: entry.runtime.is_some(),
                installed_at: entry.installed_at,
            })
            .collect()
    }

    /// 与引用同名的条目数量
    pub fn count_entries<'a>(&self, reference: impl Into<ModuleRef<'a>>, host: &dyn ModuleHost) -> usize {
        find_all(reference.into(), host).len()
    }
}

// ============================================================================
// 默认策略的便捷函数
// ============================================================================

/// 模块是否已安装
pub fn has_module<'a>(reference: impl Into<ModuleRef<'a>>, host: &dyn ModuleHost) -> bool {
    Registry::default().has_module(reference, host)
}

/// 获取模块的有效版本
pub fn get_module_version<'a>(reference: impl Into<ModuleRef<'a>>, host: &dyn ModuleHost) -> Option<String> {
    Registry::default().get_module_version(reference, host)
}

/// 模块版本是否满足范围
pub fn has_module_compatibility<'a>(
    reference: impl Into<ModuleRef<'a>>,
    range: &str,
    host: &dyn ModuleHost,
) -> bool {
    Registry::default().has_module_compatibility(reference, range, host)
}

/// 获取模块实例的最终配置
pub fn get_module_options<'a>(reference: impl Into<ModuleRef<'a>>, host: &dyn ModuleHost) -> Result<Options> {
    Registry::default().get_module_options(reference, host)
}

/// 获取模块配置并反序列化为指定类型
pub fn get_module_options_as<'a, T>(reference: impl Into<ModuleRef<'a>>, host: &dyn ModuleHost) -> Result<T>
where
    T: DeserializeOwned,
{
    Registry::default().get_module_options_as(reference, host)
}

/// 检查模块对宿主版本的要求
pub fn check_host_compatibility(descriptor: &ModuleDescriptor, host: &dyn ModuleHost) -> Vec<CompatibilityIssue> {
    Registry::default().check_host_compatibility(descriptor, host)
}

/// 模块是否与宿主兼容
pub fn has_host_compatibility(descriptor: &ModuleDescriptor, host: &dyn ModuleHost) -> bool {
    Registry::default().has_host_compatibility(descriptor, host)
}

/// 断言模块与宿主兼容
pub fn assert_host_compatibility(descriptor: &ModuleDescriptor, host: &dyn ModuleHost) -> Result<()> {
    Registry::default().assert_host_compatibility(descriptor, host)
}
