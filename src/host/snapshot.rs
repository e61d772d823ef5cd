//! 宿主快照
//!
//! 已实例化宿主状态的序列化形式（YAML 或 JSON），供命令行工具与测试加载。
//!
//! ```yaml
//! version: 3.8.0
//! config:
//!   foo:
//!     number: 10
//! modules:
//!   - name: nuxt-module-foo
//!     version: 1.0.0
//!     config_key: foo
//!     defaults:
//!       defaultVal: foo
//!     inline_options:
//!       inlineVal: bar
//!     runtime:
//!       version: 1.0.1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::host::memory::InMemoryHost;
use crate::module::metadata::{
    ActiveModuleEntry, ModuleCompatibility, ModuleDescriptor, ModuleRegistration, RuntimeInstance,
};
use crate::module::options::Options;
use crate::utils::{CoreError, Result};

/// 快照中的单个模块条目
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotModule {
    /// 模块名称
    pub name: String,

    /// 声明版本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// 配置键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,

    /// 兼容性声明
    #[serde(default)]
    pub compatibility: ModuleCompatibility,

    /// 默认配置
    #[serde(default)]
    pub defaults: Options,

    /// 注册位置的内联配置
    #[serde(default)]
    pub inline_options: Options,

    /// 运行时实例
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeInstance>,
}

impl SnapshotModule {
    /// 转换为活动模块条目
    pub fn into_entry(self) -> Result<ActiveModuleEntry> {
        let mut builder = ModuleDescriptor::builder(self.name)
            .defaults(serde_json::Value::Object(self.defaults));
        if let Some(version) = self.version {
            builder = builder.version(version);
        }
        if let Some(key) = self.config_key {
            builder = builder.config_key(key);
        }
        if let Some(range) = self.compatibility.host {
            builder = builder.host_compatibility(range);
        }

        let registration = ModuleRegistration::from((builder.build()?, self.inline_options));
        let mut entry = ActiveModuleEntry::new(registration);
        entry.runtime = self.runtime;
        Ok(entry)
    }
}

/// 宿主快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostSnapshot {
    /// 宿主版本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// 全局配置树
    #[serde(default)]
    pub config: Options,

    /// 活动模块（注册顺序）
    #[serde(default)]
    pub modules: Vec<SnapshotModule>,
}

impl HostSnapshot {
    /// 从 YAML 字符串解析
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// 从 JSON 字符串解析
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 从文件加载（`.json` 按 JSON 解析，其余按 YAML 解析）
    ///
    /// 内容无法解析时返回带文件路径的 [`CoreError::ConfigLoadFailed`]。
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;

        let parsed = if path.extension().map(|e| e == "json").unwrap_or(false) {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        parsed.map_err(|e| CoreError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))
    }

    /// 构建内存宿主
    ///
    /// # Errors
    ///
    /// 任一模块描述无效时返回 `InvalidMetadata`
    pub fn into_host(self) -> Result<InMemoryHost> {
        let mut host = InMemoryHost::new();
        if let Some(version) = self.version {
            host.set_version(version);
        }
        for (key, value) in self.config {
            host.set_config(key, value);
        }
        for module in self.modules {
            host.push(module.into_entry()?);
        }
        Ok(host)
    }
}
