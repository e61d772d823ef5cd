//! 内存宿主
//!
//! `ModuleHost` 的参考实现：模块条目与全局配置都保存在内存中。

use serde_json::Value;

use crate::host::ModuleHost;
use crate::module::metadata::{ActiveModuleEntry, ModuleRegistration, RuntimeInstance};
use crate::module::options::Options;

/// 内存宿主
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    version: Option<String>,
    config: Options,
    modules: Vec<ActiveModuleEntry>,
}

impl InMemoryHost {
    /// 创建空宿主
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建宿主构建器
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// 安装模块，返回新条目
    pub fn install(&mut self, registration: impl Into<ModuleRegistration>) -> &ActiveModuleEntry {
        self.push(ActiveModuleEntry::new(registration.into()))
    }

    /// 安装模块并附加运行时实例
    pub fn install_with_runtime(
        &mut self,
        registration: impl Into<ModuleRegistration>,
        runtime: RuntimeInstance,
    ) -> &ActiveModuleEntry {
        self.push(ActiveModuleEntry::new(registration.into()).with_runtime(runtime))
    }

    /// 追加已构造的条目
    pub fn push(&mut self, entry: ActiveModuleEntry) -> &ActiveModuleEntry {
        tracing::debug!(module = entry.name(), "模块已安装");
        self.modules.push(entry);
        &self.modules[self.modules.len() - 1]
    }

    /// 设置全局配置项
    pub fn set_config(&mut self, key: impl Into<String>, value: Value) {
        self.config.insert(key.into(), value);
    }

    /// 设置宿主版本
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    /// 已安装模块数量
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

impl ModuleHost for InMemoryHost {
    fn active_modules(&self) -> &[ActiveModuleEntry] {
        &self.modules
    }

    fn global_config(&self) -> &Options {
        &self.config
    }

    fn host_version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// 宿主构建器
#[derive(Debug, Default)]
pub struct HostBuilder {
    host: InMemoryHost,
}

impl HostBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置宿主版本
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.host.set_version(version);
        self
    }

    /// 替换整个全局配置树
    pub fn config(mut self, config: Options) -> Self {
        self.host.config = config;
        self
    }

    /// 设置单个全局配置项
    pub fn config_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.host.set_config(key, value);
        self
    }

    /// 注册模块：描述符，或 `(描述符, 内联配置)`
    pub fn module(mut self, registration: impl Into<ModuleRegistration>) -> Self {
        self.host.install(registration);
        self
    }

    /// 注册模块并附加运行时实例
    pub fn module_with_runtime(
        mut self,
        registration: impl Into<ModuleRegistration>,
        runtime: RuntimeInstance,
    ) -> Self {
        self.host.install_with_runtime(registration, runtime);
        self
    }

    /// 构建宿主
    pub fn build(self) -> InMemoryHost {
        self.host
    }
}
