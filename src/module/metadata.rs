//! 模块元数据定义
//!
//! 定义模块描述符、模块引用以及宿主中的活动模块条目。

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::ModuleHost;
use crate::module::options::{value_into_options, Options};
use crate::module::range::VersionRange;
use crate::utils::{CoreError, Result};

/// 根据宿主状态计算默认配置的函数
pub type DefaultsFn = dyn Fn(&dyn ModuleHost) -> Options + Send + Sync;

/// 模块默认配置
///
/// 可以是定义时给出的静态映射，也可以是依赖宿主状态、每次调用时计算的函数。
#[derive(Clone, Default)]
pub enum ModuleDefaults {
    /// 无默认配置
    #[default]
    Empty,
    /// 静态默认配置
    Static(Options),
    /// 按宿主计算的默认配置
    Computed(Arc<DefaultsFn>),
}

impl ModuleDefaults {
    /// 求值得到一份独立的默认配置副本
    pub fn resolve(&self, host: &dyn ModuleHost) -> Options {
        match self {
            ModuleDefaults::Empty => Options::new(),
            ModuleDefaults::Static(options) => options.clone(),
            ModuleDefaults::Computed(f) => f(host),
        }
    }

    /// 是否为按宿主计算的默认配置
    pub fn is_computed(&self) -> bool {
        matches!(self, ModuleDefaults::Computed(_))
    }
}

impl fmt::Debug for ModuleDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleDefaults::Empty => write!(f, "Empty"),
            ModuleDefaults::Static(options) => f.debug_tuple("Static").field(options).finish(),
            ModuleDefaults::Computed(_) => write!(f, "Computed(<fn>)"),
        }
    }
}

/// 兼容性声明
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCompatibility {
    /// 对宿主版本的要求（semver 范围）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// 模块描述符
///
/// 模块定义时给出的身份信息与默认配置，定义后不可变。
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    name: String,
    version: Option<String>,
    config_key: Option<String>,
    compatibility: ModuleCompatibility,
    defaults: ModuleDefaults,
}

impl ModuleDescriptor {
    /// 创建描述符构建器
    pub fn builder(name: impl Into<String>) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder::new(name)
    }

    /// 模块名称（唯一）
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 声明的版本
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// 配置键：宿主全局配置中该模块选项所在的位置
    pub fn config_key(&self) -> Option<&str> {
        self.config_key.as_deref()
    }

    /// 兼容性声明
    pub fn compatibility(&self) -> &ModuleCompatibility {
        &self.compatibility
    }

    /// 默认配置
    pub fn defaults(&self) -> &ModuleDefaults {
        &self.defaults
    }

    /// 验证描述符有效性
    ///
    /// 声明的版本允许是占位符，真实版本可能由运行时实例给出，因此这里不校验版本格式。
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = vec![];

        if self.name.trim().is_empty() {
            errors.push("模块名称不能为空".to_string());
        }

        if let Some(key) = &self.config_key {
            if key.trim().is_empty() {
                errors.push(format!("模块 {} 的配置键不能为空字符串", self.name));
            }
        }

        if let Some(range) = &self.compatibility.host {
            if let Err(e) = VersionRange::parse(range) {
                errors.push(format!("模块 {} 的宿主兼容性声明无效: {}", self.name, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// 模块描述符构建器
#[derive(Debug)]
pub struct ModuleDescriptorBuilder {
    descriptor: ModuleDescriptor,
}

impl ModuleDescriptorBuilder {
    /// 创建新的构建器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ModuleDescriptor {
                name: name.into(),
                version: None,
                config_key: None,
                compatibility: ModuleCompatibility::default(),
                defaults: ModuleDefaults::Empty,
            },
        }
    }

    /// 设置版本
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.descriptor.version = Some(version.into());
        self
    }

    /// 设置配置键
    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        self.descriptor.config_key = Some(key.into());
        self
    }

    /// 设置对宿主版本的要求
    pub fn host_compatibility(mut self, range: impl Into<String>) -> Self {
        self.descriptor.compatibility.host = Some(range.into());
        self
    }

    /// 设置静态默认配置（非对象值视为空配置）
    pub fn defaults(mut self, defaults: Value) -> Self {
        self.descriptor.defaults = ModuleDefaults::Static(value_into_options(defaults));
        self
    }

    /// 设置按宿主计算的默认配置
    pub fn defaults_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ModuleHost) -> Options + Send + Sync + 'static,
    {
        self.descriptor.defaults = ModuleDefaults::Computed(Arc::new(f));
        self
    }

    /// 构建描述符
    ///
    /// # Errors
    ///
    /// 验证失败时返回 `InvalidMetadata`
    pub fn build(self) -> Result<ModuleDescriptor> {
        self.descriptor
            .validate()
            .map_err(|errors| CoreError::InvalidMetadata(errors.join("; ")))?;
        Ok(self.descriptor)
    }
}

/// 模块引用
///
/// 调用方查询模块时传入的内容：模块名称，或者描述符本身。
/// 两种形式都按名称识别模块。
#[derive(Debug, Clone, Copy)]
pub enum ModuleRef<'a> {
    /// 按名称引用
    Name(&'a str),
    /// 按描述符引用
    Descriptor(&'a ModuleDescriptor),
}

impl<'a> ModuleRef<'a> {
    /// 归一化为模块名称
    pub fn name(&self) -> &'a str {
        match self {
            ModuleRef::Name(name) => name,
            ModuleRef::Descriptor(descriptor) => descriptor.name(),
        }
    }
}

impl<'a> From<&'a str> for ModuleRef<'a> {
    fn from(name: &'a str) -> Self {
        ModuleRef::Name(name)
    }
}

impl<'a> From<&'a String> for ModuleRef<'a> {
    fn from(name: &'a String) -> Self {
        ModuleRef::Name(name.as_str())
    }
}

impl<'a> From<&'a ModuleDescriptor> for ModuleRef<'a> {
    fn from(descriptor: &'a ModuleDescriptor) -> Self {
        ModuleRef::Descriptor(descriptor)
    }
}

impl fmt::Display for ModuleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 模块注册项
///
/// 宿主模块列表中的一项：单独的描述符，或 `(描述符, 内联配置)` 二元组。
#[derive(Debug, Clone)]
pub struct ModuleRegistration {
    /// 模块描述符
    pub descriptor: ModuleDescriptor,
    /// 此注册位置提供的内联配置
    pub inline_options: Options,
}

impl From<ModuleDescriptor> for ModuleRegistration {
    fn from(descriptor: ModuleDescriptor) -> Self {
        Self {
            descriptor,
            inline_options: Options::new(),
        }
    }
}

impl From<(ModuleDescriptor, Value)> for ModuleRegistration {
    fn from((descriptor, inline): (ModuleDescriptor, Value)) -> Self {
        Self {
            descriptor,
            inline_options: value_into_options(inline),
        }
    }
}

impl From<(ModuleDescriptor, Options)> for ModuleRegistration {
    fn from((descriptor, inline_options): (ModuleDescriptor, Options)) -> Self {
        Self {
            descriptor,
            inline_options,
        }
    }
}

/// 模块运行时实例
///
/// 模块自身初始化逻辑产生的句柄。若其报告了版本，则优先于描述符中的声明版本。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInstance {
    /// 初始化后确定的版本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RuntimeInstance {
    /// 创建报告指定版本的运行时实例
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
        }
    }
}

/// 活动模块条目
///
/// 宿主在模块注册进运行实例时产生的记录，归宿主所有。
#[derive(Debug, Clone)]
pub struct ActiveModuleEntry {
    /// 模块描述符
    pub descriptor: ModuleDescriptor,
    /// 注册位置解析后的内联配置
    pub inline_options: Options,
    /// 运行时实例
    pub runtime: Option<RuntimeInstance>,
    /// 安装时间
    pub installed_at: Option<DateTime<Utc>>,
}

impl ActiveModuleEntry {
    /// 由注册项创建条目
    pub fn new(registration: ModuleRegistration) -> Self {
        Self {
            descriptor: registration.descriptor,
            inline_options: registration.inline_options,
            runtime: None,
            installed_at: Some(Utc::now()),
        }
    }

    /// 附加运行时实例
    pub fn with_runtime(mut self, runtime: RuntimeInstance) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// 模块名称
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = ModuleDescriptor::builder("nuxt-module-foo")
            .version("1.0.0")
            .config_key("foo")
            .defaults(json!({ "defaultVal": "foo" }))
            .build()
            .unwrap();

        assert_eq!(descriptor.name(), "nuxt-module-foo");
        assert_eq!(descriptor.version(), Some("1.0.0"));
        assert_eq!(descriptor.config_key(), Some("foo"));
        assert!(matches!(descriptor.defaults(), ModuleDefaults::Static(_)));
    }

    #[test]
    fn test_descriptor_validation() {
        let result = ModuleDescriptor::builder("").build();
        assert!(matches!(result, Err(CoreError::InvalidMetadata(_))));

        let result = ModuleDescriptor::builder("foo").config_key("  ").build();
        assert!(result.is_err());

        let result = ModuleDescriptor::builder("foo")
            .host_compatibility(">>=3")
            .build();
        assert!(result.is_err());

        // 占位版本号是允许的
        let result = ModuleDescriptor::builder("foo").version("workspace").build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_module_ref_normalizes_to_name() {
        let descriptor = ModuleDescriptor::builder("bar").build().unwrap();
        let owned = String::from("foo");

        assert_eq!(ModuleRef::from("foo").name(), "foo");
        assert_eq!(ModuleRef::from(&owned).name(), "foo");
        assert_eq!(ModuleRef::from(&descriptor).name(), "bar");
        assert_eq!(ModuleRef::from(&descriptor).to_string(), "bar");
    }

    #[test]
    fn test_registration_from_tuple() {
        let descriptor = ModuleDescriptor::builder("foo").build().unwrap();

        let registration = ModuleRegistration::from((descriptor.clone(), json!({ "a": 1 })));
        assert_eq!(registration.inline_options.get("a"), Some(&json!(1)));

        // 非对象的内联配置视为空
        let registration = ModuleRegistration::from((descriptor.clone(), json!("oops")));
        assert!(registration.inline_options.is_empty());

        let registration = ModuleRegistration::from(descriptor);
        assert!(registration.inline_options.is_empty());
    }

    #[test]
    fn test_active_entry_runtime() {
        let descriptor = ModuleDescriptor::builder("foo").build().unwrap();
        let entry = ActiveModuleEntry::new(descriptor.into())
            .with_runtime(RuntimeInstance::with_version("2.1.0"));

        assert_eq!(entry.name(), "foo");
        assert_eq!(
            entry.runtime.as_ref().and_then(|r| r.version.as_deref()),
            Some("2.1.0")
        );
        assert!(entry.installed_at.is_some());
    }

    #[test]
    fn test_defaults_debug_does_not_expose_fn() {
        let defaults = ModuleDefaults::Computed(Arc::new(|_host: &dyn ModuleHost| Options::new()));
        assert_eq!(format!("{:?}", defaults), "Computed(<fn>)");
        assert!(defaults.is_computed());
    }
}
