//! API 模块
//!
//! 注册表对外提供的查询接口。
//!
//! - `sdk`: 模块识别、版本、兼容性与配置查询
//!
//! # 示例
//!
//! ```rust
//! use chips_registry::api::{has_module, Registry};
//! use chips_registry::{HostBuilder, ModuleDescriptor, RegistryConfig};
//!
//! let host = HostBuilder::new()
//!     .module(ModuleDescriptor::builder("nuxt-module-foo").build().unwrap())
//!     .build();
//!
//! assert!(has_module("nuxt-module-foo", &host));
//!
//! let registry = Registry::from_config(&RegistryConfig::default());
//! assert!(!registry.has_module("nuxt-module-bar", &host));
//! ```

pub mod sdk;

// 重导出主要类型
pub use sdk::{
    assert_host_compatibility, check_host_compatibility, get_module_options, get_module_options_as,
    get_module_version, has_host_compatibility, has_module, has_module_compatibility,
    CompatibilityIssue, ModuleSummary, Registry,
};
