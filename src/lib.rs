//! # Chips Registry - 模块注册表
//!
//! 面向可扩展宿主的模块注册表与配置解析引擎。宿主在启动时实例化一组模块，
//! 注册表负责回答关于这组活动模块的问题：
//!
//! - **模块识别**: 某个模块是否已安装（按名称识别，区分大小写）
//! - **版本解析**: 模块的有效版本（运行时实例优先于声明版本）
//! - **范围匹配**: 模块版本是否满足 semver 范围
//! - **配置合并**: 默认配置 ⊕ 宿主全局配置分支 ⊕ 注册位置内联配置
//! - **宿主兼容性**: 模块声明的宿主版本要求是否满足
//!
//! 注册表对宿主状态只读，所有操作都是纯查询。
//!
//! ## 快速开始
//!
//! ```rust
//! use chips_registry::{get_module_version, has_module, HostBuilder, ModuleDescriptor, RuntimeInstance};
//!
//! let foo = ModuleDescriptor::builder("nuxt-module-foo")
//!     .version("1.0.0")
//!     .build()
//!     .unwrap();
//!
//! let host = HostBuilder::new()
//!     .module_with_runtime(foo, RuntimeInstance::with_version("1.0.1"))
//!     .build();
//!
//! assert!(has_module("nuxt-module-foo", &host));
//! assert_eq!(get_module_version("nuxt-module-foo", &host).as_deref(), Some("1.0.1"));
//! ```
//!
//! ## 模块结构
//!
//! - `module` - 模块元数据、识别、版本与配置合并
//! - `host` - 宿主只读接口与内存实现
//! - `api` - 注册表查询接口
//! - `core` - 注册表配置
//! - `utils` - 错误类型与日志系统

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod core;
pub mod host;
pub mod module;
pub mod utils;

// 重导出常用类型，方便使用
pub use api::{
    assert_host_compatibility, check_host_compatibility, get_module_options, get_module_options_as,
    get_module_version, has_host_compatibility, has_module, has_module_compatibility,
    CompatibilityIssue, ModuleSummary, Registry,
};

pub use host::{HostBuilder, HostSnapshot, InMemoryHost, ModuleHost, SnapshotModule};

pub use module::{
    satisfies, ActiveModuleEntry, DuplicatePolicy, ModuleCompatibility, ModuleDefaults,
    ModuleDescriptor, ModuleDescriptorBuilder, ModuleRef, ModuleRegistration, Options, RangeOptions,
    RuntimeInstance, VersionRange,
};

pub use utils::{error_code, CoreError, Result};
pub use utils::logger::{LogGuard, Logger, LoggerConfig, LoggerConfigBuilder, RotationStrategy};

pub use crate::core::config::{LogConfig, RegistryConfig, RegistryConfigBuilder, ResolverConfig};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
