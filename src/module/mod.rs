//! 模块管理模块
//!
//! 包含注册表核心的各个组件：
//! - 模块元数据与引用
//! - 模块识别
//! - 版本解析与范围匹配
//! - 配置合并

pub mod metadata;
pub mod options;
pub mod range;
pub mod registry;
pub mod version;

// 重导出常用类型
pub use metadata::{
    ActiveModuleEntry, ModuleCompatibility, ModuleDefaults, ModuleDescriptor,
    ModuleDescriptorBuilder, ModuleRef, ModuleRegistration, RuntimeInstance,
};
pub use options::{deep_merge, merge_layers, resolve_options, Options};
pub use range::{satisfies, satisfies_with, RangeOptions, VersionRange};
pub use registry::{find, find_all, find_with_policy, DuplicatePolicy};
pub use version::{parse_version, resolve_version};
