//! 核心模块
//!
//! 包含注册表配置。

pub mod config;

pub use config::{LogConfig, RegistryConfig, RegistryConfigBuilder, ResolverConfig};
