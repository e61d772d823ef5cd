//! 模块注册表错误类型定义
//!
//! 本模块定义了注册表中使用的所有错误类型。

use thiserror::Error;

/// 注册表核心错误类型
#[derive(Error, Debug)]
pub enum CoreError {
    // ==================== 模块查询错误 ====================

    /// 模块未安装
    #[error("模块未安装: '{0}'")]
    ModuleNotInstalled(String),

    /// 无效的模块元数据
    #[error("无效的模块元数据: {0}")]
    InvalidMetadata(String),

    // ==================== 版本错误 ====================

    /// 版本号格式无效
    #[error("版本号格式无效: '{version}' - {reason}")]
    InvalidVersion {
        /// 原始版本字符串
        version: String,
        /// 解析失败原因
        reason: String,
    },

    /// 版本范围格式无效
    #[error("版本范围格式无效: '{range}' - {reason}")]
    InvalidRange {
        /// 原始范围字符串
        range: String,
        /// 解析失败原因
        reason: String,
    },

    /// 宿主版本不满足模块要求
    #[error("模块 '{module}' 与宿主不兼容: {}", .issues.join("; "))]
    IncompatibleHost {
        /// 模块名称
        module: String,
        /// 不满足的各项要求
        issues: Vec<String>,
    },

    // ==================== 配置错误 ====================

    /// 配置加载失败
    #[error("配置加载失败: {0}")]
    ConfigLoadFailed(String),

    /// 配置值无效
    #[error("配置值无效: '{key}' - {reason}")]
    InvalidConfigValue {
        /// 配置项名称
        key: String,
        /// 无效原因
        reason: String,
    },

    // ==================== IO 和序列化错误 ====================

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML 序列化/反序列化错误
    #[error("YAML 错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ==================== 通用错误 ====================

    /// 初始化失败
    #[error("初始化失败: {0}")]
    InitFailed(String),
}

/// 注册表操作结果类型别名
pub type Result<T> = std::result::Result<T, CoreError>;

/// 错误码常量
pub mod error_code {
    // 模块错误 (MODULE-xxx)
    /// 模块未安装
    pub const MODULE_NOT_INSTALLED: &str = "MODULE-001";
    /// 模块元数据无效
    pub const MODULE_INVALID_METADATA: &str = "MODULE-002";
    /// 模块与宿主不兼容
    pub const MODULE_INCOMPATIBLE_HOST: &str = "MODULE-003";

    // 版本错误 (VERSION-xxx)
    /// 版本号无效
    pub const VERSION_INVALID: &str = "VERSION-001";
    /// 版本范围无效
    pub const VERSION_INVALID_RANGE: &str = "VERSION-002";

    // 配置错误 (CONFIG-xxx)
    /// 配置文件加载失败
    pub const CONFIG_LOAD_FAILED: &str = "CONFIG-001";
    /// 配置值无效
    pub const CONFIG_INVALID_VALUE: &str = "CONFIG-002";

    // 核心错误 (CORE-xxx)
    /// 初始化失败
    pub const CORE_INIT_FAILED: &str = "CORE-003";
}

impl CoreError {
    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::ModuleNotInstalled(_) => error_code::MODULE_NOT_INSTALLED,
            CoreError::InvalidMetadata(_) => error_code::MODULE_INVALID_METADATA,
            CoreError::IncompatibleHost { .. } => error_code::MODULE_INCOMPATIBLE_HOST,
            CoreError::InvalidVersion { .. } => error_code::VERSION_INVALID,
            CoreError::InvalidRange { .. } => error_code::VERSION_INVALID_RANGE,
            CoreError::ConfigLoadFailed(_) => error_code::CONFIG_LOAD_FAILED,
            CoreError::InvalidConfigValue { .. } => error_code::CONFIG_INVALID_VALUE,
            CoreError::InitFailed(_) => error_code::CORE_INIT_FAILED,
            _ => "UNKNOWN",
        }
    }

    /// 是否为"模块未安装"错误
    pub fn is_not_installed(&self) -> bool {
        matches!(self, CoreError::ModuleNotInstalled(_))
    }
}
