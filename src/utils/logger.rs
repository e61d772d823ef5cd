//! 日志系统
//!
//! 基于 tracing 生态初始化注册表的日志输出：
//!
//! - 控制台输出（可选 JSON 格式）
//! - 文件输出，按时间轮转（异步非阻塞写入）
//! - `RUST_LOG` 环境变量优先于配置中的级别
//!
//! 库本身只负责产生日志事件，是否初始化订阅者由调用方决定。
//!
//! # 示例
//!
//! ```rust,no_run
//! use chips_registry::utils::logger::{Logger, LoggerConfig, RotationStrategy};
//!
//! let config = LoggerConfig::builder()
//!     .level("debug")
//!     .file_output("./logs")
//!     .rotation(RotationStrategy::Hourly)
//!     .build();
//!
//! let _guard = Logger::init(config).unwrap();
//!
//! tracing::info!(module = "nuxt-module-foo", version = "1.0.0", "模块已识别");
//! ```

use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::core::config::LogConfig;
use crate::utils::{CoreError, Result};

/// 默认日志文件名前缀
pub const DEFAULT_FILE_PREFIX: &str = "chips-registry";

// ============================================================================
// 日志轮转策略
// ============================================================================

/// 日志轮转策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    /// 不轮转（单个日志文件）
    Never,
    /// 每小时轮转
    Hourly,
    /// 每天轮转
    #[default]
    Daily,
}

impl RotationStrategy {
    fn to_rotation(self) -> Rotation {
        match self {
            RotationStrategy::Never => Rotation::NEVER,
            RotationStrategy::Hourly => Rotation::HOURLY,
            RotationStrategy::Daily => Rotation::DAILY,
        }
    }
}

impl FromStr for RotationStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "never" | "none" => Ok(RotationStrategy::Never),
            "hourly" | "hour" => Ok(RotationStrategy::Hourly),
            "daily" | "day" => Ok(RotationStrategy::Daily),
            other => Err(CoreError::InvalidConfigValue {
                key: "logging.rotation".to_string(),
                reason: format!("未知的轮转策略 '{}'", other),
            }),
        }
    }
}

impl std::fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationStrategy::Never => write!(f, "never"),
            RotationStrategy::Hourly => write!(f, "hourly"),
            RotationStrategy::Daily => write!(f, "daily"),
        }
    }
}

// ============================================================================
// 日志配置
// ============================================================================

/// 日志系统配置
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// 默认日志级别，或任意 EnvFilter 指令
    pub level: String,

    /// 是否使用 JSON 格式输出
    pub json_format: bool,

    /// 是否输出到控制台（标准错误）
    pub console_output: bool,

    /// 文件输出目录（None 表示不输出到文件）
    pub file_output: Option<PathBuf>,

    /// 日志文件名前缀
    pub file_prefix: String,

    /// 日志轮转策略
    pub rotation: RotationStrategy,

    /// 是否显示目标模块
    pub show_target: bool,

    /// 是否显示文件名和行号
    pub show_file_line: bool,

    /// 追加的过滤指令，例如 "chips_registry::module=trace"
    pub filter_directives: Option<String>,

    /// 控制台是否启用 ANSI 颜色
    pub ansi_colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: None,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            rotation: RotationStrategy::Daily,
            show_target: true,
            show_file_line: false,
            filter_directives: None,
            ansi_colors: true,
        }
    }
}

impl LoggerConfig {
    /// 创建配置构建器
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::new()
    }

    /// 从注册表配置中的日志段创建
    ///
    /// 无法识别的轮转策略回退为每天轮转。
    pub fn from_log_config(log_config: &LogConfig) -> Self {
        let rotation = log_config.rotation.parse().unwrap_or_else(|e: CoreError| {
            tracing::warn!(error = %e, "使用默认轮转策略");
            RotationStrategy::default()
        });

        Self {
            level: log_config.level.clone(),
            json_format: log_config.json_format,
            file_output: if log_config.file_output {
                log_config.log_dir.clone()
            } else {
                None
            },
            rotation,
            ..Default::default()
        }
    }
}

/// 日志配置构建器
#[derive(Debug, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    /// 设置日志级别
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// 启用 JSON 格式输出
    pub fn json_format(mut self, enable: bool) -> Self {
        self.config.json_format = enable;
        self
    }

    /// 设置控制台输出
    pub fn console_output(mut self, enable: bool) -> Self {
        self.config.console_output = enable;
        self
    }

    /// 设置文件输出目录
    pub fn file_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.file_output = Some(dir.into());
        self
    }

    /// 设置日志文件前缀
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// 设置轮转策略
    pub fn rotation(mut self, strategy: RotationStrategy) -> Self {
        self.config.rotation = strategy;
        self
    }

    /// 显示目标模块
    pub fn show_target(mut self, enable: bool) -> Self {
        self.config.show_target = enable;
        self
    }

    /// 显示文件名和行号
    pub fn show_file_line(mut self, enable: bool) -> Self {
        self.config.show_file_line = enable;
        self
    }

    /// 设置过滤指令
    pub fn filter_directives(mut self, directives: impl Into<String>) -> Self {
        self.config.filter_directives = Some(directives.into());
        self
    }

    /// 启用 ANSI 颜色
    pub fn ansi_colors(mut self, enable: bool) -> Self {
        self.config.ansi_colors = enable;
        self
    }

    /// 构建配置
    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

// ============================================================================
// 日志守卫
// ============================================================================

/// 日志系统守卫
///
/// 持有非阻塞写入器的 WorkerGuard，丢弃时会刷新所有挂起的日志。
#[must_use = "守卫被丢弃后挂起的日志可能丢失"]
pub struct LogGuard {
    _console_guard: Option<WorkerGuard>,
    _file_guard: Option<WorkerGuard>,
}

impl LogGuard {
    fn empty() -> Self {
        Self {
            _console_guard: None,
            _file_guard: None,
        }
    }

    /// 是否持有任何写入器
    pub fn is_active(&self) -> bool {
        self._console_guard.is_some() || self._file_guard.is_some()
    }
}

// ============================================================================
// 日志系统
// ============================================================================

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// 日志系统
pub struct Logger;

impl Logger {
    /// 初始化全局日志订阅者
    ///
    /// 返回的 [`LogGuard`] 必须保持存活直到程序退出。
    ///
    /// # Errors
    ///
    /// 日志系统已初始化，或过滤指令无效时返回 `InitFailed`
    pub fn init(config: LoggerConfig) -> Result<LogGuard> {
        if LOGGER_INITIALIZED.get().is_some() {
            return Err(CoreError::InitFailed("日志系统已初始化，不能重复初始化".to_string()));
        }

        let env_filter = Self::create_env_filter(&config)?;
        let mut guard = LogGuard::empty();

        let mut layers: Vec<BoxedLayer> = Vec::new();

        if config.console_output {
            let (writer, console_guard) = tracing_appender::non_blocking(io::stderr());
            guard._console_guard = Some(console_guard);
            layers.push(Self::build_layer(&config, writer, config.ansi_colors));
        }

        if let Some(ref log_dir) = config.file_output {
            let appender = RollingFileAppender::new(
                config.rotation.to_rotation(),
                log_dir,
                format!("{}.log", config.file_prefix),
            );
            let (writer, file_guard) = tracing_appender::non_blocking(appender);
            guard._file_guard = Some(file_guard);
            layers.push(Self::build_layer(&config, writer, false));
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()
            .map_err(|e| CoreError::InitFailed(format!("日志系统初始化失败: {}", e)))?;

        let _ = LOGGER_INITIALIZED.set(());
        Ok(guard)
    }

    /// 初始化日志系统，已初始化或失败时返回空守卫
    pub fn try_init(config: LoggerConfig) -> LogGuard {
        Self::init(config).unwrap_or_else(|_| LogGuard::empty())
    }

    /// 按注册表配置初始化
    pub fn init_from_config(log_config: &LogConfig) -> Result<LogGuard> {
        Self::init(LoggerConfig::from_log_config(log_config))
    }

    fn create_env_filter(config: &LoggerConfig) -> Result<EnvFilter> {
        let mut filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
                CoreError::InitFailed(format!("无效的日志级别 '{}': {}", config.level, e))
            })?,
        };

        if let Some(ref directives) = config.filter_directives {
            for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                let directive = directive.parse().map_err(|e| {
                    CoreError::InitFailed(format!("无效的过滤指令 '{}': {}", directive, e))
                })?;
                filter = filter.add_directive(directive);
            }
        }

        Ok(filter)
    }

    fn build_layer<W>(config: &LoggerConfig, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(config.show_target)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line);

        if config.json_format {
            layer.json().with_ansi(false).boxed()
        } else {
            layer.with_ansi(ansi).boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_strategy_from_str() {
        assert_eq!("daily".parse::<RotationStrategy>().unwrap(), RotationStrategy::Daily);
        assert_eq!("DAY".parse::<RotationStrategy>().unwrap(), RotationStrategy::Daily);
        assert_eq!("hourly".parse::<RotationStrategy>().unwrap(), RotationStrategy::Hourly);
        assert_eq!("none".parse::<RotationStrategy>().unwrap(), RotationStrategy::Never);
        assert!("weekly".parse::<RotationStrategy>().is_err());
    }

    #[test]
    fn test_rotation_strategy_display() {
        for strategy in [RotationStrategy::Never, RotationStrategy::Hourly, RotationStrategy::Daily] {
            assert_eq!(strategy.to_string().parse::<RotationStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_logger_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(config.file_output.is_none());
        assert_eq!(config.file_prefix, "chips-registry");
        assert_eq!(config.rotation, RotationStrategy::Daily);
    }

    #[test]
    fn test_logger_config_builder() {
        let config = LoggerConfig::builder()
            .level("debug")
            .json_format(true)
            .file_output("/var/log/chips")
            .file_prefix("registry")
            .rotation(RotationStrategy::Hourly)
            .show_target(false)
            .filter_directives("chips_registry::module=trace")
            .ansi_colors(false)
            .build();

        assert_eq!(config.level, "debug");
        assert!(config.json_format);
        assert_eq!(config.file_output, Some(PathBuf::from("/var/log/chips")));
        assert_eq!(config.file_prefix, "registry");
        assert_eq!(config.rotation, RotationStrategy::Hourly);
        assert!(!config.show_target);
        assert!(!config.ansi_colors);
    }

    #[test]
    fn test_logger_config_from_log_config() {
        let log_config = LogConfig {
            level: "debug".to_string(),
            file_output: true,
            log_dir: Some(PathBuf::from("/var/log")),
            json_format: true,
            rotation: "hourly".to_string(),
        };

        let logger_config = LoggerConfig::from_log_config(&log_config);
        assert_eq!(logger_config.level, "debug");
        assert!(logger_config.json_format);
        assert_eq!(logger_config.file_output, Some(PathBuf::from("/var/log")));
        assert_eq!(logger_config.rotation, RotationStrategy::Hourly);
    }

    #[test]
    fn test_logger_config_from_log_config_no_file() {
        let log_config = LogConfig {
            file_output: false,
            log_dir: Some(PathBuf::from("/var/log")),
            rotation: "fortnightly".to_string(),
            ..Default::default()
        };

        let logger_config = LoggerConfig::from_log_config(&log_config);
        assert!(logger_config.file_output.is_none());
        assert_eq!(logger_config.rotation, RotationStrategy::Daily);
    }

    #[test]
    fn test_create_env_filter_with_directives() {
        let config = LoggerConfig::builder()
            .level("info")
            .filter_directives("chips_registry=debug, chips_registry::module=trace")
            .build();
        assert!(Logger::create_env_filter(&config).is_ok());
    }

    #[test]
    fn test_create_env_filter_invalid_directive() {
        let config = LoggerConfig::builder()
            .filter_directives("chips_registry=loud")
            .build();
        assert!(matches!(
            Logger::create_env_filter(&config),
            Err(CoreError::InitFailed(_))
        ));
    }

    #[test]
    fn test_log_guard_empty() {
        assert!(!LogGuard::empty().is_active());
    }

    #[test]
    fn test_logger_try_init_never_fails() {
        let _guard = Logger::try_init(LoggerConfig::default());
        let _guard2 = Logger::try_init(LoggerConfig::default());
    }
}
