//! Chips Registry 命令行入口
//!
//! 加载宿主快照，对其中的活动模块执行注册表查询。
//!
//! # 命令概览
//!
//! - `has` - 模块是否已安装
//! - `version` - 模块的有效版本
//! - `compat` - 模块版本是否满足范围
//! - `options` - 模块的最终配置
//! - `check-host` - 检查模块的宿主版本要求
//! - `list` - 列出活动模块
//!
//! # 使用示例
//!
//! ```bash
//! chips-registry -s host.yaml has nuxt-module-foo
//! chips-registry -s host.yaml compat nuxt-module-foo "^1.0.0"
//! chips-registry -s host.json options nuxt-module-foo
//! chips-registry -s host.yaml -c registry.yaml check-host
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use chips_registry::module::find_with_policy;
use chips_registry::{HostSnapshot, InMemoryHost, Logger, LoggerConfig, ModuleHost, Registry, RegistryConfig};

/// Chips Registry - 模块注册表
///
/// 查询宿主快照中活动模块的安装状态、版本、兼容性与最终配置。
#[derive(Parser)]
#[command(name = "chips-registry")]
#[command(version, about = "模块注册表与配置解析工具", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// 宿主快照路径（YAML 或 JSON）
    #[arg(short, long, default_value = "host.yaml", global = true)]
    snapshot: PathBuf,

    /// 注册表配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// 子命令
    #[command(subcommand)]
    command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
enum Commands {
    /// 模块是否已安装
    ///
    /// 已安装时退出码为 0，否则为 1。
    Has {
        /// 模块名称
        module: String,
    },

    /// 显示模块的有效版本
    Version {
        /// 模块名称
        module: String,
    },

    /// 检查模块版本是否满足范围
    ///
    /// 满足时退出码为 0，否则为 1。
    Compat {
        /// 模块名称
        module: String,

        /// semver 范围，例如 "^1.0.0 || >=2.1"
        range: String,
    },

    /// 显示模块的最终配置（JSON）
    Options {
        /// 模块名称
        module: String,

        /// 紧凑输出
        #[arg(long)]
        compact: bool,
    },

    /// 检查模块的宿主版本要求
    ///
    /// 不指定模块时检查所有活动模块。存在问题时退出码为 1。
    CheckHost {
        /// 模块名称
        module: Option<String>,
    },

    /// 列出活动模块
    List {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
}

/// 加载注册表配置，命令行参数覆盖文件中的设置
async fn load_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match cli.config {
        Some(ref path) => RegistryConfig::from_file(path)
            .await
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => RegistryConfig::default(),
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    Ok(config)
}

/// 加载宿主快照
async fn load_host(path: &Path) -> anyhow::Result<InMemoryHost> {
    let snapshot = HostSnapshot::from_file(path)
        .await
        .with_context(|| format!("无法加载宿主快照 {}", path.display()))?;
    let host = snapshot.into_host()?;

    info!(
        snapshot = %path.display(),
        modules = host.active_modules().len(),
        host_version = host.host_version().unwrap_or("-"),
        "已加载宿主快照"
    );
    Ok(host)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn check_host(registry: &Registry, host: &InMemoryHost, module: Option<&str>) -> anyhow::Result<bool> {
    let entries: Vec<_> = match module {
        Some(name) => vec![find_with_policy(name.into(), host, registry.config().duplicate_policy)
            .with_context(|| format!("模块 '{}' 未安装", name))?],
        None => host.active_modules().iter().collect(),
    };

    let mut all_ok = true;
    for entry in entries {
        let issues = registry.check_host_compatibility(&entry.descriptor, host);
        if issues.is_empty() {
            println!("✅ {}", entry.name());
        } else {
            all_ok = false;
            println!("❌ {}", entry.name());
            for issue in issues {
                println!("    {}", issue);
            }
        }
    }
    Ok(all_ok)
}

fn list_modules(registry: &Registry, host: &InMemoryHost, json: bool) -> anyhow::Result<()> {
    let modules = registry.list_modules(host);

    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    println!("宿主版本: {}", host.host_version().unwrap_or("-"));
    println!("────────────────────────────────────────");
    for module in &modules {
        println!(
            "  {:<32} {:<12} {}",
            module.name,
            module.version.as_deref().unwrap_or("-"),
            module.config_key.as_deref().unwrap_or("-")
        );
    }
    println!("────────────────────────────────────────");
    println!("共 {} 个活动模块", modules.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(&cli).await?;
    let _guard = Logger::try_init(LoggerConfig::from_log_config(&config.logging));
    debug!(?config, "注册表配置");

    let registry = Registry::from_config(&config);
    let host = load_host(&cli.snapshot).await?;

    let code = match cli.command {
        Commands::Has { module } => {
            let installed = registry.has_module(&module, &host);
            println!("{}", installed);
            exit_code(installed)
        }

        Commands::Version { module } => match registry.get_module_version(&module, &host) {
            Some(version) => {
                println!("{}", version);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("模块 '{}' 未安装或版本未知", module);
                ExitCode::FAILURE
            }
        },

        Commands::Compat { module, range } => {
            let compatible = registry.has_module_compatibility(&module, &range, &host);
            println!("{}", compatible);
            exit_code(compatible)
        }

        Commands::Options { module, compact } => {
            let options = serde_json::Value::Object(registry.get_module_options(&module, &host)?);
            if compact {
                println!("{}", serde_json::to_string(&options)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&options)?);
            }
            ExitCode::SUCCESS
        }

        Commands::CheckHost { module } => exit_code(check_host(&registry, &host, module.as_deref())?),

        Commands::List { json } => {
            list_modules(&registry, &host, json)?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
