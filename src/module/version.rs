//! 模块版本解析
//!
//! 活动模块的有效版本优先取运行时实例报告的版本，其次取描述符声明的版本。

use semver::{BuildMetadata, Version};

use crate::module::metadata::ActiveModuleEntry;
use crate::utils::{CoreError, Result};

/// 解析活动模块条目的有效版本
///
/// 两处都没有版本时返回 `None`，这不是错误。
pub fn resolve_version(entry: &ActiveModuleEntry) -> Option<&str> {
    let runtime_version = entry
        .runtime
        .as_ref()
        .and_then(|runtime| runtime.version.as_deref());

    match runtime_version {
        Some(version) => Some(version),
        None => {
            tracing::trace!(module = entry.name(), "运行时实例未报告版本，使用声明版本");
            entry.descriptor.version()
        }
    }
}

/// 解析版本号
///
/// 允许首尾空白与前导 `v`，构建元数据被丢弃（不参与比较）。
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let text = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let mut version = Version::parse(text).map_err(|e| CoreError::InvalidVersion {
        version: input.to_string(),
        reason: e.to_string(),
    })?;
    version.build = BuildMetadata::EMPTY;
    Ok(version)
}
