//! 模块识别
//!
//! 在宿主的活动模块列表中查找模块引用对应的条目。
//! 识别只看名称（区分大小写）：同名的两个描述符实例视为同一个模块。

use serde::{Deserialize, Serialize};

use crate::host::ModuleHost;
use crate::module::metadata::{ActiveModuleEntry, ModuleRef};

/// 同名条目的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 按注册顺序取第一个
    #[default]
    FirstMatch,
    /// 按注册顺序取最后一个
    LastMatch,
}

/// 按默认策略（第一个匹配）查找模块条目
pub fn find<'h>(reference: ModuleRef<'_>, host: &'h dyn ModuleHost) -> Option<&'h ActiveModuleEntry> {
    find_with_policy(reference, host, DuplicatePolicy::FirstMatch)
}

/// 按指定策略查找模块条目
///
/// 未找到时返回 `None`，由调用方决定视为"未安装"还是报错。
pub fn find_with_policy<'h>(
    reference: ModuleRef<'_>,
    host: &'h dyn ModuleHost,
    policy: DuplicatePolicy,
) -> Option<&'h ActiveModuleEntry> {
    let name = reference.name();
    let mut matches = host.active_modules().iter().filter(|entry| entry.name() == name);

    let found = match policy {
        DuplicatePolicy::FirstMatch => matches.next(),
        DuplicatePolicy::LastMatch => matches.last(),
    };

    if found.is_none() {
        tracing::debug!(module = name, "模块未在宿主中找到");
    }
    found
}

/// 列出与引用同名的所有条目（按注册顺序）
pub fn find_all<'h>(reference: ModuleRef<'_>, host: &'h dyn ModuleHost) -> Vec<&'h ActiveModuleEntry> {
    let name = reference.name();
    host.active_modules()
        .iter()
        .filter(|entry| entry.name() == name)
        .collect()
}

/// 列出宿主中出现多次的模块名称
pub fn duplicate_names(host: &dyn ModuleHost) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = Vec::new();

    for entry in host.active_modules() {
        let name = entry.name();
        if !seen.insert(name) && !duplicates.iter().any(|d: &String| d == name) {
            duplicates.push(name.to_string());
        }
    }
    duplicates
}
