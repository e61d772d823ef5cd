//! 模块配置合并
//!
//! 将三层配置来源合并为模块实例最终看到的配置对象：
//!
//! 1. 模块默认配置
//! 2. 宿主全局配置中 `config_key` 所指的分支
//! 3. 注册位置给出的内联配置
//!
//! 后一层覆盖前一层。两侧都是对象时递归合并，其余情况（数组、标量、类型不一致）整体替换。
//! 覆盖层中的 `null` 视为缺失，不会清除下层的值。

use serde_json::{Map, Value};

use crate::host::ModuleHost;
use crate::module::metadata::ActiveModuleEntry;

/// 配置对象
pub type Options = Map<String, Value>;

/// 将任意 JSON 值转换为配置对象
///
/// 对象原样返回；`null` 与其他非对象值得到空配置。
pub fn value_into_options(value: Value) -> Options {
    match value {
        Value::Object(map) => map,
        Value::Null => Options::new(),
        other => {
            tracing::debug!("忽略非对象配置值: {}", other);
            Options::new()
        }
    }
}

/// 将 `overlay` 深度合并进 `base`
pub fn deep_merge(base: &mut Options, overlay: &Options) {
    for (key, value) in overlay {
        if value.is_null() {
            continue;
        }

        match (base.get_mut(key), value) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                deep_merge(base_map, overlay_map);
            }
            // 新对象同样逐层过滤 `null`
            (_, Value::Object(overlay_map)) => {
                let mut fresh = Options::new();
                deep_merge(&mut fresh, overlay_map);
                base.insert(key.clone(), Value::Object(fresh));
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// 按顺序合并多层配置，后面的层优先
///
/// 不修改任何输入层。
pub fn merge_layers<'a, I>(layers: I) -> Options
where
    I: IntoIterator<Item = &'a Options>,
{
    let mut merged = Options::new();
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}

/// 取宿主全局配置中属于该条目的分支
///
/// 未设置配置键、分支缺失或分支不是对象时返回 `None`。
pub fn global_branch<'h>(entry: &ActiveModuleEntry, host: &'h dyn ModuleHost) -> Option<&'h Options> {
    let key = entry.descriptor.config_key()?;

    match host.global_config().get(key) {
        Some(Value::Object(branch)) => Some(branch),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::debug!(
                module = entry.name(),
                config_key = key,
                "全局配置分支不是对象，已忽略: {}",
                other
            );
            None
        }
    }
}

/// 计算活动模块条目的最终配置
///
/// 默认配置 ⊕ 全局配置分支 ⊕ 内联配置。每次调用都重新计算，不做缓存。
pub fn resolve_options(entry: &ActiveModuleEntry, host: &dyn ModuleHost) -> Options {
    let mut merged = entry.descriptor.defaults().resolve(host);

    if let Some(branch) = global_branch(entry, host) {
        tracing::trace!(module = entry.name(), "合并全局配置分支");
        deep_merge(&mut merged, branch);
    }

    tracing::trace!(module = entry.name(), "合并内联配置");
    deep_merge(&mut merged, &entry.inline_options);

    merged
}
