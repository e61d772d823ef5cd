//! 模块配置合并集成测试
//!
//! 默认配置 ⊕ 全局配置分支 ⊕ 内联配置的完整流程。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chips_registry::module::deep_merge;
use chips_registry::{
    get_module_options, CoreError, HostBuilder, InMemoryHost, ModuleDescriptor, ModuleHost, Options,
};
use serde_json::{json, Value};

fn options_of(value: Value) -> Options {
    match value {
        Value::Object(map) => map,
        other => panic!("不是对象: {}", other),
    }
}

fn foo_module() -> ModuleDescriptor {
    ModuleDescriptor::builder("nuxt-module-foo")
        .config_key("foo")
        .defaults(json!({ "defaultVal": "foo" }))
        .build()
        .unwrap()
}

// ============================================================================
// 来源优先级
// ============================================================================

/// 测试三个来源的合并结果
#[test]
fn test_get_module_options() {
    let foo = foo_module();
    let host = HostBuilder::new()
        .config_value("foo", json!({ "number": 10 }))
        .module((foo.clone(), json!({ "inlineVal": "bar" })))
        .build();

    let options = get_module_options(&foo, &host).unwrap();
    assert_eq!(
        Value::Object(options),
        json!({ "defaultVal": "foo", "inlineVal": "bar", "number": 10 })
    );
}

/// 测试同名键的优先级：内联 > 全局 > 默认
#[test]
fn test_precedence_on_collision() {
    let module = ModuleDescriptor::builder("m")
        .config_key("m")
        .defaults(json!({ "a": "default", "b": "default", "c": "default" }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("m", json!({ "b": "global", "c": "global" }))
        .module((module, json!({ "c": "inline" })))
        .build();

    let options = get_module_options("m", &host).unwrap();
    assert_eq!(
        Value::Object(options),
        json!({ "a": "default", "b": "global", "c": "inline" })
    );
}

/// 测试嵌套对象逐层合并，数组整体替换
#[test]
fn test_nested_merge() {
    let module = ModuleDescriptor::builder("pwa")
        .config_key("pwa")
        .defaults(json!({
            "manifest": { "name": "App", "lang": "en", "icons": ["64.png", "128.png"] },
            "workbox": { "enabled": true }
        }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("pwa", json!({ "manifest": { "lang": "zh", "icons": ["512.png"] } }))
        .module((module, json!({ "workbox": { "debug": true } })))
        .build();

    let options = get_module_options("pwa", &host).unwrap();
    assert_eq!(
        Value::Object(options),
        json!({
            "manifest": { "name": "App", "lang": "zh", "icons": ["512.png"] },
            "workbox": { "enabled": true, "debug": true }
        })
    );
}

/// 测试类型不一致时高优先级来源整体替换
#[test]
fn test_type_mismatch_replaces() {
    let module = ModuleDescriptor::builder("m")
        .config_key("m")
        .defaults(json!({ "server": { "port": 3000 }, "mode": "spa" }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("m", json!({ "server": false, "mode": { "ssr": true } }))
        .module(module)
        .build();

    let options = get_module_options("m", &host).unwrap();
    assert_eq!(
        Value::Object(options),
        json!({ "server": false, "mode": { "ssr": true } })
    );
}

/// 测试空值不会清除低优先级来源中的值
#[test]
fn test_null_does_not_clear() {
    let module = ModuleDescriptor::builder("m")
        .config_key("m")
        .defaults(json!({ "a": 1 }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("m", json!({ "a": null, "b": null }))
        .module((module, json!({ "c": null })))
        .build();

    let options = get_module_options("m", &host).unwrap();
    assert_eq!(Value::Object(options), json!({ "a": 1 }));
}

/// 测试下层没有的键中嵌套的空值同样被忽略
#[test]
fn test_nested_null_under_new_key() {
    let module = ModuleDescriptor::builder("m")
        .config_key("m")
        .defaults(json!({ "keep": 1 }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("m", json!({ "fresh": { "x": null, "y": 2 } }))
        .module((module, json!({ "other": { "deep": { "z": null } } })))
        .build();

    let options = get_module_options("m", &host).unwrap();
    assert_eq!(
        Value::Object(options),
        json!({ "keep": 1, "fresh": { "y": 2 }, "other": { "deep": {} } })
    );
}

// ============================================================================
// 边界情况
// ============================================================================

/// 测试没有配置键时忽略全局配置
#[test]
fn test_no_config_key_ignores_global() {
    let module = ModuleDescriptor::builder("m")
        .defaults(json!({ "a": 1 }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("m", json!({ "a": 2 }))
        .module((module, json!({ "b": 3 })))
        .build();

    let options = get_module_options("m", &host).unwrap();
    assert_eq!(Value::Object(options), json!({ "a": 1, "b": 3 }));
}

/// 测试全局配置分支不是对象时被忽略
#[test]
fn test_non_object_global_branch_ignored() {
    let host = HostBuilder::new()
        .config_value("foo", json!("enabled"))
        .module(foo_module())
        .build();

    let options = get_module_options("nuxt-module-foo", &host).unwrap();
    assert_eq!(Value::Object(options), json!({ "defaultVal": "foo" }));
}

/// 测试三个来源都为空时得到空配置
#[test]
fn test_all_sources_empty() {
    let module = ModuleDescriptor::builder("bare").build().unwrap();
    let host = HostBuilder::new().module(module).build();

    assert!(get_module_options("bare", &host).unwrap().is_empty());
}

/// 测试未安装模块返回错误而不是空配置
#[test]
fn test_uninstalled_module_fails() {
    let host = HostBuilder::new()
        .config_value("foo", json!({ "number": 10 }))
        .build();

    let err = get_module_options(&foo_module(), &host).unwrap_err();
    assert!(matches!(err, CoreError::ModuleNotInstalled(ref name) if name == "nuxt-module-foo"));
    assert!(err.is_not_installed());
}

/// 测试合并不修改任何来源
#[test]
fn test_sources_are_not_mutated() {
    let module = ModuleDescriptor::builder("m")
        .config_key("m")
        .defaults(json!({ "nested": { "a": 1 } }))
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .config_value("m", json!({ "nested": { "b": 2 } }))
        .module((module, json!({ "nested": { "c": 3 } })))
        .build();

    let first = get_module_options("m", &host).unwrap();
    let second = get_module_options("m", &host).unwrap();
    assert_eq!(first, second);

    assert_eq!(host.global_config().get("m"), Some(&json!({ "nested": { "b": 2 } })));
    let entry = &host.active_modules()[0];
    assert_eq!(Value::Object(entry.inline_options.clone()), json!({ "nested": { "c": 3 } }));
    assert_eq!(
        Value::Object(entry.descriptor.defaults().resolve(&host)),
        json!({ "nested": { "a": 1 } })
    );
}

/// 测试全局配置变化在下一次调用时生效
#[test]
fn test_reflects_current_host_state() {
    let mut host = InMemoryHost::new();
    host.install(foo_module());

    assert_eq!(
        Value::Object(get_module_options("nuxt-module-foo", &host).unwrap()),
        json!({ "defaultVal": "foo" })
    );

    host.set_config("foo", json!({ "defaultVal": "override" }));
    assert_eq!(
        Value::Object(get_module_options("nuxt-module-foo", &host).unwrap()),
        json!({ "defaultVal": "override" })
    );
}

// ============================================================================
// 计算默认配置
// ============================================================================

/// 测试默认配置可由宿主状态计算，每次调用都重新计算
#[test]
fn test_computed_defaults() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let module = ModuleDescriptor::builder("m")
        .config_key("m")
        .defaults_fn(move |host| {
            counter.fetch_add(1, Ordering::SeqCst);
            options_of(json!({
                "hostVersion": host.host_version(),
                "dev": false
            }))
        })
        .build()
        .unwrap();

    let host = HostBuilder::new()
        .version("3.8.0")
        .config_value("m", json!({ "dev": true }))
        .module(module)
        .build();

    let options = get_module_options("m", &host).unwrap();
    assert_eq!(Value::Object(options), json!({ "hostVersion": "3.8.0", "dev": true }));

    get_module_options("m", &host).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// 测试深度合并可单独使用
#[test]
fn test_deep_merge_public() {
    let mut base = options_of(json!({ "a": { "x": 1 }, "keep": true }));
    deep_merge(&mut base, &options_of(json!({ "a": { "y": 2 } })));
    assert_eq!(Value::Object(base), json!({ "a": { "x": 1, "y": 2 }, "keep": true }));
}
