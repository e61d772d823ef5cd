//! 宿主接口
//!
//! 注册表只通过只读访问器读取宿主状态：按注册顺序排列的活动模块列表，以及全局配置树。
//! 两者在调用时反映宿主当前状态，注册表不持有也不缓存。

pub mod memory;
pub mod snapshot;

pub use memory::{HostBuilder, InMemoryHost};
pub use snapshot::{HostSnapshot, SnapshotModule};

use crate::module::metadata::ActiveModuleEntry;
use crate::module::options::Options;

/// 宿主只读访问接口
pub trait ModuleHost {
    /// 活动模块条目（注册顺序）
    fn active_modules(&self) -> &[ActiveModuleEntry];

    /// 全局配置树
    fn global_config(&self) -> &Options;

    /// 宿主自身版本
    fn host_version(&self) -> Option<&str> {
        None
    }
}
