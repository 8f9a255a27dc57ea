//! 原生辅助功能层接口
//!
//! 引擎只通过此 trait 访问底层 UI 树。macOS 上由 `MacAccessibility`
//! 包装 AXUIElement API；[`MemoryTree`](super::memory::MemoryTree)
//! 提供内存中的树，用于测试与离线快照。
//!
//! 所有调用都是到目标进程的同步往返，没有内置超时。

use super::error::AxResult;
use super::value::{Literal, RawValue};
use std::fmt;

pub trait Accessibility {
    /// 元素句柄。每个句柄由一个 `Element` 独占，不复制。
    type Handle: fmt::Debug;

    /// 列出元素的全部属性名
    fn attribute_names(&self, handle: &Self::Handle) -> AxResult<Vec<String>>;

    /// 列出元素的全部操作名
    fn action_names(&self, handle: &Self::Handle) -> AxResult<Vec<String>>;

    /// 读取属性值
    fn attribute_value(&self, handle: &Self::Handle, name: &str) -> AxResult<RawValue<Self::Handle>>;

    /// 写入属性值
    fn set_attribute_value(&self, handle: &Self::Handle, name: &str, value: &Literal) -> AxResult<()>;

    /// 属性是否可写
    fn is_attribute_settable(&self, handle: &Self::Handle, name: &str) -> AxResult<bool>;

    /// 执行操作
    fn perform_action(&self, handle: &Self::Handle, name: &str) -> AxResult<()>;

    /// 元素所属进程 ID
    fn pid(&self, handle: &Self::Handle) -> AxResult<i32>;

    /// 屏幕坐标处最上层的元素
    fn element_at_point(&self, x: f64, y: f64) -> AxResult<Self::Handle>;

    /// 指定进程的应用元素
    fn application(&self, pid: i32) -> AxResult<Self::Handle>;
}
