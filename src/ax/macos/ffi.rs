//! macOS Accessibility API FFI 声明
//!
//! 此模块包含所有 unsafe 的 FFI 声明，仅供内部使用。
//! 外部代码应通过 safe 模块访问。

use core_foundation::base::{CFTypeID, CFTypeRef};
use core_foundation::dictionary::CFDictionaryRef;
use core_foundation::string::CFStringRef;
use std::ffi::c_void;

/// AXValue 类型常量（与装箱序号表一致）
pub const K_AX_VALUE_TYPE_CG_POINT: u32 = 1;
pub const K_AX_VALUE_TYPE_CG_SIZE: u32 = 2;
pub const K_AX_VALUE_TYPE_CG_RECT: u32 = 3;
pub const K_AX_VALUE_TYPE_CF_RANGE: u32 = 4;

/// CFRange
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct CFRange {
    pub location: isize,
    pub length: isize,
}

extern "C" {
    /// 创建应用的 AXUIElement
    pub fn AXUIElementCreateApplication(pid: i32) -> CFTypeRef;

    /// 系统级 AXUIElement（用于按坐标查找元素）
    pub fn AXUIElementCreateSystemWide() -> CFTypeRef;

    /// 复制属性值
    pub fn AXUIElementCopyAttributeValue(element: CFTypeRef, attribute: CFStringRef, value: *mut CFTypeRef) -> i32;

    /// 复制所有属性名
    pub fn AXUIElementCopyAttributeNames(element: CFTypeRef, names: *mut CFTypeRef) -> i32;

    /// 复制所有操作名
    pub fn AXUIElementCopyActionNames(element: CFTypeRef, names: *mut CFTypeRef) -> i32;

    /// 属性是否可写
    pub fn AXUIElementIsAttributeSettable(element: CFTypeRef, attribute: CFStringRef, settable: *mut u8) -> i32;

    /// 设置属性值
    pub fn AXUIElementSetAttributeValue(element: CFTypeRef, attribute: CFStringRef, value: CFTypeRef) -> i32;

    /// 执行操作
    pub fn AXUIElementPerformAction(element: CFTypeRef, action: CFStringRef) -> i32;

    /// 元素所属进程
    pub fn AXUIElementGetPid(element: CFTypeRef, pid: *mut i32) -> i32;

    /// 屏幕坐标处的元素
    pub fn AXUIElementCopyElementAtPosition(application: CFTypeRef, x: f32, y: f32, element: *mut CFTypeRef) -> i32;

    /// 检查权限
    pub fn AXIsProcessTrusted() -> bool;

    /// 请求权限
    pub fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;

    /// AXValue 装箱类型
    pub fn AXValueGetType(value: CFTypeRef) -> u32;

    /// 从 AXValue 提取值
    pub fn AXValueGetValue(value: CFTypeRef, typ: u32, out: *mut c_void) -> bool;

    /// 创建 AXValue
    pub fn AXValueCreate(typ: u32, value: *const c_void) -> CFTypeRef;

    // CoreFoundation 类型检查
    pub fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    pub fn CFStringGetTypeID() -> CFTypeID;
    pub fn CFArrayGetTypeID() -> CFTypeID;
    pub fn CFNumberGetTypeID() -> CFTypeID;
    pub fn CFBooleanGetTypeID() -> CFTypeID;
    pub fn AXUIElementGetTypeID() -> CFTypeID;
    pub fn AXValueGetTypeID() -> CFTypeID;

    /// 复制描述
    pub fn CFCopyDescription(cf: CFTypeRef) -> CFStringRef;

    /// 释放 CF 对象
    pub fn CFRelease(cf: CFTypeRef);

    /// 保留 CF 对象
    pub fn CFRetain(cf: CFTypeRef) -> CFTypeRef;

    // CFArray 操作
    pub fn CFArrayGetCount(array: CFTypeRef) -> isize;
    pub fn CFArrayGetValueAtIndex(array: CFTypeRef, index: isize) -> CFTypeRef;

    // CFNumber 操作
    pub fn CFNumberIsFloatType(number: CFTypeRef) -> bool;
    pub fn CFNumberGetValue(number: CFTypeRef, typ: CFNumberType, value: *mut c_void) -> bool;
}

/// CFNumber 类型
pub type CFNumberType = isize;
pub const K_CF_NUMBER_SINT64_TYPE: CFNumberType = 4;
pub const K_CF_NUMBER_FLOAT64_TYPE: CFNumberType = 6;
