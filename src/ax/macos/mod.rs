//! macOS Accessibility API 后端
//!
//! 通过 AXUIElement C API 实现 [`Accessibility`]，所有 CF 对象的内存管理
//! 由 `types` 中的 RAII 包装器处理。

mod ffi;
mod input;
mod types;

pub use input::CgEventInput;
pub use types::AxElement;

use super::element::Element;
use super::error::{AxError, AxResult};
use super::platform::Accessibility;
use super::value::{Literal, RawValue};
use core_foundation::base::{CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::CFString;
use ffi::*;
use std::rc::Rc;
use tracing::{debug, warn};
use types::CfOwned;

/// AXUIElement API 后端
#[derive(Debug, Default)]
pub struct MacAccessibility;

impl MacAccessibility {
    /// 创建后端，未授予辅助功能权限时返回 [`AxError::PermissionDenied`]
    pub fn new() -> AxResult<Rc<Self>> {
        if !Self::check_permission() {
            warn!("Accessibility permission not granted");
            return Err(AxError::PermissionDenied);
        }
        Ok(Rc::new(Self))
    }

    /// 检查辅助功能权限
    pub fn check_permission() -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    /// 请求辅助功能权限（弹出系统对话框）
    pub fn request_permission() -> bool {
        unsafe {
            let key = CFString::new("AXTrustedCheckOptionPrompt");
            let value = CFBoolean::true_value();
            let pairs = [(key, value)];
            let options = CFDictionary::from_CFType_pairs(&pairs);
            AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef())
        }
    }

    /// 指定进程的应用元素
    pub fn application_element(self: &Rc<Self>, pid: i32) -> AxResult<Element<Self>> {
        Element::application(Rc::clone(self), pid)
    }

    fn copy_attribute(&self, handle: &AxElement, name: &str) -> AxResult<CfOwned> {
        let attr_name = CFString::new(name);
        let mut value: CFTypeRef = std::ptr::null();
        let code =
            unsafe { AXUIElementCopyAttributeValue(handle.as_ptr(), attr_name.as_concrete_TypeRef(), &mut value) };
        AxError::check(code, name)?;
        unsafe { CfOwned::from_raw(value) }.ok_or_else(|| AxError::NoValue(name.to_string()))
    }

    fn copy_names(
        &self,
        handle: &AxElement,
        what: &str,
        copy: unsafe extern "C" fn(CFTypeRef, *mut CFTypeRef) -> i32,
    ) -> AxResult<Vec<String>> {
        let mut names: CFTypeRef = std::ptr::null();
        let code = unsafe { copy(handle.as_ptr(), &mut names) };
        AxError::check(code, what)?;
        match unsafe { CfOwned::from_raw(names) } {
            Some(array) => Ok(unsafe { types::string_list(array.as_ptr()) }),
            None => Ok(Vec::new()),
        }
    }
}

impl Accessibility for MacAccessibility {
    type Handle = AxElement;

    fn attribute_names(&self, handle: &AxElement) -> AxResult<Vec<String>> {
        self.copy_names(handle, "attribute names", AXUIElementCopyAttributeNames)
    }

    fn action_names(&self, handle: &AxElement) -> AxResult<Vec<String>> {
        self.copy_names(handle, "action names", AXUIElementCopyActionNames)
    }

    fn attribute_value(&self, handle: &AxElement, name: &str) -> AxResult<RawValue<AxElement>> {
        let value = self.copy_attribute(handle, name)?;
        Ok(unsafe { types::to_raw_value(value.as_ptr()) })
    }

    fn set_attribute_value(&self, handle: &AxElement, name: &str, value: &Literal) -> AxResult<()> {
        let attr_name = CFString::new(name);
        let cf_value = types::literal_to_cf(value)?;
        let code = unsafe {
            AXUIElementSetAttributeValue(handle.as_ptr(), attr_name.as_concrete_TypeRef(), cf_value.as_CFTypeRef())
        };
        AxError::check(code, name)
    }

    fn is_attribute_settable(&self, handle: &AxElement, name: &str) -> AxResult<bool> {
        let attr_name = CFString::new(name);
        let mut settable: u8 = 0;
        let code =
            unsafe { AXUIElementIsAttributeSettable(handle.as_ptr(), attr_name.as_concrete_TypeRef(), &mut settable) };
        AxError::check(code, name)?;
        Ok(settable != 0)
    }

    fn perform_action(&self, handle: &AxElement, name: &str) -> AxResult<()> {
        let action = CFString::new(name);
        let code = unsafe { AXUIElementPerformAction(handle.as_ptr(), action.as_concrete_TypeRef()) };
        AxError::check(code, name)?;
        debug!("Performed {} on {:?}", name, handle);
        Ok(())
    }

    fn pid(&self, handle: &AxElement) -> AxResult<i32> {
        let mut pid: i32 = 0;
        let code = unsafe { AXUIElementGetPid(handle.as_ptr(), &mut pid) };
        AxError::check(code, "pid")?;
        Ok(pid)
    }

    fn element_at_point(&self, x: f64, y: f64) -> AxResult<AxElement> {
        let system = unsafe { CfOwned::from_raw(AXUIElementCreateSystemWide()) }
            .ok_or_else(|| AxError::Other("failed to create system-wide element".to_string()))?;
        let mut element: CFTypeRef = std::ptr::null();
        let code = unsafe { AXUIElementCopyElementAtPosition(system.as_ptr(), x as f32, y as f32, &mut element) };
        AxError::check(code, "element at position")?;
        unsafe { AxElement::from_raw(element) }.ok_or_else(|| AxError::NoValue(format!("element at ({}, {})", x, y)))
    }

    fn application(&self, pid: i32) -> AxResult<AxElement> {
        let element = unsafe { AxElement::from_raw(AXUIElementCreateApplication(pid)) }
            .ok_or(AxError::InvalidReference)?;
        debug!("Created application element for pid {}", pid);
        Ok(element)
    }
}
