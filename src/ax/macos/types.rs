//! CoreFoundation 类型 RAII 包装器与值转换
//!
//! 为 CoreFoundation 对象提供自动内存管理，并在 CF 值与 [`RawValue`] /
//! [`Literal`] 之间转换。

use super::ffi::*;
use crate::ax::error::{AxError, AxResult};
use crate::ax::value::{BoxedKind, Literal, RawValue};
use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use std::ffi::c_void;
use std::fmt;

/// AXUIElement 包装器，作为 macOS 后端的元素句柄
pub struct AxElement(CFTypeRef);

impl AxElement {
    /// 从裸指针创建，不增加引用计数
    /// 安全性：调用者必须确保指针有效，且所有权转移给本对象
    pub unsafe fn from_raw(ptr: CFTypeRef) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr))
        }
    }

    /// 从裸指针创建，增加引用计数
    /// 安全性：调用者必须确保指针有效
    pub unsafe fn retain(ptr: CFTypeRef) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            CFRetain(ptr);
            Some(Self(ptr))
        }
    }

    /// 获取内部裸指针
    pub fn as_ptr(&self) -> CFTypeRef {
        self.0
    }
}

impl Drop for AxElement {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CFRelease(self.0) };
            self.0 = std::ptr::null();
        }
    }
}

impl fmt::Debug for AxElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AxElement({:p})", self.0)
    }
}

// 禁止 Clone：每个句柄只属于一个 Element

/// Create/Copy 规则返回的 CF 对象，drop 时释放
pub struct CfOwned(CFTypeRef);

impl CfOwned {
    pub unsafe fn from_raw(ptr: CFTypeRef) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr))
        }
    }

    pub fn as_ptr(&self) -> CFTypeRef {
        self.0
    }
}

impl Drop for CfOwned {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CFRelease(self.0) };
        }
    }
}

/// 将 CF 值转换为 [`RawValue`]
///
/// 安全性：`ptr` 必须在调用期间有效；本函数不接管其所有权，
/// 元素引用会被 retain 后交给新的 [`AxElement`]。
pub unsafe fn to_raw_value(ptr: CFTypeRef) -> RawValue<AxElement> {
    if ptr.is_null() {
        return RawValue::Other("null".to_string());
    }

    let type_id = CFGetTypeID(ptr);

    if type_id == CFStringGetTypeID() {
        RawValue::String(CFString::wrap_under_get_rule(ptr as CFStringRef).to_string())
    } else if type_id == CFBooleanGetTypeID() {
        let true_ptr = CFBoolean::true_value().as_concrete_TypeRef() as CFTypeRef;
        RawValue::Boolean(ptr == true_ptr)
    } else if type_id == CFNumberGetTypeID() {
        number_value(ptr)
    } else if type_id == AXUIElementGetTypeID() {
        match AxElement::retain(ptr) {
            Some(element) => RawValue::Element(element),
            None => RawValue::Other("null".to_string()),
        }
    } else if type_id == CFArrayGetTypeID() {
        let count = CFArrayGetCount(ptr).max(0);
        let items = (0..count)
            .map(|i| to_raw_value(CFArrayGetValueAtIndex(ptr, i)))
            .collect();
        RawValue::Array(items)
    } else if type_id == AXValueGetTypeID() {
        boxed_value(ptr)
    } else {
        RawValue::Other(describe(ptr))
    }
}

unsafe fn number_value(ptr: CFTypeRef) -> RawValue<AxElement> {
    if CFNumberIsFloatType(ptr) {
        let mut value: f64 = 0.0;
        CFNumberGetValue(ptr, K_CF_NUMBER_FLOAT64_TYPE, &mut value as *mut _ as *mut c_void);
        RawValue::Float(value)
    } else {
        let mut value: i64 = 0;
        CFNumberGetValue(ptr, K_CF_NUMBER_SINT64_TYPE, &mut value as *mut _ as *mut c_void);
        RawValue::Integer(value)
    }
}

/// 按 AXValue 类型序号解包，未识别的序号原样透传
unsafe fn boxed_value(ptr: CFTypeRef) -> RawValue<AxElement> {
    let ordinal = AXValueGetType(ptr);
    let mut fields = [0.0f64; 4];
    let ok = match BoxedKind::from_ordinal(ordinal) {
        Some(BoxedKind::Point) | Some(BoxedKind::Size) => {
            AXValueGetValue(ptr, ordinal, fields.as_mut_ptr() as *mut c_void)
        }
        Some(BoxedKind::Rect) => AXValueGetValue(ptr, ordinal, fields.as_mut_ptr() as *mut c_void),
        Some(BoxedKind::Range) => {
            let mut range = CFRange::default();
            let ok = AXValueGetValue(ptr, ordinal, &mut range as *mut _ as *mut c_void);
            fields[0] = range.location as f64;
            fields[1] = range.length as f64;
            ok
        }
        None => true,
    };
    if !ok {
        return RawValue::Other(describe(ptr));
    }
    RawValue::Boxed { ordinal, fields }
}

/// CFCopyDescription 文本
pub unsafe fn describe(ptr: CFTypeRef) -> String {
    let desc = CFCopyDescription(ptr);
    if desc.is_null() {
        return String::new();
    }
    CFString::wrap_under_create_rule(desc).to_string()
}

/// CFArray<CFString> 转为字符串列表
pub unsafe fn string_list(ptr: CFTypeRef) -> Vec<String> {
    match to_raw_value(ptr) {
        RawValue::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                RawValue::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// 将字面值转换为可写入的 CF 对象
pub fn literal_to_cf(value: &Literal) -> AxResult<CFType> {
    let cf = match value {
        Literal::String(s) => CFString::new(s).into_CFType(),
        Literal::Boolean(b) => CFBoolean::from(*b).into_CFType(),
        Literal::Integer(i) => CFNumber::from(*i).into_CFType(),
        Literal::Float(f) => CFNumber::from(*f).into_CFType(),
        Literal::Point(p) => boxed([p.x, p.y], K_AX_VALUE_TYPE_CG_POINT)?,
        Literal::Size(s) => boxed([s.width, s.height], K_AX_VALUE_TYPE_CG_SIZE)?,
        Literal::Rect(r) => boxed(
            [r.origin.x, r.origin.y, r.size.width, r.size.height],
            K_AX_VALUE_TYPE_CG_RECT,
        )?,
        Literal::Range(r) => {
            let range = CFRange {
                location: r.location as isize,
                length: r.length as isize,
            };
            boxed(range, K_AX_VALUE_TYPE_CF_RANGE)?
        }
    };
    Ok(cf)
}

fn boxed<T>(value: T, typ: u32) -> AxResult<CFType> {
    let ptr = unsafe { AXValueCreate(typ, &value as *const T as *const c_void) };
    if ptr.is_null() {
        return Err(AxError::IllegalArgument);
    }
    Ok(unsafe { CFType::wrap_under_create_rule(ptr) })
}
