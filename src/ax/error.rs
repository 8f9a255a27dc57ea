//! 错误类型定义

use std::error::Error;
use std::fmt;

/// AX 操作错误
#[derive(Debug, Clone, PartialEq)]
pub enum AxError {
    /// 底层对象已失效（例如所属窗口已关闭）
    InvalidReference,
    AttributeUnsupported(String),
    ActionUnsupported(String),
    NotWritable(String),
    /// 目标进程无法完成请求（包括平台报告的超时）
    CannotComplete,
    /// 辅助功能 API 未启用
    PermissionDenied,
    NoValue(String),
    IllegalArgument,
    /// 属性、操作、搜索三个阶段均未命中
    UnknownRequest(String),
    ApiError(i32),
    Other(String),
}

impl fmt::Display for AxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxError::InvalidReference => write!(f, "无效的元素引用"),
            AxError::AttributeUnsupported(attr) => write!(f, "属性不支持: {}", attr),
            AxError::ActionUnsupported(action) => write!(f, "操作不支持: {}", action),
            AxError::NotWritable(attr) => write!(f, "属性不可写: {}", attr),
            AxError::CannotComplete => write!(f, "无法完成请求（目标应用无响应或超时）"),
            AxError::PermissionDenied => {
                write!(f, "权限被拒绝: 请在系统设置中授予辅助功能权限")
            }
            AxError::NoValue(attr) => write!(f, "属性无值: {}", attr),
            AxError::IllegalArgument => write!(f, "参数错误"),
            AxError::UnknownRequest(name) => write!(f, "无法解析的请求: {}", name),
            AxError::ApiError(code) => write!(f, "AX API 错误: 代码 {}", code),
            AxError::Other(msg) => write!(f, "其他错误: {}", msg),
        }
    }
}

impl Error for AxError {}

/// AX 操作结果
pub type AxResult<T> = Result<T, AxError>;

/// AXError 错误码
pub const AX_ERROR_SUCCESS: i32 = 0;
pub const AX_ERROR_ILLEGAL_ARGUMENT: i32 = -25201;
pub const AX_ERROR_INVALID_UI_ELEMENT: i32 = -25202;
pub const AX_ERROR_CANNOT_COMPLETE: i32 = -25204;
pub const AX_ERROR_ATTRIBUTE_UNSUPPORTED: i32 = -25205;
pub const AX_ERROR_ACTION_UNSUPPORTED: i32 = -25206;
pub const AX_ERROR_API_DISABLED: i32 = -25211;
pub const AX_ERROR_NO_VALUE: i32 = -25212;

impl AxError {
    /// 根据错误码创建错误
    ///
    /// `name` 为出错的属性或操作名，仅用于错误信息。
    pub fn from_code(code: i32, name: &str) -> Self {
        match code {
            AX_ERROR_ILLEGAL_ARGUMENT => AxError::IllegalArgument,
            AX_ERROR_INVALID_UI_ELEMENT => AxError::InvalidReference,
            AX_ERROR_CANNOT_COMPLETE => AxError::CannotComplete,
            AX_ERROR_ATTRIBUTE_UNSUPPORTED => AxError::AttributeUnsupported(name.to_string()),
            AX_ERROR_ACTION_UNSUPPORTED => AxError::ActionUnsupported(name.to_string()),
            AX_ERROR_API_DISABLED => AxError::PermissionDenied,
            AX_ERROR_NO_VALUE => AxError::NoValue(name.to_string()),
            _ => AxError::ApiError(code),
        }
    }

    /// 将状态码转换为结果，0 为成功
    pub fn check(code: i32, name: &str) -> AxResult<()> {
        if code == AX_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(Self::from_code(code, name))
        }
    }

    /// 属性缺失类错误（搜索与过滤时视为"不匹配"而非失败）
    pub fn is_missing(&self) -> bool {
        matches!(self, AxError::AttributeUnsupported(_) | AxError::NoValue(_))
    }
}
