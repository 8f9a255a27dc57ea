//! 搜索过滤条件
//!
//! [`Qualifier`] 是按声明顺序求值的 (属性名, 期望值) 约束列表。属性名经
//! 名称解析（仅属性阶段）映射到原生属性，因此 `title`、`enabled` 这样的
//! 简写都可以使用。第一个不满足的约束即终止求值：每次读取都是一次到目标
//! 进程的往返。

use super::element::{Element, ROLE, SUBROLE};
use super::error::{AxError, AxResult};
use super::platform::Accessibility;
use super::resolver::role_key;
use super::value::{Literal, Point, Range, Rect, Size, Value};
use regex::Regex;
use serde_json::Value as Json;

/// 约束的期望值
#[derive(Debug, Clone)]
pub enum Expected {
    /// 字面值，几何值逐字段比较
    Literal(Literal),
    /// 正则，匹配字符串属性
    Pattern(Regex),
    /// 嵌套条件，作用于元素类型的属性值
    Nested(Qualifier),
}

#[derive(Debug, Clone, Default)]
pub struct Qualifier {
    constraints: Vec<(String, Expected)>,
}

impl Qualifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个约束（构造器风格）
    pub fn with(mut self, key: impl Into<String>, expected: impl Into<Expected>) -> Self {
        self.push(key, expected);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, expected: impl Into<Expected>) {
        self.constraints.push((key.into(), expected.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> &[(String, Expected)] {
        &self.constraints
    }

    /// 从 JSON 对象构造
    ///
    /// - 字符串、布尔、数字为字面值
    /// - `"/…/"` 形式的字符串为正则
    /// - 含 `x`/`y`、`width`/`height`、`origin`/`size`、`location`/`length`
    ///   的对象为几何值
    /// - 其他对象为嵌套条件
    pub fn from_json(json: &Json) -> AxResult<Self> {
        let map = json
            .as_object()
            .ok_or_else(|| AxError::Other(format!("filter must be a JSON object: {}", json)))?;
        let mut qualifier = Self::new();
        for (key, value) in map {
            qualifier.push(key.as_str(), expected_from_json(value)?);
        }
        Ok(qualifier)
    }

    /// 测试元素是否满足全部约束
    ///
    /// 名称无法解析或属性缺失视为不满足；其他原生错误向上传播。
    pub fn matches<A: Accessibility>(&self, element: &Element<A>) -> AxResult<bool> {
        for (key, expected) in &self.constraints {
            let Some(attr) = element.resolve_attribute(key) else {
                return Ok(false);
            };
            let value = match element.optional_attribute(attr)? {
                Some(value) => value,
                None => return Ok(false),
            };
            if !satisfies(attr, value, expected)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn satisfies<A: Accessibility>(attr: &str, value: Value<A>, expected: &Expected) -> AxResult<bool> {
    match expected {
        // 角色比较忽略命名空间与大小写："Button" 与 "AXButton" 等价
        Expected::Literal(Literal::String(role)) if attr == ROLE || attr == SUBROLE => {
            Ok(value.as_str().map_or(false, |actual| role_key(actual) == role_key(role)))
        }
        Expected::Literal(literal) => Ok(value.matches_literal(literal)),
        Expected::Pattern(pattern) => Ok(value.as_str().map_or(false, |s| pattern.is_match(s))),
        Expected::Nested(nested) => match value {
            Value::Element(inner) => nested.matches(&inner),
            _ => Ok(false),
        },
    }
}

fn expected_from_json(value: &Json) -> AxResult<Expected> {
    let expected = match value {
        Json::Bool(b) => Expected::Literal(Literal::Boolean(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Expected::Literal(Literal::Integer(i)),
            None => Expected::Literal(Literal::Float(n.as_f64().unwrap_or_default())),
        },
        Json::String(s) => match s.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
            Some(pattern) if s.len() >= 2 => Expected::Pattern(
                Regex::new(pattern).map_err(|e| AxError::Other(format!("invalid pattern {}: {}", s, e)))?,
            ),
            _ => Expected::Literal(Literal::String(s.clone())),
        },
        Json::Object(map) => {
            let has = |a: &str, b: &str| map.len() == 2 && map.contains_key(a) && map.contains_key(b);
            let structured = if has("x", "y") {
                serde_json::from_value::<Point>(value.clone()).ok().map(Literal::Point)
            } else if has("width", "height") {
                serde_json::from_value::<Size>(value.clone()).ok().map(Literal::Size)
            } else if has("origin", "size") {
                serde_json::from_value::<Rect>(value.clone()).ok().map(Literal::Rect)
            } else if has("location", "length") {
                serde_json::from_value::<Range>(value.clone()).ok().map(Literal::Range)
            } else {
                None
            };
            match structured {
                Some(literal) => Expected::Literal(literal),
                None => Expected::Nested(Qualifier::from_json(value)?),
            }
        }
        Json::Null | Json::Array(_) => {
            return Err(AxError::Other(format!("unsupported filter value: {}", value)))
        }
    };
    Ok(expected)
}

impl From<Literal> for Expected {
    fn from(literal: Literal) -> Self {
        Expected::Literal(literal)
    }
}

impl From<&str> for Expected {
    fn from(s: &str) -> Self {
        Expected::Literal(Literal::from(s))
    }
}

impl From<String> for Expected {
    fn from(s: String) -> Self {
        Expected::Literal(Literal::from(s))
    }
}

impl From<bool> for Expected {
    fn from(b: bool) -> Self {
        Expected::Literal(Literal::from(b))
    }
}

impl From<i64> for Expected {
    fn from(i: i64) -> Self {
        Expected::Literal(Literal::from(i))
    }
}

impl From<f64> for Expected {
    fn from(f: f64) -> Self {
        Expected::Literal(Literal::from(f))
    }
}

impl From<Point> for Expected {
    fn from(p: Point) -> Self {
        Expected::Literal(Literal::from(p))
    }
}

impl From<Size> for Expected {
    fn from(s: Size) -> Self {
        Expected::Literal(Literal::from(s))
    }
}

impl From<Rect> for Expected {
    fn from(r: Rect) -> Self {
        Expected::Literal(Literal::from(r))
    }
}

impl From<Range> for Expected {
    fn from(r: Range) -> Self {
        Expected::Literal(Literal::from(r))
    }
}

impl From<Regex> for Expected {
    fn from(pattern: Regex) -> Self {
        Expected::Pattern(pattern)
    }
}

impl From<Qualifier> for Expected {
    fn from(qualifier: Qualifier) -> Self {
        Expected::Nested(qualifier)
    }
}
