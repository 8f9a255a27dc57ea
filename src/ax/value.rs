//! 属性值类型与值转换
//!
//! 原生层返回 [`RawValue`]，经 [`coerce`] 转换为带类型的 [`Value`]：
//! 元素引用包装为 [`Element`]，元素数组包装为 [`ElementList`]，
//! AXValue 装箱几何值按序号解码为 [`Point`]/[`Size`]/[`Rect`]/[`Range`]。
//! 未识别的类型原样透传，不视为错误。

use super::element::Element;
use super::error::AxResult;
use super::list::ElementList;
use super::platform::Accessibility;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// 点 {x, y}
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 尺寸 {width, height}
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// 矩形 {origin, size}
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// 矩形中心点（屏幕坐标）
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// 点是否落在矩形内（含左上边界，不含右下边界）
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.size.width
            && point.y < self.origin.y + self.size.height
    }
}

/// 文本范围 {location, length}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub location: i64,
    pub length: i64,
}

impl Range {
    pub fn new(location: i64, length: i64) -> Self {
        Self { location, length }
    }
}

/// AXValue 装箱类型序号表，0 保留未用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BoxedKind {
    Point = 1,
    Size = 2,
    Rect = 3,
    Range = 4,
}

impl BoxedKind {
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            1 => Some(BoxedKind::Point),
            2 => Some(BoxedKind::Size),
            3 => Some(BoxedKind::Rect),
            4 => Some(BoxedKind::Range),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

/// 原生层返回的未转换属性值
///
/// `H` 为后端的元素句柄类型。装箱值以序号加最多四个字段的形式携带，
/// 字段顺序与对应结构体的声明顺序一致（Range 的两个字段按整数存放）。
#[derive(Debug, PartialEq)]
pub enum RawValue<H> {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Element(H),
    Array(Vec<RawValue<H>>),
    Boxed { ordinal: u32, fields: [f64; 4] },
    /// 无法识别的原生类型，携带其描述文本
    Other(String),
}

impl<H> RawValue<H> {
    pub fn is_element(&self) -> bool {
        matches!(self, RawValue::Element(_))
    }

    pub fn boxed(kind: BoxedKind, fields: [f64; 4]) -> Self {
        RawValue::Boxed {
            ordinal: kind.ordinal(),
            fields,
        }
    }
}

/// 可写入或用于比较的字面值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Range(Range),
}

impl Literal {
    /// 转换为原生层可接受的值
    pub fn to_raw<H>(&self) -> RawValue<H> {
        match self {
            Literal::Boolean(b) => RawValue::Boolean(*b),
            Literal::Integer(i) => RawValue::Integer(*i),
            Literal::Float(f) => RawValue::Float(*f),
            Literal::String(s) => RawValue::String(s.clone()),
            Literal::Point(p) => RawValue::boxed(BoxedKind::Point, [p.x, p.y, 0.0, 0.0]),
            Literal::Size(s) => RawValue::boxed(BoxedKind::Size, [s.width, s.height, 0.0, 0.0]),
            Literal::Rect(r) => RawValue::boxed(
                BoxedKind::Rect,
                [r.origin.x, r.origin.y, r.size.width, r.size.height],
            ),
            Literal::Range(r) => {
                RawValue::boxed(BoxedKind::Range, [r.location as f64, r.length as f64, 0.0, 0.0])
            }
        }
    }

    /// 类型名称（用于参数校验与日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Boolean(_) => "boolean",
            Literal::Integer(_) | Literal::Float(_) => "number",
            Literal::String(_) => "string",
            Literal::Point(_) => "point",
            Literal::Size(_) => "size",
            Literal::Rect(_) => "rect",
            Literal::Range(_) => "range",
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Integer(i)
    }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self {
        Literal::Integer(i64::from(i))
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<Point> for Literal {
    fn from(p: Point) -> Self {
        Literal::Point(p)
    }
}

impl From<Size> for Literal {
    fn from(s: Size) -> Self {
        Literal::Size(s)
    }
}

impl From<Rect> for Literal {
    fn from(r: Rect) -> Self {
        Literal::Rect(r)
    }
}

impl From<Range> for Literal {
    fn from(r: Range) -> Self {
        Literal::Range(r)
    }
}

/// 转换后的属性值
pub enum Value<A: Accessibility> {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Element(Element<A>),
    Elements(ElementList<A>),
    /// 非元素数组，原样保留
    Array(Vec<RawValue<A::Handle>>),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Range(Range),
    /// 未识别序号的装箱值，原样保留
    Boxed { ordinal: u32, fields: [f64; 4] },
    Other(String),
}

impl<A: Accessibility> Value<A> {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            Value::Size(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Value::Rect(r) => Some(*r),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<Element<A>> {
        match self {
            Value::Element(e) => Some(e),
            _ => None,
        }
    }

    /// 取出元素列表；空数组视为空列表
    pub fn into_elements(self) -> Option<ElementList<A>> {
        match self {
            Value::Elements(list) => Some(list),
            Value::Array(items) if items.is_empty() => Some(ElementList::default()),
            _ => None,
        }
    }

    /// 与字面值比较：数值按数值比较，几何值逐字段比较
    pub fn matches_literal(&self, expected: &Literal) -> bool {
        match (self, expected) {
            (Value::String(a), Literal::String(b)) => a == b,
            (Value::Boolean(a), Literal::Boolean(b)) => a == b,
            (Value::Integer(a), Literal::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Float(_), Literal::Integer(_) | Literal::Float(_)) => {
                let expected = match expected {
                    Literal::Integer(i) => *i as f64,
                    Literal::Float(f) => *f,
                    _ => return false,
                };
                self.as_f64() == Some(expected)
            }
            (Value::Point(a), Literal::Point(b)) => a == b,
            (Value::Size(a), Literal::Size(b)) => a == b,
            (Value::Rect(a), Literal::Rect(b)) => a == b,
            (Value::Range(a), Literal::Range(b)) => a == b,
            _ => false,
        }
    }
}

impl<A: Accessibility> fmt::Debug for Value<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Element(e) => f.debug_tuple("Element").field(e).finish(),
            Value::Elements(list) => f.debug_tuple("Elements").field(&list.len()).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Point(p) => f.debug_tuple("Point").field(p).finish(),
            Value::Size(s) => f.debug_tuple("Size").field(s).finish(),
            Value::Rect(r) => f.debug_tuple("Rect").field(r).finish(),
            Value::Range(r) => f.debug_tuple("Range").field(r).finish(),
            Value::Boxed { ordinal, fields } => f
                .debug_struct("Boxed")
                .field("ordinal", ordinal)
                .field("fields", fields)
                .finish(),
            Value::Other(desc) => f.debug_tuple("Other").field(desc).finish(),
        }
    }
}

impl<A: Accessibility> fmt::Display for Value<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Element(_) => write!(f, "<element>"),
            Value::Elements(list) => write!(f, "<{} elements>", list.len()),
            Value::Array(items) => write!(f, "<array[{}]>", items.len()),
            Value::Point(p) => write!(f, "({}, {})", p.x, p.y),
            Value::Size(s) => write!(f, "{}x{}", s.width, s.height),
            Value::Rect(r) => write!(
                f,
                "({}, {}) {}x{}",
                r.origin.x, r.origin.y, r.size.width, r.size.height
            ),
            Value::Range(r) => write!(f, "{}+{}", r.location, r.length),
            Value::Boxed { ordinal, .. } => write!(f, "<boxed #{}>", ordinal),
            Value::Other(desc) => write!(f, "{}", desc),
        }
    }
}

/// 按原生类型标记转换属性值
///
/// 元素引用的转换需要抓取属性名与操作名快照，因此会访问原生层并可能失败。
pub fn coerce<A: Accessibility>(api: &Rc<A>, raw: RawValue<A::Handle>) -> AxResult<Value<A>> {
    let value = match raw {
        RawValue::Element(handle) => Value::Element(Element::new(Rc::clone(api), handle)?),
        RawValue::Array(items) => {
            if items.first().map_or(true, |item| !item.is_element()) {
                return Ok(Value::Array(items));
            }
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    RawValue::Element(handle) => {
                        elements.push(Element::new(Rc::clone(api), handle)?)
                    }
                    // 混合数组中的非元素项没有可包装的对象，跳过
                    other => tracing::debug!("Skipping non-element item in element array: {:?}", other),
                }
            }
            Value::Elements(ElementList::from(elements))
        }
        RawValue::Boxed { ordinal, fields } => unbox(ordinal, fields),
        RawValue::String(s) => Value::String(s),
        RawValue::Integer(i) => Value::Integer(i),
        RawValue::Float(f) => Value::Float(f),
        RawValue::Boolean(b) => Value::Boolean(b),
        RawValue::Other(desc) => Value::Other(desc),
    };
    Ok(value)
}

/// 按装箱序号解码几何值
fn unbox<A: Accessibility>(ordinal: u32, fields: [f64; 4]) -> Value<A> {
    let [a, b, c, d] = fields;
    match BoxedKind::from_ordinal(ordinal) {
        Some(BoxedKind::Point) => Value::Point(Point::new(a, b)),
        Some(BoxedKind::Size) => Value::Size(Size::new(a, b)),
        Some(BoxedKind::Rect) => Value::Rect(Rect::new(a, b, c, d)),
        Some(BoxedKind::Range) => Value::Range(Range::new(a as i64, b as i64)),
        None => Value::Boxed { ordinal, fields },
    }
}
