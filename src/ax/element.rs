//! 可访问性元素
//!
//! [`Element`] 独占一个原生句柄，并在构造时抓取属性名与操作名快照。
//! 快照之后不再刷新：执行了改变 UI 的操作后，调用方应把旧元素视为可能过期。
//! 原生对象失效后，所有操作返回 [`AxError::InvalidReference`]。

use super::error::{AxError, AxResult};
use super::list::ElementList;
use super::platform::Accessibility;
use super::qualifier::Qualifier;
use super::resolver::{self, MatchQuery, Resolution, CHILDREN_ATTRIBUTE};
use super::search::{self, SearchMode, SearchResult};
use super::traverse::DepthFirst;
use super::value::{self, Literal, Point, Rect, Value};
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

pub const ROLE: &str = "AXRole";
pub const SUBROLE: &str = "AXSubrole";
pub const TITLE: &str = "AXTitle";
pub const VALUE: &str = "AXValue";
pub const IDENTIFIER: &str = "AXIdentifier";
pub const DESCRIPTION: &str = "AXDescription";
pub const PARENT: &str = "AXParent";
pub const POSITION: &str = "AXPosition";
pub const SIZE: &str = "AXSize";

/// 符号化请求的执行结果
pub enum Outcome<A: Accessibility> {
    /// 读取到的属性值
    Value(Value<A>),
    /// 已被目标进程接受的操作名
    Performed(String),
    /// 单数搜索命中的元素
    Found(Element<A>),
    /// 复数搜索的全部结果（可能为空）
    FoundAll(ElementList<A>),
}

impl<A: Accessibility> fmt::Debug for Outcome<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Outcome::Performed(a) => f.debug_tuple("Performed").field(a).finish(),
            Outcome::Found(e) => f.debug_tuple("Found").field(e).finish(),
            Outcome::FoundAll(list) => f.debug_tuple("FoundAll").field(&list.len()).finish(),
        }
    }
}

/// 可访问性元素
pub struct Element<A: Accessibility> {
    api: Rc<A>,
    handle: A::Handle,
    attributes: Vec<String>,
    actions: Vec<String>,
    pid: OnceCell<i32>,
}

impl<A: Accessibility> Element<A> {
    /// 接管句柄并抓取属性名、操作名快照
    pub fn new(api: Rc<A>, handle: A::Handle) -> AxResult<Self> {
        let mut attributes = api.attribute_names(&handle).map_err(|e| {
            debug!("attribute_names failed for {:?}: {}", handle, e);
            e
        })?;
        let mut actions = api.action_names(&handle).map_err(|e| {
            debug!("action_names failed for {:?}: {}", handle, e);
            e
        })?;
        dedup_in_order(&mut attributes);
        dedup_in_order(&mut actions);

        Ok(Self {
            api,
            handle,
            attributes,
            actions,
            pid: OnceCell::new(),
        })
    }

    /// 指定进程的应用元素
    pub fn application(api: Rc<A>, pid: i32) -> AxResult<Self> {
        let handle = api.application(pid)?;
        Self::new(api, handle)
    }

    /// 屏幕坐标处的元素
    pub fn at_point(api: Rc<A>, x: f64, y: f64) -> AxResult<Self> {
        let handle = api.element_at_point(x, y)?;
        Self::new(api, handle)
    }

    pub fn api(&self) -> &Rc<A> {
        &self.api
    }

    pub fn handle(&self) -> &A::Handle {
        &self.handle
    }

    /// 构造时抓取的属性名
    pub fn attribute_names(&self) -> &[String] {
        &self.attributes
    }

    /// 构造时抓取的操作名
    pub fn action_names(&self) -> &[String] {
        &self.actions
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// 读取属性值并转换类型
    pub fn attribute(&self, name: &str) -> AxResult<Value<A>> {
        let raw = self
            .api
            .attribute_value(&self.handle, name)
            .map_err(|e| self.log_failure("attribute", name, e))?;
        value::coerce(&self.api, raw)
    }

    /// 读取属性值，属性缺失或无值时返回 `None`
    pub fn optional_attribute(&self, name: &str) -> AxResult<Option<Value<A>>> {
        match self.attribute(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 读取字符串属性；非字符串值视为 `None`
    pub fn string_attribute(&self, name: &str) -> AxResult<Option<String>> {
        Ok(match self.optional_attribute(name)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    /// 属性是否可写
    pub fn is_settable(&self, name: &str) -> AxResult<bool> {
        self.api
            .is_attribute_settable(&self.handle, name)
            .map_err(|e| self.log_failure("is_attribute_settable", name, e))
    }

    /// 写入属性值
    ///
    /// 返回成功只表示目标进程接受了请求，不保证 UI 已同步更新。
    pub fn set_attribute(&self, name: &str, value: impl Into<Literal>) -> AxResult<()> {
        if !self.is_settable(name)? {
            return Err(self.log_failure("set_attribute", name, AxError::NotWritable(name.to_string())));
        }
        let value = value.into();
        debug!("set {} = {:?}", name, value);
        self.api
            .set_attribute_value(&self.handle, name, &value)
            .map_err(|e| self.log_failure("set_attribute", name, e))
    }

    /// 执行操作
    ///
    /// 返回成功只表示目标进程接受了请求。
    pub fn perform_action(&self, name: &str) -> AxResult<()> {
        debug!("perform {}", name);
        self.api
            .perform_action(&self.handle, name)
            .map_err(|e| self.log_failure("perform_action", name, e))
    }

    /// 所属进程 ID（记住首次成功的结果）
    ///
    /// 每次都经过原生层确认句柄仍有效，元素失效后返回 `InvalidReference`。
    pub fn pid(&self) -> AxResult<i32> {
        let pid = self
            .api
            .pid(&self.handle)
            .map_err(|e| self.log_failure("pid", "", e))?;
        Ok(*self.pid.get_or_init(|| pid))
    }

    // ===== 符号化请求 =====

    /// 将请求名解析为属性、操作或搜索（纯函数，只使用缓存的名称快照）
    pub fn resolve(&self, name: &str) -> Resolution {
        resolver::resolve(name, &self.attributes, &self.actions)
    }

    /// 只在属性阶段解析请求名
    pub fn resolve_attribute(&self, name: &str) -> Option<&str> {
        resolver::match_attribute(&MatchQuery::parse(name), &self.attributes)
    }

    /// 执行符号化请求
    ///
    /// `filter` 只在请求落入搜索阶段时使用。单数搜索无结果时返回
    /// [`AxError::UnknownRequest`]；复数搜索无结果时返回空列表。
    pub fn request(&self, name: &str, filter: Option<&Qualifier>) -> AxResult<Outcome<A>> {
        match self.resolve(name) {
            Resolution::Attribute(attr) => self.attribute(&attr).map(Outcome::Value),
            Resolution::Action(action) => {
                self.perform_action(&action)?;
                Ok(Outcome::Performed(action))
            }
            Resolution::Search { role, mode } => {
                let empty = Qualifier::new();
                let qualifier = filter.unwrap_or(&empty);
                match search::search(self, &role, qualifier, mode)? {
                    SearchResult::Single(Some(found)) => Ok(Outcome::Found(found)),
                    SearchResult::Single(None) => {
                        Err(self.log_failure("request", name, AxError::UnknownRequest(name.to_string())))
                    }
                    SearchResult::Multi(list) => Ok(Outcome::FoundAll(list)),
                }
            }
            Resolution::Unknown => {
                Err(self.log_failure("request", name, AxError::UnknownRequest(name.to_string())))
            }
        }
    }

    /// 通过属性名解析写入属性（不回退到操作或搜索）
    pub fn request_set(&self, name: &str, value: impl Into<Literal>) -> AxResult<()> {
        let attr = self
            .resolve_attribute(name)
            .ok_or_else(|| AxError::UnknownRequest(name.to_string()))?
            .to_string();
        self.set_attribute(&attr, value)
    }

    /// 按角色搜索第一个匹配的后代
    pub fn find(&self, role: &str, qualifier: &Qualifier) -> AxResult<Option<Element<A>>> {
        match search::search(self, role, qualifier, SearchMode::Single)? {
            SearchResult::Single(found) => Ok(found),
            SearchResult::Multi(list) => Ok(list.into_vec().into_iter().next()),
        }
    }

    /// 按角色搜索全部匹配的后代
    pub fn find_all(&self, role: &str, qualifier: &Qualifier) -> AxResult<ElementList<A>> {
        match search::search(self, role, qualifier, SearchMode::Multi)? {
            SearchResult::Multi(list) => Ok(list),
            SearchResult::Single(found) => Ok(found.into_iter().collect()),
        }
    }

    // ===== 常用属性 =====

    // 以下读取器把所有错误（包括 `InvalidReference`）都当作无值，
    // 需要区分错误时使用 `string_attribute`。

    pub fn role(&self) -> Option<String> {
        self.string_attribute(ROLE).ok().flatten()
    }

    pub fn subrole(&self) -> Option<String> {
        self.string_attribute(SUBROLE).ok().flatten()
    }

    pub fn title(&self) -> Option<String> {
        self.string_attribute(TITLE).ok().flatten()
    }

    pub fn identifier(&self) -> Option<String> {
        self.string_attribute(IDENTIFIER).ok().flatten()
    }

    /// 是否暴露子元素属性
    pub fn has_children_attribute(&self) -> bool {
        self.has_attribute(CHILDREN_ATTRIBUTE)
    }

    /// 直接子元素，按原生顺序
    ///
    /// 没有子元素属性或属性无值时返回空列表。
    pub fn children(&self) -> AxResult<Vec<Element<A>>> {
        if !self.has_children_attribute() {
            return Ok(Vec::new());
        }
        match self.optional_attribute(CHILDREN_ATTRIBUTE)? {
            Some(Value::Elements(list)) => Ok(list.into_vec()),
            Some(Value::Element(single)) => Ok(vec![single]),
            _ => Ok(Vec::new()),
        }
    }

    pub fn parent(&self) -> AxResult<Option<Element<A>>> {
        Ok(self
            .optional_attribute(PARENT)?
            .and_then(Value::into_element))
    }

    /// 屏幕坐标框架（AXPosition + AXSize）
    pub fn frame(&self) -> AxResult<Rect> {
        let origin = self
            .attribute(POSITION)?
            .as_point()
            .ok_or_else(|| AxError::Other(format!("{} is not a point", POSITION)))?;
        let size = self
            .attribute(SIZE)?
            .as_size()
            .ok_or_else(|| AxError::Other(format!("{} is not a size", SIZE)))?;
        Ok(Rect { origin, size })
    }

    /// 元素中心点（屏幕坐标），供输入模拟使用
    pub fn center(&self) -> AxResult<Point> {
        self.frame().map(|f| f.center())
    }

    /// 深度优先遍历（每次调用都是一次全新的遍历）
    pub fn depth_first(&self) -> DepthFirst<'_, A> {
        DepthFirst::new(self)
    }

    /// 人类可读摘要：角色加上给定属性中有值的部分
    pub fn describe(&self, attributes: &[String]) -> String {
        let mut output = self.role().unwrap_or_else(|| "?".to_string());
        for name in attributes {
            if !self.has_attribute(name) {
                continue;
            }
            if let Ok(Some(value)) = self.optional_attribute(name) {
                let text = value.to_string();
                if text.is_empty() {
                    continue;
                }
                let key = resolver::strip_namespace(name);
                output.push_str(&format!(" {}=\"{}\"", key, text));
            }
        }
        output
    }

    /// 默认摘要：角色、标题、值、标识符
    pub fn summary(&self) -> String {
        let defaults = [TITLE, VALUE, IDENTIFIER].map(String::from);
        self.describe(&defaults)
    }

    /// 获取元素树摘要（用于调试）
    pub fn dump_tree(&self, max_depth: usize) -> AxResult<String> {
        let mut output = String::new();
        for visit in self.depth_first().max_depth(max_depth) {
            let visit = visit?;
            let indent = "  ".repeat(visit.depth);
            output.push_str(&format!("{}{}\n", indent, visit.element.summary()));
        }
        Ok(output)
    }

    /// 记录失败的操作、错误与该元素可用的名称，返回原错误
    fn log_failure(&self, operation: &str, name: &str, error: AxError) -> AxError {
        debug!(
            "{}({}) failed on {:?}: {} (attributes: {:?}, actions: {:?})",
            operation, name, self.handle, error, self.attributes, self.actions
        );
        error
    }
}

impl<A: Accessibility> fmt::Debug for Element<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("handle", &self.handle)
            .field("attributes", &self.attributes.len())
            .field("actions", &self.actions.len())
            .finish()
    }
}

fn dedup_in_order(names: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    names.retain(|n| seen.insert(n.clone()));
}
