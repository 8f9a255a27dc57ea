//! 内存中的 UI 树后端
//!
//! 用 JSON 快照描述一棵 UI 树，实现与 macOS 后端相同的 [`Accessibility`]
//! 接口。可用 [`Snapshot::capture`] 从任意后端的真实元素抓取快照，
//! 之后在任何平台上离线查询、生成图；单元测试也基于它。
//!
//! 快照格式：
//!
//! ```json
//! {
//!   "pid": 42,
//!   "root": {
//!     "attributes": { "AXRole": "AXWindow", "AXTitle": "Main" },
//!     "actions": ["AXRaise"],
//!     "children": [
//!       { "attributes": { "AXRole": "AXButton", "AXTitle": "OK" }, "actions": ["AXPress"] }
//!     ]
//!   }
//! }
//! ```
//!
//! `AXChildren` 与 `AXParent` 由树结构自动生成，无需写入快照。

use super::element::{Element, PARENT, POSITION, SIZE};
use super::error::{AxError, AxResult};
use super::platform::Accessibility;
use super::resolver::CHILDREN_ATTRIBUTE;
use super::value::{Literal, Point, RawValue, Rect, Value};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// 快照中的属性值
///
/// `List` 必须排在前面：几何字面值也接受 `[x, y]` 形式的数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    List(Vec<Literal>),
    Literal(Literal),
}

impl From<Literal> for AttrValue {
    fn from(literal: Literal) -> Self {
        AttrValue::Literal(literal)
    }
}

/// 快照中的一个节点
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    /// 可写属性名
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settable: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// 指定角色的节点
    pub fn new(role: &str) -> Self {
        Self::default().attr("AXRole", role)
    }

    pub fn attr(mut self, name: &str, value: impl Into<Literal>) -> Self {
        self.attributes
            .insert(name.to_string(), AttrValue::Literal(value.into()));
        self
    }

    /// 列表属性
    pub fn list(mut self, name: &str, items: Vec<Literal>) -> Self {
        self.attributes.insert(name.to_string(), AttrValue::List(items));
        self
    }

    /// 可写属性
    pub fn settable_attr(mut self, name: &str, value: impl Into<Literal>) -> Self {
        self.settable.push(name.to_string());
        self.attr(name, value)
    }

    pub fn action(mut self, name: &str) -> Self {
        self.actions.push(name.to_string());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// 设置 AXPosition 与 AXSize
    pub fn frame(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        let rect = Rect::new(x, y, width, height);
        self.attr(POSITION, rect.origin).attr(SIZE, rect.size)
    }
}

/// 整棵树的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pid: i32,
    pub root: NodeSpec,
}

impl Snapshot {
    pub fn from_json(json: &str) -> AxResult<Self> {
        serde_json::from_str(json).map_err(|e| AxError::Other(format!("invalid snapshot: {}", e)))
    }

    pub fn to_json(&self) -> AxResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AxError::Other(format!("snapshot encode failed: {}", e)))
    }

    /// 从文件加载
    pub fn load(path: &Path) -> AxResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AxError::Other(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// 抓取 `root` 子树的快照
    ///
    /// 只保存可表示为字面值的属性；元素引用类属性（除树结构外）被丢弃。
    pub fn capture<A: Accessibility>(root: &Element<A>, max_depth: usize) -> AxResult<Self> {
        let pid = root.pid()?;
        let mut path: Vec<NodeSpec> = Vec::new();

        for visit in root.depth_first().max_depth(max_depth) {
            let visit = visit?;
            fold_path(&mut path, visit.depth);
            path.push(capture_node(&visit.element)?);
        }
        fold_path(&mut path, 1);

        let root = path.pop().unwrap_or_default();
        info!("Captured snapshot of pid {}", pid);
        Ok(Self { pid, root })
    }
}

/// 把深度 >= `depth` 的节点依次挂到其父节点上
fn fold_path(path: &mut Vec<NodeSpec>, depth: usize) {
    while path.len() > depth.max(1) {
        if let Some(done) = path.pop() {
            if let Some(parent) = path.last_mut() {
                parent.children.push(done);
            }
        }
    }
}

fn capture_node<A: Accessibility>(element: &Element<A>) -> AxResult<NodeSpec> {
    let mut spec = NodeSpec::default();
    for name in element.attribute_names() {
        if name == CHILDREN_ATTRIBUTE || name == PARENT {
            continue;
        }
        match element.optional_attribute(name) {
            Ok(Some(value)) => {
                if let Some(attr) = attr_value_of(&value) {
                    spec.attributes.insert(name.clone(), attr);
                    if element.is_settable(name).unwrap_or(false) {
                        spec.settable.push(name.clone());
                    }
                }
            }
            Ok(None) => {}
            Err(AxError::InvalidReference) => return Err(AxError::InvalidReference),
            Err(e) => debug!("capture: skipping {}: {}", name, e),
        }
    }
    spec.actions = element.action_names().to_vec();
    Ok(spec)
}

fn attr_value_of<A: Accessibility>(value: &Value<A>) -> Option<AttrValue> {
    let literal = match value {
        Value::String(s) => Literal::String(s.clone()),
        Value::Integer(i) => Literal::Integer(*i),
        Value::Float(f) => Literal::Float(*f),
        Value::Boolean(b) => Literal::Boolean(*b),
        Value::Point(p) => Literal::Point(*p),
        Value::Size(s) => Literal::Size(*s),
        Value::Rect(r) => Literal::Rect(*r),
        Value::Range(r) => Literal::Range(*r),
        Value::Array(items) => {
            return Some(AttrValue::List(items.iter().filter_map(literal_of_raw).collect()))
        }
        Value::Element(_) | Value::Elements(_) | Value::Boxed { .. } | Value::Other(_) => return None,
    };
    Some(AttrValue::Literal(literal))
}

fn literal_of_raw<H>(raw: &RawValue<H>) -> Option<Literal> {
    match raw {
        RawValue::String(s) => Some(Literal::String(s.clone())),
        RawValue::Integer(i) => Some(Literal::Integer(*i)),
        RawValue::Float(f) => Some(Literal::Float(*f)),
        RawValue::Boolean(b) => Some(Literal::Boolean(*b)),
        _ => None,
    }
}

/// 内存树中的节点句柄
#[derive(Debug, PartialEq, Eq)]
pub struct NodeId(usize);

impl NodeId {
    /// 节点在先序遍历中的序号（根为 0）
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct NodeState {
    attributes: Vec<(String, AttrValue)>,
    actions: Vec<String>,
    settable: Vec<String>,
    children: Vec<usize>,
    parent: Option<usize>,
    valid: bool,
}

impl NodeState {
    fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn frame(&self) -> Option<Rect> {
        match (self.get(POSITION), self.get(SIZE)) {
            (Some(AttrValue::Literal(Literal::Point(origin))), Some(AttrValue::Literal(Literal::Size(size)))) => {
                Some(Rect {
                    origin: *origin,
                    size: *size,
                })
            }
            _ => None,
        }
    }
}

/// 内存中的 UI 树
#[derive(Debug)]
pub struct MemoryTree {
    pid: i32,
    nodes: RefCell<Vec<NodeState>>,
    performed: RefCell<Vec<(usize, String)>>,
    reads: Cell<usize>,
}

impl MemoryTree {
    /// 由节点描述构建，节点按先序编号
    pub fn new(pid: i32, root: &NodeSpec) -> Self {
        let mut nodes: Vec<NodeState> = Vec::new();
        let mut stack: Vec<(&NodeSpec, Option<usize>)> = vec![(root, None)];

        while let Some((spec, parent)) = stack.pop() {
            let id = nodes.len();
            nodes.push(NodeState {
                attributes: spec
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                actions: spec.actions.clone(),
                settable: spec.settable.clone(),
                children: Vec::new(),
                parent,
                valid: true,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }
            stack.extend(spec.children.iter().rev().map(|child| (child, Some(id))));
        }

        Self {
            pid,
            nodes: RefCell::new(nodes),
            performed: RefCell::new(Vec::new()),
            reads: Cell::new(0),
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.pid, &snapshot.root)
    }

    /// 从快照文件加载
    pub fn load(path: &Path) -> AxResult<Self> {
        let snapshot = Snapshot::load(path)?;
        let tree = Self::from_snapshot(&snapshot);
        info!("Loaded snapshot {} ({} nodes)", path.display(), tree.len());
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 根元素
    pub fn root(self: &Rc<Self>) -> AxResult<Element<Self>> {
        self.element(0)
    }

    /// 按先序序号取元素
    pub fn element(self: &Rc<Self>, index: usize) -> AxResult<Element<Self>> {
        if index >= self.len() {
            return Err(AxError::InvalidReference);
        }
        Element::new(Rc::clone(self), NodeId(index))
    }

    /// 使节点及其整棵子树失效（模拟窗口关闭）
    pub fn invalidate(&self, handle: &NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let mut stack = vec![handle.0];
        while let Some(id) = stack.pop() {
            if let Some(node) = nodes.get_mut(id) {
                node.valid = false;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// 已执行的操作 (节点序号, 操作名)
    pub fn performed_actions(&self) -> Vec<(usize, String)> {
        self.performed.borrow().clone()
    }

    /// 属性读取次数（每次读取对应真实后端的一次往返）
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn reset_read_count(&self) {
        self.reads.set(0);
    }

    fn with_node<T>(&self, handle: &NodeId, f: impl FnOnce(&NodeState) -> AxResult<T>) -> AxResult<T> {
        let nodes = self.nodes.borrow();
        match nodes.get(handle.0) {
            Some(node) if node.valid => f(node),
            _ => Err(AxError::InvalidReference),
        }
    }
}

impl Accessibility for MemoryTree {
    type Handle = NodeId;

    fn attribute_names(&self, handle: &NodeId) -> AxResult<Vec<String>> {
        self.with_node(handle, |node| {
            let mut names: Vec<String> = node.attributes.iter().map(|(n, _)| n.clone()).collect();
            names.push(CHILDREN_ATTRIBUTE.to_string());
            if node.parent.is_some() {
                names.push(PARENT.to_string());
            }
            Ok(names)
        })
    }

    fn action_names(&self, handle: &NodeId) -> AxResult<Vec<String>> {
        self.with_node(handle, |node| Ok(node.actions.clone()))
    }

    fn attribute_value(&self, handle: &NodeId, name: &str) -> AxResult<RawValue<NodeId>> {
        self.reads.set(self.reads.get() + 1);
        self.with_node(handle, |node| {
            if name == CHILDREN_ATTRIBUTE {
                return Ok(RawValue::Array(
                    node.children.iter().map(|&id| RawValue::Element(NodeId(id))).collect(),
                ));
            }
            if name == PARENT {
                return node
                    .parent
                    .map(|id| RawValue::Element(NodeId(id)))
                    .ok_or_else(|| AxError::NoValue(name.to_string()));
            }
            match node.get(name) {
                Some(AttrValue::Literal(literal)) => Ok(literal.to_raw()),
                Some(AttrValue::List(items)) => Ok(RawValue::Array(items.iter().map(Literal::to_raw).collect())),
                None => Err(AxError::AttributeUnsupported(name.to_string())),
            }
        })
    }

    fn set_attribute_value(&self, handle: &NodeId, name: &str, value: &Literal) -> AxResult<()> {
        let mut nodes = self.nodes.borrow_mut();
        let node = match nodes.get_mut(handle.0) {
            Some(node) if node.valid => node,
            _ => return Err(AxError::InvalidReference),
        };
        let slot = node
            .attributes
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| AxError::AttributeUnsupported(name.to_string()))?;
        if let AttrValue::Literal(current) = slot {
            if current.kind() != value.kind() {
                return Err(AxError::IllegalArgument);
            }
        }
        *slot = AttrValue::Literal(value.clone());
        Ok(())
    }

    fn is_attribute_settable(&self, handle: &NodeId, name: &str) -> AxResult<bool> {
        self.with_node(handle, |node| {
            if node.get(name).is_none() {
                return Err(AxError::AttributeUnsupported(name.to_string()));
            }
            Ok(node.settable.iter().any(|s| s == name))
        })
    }

    fn perform_action(&self, handle: &NodeId, name: &str) -> AxResult<()> {
        self.with_node(handle, |node| {
            if node.actions.iter().any(|a| a == name) {
                Ok(())
            } else {
                Err(AxError::ActionUnsupported(name.to_string()))
            }
        })?;
        self.performed.borrow_mut().push((handle.0, name.to_string()));
        Ok(())
    }

    fn pid(&self, handle: &NodeId) -> AxResult<i32> {
        self.with_node(handle, |_| Ok(self.pid))
    }

    fn element_at_point(&self, x: f64, y: f64) -> AxResult<NodeId> {
        let point = Point::new(x, y);
        let nodes = self.nodes.borrow();
        // 先序序号越大越靠上层（后代与后出现的兄弟覆盖在前者之上）
        nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.valid && node.frame().map_or(false, |f| f.contains(point)))
            .map(|(id, _)| NodeId(id))
            .ok_or_else(|| AxError::NoValue(format!("element at ({}, {})", x, y)))
    }

    fn application(&self, pid: i32) -> AxResult<NodeId> {
        if pid != self.pid {
            return Err(AxError::InvalidReference);
        }
        Ok(NodeId(0))
    }
}
