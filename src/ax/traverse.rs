//! 深度优先遍历
//!
//! 惰性的先序遍历，产出 (元素, 深度)，根元素深度为 0。使用显式栈，
//! 深层树不会耗尽调用栈；每访问一个节点才读取它的子元素列表。

use super::element::Element;
use super::error::{AxError, AxResult};
use super::platform::Accessibility;
use std::ops::Deref;

/// 遍历中的节点：根元素是借用的，后代元素由遍历创建并移交给调用方
pub enum Node<'a, A: Accessibility> {
    Root(&'a Element<A>),
    Descendant(Element<A>),
}

impl<'a, A: Accessibility> Node<'a, A> {
    /// 取得后代元素的所有权；根元素返回 `None`
    pub fn into_owned(self) -> Option<Element<A>> {
        match self {
            Node::Root(_) => None,
            Node::Descendant(element) => Some(element),
        }
    }
}

impl<'a, A: Accessibility> Deref for Node<'a, A> {
    type Target = Element<A>;

    fn deref(&self) -> &Self::Target {
        match self {
            Node::Root(element) => element,
            Node::Descendant(element) => element,
        }
    }
}

/// 一次访问
pub struct Visit<'a, A: Accessibility> {
    pub element: Node<'a, A>,
    /// 相对于遍历根的深度
    pub depth: usize,
}

/// 先序深度优先遍历器，由 [`Element::depth_first`] 创建
///
/// 读取某节点子元素失败时，先产出该节点，再产出错误，然后继续遍历其余兄弟节点。
pub struct DepthFirst<'a, A: Accessibility> {
    stack: Vec<(Node<'a, A>, usize)>,
    pending_error: Option<AxError>,
    max_depth: Option<usize>,
}

impl<'a, A: Accessibility> DepthFirst<'a, A> {
    pub fn new(root: &'a Element<A>) -> Self {
        Self {
            stack: vec![(Node::Root(root), 0)],
            pending_error: None,
            max_depth: None,
        }
    }

    /// 不展开深度达到 `max_depth` 的节点的子元素
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

impl<'a, A: Accessibility> Iterator for DepthFirst<'a, A> {
    type Item = AxResult<Visit<'a, A>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending_error.take() {
            return Some(Err(error));
        }

        let (node, depth) = self.stack.pop()?;

        if self.max_depth.map_or(true, |max| depth < max) {
            match node.children() {
                Ok(children) => {
                    let next_depth = depth + 1;
                    self.stack.extend(
                        children
                            .into_iter()
                            .rev()
                            .map(|child| (Node::Descendant(child), next_depth)),
                    );
                }
                Err(error) => self.pending_error = Some(error),
            }
        }

        Some(Ok(Visit {
            element: node,
            depth,
        }))
    }
}
