//! 后代元素搜索
//!
//! 对根元素的后代做先序深度优先遍历（根本身不参与匹配），使用显式栈。
//! 子元素顺序沿用原生顺序，通常是从上到下、从左到右，但这只是平台惯例。
//! 原生树按平台约定无环，这里不做环检测。

use super::element::{Element, ROLE, SUBROLE};
use super::error::AxResult;
use super::list::ElementList;
use super::platform::Accessibility;
use super::qualifier::Qualifier;
use super::resolver::role_key;
use tracing::debug;

/// 搜索模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// 返回第一个匹配，命中即停止
    Single,
    /// 返回全部匹配，总是遍历整棵子树
    Multi,
}

/// 搜索结果
pub enum SearchResult<A: Accessibility> {
    Single(Option<Element<A>>),
    Multi(ElementList<A>),
}

impl<A: Accessibility> SearchResult<A> {
    pub fn len(&self) -> usize {
        match self {
            SearchResult::Single(found) => usize::from(found.is_some()),
            SearchResult::Multi(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 按角色与过滤条件搜索后代
///
/// `role` 可以是原生角色名（`AXButton`）或请求名（`button`、`buttons`），
/// 比较前统一为单数、去命名空间的小写形式。后代的角色或子角色与之相等，
/// 且满足 `qualifier`，即为匹配。
pub fn search<A: Accessibility>(
    root: &Element<A>,
    role: &str,
    qualifier: &Qualifier,
    mode: SearchMode,
) -> AxResult<SearchResult<A>> {
    let key = role_key(role);
    debug!("search role={} mode={:?} constraints={}", key, mode, qualifier.len());

    let mut stack = root.children()?;
    stack.reverse();
    let mut found = Vec::new();

    while let Some(node) = stack.pop() {
        if is_match(&node, &key, qualifier)? {
            if mode == SearchMode::Single {
                return Ok(SearchResult::Single(Some(node)));
            }
            push_children(&mut stack, &node)?;
            found.push(node);
            continue;
        }
        push_children(&mut stack, &node)?;
    }

    debug!("search role={} finished with {} matches", key, found.len());
    Ok(match mode {
        SearchMode::Single => SearchResult::Single(None),
        SearchMode::Multi => SearchResult::Multi(ElementList::from(found)),
    })
}

/// 子元素逆序入栈，保证按原生顺序出栈
fn push_children<A: Accessibility>(stack: &mut Vec<Element<A>>, node: &Element<A>) -> AxResult<()> {
    let mut children = node.children()?;
    children.reverse();
    stack.extend(children);
    Ok(())
}

fn is_match<A: Accessibility>(node: &Element<A>, key: &str, qualifier: &Qualifier) -> AxResult<bool> {
    let role_matches = match node.string_attribute(ROLE)? {
        Some(role) if role_key(&role) == key => true,
        _ if node.has_attribute(SUBROLE) => node
            .string_attribute(SUBROLE)?
            .map_or(false, |subrole| role_key(&subrole) == key),
        _ => false,
    };
    if !role_matches {
        return Ok(false);
    }
    qualifier.matches(node)
}
