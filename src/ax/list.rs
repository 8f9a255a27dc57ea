//! 元素列表
//!
//! 复数搜索与元素数组属性的结果类型，提供按名称批量读取与批量操作。

use super::element::Element;
use super::error::{AxError, AxResult};
use super::platform::Accessibility;
use super::resolver::{singularize, MatchQuery};
use super::value::Value;
use std::ops::Deref;

pub struct ElementList<A: Accessibility> {
    elements: Vec<Element<A>>,
}

impl<A: Accessibility> ElementList<A> {
    pub fn into_vec(self) -> Vec<Element<A>> {
        self.elements
    }

    /// 批量读取属性：`titles` 对每个元素解析 `title`
    ///
    /// 任一元素无法解析该名称时返回 [`AxError::UnknownRequest`]。
    pub fn collect_attribute(&self, name: &str) -> AxResult<Vec<Value<A>>> {
        let singular = singular_request(name);
        self.elements
            .iter()
            .map(|element| {
                let attr = element
                    .resolve_attribute(&singular)
                    .ok_or_else(|| AxError::UnknownRequest(name.to_string()))?
                    .to_string();
                element.attribute(&attr)
            })
            .collect()
    }

    /// 对每个元素执行同名操作，遇到第一个失败即停止
    pub fn perform_action(&self, action: &str) -> AxResult<()> {
        for element in &self.elements {
            element.perform_action(action)?;
        }
        Ok(())
    }

    /// 每个元素的摘要
    pub fn summaries(&self) -> Vec<String> {
        self.elements.iter().map(Element::summary).collect()
    }
}

/// 复数请求名还原为单数，保留谓词标记
fn singular_request(name: &str) -> String {
    let query = MatchQuery::parse(name);
    if query.is_predicate {
        name.to_string()
    } else {
        singularize(&query.stem)
    }
}

impl<A: Accessibility> Default for ElementList<A> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<A: Accessibility> From<Vec<Element<A>>> for ElementList<A> {
    fn from(elements: Vec<Element<A>>) -> Self {
        Self { elements }
    }
}

impl<A: Accessibility> FromIterator<Element<A>> for ElementList<A> {
    fn from_iter<I: IntoIterator<Item = Element<A>>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<A: Accessibility> Deref for ElementList<A> {
    type Target = [Element<A>];

    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

impl<A: Accessibility> IntoIterator for ElementList<A> {
    type Item = Element<A>;
    type IntoIter = std::vec::IntoIter<Element<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, A: Accessibility> IntoIterator for &'a ElementList<A> {
    type Item = &'a Element<A>;
    type IntoIter = std::slice::Iter<'a, Element<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
