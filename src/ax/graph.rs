//! UI 树有向图
//!
//! 消费一次完整的深度优先遍历：每个访问到的元素一个节点，每对直接父子关系
//! 一条边（标签为子元素在父元素中的序号），输出 Graphviz DOT 文本供外部布局工具使用。

use super::element::{Element, IDENTIFIER, TITLE, VALUE};
use super::error::AxResult;
use super::platform::Accessibility;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

/// 图构建器
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    label_attributes: Vec<String>,
    max_depth: Option<usize>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            label_attributes: [TITLE, VALUE, IDENTIFIER].map(String::from).to_vec(),
            max_depth: None,
        }
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 节点标签中除角色外附带的属性
    pub fn label_attributes(mut self, attributes: Vec<String>) -> Self {
        self.label_attributes = attributes;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// 遍历 `root` 的子树并构建图
    pub fn build<A: Accessibility>(&self, root: &Element<A>) -> AxResult<UiGraph> {
        let mut graph = DiGraph::new();
        // path[d] 为当前路径上深度 d 的节点及其已连接的子节点数
        let mut path: Vec<(NodeIndex, usize)> = Vec::new();

        let traversal = match self.max_depth {
            Some(max) => root.depth_first().max_depth(max),
            None => root.depth_first(),
        };

        for visit in traversal {
            let visit = visit?;
            let index = graph.add_node(visit.element.describe(&self.label_attributes));
            path.truncate(visit.depth);
            if let Some((parent, seen)) = path.last_mut() {
                graph.add_edge(*parent, index, *seen);
                *seen += 1;
            }
            path.push((index, 0));
        }

        debug!(
            "Built UI graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(UiGraph { graph })
    }
}

/// 构建完成的 UI 树图
#[derive(Debug, Clone)]
pub struct UiGraph {
    graph: DiGraph<String, usize>,
}

impl UiGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// 按遍历顺序排列的节点标签
    pub fn labels(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    /// 全部边，以 (父标签下标, 子标签下标) 表示
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| (e.source().index(), e.target().index()))
            .collect()
    }

    pub fn inner(&self) -> &DiGraph<String, usize> {
        &self.graph
    }

    /// Graphviz DOT 文本
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}
