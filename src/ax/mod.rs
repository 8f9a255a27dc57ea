//! 辅助功能元素查询引擎
//!
//! 用符号化名称访问 UI 元素的属性与操作，并在元素树中搜索后代。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use axquery::ax::{MemoryTree, Outcome, Qualifier};
//! use std::path::Path;
//! use std::rc::Rc;
//!
//! let tree = Rc::new(MemoryTree::load(Path::new("window.json"))?);
//! let window = tree.root()?;
//!
//! // "title" 解析为 AXTitle
//! println!("{:?}", window.request("title", None)?);
//!
//! // 未匹配属性与操作时退化为后代搜索
//! let filter = Qualifier::new().with("title", "OK");
//! if let Outcome::Found(button) = window.request("button", Some(&filter))? {
//!     button.perform_action("AXPress")?;
//! }
//! # Ok::<(), axquery::ax::AxError>(())
//! ```

mod element;
mod error;
mod graph;
mod input;
mod list;
mod memory;
mod platform;
mod qualifier;
mod resolver;
mod search;
mod traverse;
mod value;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(test)]
mod tests;

// 公开导出
pub use element::{Element, Outcome};
pub use error::{AxError, AxResult};
pub use graph::{GraphBuilder, UiGraph};
pub use input::{click_element, drag_element_to, move_and_click, move_to_element, type_into, InputDriver};
pub use list::ElementList;
pub use memory::{AttrValue, MemoryTree, NodeId, NodeSpec, Snapshot};
pub use platform::Accessibility;
pub use qualifier::{Expected, Qualifier};
pub use resolver::{normalize, resolve, role_key, singularize, MatchQuery, Resolution};
pub use search::{search, SearchMode, SearchResult};
pub use traverse::{DepthFirst, Node, Visit};
pub use value::{coerce, BoxedKind, Literal, Point, Range, RawValue, Rect, Size, Value};
