//! 符号化请求名解析
//!
//! 将 `title`、`show_menu`、`application_running?`、`buttons` 这类请求名
//! 按固定顺序解析为属性、操作或树搜索：
//!
//! 1. 属性：去掉 `AX` 前缀并小写后包含请求词干的属性名，多个候选取最短者
//! 2. 操作：同样的规则匹配操作名，取第一个命中者
//! 3. 搜索：元素有子元素属性时，请求视为按角色搜索，复数形式返回全部匹配
//! 4. 否则为未知请求
//!
//! 请求名本身可以带 `AX` 前缀：`AXTitle`、`axtitle` 与 `title` 解析结果相同。
//!
//! 前三个阶段未命中不是错误，只是进入下一阶段的信号。
//! "最短者胜出"是经验规则：较长的名称通常是同一概念的更具体变体
//! （如 `AXTitle` 与 `AXTitleUIElement`）。
//!
//! 匹配按子串进行，属性阶段又先于搜索阶段，因此属性名中含有某个角色名时
//! 会遮蔽对该角色的搜索。例如 macOS 窗口带有 `AXCloseButton`、`AXZoomButton`，
//! 对窗口请求 `button` 会得到属性值而不是搜索结果，此时传入的过滤条件
//! 不起作用，也不会报错。需要搜索时用复数（`buttons`）或直接调用 `find`。

use super::search::SearchMode;

/// 属性名命名空间前缀
pub const NAMESPACE_PREFIX: &str = "AX";

/// 谓词请求的结尾标记
pub const PREDICATE_MARKER: char = '?';

/// 谓词属性在去掉命名空间后的前缀（如 `AXIsApplicationRunning`）
const PREDICATE_PREFIX: &str = "is";

/// 子元素属性名
pub const CHILDREN_ATTRIBUTE: &str = "AXChildren";

/// 由请求名派生的匹配条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    /// 小写、去掉分隔符与谓词标记后的词干
    pub stem: String,
    pub is_predicate: bool,
    pub is_plural: bool,
}

impl MatchQuery {
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        let (body, is_predicate) = match trimmed.strip_suffix(PREDICATE_MARKER) {
            Some(body) => (body, true),
            None => (trimmed, false),
        };
        let stem = normalize(strip_request_namespace(body));
        let is_plural = !is_predicate && singularize(&stem) != stem;
        Self {
            stem,
            is_predicate,
            is_plural,
        }
    }

    /// 单数形式的词干（搜索角色时使用）
    pub fn singular(&self) -> String {
        singularize(&self.stem)
    }

    /// 是否匹配某个原生名称
    fn matches(&self, native: &str) -> bool {
        // 忽略大小写的完整名称（`axtitle` 对 `AXTitle`）
        if normalize(native) == self.stem {
            return !self.is_predicate || strip_namespace(native).starts_with(PREDICATE_PREFIX);
        }
        let stripped = strip_namespace(native);
        if self.is_predicate {
            stripped.strip_prefix(PREDICATE_PREFIX).map_or(false, |rest| {
                !rest.is_empty() && (rest.contains(&self.stem) || stripped == self.stem)
            })
        } else {
            stripped.contains(&self.stem)
        }
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 命中的原生属性名
    Attribute(String),
    /// 命中的原生操作名
    Action(String),
    /// 按角色搜索后代元素（角色为请求词干，搜索时还原为单数）
    Search { role: String, mode: SearchMode },
    Unknown,
}

/// 小写并去掉 `_`、`-`、空白
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 去掉 `AX` 前缀并小写
pub fn strip_namespace(native: &str) -> String {
    native
        .strip_prefix(NAMESPACE_PREFIX)
        .unwrap_or(native)
        .to_lowercase()
}

/// 去掉请求名中原生写法的 `AX` 前缀（`AXTitle` → `Title`）
///
/// 只在前缀后紧跟大写字母时去掉，`axis` 这类普通单词保持不变。
fn strip_request_namespace(name: &str) -> &str {
    match name.strip_prefix(NAMESPACE_PREFIX) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// 英文复数还原（只处理控件角色名中出现的规则变化）
pub fn singularize(word: &str) -> String {
    if let Some(base) = word.strip_suffix("ies") {
        if !base.is_empty() {
            return format!("{}y", base);
        }
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if word.len() > suffix.len() && word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(base) if !base.is_empty() && !base.ends_with('s') => base.to_string(),
        _ => word.to_string(),
    }
}

/// 搜索用的角色键：`AXCheckBox`、`check_boxes`、`checkbox` 都得到 `checkbox`
pub fn role_key(role: &str) -> String {
    let stripped = role.strip_prefix(NAMESPACE_PREFIX).unwrap_or(role);
    singularize(&normalize(stripped))
}

/// 在属性名中查找匹配项，多个候选时取去前缀后最短者，等长时取先出现者
pub fn match_attribute<'a>(query: &MatchQuery, names: &'a [String]) -> Option<&'a str> {
    if query.stem.is_empty() {
        return None;
    }
    names
        .iter()
        .filter(|name| query.matches(name))
        .min_by_key(|name| strip_namespace(name).len())
        .map(String::as_str)
}

/// 在操作名中查找匹配项，取第一个命中者
///
/// 谓词请求不匹配操作。
pub fn match_action<'a>(query: &MatchQuery, names: &'a [String]) -> Option<&'a str> {
    if query.stem.is_empty() || query.is_predicate {
        return None;
    }
    names
        .iter()
        .find(|name| query.matches(name))
        .map(String::as_str)
}

/// 按 属性 → 操作 → 搜索 的顺序解析请求名
pub fn resolve(name: &str, attributes: &[String], actions: &[String]) -> Resolution {
    let query = MatchQuery::parse(name);

    if let Some(attr) = match_attribute(&query, attributes) {
        return Resolution::Attribute(attr.to_string());
    }

    if let Some(action) = match_action(&query, actions) {
        return Resolution::Action(action.to_string());
    }

    let has_children = attributes.iter().any(|a| a == CHILDREN_ATTRIBUTE);
    if has_children && !query.is_predicate && !query.stem.is_empty() {
        let mode = if query.is_plural {
            SearchMode::Multi
        } else {
            SearchMode::Single
        };
        return Resolution::Search {
            role: query.stem,
            mode,
        };
    }

    Resolution::Unknown
}
