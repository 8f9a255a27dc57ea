//! ax 模块单元测试
//!
//! 除 `macos_tests` 外全部基于内存树后端，可在任何平台运行。
//! macOS 上需要辅助功能权限的测试被标记为 `#[ignore]`，
//! 可以使用 `cargo test -- --ignored` 运行。

use crate::ax::{
    coerce, resolve, role_key, singularize, AxError, AxResult, BoxedKind, Element, GraphBuilder, InputDriver,
    Literal, MatchQuery, MemoryTree, NodeSpec, Outcome, Point, Qualifier, RawValue, Rect, Resolution, SearchMode,
    Snapshot, Value,
};
use std::rc::Rc;
use std::time::Duration;

const PID: i32 = 42;

/// 测试用窗口：
///
/// ```text
/// 0 AXWindow "Main"
/// 1   AXGroup #toolbar
/// 2     AXButton "OK"      enabled
/// 3     AXButton "Cancel"  disabled
/// 4   AXTextField          AXValue/AXFocused 可写
/// 5   AXCheckBox "Remember" subrole AXToggle
/// ```
fn window_spec() -> NodeSpec {
    NodeSpec::new("AXWindow")
        .attr("AXTitle", "Main")
        .frame(0.0, 0.0, 800.0, 600.0)
        .action("AXRaise")
        .child(
            NodeSpec::new("AXGroup")
                .attr("AXIdentifier", "toolbar")
                .frame(0.0, 0.0, 800.0, 40.0)
                .child(
                    NodeSpec::new("AXButton")
                        .attr("AXTitle", "OK")
                        .attr("AXEnabled", true)
                        .frame(10.0, 10.0, 80.0, 20.0)
                        .action("AXPress"),
                )
                .child(
                    NodeSpec::new("AXButton")
                        .attr("AXTitle", "Cancel")
                        .attr("AXEnabled", false)
                        .frame(100.0, 10.0, 80.0, 20.0)
                        .action("AXPress"),
                ),
        )
        .child(
            NodeSpec::new("AXTextField")
                .settable_attr("AXFocused", false)
                .settable_attr("AXValue", "")
                .frame(10.0, 60.0, 200.0, 24.0),
        )
        .child(
            NodeSpec::new("AXCheckBox")
                .attr("AXSubrole", "AXToggle")
                .attr("AXTitle", "Remember")
                .attr("AXValue", 1),
        )
}

fn window() -> Rc<MemoryTree> {
    Rc::new(MemoryTree::new(PID, &window_spec()))
}

fn titles(elements: &[Element<MemoryTree>]) -> Vec<String> {
    elements.iter().map(|e| e.title().unwrap_or_default()).collect()
}

// ===== resolver.rs 测试 =====

#[cfg(test)]
mod resolver_tests {
    use super::*;
    use crate::ax::normalize;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Show_Menu"), "showmenu");
        assert_eq!(normalize(" title-ui element "), "titleuielement");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("buttons"), "button");
        assert_eq!(singularize("checkboxes"), "checkbox");
        assert_eq!(singularize("entries"), "entry");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("glass"), "glass");
        assert_eq!(singularize("button"), "button");
    }

    #[test]
    fn test_role_key_ignores_namespace_and_plural() {
        assert_eq!(role_key("AXCheckBox"), "checkbox");
        assert_eq!(role_key("check_boxes"), "checkbox");
        assert_eq!(role_key("Button"), role_key("AXButton"));
    }

    #[test]
    fn test_match_query_parse() {
        let q = MatchQuery::parse("enabled?");
        assert_eq!(q.stem, "enabled");
        assert!(q.is_predicate);
        assert!(!q.is_plural);

        let q = MatchQuery::parse("buttons");
        assert!(q.is_plural);
        assert_eq!(q.singular(), "button");

        assert!(!MatchQuery::parse("title").is_plural);
    }

    #[test]
    fn test_exact_attribute_match_case_insensitive() {
        let attrs = names(&["AXRole", "AXTitle", "AXChildren"]);
        assert_eq!(resolve("TITLE", &attrs, &[]), Resolution::Attribute("AXTitle".to_string()));
    }

    #[test]
    fn test_native_form_request_names() {
        let attrs = names(&["AXRole", "AXTitleUIElement", "AXTitle", "AXIsHidden", "AXHidden", "AXChildren"]);
        let actions = names(&["AXPress"]);
        assert_eq!(resolve("AXTitle", &attrs, &actions), Resolution::Attribute("AXTitle".to_string()));
        assert_eq!(resolve("axtitle", &attrs, &actions), Resolution::Attribute("AXTitle".to_string()));
        assert_eq!(resolve("AXRole", &attrs, &actions), Resolution::Attribute("AXRole".to_string()));
        assert_eq!(resolve("AXIsHidden?", &attrs, &actions), Resolution::Attribute("AXIsHidden".to_string()));
        assert_eq!(resolve("AXPress", &attrs, &actions), Resolution::Action("AXPress".to_string()));
        assert_eq!(
            resolve("AXButtons", &attrs, &actions),
            Resolution::Search {
                role: "buttons".to_string(),
                mode: SearchMode::Multi
            }
        );
    }

    #[test]
    fn test_namespace_only_stripped_before_uppercase() {
        assert_eq!(MatchQuery::parse("AXTitle").stem, "title");
        assert_eq!(MatchQuery::parse("axis").stem, "axis");
    }

    #[test]
    fn test_substring_attribute_shadows_search() {
        let attrs = names(&["AXCloseButton", "AXChildren"]);
        assert_eq!(resolve("button", &attrs, &[]), Resolution::Attribute("AXCloseButton".to_string()));
    }

    #[test]
    fn test_shortest_match_wins() {
        let attrs = names(&["AXTitleUIElement", "AXTitle"]);
        assert_eq!(resolve("title", &attrs, &[]), Resolution::Attribute("AXTitle".to_string()));

        let attrs = names(&["AXSubrole", "AXRole"]);
        assert_eq!(resolve("role", &attrs, &[]), Resolution::Attribute("AXRole".to_string()));
    }

    #[test]
    fn test_predicate_never_matches_plain_attribute() {
        let attrs = names(&["AXHidden", "AXIsHidden"]);
        assert_eq!(resolve("hidden?", &attrs, &[]), Resolution::Attribute("AXIsHidden".to_string()));
        assert_eq!(resolve("hidden", &attrs, &[]), Resolution::Attribute("AXHidden".to_string()));

        let attrs = names(&["AXHidden", "AXChildren"]);
        assert_eq!(resolve("hidden?", &attrs, &[]), Resolution::Unknown);
    }

    #[test]
    fn test_predicate_with_separators() {
        let attrs = names(&["AXIsApplicationRunning"]);
        assert_eq!(
            resolve("application_running?", &attrs, &[]),
            Resolution::Attribute("AXIsApplicationRunning".to_string())
        );
    }

    #[test]
    fn test_action_phase_after_attributes() {
        let attrs = names(&["AXTitle"]);
        let actions = names(&["AXShowMenu", "AXPress"]);
        assert_eq!(resolve("show_menu", &attrs, &actions), Resolution::Action("AXShowMenu".to_string()));
        assert_eq!(resolve("press", &attrs, &actions), Resolution::Action("AXPress".to_string()));
    }

    #[test]
    fn test_search_phase_requires_children() {
        let with_children = names(&["AXTitle", "AXChildren"]);
        assert_eq!(
            resolve("buttons", &with_children, &[]),
            Resolution::Search {
                role: "buttons".to_string(),
                mode: SearchMode::Multi
            }
        );
        assert_eq!(
            resolve("button", &with_children, &[]),
            Resolution::Search {
                role: "button".to_string(),
                mode: SearchMode::Single
            }
        );

        let leaf = names(&["AXTitle"]);
        assert_eq!(resolve("buttons", &leaf, &[]), Resolution::Unknown);
    }

    #[test]
    fn test_empty_request_is_unknown() {
        let attrs = names(&["AXTitle", "AXChildren"]);
        assert_eq!(resolve("", &attrs, &[]), Resolution::Unknown);
        assert_eq!(resolve("?", &attrs, &[]), Resolution::Unknown);
    }
}

// ===== value.rs 测试 =====

#[cfg(test)]
mod value_tests {
    use super::*;
    use crate::ax::NodeId;

    #[test]
    fn test_boxed_rect_round_trip() {
        let tree = window();
        let raw: RawValue<NodeId> = RawValue::boxed(BoxedKind::Rect, [1.0, 2.0, 3.0, 4.0]);
        let value = coerce(&tree, raw).unwrap();
        assert_eq!(value.as_rect(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_boxed_point_and_range() {
        let tree = window();
        let point = coerce(&tree, RawValue::<NodeId>::boxed(BoxedKind::Point, [5.0, 6.0, 0.0, 0.0])).unwrap();
        assert_eq!(point.as_point(), Some(Point::new(5.0, 6.0)));

        let range = coerce(&tree, RawValue::<NodeId>::boxed(BoxedKind::Range, [3.0, 7.0, 0.0, 0.0])).unwrap();
        assert!(matches!(range, Value::Range(r) if r.location == 3 && r.length == 7));
    }

    #[test]
    fn test_unknown_boxed_tag_passes_through() {
        let tree = window();
        let raw: RawValue<NodeId> = RawValue::Boxed {
            ordinal: 99,
            fields: [1.0, 0.0, 0.0, 0.0],
        };
        let value = coerce(&tree, raw).unwrap();
        assert!(matches!(value, Value::Boxed { ordinal: 99, .. }));
    }

    #[test]
    fn test_element_reference_is_wrapped() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let parent = ok.attribute("AXParent").unwrap().into_element().unwrap();
        assert_eq!(parent.identifier().as_deref(), Some("toolbar"));
    }

    #[test]
    fn test_children_array_becomes_element_list() {
        let tree = window();
        let root = tree.root().unwrap();
        let children = root.attribute("AXChildren").unwrap().into_elements().unwrap();
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn test_plain_array_passes_through() {
        let tree = window();
        let raw: RawValue<NodeId> = RawValue::Array(vec![RawValue::String("a".into()), RawValue::Integer(1)]);
        let value = coerce(&tree, raw).unwrap();
        assert!(matches!(value, Value::Array(ref items) if items.len() == 2));

        let empty: RawValue<NodeId> = RawValue::Array(Vec::new());
        let value = coerce(&tree, empty).unwrap();
        assert_eq!(value.into_elements().map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_scalars_pass_through() {
        let tree = window();
        assert_eq!(coerce(&tree, RawValue::<NodeId>::String("x".into())).unwrap().as_str(), Some("x"));
        assert_eq!(coerce(&tree, RawValue::<NodeId>::Boolean(true)).unwrap().as_bool(), Some(true));
        assert_eq!(coerce(&tree, RawValue::<NodeId>::Integer(3)).unwrap().as_f64(), Some(3.0));
    }

    #[test]
    fn test_matches_literal_numeric() {
        let tree = window();
        let value = coerce(&tree, RawValue::<NodeId>::Integer(1)).unwrap();
        assert!(value.matches_literal(&Literal::Integer(1)));
        assert!(value.matches_literal(&Literal::Float(1.0)));
        assert!(!value.matches_literal(&Literal::String("1".into())));
    }

    #[test]
    fn test_literal_from_json() {
        let point: Literal = serde_json::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
        assert_eq!(point, Literal::Point(Point::new(1.0, 2.0)));
        let flag: Literal = serde_json::from_str("true").unwrap();
        assert_eq!(flag, Literal::Boolean(true));
    }

    #[test]
    fn test_rect_center_and_contains() {
        let rect = Rect::new(10.0, 10.0, 80.0, 20.0);
        assert_eq!(rect.center(), Point::new(50.0, 20.0));
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(!rect.contains(Point::new(90.0, 10.0)));
    }
}

// ===== element.rs 测试 =====

#[cfg(test)]
mod element_tests {
    use super::*;

    /// 属性 {AXTitle, AXChildren}，操作 {AXPress}
    fn scenario() -> Rc<MemoryTree> {
        let spec = NodeSpec::default().attr("AXTitle", "Hello").action("AXPress");
        Rc::new(MemoryTree::new(PID, &spec))
    }

    #[test]
    fn test_scenario_names() {
        let tree = scenario();
        let element = tree.root().unwrap();
        assert_eq!(element.attribute_names(), ["AXTitle", "AXChildren"]);
        assert_eq!(element.action_names(), ["AXPress"]);
    }

    #[test]
    fn test_scenario_title() {
        let tree = scenario();
        let element = tree.root().unwrap();
        match element.request("title", None).unwrap() {
            Outcome::Value(value) => assert_eq!(value.as_str(), Some("Hello")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_scenario_native_title() {
        let tree = scenario();
        let element = tree.root().unwrap();
        for name in ["AXTitle", "axtitle"] {
            match element.request(name, None).unwrap() {
                Outcome::Value(value) => assert_eq!(value.as_str(), Some("Hello")),
                other => panic!("unexpected outcome for {}: {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_scenario_press() {
        let tree = scenario();
        let element = tree.root().unwrap();
        let outcome = element.request("press", None).unwrap();
        assert!(matches!(outcome, Outcome::Performed(ref a) if a == "AXPress"));
        assert_eq!(tree.performed_actions(), vec![(0, "AXPress".to_string())]);
    }

    #[test]
    fn test_scenario_plural_search_is_empty() {
        let tree = scenario();
        let element = tree.root().unwrap();
        match element.request("buttons", None).unwrap() {
            Outcome::FoundAll(list) => assert!(list.is_empty()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_scenario_unknown_request() {
        let tree = scenario();
        let element = tree.root().unwrap();
        let err = element.request("frobulate", None).unwrap_err();
        assert_eq!(err, AxError::UnknownRequest("frobulate".to_string()));
    }

    #[test]
    fn test_request_singular_search_with_filter() {
        let tree = window();
        let root = tree.root().unwrap();
        let filter = Qualifier::new().with("title", "Cancel");
        match root.request("button", Some(&filter)).unwrap() {
            Outcome::Found(button) => assert_eq!(button.title().as_deref(), Some("Cancel")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_request_shortest_attribute() {
        let tree = window();
        let checkbox = tree.element(5).unwrap();
        // role 同时匹配 AXRole 与 AXSubrole
        match checkbox.request("role", None).unwrap() {
            Outcome::Value(value) => assert_eq!(value.as_str(), Some("AXCheckBox")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_missing_attribute() {
        let tree = window();
        let button = tree.element(2).unwrap();
        let err = button.attribute("AXDescription").unwrap_err();
        assert!(matches!(err, AxError::AttributeUnsupported(_)));
        assert!(button.optional_attribute("AXDescription").unwrap().is_none());
    }

    #[test]
    fn test_set_attribute() {
        let tree = window();
        let field = tree.element(4).unwrap();
        field.set_attribute("AXValue", "hello").unwrap();
        assert_eq!(field.string_attribute("AXValue").unwrap().as_deref(), Some("hello"));

        field.request_set("value", "world").unwrap();
        assert_eq!(field.string_attribute("AXValue").unwrap().as_deref(), Some("world"));
    }

    #[test]
    fn test_request_set_native_name() {
        let tree = window();
        let field = tree.element(4).unwrap();
        field.request_set("AXValue", "typed").unwrap();
        assert_eq!(field.string_attribute("AXValue").unwrap().as_deref(), Some("typed"));
    }

    #[test]
    fn test_pid_fails_after_invalidation() {
        let tree = window();
        let app = Element::application(Rc::clone(&tree), PID).unwrap();
        assert_eq!(app.pid().unwrap(), PID);

        tree.invalidate(app.handle());
        assert_eq!(app.pid(), Err(AxError::InvalidReference));
        assert_eq!(app.attribute("AXTitle").unwrap_err(), AxError::InvalidReference);
    }

    #[test]
    fn test_set_attribute_errors() {
        let tree = window();
        let button = tree.element(2).unwrap();
        assert_eq!(
            button.set_attribute("AXTitle", "New"),
            Err(AxError::NotWritable("AXTitle".to_string()))
        );

        let field = tree.element(4).unwrap();
        assert_eq!(field.set_attribute("AXValue", 3), Err(AxError::IllegalArgument));
        assert_eq!(
            field.request_set("frobulate", "x"),
            Err(AxError::UnknownRequest("frobulate".to_string()))
        );
    }

    #[test]
    fn test_unsupported_action() {
        let tree = window();
        let field = tree.element(4).unwrap();
        assert_eq!(
            field.perform_action("AXPress"),
            Err(AxError::ActionUnsupported("AXPress".to_string()))
        );
    }

    #[test]
    fn test_invalid_reference() {
        let tree = window();
        let group = tree.element(1).unwrap();
        let button = tree.element(2).unwrap();
        tree.invalidate(group.handle());

        assert_eq!(group.attribute("AXRole").unwrap_err(), AxError::InvalidReference);
        // 失效会传递到整棵子树
        assert_eq!(button.perform_action("AXPress"), Err(AxError::InvalidReference));
        // 缓存的名称快照不受影响
        assert!(button.has_attribute("AXTitle"));
    }

    #[test]
    fn test_parent_and_children() {
        let tree = window();
        let root = tree.root().unwrap();
        assert!(root.parent().unwrap().is_none());

        let children = root.children().unwrap();
        assert_eq!(children.len(), 3);
        let parent = children[0].parent().unwrap().unwrap();
        assert_eq!(parent.handle().index(), 0);
    }

    #[test]
    fn test_pid_and_application() {
        let tree = window();
        let app = Element::application(Rc::clone(&tree), PID).unwrap();
        assert_eq!(app.pid().unwrap(), PID);
        assert_eq!(app.title().as_deref(), Some("Main"));

        let err = Element::application(Rc::clone(&tree), 7).unwrap_err();
        assert_eq!(err, AxError::InvalidReference);
    }

    #[test]
    fn test_frame_and_center() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        assert_eq!(ok.frame().unwrap(), Rect::new(10.0, 10.0, 80.0, 20.0));
        assert_eq!(ok.center().unwrap(), Point::new(50.0, 20.0));

        let checkbox = tree.element(5).unwrap();
        assert!(checkbox.center().is_err());
    }

    #[test]
    fn test_at_point() {
        let tree = window();
        let hit = Element::at_point(Rc::clone(&tree), 15.0, 15.0).unwrap();
        assert_eq!(hit.title().as_deref(), Some("OK"));

        let hit = Element::at_point(Rc::clone(&tree), 400.0, 300.0).unwrap();
        assert_eq!(hit.role().as_deref(), Some("AXWindow"));

        assert!(Element::at_point(Rc::clone(&tree), 900.0, 900.0).is_err());
    }

    #[test]
    fn test_describe_and_dump_tree() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        assert_eq!(ok.summary(), "AXButton title=\"OK\"");

        let root = tree.root().unwrap();
        let dump = root.dump_tree(1).unwrap();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "  AXGroup identifier=\"toolbar\"");
    }

    #[test]
    fn test_describe_without_role() {
        let spec = NodeSpec::default().attr("AXTitle", "Bare");
        let tree = Rc::new(MemoryTree::new(PID, &spec));
        assert_eq!(tree.root().unwrap().summary(), "? title=\"Bare\"");
    }

    #[test]
    fn test_names_are_cached() {
        let tree = window();
        tree.reset_read_count();
        let root = tree.root().unwrap();
        let _ = root.resolve("title");
        let _ = root.resolve("buttons");
        assert_eq!(tree.read_count(), 0);
    }
}

// ===== list.rs 测试 =====

#[cfg(test)]
mod list_tests {
    use super::*;

    #[test]
    fn test_collect_attribute_plural() {
        let tree = window();
        let root = tree.root().unwrap();
        let buttons = root.find_all("AXButton", &Qualifier::new()).unwrap();
        let values = buttons.collect_attribute("titles").unwrap();
        let texts: Vec<&str> = values.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(texts, ["OK", "Cancel"]);
    }

    #[test]
    fn test_collect_attribute_unknown() {
        let tree = window();
        let root = tree.root().unwrap();
        let buttons = root.find_all("AXButton", &Qualifier::new()).unwrap();
        assert!(matches!(
            buttons.collect_attribute("frobulates"),
            Err(AxError::UnknownRequest(_))
        ));
    }

    #[test]
    fn test_perform_action_on_all() {
        let tree = window();
        let root = tree.root().unwrap();
        let buttons = root.find_all("buttons", &Qualifier::new()).unwrap();
        buttons.perform_action("AXPress").unwrap();
        assert_eq!(
            tree.performed_actions(),
            vec![(2, "AXPress".to_string()), (3, "AXPress".to_string())]
        );
    }
}

// ===== qualifier.rs 测试 =====

#[cfg(test)]
mod qualifier_tests {
    use super::*;
    use crate::ax::Expected;
    use regex::Regex;
    use serde_json::json;

    #[test]
    fn test_native_form_keys() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let cancel = tree.element(3).unwrap();

        assert!(Qualifier::new().with("AXTitle", "OK").matches(&ok).unwrap());
        assert!(!Qualifier::new().with("AXTitle", "OK").matches(&cancel).unwrap());
        assert!(Qualifier::new().with("AXRole", "AXButton").matches(&ok).unwrap());

        let q = Qualifier::from_json(&json!({"AXRole": "AXButton", "AXEnabled": false})).unwrap();
        assert!(q.matches(&cancel).unwrap());
        assert!(!q.matches(&ok).unwrap());
    }

    #[test]
    fn test_role_and_enabled() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let cancel = tree.element(3).unwrap();
        let checkbox = tree.element(5).unwrap();

        let q = Qualifier::new().with("role", "Button").with("enabled", true);
        assert!(q.matches(&ok).unwrap());
        assert!(!q.matches(&cancel).unwrap());
        assert!(!q.matches(&checkbox).unwrap());

        let disabled = Qualifier::new().with("role", "Button").with("enabled", false);
        assert!(disabled.matches(&cancel).unwrap());

        let wrong_role = Qualifier::new().with("role", "CheckBox").with("enabled", true);
        assert!(!wrong_role.matches(&ok).unwrap());
    }

    #[test]
    fn test_empty_qualifier_matches_everything() {
        let tree = window();
        assert!(Qualifier::new().matches(&tree.root().unwrap()).unwrap());
    }

    #[test]
    fn test_unresolved_key_does_not_match() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let q = Qualifier::new().with("frobulate", "x");
        assert!(!q.matches(&ok).unwrap());
    }

    #[test]
    fn test_pattern() {
        let tree = window();
        let cancel = tree.element(3).unwrap();
        let q = Qualifier::new().with("title", Regex::new("^Can").unwrap());
        assert!(q.matches(&cancel).unwrap());
        assert!(!q.matches(&tree.element(2).unwrap()).unwrap());
    }

    #[test]
    fn test_from_json() {
        let q = Qualifier::from_json(&json!({
            "title": "/^C/",
            "enabled": false,
            "position": {"x": 100, "y": 10},
            "parent": {"identifier": "toolbar"}
        }))
        .unwrap();
        assert_eq!(q.len(), 4);

        let keys: Vec<&str> = q.constraints().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["title", "enabled", "position", "parent"]);
        assert!(matches!(q.constraints()[0].1, Expected::Pattern(_)));
        assert!(matches!(q.constraints()[2].1, Expected::Literal(Literal::Point(_))));
        assert!(matches!(q.constraints()[3].1, Expected::Nested(_)));

        let tree = window();
        assert!(q.matches(&tree.element(3).unwrap()).unwrap());
        assert!(!q.matches(&tree.element(2).unwrap()).unwrap());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Qualifier::from_json(&json!(["title"])).is_err());
        assert!(Qualifier::from_json(&json!({"title": null})).is_err());
        assert!(Qualifier::from_json(&json!({"title": "/[/"})).is_err());
    }

    #[test]
    fn test_short_circuit() {
        let tree = window();
        let field = tree.element(4).unwrap();
        let q = Qualifier::new().with("title", "x").with("value", "");
        tree.reset_read_count();
        // 文本框没有 AXTitle，第一个约束在解析阶段即失败，不会读取任何属性
        assert!(!q.matches(&field).unwrap());
        assert_eq!(tree.read_count(), 0);
    }

    #[test]
    fn test_invalid_reference_propagates() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        tree.invalidate(ok.handle());
        let q = Qualifier::new().with("title", "OK");
        assert_eq!(q.matches(&ok), Err(AxError::InvalidReference));
    }
}

// ===== search.rs 测试 =====

#[cfg(test)]
mod search_tests {
    use super::*;
    use crate::ax::{search, SearchResult};

    fn nested_groups() -> Rc<MemoryTree> {
        let spec = NodeSpec::new("AXWindow")
            .child(
                NodeSpec::new("AXGroup")
                    .attr("AXTitle", "outer")
                    .child(NodeSpec::new("AXGroup").attr("AXTitle", "inner")),
            )
            .child(NodeSpec::new("AXGroup").attr("AXTitle", "sibling"));
        Rc::new(MemoryTree::new(PID, &spec))
    }

    #[test]
    fn test_multi_returns_all_in_order() {
        let tree = window();
        let root = tree.root().unwrap();
        let buttons = root.find_all("buttons", &Qualifier::new()).unwrap();
        assert_eq!(titles(&buttons), ["OK", "Cancel"]);
    }

    #[test]
    fn test_multi_descends_into_matches() {
        let tree = nested_groups();
        let root = tree.root().unwrap();
        let groups = root.find_all("groups", &Qualifier::new()).unwrap();
        assert_eq!(titles(&groups), ["outer", "inner", "sibling"]);
    }

    #[test]
    fn test_single_returns_first() {
        let tree = window();
        let root = tree.root().unwrap();
        let found = root.find("button", &Qualifier::new()).unwrap().unwrap();
        assert_eq!(found.title().as_deref(), Some("OK"));
    }

    #[test]
    fn test_single_absent() {
        let tree = window();
        let root = tree.root().unwrap();
        assert!(root.find("slider", &Qualifier::new()).unwrap().is_none());
        let result = search(&root, "slider", &Qualifier::new(), SearchMode::Single).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_stops_early() {
        let tree = window();
        let root = tree.root().unwrap();

        tree.reset_read_count();
        root.find("group", &Qualifier::new()).unwrap().unwrap();
        let single_reads = tree.read_count();

        tree.reset_read_count();
        root.find_all("groups", &Qualifier::new()).unwrap();
        let multi_reads = tree.read_count();

        assert!(single_reads < multi_reads);
    }

    #[test]
    fn test_root_is_not_a_candidate() {
        let tree = window();
        let root = tree.root().unwrap();
        assert!(root.find("window", &Qualifier::new()).unwrap().is_none());
    }

    #[test]
    fn test_subrole_match() {
        let tree = window();
        let root = tree.root().unwrap();
        let toggle = root.find("toggle", &Qualifier::new()).unwrap().unwrap();
        assert_eq!(toggle.title().as_deref(), Some("Remember"));
    }

    #[test]
    fn test_role_spellings() {
        let tree = window();
        let root = tree.root().unwrap();
        for role in ["AXCheckBox", "check_box", "checkboxes", "CheckBox"] {
            let result = search(&root, role, &Qualifier::new(), SearchMode::Multi).unwrap();
            assert_eq!(result.len(), 1, "role spelling {}", role);
        }
    }

    #[test]
    fn test_search_with_qualifier() {
        let tree = window();
        let root = tree.root().unwrap();
        let q = Qualifier::new().with("enabled", false);
        match search(&root, "button", &q, SearchMode::Multi).unwrap() {
            SearchResult::Multi(list) => assert_eq!(titles(&list), ["Cancel"]),
            SearchResult::Single(_) => panic!("expected multi result"),
        }
    }
}

// ===== traverse.rs 测试 =====

#[cfg(test)]
mod traverse_tests {
    use super::*;
    use std::collections::HashSet;

    /// 深度为 3 的树：1 + 2 + 4 + 8 个节点
    fn binary_tree() -> NodeSpec {
        fn level(depth: usize) -> NodeSpec {
            let mut node = NodeSpec::new("AXGroup");
            if depth < 3 {
                node = node.child(level(depth + 1)).child(level(depth + 1));
            }
            node
        }
        level(0)
    }

    #[test]
    fn test_visits_every_node_once() {
        let tree = Rc::new(MemoryTree::new(PID, &binary_tree()));
        let root = tree.root().unwrap();

        let mut seen = HashSet::new();
        let mut max_depth = 0;
        for visit in root.depth_first() {
            let visit = visit.unwrap();
            let index = visit.element.handle().index();
            assert!(seen.insert(index), "node {} visited twice", index);
            // 父节点先于后代访问
            if let Some(parent) = visit.element.parent().unwrap() {
                assert!(seen.contains(&parent.handle().index()));
            }
            max_depth = max_depth.max(visit.depth);
        }

        assert_eq!(seen.len(), tree.len());
        assert_eq!(tree.len(), 15);
        assert_eq!(max_depth, 3);
    }

    #[test]
    fn test_preorder_depths() {
        let tree = window();
        let root = tree.root().unwrap();
        let visits: Vec<(usize, usize)> = root
            .depth_first()
            .map(|v| v.map(|v| (v.element.handle().index(), v.depth)))
            .collect::<AxResult<_>>()
            .unwrap();
        assert_eq!(visits, [(0, 0), (1, 1), (2, 2), (3, 2), (4, 1), (5, 1)]);
    }

    #[test]
    fn test_max_depth() {
        let tree = window();
        let root = tree.root().unwrap();
        let count = root.depth_first().max_depth(1).count();
        assert_eq!(count, 4);
        assert_eq!(root.depth_first().max_depth(0).count(), 1);
    }

    #[test]
    fn test_restartable() {
        let tree = window();
        let root = tree.root().unwrap();
        assert_eq!(root.depth_first().count(), root.depth_first().count());
    }

    #[test]
    fn test_descendants_can_be_kept() {
        let tree = window();
        let root = tree.root().unwrap();
        let kept: Vec<Element<MemoryTree>> = root
            .depth_first()
            .filter_map(|v| v.ok())
            .filter_map(|v| v.element.into_owned())
            .collect();
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_children_error_after_node() {
        let tree = window();
        let root = tree.root().unwrap();
        let group = tree.element(1).unwrap();
        tree.invalidate(group.handle());

        let results: Vec<_> = root.depth_first().collect();
        // 根节点正常产出，随后是读取子元素失败的错误
        assert!(matches!(results[0], Ok(ref v) if v.depth == 0));
        assert!(matches!(results[1], Err(AxError::InvalidReference)));
        assert_eq!(results.len(), 2);
    }
}

// ===== graph.rs 测试 =====

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_nodes_and_edges() {
        let tree = window();
        let root = tree.root().unwrap();
        let graph = GraphBuilder::new().build(&root).unwrap();

        assert_eq!(graph.node_count(), root.depth_first().count());
        assert_eq!(graph.edge_count(), graph.node_count() - 1);
        assert_eq!(graph.edges(), [(0, 1), (1, 2), (1, 3), (0, 4), (0, 5)]);
    }

    #[test]
    fn test_labels() {
        let tree = window();
        let root = tree.root().unwrap();
        let graph = GraphBuilder::new()
            .label_attributes(vec!["AXTitle".to_string()])
            .build(&root)
            .unwrap();
        let labels = graph.labels();
        assert_eq!(labels[0], "AXWindow title=\"Main\"");
        assert_eq!(labels[1], "AXGroup");
    }

    #[test]
    fn test_max_depth() {
        let tree = window();
        let root = tree.root().unwrap();
        let graph = GraphBuilder::new().max_depth(1).build(&root).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_dot_output() {
        let tree = window();
        let root = tree.root().unwrap();
        let dot = GraphBuilder::new().build(&root).unwrap().to_dot();
        assert!(dot.starts_with("digraph"));
        assert_eq!(dot.matches("->").count(), 5);
    }

    #[test]
    fn test_single_node() {
        let spec = NodeSpec::new("AXWindow");
        let tree = Rc::new(MemoryTree::new(PID, &spec));
        let graph = GraphBuilder::new().build(&tree.root().unwrap()).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }
}

// ===== memory.rs 测试 =====

#[cfg(test)]
mod memory_tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "pid": 7,
        "root": {
            "attributes": { "AXRole": "AXWindow", "AXTitle": "Main", "AXPosition": {"x": 0, "y": 0} },
            "actions": ["AXRaise"],
            "children": [
                { "attributes": { "AXRole": "AXButton", "AXTitle": "OK", "AXSelectedRows": [1, 2] }, "actions": ["AXPress"] }
            ]
        }
    }"#;

    #[test]
    fn test_snapshot_json() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        let tree = Rc::new(MemoryTree::from_snapshot(&snapshot));
        assert_eq!(tree.len(), 2);

        let root = tree.root().unwrap();
        assert_eq!(root.pid().unwrap(), 7);
        assert_eq!(root.attribute("AXPosition").unwrap().as_point(), Some(Point::new(0.0, 0.0)));

        let button = root.find("button", &Qualifier::new()).unwrap().unwrap();
        assert!(matches!(button.attribute("AXSelectedRows").unwrap(), Value::Array(ref items) if items.len() == 2));
    }

    #[test]
    fn test_invalid_snapshot() {
        assert!(Snapshot::from_json("{").is_err());
        assert!(Snapshot::from_json(r#"{"root": {}}"#).is_err());
    }

    #[test]
    fn test_capture_round_trip() {
        let tree = window();
        let root = tree.root().unwrap();
        let snapshot = Snapshot::capture(&root, 10).unwrap();
        assert_eq!(snapshot.pid, PID);
        assert_eq!(snapshot.root, window_spec());

        let json = snapshot.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_capture_respects_depth() {
        let tree = window();
        let root = tree.root().unwrap();
        let snapshot = Snapshot::capture(&root, 1).unwrap();
        assert_eq!(snapshot.root.children.len(), 3);
        assert!(snapshot.root.children[0].children.is_empty());
    }

    #[test]
    fn test_synthesized_tree_attributes() {
        let tree = window();
        let root = tree.root().unwrap();
        assert!(root.has_children_attribute());
        assert!(!root.has_attribute("AXParent"));
        assert!(tree.element(1).unwrap().has_attribute("AXParent"));
    }

    #[test]
    fn test_element_out_of_range() {
        let tree = window();
        assert_eq!(tree.element(99).unwrap_err(), AxError::InvalidReference);
    }
}

// ===== input.rs 测试 =====

#[cfg(test)]
mod input_tests {
    use super::*;
    use crate::ax::{click_element, drag_element_to, move_and_click, move_to_element, type_into};

    #[derive(Debug, PartialEq)]
    enum Event {
        Move(Point, Duration),
        Click(Point),
        Drag(Point, Duration),
        Type(String, Option<i32>),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl InputDriver for Recorder {
        fn move_to(&mut self, point: Point, duration: Duration) -> AxResult<()> {
            self.events.push(Event::Move(point, duration));
            Ok(())
        }

        fn click(&mut self, point: Point) -> AxResult<()> {
            self.events.push(Event::Click(point));
            Ok(())
        }

        fn drag_to(&mut self, point: Point, duration: Duration) -> AxResult<()> {
            self.events.push(Event::Drag(point, duration));
            Ok(())
        }

        fn type_text(&mut self, text: &str, target: Option<i32>) -> AxResult<()> {
            self.events.push(Event::Type(text.to_string(), target));
            Ok(())
        }
    }

    #[test]
    fn test_click_element_center() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let mut driver = Recorder::default();
        let center = click_element(&mut driver, &ok).unwrap();
        assert_eq!(center, Point::new(50.0, 20.0));
        assert_eq!(driver.events, [Event::Click(Point::new(50.0, 20.0))]);
    }

    #[test]
    fn test_move_and_click_uses_configured_duration() {
        let tree = window();
        let cancel = tree.element(3).unwrap();
        let duration = crate::config::AppConfig::default().input.move_duration();
        let mut driver = Recorder::default();

        let center = move_and_click(&mut driver, &cancel, duration).unwrap();
        assert_eq!(center, Point::new(140.0, 20.0));
        assert_eq!(
            driver.events,
            [Event::Move(center, Duration::from_millis(200)), Event::Click(center)]
        );
    }

    #[test]
    fn test_boxed_driver() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let mut driver: Box<dyn InputDriver> = Box::new(Recorder::default());
        assert_eq!(click_element(driver.as_mut(), &ok).unwrap(), Point::new(50.0, 20.0));
    }

    #[test]
    fn test_move_and_drag() {
        let tree = window();
        let ok = tree.element(2).unwrap();
        let cancel = tree.element(3).unwrap();
        let mut driver = Recorder::default();
        let duration = Duration::from_millis(200);

        move_to_element(&mut driver, &ok, duration).unwrap();
        drag_element_to(&mut driver, &ok, &cancel, duration).unwrap();
        assert_eq!(
            driver.events,
            [
                Event::Move(Point::new(50.0, 20.0), duration),
                Event::Move(Point::new(50.0, 20.0), Duration::ZERO),
                Event::Drag(Point::new(140.0, 20.0), duration),
            ]
        );
    }

    #[test]
    fn test_type_into_focuses_first() {
        let tree = window();
        let field = tree.element(4).unwrap();
        let mut driver = Recorder::default();
        type_into(&mut driver, &field, "hello").unwrap();
        assert_eq!(field.attribute("AXFocused").unwrap().as_bool(), Some(true));
        assert_eq!(driver.events, [Event::Type("hello".to_string(), Some(PID))]);
    }

    #[test]
    fn test_element_without_frame() {
        let tree = window();
        let checkbox = tree.element(5).unwrap();
        let mut driver = Recorder::default();
        assert!(click_element(&mut driver, &checkbox).is_err());
        assert!(driver.events.is_empty());
    }
}

// ===== error.rs 测试 =====

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(AxError::from_code(-25201, "x"), AxError::IllegalArgument);
        assert_eq!(AxError::from_code(-25202, "x"), AxError::InvalidReference);
        assert_eq!(AxError::from_code(-25204, "x"), AxError::CannotComplete);
        assert_eq!(
            AxError::from_code(-25205, "AXTitle"),
            AxError::AttributeUnsupported("AXTitle".to_string())
        );
        assert_eq!(
            AxError::from_code(-25206, "AXPress"),
            AxError::ActionUnsupported("AXPress".to_string())
        );
        assert_eq!(AxError::from_code(-25211, "x"), AxError::PermissionDenied);
        assert_eq!(AxError::from_code(-25212, "AXValue"), AxError::NoValue("AXValue".to_string()));
        assert_eq!(AxError::from_code(-1, "x"), AxError::ApiError(-1));
    }

    #[test]
    fn test_check() {
        assert!(AxError::check(0, "x").is_ok());
        assert_eq!(AxError::check(-25202, "x"), Err(AxError::InvalidReference));
    }

    #[test]
    fn test_is_missing() {
        assert!(AxError::AttributeUnsupported("a".into()).is_missing());
        assert!(AxError::NoValue("a".into()).is_missing());
        assert!(!AxError::InvalidReference.is_missing());
    }

    #[test]
    fn test_display() {
        let msg = AxError::UnknownRequest("frobulate".to_string()).to_string();
        assert!(msg.contains("frobulate"));
    }
}

// ===== macOS 后端测试 =====

#[cfg(all(test, target_os = "macos"))]
mod macos_tests {
    use super::*;
    use crate::ax::macos::{AxElement, MacAccessibility};

    #[test]
    fn test_ax_element_from_raw_null() {
        let result = unsafe { AxElement::from_raw(std::ptr::null()) };
        assert!(result.is_none());
    }

    #[test]
    fn test_check_permission() {
        // 只验证不会崩溃
        let _ = MacAccessibility::check_permission();
    }

    #[test]
    #[ignore] // 需要辅助功能权限
    fn test_own_application() {
        let api = MacAccessibility::new().unwrap();
        let app = api.application_element(std::process::id() as i32).unwrap();
        assert_eq!(app.pid().unwrap(), std::process::id() as i32);
        assert!(app.role().is_some());
    }

    #[test]
    #[ignore] // 需要辅助功能权限
    fn test_dump_finder() {
        let api = MacAccessibility::new().unwrap();
        let pid = std::process::Command::new("pgrep")
            .arg("-x")
            .arg("Finder")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|s| s.lines().next().and_then(|l| l.trim().parse::<i32>().ok()));
        let Some(pid) = pid else {
            return;
        };
        let app = api.application_element(pid).unwrap();
        let dump = app.dump_tree(2).unwrap();
        assert!(dump.starts_with("AXApplication"));
    }
}
