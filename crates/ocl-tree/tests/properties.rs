use facet_testhelpers::test;
use ocl_tree::{NodeTag, Value, parse, view};

#[test]
fn identical_input_gives_equal_views() {
    let source = "step \"a\" { x = 1 }\nlist = [1, { y = true }]";
    let first = parse(source).unwrap();
    let second = parse(source).unwrap();
    assert_eq!(first, second);
    assert_eq!(view(&first), view(&second));

    let other = parse("step \"a\" { x = 2 }\nlist = [1, { y = true }]").unwrap();
    assert_ne!(first, other);
    assert_ne!(view(&first), view(&other));
}

#[test]
fn omitting_the_differing_key_restores_equality() {
    let a = parse("server { host = \"alpha\"\nport = 8080 }").unwrap();
    let b = parse("server { host = \"beta\"\nport = 8080 }").unwrap();
    let server_a = view(&a).get("server").unwrap().as_view().unwrap();
    let server_b = view(&b).get("server").unwrap().as_view().unwrap();
    assert_ne!(server_a, server_b);

    let mut json_a = server_a.to_interchange();
    let mut json_b = server_b.to_interchange();
    json_a.as_object_mut().unwrap().remove("host");
    json_b.as_object_mut().unwrap().remove("host");
    assert_eq!(json_a, json_b);
}

#[test]
fn root_positions_and_names_agree() {
    let doc = parse("A {\n  x = 1\n  y = 2\n}\nB {\n  z = 3\n}\n").unwrap();
    let root = view(&doc);
    assert_eq!(root.len(), 2);

    let first = root.index(0).unwrap().as_view().unwrap();
    let second = root.index(1).unwrap().as_view().unwrap();
    assert_eq!(first.children().len(), 2);
    assert_eq!(second.children().len(), 1);

    assert_eq!(root.get("A").unwrap().as_view(), Some(first));
    assert_eq!(root.get("B").unwrap().as_view(), Some(second));
    assert_eq!(root.index(2), None);
}

#[test]
fn floating_attribute_by_name_and_position() {
    let doc = parse("A { x = 1 }\nB { }\ncount = 1\n").unwrap();
    let root = view(&doc);
    assert_eq!(root.len(), 3);

    let by_name = root.get("count").unwrap();
    let by_position = root.index(2).unwrap();
    assert_eq!(by_name.as_i64(), Some(1));
    assert_eq!(by_position.get("count").unwrap().as_i64(), Some(1));
    assert_eq!(by_position.get("count"), Some(by_name));

    let attr = by_position.as_view().unwrap();
    assert_eq!(attr.tag(), Some(NodeTag::Attribute));
    assert_eq!(attr.name(), Some("count"));
}

#[test]
fn label_lookup() {
    let doc = parse(
        r#"
process {
  step "build" { n = 1 }
  step "test" { n = 2 }
  step "deploy" { n = 3 }
  step "other" "deploy" { n = 4 }
}
"#,
    )
    .unwrap();
    let process = view(&doc).get("process").unwrap().as_view().unwrap();

    let test = process.get_by_label("step", "test").unwrap();
    assert_eq!(test.get("n").unwrap().as_i64(), Some(2));

    assert_eq!(process.get_by_label("step", "missing"), None);

    let deploys = process.get_by_label("step", "deploy").unwrap();
    let deploys = deploys.as_list().unwrap();
    assert_eq!(deploys.len(), 2);
    assert_eq!(deploys[0].get("n").unwrap().as_i64(), Some(3));
    assert_eq!(deploys[1].get("n").unwrap().as_i64(), Some(4));
    assert_eq!(
        deploys[1].get("__labels").unwrap().to_interchange(),
        serde_json::json!(["other", "deploy"])
    );
}

#[test]
fn duplicate_attributes_keep_source_order() {
    let doc = parse("tag = \"a\"\nother = 0\ntag = \"b\"").unwrap();
    let tags = view(&doc).get("tag").unwrap();
    assert_eq!(
        tags,
        Value::List(vec![Value::String("a".into()), Value::String("b".into())])
    );
}

#[test]
fn triple_duplicates_keep_source_order() {
    let doc = parse("x { v = 3\nv = 1\nv = 2 }\nx { v = 9 }").unwrap();
    let first = view(&doc).get("x").unwrap().index(0).unwrap();
    let values: Vec<_> = first
        .get("v")
        .unwrap()
        .as_list()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(values, vec![3, 1, 2]);

    let labelled = parse("s \"k\" { }\ns \"k\" { a = 1 }\ns \"k\" { b = 2 }").unwrap();
    let matches = view(&labelled).get_by_label("s", "k").unwrap();
    let keys: Vec<_> = matches
        .as_list()
        .unwrap()
        .iter()
        .map(|m| m.as_view().unwrap().keys().len())
        .collect();
    assert_eq!(keys, vec![2, 3, 3]);
}

#[test]
fn heredoc_bodies() {
    let doc = parse(
        "literal = <<EOT\n    keep\n  this\nEOT\nindented = <<-EOT\n    strip\n      this\n    EOT\n",
    )
    .unwrap();
    let root = view(&doc);
    assert_eq!(
        root.get("literal").unwrap().as_str(),
        Some("    keep\n  this")
    );
    assert_eq!(
        root.get("indented").unwrap().as_str(),
        Some("strip\n  this")
    );
}

#[test]
fn lookups_leave_the_document_untouched() {
    let source = "step \"a\" { props = { k = [1, 2] } }\nn = 1";
    let doc = parse(source).unwrap();
    let before = doc.clone();

    let root = view(&doc);
    let _ = root.to_interchange();
    let _ = root.get_by_label("step", "a");
    let _ = root.get("missing");
    let _ = root.index(42);
    let step = root.get("step").unwrap().as_view().unwrap();
    let _ = step.get("props").unwrap().get("k");

    assert_eq!(doc, before);
    assert_eq!(root, view(&parse(source).unwrap()));
}

#[test]
fn malformed_input_keeps_siblings() {
    let doc = parse("first = 1\n@@ broken [\n]\nsecond { third = 3 }").unwrap();
    let root = view(&doc);
    assert_eq!(root.get("first").unwrap().as_i64(), Some(1));
    assert_eq!(
        root.get("second").unwrap().get("third").unwrap().as_i64(),
        Some(3)
    );
    let keys: Vec<_> = root.keys().into_iter().map(|k| k.into_owned()).collect();
    assert_eq!(keys, vec!["first", "second"]);
}

#[test]
fn views_are_shared_across_threads() {
    let doc = parse("step \"a\" { x = 1 }\nstep \"b\" { x = 2 }\nn = [1, 2, 3]").unwrap();
    let expected = view(&doc).to_interchange();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| view(&doc).to_interchange()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

mod generated {
    use ocl_tree::{NodeTag, Value, View, parse, view};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    fn document() -> impl Strategy<Value = String> {
        let name = prop_oneof![
            6 => "[a-z][a-z0-9_]{0,5}".prop_filter("keyword", |n| n != "true" && n != "false"),
            1 => Just("__name".to_string()),
            1 => Just("__labels".to_string()),
        ];
        let value = prop_oneof![
            "-?[0-9]{1,5}",
            "\"[a-zA-Z ]{0,8}\"",
            Just("true".to_string()),
            Just("[1, \"two\", { three = 3 }]".to_string()),
            Just("{ inner = \"x\" }".to_string()),
            Just("{ __labels = 1\n__name = 2\nk = [{ __labels = 3 }] }".to_string()),
        ];
        let attribute = (name.clone(), value).prop_map(|(n, v)| format!("{n} = {v}"));
        let entry = prop_oneof![
            attribute.clone(),
            (name, "[a-z]{1,4}", prop::collection::vec(attribute, 0..3)).prop_map(
                |(n, label, body)| format!("{n} \"{label}\" {{\n{}\n}}", body.join("\n"))
            ),
        ];
        prop::collection::vec(entry, 0..10).prop_map(|entries| entries.join("\n"))
    }

    proptest! {
        #[test]
        fn interchange_is_deterministic(source in document()) {
            let first = parse(&source).unwrap();
            let second = parse(&source).unwrap();
            prop_assert_eq!(view(&first).to_interchange(), view(&second).to_interchange());
        }

        #[test]
        fn every_key_resolves(source in document()) {
            let doc = parse(&source).unwrap();
            keys_resolve(view(&doc))?;
        }
    }

    /// Every key of `view` answers a lookup, every child name that answers
    /// is listed, and the same holds for every nested view.
    fn keys_resolve(view: View<'_>) -> Result<(), TestCaseError> {
        let keys = view.keys();
        if view.tag() == Some(NodeTag::Array) {
            for (position, key) in keys.iter().enumerate() {
                let expected = position.to_string();
                prop_assert_eq!(key.as_ref(), expected.as_str());
                let value = view.index(position);
                prop_assert!(value.is_some(), "position {} did not resolve", position);
                if let Some(value) = value {
                    values_resolve(&value)?;
                }
            }
            return Ok(());
        }
        for key in &keys {
            let value = view.get(key);
            prop_assert!(value.is_some(), "key {:?} did not resolve", key);
            if let Some(value) = value {
                values_resolve(&value)?;
            }
        }
        if view.tag() == Some(NodeTag::Attribute) {
            return Ok(());
        }
        for id in view.children() {
            let Some(name) = View::node(view.document(), *id).name() else {
                continue;
            };
            if view.get(name).is_some() {
                prop_assert!(
                    keys.iter().any(|k| k == name),
                    "child {:?} resolves but is not listed in {:?}",
                    name,
                    keys
                );
            }
        }
        Ok(())
    }

    fn values_resolve(value: &Value<'_>) -> Result<(), TestCaseError> {
        match value {
            Value::View(nested) => keys_resolve(*nested),
            Value::Blocks(blocks) => blocks.iter().try_for_each(keys_resolve),
            Value::List(items) => items.iter().try_for_each(values_resolve),
            _ => Ok(()),
        }
    }
}
