use std::sync::Arc;

use ect_core::{ChangeOp, FieldMetadata, Formatter, MetadataResolver, Registry, Tracker, ROOT_KEY};
use ect_delta::Node;
use proptest::prelude::*;

fn arb_json_value() -> impl Strategy<Value = serde_json::Value> {
    use proptest::{collection::btree_map, collection::vec, string::string_regex};

    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i32>().prop_map(serde_json::Value::from),
        string_regex("[a-zA-Z0-9]{0,8}").unwrap().prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(4, 16, 4, move |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            btree_map(string_regex("[a-z]{1,6}").unwrap(), inner, 0..4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (k, v) in map {
                    object.insert(k, v);
                }
                serde_json::Value::Object(object)
            }),
        ]
    })
}

fn arb_node() -> impl Strategy<Value = Node> {
    arb_json_value().prop_map(|value| Node::from_json_value(value).unwrap())
}

fn arb_scalar() -> impl Strategy<Value = Node> {
    prop_oneof![
        any::<bool>().prop_map(Node::from),
        any::<i32>().prop_map(Node::from),
        "[a-z]{1,8}".prop_map(Node::from),
    ]
}

fn distinct_words() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    proptest::collection::btree_set("[a-z]{1,4}", 1..8).prop_flat_map(|words| {
        let words: Vec<String> = words.into_iter().collect();
        (Just(words.clone()), Just(words).prop_shuffle())
    })
}

fn tracker(registry: Registry) -> (Tracker, Formatter) {
    let resolver = Arc::new(MetadataResolver::new(registry));
    (Tracker::new(Arc::clone(&resolver)), Formatter::new(resolver))
}

fn user(name: &str, city: &str) -> Node {
    let address = Node::from_json_str(&format!(r#"{{"city":"{city}"}}"#)).unwrap().with_class("Address");
    let mut user = Node::from_json_str(&format!(r#"{{"name":"{name}"}}"#)).unwrap().with_class("User");
    if let Node::Object(object) = &mut user {
        object.insert("address", address);
    }
    user
}

proptest! {
    #[test]
    fn identical_values_have_no_changes(value in arb_node()) {
        let (tracker, _) = tracker(Registry::new());
        prop_assert!(tracker.track(&value, &value.clone()).unwrap().is_empty());
    }

    #[test]
    fn scalar_roots_yield_one_replace(old in arb_scalar(), new in arb_scalar()) {
        prop_assume!(old != new);
        let (tracker, _) = tracker(Registry::new());
        let records = tracker.track(&old, &new).unwrap();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(records[0].op, ChangeOp::Replace);
        prop_assert_eq!(records[0].keys(), vec![ROOT_KEY]);
    }

    #[test]
    fn reordering_yields_only_moves((old, new) in distinct_words()) {
        let (tracker, _) = tracker(Registry::new());
        let old = Node::from(old.into_iter().map(Node::from).collect::<Vec<_>>());
        let new = Node::from(new.into_iter().map(Node::from).collect::<Vec<_>>());
        let records = tracker.track(&old, &new).unwrap();
        prop_assert!(records.iter().all(|record| record.op == ChangeOp::Move), "{:?}", records);
    }

    #[test]
    fn formatting_is_idempotent(old in arb_node(), new in arb_node()) {
        let (tracker, formatter) = tracker(Registry::new());
        let records = tracker.track(&old, &new).unwrap();
        prop_assert_eq!(formatter.format_all(&records), formatter.format_all(&records));
    }

    #[test]
    fn renaming_a_label_changes_only_names(label in "[A-Za-z]{1,10}", name in "[a-z]{1,6}", city in "[a-z]{1,6}") {
        let registry = |label: &str| {
            Registry::new()
                .with_field("User", "name", FieldMetadata::named(label))
                .with_field("Address", "city", FieldMetadata::named(format!("{label}!")))
        };
        let old = user(&name, &city);
        let new = user(&format!("{name}x"), &format!("{city}y"));

        let (plain, _) = tracker(registry("Label"));
        let (renamed, _) = tracker(registry(label.as_str()));
        let before = plain.track(&old, &new).unwrap();
        let after = renamed.track(&old, &new).unwrap();

        prop_assert_eq!(before.len(), after.len());
        for (lhs, rhs) in before.iter().zip(&after) {
            prop_assert_eq!(lhs.keys(), rhs.keys());
            prop_assert_eq!(&lhs.value, &rhs.value);
            prop_assert_eq!(rhs.leaf().and_then(|segment| segment.name()).map(|n| n.trim_end_matches('!')), Some(label.as_str()));
        }
    }
}
