use std::sync::{Arc, Once};

use ect_core::{
    ChangeOp, ChangeRecord, EntityMetadata, FieldMetadata, Formatter, Messages, MetadataResolver, PathSegment,
    Registry, TrackError, Tracker,
};
use ect_delta::{Delta, Node};
use serde::Serialize;

#[derive(Clone, Serialize)]
struct Address {
    street: String,
    city: String,
}

#[derive(Clone, Serialize)]
struct User {
    name: String,
    address: Address,
    tags: Vec<String>,
}

#[derive(Clone, Serialize)]
struct Contact {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    exclude_field: String,
}

#[derive(Clone, Serialize)]
struct UserWithContacts {
    contacts: Vec<Contact>,
}

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn registry() -> Registry {
    Registry::new()
        .with_entity("Address", EntityMetadata::default())
        .with_field("Address", "street", FieldMetadata::named("街道"))
        .with_field("Address", "city", FieldMetadata::named("城市"))
        .with_entity("User", EntityMetadata::named("用户"))
        .with_field("User", "name", FieldMetadata::named("用户名"))
        .with_field("User", "address", FieldMetadata::named("地址"))
        .with_field("User", "tags", FieldMetadata::named("标签"))
        .with_entity(
            "Contact",
            EntityMetadata::named("联系方式")
                .with_object_hash(|item, _| item.child("type").map(ToString::to_string))
                .with_exclude_undefined(true),
        )
        .with_field("Contact", "type", FieldMetadata::named("类型"))
        .with_field("Contact", "value", FieldMetadata::named("值"))
        .with_entity("UserWithContacts", EntityMetadata::default())
        .with_field("UserWithContacts", "contacts", FieldMetadata::named("联系方式"))
}

fn setup() -> (Tracker, Formatter) {
    init_tracing();
    let resolver = Arc::new(MetadataResolver::new(registry()));
    (Tracker::new(Arc::clone(&resolver)), Formatter::new(resolver).with_messages(Messages::zh_cn()))
}

fn user(name: &str, street: &str, city: &str, tags: &[&str]) -> User {
    User {
        name: name.to_owned(),
        address: Address { street: street.to_owned(), city: city.to_owned() },
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
    }
}

fn contact(kind: &str, value: &str, exclude_field: &str) -> Contact {
    Contact { kind: kind.to_owned(), value: value.to_owned(), exclude_field: exclude_field.to_owned() }
}

fn segment(key: &str, name: Option<&str>) -> PathSegment {
    match name {
        Some(name) => PathSegment::new(key).with_name(name),
        None => PathSegment::new(key),
    }
}

fn replace(paths: Vec<PathSegment>, old: &str, new: &str) -> ChangeRecord {
    ChangeRecord {
        value: Some(Node::from(new)),
        old_value: Some(Node::from(old)),
        ..ChangeRecord::new(ChangeOp::Replace, paths)
    }
}

#[test]
fn tracks_basic_changes() {
    let (tracker, formatter) = setup();
    let old = user("张三", "旧街道", "北京", &["标签1"]);
    let new = user("李四", "新街道", "上海", &["标签2"]);

    let records = tracker.track_values(&old, &new).unwrap();

    let address = segment("address", Some("地址"));
    let tags = segment("tags", Some("标签"));
    let expected = vec![
        replace(vec![segment("name", Some("用户名"))], "张三", "李四"),
        replace(vec![address.clone(), segment("street", Some("街道"))], "旧街道", "新街道"),
        replace(vec![address, segment("city", Some("城市"))], "北京", "上海"),
        ChangeRecord {
            value: Some(Node::from("标签2")),
            ..ChangeRecord::new(ChangeOp::Add, vec![tags.clone(), segment("0", None)])
        },
        ChangeRecord {
            value: Some(Node::from("标签1")),
            ..ChangeRecord::new(ChangeOp::Remove, vec![tags, segment("0", None)])
        },
    ];
    assert_eq!(records, expected);

    assert_eq!(
        formatter.format_all(&records),
        [
            "编辑字段[用户名]: [张三 => 李四]",
            "编辑字段[地址][街道]: [旧街道 => 新街道]",
            "编辑字段[地址][城市]: [北京 => 上海]",
            "编辑字段[标签][0]: [-- => 标签2]",
            "编辑字段[标签][0]: [标签1 => --]",
        ]
    );
}

#[test]
fn tracks_array_moves() {
    let (tracker, formatter) = setup();
    let old = user("张三", "街道", "北京", &["A", "B", "C"]);
    let new = user("张三", "街道", "北京", &["C", "A", "B"]);

    let records = tracker.track_values(&old, &new).unwrap();

    let expected = ChangeRecord {
        value: Some(Node::from("C")),
        from_index: Some(2),
        to_index: Some(0),
        ..ChangeRecord::new(ChangeOp::Move, vec![segment("tags", Some("标签")), segment("2", None)])
    };
    assert_eq!(records, [expected]);
    assert_eq!(formatter.format_all(&records), ["将[标签][2][C]从2移动到0"]);
}

#[test]
fn tracks_object_arrays_by_hash() {
    let (tracker, formatter) = setup();
    let old = UserWithContacts {
        contacts: vec![
            contact("email", "old@example.com", "什么是快乐星球1"),
            contact("qq", "837233287", "什么是快乐星球2"),
            contact("phone", "1234567890", "什么是快乐星球3"),
        ],
    };
    let new = UserWithContacts {
        contacts: vec![
            contact("qq", "837233287", "什么是快乐星球2"),
            contact("email", "new@example.com", "什么是快乐星球2"),
            contact("phone", "1234567890", "什么是快乐星球3"),
        ],
    };

    let records = tracker.track_values(&old, &new).unwrap();

    let contacts = segment("contacts", Some("联系方式"));
    let moved = contact_node(&old.contacts[1]);
    assert_eq!(
        records,
        [
            replace(
                vec![contacts.clone(), segment("1", None), segment("value", Some("值"))],
                "old@example.com",
                "new@example.com",
            ),
            ChangeRecord {
                value: Some(moved),
                from_index: Some(1),
                to_index: Some(0),
                ..ChangeRecord::new(ChangeOp::Move, vec![contacts, segment("1", None)])
            },
        ]
    );

    let lines = formatter.format_all(&records);
    assert_eq!(
        lines,
        [
            "编辑字段[联系方式][1][值]: [old@example.com => new@example.com]",
            "将[联系方式][1][类型][qq]从1移动到0",
            "将[联系方式][1][值][837233287]从1移动到0",
        ]
    );
    assert!(lines.iter().all(|line| !line.contains("什么是快乐星球")));
}

fn contact_node(contact: &Contact) -> Node {
    ect_delta::to_node(contact).unwrap()
}

#[test]
fn unregistered_fields_are_invisible_to_the_diff() {
    let (tracker, _) = setup();
    let old = UserWithContacts { contacts: vec![contact("qq", "1", "before")] };
    let new = UserWithContacts { contacts: vec![contact("qq", "1", "after")] };
    assert!(tracker.track_values(&old, &new).unwrap().is_empty());
}

#[test]
fn formats_arrays_of_entities() {
    let (tracker, formatter) = setup();
    let old = vec![user("张三", "旧街道", "北京", &["标签1"]), user("李四", "新街道", "上海", &["标签1", "标签2"])];
    let new = vec![user("张三", "旧街道", "北京1", &["标签1"]), user("李四", "新街道", "上海", &["标签2", "标签1"])];

    let records = tracker.track_values(&old, &new).unwrap();
    let lines = formatter.format_all(&records);

    assert_eq!(lines, ["编辑字段[0][地址][城市]: [北京 => 北京1]", "将[1][标签][1][标签2]从1移动到0"]);
}

#[test]
fn classless_objects_use_raw_keys() {
    let (tracker, formatter) = setup();
    let old = Node::from_json_str(r#"{"name":"张三"}"#).unwrap();
    let new = Node::from_json_str(r#"{"name":"李四"}"#).unwrap();

    let records = tracker.track(&old, &new).unwrap();
    assert_eq!(formatter.format_all(&records), ["编辑字段[name]: [张三 => 李四]"]);
}

#[test]
fn replaced_entities_expand_into_fields() {
    #[derive(Serialize)]
    struct Profile {
        address: Option<Address>,
    }

    let (tracker, formatter) = setup();
    let old = Profile { address: None };
    let new = Profile { address: Some(Address { street: "新街道".to_owned(), city: "上海".to_owned() }) };

    let records = tracker.track_values(&old, &new).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].op, ChangeOp::Replace);
    assert_eq!(records[0].old_value, Some(Node::Null));

    assert_eq!(
        formatter.format_all(&records),
        ["编辑字段[address][街道]: [-- => 新街道]", "编辑字段[address][城市]: [-- => 上海]"]
    );
}

#[test]
fn interprets_external_deltas() {
    let (tracker, _) = setup();
    let delta = Delta::from_json_str(r#"{"name":["张三","李四"],"tags":{"_t":"a","_0":["标签1",0,0]}}"#).unwrap();
    let old = ect_delta::to_node(&user("张三", "街道", "北京", &["标签1"])).unwrap();

    let records = tracker.interpret(&delta, Some(&old), None).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].paths[0].name(), Some("用户名"));
    assert_eq!(records[1].op, ChangeOp::Remove);
    assert_eq!(records[1].keys(), ["tags", "0"]);
}

#[test]
fn malformed_deltas_are_errors() {
    let (tracker, _) = setup();
    let delta = Delta::from_json_str(r#"{"name":["a","b","c","d"]}"#).unwrap();
    let err = tracker.interpret(&delta, None, None).unwrap_err();
    assert!(matches!(err, TrackError::MalformedDelta { ref path, .. } if path == "$.name"), "{err}");
}
