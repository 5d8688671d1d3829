use std::sync::{Arc, Mutex};

use ect_core::{
    ChangeOp, ChangeRecord, EntityMetadata, FieldMetadata, FormatError, Formatter, Messages, MetadataResolver,
    PathSegment, Registry, Tracker,
};
use ect_delta::Node;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Collects the level and message of every event.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<(Level, String)>>>);

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for Captured {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        if let Ok(mut events) = self.0.lock() {
            events.push((*event.metadata().level(), visitor.0));
        }
    }
}

fn resolver(registry: Registry) -> Arc<MetadataResolver> {
    Arc::new(MetadataResolver::new(registry))
}

fn node(json: &str) -> Node {
    Node::from_json_str(json).unwrap()
}

fn with_class(json: &str, class: &str) -> Node {
    node(json).with_class(class)
}

#[test]
fn field_formatters_apply_to_both_sides() {
    let registry = Registry::new().with_field(
        "User",
        "age",
        FieldMetadata::named("Age").with_format(|value| Ok(format!("{value} years"))),
    );
    let resolver = resolver(registry);
    let old = with_class(r#"{"age":30}"#, "User");
    let new = with_class(r#"{"age":31}"#, "User");

    let records = Tracker::new(Arc::clone(&resolver)).track(&old, &new).unwrap();
    let lines = Formatter::new(resolver).format_all(&records);

    assert_eq!(lines, ["Edited field [Age]: [30 years => 31 years]"]);
}

#[test]
fn failing_formatters_fall_back_and_warn() {
    let registry = Registry::new().with_field(
        "User",
        "age",
        FieldMetadata::named("Age").with_format(|value| match value {
            Node::Number(_) => Ok(format!("{value} years")),
            other => Err(FormatError::new(format!("not a number: {other}"))),
        }),
    );
    let resolver = resolver(registry);
    let old = with_class(r#"{"age":30}"#, "User");
    let new = with_class(r#"{"age":"unknown"}"#, "User");
    let records = Tracker::new(Arc::clone(&resolver)).track(&old, &new).unwrap();
    let formatter = Formatter::new(resolver);

    let captured = Captured::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    let lines = tracing::subscriber::with_default(subscriber, || formatter.format_all(&records));

    assert_eq!(lines, ["Edited field [Age]: [30 => unknown]"]);
    let events = captured.0.lock().unwrap();
    assert!(
        events.iter().any(|(level, message)| *level == Level::WARN && message.contains("custom formatter failed")),
        "{events:?}"
    );
}

#[test]
fn entity_formatters_suppress_field_expansion() {
    let registry = Registry::new()
        .with_entity(
            "Address",
            EntityMetadata::named("Address").with_format(|value| {
                let city = value.child("city").ok_or_else(|| FormatError::new("no city"))?;
                Ok(format!("<{}>", city.to_string().trim_matches('"')))
            }),
        )
        .with_field("User", "address", FieldMetadata::named("Address"));
    let formatter = Formatter::new(resolver(registry));
    let record = ChangeRecord {
        value: Some(with_class(r#"{"street":"New","city":"Shanghai"}"#, "Address")),
        old_value: Some(Node::Null),
        ..ChangeRecord::new(ChangeOp::Replace, vec![PathSegment::new("address").with_name("Address")])
    };

    assert_eq!(formatter.format_all(&[record]), ["Edited field [Address]: [-- => <Shanghai>]"]);
}

#[test]
fn removed_entities_expand_with_old_values() {
    let registry = Registry::new()
        .with_entity("Address", EntityMetadata::default())
        .with_field("Address", "city", FieldMetadata::named("City"));
    let formatter = Formatter::new(resolver(registry));
    let record = ChangeRecord {
        value: Some(with_class(r#"{"street":"Old","city":"Beijing"}"#, "Address")),
        ..ChangeRecord::new(ChangeOp::Remove, vec![PathSegment::new("addresses"), PathSegment::new("0")])
    };

    assert_eq!(
        formatter.format_all(&[record]),
        ["Edited field [addresses][0][street]: [Old => --]", "Edited field [addresses][0][City]: [Beijing => --]"]
    );
}

#[test]
fn structured_walk_honours_names_and_exclusions() {
    let registry = Registry::new()
        .with_entity("Contact", EntityMetadata::default().with_exclude_undefined(true))
        .with_field("Contact", "type", FieldMetadata::named("Type"))
        .with_field("Contact", "value", FieldMetadata::named("Value"));
    let formatter = Formatter::new(resolver(registry));
    let contacts = Node::from(vec![
        with_class(r#"{"type":"qq","value":"10001","secret":"x"}"#, "Contact"),
        node(r#"{"geo":{"lat":1.5,"lng":2}}"#),
    ]);

    assert_eq!(formatter.format_value(Some(&contacts)), "Type: qq, Value: 10001, geo.lat: 1.5, geo.lng: 2");
}

#[test]
fn placeholder_follows_the_messages() {
    let messages = Messages::zh_cn().with_placeholder("无");
    let formatter = Formatter::new(resolver(Registry::new())).with_messages(messages);
    let record = ChangeRecord {
        value: Some(node("\"x\"")),
        ..ChangeRecord::new(ChangeOp::Add, vec![PathSegment::new("tags"), PathSegment::new("3")])
    };

    assert_eq!(formatter.format_all(&[record]), ["编辑字段[tags][3]: [无 => x]"]);
}
