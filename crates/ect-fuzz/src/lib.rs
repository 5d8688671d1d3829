//! Fuzzing harnesses for entity change tracking.
//!
//! Each public function accepts raw bytes so it can be driven from
//! `cargo fuzz` targets as well as from ordinary tests. Decoding failures are
//! swallowed; broken tracking invariants panic so the fuzzer reports them.
//!
//! # Examples
//!
//! ```
//! ect_fuzz::fuzz_canonicalization(b"{\"_t\":\"a\",\"_0\":[1,0,0]}");
//! ect_fuzz::fuzz_track(&[1, 2, 3, 4, 5, 6, 7, 8]);
//! ect_fuzz::fuzz_interpret(b"{\"a\":[1,2]}");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use anyhow::{ensure, Context as _};
use arbitrary::Unstructured;
use ect_core::{ChangeOp, EntityMetadata, FieldMetadata, Formatter, MetadataResolver, Registry, Tracker};
use ect_delta::{Delta, Node, Number, Object};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 12;
const CLASSES: [&str; 2] = ["User", "Contact"];
const FIELDS: [&str; 5] = ["type", "name", "value", "tags", "note"];

/// Feeds arbitrary bytes through node and delta parsing.
///
/// ```
/// ect_fuzz::fuzz_canonicalization(b"key: value");
/// ```
pub fn fuzz_canonicalization(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Node::from_json_str(text);
        let _ = Node::from_yaml_str(text);
        let _ = Delta::from_json_str(text);
    }
}

/// Tracks and formats two random, partially classed node trees.
///
/// # Panics
///
/// Panics when the engine's own delta cannot be interpreted, when identical
/// inputs produce records, or when formatting is not deterministic.
///
/// ```
/// ect_fuzz::fuzz_track(b"seed");
/// ```
pub fn fuzz_track(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let (Some(old), Some(new)) = (random_node(&mut unstructured), random_node(&mut unstructured)) else {
        return;
    };
    if let Err(err) = check_track(&old, &new) {
        panic!("{err:?}");
    }
}

/// Interprets arbitrary bytes as a delta document and formats the result.
///
/// ```
/// ect_fuzz::fuzz_interpret(b"{\"_t\":\"a\",\"_1\":[\"x\",0,3]}");
/// ```
pub fn fuzz_interpret(data: &[u8]) {
    let Ok(delta) = serde_json::from_slice(data).map_err(anyhow::Error::from).and_then(|value| {
        Delta::from_json_value(value).context("not a delta")
    }) else {
        return;
    };
    let (tracker, formatter) = pipeline();
    if let Ok(records) = tracker.interpret(&delta, None, None) {
        let _ = formatter.format_all(&records);
    }
}

fn check_track(old: &Node, new: &Node) -> anyhow::Result<()> {
    let (tracker, formatter) = pipeline();
    let records = tracker.track(old, new).context("tracking engine output")?;
    ensure!(records.iter().all(|record| !record.paths.is_empty()), "record without a path");
    ensure!(
        records.iter().all(|record| (record.op == ChangeOp::Move) == record.from_index.is_some()),
        "from_index set outside a move"
    );
    ensure!(formatter.format_all(&records) == formatter.format_all(&records), "formatting is not deterministic");

    let unchanged = tracker.track(old, &old.clone()).context("tracking identical values")?;
    ensure!(unchanged.is_empty(), "identical values produced {} records", unchanged.len());
    Ok(())
}

fn pipeline() -> (Tracker, Formatter) {
    let registry = Registry::new()
        .with_entity("User", EntityMetadata::named("User"))
        .with_field("User", "name", FieldMetadata::named("Name"))
        .with_field(
            "User",
            "tags",
            FieldMetadata::named("Tags").with_format(|value| match value {
                Node::Array(items) => Ok(items.len().to_string()),
                _ => Err(ect_core::FormatError::new("tags must be an array")),
            }),
        )
        .with_entity(
            "Contact",
            EntityMetadata::named("Contact")
                .with_object_hash(|item, _| item.child("type").map(ToString::to_string))
                .with_exclude_undefined(true),
        )
        .with_field("Contact", "type", FieldMetadata::named("Type"))
        .with_field("Contact", "value", FieldMetadata::named("Value"));
    let resolver = Arc::new(MetadataResolver::new(registry));
    (Tracker::new(Arc::clone(&resolver)), Formatter::new(resolver))
}

fn random_node(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    node_from_unstructured(unstructured, 0).ok()
}

fn node_from_unstructured(unstructured: &mut Unstructured<'_>, depth: usize) -> Result<Node, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return leaf(unstructured);
    }

    match unstructured.int_in_range::<u8>(0..=5)? {
        0..=3 => leaf(unstructured),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(node_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(Node::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut object = Object::new();
            for _ in 0..len {
                let key = if unstructured.arbitrary()? {
                    (*unstructured.choose(&FIELDS)?).to_owned()
                } else {
                    random_string(unstructured)?
                };
                object.insert(key, node_from_unstructured(unstructured, depth + 1)?);
            }
            let class = unstructured.int_in_range::<usize>(0..=CLASSES.len())?;
            Ok(match CLASSES.get(class) {
                Some(class) => Node::Object(object.with_class(*class)),
                None => Node::Object(object),
            })
        }
    }
}

fn leaf(unstructured: &mut Unstructured<'_>) -> Result<Node, arbitrary::Error> {
    match unstructured.int_in_range::<u8>(0..=3)? {
        0 => Ok(Node::Null),
        1 => Ok(Node::Bool(unstructured.arbitrary()?)),
        2 => random_number(unstructured).map(Node::Number),
        _ => random_string(unstructured).map(Node::String),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<Number, arbitrary::Error> {
    if unstructured.arbitrary()? {
        Ok(Number::from(unstructured.arbitrary::<i32>()?))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        Number::new(numerator / denominator).map_err(|_| arbitrary::Error::IncorrectFormat)
    }
}

fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        let byte = unstructured.int_in_range::<u8>(0x20..=0x7e)?;
        string.push(char::from(byte));
    }
    Ok(string)
}
