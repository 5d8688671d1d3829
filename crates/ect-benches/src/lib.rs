//! Synthetic corpora for benchmarking change tracking.
//!
//! Each [`Corpus`] generates a before/after pair of captured values together
//! with the metadata registry that describes them.
//!
//! # Examples
//!
//! ```
//! let corpus = ect_benches::available_corpora()
//!     .iter()
//!     .find(|corpus| corpus.name() == "users")
//!     .expect("registered corpus");
//! let dataset = corpus.load().expect("corpus builds");
//! assert!(!dataset.track().expect("tracks").is_empty());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use anyhow::Context as _;
use ect_core::{
    ChangeRecord, EntityMetadata, FieldMetadata, Formatter, MetadataResolver, Registry, TrackError, Tracker,
};
use ect_delta::{to_node, Node};
use serde::Serialize;

/// A named generator of benchmark datasets.
#[derive(Clone, Copy, Debug)]
pub struct Corpus {
    name: &'static str,
    size: usize,
    build: fn(usize) -> anyhow::Result<(Node, Node)>,
}

impl Corpus {
    /// Identifier used for benchmark ids.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of top-level elements generated.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Generates the dataset.
    pub fn load(&self) -> anyhow::Result<Dataset> {
        let (before, after) = (self.build)(self.size).with_context(|| format!("building corpus {}", self.name))?;
        let resolver = Arc::new(MetadataResolver::new(registry()));
        Ok(Dataset { before, after, resolver })
    }
}

/// A generated before/after pair plus the resolver describing it.
#[derive(Clone, Debug)]
pub struct Dataset {
    before: Node,
    after: Node,
    resolver: Arc<MetadataResolver>,
}

impl Dataset {
    /// The old value.
    #[must_use]
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The new value.
    #[must_use]
    pub fn after(&self) -> &Node {
        &self.after
    }

    /// A tracker sharing the dataset's resolver.
    #[must_use]
    pub fn tracker(&self) -> Tracker {
        Tracker::new(Arc::clone(&self.resolver))
    }

    /// A formatter sharing the dataset's resolver.
    #[must_use]
    pub fn formatter(&self) -> Formatter {
        Formatter::new(Arc::clone(&self.resolver))
    }

    /// Tracks the dataset.
    pub fn track(&self) -> Result<Vec<ChangeRecord>, TrackError> {
        self.tracker().track(&self.before, &self.after)
    }
}

/// Returns the registered corpora.
#[must_use]
pub fn available_corpora() -> &'static [Corpus] {
    const CORPORA: &[Corpus] = &[
        Corpus { name: "users", size: 200, build: users },
        Corpus { name: "contacts", size: 500, build: contacts },
        Corpus { name: "flat-object", size: 2_000, build: flat_object },
    ];
    CORPORA
}

#[derive(Serialize)]
struct Address {
    street: String,
    city: String,
}

#[derive(Serialize)]
struct User {
    name: String,
    address: Address,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct Contact {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    note: String,
}

fn registry() -> Registry {
    Registry::new()
        .with_entity("User", EntityMetadata::named("User"))
        .with_field("User", "name", FieldMetadata::named("Name"))
        .with_field("User", "address", FieldMetadata::named("Address"))
        .with_field("User", "tags", FieldMetadata::named("Tags"))
        .with_entity("Address", EntityMetadata::default())
        .with_field("Address", "street", FieldMetadata::named("Street"))
        .with_field("Address", "city", FieldMetadata::named("City"))
        .with_entity(
            "Contact",
            EntityMetadata::named("Contact")
                .with_object_hash(|item, _| item.child("type").map(ToString::to_string))
                .with_exclude_undefined(true),
        )
        .with_field("Contact", "type", FieldMetadata::named("Type"))
        .with_field("Contact", "value", FieldMetadata::named("Value"))
}

fn user(index: usize, revision: usize) -> User {
    let mut tags: Vec<String> = (0..4).map(|tag| format!("tag-{}", (index + tag) % 7)).collect();
    let len = tags.len();
    tags.rotate_left(revision % len);
    User {
        name: format!("user-{index}"),
        address: Address {
            street: format!("{index} Main St"),
            city: if revision > 0 && index % 3 == 0 { "Shanghai".to_owned() } else { "Beijing".to_owned() },
        },
        tags,
    }
}

fn users(size: usize) -> anyhow::Result<(Node, Node)> {
    let before: Vec<User> = (0..size).map(|index| user(index, 0)).collect();
    let after: Vec<User> = (0..size).map(|index| user(index, usize::from(index % 5 == 0))).collect();
    Ok((to_node(&before)?, to_node(&after)?))
}

fn contacts(size: usize) -> anyhow::Result<(Node, Node)> {
    let contact = |index: usize, suffix: &str| Contact {
        kind: format!("kind-{index}"),
        value: format!("value-{index}{suffix}"),
        note: format!("note-{index}{suffix}"),
    };
    let before: Vec<Contact> = (0..size).map(|index| contact(index, "")).collect();
    let mut after: Vec<Contact> =
        (0..size).map(|index| contact(index, if index % 10 == 0 { "-new" } else { "" })).collect();
    after.reverse();
    Ok((to_node(&before)?, to_node(&after)?))
}

fn flat_object(size: usize) -> anyhow::Result<(Node, Node)> {
    let json = |revision: usize| {
        let fields: Vec<String> = (0..size)
            .map(|index| {
                let value = if revision > 0 && index % 17 == 0 { index * 2 } else { index };
                format!("\"field{index}\":{value}")
            })
            .collect();
        format!("{{{}}}", fields.join(","))
    };
    let before = Node::from_json_str(&json(0)).context("before document")?;
    let after = Node::from_json_str(&json(1)).context("after document")?;
    Ok((before, after))
}
