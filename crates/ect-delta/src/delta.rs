//! The delta document: a nested description of the edits between two nodes.
//!
//! The layout follows the widely used jsondiffpatch conventions so deltas can
//! be exchanged as JSON:
//!
//! * an object level is a map from field name to child delta;
//! * an array level is a map carrying `"_t": "a"`, with new-side indices as
//!   keys for additions and nested edits, and `"_<old index>"` keys for
//!   removals and moves;
//! * a leaf is an atomic edit encoded as a short positional list:
//!   `[new]` (added), `[old, new]` (modified), `[old, 0, 0]` (deleted) and
//!   `[value, new index, 3]` (moved).

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::{DeltaFormatError, Node, Number};

/// Key of the array discriminator.
pub const ARRAY_MARKER_KEY: &str = "_t";
/// Value of the array discriminator.
pub const ARRAY_MARKER: &str = "a";
/// Prefix marking a vacated (removed or moved) array slot.
pub const VACATED_PREFIX: char = '_';
/// Trailing marker of a move edit.
pub const MOVED_MARKER: i64 = 3;

/// A structural delta between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum Delta {
    /// Atomic edit, positionally encoded.
    Edit(Vec<Node>),
    /// Per-field deltas of an object.
    Object(IndexMap<String, Delta>),
    /// Per-slot deltas of an array.
    Array(IndexMap<String, Delta>),
}

/// Position a key takes inside an array delta level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArraySlot {
    /// New-side index (additions and nested edits).
    Index(usize),
    /// Old-side index of a removed or moved element.
    Vacated(usize),
}

impl ArraySlot {
    /// Parses an array-level key; `None` for keys that are neither form.
    ///
    /// ```
    /// # use ect_delta::ArraySlot;
    /// assert_eq!(ArraySlot::parse("3"), Some(ArraySlot::Index(3)));
    /// assert_eq!(ArraySlot::parse("_0"), Some(ArraySlot::Vacated(0)));
    /// assert_eq!(ArraySlot::parse("_t"), None);
    /// ```
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key.strip_prefix(VACATED_PREFIX) {
            Some(rest) => rest.parse().ok().map(Self::Vacated),
            None => key.parse().ok().map(Self::Index),
        }
    }

    /// The numeric index, whichever side it refers to.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Index(index) | Self::Vacated(index) => index,
        }
    }

    fn key(self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::Vacated(index) => format!("{VACATED_PREFIX}{index}"),
        }
    }
}

// Plain indices ascending, then vacated slots ascending, then anything else.
fn array_key_order(lhs: &str, rhs: &str) -> Ordering {
    let rank = |key: &str| match ArraySlot::parse(key) {
        Some(ArraySlot::Index(index)) => (0, index),
        Some(ArraySlot::Vacated(index)) => (1, index),
        None => (2, 0),
    };
    rank(lhs).cmp(&rank(rhs)).then_with(|| lhs.cmp(rhs))
}

impl Delta {
    /// `[value]`
    #[must_use]
    pub fn added(value: Node) -> Self {
        Self::Edit(vec![value])
    }

    /// `[old, new]`
    #[must_use]
    pub fn modified(old: Node, new: Node) -> Self {
        Self::Edit(vec![old, new])
    }

    /// `[value, 0, 0]`
    #[must_use]
    pub fn deleted(value: Node) -> Self {
        Self::Edit(vec![value, Node::from(0), Node::from(0)])
    }

    /// `[value, to, 3]`
    #[must_use]
    pub fn moved(value: Node, to: usize) -> Self {
        Self::Edit(vec![value, Node::Number(Number::from(to)), Node::from(MOVED_MARKER)])
    }

    /// Builds an array level from slot entries, ordered canonically.
    ///
    /// ```
    /// # use ect_delta::{ArraySlot, Delta, Node};
    /// let delta = Delta::array([
    ///     (ArraySlot::Vacated(0), Delta::deleted(Node::from("t1"))),
    ///     (ArraySlot::Index(0), Delta::added(Node::from("t2"))),
    /// ]);
    /// let keys: Vec<_> = delta.entries().map(|(key, _)| key.as_str()).collect();
    /// assert_eq!(keys, ["0", "_0"]);
    /// ```
    #[must_use]
    pub fn array<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ArraySlot, Delta)>,
    {
        let mut map: IndexMap<String, Delta> =
            entries.into_iter().map(|(slot, delta)| (slot.key(), delta)).collect();
        map.sort_by(|lhs, _, rhs, _| array_key_order(lhs, rhs));
        Self::Array(map)
    }

    /// Indicates whether this is an atomic edit.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit(_))
    }

    /// Iterates over child deltas in traversal order: insertion order for
    /// objects, canonical slot order for arrays. Edits have no children.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Delta)> {
        let mut entries: Vec<_> = match self {
            Self::Edit(_) => Vec::new(),
            Self::Object(map) | Self::Array(map) => map.iter().collect(),
        };
        if matches!(self, Self::Array(_)) {
            entries.sort_by(|(lhs, _), (rhs, _)| array_key_order(lhs, rhs));
        }
        entries.into_iter()
    }

    /// Parses a jsondiffpatch-style JSON delta.
    ///
    /// Entries whose value is `null` are no-ops and are dropped.
    ///
    /// ```
    /// # use ect_delta::{Delta, Node};
    /// let delta = Delta::from_json_str(r#"{"name":["Zhang","Li"]}"#)?;
    /// let (key, edit) = delta.entries().next().unwrap();
    /// assert_eq!(key, "name");
    /// assert_eq!(edit, &Delta::modified(Node::from("Zhang"), Node::from("Li")));
    /// # Ok::<(), ect_delta::DeltaFormatError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, DeltaFormatError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Converts a JSON value into a delta.
    pub fn from_json_value(value: JsonValue) -> Result<Self, DeltaFormatError> {
        from_json_at(value, "$")
    }

    /// Converts the delta into its JSON form.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Edit(items) => JsonValue::Array(items.iter().map(Node::to_json_value).collect()),
            Self::Object(map) => {
                JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json_value())).collect())
            }
            Self::Array(_) => {
                let mut object = serde_json::Map::new();
                object.insert(ARRAY_MARKER_KEY.to_owned(), JsonValue::from(ARRAY_MARKER));
                for (key, value) in self.entries() {
                    object.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(object)
            }
        }
    }
}

fn from_json_at(value: JsonValue, path: &str) -> Result<Delta, DeltaFormatError> {
    match value {
        JsonValue::Array(items) => {
            let mut edit = Vec::with_capacity(items.len());
            for item in items {
                edit.push(Node::from_json_value(item)?);
            }
            Ok(Delta::Edit(edit))
        }
        JsonValue::Object(map) => {
            let is_array = match map.get(ARRAY_MARKER_KEY) {
                None => false,
                Some(JsonValue::String(marker)) if marker == ARRAY_MARKER => true,
                Some(other) => {
                    return Err(DeltaFormatError::UnknownMarker {
                        path: path.to_owned(),
                        marker: other.to_string(),
                    });
                }
            };
            let mut children = IndexMap::with_capacity(map.len());
            for (key, child) in map {
                if is_array && key == ARRAY_MARKER_KEY || child.is_null() {
                    continue;
                }
                let child_path = format!("{path}.{key}");
                children.insert(key, from_json_at(child, &child_path)?);
            }
            if is_array {
                children.sort_by(|lhs, _, rhs, _| array_key_order(lhs, rhs));
                Ok(Delta::Array(children))
            } else {
                Ok(Delta::Object(children))
            }
        }
        other => Err(DeltaFormatError::UnexpectedValue {
            path: path.to_owned(),
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Serialize for Delta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_levels_serialize_with_marker_first() {
        let delta = Delta::array([
            (ArraySlot::Vacated(2), Delta::moved(Node::from("C"), 0)),
            (ArraySlot::Index(1), Delta::added(Node::from("x"))),
        ]);
        let text = serde_json::to_string(&delta).unwrap();
        assert_eq!(text, r#"{"_t":"a","1":["x"],"_2":["C",0,3]}"#);
    }

    #[test]
    fn json_array_levels_are_recognized() {
        let delta = Delta::from_json_str(r#"{"_t":"a","_0":["t1",0,0],"0":["t2"]}"#).unwrap();
        let Delta::Array(map) = &delta else {
            panic!("expected array level, got {delta:?}");
        };
        assert_eq!(map.len(), 2);
        let keys: Vec<_> = delta.entries().map(|(key, _)| key.clone()).collect();
        assert_eq!(keys, ["0", "_0"]);
    }

    #[test]
    fn null_entries_are_dropped() {
        let delta = Delta::from_json_str(r#"{"a":null,"b":[1]}"#).unwrap();
        assert_eq!(delta.entries().count(), 1);
    }

    #[test]
    fn unknown_markers_are_rejected() {
        let err = Delta::from_json_str(r#"{"_t":"x"}"#).unwrap_err();
        assert!(matches!(err, DeltaFormatError::UnknownMarker { .. }));
    }

    #[test]
    fn scalar_levels_are_rejected() {
        let err = Delta::from_json_str(r#"{"a":{"b":true}}"#).unwrap_err();
        assert_eq!(err.to_string(), "expected edit list or object at $.a.b. got bool");
    }
}
