use std::fmt;

use ect_delta::Node;
use serde::{Serialize, Serializer};

use crate::metadata::FieldFormat;

/// Kind of an atomic change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    /// A value appeared.
    Add,
    /// A value disappeared.
    Remove,
    /// A value was replaced by another.
    Replace,
    /// An array element changed position.
    Move,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Move => "move",
        })
    }
}

/// One step of a change's location: the structural key plus the display
/// name and formatter resolved for it.
#[derive(Clone, Default)]
pub struct PathSegment {
    key: String,
    name: Option<String>,
    format: Option<FieldFormat>,
}

impl PathSegment {
    /// A segment with no display metadata.
    ///
    /// ```
    /// # use ect_core::PathSegment;
    /// let segment = PathSegment::new("city").with_name("City");
    /// assert_eq!(segment.key(), "city");
    /// assert_eq!(segment.label(), "City");
    /// ```
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), name: None, format: None }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn with_metadata(mut self, name: Option<&str>, format: Option<&FieldFormat>) -> Self {
        self.name = name.map(str::to_owned);
        self.format = format.cloned();
        self
    }

    /// The raw structural key: a property name or a stringified index.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The resolved display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The resolved formatter.
    #[must_use]
    pub fn format(&self) -> Option<&FieldFormat> {
        self.format.as_ref()
    }

    /// The display name, or the key when the name is missing or empty.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.key,
        }
    }
}

impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.name == other.name
    }
}

impl Eq for PathSegment {}

impl fmt::Debug for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSegment").field("key", &self.key).field("name", &self.name).finish()
    }
}

impl Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PathSegment", 2)?;
        state.serialize_field("key", &self.key)?;
        if let Some(name) = &self.name {
            state.serialize_field("name", name)?;
        } else {
            state.skip_field("name")?;
        }
        state.end()
    }
}

/// A normalized, path-annotated description of one atomic edit.
///
/// | op        | `value`       | `old_value` | indices            |
/// |-----------|---------------|-------------|--------------------|
/// | `add`     | added value   | -           | -                  |
/// | `remove`  | removed value | -           | -                  |
/// | `replace` | new value     | old value   | -                  |
/// | `move`    | moved value   | -           | `from_index`, `to_index` |
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// The kind of change.
    pub op: ChangeOp,
    /// Root-to-leaf location; never empty.
    pub paths: Vec<PathSegment>,
    /// See the table above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Node>,
    /// Previous value of a `replace`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Node>,
    /// Old index of a moved element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_index: Option<usize>,
    /// New index of a moved element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_index: Option<usize>,
}

impl ChangeRecord {
    /// A record with no values attached.
    #[must_use]
    pub fn new(op: ChangeOp, paths: Vec<PathSegment>) -> Self {
        Self { op, paths, value: None, old_value: None, from_index: None, to_index: None }
    }

    /// Keys of the path, root first.
    ///
    /// ```
    /// # use ect_core::{ChangeOp, ChangeRecord, PathSegment};
    /// let record = ChangeRecord::new(
    ///     ChangeOp::Replace,
    ///     vec![PathSegment::new("address"), PathSegment::new("city")],
    /// );
    /// assert_eq!(record.keys(), ["address", "city"]);
    /// ```
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.paths.iter().map(PathSegment::key).collect()
    }

    /// The innermost path segment.
    #[must_use]
    pub fn leaf(&self) -> Option<&PathSegment> {
        self.paths.last()
    }
}
