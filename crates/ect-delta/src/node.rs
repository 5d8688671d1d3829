use std::fmt;

use indexmap::IndexMap;
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::{CanonicalizeError, Number};

/// Represents the dynamic object graph compared by the delta engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A present `null` value (`Option::None` when captured).
    Null,
    /// Boolean.
    Bool(bool),
    /// Number represented as IEEE-754 double precision.
    Number(Number),
    /// String.
    String(String),
    /// Ordered sequence.
    Array(Vec<Node>),
    /// Structured value with optional class identity.
    Object(Object),
}

/// A structured value: fields in insertion order plus an optional class identity.
///
/// The class identity is what entity and field metadata are registered
/// against. Captured structs carry their serde type name; objects parsed from
/// JSON or YAML are classless until [`Object::with_class`] attaches one.
///
/// ```
/// # use ect_delta::{Node, Object};
/// let city = Object::new()
///     .with_class("Address")
///     .with_field("city", "Beijing");
/// assert_eq!(city.class(), Some("Address"));
/// assert_eq!(city.get("city"), Some(&Node::from("Beijing")));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    class: Option<String>,
    fields: IndexMap<String, Node>,
}

impl Object {
    /// Creates an empty, classless object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the class identity.
    #[must_use]
    pub fn with_class<S>(mut self, class: S) -> Self
    where
        S: Into<String>,
    {
        self.class = Some(class.into());
        self
    }

    /// Appends a field, returning the extended object.
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Node>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the class identity, if any.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Inserts or replaces a field in place.
    pub fn insert<K>(&mut self, key: K, value: Node) -> Option<Node>
    where
        K: Into<String>,
    {
        self.fields.insert(key.into(), value)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.fields.get(key)
    }

    /// Indicates whether the field exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.fields.iter()
    }

    /// Iterates over field names in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Node> {
        self.fields.keys()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Indicates whether the object has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<K> FromIterator<(K, Node)> for Object
where
    K: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, Node)>>(iter: T) -> Self {
        Self { class: None, fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

impl Node {
    /// Parses a JSON string into the node representation.
    ///
    /// Whitespace-only input is treated as `null`.
    ///
    /// ```
    /// # use ect_delta::Node;
    /// let node = Node::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), ect_delta::CanonicalizeError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, CanonicalizeError> {
        if input.trim().is_empty() {
            return Ok(Self::Null);
        }
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Parses a YAML string into the node representation.
    ///
    /// ```
    /// # use ect_delta::Node;
    /// let node = Node::from_yaml_str("---\nanswer: 42\n")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), ect_delta::CanonicalizeError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, CanonicalizeError> {
        if input.trim().is_empty() {
            return Ok(Self::Null);
        }
        let value: YamlValue = serde_yaml::from_str(input)?;
        Self::from_yaml_value(value)
    }

    /// Converts a serde JSON value into a [`Node`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, CanonicalizeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                let text = num.to_string();
                let Some(as_f64) = num.as_f64() else {
                    return Err(CanonicalizeError::NumberOutOfRange { value: text });
                };
                Ok(Self::Number(Number::new(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Array(items))
            }
            JsonValue::Object(map) => {
                let mut object = Object::new();
                for (key, value) in map {
                    object.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    fn from_yaml_value(value: YamlValue) -> Result<Self, CanonicalizeError> {
        match value {
            YamlValue::Null => Ok(Self::Null),
            YamlValue::Bool(v) => Ok(Self::Bool(v)),
            YamlValue::Number(num) => {
                if let Some(f) = num.as_f64() {
                    return Ok(Self::Number(Number::new(f)?));
                }
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::new(i as f64)?));
                }
                if let Some(u) = num.as_u64() {
                    return Ok(Self::Number(Number::new(u as f64)?));
                }
                Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() })
            }
            YamlValue::String(s) => Ok(Self::String(s)),
            YamlValue::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for value in seq {
                    items.push(Self::from_yaml_value(value)?);
                }
                Ok(Self::Array(items))
            }
            YamlValue::Mapping(map) => {
                let mut object = Object::new();
                for (key, value) in map {
                    let key = match key {
                        YamlValue::String(s) => s,
                        other => {
                            return Err(CanonicalizeError::NonStringYamlKey {
                                found: format!("{other:?}"),
                            });
                        }
                    };
                    object.insert(key, Self::from_yaml_value(value)?);
                }
                Ok(Self::Object(object))
            }
            YamlValue::Tagged(tagged) => {
                Err(CanonicalizeError::UnsupportedYamlTag { tag: tagged.tag.to_string() })
            }
        }
    }

    /// Converts the node into a serde JSON value. Class identities are dropped.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Number(n) => JsonValue::Number(n.to_json_number()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(values) => JsonValue::Array(values.iter().map(Self::to_json_value).collect()),
            Self::Object(object) => {
                let mut map = serde_json::Map::new();
                for (key, value) in object {
                    map.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(map)
            }
        }
    }

    /// Attaches a class identity to an object node; other nodes are returned unchanged.
    ///
    /// ```
    /// # use ect_delta::Node;
    /// let node = Node::from_json_str("{\"city\":\"Beijing\"}")?.with_class("Address");
    /// assert_eq!(node.class(), Some("Address"));
    /// # Ok::<(), ect_delta::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn with_class<S>(self, class: S) -> Self
    where
        S: Into<String>,
    {
        match self {
            Self::Object(object) => Self::Object(object.with_class(class)),
            other => other,
        }
    }

    /// Returns the class identity of an object node.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.as_object().and_then(Object::class)
    }

    /// Returns the object payload, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Indicates whether this is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Indicates whether this is an object or array.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    /// Steps into an object field or an array element (by decimal index).
    ///
    /// ```
    /// # use ect_delta::Node;
    /// let node = Node::from_json_str("{\"tags\":[\"a\",\"b\"]}")?;
    /// let tag = node.child("tags").and_then(|tags| tags.child("1"));
    /// assert_eq!(tag, Some(&Node::from("b")));
    /// # Ok::<(), ect_delta::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Object(object) => object.get(key),
            Self::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        }
    }

    /// Short description of the node kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_value().to_string())
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Number(n) => n.to_json_number().serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => items.serialize(serializer),
            Self::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<JsonValue> for Node {
    type Error = CanonicalizeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json_value(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<Number> for Node {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<Object> for Node {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Self::Array(value)
    }
}
