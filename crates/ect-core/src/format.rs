//! Rendering of change records into readable lines.

use std::sync::Arc;

use ect_delta::{Node, Object};
use tracing::{debug, warn};

use crate::metadata::FieldFormat;
use crate::{
    ChangeOp, ChangeRecord, EntityMetadata, FieldMetadata, FormatError, Messages, MetadataResolver, PathSegment,
};

/// Renders change records using the registered names and formatters.
///
/// ```
/// use std::sync::Arc;
/// use ect_core::{FieldMetadata, Formatter, MetadataResolver, Registry, Tracker};
/// use ect_delta::Node;
///
/// let registry = Registry::new().with_field("User", "name", FieldMetadata::named("Name"));
/// let resolver = Arc::new(MetadataResolver::new(registry));
/// let old = Node::from_json_str(r#"{"name":"Zhang"}"#)?.with_class("User");
/// let new = Node::from_json_str(r#"{"name":"Li"}"#)?.with_class("User");
///
/// let records = Tracker::new(Arc::clone(&resolver)).track(&old, &new)?;
/// let lines = Formatter::new(resolver).format_all(&records);
/// assert_eq!(lines, ["Edited field [Name]: [Zhang => Li]"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Formatter {
    resolver: Arc<MetadataResolver>,
    messages: Messages,
}

impl Formatter {
    /// Creates a formatter with the English templates.
    #[must_use]
    pub fn new(resolver: Arc<MetadataResolver>) -> Self {
        Self { resolver, messages: Messages::default() }
    }

    /// Replaces the message templates.
    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// The templates in use.
    #[must_use]
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Renders every record. Records holding an entity without a formatter
    /// expand into one line per entity field.
    #[must_use]
    pub fn format_all(&self, records: &[ChangeRecord]) -> Vec<String> {
        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            self.format_into(record, &mut lines);
        }
        lines
    }

    fn format_into(&self, record: &ChangeRecord, lines: &mut Vec<String>) {
        let leaf_format = record.leaf().and_then(PathSegment::format);
        let candidate = record.value.as_ref().filter(|value| !value.is_null()).or(record.old_value.as_ref());
        let entity = candidate
            .and_then(Node::as_object)
            .and_then(|object| self.resolver.entity_of(object).map(|metadata| (object, metadata)));

        if let Some((object, metadata)) = &entity {
            if leaf_format.is_none() && metadata.format().is_none() {
                for (key, field) in self.kept_fields(object, metadata) {
                    let mut paths = record.paths.clone();
                    let field = field.as_deref();
                    paths.push(
                        PathSegment::new(key)
                            .with_metadata(field.and_then(FieldMetadata::name), field.and_then(FieldMetadata::format)),
                    );
                    let expanded = ChangeRecord {
                        paths,
                        value: field_value(record.value.as_ref(), key),
                        old_value: field_value(record.old_value.as_ref(), key),
                        ..record.clone()
                    };
                    self.format_into(&expanded, lines);
                }
                return;
            }
        }

        let format = leaf_format.or_else(|| entity.as_ref().and_then(|(_, metadata)| metadata.format()));
        let (value, old_value) = match format {
            Some(format) => {
                match (self.apply(format, record.value.as_ref()), self.apply(format, record.old_value.as_ref())) {
                    (Ok(value), Ok(old_value)) => (value, old_value),
                    (Err(err), _) | (_, Err(err)) => {
                        warn!(%err, path = ?record.keys(), "custom formatter failed, using the default");
                        self.default_pair(record)
                    }
                }
            }
            None => self.default_pair(record),
        };

        let path: String = record.paths.iter().map(|segment| format!("[{}]", segment.label())).collect();
        let placeholder = self.messages.placeholder();
        let line = match record.op {
            ChangeOp::Add => self.messages.render_edit(&path, placeholder, &value),
            ChangeOp::Remove => self.messages.render_edit(&path, &value, placeholder),
            ChangeOp::Replace => self.messages.render_edit(&path, &old_value, &value),
            ChangeOp::Move => {
                let index = |index: Option<usize>| index.map_or_else(|| placeholder.to_owned(), |i| i.to_string());
                self.messages.render_move(&path, &value, &index(record.from_index), &index(record.to_index))
            }
        };
        lines.push(line);
    }

    fn kept_fields<'o>(
        &self,
        object: &'o Object,
        metadata: &EntityMetadata,
    ) -> Vec<(&'o str, Option<Arc<FieldMetadata>>)> {
        object
            .keys()
            .map(|key| (key.as_str(), self.resolver.field_of(object, key)))
            .filter(|(_, field)| !metadata.exclude_undefined() || field.is_some())
            .collect()
    }

    fn apply(&self, format: &FieldFormat, value: Option<&Node>) -> Result<String, FormatError> {
        match value {
            None | Some(Node::Null) => Ok(self.messages.placeholder().to_owned()),
            Some(value) => format(value),
        }
    }

    fn default_pair(&self, record: &ChangeRecord) -> (String, String) {
        (self.format_value(record.value.as_ref()), self.format_value(record.old_value.as_ref()))
    }

    /// The default stringifier.
    ///
    /// Absent values and `null` render as the placeholder, arrays as their
    /// elements joined with `", "`, and objects as `label: value` pairs
    /// (dotted for nested fields) using registered field names.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use ect_core::{Formatter, MetadataResolver, Registry};
    /// # use ect_delta::Node;
    /// let formatter = Formatter::new(Arc::new(MetadataResolver::new(Registry::new())));
    /// let address = Node::from_json_str(r#"{"city":"Beijing","geo":{"lat":39.9}}"#)?;
    /// assert_eq!(formatter.format_value(Some(&address)), "city: Beijing, geo.lat: 39.9");
    /// assert_eq!(formatter.format_value(Some(&Node::from_json_str("[1,2]")?)), "1, 2");
    /// assert_eq!(formatter.format_value(None), "--");
    /// # Ok::<(), ect_delta::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn format_value(&self, value: Option<&Node>) -> String {
        let text = match value {
            None | Some(Node::Null) => return self.messages.placeholder().to_owned(),
            Some(Node::Array(items)) => {
                items.iter().map(|item| self.format_value(Some(item))).collect::<Vec<_>>().join(", ")
            }
            Some(node @ Node::Object(object)) => {
                let mut fields = Vec::new();
                match self.walk(node, &mut Vec::new(), &mut fields) {
                    Ok(()) => fields.join(", "),
                    Err(err) => {
                        debug!(%err, "structured formatting failed");
                        format!("[object {}]", object.class().unwrap_or("Object"))
                    }
                }
            }
            Some(scalar) => scalar_text(scalar),
        };
        if text.is_empty() {
            self.messages.placeholder().to_owned()
        } else {
            text
        }
    }

    fn walk(&self, node: &Node, labels: &mut Vec<String>, out: &mut Vec<String>) -> Result<(), FormatError> {
        match node {
            Node::Object(object) => {
                let metadata = self.resolver.entity_of(object);
                if let Some(format) = metadata.as_deref().and_then(EntityMetadata::format) {
                    out.push(format(node)?);
                    return Ok(());
                }
                let exclude = metadata.is_some_and(|metadata| metadata.exclude_undefined());
                for (key, value) in object {
                    let field = self.resolver.field_of(object, key);
                    if exclude && field.is_none() {
                        continue;
                    }
                    let label = field.as_deref().and_then(FieldMetadata::name).filter(|name| !name.is_empty());
                    self.walk_field(label.unwrap_or(key.as_str()), value, labels, out)?;
                }
            }
            Node::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.walk_field(&index.to_string(), item, labels, out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn walk_field(
        &self,
        label: &str,
        value: &Node,
        labels: &mut Vec<String>,
        out: &mut Vec<String>,
    ) -> Result<(), FormatError> {
        labels.push(label.to_owned());
        if value.is_container() {
            self.walk(value, labels, out)?;
        } else {
            out.push(format!("{}: {}", labels.join("."), scalar_text(value)));
        }
        labels.pop();
        Ok(())
    }
}

fn field_value(container: Option<&Node>, key: &str) -> Option<Node> {
    container.and_then(Node::as_object).and_then(|object| object.get(key)).cloned()
}

fn scalar_text(value: &Node) -> String {
    match value {
        Node::String(text) => text.clone(),
        Node::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    fn formatter(registry: Registry) -> Formatter {
        Formatter::new(Arc::new(MetadataResolver::new(registry)))
    }

    fn node(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    fn record(op: ChangeOp, keys: &[&str], value: Option<Node>, old_value: Option<Node>) -> ChangeRecord {
        ChangeRecord {
            value,
            old_value,
            ..ChangeRecord::new(op, keys.iter().map(|key| PathSegment::new(*key)).collect())
        }
    }

    #[test]
    fn operations_use_the_placeholder_for_the_missing_side() {
        let formatter = formatter(Registry::new());
        let lines = formatter.format_all(&[
            record(ChangeOp::Add, &["tags", "0"], Some(node("\"t2\"")), None),
            record(ChangeOp::Remove, &["tags", "0"], Some(node("\"t1\"")), None),
        ]);
        assert_eq!(lines, ["Edited field [tags][0]: [-- => t2]", "Edited field [tags][0]: [t1 => --]"]);
    }

    #[test]
    fn moves_render_both_indices() {
        let mut moved = record(ChangeOp::Move, &["2"], Some(node("\"C\"")), None);
        moved.from_index = Some(2);
        moved.to_index = Some(0);
        let lines = formatter(Registry::new()).with_messages(Messages::zh_cn()).format_all(&[moved]);
        assert_eq!(lines, ["将[2][C]从2移动到0"]);
    }

    #[test]
    fn failing_entity_format_falls_back_to_type_tag() {
        let registry = Registry::new().with_entity(
            "Geo",
            EntityMetadata::default().with_format(|_| Err(FormatError::new("unsupported"))),
        );
        let geo = node(r#"{"lat":1}"#).with_class("Geo");
        assert_eq!(formatter(registry).format_value(Some(&geo)), "[object Geo]");
    }

    #[test]
    fn empty_structures_render_the_placeholder() {
        let formatter = formatter(Registry::new());
        assert_eq!(formatter.format_value(Some(&node("{}"))), "--");
        assert_eq!(formatter.format_value(Some(&node("[]"))), "--");
        assert_eq!(formatter.format_value(Some(&node("\"\""))), "--");
    }

    #[test]
    fn nested_arrays_are_labelled_by_index() {
        let formatter = formatter(Registry::new());
        let value = node(r#"{"tags":["a","b"],"active":true,"note":null}"#);
        assert_eq!(formatter.format_value(Some(&value)), "tags.0: a, tags.1: b, active: true, note: null");
    }

    #[test]
    fn numbers_render_in_shortest_form() {
        let formatter = formatter(Registry::new());
        assert_eq!(formatter.format_value(Some(&node("30"))), "30");
        assert_eq!(formatter.format_value(Some(&node("2.5"))), "2.5");
    }
}
