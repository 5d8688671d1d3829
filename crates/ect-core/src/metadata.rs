//! Entity and field metadata, and the store they are registered in.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ect_delta::Node;

use crate::FormatError;

/// Renders a value (a field value or a whole entity) for display.
pub type FieldFormat = Arc<dyn Fn(&Node) -> Result<String, FormatError> + Send + Sync>;

/// Derives the identity of an array element; the index is its position in
/// the array being diffed, when known.
pub type ObjectHash = Arc<dyn Fn(&Node, Option<usize>) -> Option<String> + Send + Sync>;

/// Rules attached to a class of objects.
///
/// An object whose class has entity metadata registered is an *entity*:
/// its fields are expanded individually when formatted, and its
/// [`object_hash`](Self::object_hash) identifies it inside arrays.
///
/// ```
/// # use ect_core::EntityMetadata;
/// # use ect_delta::Node;
/// let contact = EntityMetadata::named("Contact")
///     .with_object_hash(|item, _| item.child("type").map(ToString::to_string))
///     .with_exclude_undefined(true);
/// assert_eq!(contact.name(), Some("Contact"));
/// assert!(contact.exclude_undefined());
/// ```
#[derive(Clone, Default)]
pub struct EntityMetadata {
    name: Option<String>,
    format: Option<FieldFormat>,
    object_hash: Option<ObjectHash>,
    exclude_undefined: bool,
}

impl EntityMetadata {
    /// Metadata with a display name and no custom rules.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    /// Sets the formatter used for the entity as a whole.
    #[must_use]
    pub fn with_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&Node) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(format));
        self
    }

    /// Sets the identity function used to pair elements across arrays.
    #[must_use]
    pub fn with_object_hash<F>(mut self, hash: F) -> Self
    where
        F: Fn(&Node, Option<usize>) -> Option<String> + Send + Sync + 'static,
    {
        self.object_hash = Some(Arc::new(hash));
        self
    }

    /// Restricts diffing and formatting to fields with registered metadata.
    #[must_use]
    pub fn with_exclude_undefined(mut self, exclude: bool) -> Self {
        self.exclude_undefined = exclude;
        self
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Entity-level formatter.
    #[must_use]
    pub fn format(&self) -> Option<&FieldFormat> {
        self.format.as_ref()
    }

    /// Array element identity function.
    #[must_use]
    pub fn object_hash(&self) -> Option<&ObjectHash> {
        self.object_hash.as_ref()
    }

    /// Whether fields without metadata are ignored.
    #[must_use]
    pub fn exclude_undefined(&self) -> bool {
        self.exclude_undefined
    }
}

impl fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("name", &self.name)
            .field("format", &self.format.is_some())
            .field("object_hash", &self.object_hash.is_some())
            .field("exclude_undefined", &self.exclude_undefined)
            .finish()
    }
}

/// Display rules for one field of a class.
#[derive(Clone, Default)]
pub struct FieldMetadata {
    name: Option<String>,
    format: Option<FieldFormat>,
}

impl FieldMetadata {
    /// Metadata with a display name.
    ///
    /// ```
    /// # use ect_core::FieldMetadata;
    /// assert_eq!(FieldMetadata::named("City").name(), Some("City"));
    /// ```
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), format: None }
    }

    /// Sets the formatter applied to the field's values.
    #[must_use]
    pub fn with_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&Node) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(format));
        self
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Value formatter.
    #[must_use]
    pub fn format(&self) -> Option<&FieldFormat> {
        self.format.as_ref()
    }
}

impl fmt::Debug for FieldMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMetadata")
            .field("name", &self.name)
            .field("format", &self.format.is_some())
            .finish()
    }
}

/// Source of registered metadata, consulted on resolver cache misses.
pub trait MetadataStore: Send + Sync {
    /// Entity metadata registered for `class`.
    fn lookup_entity(&self, class: &str) -> Option<Arc<EntityMetadata>>;

    /// Field metadata registered for `field` of `class`.
    fn lookup_field(&self, class: &str, field: &str) -> Option<Arc<FieldMetadata>>;
}

/// In-memory [`MetadataStore`] populated at startup.
///
/// ```
/// # use ect_core::{EntityMetadata, FieldMetadata, MetadataStore, Registry};
/// let registry = Registry::new()
///     .with_entity("User", EntityMetadata::named("User"))
///     .with_field("User", "name", FieldMetadata::named("Name"));
/// assert!(registry.lookup_entity("User").is_some());
/// assert_eq!(registry.lookup_field("User", "name").unwrap().name(), Some("Name"));
/// assert!(registry.lookup_field("User", "age").is_none());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    entities: HashMap<String, Arc<EntityMetadata>>,
    fields: HashMap<(String, String), Arc<FieldMetadata>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class` as an entity, replacing any earlier record.
    pub fn register_entity(&mut self, class: impl Into<String>, metadata: EntityMetadata) {
        self.entities.insert(class.into(), Arc::new(metadata));
    }

    /// Registers metadata for `field` of `class`, replacing any earlier record.
    pub fn register_field(
        &mut self,
        class: impl Into<String>,
        field: impl Into<String>,
        metadata: FieldMetadata,
    ) {
        self.fields.insert((class.into(), field.into()), Arc::new(metadata));
    }

    /// Builder form of [`register_entity`](Self::register_entity).
    #[must_use]
    pub fn with_entity(mut self, class: impl Into<String>, metadata: EntityMetadata) -> Self {
        self.register_entity(class, metadata);
        self
    }

    /// Builder form of [`register_field`](Self::register_field).
    #[must_use]
    pub fn with_field(
        mut self,
        class: impl Into<String>,
        field: impl Into<String>,
        metadata: FieldMetadata,
    ) -> Self {
        self.register_field(class, field, metadata);
        self
    }
}

impl MetadataStore for Registry {
    fn lookup_entity(&self, class: &str) -> Option<Arc<EntityMetadata>> {
        self.entities.get(class).cloned()
    }

    fn lookup_field(&self, class: &str, field: &str) -> Option<Arc<FieldMetadata>> {
        self.fields.get(&(class.to_owned(), field.to_owned())).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_registration_replaces_the_record() {
        let mut registry = Registry::new();
        registry.register_field("User", "name", FieldMetadata::named("Name"));
        registry.register_field("User", "name", FieldMetadata::named("Full name"));
        assert_eq!(registry.lookup_field("User", "name").unwrap().name(), Some("Full name"));
    }

    #[test]
    fn debug_output_hides_closures() {
        let metadata = EntityMetadata::default().with_format(|_| Ok(String::new()));
        let text = format!("{metadata:?}");
        assert!(text.contains("format: true"), "{text}");
        assert!(text.contains("object_hash: false"), "{text}");
    }
}
