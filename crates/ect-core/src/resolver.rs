use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use ect_delta::{Node, Object};
use tracing::debug;

use crate::{EntityMetadata, FieldMetadata, MetadataStore};

/// Resolves registered metadata for object nodes, caching every hit.
///
/// Lookups are keyed by the object's class; classless objects, arrays and
/// primitives never carry metadata. Hits are cached for the resolver's
/// lifetime, misses go back to the store each time.
///
/// ```
/// # use ect_core::{EntityMetadata, MetadataResolver, Registry};
/// # use ect_delta::{Node, Object};
/// let resolver = MetadataResolver::new(Registry::new().with_entity("User", EntityMetadata::named("User")));
/// let user = Node::from(Object::new().with_class("User").with_field("name", "Li"));
/// assert_eq!(resolver.resolve_entity(Some(&user)).unwrap().name(), Some("User"));
/// assert!(resolver.resolve_entity(Some(&Node::from("User"))).is_none());
/// ```
pub struct MetadataResolver {
    store: Box<dyn MetadataStore>,
    entities: RwLock<HashMap<String, Arc<EntityMetadata>>>,
    fields: RwLock<HashMap<(String, String), Arc<FieldMetadata>>>,
}

impl MetadataResolver {
    /// Creates a resolver backed by `store`.
    pub fn new<S>(store: S) -> Self
    where
        S: MetadataStore + 'static,
    {
        Self { store: Box::new(store), entities: RwLock::default(), fields: RwLock::default() }
    }

    /// Entity metadata of `target`, if it is an object of a registered class.
    #[must_use]
    pub fn resolve_entity(&self, target: Option<&Node>) -> Option<Arc<EntityMetadata>> {
        self.entity_of(target?.as_object()?)
    }

    /// Field metadata for `field` of `target`, if registered.
    #[must_use]
    pub fn resolve_field(&self, target: Option<&Node>, field: &str) -> Option<Arc<FieldMetadata>> {
        self.field_of(target?.as_object()?, field)
    }

    /// Entity metadata for an object.
    #[must_use]
    pub fn entity_of(&self, object: &Object) -> Option<Arc<EntityMetadata>> {
        self.entity_for_class(object.class()?)
    }

    /// Field metadata for `field` of an object.
    #[must_use]
    pub fn field_of(&self, object: &Object, field: &str) -> Option<Arc<FieldMetadata>> {
        self.field_for_class(object.class()?, field)
    }

    /// Entity metadata registered for `class`.
    #[must_use]
    pub fn entity_for_class(&self, class: &str) -> Option<Arc<EntityMetadata>> {
        if let Some(found) = read(&self.entities).get(class) {
            return Some(Arc::clone(found));
        }
        let found = self.store.lookup_entity(class)?;
        debug!(class, "caching entity metadata");
        let mut cache = write(&self.entities);
        Some(Arc::clone(cache.entry(class.to_owned()).or_insert(found)))
    }

    /// Field metadata registered for `field` of `class`.
    #[must_use]
    pub fn field_for_class(&self, class: &str, field: &str) -> Option<Arc<FieldMetadata>> {
        let key = (class.to_owned(), field.to_owned());
        if let Some(found) = read(&self.fields).get(&key) {
            return Some(Arc::clone(found));
        }
        let found = self.store.lookup_field(class, field)?;
        debug!(class, field, "caching field metadata");
        let mut cache = write(&self.fields);
        Some(Arc::clone(cache.entry(key).or_insert(found)))
    }
}

impl fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("entities", &read(&self.entities).len())
            .field("fields", &read(&self.fields).len())
            .finish_non_exhaustive()
    }
}

// The caches are append-only maps of immutable records, so a poisoned lock
// still guards consistent data.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}
