//! Interpretation of delta documents into change records.

use std::sync::Arc;

use ect_delta::{
    to_node, ArraySlot, Delta, DeltaOptions, DiffEngine, DiffHooks, Differ, Node, Number, Object, MOVED_MARKER,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{ChangeOp, ChangeRecord, FieldMetadata, MetadataResolver, PathSegment, TrackError};

/// Key of the single path segment of a change at the root of the compared values.
pub const ROOT_KEY: &str = "$";

/// Computes the change records between two versions of a value.
///
/// ```
/// use std::sync::Arc;
/// use ect_core::{ChangeOp, FieldMetadata, MetadataResolver, Registry, Tracker};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User {
///     name: String,
/// }
///
/// let registry = Registry::new().with_field("User", "name", FieldMetadata::named("Name"));
/// let tracker = Tracker::new(Arc::new(MetadataResolver::new(registry)));
/// let records = tracker.track_values(&User { name: "Zhang".into() }, &User { name: "Li".into() })?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].op, ChangeOp::Replace);
/// assert_eq!(records[0].paths[0].name(), Some("Name"));
/// # Ok::<(), ect_core::TrackError>(())
/// ```
#[derive(Debug)]
pub struct Tracker<E = Differ> {
    resolver: Arc<MetadataResolver>,
    engine: E,
}

impl Tracker<Differ> {
    /// Creates a tracker using the built-in engine with move detection on
    /// and moved values inlined.
    #[must_use]
    pub fn new(resolver: Arc<MetadataResolver>) -> Self {
        Self::with_engine(resolver, Differ::new(DeltaOptions::default().with_moves_inline()))
    }
}

impl<E: DiffEngine> Tracker<E> {
    /// Creates a tracker driving a custom diff engine.
    pub fn with_engine(resolver: Arc<MetadataResolver>, engine: E) -> Self {
        Self { resolver, engine }
    }

    /// The shared metadata resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<MetadataResolver> {
        &self.resolver
    }

    /// Returns the changes turning `old` into `new`, in delta traversal order.
    ///
    /// `null` stands for an absent value; two absent values have no changes.
    pub fn track(&self, old: &Node, new: &Node) -> Result<Vec<ChangeRecord>, TrackError> {
        if old.is_null() && new.is_null() {
            return Ok(Vec::new());
        }
        let hooks = EntityHooks { resolver: &self.resolver };
        let Some(delta) = self.engine.diff(old, new, &hooks) else {
            debug!("values are identical");
            return Ok(Vec::new());
        };
        let records = self.interpret(&delta, Some(old), Some(new))?;
        debug!(records = records.len(), "tracked changes");
        Ok(records)
    }

    /// Captures both values with [`to_node`] and tracks them.
    pub fn track_values<T>(&self, old: &T, new: &T) -> Result<Vec<ChangeRecord>, TrackError>
    where
        T: ?Sized + Serialize,
    {
        let old = to_node(old)?;
        let new = to_node(new)?;
        self.track(&old, &new)
    }

    /// Converts an existing delta into change records.
    ///
    /// `old` and `new` are the values the delta was computed from; they are
    /// only consulted for metadata lookups, the old side first.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use ect_core::{ChangeOp, MetadataResolver, Registry, Tracker};
    /// # use ect_delta::Delta;
    /// let tracker = Tracker::new(Arc::new(MetadataResolver::new(Registry::new())));
    /// let delta = Delta::from_json_str(r#"{"tags":{"_t":"a","_2":["C",0,3]}}"#).unwrap();
    /// let records = tracker.interpret(&delta, None, None)?;
    /// assert_eq!(records[0].op, ChangeOp::Move);
    /// assert_eq!((records[0].from_index, records[0].to_index), (Some(2), Some(0)));
    /// # Ok::<(), ect_core::TrackError>(())
    /// ```
    pub fn interpret(
        &self,
        delta: &Delta,
        old: Option<&Node>,
        new: Option<&Node>,
    ) -> Result<Vec<ChangeRecord>, TrackError> {
        let mut records = Vec::new();
        match delta {
            Delta::Edit(edit) => {
                let record = classify(edit, vec![PathSegment::new(ROOT_KEY)], None)?;
                trace!(op = %record.op, path = ?record.keys(), "change");
                records.push(record);
            }
            Delta::Object(_) | Delta::Array(_) => self.process(delta, &[], old, new, &mut records)?,
        }
        Ok(records)
    }

    fn process(
        &self,
        delta: &Delta,
        prefix: &[PathSegment],
        old: Option<&Node>,
        new: Option<&Node>,
        records: &mut Vec<ChangeRecord>,
    ) -> Result<(), TrackError> {
        let in_array = matches!(delta, Delta::Array(_));
        let owner = old.or(new);

        for (raw_key, child) in delta.entries() {
            let slot = if in_array { ArraySlot::parse(raw_key) } else { None };
            let key = slot.map_or_else(|| raw_key.clone(), |slot| slot.index().to_string());

            let segment = match slot {
                Some(_) => PathSegment::new(&key).with_metadata(None, prefix.last().and_then(PathSegment::format)),
                None => {
                    let field = self.resolver.resolve_field(owner, &key);
                    let field = field.as_deref();
                    PathSegment::new(&key)
                        .with_metadata(field.and_then(FieldMetadata::name), field.and_then(FieldMetadata::format))
                }
            };
            let mut paths = prefix.to_vec();
            paths.push(segment);

            match child {
                Delta::Edit(edit) => {
                    let record = classify(edit, paths, slot)?;
                    trace!(op = %record.op, path = ?record.keys(), "change");
                    records.push(record);
                }
                nested => {
                    if let Some(ArraySlot::Vacated(_)) = slot {
                        return Err(malformed(&paths, &nested.to_json_value().to_string()));
                    }
                    let old_child = old.and_then(|node| node.child(&key));
                    let new_child = new.and_then(|node| node.child(&key));
                    self.process(nested, &paths, old_child, new_child, records)?;
                }
            }
        }
        Ok(())
    }
}

fn classify(edit: &[Node], paths: Vec<PathSegment>, slot: Option<ArraySlot>) -> Result<ChangeRecord, TrackError> {
    let shape = || Delta::Edit(edit.to_vec()).to_json_value().to_string();
    let (op, value, old_value, to_index) = match edit {
        [value] => (ChangeOp::Add, value, None, None),
        [old, new] => (ChangeOp::Replace, new, Some(old), None),
        [value, Node::Number(to), Node::Number(marker)] if *marker == Number::from(MOVED_MARKER) => {
            let Some(to) = to.as_index() else {
                return Err(malformed(&paths, &shape()));
            };
            (ChangeOp::Move, value, None, Some(to))
        }
        [value, _, _] => (ChangeOp::Remove, value, None, None),
        _ => return Err(malformed(&paths, &shape())),
    };

    let from_index = match (op, slot) {
        (ChangeOp::Move, Some(ArraySlot::Vacated(from))) => Some(from),
        (ChangeOp::Move, _) => return Err(malformed(&paths, &shape())),
        (ChangeOp::Remove, _) | (_, None | Some(ArraySlot::Index(_))) => None,
        (_, Some(ArraySlot::Vacated(_))) => return Err(malformed(&paths, &shape())),
    };

    Ok(ChangeRecord {
        op,
        paths,
        value: Some(value.clone()),
        old_value: old_value.cloned(),
        from_index,
        to_index,
    })
}

fn malformed(paths: &[PathSegment], shape: &str) -> TrackError {
    let mut path = String::from(ROOT_KEY);
    for segment in paths.iter().filter(|segment| segment.key() != ROOT_KEY) {
        path.push('.');
        path.push_str(segment.key());
    }
    TrackError::MalformedDelta { path, shape: shape.to_owned() }
}

/// Element identity and field filtering derived from entity metadata.
struct EntityHooks<'a> {
    resolver: &'a MetadataResolver,
}

impl DiffHooks for EntityHooks<'_> {
    fn object_hash(&self, item: &Node, index: usize) -> Option<String> {
        let hash = self.resolver.resolve_entity(Some(item)).and_then(|metadata| metadata.object_hash().cloned());
        match hash {
            Some(hash) => hash(item, Some(index)),
            None => Some(index.to_string()),
        }
    }

    fn include_field(&self, field: &str, left: &Object, right: &Object) -> bool {
        let entity = self
            .resolver
            .entity_of(right)
            .map(|metadata| (right, metadata))
            .or_else(|| self.resolver.entity_of(left).map(|metadata| (left, metadata)));
        match entity {
            Some((owner, metadata)) if metadata.exclude_undefined() => self.resolver.field_of(owner, field).is_some(),
            _ => true,
        }
    }
}
