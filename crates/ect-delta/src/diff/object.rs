use indexmap::IndexMap;

use super::{diff_impl, DiffContext};
use crate::{Delta, Object};

/// Fields are visited in the old object's order, followed by fields that only
/// exist on the new side.
pub(super) fn diff_objects(lhs: &Object, rhs: &Object, context: &DiffContext<'_>) -> Option<Delta> {
    let mut children = IndexMap::new();

    for (key, value) in lhs {
        if !context.hooks.include_field(key, lhs, rhs) {
            continue;
        }
        if let Some(delta) = diff_impl(Some(value), rhs.get(key), context) {
            children.insert(key.clone(), delta);
        }
    }

    for (key, value) in rhs {
        if lhs.contains_key(key) || !context.hooks.include_field(key, lhs, rhs) {
            continue;
        }
        children.insert(key.clone(), Delta::added(value.clone()));
    }

    if children.is_empty() {
        None
    } else {
        Some(Delta::Object(children))
    }
}
