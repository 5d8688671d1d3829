//! Delta computation.
//!
//! [`Differ`] walks two node trees and produces a [`Delta`] following the
//! conventions documented in [`crate::delta`]. Callers steer array element
//! identity and field visibility through [`DiffHooks`].

mod list;
mod object;

use crate::{Delta, DeltaOptions, Node, Object};

/// Caller-supplied rules consulted while diffing.
pub trait DiffHooks {
    /// Identity of a container element inside an array, used to pair
    /// elements across the old and new arrays. `None` means the element can
    /// only be paired with a structurally equal one.
    fn object_hash(&self, item: &Node, index: usize) -> Option<String> {
        let _ = (item, index);
        None
    }

    /// Whether `field` takes part in the comparison of `left` and `right`.
    fn include_field(&self, field: &str, left: &Object, right: &Object) -> bool {
        let _ = (field, left, right);
        true
    }
}

/// Hooks with the default behaviour: no hashing, every field visible.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl DiffHooks for NoHooks {}

/// A structural diff engine producing delta documents.
pub trait DiffEngine {
    /// Returns the delta turning `lhs` into `rhs`, or `None` when they match.
    fn diff(&self, lhs: &Node, rhs: &Node, hooks: &dyn DiffHooks) -> Option<Delta>;
}

/// The built-in move-aware diff engine.
///
/// ```
/// # use ect_delta::{Delta, Differ, DeltaOptions, Node};
/// let lhs = Node::from_json_str("[\"A\",\"B\",\"C\"]")?;
/// let rhs = Node::from_json_str("[\"C\",\"A\",\"B\"]")?;
/// let delta = Differ::new(DeltaOptions::default().with_moves_inline()).diff(&lhs, &rhs).unwrap();
/// assert_eq!(delta.to_json_value().to_string(), r#"{"_t":"a","_2":["C",0,3]}"#);
/// # Ok::<(), ect_delta::CanonicalizeError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Differ {
    options: DeltaOptions,
}

impl Differ {
    /// Creates an engine with the given options.
    #[must_use]
    pub fn new(options: DeltaOptions) -> Self {
        Self { options }
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> DeltaOptions {
        self.options
    }

    /// Diffs two nodes without hooks.
    #[must_use]
    pub fn diff(&self, lhs: &Node, rhs: &Node) -> Option<Delta> {
        self.diff_with(lhs, rhs, &NoHooks)
    }

    /// Diffs two nodes consulting `hooks` for element identity and field filtering.
    #[must_use]
    pub fn diff_with(&self, lhs: &Node, rhs: &Node, hooks: &dyn DiffHooks) -> Option<Delta> {
        let context = DiffContext { options: self.options, hooks };
        diff_impl(Some(lhs), Some(rhs), &context)
    }
}

impl DiffEngine for Differ {
    fn diff(&self, lhs: &Node, rhs: &Node, hooks: &dyn DiffHooks) -> Option<Delta> {
        self.diff_with(lhs, rhs, hooks)
    }
}

pub(crate) struct DiffContext<'a> {
    options: DeltaOptions,
    hooks: &'a dyn DiffHooks,
}

pub(crate) fn diff_impl(lhs: Option<&Node>, rhs: Option<&Node>, context: &DiffContext<'_>) -> Option<Delta> {
    match (lhs, rhs) {
        (None, None) => None,
        (None, Some(added)) => Some(Delta::added(added.clone())),
        (Some(removed), None) => Some(Delta::deleted(removed.clone())),
        (Some(lhs), Some(rhs)) if lhs == rhs => None,
        (Some(Node::Object(left)), Some(Node::Object(right))) => {
            object::diff_objects(left, right, context)
        }
        (Some(Node::Array(left)), Some(Node::Array(right))) => list::diff_lists(left, right, context),
        (Some(lhs), Some(rhs)) => Some(Delta::modified(lhs.clone(), rhs.clone())),
    }
}
