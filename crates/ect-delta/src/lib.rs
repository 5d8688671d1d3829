//! Value model and move-aware structural delta engine.
//!
//! `ect-delta` captures arbitrary `Serialize` values into a classed [`Node`]
//! tree and computes jsondiffpatch-style [`Delta`] documents between two
//! trees. Array elements are paired through caller-supplied [`DiffHooks`],
//! which also decide which object fields take part in a comparison.
//!
//! ```
//! use ect_delta::{to_node, DeltaOptions, Differ};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     tags: Vec<&'static str>,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let old = to_node(&User { name: "Zhang".into(), tags: vec!["a", "b", "c"] })?;
//!     let new = to_node(&User { name: "Li".into(), tags: vec!["c", "a", "b"] })?;
//!     assert_eq!(old.class(), Some("User"));
//!
//!     let delta = Differ::new(DeltaOptions::default().with_moves_inline())
//!         .diff(&old, &new)
//!         .expect("values differ");
//!     assert_eq!(
//!         delta.to_json_value().to_string(),
//!         r#"{"name":["Zhang","Li"],"tags":{"_t":"a","_2":["c",0,3]}}"#
//!     );
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capture;
pub mod delta;
pub mod diff;
mod error;
mod node;
mod number;
mod options;

pub use capture::to_node;
pub use delta::{ArraySlot, Delta, ARRAY_MARKER, ARRAY_MARKER_KEY, MOVED_MARKER, VACATED_PREFIX};
pub use diff::{DiffEngine, DiffHooks, Differ, NoHooks};
pub use error::{CanonicalizeError, CaptureError, DeltaFormatError, OptionsError};
pub use node::{Node, Object};
pub use number::Number;
pub use options::DeltaOptions;

/// Returns the semantic version of the `ect-delta` crate.
///
/// ```
/// assert!(!ect_delta::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
