//! Entity change tracking for audit logs.
//!
//! `ect-core` compares two versions of a value, interprets the resulting
//! delta into [`ChangeRecord`]s annotated with registered field names, and
//! renders those records as readable lines. Metadata is registered once in
//! a [`Registry`] and shared through a [`MetadataResolver`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use ect_core::{EntityMetadata, FieldMetadata, Formatter, MetadataResolver, Registry, Tracker};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Address {
//!     street: String,
//!     city: String,
//! }
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     address: Address,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::new()
//!         .with_entity("User", EntityMetadata::named("User"))
//!         .with_field("User", "name", FieldMetadata::named("Name"))
//!         .with_field("User", "address", FieldMetadata::named("Address"))
//!         .with_field("Address", "city", FieldMetadata::named("City"));
//!     let resolver = Arc::new(MetadataResolver::new(registry));
//!
//!     let old = User {
//!         name: "Zhang".into(),
//!         address: Address { street: "Old".into(), city: "Beijing".into() },
//!     };
//!     let new = User {
//!         name: "Li".into(),
//!         address: Address { street: "Old".into(), city: "Shanghai".into() },
//!     };
//!
//!     let records = Tracker::new(Arc::clone(&resolver)).track_values(&old, &new)?;
//!     let lines = Formatter::new(resolver).format_all(&records);
//!     assert_eq!(
//!         lines,
//!         [
//!             "Edited field [Name]: [Zhang => Li]",
//!             "Edited field [Address][City]: [Beijing => Shanghai]",
//!         ]
//!     );
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod extract;
mod format;
mod messages;
pub mod metadata;
mod record;
mod resolver;

pub use error::{ConfigError, FormatError, TrackError};
pub use extract::{Tracker, ROOT_KEY};
pub use format::Formatter;
pub use messages::Messages;
pub use metadata::{EntityMetadata, FieldMetadata, MetadataStore, Registry};
pub use record::{ChangeOp, ChangeRecord, PathSegment};
pub use resolver::MetadataResolver;

/// Returns the semantic version of the `ect-core` crate.
///
/// ```
/// assert!(!ect_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
