use thiserror::Error;

/// Errors that can occur while canonicalizing external data into [`Node`](crate::Node).
#[derive(Debug, Error)]
pub enum CanonicalizeError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Encountered a number that cannot be represented as an IEEE-754 f64.
    #[error("number {value} cannot be represented as f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// YAML maps may only contain string keys.
    #[error("unsupported YAML key type: {found}")]
    NonStringYamlKey {
        /// A description of the key that triggered the error.
        found: String,
    },
    /// YAML tags carry no meaning in the node model and are rejected.
    #[error("unsupported YAML tag: {tag}")]
    UnsupportedYamlTag {
        /// The tag identifier encountered in the document.
        tag: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
}

/// Errors raised while capturing a `Serialize` value into a node tree.
#[derive(Debug, Error, PartialEq)]
pub enum CaptureError {
    /// The `Serialize` implementation reported a failure of its own.
    #[error("{0}")]
    Custom(String),
    /// Floats must be finite to become a node.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
    /// Map keys must serialize to a string, integer, bool or char.
    #[error("map key must be a scalar. got {found}")]
    NonScalarKey {
        /// Kind of node the key serialized into.
        found: &'static str,
    },
}

impl serde::ser::Error for CaptureError {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}

/// Errors emitted when constructing [`DeltaOptions`](crate::DeltaOptions).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// Moved values can only be inlined when moves are detected.
    #[error("including values on move requires move detection")]
    ValueOnMoveRequiresMoveDetection,
}

/// Errors raised when a JSON document does not describe a delta.
#[derive(Debug, Error)]
pub enum DeltaFormatError {
    /// The underlying text was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value inside an edit could not be canonicalized.
    #[error(transparent)]
    Value(#[from] CanonicalizeError),
    /// A delta level was neither an edit list nor an object.
    #[error("expected edit list or object at {path}. got {found}")]
    UnexpectedValue {
        /// Location of the offending value.
        path: String,
        /// JSON type found instead.
        found: &'static str,
    },
    /// The `_t` discriminator held something other than `"a"`.
    #[error("unknown delta type marker {marker} at {path}")]
    UnknownMarker {
        /// Location of the offending level.
        path: String,
        /// The marker value, rendered as JSON.
        marker: String,
    },
}
