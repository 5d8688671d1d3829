use std::fmt;

use ect_delta::CaptureError;
use thiserror::Error;

/// Errors raised while turning two values into change records.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The delta contained an edit that matches none of the known encodings.
    #[error("malformed delta at {path}: {shape}")]
    MalformedDelta {
        /// Keys leading to the offending entry, joined with `.`.
        path: String,
        /// The offending entry, rendered as JSON.
        shape: String,
    },
    /// One of the inputs could not be captured into a node tree.
    #[error("failed to capture value: {0}")]
    Capture(#[from] CaptureError),
}

/// Failure reported by a custom value formatter.
///
/// The formatter recovers from it by falling back to the default
/// stringifier, so it never reaches the caller of
/// [`Formatter::format_all`](crate::Formatter::format_all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    message: String,
}

impl FormatError {
    /// Creates an error carrying `message`.
    ///
    /// ```
    /// # use ect_core::FormatError;
    /// assert_eq!(FormatError::new("no city").to_string(), "no city");
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FormatError {}

/// Errors raised while loading message templates.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A template lacks one of the placeholders it must render.
    #[error("template `{template}` is missing placeholder {{{placeholder}}}")]
    MissingPlaceholder {
        /// Name of the template (`edit` or `move`).
        template: &'static str,
        /// The placeholder name, without braces.
        placeholder: &'static str,
    },
    /// The JSON source was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The YAML source was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
