use serde::{Deserialize, Serialize};

use crate::ConfigError;

const EDIT_PLACEHOLDERS: [&str; 3] = ["path", "old", "new"];
const MOVE_PLACEHOLDERS: [&str; 4] = ["path", "value", "from", "to"];

/// Templates used to render change records.
///
/// `edit` renders additions, removals and replacements; `move` renders array
/// moves. Placeholders are written as `{name}`; unknown names are kept
/// verbatim.
///
/// ```
/// # use ect_core::Messages;
/// let messages = Messages::from_yaml_str("edit: \"{path} changed from {old} to {new}\"")?;
/// assert_eq!(messages.render_edit("[city]", "Beijing", "Shanghai"), "[city] changed from Beijing to Shanghai");
/// assert_eq!(messages.placeholder(), "--");
/// # Ok::<(), ect_core::ConfigError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    placeholder: String,
    edit: String,
    #[serde(rename = "move")]
    moved: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self::en()
    }
}

impl Messages {
    /// English templates.
    #[must_use]
    pub fn en() -> Self {
        Self {
            placeholder: "--".to_owned(),
            edit: "Edited field {path}: [{old} => {new}]".to_owned(),
            moved: "Moved {path}[{value}] from {from} to {to}".to_owned(),
        }
    }

    /// Simplified Chinese templates.
    ///
    /// ```
    /// # use ect_core::Messages;
    /// let text = Messages::zh_cn().render_edit("[name]", "Zhang", "Li");
    /// assert_eq!(text, "编辑字段[name]: [Zhang => Li]");
    /// ```
    #[must_use]
    pub fn zh_cn() -> Self {
        Self {
            placeholder: "--".to_owned(),
            edit: "编辑字段{path}: [{old} => {new}]".to_owned(),
            moved: "将{path}[{value}]从{from}移动到{to}".to_owned(),
        }
    }

    /// Parses and validates templates from YAML.
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        let messages: Self = serde_yaml::from_str(input)?;
        messages.validate()?;
        Ok(messages)
    }

    /// Parses and validates templates from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let messages: Self = serde_json::from_str(input)?;
        messages.validate()?;
        Ok(messages)
    }

    /// Replaces the text shown for absent values.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Replaces the edit template.
    pub fn with_edit(mut self, template: impl Into<String>) -> Result<Self, ConfigError> {
        self.edit = template.into();
        self.validate()?;
        Ok(self)
    }

    /// Replaces the move template.
    ///
    /// ```
    /// # use ect_core::{ConfigError, Messages};
    /// let err = Messages::en().with_move("{path} moved").unwrap_err();
    /// assert!(matches!(err, ConfigError::MissingPlaceholder { template: "move", placeholder: "value" }));
    /// ```
    pub fn with_move(mut self, template: impl Into<String>) -> Result<Self, ConfigError> {
        self.moved = template.into();
        self.validate()?;
        Ok(self)
    }

    /// Checks that every template mentions all of its placeholders.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("edit", &self.edit, &EDIT_PLACEHOLDERS)?;
        require("move", &self.moved, &MOVE_PLACEHOLDERS)
    }

    /// Text shown for absent values.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Renders the edit template.
    #[must_use]
    pub fn render_edit(&self, path: &str, old: &str, new: &str) -> String {
        fill(&self.edit, &[("path", path), ("old", old), ("new", new)])
    }

    /// Renders the move template.
    #[must_use]
    pub fn render_move(&self, path: &str, value: &str, from: &str, to: &str) -> String {
        fill(&self.moved, &[("path", path), ("value", value), ("from", from), ("to", to)])
    }
}

fn require(template: &'static str, text: &str, placeholders: &[&'static str]) -> Result<(), ConfigError> {
    for &placeholder in placeholders {
        if !text.contains(&format!("{{{placeholder}}}")) {
            return Err(ConfigError::MissingPlaceholder { template, placeholder });
        }
    }
    Ok(())
}

// Single pass, so substituted values are never scanned for placeholders.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let substitution = after
            .find('}')
            .and_then(|end| values.iter().find(|(name, _)| *name == &after[..end]).map(|(_, value)| (end, value)));
        match substitution {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
