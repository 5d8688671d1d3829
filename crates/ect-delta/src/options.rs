use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// Configuration knobs for the delta engine's array handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaOptions {
    detect_move: bool,
    include_value_on_move: bool,
}

impl Default for DeltaOptions {
    fn default() -> Self {
        Self { detect_move: true, include_value_on_move: false }
    }
}

impl DeltaOptions {
    /// Indicates whether removed and added array items with the same
    /// identity are reported as moves.
    ///
    /// ```
    /// # use ect_delta::DeltaOptions;
    /// assert!(DeltaOptions::default().detect_move());
    /// ```
    #[must_use]
    pub fn detect_move(&self) -> bool {
        self.detect_move
    }

    /// Indicates whether move entries carry the moved value instead of `""`.
    ///
    /// ```
    /// # use ect_delta::DeltaOptions;
    /// assert!(!DeltaOptions::default().include_value_on_move());
    /// ```
    #[must_use]
    pub fn include_value_on_move(&self) -> bool {
        self.include_value_on_move
    }

    /// Enables or disables move detection.
    ///
    /// ```
    /// # use ect_delta::{DeltaOptions, OptionsError};
    /// let err = DeltaOptions::default()
    ///     .with_include_value_on_move(true)
    ///     .and_then(|opts| opts.with_detect_move(false))
    ///     .unwrap_err();
    /// assert_eq!(err, OptionsError::ValueOnMoveRequiresMoveDetection);
    /// ```
    pub fn with_detect_move(mut self, enabled: bool) -> Result<Self, OptionsError> {
        self.detect_move = enabled;
        self.validate()?;
        Ok(self)
    }

    /// Enables or disables inlining of moved values.
    ///
    /// ```
    /// # use ect_delta::DeltaOptions;
    /// let opts = DeltaOptions::default()
    ///     .with_include_value_on_move(true)
    ///     .expect("move detection is on by default");
    /// assert!(opts.include_value_on_move());
    /// ```
    pub fn with_include_value_on_move(mut self, enabled: bool) -> Result<Self, OptionsError> {
        self.include_value_on_move = enabled;
        self.validate()?;
        Ok(self)
    }

    /// Turns on move detection with moved values inlined; always valid.
    ///
    /// ```
    /// # use ect_delta::DeltaOptions;
    /// let opts = DeltaOptions::default().with_moves_inline();
    /// assert!(opts.detect_move() && opts.include_value_on_move());
    /// ```
    #[must_use]
    pub fn with_moves_inline(mut self) -> Self {
        self.detect_move = true;
        self.include_value_on_move = true;
        self
    }

    /// Checks option combinations, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.include_value_on_move && !self.detect_move {
            return Err(OptionsError::ValueOnMoveRequiresMoveDetection);
        }
        Ok(())
    }
}
