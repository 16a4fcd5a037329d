//! Editing configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geometry::{GridPolicy, SnapPolicy, DEFAULT_MIN_SIZE};

/// How pointer edits are quantized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Grid step policy.
    pub grid: GridPolicy,
    /// When drags are snapped.
    pub snap: SnapPolicy,
    /// Smallest width or height a resize can produce.
    pub min_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid: GridPolicy::default(),
            snap: SnapPolicy::default(),
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

impl EditorConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable grid step or a minimum size that is
    /// not positive and finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.grid.validate()?;
        if !self.min_size.is_finite() {
            return Err(ValidationError::NonFinite { field: "minSize" });
        }
        if self.min_size <= 0.0 {
            return Err(ValidationError::NonPositiveDimension {
                field: "minSize",
                value: self.min_size,
            });
        }
        Ok(())
    }
}
