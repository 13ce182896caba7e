//! Label domain model.
//!
//! # Responsibility
//! - Define the atomic classification tag referenced by groups and trees.
//! - Validate presentation attributes supplied at the REST boundary.
//!
//! # Invariants
//! - Equality and hashing use `id` only; two labels with the same id are
//!   interchangeable in sets and maps.
//! - `id` is never nil.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier of one label across schema revisions.
pub type LabelId = Uuid;

/// Color assigned to labels created without an explicit color.
pub const DEFAULT_LABEL_COLOR: &str = "#808080ff";

static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // `#RRGGBB` or `#RRGGBBAA`, case-insensitive hex.
    Regex::new(r"^#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("color pattern is valid")
});

/// Label validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValidationError {
    /// Id is the nil uuid.
    NilId,
    /// Name is blank after trim.
    BlankName,
    /// Color is not `#RRGGBB` / `#RRGGBBAA`.
    InvalidColor(String),
    /// Hotkey is present but blank.
    InvalidHotkey(String),
}

impl Display for LabelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "label id must not be nil"),
            Self::BlankName => write!(f, "label name must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "label color must look like #RRGGBBAA, got `{value}`")
            }
            Self::InvalidHotkey(value) => write!(f, "label hotkey is invalid: `{value}`"),
        }
    }
}

impl Error for LabelValidationError {}

/// Annotation label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Stable id used for equality, hierarchy edges and deletion markers.
    pub id: LabelId,
    /// User-facing name, unique within one task by convention.
    pub name: String,
    /// Display color, `#RRGGBBAA`.
    pub color: String,
    /// Optional keyboard shortcut in the annotator.
    pub hotkey: Option<String>,
    /// Marks the special "no object" label of a task.
    pub is_empty: bool,
    /// Marks the label used for anomalous samples.
    pub is_anomalous: bool,
}

impl Label {
    /// Creates a non-empty label with a generated id and default color.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: DEFAULT_LABEL_COLOR.to_string(),
            hotkey: None,
            is_empty: false,
            is_anomalous: false,
        }
    }

    /// Creates a label with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: LabelId, name: impl Into<String>) -> Result<Self, LabelValidationError> {
        if id.is_nil() {
            return Err(LabelValidationError::NilId);
        }
        Ok(Self {
            id,
            ..Self::new(name)
        })
    }

    /// Creates the "no object" label for a task.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            is_empty: true,
            ..Self::new(name)
        }
    }

    /// Builder-style color override.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Builder-style hotkey override.
    pub fn with_hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = Some(hotkey.into());
        self
    }

    /// Checks presentation invariants.
    ///
    /// # Errors
    /// - `NilId` for a nil uuid.
    /// - `BlankName` when the trimmed name is empty.
    /// - `InvalidColor` when `color` is not a hex RGB(A) string.
    /// - `InvalidHotkey` when `hotkey` is present but blank.
    pub fn validate(&self) -> Result<(), LabelValidationError> {
        if self.id.is_nil() {
            return Err(LabelValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(LabelValidationError::BlankName);
        }
        if !COLOR_PATTERN.is_match(&self.color) {
            return Err(LabelValidationError::InvalidColor(self.color.clone()));
        }
        if let Some(hotkey) = &self.hotkey {
            if hotkey.trim().is_empty() {
                return Err(LabelValidationError::InvalidHotkey(hotkey.clone()));
            }
        }
        Ok(())
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::{Label, LabelValidationError, DEFAULT_LABEL_COLOR};
    use std::collections::HashSet;
    use uuid::Uuid;

    #[test]
    fn equality_ignores_everything_but_id() {
        let id = Uuid::new_v4();
        let a = Label::with_id(id, "car").unwrap();
        let b = Label::with_id(id, "vehicle").unwrap().with_color("#ff0000ff");

        assert_eq!(a, b);
        let set: HashSet<Label> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn new_label_passes_validation() {
        let label = Label::new("dog");
        assert_eq!(label.color, DEFAULT_LABEL_COLOR);
        assert!(!label.is_empty);
        label.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_color_and_blank_name() {
        let bad_color = Label::new("dog").with_color("red");
        assert_eq!(
            bad_color.validate().unwrap_err(),
            LabelValidationError::InvalidColor("red".to_string())
        );

        let blank = Label::new("   ");
        assert_eq!(
            blank.validate().unwrap_err(),
            LabelValidationError::BlankName
        );
    }

    #[test]
    fn with_id_rejects_nil_uuid() {
        let err = Label::with_id(Uuid::nil(), "x").unwrap_err();
        assert_eq!(err, LabelValidationError::NilId);
    }
}
