//! Label group model.
//!
//! # Responsibility
//! - Hold the ordered labels of one task that share a selection rule.
//!
//! # Invariants
//! - Label order is display order and is preserved as inserted.
//! - Equality compares id, kind and the *set* of label ids; order is ignored.

use crate::model::label::{Label, LabelId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable label group identifier.
pub type LabelGroupId = Uuid;

/// Selection rule of a label group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelGroupKind {
    /// Labels are mutually exclusive (multiclass).
    Exclusive,
    /// Group holding the "no object" label of a task.
    EmptyLabel,
}

/// Named, ordered collection of labels.
#[derive(Debug, Clone)]
pub struct LabelGroup {
    pub id: LabelGroupId,
    pub name: String,
    pub labels: Vec<Label>,
    pub kind: LabelGroupKind,
}

impl LabelGroup {
    /// Creates an exclusive group with a generated id.
    ///
    /// Empty label lists are accepted; read paths drop groups left empty.
    pub fn new(name: impl Into<String>, labels: Vec<Label>) -> Self {
        Self::with_kind(name, labels, LabelGroupKind::Exclusive)
    }

    /// Creates a group of the given kind with a generated id.
    pub fn with_kind(name: impl Into<String>, labels: Vec<Label>, kind: LabelGroupKind) -> Self {
        Self::with_id(Uuid::new_v4(), name, labels, kind)
    }

    /// Creates a group with a caller-provided id.
    pub fn with_id(
        id: LabelGroupId,
        name: impl Into<String>,
        labels: Vec<Label>,
        kind: LabelGroupKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            labels,
            kind,
        }
    }

    /// Removes every occurrence of `label`; no-op when absent.
    pub fn remove_label(&mut self, label: &Label) {
        self.labels.retain(|member| member != label);
    }

    /// Returns whether the group has exactly one label.
    pub fn is_single_label(&self) -> bool {
        self.labels.len() == 1
    }

    /// Returns whether the group contains `label_id`.
    pub fn contains(&self, label_id: LabelId) -> bool {
        self.labels.iter().any(|label| label.id == label_id)
    }

    /// Returns member ids in display order.
    pub fn label_ids(&self) -> Vec<LabelId> {
        self.labels.iter().map(|label| label.id).collect()
    }

    /// Copy of this group keeping only labels accepted by `keep`.
    pub(crate) fn filtered(&self, mut keep: impl FnMut(&Label) -> bool) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            labels: self
                .labels
                .iter()
                .filter(|label| keep(*label))
                .cloned()
                .collect(),
            kind: self.kind,
        }
    }

    fn label_id_set(&self) -> HashSet<LabelId> {
        self.labels.iter().map(|label| label.id).collect()
    }
}

impl PartialEq for LabelGroup {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind && self.label_id_set() == other.label_id_set()
    }
}

impl Eq for LabelGroup {}

#[cfg(test)]
mod tests {
    use super::{LabelGroup, LabelGroupKind};
    use crate::model::label::Label;

    #[test]
    fn equality_ignores_label_order() {
        let a = Label::new("a");
        let b = Label::new("b");
        let first = LabelGroup::new("g", vec![a.clone(), b.clone()]);
        let mut second = first.clone();
        second.labels = vec![b, a];

        assert_eq!(first, second);
        assert_eq!(first.labels[0].name, "a");
        assert_eq!(second.labels[0].name, "b");
    }

    #[test]
    fn equality_requires_same_id_and_kind() {
        let a = Label::new("a");
        let first = LabelGroup::new("g", vec![a.clone()]);
        let other_id = LabelGroup::new("g", vec![a.clone()]);
        let mut other_kind = first.clone();
        other_kind.kind = LabelGroupKind::EmptyLabel;

        assert_ne!(first, other_id);
        assert_ne!(first, other_kind);
    }

    #[test]
    fn remove_label_is_noop_when_absent() {
        let a = Label::new("a");
        let b = Label::new("b");
        let mut group = LabelGroup::new("g", vec![a.clone()]);

        group.remove_label(&b);
        assert!(group.is_single_label());

        group.remove_label(&a);
        assert!(group.labels.is_empty());
        assert!(!group.is_single_label());
    }
}
