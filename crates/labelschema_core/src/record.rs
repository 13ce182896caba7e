//! Flat schema record for the persistence boundary.
//!
//! # Responsibility
//! - Flatten a `LabelSchema` into a serde-friendly record and rebuild it.
//!
//! # Invariants
//! - Group order, group member order and label order survive a round trip.
//! - Deleted ids are a set; the record stores them sorted.
//! - Rebuilding rejects references to labels the record does not carry.
//! - Rebuilding does not re-run deletion rules: stored state is trusted as
//!   long as it is structurally sound.

use crate::model::group::{LabelGroup, LabelGroupId, LabelGroupKind};
use crate::model::label::{Label, LabelId};
use crate::model::schema::{LabelSchema, ProjectId, Provenance, SchemaId};
use crate::model::tree::{LabelTree, LabelTreeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for record conversion.
pub type RecordResult<T> = Result<T, RecordError>;

/// Record decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Two label entries share one id.
    DuplicateLabel(LabelId),
    /// A group, tree node or edge references a label missing from `labels`.
    UnknownLabel {
        context: &'static str,
        label_id: LabelId,
    },
    /// Stored edges do not form a valid hierarchy.
    Hierarchy(LabelTreeError),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateLabel(id) => write!(f, "label listed twice in record: {id}"),
            Self::UnknownLabel { context, label_id } => {
                write!(f, "{context} references unknown label {label_id}")
            }
            Self::Hierarchy(err) => write!(f, "invalid stored hierarchy: {err}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hierarchy(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LabelTreeError> for RecordError {
    fn from(value: LabelTreeError) -> Self {
        Self::Hierarchy(value)
    }
}

/// One stored hierarchy edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTreeEdgeRecord {
    pub child: LabelId,
    pub parent: LabelId,
}

/// One stored label group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelGroupRecord {
    pub id: LabelGroupId,
    pub name: String,
    pub kind: LabelGroupKind,
    /// Member ids in display order.
    pub label_ids: Vec<LabelId>,
}

/// Flat, storage-agnostic shape of one schema revision or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSchemaRecord {
    pub id: SchemaId,
    pub project_id: Option<ProjectId>,
    pub previous_schema_revision_id: Option<SchemaId>,
    pub provenance: Provenance,
    /// Grouped and hierarchy-only labels, deleted ones included.
    pub labels: Vec<Label>,
    /// Hierarchy nodes in insertion order.
    pub label_tree_nodes: Vec<LabelId>,
    pub label_tree_edges: Vec<LabelTreeEdgeRecord>,
    pub groups: Vec<LabelGroupRecord>,
    /// Sorted.
    pub deleted_label_ids: Vec<LabelId>,
}

impl LabelSchema {
    /// Flattens this schema.
    pub fn to_record(&self) -> LabelSchemaRecord {
        LabelSchemaRecord {
            id: self.id,
            project_id: self.project_id,
            previous_schema_revision_id: self.previous_schema_revision_id,
            provenance: self.provenance,
            labels: self.known_labels(),
            label_tree_nodes: self
                .label_tree
                .nodes()
                .into_iter()
                .map(|label| label.id)
                .collect(),
            label_tree_edges: self
                .label_tree
                .edges()
                .into_iter()
                .map(|(child, parent)| LabelTreeEdgeRecord { child, parent })
                .collect(),
            groups: self
                .raw_groups()
                .iter()
                .map(|group| LabelGroupRecord {
                    id: group.id,
                    name: group.name.clone(),
                    kind: group.kind,
                    label_ids: group.label_ids(),
                })
                .collect(),
            deleted_label_ids: self.deleted_label_ids.iter().copied().collect(),
        }
    }

    /// Rebuilds a schema from its flat record.
    ///
    /// # Errors
    /// - `DuplicateLabel` when `labels` repeats an id.
    /// - `UnknownLabel` when groups or the hierarchy reference missing labels.
    /// - `Hierarchy` when edges give a label two parents or form a cycle.
    pub fn from_record(record: LabelSchemaRecord) -> RecordResult<Self> {
        let mut by_id: HashMap<LabelId, Label> = HashMap::with_capacity(record.labels.len());
        for label in record.labels {
            let id = label.id;
            if by_id.insert(id, label).is_some() {
                return Err(RecordError::DuplicateLabel(id));
            }
        }
        let resolve = |context: &'static str, label_id: LabelId| {
            by_id
                .get(&label_id)
                .ok_or(RecordError::UnknownLabel { context, label_id })
        };

        let mut label_tree = LabelTree::new();
        for id in &record.label_tree_nodes {
            label_tree.add_node(resolve("label tree node", *id)?.clone());
        }
        let mut edges = Vec::with_capacity(record.label_tree_edges.len());
        for edge in &record.label_tree_edges {
            edges.push((
                resolve("label tree edge", edge.child)?,
                resolve("label tree edge", edge.parent)?,
            ));
        }
        label_tree.add_edges(edges)?;

        let mut groups = Vec::with_capacity(record.groups.len());
        for group in record.groups {
            let labels = group
                .label_ids
                .iter()
                .map(|id| resolve("label group", *id).cloned())
                .collect::<RecordResult<Vec<_>>>()?;
            groups.push(LabelGroup::with_id(group.id, group.name, labels, group.kind));
        }

        Ok(Self {
            id: record.id,
            project_id: record.project_id,
            previous_schema_revision_id: record.previous_schema_revision_id,
            label_tree,
            groups,
            deleted_label_ids: record.deleted_label_ids.into_iter().collect(),
            provenance: record.provenance,
        })
    }
}
