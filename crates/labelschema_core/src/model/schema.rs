//! Label schema aggregate.
//!
//! # Responsibility
//! - Own the label hierarchy and label groups of one project revision.
//! - Enforce naming, hierarchy and deletion rules on mutation.
//! - Derive active (non-deleted) read models on every query.
//!
//! # Invariants
//! - `deleted_label_ids` only grows; removing an id is rejected.
//! - Deleting a label also deletes all of its descendants.
//! - At least `MIN_ACTIVE_LABELS` labels stay active after any deletion.
//! - Deleted labels stay in the tree and groups; only read paths hide them.
//! - Read accessors return owned copies, never references into the aggregate.
//! - Schemas with `Provenance::View` reject structural mutations.

use crate::model::group::{LabelGroup, LabelGroupKind};
use crate::model::label::{Label, LabelId};
use crate::model::tree::{LabelTree, LabelTreeError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable schema revision identifier.
pub type SchemaId = Uuid;
/// Owning project identifier.
pub type ProjectId = Uuid;
/// Task node of a task chain that a view is built for.
pub type TaskNodeId = Uuid;

/// Lowest number of labels that must stay active in a schema.
pub const MIN_ACTIVE_LABELS: usize = 2;

/// Errors from schema mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSchemaError {
    /// Group naming conflict or unresolved parent reference.
    InvalidSchema(String),
    /// A group with this name already exists.
    LabelGroupExists(String),
    /// No group with this name exists.
    LabelGroupDoesNotExist(String),
    /// Deletion would leave fewer than `MIN_ACTIVE_LABELS` active labels.
    LabelDeletion { remaining: usize },
    /// Deletion request drops ids that are already deleted.
    RevertLabelDeletion { reverted: Vec<LabelId> },
    /// Hierarchy edge rejected by the tree.
    Hierarchy(LabelTreeError),
    /// Mutation attempted on a derived view.
    ReadOnlyView(SchemaId),
}

impl Display for LabelSchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSchema(message) => write!(f, "invalid label schema: {message}"),
            Self::LabelGroupExists(name) => write!(f, "label group already exists: {name}"),
            Self::LabelGroupDoesNotExist(name) => {
                write!(f, "label group does not exist: {name}")
            }
            Self::LabelDeletion { remaining } => write!(
                f,
                "cannot delete labels: {remaining} label(s) would remain, at least {MIN_ACTIVE_LABELS} required"
            ),
            Self::RevertLabelDeletion { reverted } => write!(
                f,
                "deleted labels cannot be restored ({} label(s) requested)",
                reverted.len()
            ),
            Self::Hierarchy(err) => write!(f, "{err}"),
            Self::ReadOnlyView(id) => write!(f, "label schema view is read-only: {id}"),
        }
    }
}

impl Error for LabelSchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hierarchy(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LabelTreeError> for LabelSchemaError {
    fn from(value: LabelTreeError) -> Self {
        Self::Hierarchy(value)
    }
}

/// Where a schema comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Project-level schema revision.
    Root,
    /// Projection of a parent schema onto a label subset.
    View {
        parent_schema_id: SchemaId,
        task_node_id: Option<TaskNodeId>,
    },
}

/// Reference to a parent label, either by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Parent with this label id.
    Id(LabelId),
    /// Parent with this exact label name.
    Name(String),
}

impl ParentRef {
    fn matches(&self, label: &Label) -> bool {
        match self {
            Self::Id(id) => label.id == *id,
            Self::Name(name) => label.name == *name,
        }
    }
}

impl From<&str> for ParentRef {
    /// Uuid-shaped input is treated as an id, anything else as a name.
    fn from(value: &str) -> Self {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(value.to_string()),
        }
    }
}

impl Display for ParentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Labels, groups and hierarchy of one schema revision.
#[derive(Debug, Clone)]
pub struct LabelSchema {
    pub(crate) id: SchemaId,
    pub(crate) project_id: Option<ProjectId>,
    pub(crate) previous_schema_revision_id: Option<SchemaId>,
    pub(crate) label_tree: LabelTree,
    pub(crate) groups: Vec<LabelGroup>,
    pub(crate) deleted_label_ids: BTreeSet<LabelId>,
    pub(crate) provenance: Provenance,
}

impl LabelSchema {
    /// Creates an empty root schema with a generated id.
    pub fn new(project_id: Option<ProjectId>) -> Self {
        Self::with_id(Uuid::new_v4(), project_id, None)
    }

    /// Creates an empty root schema with caller-provided identity.
    pub fn with_id(
        id: SchemaId,
        project_id: Option<ProjectId>,
        previous_schema_revision_id: Option<SchemaId>,
    ) -> Self {
        Self {
            id,
            project_id,
            previous_schema_revision_id,
            label_tree: LabelTree::new(),
            groups: Vec::new(),
            deleted_label_ids: BTreeSet::new(),
            provenance: Provenance::Root,
        }
    }

    /// Successor revision: new id, linked back to `self`, same content.
    pub fn new_revision(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            previous_schema_revision_id: Some(self.id),
            ..self.clone()
        }
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn previous_schema_revision_id(&self) -> Option<SchemaId> {
        self.previous_schema_revision_id
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_view(&self) -> bool {
        matches!(self.provenance, Provenance::View { .. })
    }

    /// Complete hierarchy, deleted labels included.
    pub fn label_tree(&self) -> &LabelTree {
        &self.label_tree
    }

    pub fn deleted_label_ids(&self) -> &BTreeSet<LabelId> {
        &self.deleted_label_ids
    }

    /// Every grouped label, deleted and empty ones included, in group order.
    ///
    /// Labels that only appear in the hierarchy are not part of the schema's
    /// label set.
    pub fn get_all_labels(&self) -> Vec<Label> {
        let grouped = self.groups.iter().flat_map(|group| group.labels.iter());
        unique_labels(grouped.cloned())
    }

    /// Grouped labels followed by hierarchy-only labels.
    pub(crate) fn known_labels(&self) -> Vec<Label> {
        let grouped = self.groups.iter().flat_map(|group| group.labels.iter());
        unique_labels(grouped.cloned().chain(self.label_tree.nodes()))
    }

    /// Active labels, optionally including empty ones.
    pub fn get_labels(&self, include_empty: bool) -> Vec<Label> {
        self.get_all_labels()
            .into_iter()
            .filter(|label| self.is_active(label.id))
            .filter(|label| include_empty || !label.is_empty)
            .collect()
    }

    pub fn get_label_ids(&self, include_empty: bool) -> Vec<LabelId> {
        self.get_labels(include_empty)
            .into_iter()
            .map(|label| label.id)
            .collect()
    }

    pub fn get_label_map(&self) -> HashMap<LabelId, Label> {
        self.get_labels(true)
            .into_iter()
            .map(|label| (label.id, label))
            .collect()
    }

    pub fn get_empty_labels(&self) -> Vec<Label> {
        self.get_labels(true)
            .into_iter()
            .filter(|label| label.is_empty)
            .collect()
    }

    /// Active groups with deleted labels removed.
    ///
    /// `EmptyLabel` groups are skipped unless `include_empty`; groups left
    /// without labels are dropped.
    pub fn get_groups(&self, include_empty: bool) -> Vec<LabelGroup> {
        self.groups
            .iter()
            .filter(|group| include_empty || group.kind != LabelGroupKind::EmptyLabel)
            .filter_map(|group| self.active_copy(group))
            .collect()
    }

    pub fn get_exclusive_groups(&self) -> Vec<LabelGroup> {
        self.groups
            .iter()
            .filter(|group| group.kind == LabelGroupKind::Exclusive)
            .filter_map(|group| self.active_copy(group))
            .collect()
    }

    /// Appends `group`.
    ///
    /// Adding a group equal to one already present is a no-op.
    ///
    /// # Errors
    /// - `LabelGroupExists` when another group already uses the name.
    /// - `ReadOnlyView` on views.
    pub fn add_group(&mut self, group: LabelGroup) -> Result<(), LabelSchemaError> {
        self.ensure_mutable()?;
        if self.groups.contains(&group) {
            return Ok(());
        }
        if self.groups.iter().any(|existing| existing.name == group.name) {
            return Err(LabelSchemaError::LabelGroupExists(group.name));
        }
        debug!(
            "event=group_added module=schema status=ok schema_id={} group_id={} labels={}",
            self.id,
            group.id,
            group.labels.len()
        );
        self.groups.push(group);
        Ok(())
    }

    /// Appends labels to the group called `group_name`.
    pub fn add_labels_to_group_by_group_name(
        &mut self,
        group_name: &str,
        labels: Vec<Label>,
    ) -> Result<(), LabelSchemaError> {
        self.ensure_mutable()?;
        let group = self
            .groups
            .iter_mut()
            .find(|group| group.name == group_name)
            .ok_or_else(|| LabelSchemaError::LabelGroupDoesNotExist(group_name.to_string()))?;
        group.labels.extend(labels);
        Ok(())
    }

    /// Adds all groups of one task.
    ///
    /// The batch is checked against every existing group name and against
    /// itself before anything is appended; on error the schema is unchanged.
    pub fn add_groups_for_task(&mut self, groups: Vec<LabelGroup>) -> Result<(), LabelSchemaError> {
        self.ensure_mutable()?;
        let mut taken: HashSet<&str> = self.groups.iter().map(|g| g.name.as_str()).collect();
        for group in &groups {
            if !taken.insert(group.name.as_str()) {
                return Err(LabelSchemaError::InvalidSchema(format!(
                    "label group name `{}` is already used by another task",
                    group.name
                )));
            }
        }

        let count = groups.len();
        for group in groups {
            self.add_group(group)?;
        }
        info!(
            "event=task_groups_added module=schema status=ok schema_id={} groups={}",
            self.id, count
        );
        Ok(())
    }

    /// Adds the hierarchy of one task.
    ///
    /// Each parent reference is resolved against
    /// `previous_trainable_task_labels` first, then `task_labels`. With
    /// `add_previous_task_label_as_parent`, task labels without an explicit
    /// parent are attached under the first label of the previous task.
    ///
    /// Either every edge is added or none is.
    pub fn add_label_relations_for_task(
        &mut self,
        child_to_parent: &[(Label, ParentRef)],
        task_labels: &[Label],
        previous_trainable_task_labels: &[Label],
        add_previous_task_label_as_parent: bool,
    ) -> Result<(), LabelSchemaError> {
        self.ensure_mutable()?;
        let candidates: Vec<&Label> = previous_trainable_task_labels
            .iter()
            .chain(task_labels.iter())
            .collect();

        let mut edges: Vec<(&Label, &Label)> = Vec::new();
        for (child, parent_ref) in child_to_parent {
            let parent = candidates
                .iter()
                .copied()
                .find(|candidate| parent_ref.matches(candidate))
                .ok_or_else(|| {
                    LabelSchemaError::InvalidSchema(format!(
                        "parent `{parent_ref}` of label {} does not exist",
                        child.id
                    ))
                })?;
            edges.push((child, parent));
        }

        if add_previous_task_label_as_parent {
            let with_parent: HashSet<LabelId> =
                child_to_parent.iter().map(|(child, _)| child.id).collect();
            let top_level: Vec<&Label> = task_labels
                .iter()
                .filter(|label| !with_parent.contains(&label.id))
                .collect();
            if !top_level.is_empty() {
                let previous = previous_trainable_task_labels.first().ok_or_else(|| {
                    LabelSchemaError::InvalidSchema(
                        "no previous task label to attach top level labels to".to_string(),
                    )
                })?;
                edges.extend(top_level.into_iter().map(|label| (label, previous)));
            }
        }

        let count = edges.len();
        self.label_tree.add_edges(edges)?;
        info!(
            "event=task_relations_added module=schema status=ok schema_id={} edges={}",
            self.id, count
        );
        Ok(())
    }

    /// Replaces the deleted set with `label_ids` plus their descendants.
    ///
    /// The stored set only grows: every id already deleted must be covered
    /// by the new target.
    ///
    /// # Errors
    /// - `RevertLabelDeletion` when an already deleted id is missing.
    /// - `LabelDeletion` when fewer than `MIN_ACTIVE_LABELS` would remain.
    /// - `ReadOnlyView` on views.
    pub fn set_deleted_label_ids(
        &mut self,
        label_ids: impl IntoIterator<Item = LabelId>,
    ) -> Result<(), LabelSchemaError> {
        self.ensure_mutable()?;
        let requested: BTreeSet<LabelId> = label_ids.into_iter().collect();
        let mut target = requested.clone();
        for id in &requested {
            target.extend(self.label_tree.descendant_ids(*id));
        }

        let reverted: Vec<LabelId> = self
            .deleted_label_ids
            .difference(&target)
            .copied()
            .collect();
        if !reverted.is_empty() {
            warn!(
                "event=label_delete module=schema status=error reason=revert schema_id={} reverted={}",
                self.id,
                reverted.len()
            );
            return Err(LabelSchemaError::RevertLabelDeletion { reverted });
        }

        let remaining = self
            .get_all_labels()
            .iter()
            .filter(|label| !target.contains(&label.id))
            .count();
        if remaining < MIN_ACTIVE_LABELS {
            warn!(
                "event=label_delete module=schema status=error reason=too_few_remaining schema_id={} remaining={}",
                self.id, remaining
            );
            return Err(LabelSchemaError::LabelDeletion { remaining });
        }

        let cascaded = target.len() - requested.len();
        self.deleted_label_ids.extend(target);
        info!(
            "event=label_delete module=schema status=ok schema_id={} requested={} cascaded={} deleted_total={}",
            self.id,
            requested.len(),
            cascaded,
            self.deleted_label_ids.len()
        );
        Ok(())
    }

    /// Adds `label_ids` to the deleted set, cascading to descendants.
    pub fn mark_labels_deleted(
        &mut self,
        label_ids: impl IntoIterator<Item = LabelId>,
    ) -> Result<(), LabelSchemaError> {
        let target: Vec<LabelId> = self
            .deleted_label_ids
            .iter()
            .copied()
            .chain(label_ids)
            .collect();
        self.set_deleted_label_ids(target)
    }

    /// Looks up any label by id, deleted ones included.
    ///
    /// A miss is logged: callers normally hold ids that exist.
    pub fn get_label_by_id(&self, id: LabelId) -> Option<Label> {
        let found = self.get_all_labels().into_iter().find(|label| label.id == id);
        if found.is_none() {
            warn!(
                "event=label_lookup module=schema status=not_found schema_id={} label_id={}",
                self.id, id
            );
        }
        found
    }

    /// Looks up an active label by name.
    pub fn get_label_by_name(&self, name: &str) -> Option<Label> {
        self.get_labels(true)
            .into_iter()
            .find(|label| label.name == name)
    }

    /// Active copy of the group called `name`.
    pub fn get_label_group_by_name(&self, name: &str) -> Option<LabelGroup> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .and_then(|group| self.active_copy(group))
    }

    /// Active copy of the group holding `label`.
    pub fn get_group_containing_label(&self, label: &Label) -> Option<LabelGroup> {
        self.groups
            .iter()
            .find(|group| group.contains(label.id))
            .and_then(|group| self.active_copy(group))
    }

    /// Records `child` under `parent` in the hierarchy.
    pub fn add_child(&mut self, parent: &Label, child: &Label) -> Result<(), LabelSchemaError> {
        self.ensure_mutable()?;
        self.label_tree.add_child(parent, child)?;
        Ok(())
    }

    pub fn get_parent(&self, label: &Label) -> Option<Label> {
        self.label_tree.get_parent(label)
    }

    pub fn get_children(&self, parent: &Label) -> Vec<Label> {
        self.label_tree.get_children(parent)
    }

    pub fn get_descendants(&self, parent: &Label) -> Vec<Label> {
        self.label_tree.get_descendants(parent)
    }

    pub fn get_ancestors(&self, label: &Label) -> Vec<Label> {
        self.label_tree.get_ancestors(label)
    }

    /// Other active labels of the group holding `label`.
    ///
    /// Unlike tree siblings, these share a group, not a parent.
    pub fn get_siblings_in_group(&self, label: &Label) -> Vec<Label> {
        self.get_group_containing_label(label)
            .map(|group| {
                group
                    .labels
                    .into_iter()
                    .filter(|member| member.id != label.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn raw_groups(&self) -> &[LabelGroup] {
        &self.groups
    }

    pub(crate) fn is_active(&self, label_id: LabelId) -> bool {
        !self.deleted_label_ids.contains(&label_id)
    }

    fn active_copy(&self, group: &LabelGroup) -> Option<LabelGroup> {
        let copy = group.filtered(|label| self.is_active(label.id));
        (!copy.labels.is_empty()).then_some(copy)
    }

    fn ensure_mutable(&self) -> Result<(), LabelSchemaError> {
        if self.is_view() {
            return Err(LabelSchemaError::ReadOnlyView(self.id));
        }
        Ok(())
    }
}

/// A view refers to its parent by id only; the parent's contents are not compared.
impl PartialEq for LabelSchema {
    /// Views compare by what they project, not by their own id.
    fn eq(&self, other: &Self) -> bool {
        let same_shape = self.provenance == other.provenance
            && self.previous_schema_revision_id == other.previous_schema_revision_id
            && self.label_tree == other.label_tree
            && self.groups == other.groups;
        match self.provenance {
            Provenance::View { .. } => same_shape,
            Provenance::Root => {
                same_shape
                    && self.id == other.id
                    && self.project_id == other.project_id
                    && self.deleted_label_ids == other.deleted_label_ids
            }
        }
    }
}

impl Eq for LabelSchema {}

fn unique_labels(labels: impl Iterator<Item = Label>) -> Vec<Label> {
    let mut seen = HashSet::new();
    labels.filter(|label| seen.insert(label.id)).collect()
}
