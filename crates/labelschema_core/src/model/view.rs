//! Per-task schema views.
//!
//! A view is a `LabelSchema` tagged `Provenance::View`, restricted to the
//! labels of one task. It owns copies of the projected tree and groups, so
//! later edits of the parent do not leak into views already built.

use crate::model::group::LabelGroup;
use crate::model::label::{Label, LabelId};
use crate::model::schema::{LabelSchema, Provenance, SchemaId, TaskNodeId};
use log::debug;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Optional identity and state for a derived view.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    /// View id; generated when `None`.
    pub id: Option<SchemaId>,
    pub previous_schema_revision_id: Option<SchemaId>,
    pub task_node_id: Option<TaskNodeId>,
    /// Stored as given, without cascading.
    pub deleted_label_ids: Vec<LabelId>,
}

impl LabelSchema {
    /// Projects `parent` onto `labels`.
    ///
    /// Labels deleted in the parent are dropped. The tree is the induced
    /// subgraph over the remaining labels. Each active parent
    /// group (empty-label groups included) is intersected with `labels`,
    /// keeping its id, name and kind; groups with no overlap are omitted.
    pub fn from_parent(parent: &LabelSchema, labels: &[Label], options: ViewOptions) -> Self {
        let active: Vec<Label> = labels
            .iter()
            .filter(|label| parent.is_active(label.id))
            .cloned()
            .collect();
        let wanted: HashSet<LabelId> = active.iter().map(|label| label.id).collect();
        let groups: Vec<LabelGroup> = parent
            .get_groups(true)
            .iter()
            .map(|group| group.filtered(|label| wanted.contains(&label.id)))
            .filter(|group| !group.labels.is_empty())
            .collect();

        let view = Self {
            id: options.id.unwrap_or_else(Uuid::new_v4),
            project_id: parent.project_id,
            previous_schema_revision_id: options.previous_schema_revision_id,
            label_tree: parent.label_tree.subgraph(&active),
            groups,
            deleted_label_ids: options.deleted_label_ids.into_iter().collect::<BTreeSet<_>>(),
            provenance: Provenance::View {
                parent_schema_id: parent.id,
                task_node_id: options.task_node_id,
            },
        };
        debug!(
            "event=view_derived module=schema status=ok parent_schema_id={} view_id={} labels={} groups={}",
            parent.id,
            view.id,
            active.len(),
            view.groups.len()
        );
        view
    }

    /// Parent schema id for views, `None` for root schemas.
    pub fn parent_schema_id(&self) -> Option<SchemaId> {
        match self.provenance {
            Provenance::View {
                parent_schema_id, ..
            } => Some(parent_schema_id),
            Provenance::Root => None,
        }
    }

    /// Task node id for views built for one task.
    pub fn task_node_id(&self) -> Option<TaskNodeId> {
        match self.provenance {
            Provenance::View { task_node_id, .. } => task_node_id,
            Provenance::Root => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ViewOptions;
    use crate::model::group::LabelGroup;
    use crate::model::label::Label;
    use crate::model::schema::{LabelSchema, LabelSchemaError};
    use uuid::Uuid;

    #[test]
    fn view_equality_ignores_view_id() {
        let a = Label::new("a");
        let b = Label::new("b");
        let mut parent = LabelSchema::new(None);
        parent
            .add_group(LabelGroup::new("g", vec![a.clone(), b.clone()]))
            .unwrap();
        let task = Uuid::new_v4();

        let first = LabelSchema::from_parent(
            &parent,
            &[a.clone()],
            ViewOptions {
                task_node_id: Some(task),
                ..ViewOptions::default()
            },
        );
        let second = LabelSchema::from_parent(
            &parent,
            &[a],
            ViewOptions {
                task_node_id: Some(task),
                ..ViewOptions::default()
            },
        );

        assert_ne!(first.id(), second.id());
        assert_eq!(first, second);
        assert_eq!(first.parent_schema_id(), Some(parent.id()));
        assert_eq!(first.task_node_id(), Some(task));
    }

    #[test]
    fn view_rejects_structural_mutation() {
        let a = Label::new("a");
        let b = Label::new("b");
        let mut parent = LabelSchema::new(None);
        parent
            .add_group(LabelGroup::new("g", vec![a.clone(), b.clone()]))
            .unwrap();

        let mut view = LabelSchema::from_parent(&parent, &[a.clone(), b.clone()], ViewOptions::default());
        let err = view.add_child(&a, &b).unwrap_err();
        assert_eq!(err, LabelSchemaError::ReadOnlyView(view.id()));
        assert!(view.set_deleted_label_ids([a.id]).is_err());
    }
}
