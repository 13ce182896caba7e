//! Task label ingestion use-case.
//!
//! # Responsibility
//! - Turn REST-shaped label payloads of one task into labels, groups and
//!   hierarchy edges on a schema.
//!
//! # Invariants
//! - Label names are unique among the task payload and the schema's active labels.
//! - A task has at most one empty label.
//! - The schema is only changed when every step succeeds.

use crate::model::group::{LabelGroup, LabelGroupKind};
use crate::model::label::{Label, LabelValidationError};
use crate::model::schema::{LabelSchema, LabelSchemaError, ParentRef};
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One label as supplied by a create/update request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLabelSpec {
    pub name: String,
    /// Group name; defaults to the task name.
    pub group: Option<String>,
    /// Parent label id or name.
    pub parent: Option<String>,
    /// Defaults to `DEFAULT_LABEL_COLOR`.
    pub color: Option<String>,
    pub hotkey: Option<String>,
    pub is_empty: bool,
    pub is_anomalous: bool,
}

/// Label payload of one task.
#[derive(Debug, Clone, Default)]
pub struct TaskLabelsRequest {
    pub task_name: String,
    pub labels: Vec<TaskLabelSpec>,
    /// Labels of the preceding trainable task in the chain.
    pub previous_trainable_task_labels: Vec<Label>,
    pub add_previous_task_label_as_parent: bool,
}

/// Errors from task label ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLabelError {
    /// Task name is blank after trim.
    InvalidTaskName,
    /// One label payload failed validation.
    Validation(LabelValidationError),
    /// Label name used twice.
    DuplicateLabelName(String),
    /// More than one label flagged `is_empty`.
    MultipleEmptyLabels,
    /// Schema rejected groups or relations.
    Schema(LabelSchemaError),
}

impl Display for TaskLabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTaskName => write!(f, "task name must not be blank"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateLabelName(name) => write!(f, "label name is already used: {name}"),
            Self::MultipleEmptyLabels => write!(f, "a task can have at most one empty label"),
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskLabelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LabelValidationError> for TaskLabelError {
    fn from(value: LabelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<LabelSchemaError> for TaskLabelError {
    fn from(value: LabelSchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Facade applying task label payloads to one schema.
pub struct TaskLabelService<'s> {
    schema: &'s mut LabelSchema,
}

impl<'s> TaskLabelService<'s> {
    pub fn new(schema: &'s mut LabelSchema) -> Self {
        Self { schema }
    }

    /// Adds the labels of one task and returns them in payload order.
    ///
    /// # Contract
    /// - Non-empty labels go into one exclusive group per group name, in
    ///   first-seen order.
    /// - The empty label goes into an empty-label group `<task> (empty)`.
    /// - Parents are resolved by id or name among the previous task's
    ///   labels and this task's labels.
    pub fn add_task_labels(
        &mut self,
        request: &TaskLabelsRequest,
    ) -> Result<Vec<Label>, TaskLabelError> {
        let task_name = request.task_name.trim();
        if task_name.is_empty() {
            return Err(TaskLabelError::InvalidTaskName);
        }

        let labels = self.build_labels(&request.labels)?;
        let groups = build_groups(task_name, &request.labels, &labels);

        let child_to_parent: Vec<(Label, ParentRef)> = request
            .labels
            .iter()
            .zip(&labels)
            .filter_map(|(spec, label)| {
                spec.parent
                    .as_deref()
                    .map(|parent| (label.clone(), ParentRef::from(parent)))
            })
            .collect();

        let mut staged = self.schema.clone();
        staged.add_groups_for_task(groups)?;
        staged.add_label_relations_for_task(
            &child_to_parent,
            &labels,
            &request.previous_trainable_task_labels,
            request.add_previous_task_label_as_parent,
        )?;
        *self.schema = staged;

        info!(
            "event=task_labels_added module=service status=ok schema_id={} labels={} relations={}",
            self.schema.id(),
            labels.len(),
            child_to_parent.len()
        );
        Ok(labels)
    }

    fn build_labels(&self, specs: &[TaskLabelSpec]) -> Result<Vec<Label>, TaskLabelError> {
        let mut names: HashSet<String> = self
            .schema
            .get_labels(true)
            .into_iter()
            .map(|label| label.name)
            .collect();
        let mut labels = Vec::with_capacity(specs.len());
        let mut saw_empty = false;

        for spec in specs {
            let mut label = Label::new(spec.name.trim());
            if let Some(color) = &spec.color {
                label.color = color.clone();
            }
            label.hotkey = spec.hotkey.clone();
            label.is_empty = spec.is_empty;
            label.is_anomalous = spec.is_anomalous;
            label.validate()?;

            if !names.insert(label.name.clone()) {
                return Err(TaskLabelError::DuplicateLabelName(label.name));
            }
            if label.is_empty {
                if saw_empty {
                    return Err(TaskLabelError::MultipleEmptyLabels);
                }
                saw_empty = true;
            }
            labels.push(label);
        }
        Ok(labels)
    }
}

fn build_groups(task_name: &str, specs: &[TaskLabelSpec], labels: &[Label]) -> Vec<LabelGroup> {
    let mut groups: Vec<LabelGroup> = Vec::new();
    let mut empty_group: Option<LabelGroup> = None;

    for (spec, label) in specs.iter().zip(labels) {
        if label.is_empty {
            empty_group = Some(LabelGroup::with_kind(
                format!("{task_name} (empty)"),
                vec![label.clone()],
                LabelGroupKind::EmptyLabel,
            ));
            continue;
        }
        let group_name = spec
            .group
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(task_name);
        match groups.iter_mut().find(|group| group.name == group_name) {
            Some(group) => group.labels.push(label.clone()),
            None => groups.push(LabelGroup::new(group_name, vec![label.clone()])),
        }
    }

    groups.extend(empty_group);
    groups
}
