//! Label hierarchy.
//!
//! # Responsibility
//! - Store parent/child relations between labels across tasks.
//! - Answer parent, children, sibling, ancestor and descendant queries.
//!
//! # Invariants
//! - Every label has at most one parent.
//! - The hierarchy is acyclic; `add_child` rejects edges that would close a loop.
//! - Lookups on unknown labels return empty results instead of errors.
//! - Node and child order is insertion order.

use crate::model::label::{Label, LabelId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hierarchy mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelTreeError {
    /// Label was given itself as parent.
    SelfParent(LabelId),
    /// Child already has a different parent.
    ParentAlreadySet {
        child: LabelId,
        existing_parent: LabelId,
        requested_parent: LabelId,
    },
    /// Parent is already a descendant of child.
    CycleDetected { child: LabelId, parent: LabelId },
}

impl Display for LabelTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfParent(id) => write!(f, "label cannot be its own parent: {id}"),
            Self::ParentAlreadySet {
                child,
                existing_parent,
                requested_parent,
            } => write!(
                f,
                "label {child} already has parent {existing_parent}; refusing {requested_parent}"
            ),
            Self::CycleDetected { child, parent } => write!(
                f,
                "attaching label {child} under {parent} would create a cycle"
            ),
        }
    }
}

impl Error for LabelTreeError {}

/// Parent-pointer hierarchy over labels.
#[derive(Debug, Clone, Default)]
pub struct LabelTree {
    order: Vec<LabelId>,
    labels: HashMap<LabelId, Label>,
    parents: HashMap<LabelId, LabelId>,
    children: HashMap<LabelId, Vec<LabelId>>,
}

impl LabelTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `label` as a node; existing nodes are left untouched.
    pub fn add_node(&mut self, label: Label) {
        if self.labels.contains_key(&label.id) {
            return;
        }
        self.order.push(label.id);
        self.labels.insert(label.id, label);
    }

    /// Removes `label` and every edge touching it. Its children become roots.
    pub fn remove_node(&mut self, label: &Label) {
        if self.labels.remove(&label.id).is_none() {
            return;
        }
        self.order.retain(|id| *id != label.id);
        if let Some(parent) = self.parents.remove(&label.id) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|id| *id != label.id);
            }
        }
        if let Some(children) = self.children.remove(&label.id) {
            for child in children {
                self.parents.remove(&child);
            }
        }
    }

    /// Records `child` as a child of `parent`, adding missing nodes.
    ///
    /// Re-adding an existing edge is a no-op.
    ///
    /// # Errors
    /// - `SelfParent` when both labels are the same.
    /// - `ParentAlreadySet` when `child` already has another parent.
    /// - `CycleDetected` when `parent` descends from `child`.
    pub fn add_child(&mut self, parent: &Label, child: &Label) -> Result<(), LabelTreeError> {
        if parent.id == child.id {
            return Err(LabelTreeError::SelfParent(child.id));
        }
        match self.parents.get(&child.id) {
            Some(existing) if *existing == parent.id => return Ok(()),
            Some(existing) => {
                return Err(LabelTreeError::ParentAlreadySet {
                    child: child.id,
                    existing_parent: *existing,
                    requested_parent: parent.id,
                })
            }
            None => {}
        }
        if self.ancestor_ids(parent.id).contains(&child.id) {
            return Err(LabelTreeError::CycleDetected {
                child: child.id,
                parent: parent.id,
            });
        }

        self.add_node(parent.clone());
        self.add_node(child.clone());
        self.parents.insert(child.id, parent.id);
        self.children.entry(parent.id).or_default().push(child.id);
        Ok(())
    }

    /// Adds `(child, parent)` edges in bulk.
    ///
    /// Either every edge is applied or, on the first invalid edge, none is.
    pub fn add_edges<'a>(
        &mut self,
        edges: impl IntoIterator<Item = (&'a Label, &'a Label)>,
    ) -> Result<(), LabelTreeError> {
        let mut staged = self.clone();
        for (child, parent) in edges {
            staged.add_child(parent, child)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn contains(&self, label_id: LabelId) -> bool {
        self.labels.contains_key(&label_id)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn num_nodes(&self) -> usize {
        self.order.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> Vec<Label> {
        self.order
            .iter()
            .filter_map(|id| self.labels.get(id))
            .cloned()
            .collect()
    }

    /// `(child, parent)` id pairs, ordered by child insertion.
    pub fn edges(&self) -> Vec<(LabelId, LabelId)> {
        self.order
            .iter()
            .filter_map(|child| self.parents.get(child).map(|parent| (*child, *parent)))
            .collect()
    }

    pub fn get_parent(&self, label: &Label) -> Option<Label> {
        self.parents
            .get(&label.id)
            .and_then(|parent| self.labels.get(parent))
            .cloned()
    }

    pub fn get_children(&self, parent: &Label) -> Vec<Label> {
        self.child_ids(parent.id)
            .iter()
            .filter_map(|id| self.labels.get(id))
            .cloned()
            .collect()
    }

    /// Transitive children, breadth-first.
    pub fn get_descendants(&self, parent: &Label) -> Vec<Label> {
        self.descendant_ids(parent.id)
            .iter()
            .filter_map(|id| self.labels.get(id))
            .cloned()
            .collect()
    }

    /// `label` itself followed by its parent chain up to the root.
    pub fn get_ancestors(&self, label: &Label) -> Vec<Label> {
        let mut ancestors = vec![label.clone()];
        ancestors.extend(
            self.ancestor_ids(label.id)
                .iter()
                .filter_map(|id| self.labels.get(id))
                .cloned(),
        );
        ancestors
    }

    /// Other children of `label`'s parent; empty for roots.
    pub fn get_siblings(&self, label: &Label) -> Vec<Label> {
        match self.get_parent(label) {
            Some(parent) => self
                .get_children(&parent)
                .into_iter()
                .filter(|sibling| sibling.id != label.id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Induced subgraph over the given labels.
    ///
    /// Labels that are not nodes of this tree are ignored.
    pub fn subgraph(&self, labels: &[Label]) -> LabelTree {
        let keep: HashSet<LabelId> = labels.iter().map(|label| label.id).collect();
        let mut tree = LabelTree::new();
        for id in self.order.iter().filter(|id| keep.contains(id)) {
            if let Some(label) = self.labels.get(id) {
                tree.add_node(label.clone());
            }
        }
        for (child, parent) in self.edges() {
            if keep.contains(&child) && keep.contains(&parent) {
                tree.parents.insert(child, parent);
                tree.children.entry(parent).or_default().push(child);
            }
        }
        tree
    }

    pub(crate) fn descendant_ids(&self, parent: LabelId) -> Vec<LabelId> {
        let mut found = Vec::new();
        let mut queue: VecDeque<LabelId> = self.child_ids(parent).iter().copied().collect();
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            found.push(current);
            queue.extend(self.child_ids(current).iter().copied());
        }
        found
    }

    fn child_ids(&self, parent: LabelId) -> &[LabelId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn ancestor_ids(&self, label: LabelId) -> Vec<LabelId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([label]);
        let mut cursor = self.parents.get(&label).copied();
        while let Some(current) = cursor {
            if !visited.insert(current) {
                break;
            }
            chain.push(current);
            cursor = self.parents.get(&current).copied();
        }
        chain
    }
}

impl PartialEq for LabelTree {
    fn eq(&self, other: &Self) -> bool {
        self.order.len() == other.order.len()
            && self.order.iter().all(|id| other.labels.contains_key(id))
            && self.parents == other.parents
    }
}

impl Eq for LabelTree {}
