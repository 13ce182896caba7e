use labelschema_core::{Label, LabelGroup, LabelGroupKind, LabelSchema, Provenance, ViewOptions};
use uuid::Uuid;

fn parent_schema() -> (LabelSchema, [Label; 4]) {
    let labels = [
        Label::new("a"),
        Label::new("b"),
        Label::new("c"),
        Label::new("d"),
    ];
    let [a, b, c, d] = labels.clone();
    let mut schema = LabelSchema::new(Some(Uuid::new_v4()));
    schema.add_group(LabelGroup::new("first", vec![a, b])).unwrap();
    schema.add_group(LabelGroup::new("second", vec![c, d])).unwrap();
    (schema, labels)
}

#[test]
fn view_intersects_groups_with_requested_labels() {
    let (parent, [_a, b, c, d]) = parent_schema();

    let view = LabelSchema::from_parent(
        &parent,
        &[b.clone(), c.clone(), d.clone()],
        ViewOptions::default(),
    );

    let groups = view.get_groups(true);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "first");
    assert_eq!(groups[0].labels, vec![b]);
    assert_eq!(groups[0].id, parent.get_groups(true)[0].id);
    assert_eq!(groups[1].labels, vec![c, d]);
    assert!(view.label_tree().is_empty());
    assert_eq!(view.project_id(), parent.project_id());
}

#[test]
fn view_over_all_active_labels_matches_parent() {
    let (mut parent, [a, b, c, _d]) = parent_schema();
    let nothing = Label::empty("No object");
    parent
        .add_group(LabelGroup::with_kind(
            "empty",
            vec![nothing],
            LabelGroupKind::EmptyLabel,
        ))
        .unwrap();
    parent.add_child(&a, &b).unwrap();
    parent.add_child(&b, &c).unwrap();

    let labels = parent.get_labels(true);
    let view = LabelSchema::from_parent(&parent, &labels, ViewOptions::default());

    assert_eq!(view.get_groups(true), parent.get_groups(true));
    assert_eq!(view.label_tree(), parent.label_tree());
    assert_eq!(view.get_ancestors(&c), vec![c, b, a]);
}

#[test]
fn view_omits_groups_without_overlap_and_keeps_only_internal_edges() {
    let (mut parent, [a, b, c, d]) = parent_schema();
    parent.add_child(&a, &c).unwrap();
    parent.add_child(&c, &d).unwrap();

    let view = LabelSchema::from_parent(&parent, &[c.clone(), d.clone()], ViewOptions::default());

    let groups = view.get_groups(true);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "second");
    assert_eq!(view.get_parent(&d), Some(c.clone()));
    assert_eq!(view.get_parent(&c), None);
    assert!(view.get_label_by_name(&b.name).is_none());
}

#[test]
fn view_is_unaffected_by_later_parent_changes() {
    let (mut parent, [a, b, c, d]) = parent_schema();
    let view = LabelSchema::from_parent(&parent, &[a.clone(), b.clone()], ViewOptions::default());

    parent.add_child(&a, &b).unwrap();
    parent.set_deleted_label_ids([c.id]).unwrap();
    parent
        .add_labels_to_group_by_group_name("first", vec![Label::new("e")])
        .unwrap();

    assert_eq!(view.get_parent(&b), None);
    assert_eq!(view.get_labels(true), vec![a, b]);
    assert!(view.get_group_containing_label(&d).is_none());
}

#[test]
fn view_never_reports_labels_deleted_in_parent() {
    let a = Label::new("a");
    let b = Label::new("b");
    let c = Label::new("c");
    let mut parent = LabelSchema::new(None);
    parent
        .add_group(LabelGroup::new("g", vec![a.clone(), b.clone(), c.clone()]))
        .unwrap();
    parent.add_child(&a, &b).unwrap();
    parent.set_deleted_label_ids([b.id]).unwrap();

    let view = LabelSchema::from_parent(&parent, &[a.clone(), b.clone()], ViewOptions::default());

    assert_eq!(view.get_labels(true), vec![a.clone()]);
    assert_eq!(view.get_groups(true)[0].labels, vec![a.clone()]);
    assert!(!view.label_tree().contains(b.id));
    assert_eq!(view.get_parent(&b), None);
    assert!(view.get_children(&a).is_empty());
}

#[test]
fn view_carries_provenance_and_options() {
    let (parent, [a, b, ..]) = parent_schema();
    let view_id = Uuid::new_v4();
    let previous = Uuid::new_v4();
    let task = Uuid::new_v4();

    let view = LabelSchema::from_parent(
        &parent,
        &[a.clone(), b.clone()],
        ViewOptions {
            id: Some(view_id),
            previous_schema_revision_id: Some(previous),
            task_node_id: Some(task),
            deleted_label_ids: vec![a.id],
        },
    );

    assert_eq!(view.id(), view_id);
    assert!(view.is_view());
    assert_eq!(
        view.provenance(),
        Provenance::View {
            parent_schema_id: parent.id(),
            task_node_id: Some(task)
        }
    );
    assert_eq!(view.previous_schema_revision_id(), Some(previous));
    assert_eq!(view.get_labels(true), vec![b]);
    assert_eq!(parent.parent_schema_id(), None);
}

#[test]
fn views_for_different_tasks_are_not_equal() {
    let (parent, [a, ..]) = parent_schema();
    let first = LabelSchema::from_parent(
        &parent,
        &[a.clone()],
        ViewOptions {
            task_node_id: Some(Uuid::new_v4()),
            ..ViewOptions::default()
        },
    );
    let second = LabelSchema::from_parent(
        &parent,
        &[a],
        ViewOptions {
            task_node_id: Some(Uuid::new_v4()),
            ..ViewOptions::default()
        },
    );

    assert_ne!(first, second);
}
