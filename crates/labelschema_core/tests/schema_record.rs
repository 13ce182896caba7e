use labelschema_core::{
    Label, LabelGroup, LabelGroupKind, LabelSchema, LabelSchemaRecord, RecordError, ViewOptions,
};
use uuid::Uuid;

fn sample_schema() -> (LabelSchema, Label, Label, Label) {
    let vehicle = Label::new("vehicle").with_color("#00ff00ff");
    let car = Label::new("car").with_hotkey("ctrl+1");
    let bus = Label::new("bus");
    let nothing = Label::empty("No object");
    let mut schema = LabelSchema::with_id(Uuid::new_v4(), Some(Uuid::new_v4()), Some(Uuid::new_v4()));
    schema
        .add_group(LabelGroup::new("detection", vec![vehicle.clone()]))
        .unwrap();
    schema
        .add_group(LabelGroup::new("classification", vec![bus.clone(), car.clone()]))
        .unwrap();
    schema
        .add_group(LabelGroup::with_kind(
            "empty",
            vec![nothing],
            LabelGroupKind::EmptyLabel,
        ))
        .unwrap();
    schema.add_child(&vehicle, &car).unwrap();
    schema.add_child(&vehicle, &bus).unwrap();
    (schema, vehicle, car, bus)
}

#[test]
fn json_round_trip_preserves_schema() {
    let (mut schema, _vehicle, car, _bus) = sample_schema();
    schema.set_deleted_label_ids([car.id]).unwrap();

    let json = serde_json::to_string(&schema.to_record()).unwrap();
    let decoded: LabelSchemaRecord = serde_json::from_str(&json).unwrap();
    let restored = LabelSchema::from_record(decoded).unwrap();

    assert_eq!(restored, schema);
    assert_eq!(restored.get_all_labels().len(), 4);
    let restored_car = restored.get_label_by_id(car.id).unwrap();
    assert_eq!(restored_car.hotkey.as_deref(), Some("ctrl+1"));
    assert_eq!(
        restored.get_groups(true)[1].labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
        vec!["bus"]
    );
}

#[test]
fn record_uses_expected_wire_fields() {
    let (schema, vehicle, car, bus) = sample_schema();
    let value = serde_json::to_value(schema.to_record()).unwrap();

    assert_eq!(value["id"], schema.id().to_string());
    assert_eq!(value["provenance"]["kind"], "root");
    assert_eq!(value["groups"][0]["kind"], "exclusive");
    assert_eq!(value["groups"][2]["kind"], "empty_label");
    assert_eq!(value["groups"][1]["label_ids"][0], bus.id.to_string());
    assert_eq!(value["groups"][1]["label_ids"][1], car.id.to_string());
    assert_eq!(value["label_tree_edges"][0]["parent"], vehicle.id.to_string());
    assert_eq!(value["labels"][0]["color"], "#00ff00ff");
    assert_eq!(value["labels"][3]["is_empty"], true);
}

#[test]
fn deleted_ids_are_stored_sorted() {
    let (mut schema, vehicle, _car, _bus) = sample_schema();
    let extra = Label::new("extra");
    schema
        .add_labels_to_group_by_group_name("detection", vec![extra.clone()])
        .unwrap();
    schema.set_deleted_label_ids([vehicle.id]).unwrap();

    let record = schema.to_record();
    let mut sorted = record.deleted_label_ids.clone();
    sorted.sort();
    assert_eq!(record.deleted_label_ids, sorted);
    assert_eq!(record.deleted_label_ids.len(), 3);
}

#[test]
fn view_round_trip_keeps_provenance() {
    let (schema, vehicle, car, _bus) = sample_schema();
    let view = LabelSchema::from_parent(
        &schema,
        &[vehicle, car],
        ViewOptions {
            task_node_id: Some(Uuid::new_v4()),
            ..ViewOptions::default()
        },
    );

    let restored = LabelSchema::from_record(view.to_record()).unwrap();
    assert_eq!(restored, view);
    assert_eq!(restored.id(), view.id());
    assert!(restored.is_view());
}

#[test]
fn from_record_rejects_duplicate_labels_and_second_parents() {
    let (schema, _vehicle, car, bus) = sample_schema();

    let mut duplicated = schema.to_record();
    duplicated.labels.push(car.clone());
    assert_eq!(
        LabelSchema::from_record(duplicated).unwrap_err(),
        RecordError::DuplicateLabel(car.id)
    );

    let mut two_parents = schema.to_record();
    two_parents
        .label_tree_edges
        .push(labelschema_core::LabelTreeEdgeRecord {
            child: car.id,
            parent: bus.id,
        });
    let err = LabelSchema::from_record(two_parents).unwrap_err();
    assert!(matches!(err, RecordError::Hierarchy(_)));

    let mut dangling = schema.to_record();
    let ghost = Uuid::new_v4();
    dangling.label_tree_nodes.push(ghost);
    assert_eq!(
        LabelSchema::from_record(dangling).unwrap_err(),
        RecordError::UnknownLabel {
            context: "label tree node",
            label_id: ghost
        }
    );
}
