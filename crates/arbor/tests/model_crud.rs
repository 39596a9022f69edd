mod support;

use arbor::{fields, stmt::Value};
use pretty_assertions::assert_eq;
use support::user_model;

#[test]
fn create_round_trips_through_find() {
    let db = support::connect([user_model()]);
    let user = user_model();

    let record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .expect("record should validate");

    assert!(!record.is_new());
    let id = record.id();
    assert!(!id.is_null());

    let found = user.find(&db, id.clone()).unwrap().unwrap();
    assert_eq!(found.get("username"), Some(&Value::from("tester")));
    assert_eq!(found.id(), id);
}

#[test]
fn find_miss_returns_none() {
    let db = support::connect([user_model()]);

    assert!(user_model().find(&db, 404).unwrap().is_none());
    assert!(user_model()
        .find_by(&db, "username", "ghost")
        .unwrap()
        .is_none());
}

#[test]
fn new_records_start_from_schema_defaults() {
    let db = support::connect([user_model()]);

    let record = user_model()
        .new_record(&db, fields! { "username" => "tester" })
        .unwrap();

    assert_eq!(record.get("status"), Some(&Value::from("active")));
    assert_eq!(record.get("email"), Some(&Value::Null));

    let data = record.get_data(&db).unwrap();
    assert_eq!(data.get("status"), Some(&Value::from("active")));
}

#[test]
fn get_data_substitutes_default_for_empty_string() {
    let db = support::connect([user_model()]);

    let mut record = user_model()
        .new_record(&db, fields! { "username" => "tester" })
        .unwrap();
    record.set("status", "");

    let data = record.get_data(&db).unwrap();
    assert_eq!(data.get("status"), Some(&Value::from("active")));
}

#[test]
fn mass_assignment_skips_empty_strings() {
    let db = support::connect([user_model()]);

    let record = user_model()
        .new_record(&db, fields! { "username" => "tester", "email" => "" })
        .unwrap();

    // The empty string means "leave unset"; the schema default stands.
    assert_eq!(record.get("email"), Some(&Value::Null));
}

#[test]
fn save_updates_persisted_records_in_place() {
    let db = support::connect([user_model()]);
    let user = user_model();

    let mut record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();

    record.set("username", "renamed");
    assert!(record.save(&db).unwrap());

    let found = user.find(&db, record.id()).unwrap().unwrap();
    assert_eq!(found.get("username"), Some(&Value::from("renamed")));
    assert_ne!(found.get("updated_at"), Some(&Value::Null));
}

#[test]
fn create_stamps_created_at() {
    let db = support::connect([user_model()]);

    let record = user_model()
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();

    match record.get("created_at") {
        Some(Value::String(stamp)) => assert!(stamp.contains('-')),
        other => panic!("expected datetime text, got {other:?}"),
    }
}

#[test]
fn delete_removes_row_but_not_instance_state() {
    let db = support::connect([user_model()]);
    let user = user_model();

    let record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();
    let id = record.id();

    assert_eq!(record.delete(&db).unwrap(), 1);

    // The instance stays readable even though the row is gone.
    assert_eq!(record.get("username"), Some(&Value::from("tester")));
    assert!(user.find(&db, id).unwrap().is_none());
}

#[test]
fn insert_strips_the_primary_key() {
    let db = support::connect([user_model()]);
    let user = user_model();

    assert_eq!(
        user.insert(&db, fields! { "id" => 999, "username" => "raw" })
            .unwrap(),
        1
    );

    assert!(user.find(&db, 999).unwrap().is_none());
    let found = user.find_by(&db, "username", "raw").unwrap().unwrap();
    assert_ne!(found.id(), Value::I64(999));
}

#[test]
fn json_array_columns_round_trip() {
    let db = support::connect([user_model()]);
    let user = user_model();

    let record = user
        .create(
            &db,
            fields! {
                "username" => "tester",
                "tags" => serde_json::json!(["admin", "editor"]),
            },
        )
        .unwrap()
        .unwrap();

    // The post-save refetch decoded the stored text back into a document.
    assert_eq!(
        record.get("tags"),
        Some(&Value::Json(serde_json::json!(["admin", "editor"])))
    );

    let found = user.find(&db, record.id()).unwrap().unwrap();
    assert_eq!(
        found.get("tags"),
        Some(&Value::Json(serde_json::json!(["admin", "editor"])))
    );
}

#[test]
fn all_returns_every_row() {
    let db = support::connect([user_model()]);
    let user = user_model();

    for name in ["one", "two", "three"] {
        user.create(&db, fields! { "username" => name })
            .unwrap()
            .unwrap();
    }

    let records = user.all(&db).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get("username"), Some(&Value::from("one")));
}

#[test]
fn to_array_hides_excluded_columns() {
    let db = support::connect([user_model()]);

    let record = user_model()
        .create(
            &db,
            fields! { "username" => "tester", "password" => "hunter2" },
        )
        .unwrap()
        .unwrap();

    let data = record.get_data(&db).unwrap();
    assert!(data.contains("password"));

    let external = record.to_array(&db).unwrap();
    assert!(!external.contains("password"));
    assert!(external.contains("username"));
}

#[test]
fn update_attributes_sets_and_saves() {
    let db = support::connect([user_model()]);
    let user = user_model();

    let mut record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();

    assert!(record
        .update_attributes(&db, fields! { "email" => "tester@example.com" })
        .unwrap());

    let found = user.find(&db, record.id()).unwrap().unwrap();
    assert_eq!(
        found.get("email"),
        Some(&Value::from("tester@example.com"))
    );
}
