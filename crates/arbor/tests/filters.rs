mod support;

use arbor::{fields, stmt::Value, Action, Model, Record, Rule};
use pretty_assertions::assert_eq;

fn stamp_first(record: &mut Record) {
    record.set("status", "first");
}

fn stamp_second(record: &mut Record) {
    let current = record
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    record.set("status", format!("{current}-second"));
}

fn mark_saved(record: &mut Record) {
    record.set("status", "saved");
}

fn append_updated(record: &mut Record) {
    let current = record
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    record.set("status", format!("{current}-updated"));
}

fn flag_after_create(record: &mut Record) {
    record.set("after_create_ran", 1);
}

fn flag_after_save(record: &mut Record) {
    record.set("after_save_ran", 1);
}

fn hooked_user() -> Model {
    Model::define("User")
        .validates("username", [Rule::Required])
        .before(Action::Create, "stamp_first", stamp_first)
        .before(Action::Create, "stamp_second", stamp_second)
        .before(Action::Save, "mark_saved", mark_saved)
        .before(Action::Update, "append_updated", append_updated)
        .after(Action::Create, "flag_after_create", flag_after_create)
        .after(Action::Save, "flag_after_save", flag_after_save)
        .build()
}

#[test]
fn before_create_hooks_run_in_declaration_order() {
    let db = support::connect([hooked_user()]);
    let user = hooked_user();

    let record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();

    let found = user.find(&db, record.id()).unwrap().unwrap();
    assert_eq!(found.get("status"), Some(&Value::from("first-second")));
}

#[test]
fn update_runs_save_then_update_hooks() {
    let db = support::connect([hooked_user()]);
    let user = hooked_user();

    let mut record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();

    assert!(record.save(&db).unwrap());

    let found = user.find(&db, record.id()).unwrap().unwrap();
    assert_eq!(found.get("status"), Some(&Value::from("saved-updated")));
}

#[test]
fn after_hooks_run_per_branch_and_do_not_persist() {
    let db = support::connect([hooked_user()]);
    let user = hooked_user();

    let mut record = user
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();

    // Create branch: after.create ran, after.save did not.
    assert_eq!(record.get("after_create_ran"), Some(&Value::I64(1)));
    assert!(record.get("after_save_ran").is_none());

    // The flag is not a schema column; nothing of it was written.
    let found = user.find(&db, record.id()).unwrap().unwrap();
    assert!(found.get("after_create_ran").is_none());

    // Update branch: after.save runs.
    assert!(record.save(&db).unwrap());
    assert_eq!(record.get("after_save_ran"), Some(&Value::I64(1)));
}

#[test]
fn models_without_hooks_save_normally() {
    let db = support::connect([support::user_model()]);

    let record = support::user_model()
        .create(&db, fields! { "username" => "tester" })
        .unwrap()
        .unwrap();
    assert!(!record.is_new());
}
