mod support;

use arbor::stmt::Value;
use pretty_assertions::assert_eq;
use support::user_model;

#[test]
fn schema_is_introspected_once_and_memoized() {
    let db = support::connect([user_model()]);
    let conn = db.default_connection().unwrap();

    let first = conn.schema_of("users").unwrap();
    assert!(first.contains("username"));
    assert!(!first.contains("nickname"));

    // Out-of-band DDL change; the cache does not see it.
    conn.execute("ALTER TABLE users ADD COLUMN nickname VARCHAR(32)", &[])
        .unwrap();

    let second = conn.schema_of("users").unwrap();
    assert!(!second.contains("nickname"));

    // Invalidation is explicit; only then does the next lookup
    // introspect again.
    conn.invalidate_schema("users");
    let third = conn.schema_of("users").unwrap();
    assert!(third.contains("nickname"));
}

#[test]
fn defaults_are_decoded_into_typed_values_at_load() {
    let db = support::connect([user_model()]);
    let conn = db.default_connection().unwrap();

    let users = conn.schema_of("users").unwrap();
    assert_eq!(users.default_of("status"), Value::from("active"));
    assert_eq!(users.default_of("username"), Value::from(""));
    assert_eq!(users.default_of("email"), Value::Null);

    let posts = conn.schema_of("posts").unwrap();
    assert_eq!(posts.default_of("published"), Value::Bool(false));
}

#[test]
fn unknown_table_introspection_fails() {
    let db = support::connect([user_model()]);
    let conn = db.default_connection().unwrap();

    assert!(conn.schema_of("missing").is_err());

    // The failure is not cached; a table created afterwards resolves.
    conn.execute("CREATE TABLE missing (id INTEGER PRIMARY KEY)", &[])
        .unwrap();
    assert!(conn.schema_of("missing").is_ok());
}
