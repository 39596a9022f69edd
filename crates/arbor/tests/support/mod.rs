#![allow(dead_code)]

use arbor::{schema::Type, ConnectionInfo, Db, Model, RelationDecl, Rule};
use arbor_driver_sqlite::Sqlite;

/// Build a `Db` over a fresh in-memory SQLite database with the test
/// tables created and the given models registered.
pub fn connect<I>(models: I) -> Db
where
    I: IntoIterator<Item = Model>,
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut builder = Db::builder().default_connection(ConnectionInfo::driver(Sqlite::in_memory()));
    for model in models {
        builder = builder.register(model);
    }
    let db = builder.build().unwrap();

    create_tables(&db);
    db
}

fn create_tables(db: &Db) {
    let conn = db.default_connection().unwrap();

    conn.execute(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            username VARCHAR(32) NOT NULL DEFAULT '',
            email VARCHAR(255),
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            tags JSON,
            password VARCHAR(255),
            created_at DATETIME,
            updated_at DATETIME
        )",
        &[],
    )
    .unwrap();

    conn.execute(
        "CREATE TABLE posts (
            id INTEGER PRIMARY KEY,
            author_id INTEGER,
            title VARCHAR(255) NOT NULL DEFAULT '',
            published BOOLEAN NOT NULL DEFAULT 0
        )",
        &[],
    )
    .unwrap();
}

/// The `User` model most tests run against.
pub fn user_model() -> Model {
    Model::define("User")
        .validates("username", [Rule::Required, Rule::MaxLength(32)])
        .data_type("tags", Type::JsonArray)
        .exclude("password")
        .has_many(RelationDecl::new("posts").foreign_key("author_id"))
        .build()
}

pub fn post_model() -> Model {
    Model::define("Post")
        .belongs_to(RelationDecl::new("author").model("User"))
        .build()
}
