mod value;
pub(crate) use value::SqliteValue;

use rusqlite::Connection as RusqliteConnection;
use std::{
    borrow::Cow,
    fmt::Write as _,
    path::{Path, PathBuf},
};

use arbor_core::{
    driver::{Driver, Row, Rows},
    schema::{Column, Type},
    stmt::Value,
    Error, Result,
};
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    fn connect(&self) -> Result<Box<dyn arbor_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }
}

impl arbor_core::driver::Connection for Connection {
    fn execute_query(&mut self, sql: &str, params: &[Value]) -> Result<Rows> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(Error::driver_operation_failed)?;

        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let params: Vec<SqliteValue> = params.iter().map(SqliteValue::from).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)?;

        let mut ret = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut out = Row::new();

                    for (index, name) in names.iter().enumerate() {
                        out.insert(name.clone(), SqliteValue::from_sql(row, index)?.into_inner());
                    }

                    ret.push(out);
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::driver_operation_failed(err));
                }
            }
        }

        Ok(Rows::from_vec(ret))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(Error::driver_operation_failed)?;

        let params: Vec<SqliteValue> = params.iter().map(SqliteValue::from).collect();

        stmt.execute(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)
    }

    fn insert(&mut self, table: &str, data: &Row, _types: &[(String, Type)]) -> Result<usize> {
        if data.is_empty() {
            arbor_core::bail!("insert into `{table}` with no values");
        }

        let mut columns = String::new();
        let mut placeholders = String::new();
        for (index, (name, _)) in data.iter().enumerate() {
            if index > 0 {
                columns.push_str(", ");
                placeholders.push_str(", ");
            }
            let _ = write!(columns, "{}", Ident(name));
            let _ = write!(placeholders, "?{}", index + 1);
        }

        let sql = format!("INSERT INTO {} ({columns}) VALUES ({placeholders})", Ident(table));
        let params: Vec<Value> = data.iter().map(|(_, value)| value.clone()).collect();
        self.execute_params(&sql, &params)
    }

    fn update(
        &mut self,
        table: &str,
        data: &Row,
        filter: &Row,
        _types: &[(String, Type)],
    ) -> Result<usize> {
        if data.is_empty() {
            arbor_core::bail!("update of `{table}` with no assignments");
        }
        if filter.is_empty() {
            arbor_core::bail!("update of `{table}` requires a keyed filter");
        }

        let mut sql = format!("UPDATE {} SET ", Ident(table));
        let mut position = 0;
        for (name, _) in data.iter() {
            if position > 0 {
                sql.push_str(", ");
            }
            position += 1;
            let _ = write!(sql, "{} = ?{position}", Ident(name));
        }
        sql.push_str(" WHERE ");
        for (index, (name, _)) in filter.iter().enumerate() {
            if index > 0 {
                sql.push_str(" AND ");
            }
            position += 1;
            let _ = write!(sql, "{} = ?{position}", Ident(name));
        }

        let params: Vec<Value> = data
            .iter()
            .chain(filter.iter())
            .map(|(_, value)| value.clone())
            .collect();
        self.execute_params(&sql, &params)
    }

    fn delete(&mut self, table: &str, filter: &Row) -> Result<usize> {
        if filter.is_empty() {
            arbor_core::bail!("delete from `{table}` requires a keyed filter");
        }

        let mut sql = format!("DELETE FROM {} WHERE ", Ident(table));
        for (index, (name, _)) in filter.iter().enumerate() {
            if index > 0 {
                sql.push_str(" AND ");
            }
            let _ = write!(sql, "{} = ?{}", Ident(name), index + 1);
        }

        let params: Vec<Value> = filter.iter().map(|(_, value)| value.clone()).collect();
        self.execute_params(&sql, &params)
    }

    fn last_insert_id(&mut self, _sequence: Option<&str>) -> Result<Value> {
        // SQLite has no sequences; a sequence-qualified request still means
        // the rowid of the most recent insert.
        let id = self.connection.last_insert_rowid();
        Ok(if id == 0 { Value::Null } else { Value::I64(id) })
    }

    fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        let sql = format!("PRAGMA table_info({})", Ident(table));
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(Error::driver_operation_failed)?;
        let mut rows = stmt.query([]).map_err(Error::driver_operation_failed)?;

        let mut columns = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let name: String = row.get(1).map_err(Error::driver_operation_failed)?;
                    let decl: String = row.get(2).map_err(Error::driver_operation_failed)?;
                    let notnull: i64 = row.get(3).map_err(Error::driver_operation_failed)?;
                    let dflt: rusqlite::types::Value =
                        row.get(4).map_err(Error::driver_operation_failed)?;
                    let pk: i64 = row.get(5).map_err(Error::driver_operation_failed)?;

                    let ty = declared_type(&decl);

                    columns.push(Column {
                        name,
                        ty,
                        default: decode_default(dflt, ty),
                        nullable: notnull == 0,
                        primary_key: pk > 0,
                    });
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::driver_operation_failed(err));
                }
            }
        }

        if columns.is_empty() {
            arbor_core::bail!("no such table `{table}`");
        }

        Ok(columns)
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::I64(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::String(v) => quote_text(v),
            Value::Bytes(v) => {
                let mut out = String::with_capacity(v.len() * 2 + 3);
                out.push_str("X'");
                for byte in v {
                    let _ = write!(out, "{byte:02X}");
                }
                out.push('\'');
                out
            }
            Value::Json(v) => quote_text(&v.to_string()),
        }
    }
}

impl Connection {
    fn execute_params(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(Error::driver_operation_failed)?;

        let params: Vec<SqliteValue> = params.iter().map(SqliteValue::from).collect();

        stmt.execute(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)
    }
}

/// A double-quoted SQL identifier.
struct Ident<'a>(&'a str);

impl std::fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Map a declared SQL column type to an Arbor type, following SQLite's
/// affinity-style substring rules.
fn declared_type(decl: &str) -> Type {
    let decl = decl.to_uppercase();

    if decl.contains("BOOL") {
        Type::Boolean
    } else if decl.contains("DATE") || decl.contains("TIME") {
        Type::Datetime
    } else if decl.contains("JSON") {
        Type::JsonArray
    } else if decl.contains("INT") {
        Type::Integer
    } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
        Type::Text
    } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
        Type::Float
    } else if decl.is_empty() || decl.contains("BLOB") {
        Type::Blob
    } else {
        Type::Text
    }
}

/// Decode the `dflt_value` column of `PRAGMA table_info` into a typed value.
///
/// SQLite reports defaults as the literal SQL text from the CREATE TABLE
/// statement (`'active'`, `0`, `NULL`, `CURRENT_TIMESTAMP`). Expression
/// defaults cannot be precomputed and decode to no default.
fn decode_default(raw: rusqlite::types::Value, ty: Type) -> Option<arbor_core::stmt::Value> {
    use rusqlite::types::Value as SqlValue;

    let text = match raw {
        SqlValue::Null => return None,
        SqlValue::Integer(v) => return Some(typed_number(v, ty)),
        SqlValue::Real(v) => return Some(Value::F64(v)),
        SqlValue::Text(text) => text,
        SqlValue::Blob(blob) => return Some(Value::Bytes(blob)),
    };

    let trimmed = text.trim();

    if trimmed.eq_ignore_ascii_case("NULL") {
        return None;
    }

    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        let inner = inner.replace("''", "'");
        if ty == Type::JsonArray {
            if let Ok(json) = serde_json::from_str(&inner) {
                return Some(Value::Json(json));
            }
        }
        return Some(Value::String(inner));
    }

    if trimmed.eq_ignore_ascii_case("TRUE") {
        return Some(Value::Bool(true));
    }
    if trimmed.eq_ignore_ascii_case("FALSE") {
        return Some(Value::Bool(false));
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(typed_number(int, ty));
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return Some(Value::F64(float));
    }

    // CURRENT_TIMESTAMP and parenthesized expressions are computed by the
    // database on insert.
    None
}

fn typed_number(value: i64, ty: Type) -> Value {
    match ty {
        Type::Boolean => Value::Bool(value != 0),
        Type::Float => Value::F64(value as f64),
        _ => Value::I64(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::driver::Connection as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn declared_type_mapping() {
        assert_eq!(declared_type("INTEGER"), Type::Integer);
        assert_eq!(declared_type("BIGINT"), Type::Integer);
        assert_eq!(declared_type("VARCHAR(32)"), Type::Text);
        assert_eq!(declared_type("TEXT"), Type::Text);
        assert_eq!(declared_type("BOOLEAN"), Type::Boolean);
        assert_eq!(declared_type("DATETIME"), Type::Datetime);
        assert_eq!(declared_type("TIMESTAMP"), Type::Datetime);
        assert_eq!(declared_type("JSON"), Type::JsonArray);
        assert_eq!(declared_type("DOUBLE"), Type::Float);
        assert_eq!(declared_type(""), Type::Blob);
    }

    #[test]
    fn decode_quoted_text_default() {
        let raw = rusqlite::types::Value::Text("'active'".to_string());
        assert_eq!(decode_default(raw, Type::Text), Some(Value::from("active")));
    }

    #[test]
    fn decode_escaped_quote_default() {
        let raw = rusqlite::types::Value::Text("'it''s'".to_string());
        assert_eq!(decode_default(raw, Type::Text), Some(Value::from("it's")));
    }

    #[test]
    fn decode_null_sentinel_default() {
        let raw = rusqlite::types::Value::Text("NULL".to_string());
        assert_eq!(decode_default(raw, Type::Text), None);
    }

    #[test]
    fn decode_numeric_defaults() {
        let raw = rusqlite::types::Value::Text("0".to_string());
        assert_eq!(decode_default(raw, Type::Integer), Some(Value::I64(0)));

        let raw = rusqlite::types::Value::Text("1".to_string());
        assert_eq!(decode_default(raw, Type::Boolean), Some(Value::Bool(true)));
    }

    #[test]
    fn decode_expression_default_is_absent() {
        let raw = rusqlite::types::Value::Text("CURRENT_TIMESTAMP".to_string());
        assert_eq!(decode_default(raw, Type::Datetime), None);
    }

    #[test]
    fn introspect_and_round_trip() {
        let mut conn = Connection::in_memory().unwrap();

        conn.execute(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username VARCHAR(32) NOT NULL,
                status VARCHAR(16) DEFAULT 'active'
            )",
            &[],
        )
        .unwrap();

        let columns = conn.columns("users").unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].primary_key);
        assert_eq!(columns[2].default, Some(Value::from("active")));

        let mut row = Row::new();
        row.insert("username", "tester");
        assert_eq!(conn.insert("users", &row, &[]).unwrap(), 1);
        assert_eq!(conn.last_insert_id(None).unwrap(), Value::I64(1));

        let rows = conn
            .execute_query("SELECT * FROM users WHERE username = ?1", &[Value::from("tester")])
            .unwrap();
        assert_eq!(rows.row_count(), 1);
        let first = rows.first().unwrap();
        assert_eq!(first.get("status"), Some(&Value::from("active")));
    }

    #[test]
    fn missing_table_errors() {
        let mut conn = Connection::in_memory().unwrap();
        assert!(conn.columns("nope").is_err());
    }

    #[test]
    fn quote_literal_escapes() {
        let conn = Connection::in_memory().unwrap();
        assert_eq!(conn.quote_literal(&Value::from("it's")), "'it''s'");
        assert_eq!(conn.quote_literal(&Value::Null), "NULL");
        assert_eq!(conn.quote_literal(&Value::I64(7)), "7");
    }
}
