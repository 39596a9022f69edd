use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

use arbor_core::{stmt::Value as CoreValue, Error, Result};

#[derive(Debug)]
pub struct SqliteValue(CoreValue);

impl From<CoreValue> for SqliteValue {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl From<&CoreValue> for SqliteValue {
    fn from(value: &CoreValue) -> Self {
        Self(value.clone())
    }
}

impl SqliteValue {
    /// Converts this SQLite driver value into the core Arbor value.
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Converts a SQLite cell within a row to an Arbor value.
    ///
    /// Decoding goes by storage class only; schema-aware coercion (JSON
    /// documents, booleans) happens when a record hydrates.
    pub fn from_sql(row: &Row, index: usize) -> Result<Self> {
        let value: SqlValue = row.get(index).map_err(Error::driver_operation_failed)?;

        let core_value = match value {
            SqlValue::Null => CoreValue::Null,
            SqlValue::Integer(value) => CoreValue::I64(value),
            SqlValue::Real(value) => CoreValue::F64(value),
            SqlValue::Text(value) => CoreValue::String(value),
            SqlValue::Blob(value) => CoreValue::Bytes(value),
        };

        Ok(Self(core_value))
    }
}

impl ToSql for SqliteValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use CoreValue as Value;

        match &self.0 {
            Value::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            Value::Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            Value::Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            Value::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            Value::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            Value::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Value::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            Value::Json(v) => match serde_json::to_string(v) {
                Ok(text) => Ok(ToSqlOutput::Owned(SqlValue::Text(text))),
                Err(err) => Err(rusqlite::Error::ToSqlConversionFailure(Box::new(err))),
            },
        }
    }
}
