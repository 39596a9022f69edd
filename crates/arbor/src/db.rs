mod builder;
pub use builder::{Builder, ConnectionInfo};

mod connect;

use crate::{Model, Result};
use arbor_core::{
    driver::{Connection, Row, Rows},
    schema::Type,
    stmt::Value,
    Error, TableSchema,
};

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Name a connection gets when registered without one.
pub const DEFAULT_CONNECTION: &str = "default";

/// The registries every operation runs against: named connections (each
/// with its memoized schema cache) and model descriptors. Passed by
/// reference into record and query operations; there is no hidden global
/// state.
pub struct Db {
    connections: HashMap<String, ConnectionHandle>,
    models: HashMap<String, Model>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionHandle> {
        self.connections
            .get(name)
            .ok_or_else(|| Error::unknown_connection(name))
    }

    pub fn default_connection(&self) -> Result<&ConnectionHandle> {
        self.connection(DEFAULT_CONNECTION)
    }

    /// Look a registered model up by name. Relation targets resolve
    /// through here.
    pub fn model(&self, name: &str) -> Result<Model> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_model(name))
    }
}

/// One ready connection: the boxed driver connection, the table-name
/// prefix, and the schema cache.
pub struct ConnectionHandle {
    name: String,
    url: String,
    prefix: String,
    connection: Mutex<Box<dyn Connection>>,
    schemas: Mutex<HashMap<String, Arc<TableSchema>>>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        name: String,
        url: String,
        prefix: String,
        connection: Box<dyn Connection>,
    ) -> Self {
        Self {
            name,
            url,
            prefix,
            connection: Mutex::new(connection),
            schemas: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Apply the connection's table-name prefix.
    pub fn table_name(&self, base: &str) -> String {
        format!("{}{base}", self.prefix)
    }

    /// Column metadata for `table`, introspected once and memoized for the
    /// process lifetime. Introspection failure propagates to the caller;
    /// nothing is cached for the table in that case.
    pub fn schema_of(&self, table: &str) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.schemas.lock().unwrap().get(table) {
            return Ok(schema.clone());
        }

        debug!("loading schema for table `{table}`");
        let columns = self.with(|conn| conn.columns(table))?;
        let schema = Arc::new(TableSchema::from_columns(table, columns));

        self.schemas
            .lock()
            .unwrap()
            .insert(table.to_string(), schema.clone());
        Ok(schema)
    }

    /// Drop the cached schema for `table` so the next lookup introspects
    /// again. The cache never invalidates itself; out-of-band DDL changes
    /// require an explicit call.
    pub fn invalidate_schema(&self, table: &str) {
        self.schemas.lock().unwrap().remove(table);
    }

    pub fn execute_query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        debug!("executing `{sql}` with {} parameters", params.len());
        self.with(|conn| conn.execute_query(sql, params))
    }

    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!("executing `{sql}` with {} parameters", params.len());
        self.with(|conn| conn.execute(sql, params))
    }

    pub fn insert(&self, table: &str, data: &Row, types: &[(String, Type)]) -> Result<usize> {
        self.with(|conn| conn.insert(table, data, types))
    }

    pub fn update(
        &self,
        table: &str,
        data: &Row,
        filter: &Row,
        types: &[(String, Type)],
    ) -> Result<usize> {
        self.with(|conn| conn.update(table, data, filter, types))
    }

    pub fn delete(&self, table: &str, filter: &Row) -> Result<usize> {
        self.with(|conn| conn.delete(table, filter))
    }

    pub fn last_insert_id(&self, sequence: Option<&str>) -> Result<Value> {
        self.with(|conn| conn.last_insert_id(sequence))
    }

    pub fn quote_literal(&self, value: &Value) -> String {
        let conn = self.connection.lock().unwrap();
        conn.quote_literal(value)
    }

    fn with<R>(&self, f: impl FnOnce(&mut dyn Connection) -> Result<R>) -> Result<R> {
        let mut conn = self.connection.lock().unwrap();
        f(conn.as_mut())
    }
}
