mod row;
pub use row::{Row, Rows};

use crate::{
    schema::{Column, Type},
    stmt::Value,
    Result,
};

use std::borrow::Cow;
use std::fmt;

/// A database backend. Connecting yields the [`Connection`] capability
/// surface the record layer runs on.
pub trait Driver: fmt::Debug {
    /// Connection URL describing this driver, for diagnostics.
    fn url(&self) -> Cow<'_, str>;

    fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// The capability surface the ORM consumes from a database connection.
///
/// Every operation blocks until the database answers and is attempted
/// exactly once; failures propagate to the caller as-is.
pub trait Connection: Send {
    /// Execute a parameterized query and return the matched rows.
    fn execute_query(&mut self, sql: &str, params: &[Value]) -> Result<Rows>;

    /// Execute a parameterized statement, returning the affected-row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Insert one row. `types` carries column-type hints for backends that
    /// need them to pick a binding representation.
    fn insert(&mut self, table: &str, data: &Row, types: &[(String, Type)]) -> Result<usize>;

    /// Update rows matching the keyed `filter` (column = value, ANDed).
    fn update(
        &mut self,
        table: &str,
        data: &Row,
        filter: &Row,
        types: &[(String, Type)],
    ) -> Result<usize>;

    /// Delete rows matching the keyed `filter`.
    fn delete(&mut self, table: &str, filter: &Row) -> Result<usize>;

    /// The id generated by the most recent insert. `sequence` names the
    /// generator on sequence-based backends; drivers without sequences
    /// ignore it. A backend with nothing to report returns `Value::Null`.
    fn last_insert_id(&mut self, sequence: Option<&str>) -> Result<Value>;

    /// Introspect the columns of `table`, decoding default literals into
    /// typed values.
    fn columns(&mut self, table: &str) -> Result<Vec<Column>>;

    /// Render `value` as a safely escaped SQL literal.
    fn quote_literal(&self, value: &Value) -> String;
}
