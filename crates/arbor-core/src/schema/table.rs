use super::Column;
use crate::stmt::Value;

use indexmap::IndexMap;

/// Column metadata for one table, keyed by column name in declaration
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Table name as introspected, including any connection prefix.
    pub name: String,

    columns: IndexMap<String, Column>,
}

impl TableSchema {
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|column| (column.name.clone(), column))
                .collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Decoded default for a column; `Value::Null` when the column has no
    /// default or is unknown.
    pub fn default_of(&self, name: &str) -> Value {
        self.column(name)
            .map(Column::default_value)
            .unwrap_or(Value::Null)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
