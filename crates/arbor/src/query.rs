//! Fluent construction and execution of parameterized SELECT statements.

use crate::{db::Db, stmt::Value, Model, Record, Result};
use arbor_core::{driver::Rows, err};

/// Accumulates SELECT/FROM/WHERE state and executes against the model's
/// connection, hydrating results into records.
///
/// Exactly one predicate tree exists per builder: [`filter`] replaces it,
/// unless the one-shot merge latch set by [`merge_next_filter`] is armed,
/// in which case the next `filter` call AND-merges instead.
///
/// [`filter`]: QueryBuilder::filter
/// [`merge_next_filter`]: QueryBuilder::merge_next_filter
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    model: Model,
    select: Vec<String>,
    from: Option<(String, String)>,
    predicate: Option<String>,
    params: Vec<Param>,
    merge_next: bool,
}

#[derive(Debug, Clone)]
enum Param {
    Positional(Value),
    Named(String, Value),
}

impl QueryBuilder {
    pub(crate) fn new(model: Model) -> Self {
        Self {
            model,
            select: vec!["*".to_string()],
            from: None,
            predicate: None,
            params: vec![],
            merge_next: false,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Replace the selected columns (the default is `*`).
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        if self.select.is_empty() {
            self.select.push("*".to_string());
        }
        self
    }

    /// Set the source table and query alias.
    pub fn from(mut self, table: &str, alias: &str) -> Self {
        self.from = Some((table.to_string(), alias.to_string()));
        self
    }

    /// Set the predicate, or AND-merge it into the existing one when the
    /// merge latch is armed. The latch is consumed either way.
    pub fn filter(mut self, predicate: &str) -> Self {
        if self.merge_next {
            self.merge_next = false;
            if let Some(existing) = self.predicate.take() {
                self.predicate = Some(format!("{existing} AND {predicate}"));
                return self;
            }
        }
        self.predicate = Some(predicate.to_string());
        self
    }

    /// Always AND-combine with the existing predicate. Binds nothing.
    pub fn and_filter(mut self, predicate: &str) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => format!("{existing} AND {predicate}"),
            None => predicate.to_string(),
        });
        self
    }

    /// [`filter`](QueryBuilder::filter) plus a positional bind, the
    /// dominant `"column = ?"` call shape.
    pub fn filter_bind(self, predicate: &str, value: impl Into<Value>) -> Self {
        self.filter(predicate).bind(value)
    }

    /// Bind the next positional `?` placeholder.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(Param::Positional(value.into()));
        self
    }

    /// Bind a named `:token` placeholder.
    pub fn bind_named(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.params
            .push(Param::Named(name.to_string(), value.into()));
        self
    }

    /// Arm the one-shot latch making the *next* [`filter`] call AND-merge
    /// instead of replace. Relation queries use this so a caller-supplied
    /// predicate is appended to the relation's own filter rather than
    /// clobbering it.
    ///
    /// [`filter`]: QueryBuilder::filter
    pub fn merge_next_filter(mut self) -> Self {
        self.merge_next = true;
        self
    }

    /// Render the SQL text and the ordered parameter list, normalizing
    /// positional `?` and named `:token` placeholders into one `?` list in
    /// textual order.
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        let (table, alias) = self
            .from
            .as_ref()
            .ok_or_else(|| err!("query has no source table"))?;

        let mut sql = format!("SELECT {} FROM {table} AS {alias}", self.select.join(", "));
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }

        expand_placeholders(&sql, &self.params)
    }

    /// Execute and hydrate the first row, or `None` when nothing matched.
    pub fn fetch(&self, db: &Db) -> Result<Option<Record>> {
        let rows = self.execute(db)?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let schema = self.schema(db)?;
        Ok(Some(Record::hydrate(self.model.clone(), &schema, row)))
    }

    /// Execute and hydrate every row.
    pub fn fetch_all(&self, db: &Db) -> Result<Vec<Record>> {
        let rows = self.execute(db)?;
        let schema = self.schema(db)?;

        Ok(rows
            .into_iter()
            .map(|row| Record::hydrate(self.model.clone(), &schema, row))
            .collect())
    }

    /// Execute and return the matched row count.
    pub fn row_count(&self, db: &Db) -> Result<usize> {
        Ok(self.execute(db)?.row_count())
    }

    /// Escape a value as a SQL literal, delegating to the connection.
    pub fn quote(&self, db: &Db, value: &Value) -> Result<String> {
        let handle = db.connection(self.model.connection_name())?;
        Ok(handle.quote_literal(value))
    }

    /// [`quote`](QueryBuilder::quote), element-wise.
    pub fn quote_all(&self, db: &Db, values: &[Value]) -> Result<Vec<String>> {
        values.iter().map(|value| self.quote(db, value)).collect()
    }

    fn execute(&self, db: &Db) -> Result<Rows> {
        let (sql, params) = self.build()?;
        let handle = db.connection(self.model.connection_name())?;
        handle.execute_query(&sql, &params)
    }

    fn schema(&self, db: &Db) -> Result<std::sync::Arc<arbor_core::TableSchema>> {
        let (table, _) = self
            .from
            .as_ref()
            .ok_or_else(|| err!("query has no source table"))?;
        let handle = db.connection(self.model.connection_name())?;
        handle.schema_of(table)
    }
}

fn expand_placeholders(sql: &str, params: &[Param]) -> Result<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = vec![];

    let mut positionals = params.iter().filter_map(|param| match param {
        Param::Positional(value) => Some(value),
        _ => None,
    });

    let mut chars = sql.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }

        match c {
            '\'' => {
                in_string = true;
                out.push(c);
            }
            '?' => {
                let value = positionals
                    .next()
                    .ok_or_else(|| err!("positional placeholder without a bound parameter"))?;
                values.push(value.clone());
                out.push('?');
            }
            ':' => {
                let mut token = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        token.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if token.is_empty() {
                    out.push(':');
                    continue;
                }

                // Later binds win when a token is bound twice.
                let value = params
                    .iter()
                    .rev()
                    .find_map(|param| match param {
                        Param::Named(name, value) if *name == token => Some(value),
                        _ => None,
                    })
                    .ok_or_else(|| err!("no parameter bound for placeholder `:{token}`"))?;
                values.push(value.clone());
                out.push('?');
            }
            _ => out.push(c),
        }
    }

    Ok((out, values))
}
