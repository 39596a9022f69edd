use crate::{
    db::Db,
    filter::{Action, Phase},
    relation::{Related, RelationKind},
    schema::Type,
    stmt::Value,
    validate, ErrorSet, Model, Result,
};
use arbor_core::{driver::Row, Error, TableSchema};

use indexmap::IndexMap;
use std::collections::HashMap;

/// One in-memory row of a model's table.
///
/// A record is either *new* (constructed from schema defaults plus caller
/// data, nothing in storage yet) or *persisted* (hydrated from a row, or
/// saved once). A successful save of a new record flips it to persisted
/// exactly once, assigning the generated primary key. Deleting removes
/// the backing row but leaves the instance readable; the caller is
/// expected to discard it.
#[derive(Debug, Clone)]
pub struct Record {
    model: Model,
    fields: IndexMap<String, Value>,
    is_new: bool,
    errors: ErrorSet,
    relation_cache: HashMap<String, Option<Record>>,
}

impl Record {
    /// Construct a new record: every schema column starts at its decoded
    /// default, then `data` is overlaid by mass assignment.
    pub(crate) fn new(model: Model, db: &Db, data: Row) -> Result<Record> {
        let handle = db.connection(model.connection_name())?;
        let table = handle.table_name(model.base_table());
        let schema = handle.schema_of(&table)?;

        let mut fields = IndexMap::new();
        for column in schema.columns() {
            fields.insert(column.name.clone(), column.default_value());
        }

        let mut record = Record {
            model,
            fields,
            is_new: true,
            errors: ErrorSet::new(),
            relation_cache: HashMap::new(),
        };
        record.set_all(data);
        Ok(record)
    }

    /// Hydrate a record from a database row. The row is authoritative:
    /// defaults are bypassed and cells run through column-typed decoding.
    pub(crate) fn hydrate(model: Model, schema: &TableSchema, row: Row) -> Record {
        let mut fields = IndexMap::new();
        for (name, value) in row {
            let value = decode(&model, schema, &name, value);
            fields.insert(name, value);
        }

        Record {
            model,
            fields,
            is_new: false,
            errors: ErrorSet::new(),
            relation_cache: HashMap::new(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The primary key value, `Value::Null` while unassigned.
    pub fn id(&self) -> Value {
        self.fields
            .get(self.model.primary_key())
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Set one field verbatim.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Mass assignment: overlay every pair in `data`, skipping
    /// empty-string values ("leave unset").
    pub fn set_all(&mut self, data: Row) {
        for (field, value) in data {
            if matches!(&value, Value::String(s) if s.is_empty()) {
                continue;
            }
            self.fields.insert(field, value);
        }
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has_error(field)
    }

    pub(crate) fn errors_mut(&mut self) -> &mut ErrorSet {
        &mut self.errors
    }

    /// Run every declared validation, rebuilding the error list. The
    /// record validates iff the list ends up empty.
    pub fn validate(&mut self, db: &Db) -> Result<bool> {
        self.errors.clear();
        validate::run(self, db)?;
        Ok(self.errors.is_empty())
    }

    /// Persist the record: insert when new, keyed update otherwise.
    ///
    /// Validation runs first; on failure this returns `Ok(false)` without
    /// touching storage. After either write path the row is refetched so
    /// database-side defaults are reconciled into the instance.
    pub fn save(&mut self, db: &Db) -> Result<bool> {
        if !self.validate(db)? {
            return Ok(false);
        }

        let model = self.model.clone();
        let handle = db.connection(model.connection_name())?;
        let table = handle.table_name(model.base_table());
        let schema = handle.schema_of(&table)?;
        let pk = model.primary_key();

        if self.is_new {
            model.filters().run(self, Phase::Before, Action::Create);

            if schema.contains("created_at") {
                self.set("created_at", chrono::Utc::now());
            }

            let mut data = self.data_against(&schema);
            data.remove(pk);
            handle.insert(&table, &data, model.data_types())?;

            let mut id = handle.last_insert_id(None)?;
            if id.is_falsy() {
                // Sequence-based backends report nothing through the
                // plain lookup.
                let sequence = format!("{table}_{pk}_seq");
                id = handle.last_insert_id(Some(&sequence))?;
            }

            self.is_new = false;
            self.fields.insert(pk.to_string(), id);

            self.refetch_row(db)?;
            model.filters().run(self, Phase::After, Action::Create);
        } else {
            model.filters().run(self, Phase::Before, Action::Save);
            model.filters().run(self, Phase::Before, Action::Update);

            if schema.contains("updated_at") {
                self.set("updated_at", chrono::Utc::now());
            }

            let mut data = self.data_against(&schema);
            data.remove(pk);

            let mut filter = Row::new();
            filter.insert(pk, self.id());
            handle.update(&table, &data, &filter, model.data_types())?;

            self.refetch_row(db)?;
            model.filters().run(self, Phase::After, Action::Save);
        }

        Ok(true)
    }

    /// Delete the backing row by primary key. Instance state is not
    /// mutated; the caller is expected to discard the record.
    pub fn delete(&self, db: &Db) -> Result<usize> {
        let handle = db.connection(self.model.connection_name())?;
        let table = handle.table_name(self.model.base_table());

        let mut filter = Row::new();
        filter.insert(self.model.primary_key(), self.id());
        handle.delete(&table, &filter)
    }

    /// Snapshot of the schema-defined fields, substituting a column's
    /// default wherever the field holds the empty-string sentinel.
    pub fn get_data(&self, db: &Db) -> Result<Row> {
        let handle = db.connection(self.model.connection_name())?;
        let table = handle.table_name(self.model.base_table());
        let schema = handle.schema_of(&table)?;
        Ok(self.data_against(&schema))
    }

    /// [`get_data`](Record::get_data) minus the columns excluded from
    /// external representation.
    pub fn to_array(&self, db: &Db) -> Result<Row> {
        let mut data = self.get_data(db)?;
        let excluded: Vec<String> = data
            .iter()
            .map(|(name, _)| name.to_string())
            .filter(|name| self.model.is_excluded(name))
            .collect();
        for name in excluded {
            data.remove(&name);
        }
        Ok(data)
    }

    /// Mass-assign and save in one step.
    pub fn update_attributes(&mut self, db: &Db, data: Row) -> Result<bool> {
        self.set_all(data);
        self.save(db)
    }

    /// Resolve a declared relation by name.
    ///
    /// Belongs-to results are cached per instance; has-many produces a
    /// fresh builder with the merge latch armed so caller filters append
    /// to the relation's own. An undeclared name is a fatal error.
    pub fn related(&mut self, db: &Db, name: &str) -> Result<Related> {
        let model = self.model.clone();
        let Some(kind) = model.relation(name) else {
            return Err(Error::unknown_relation(model.name(), name));
        };

        match kind {
            RelationKind::BelongsTo(descriptor) => {
                if let Some(cached) = self.relation_cache.get(name) {
                    return Ok(match cached {
                        Some(record) => Related::One(record.clone()),
                        None => Related::Absent,
                    });
                }

                let local = self
                    .fields
                    .get(&descriptor.local_key)
                    .cloned()
                    .unwrap_or(Value::Null);

                // A null local key resolves to absent without querying.
                if local.is_null() {
                    self.relation_cache.insert(name.to_string(), None);
                    return Ok(Related::Absent);
                }

                let target = db.model(&descriptor.model)?;
                let found = target
                    .select(db)?
                    .filter(&format!("{} = ?", descriptor.foreign_key))
                    .bind(local)
                    .fetch(db)?;

                self.relation_cache.insert(name.to_string(), found.clone());
                Ok(match found {
                    Some(record) => Related::One(record),
                    None => Related::Absent,
                })
            }
            RelationKind::HasMany(descriptor) => {
                let local = self
                    .fields
                    .get(&descriptor.local_key)
                    .cloned()
                    .unwrap_or(Value::Null);

                let target = db.model(&descriptor.model)?;
                let builder = target
                    .select(db)?
                    .filter(&format!("{} = ?", descriptor.foreign_key))
                    .bind(local)
                    .merge_next_filter();

                Ok(Related::Many(builder))
            }
        }
    }

    fn data_against(&self, schema: &TableSchema) -> Row {
        let mut data = Row::new();
        for column in schema.columns() {
            let value = match self.fields.get(&column.name) {
                Some(Value::String(s)) if s.is_empty() && column.default.is_some() => {
                    column.default_value()
                }
                Some(value) => value.clone(),
                None => column.default_value(),
            };
            data.insert(column.name.clone(), value);
        }
        data
    }

    /// Read the row back after a write so computed and database-side
    /// defaulted columns land in the instance.
    fn refetch_row(&mut self, db: &Db) -> Result<()> {
        let id = self.id();
        if id.is_null() {
            return Ok(());
        }

        let model = self.model.clone();
        if let Some(fresh) = model.find(db, id)? {
            self.fields = fresh.fields;
        }
        Ok(())
    }
}

fn decode(model: &Model, schema: &TableSchema, name: &str, value: Value) -> Value {
    let ty = model
        .data_type_of(name)
        .or_else(|| schema.column(name).map(|column| column.ty));

    match (ty, value) {
        (Some(Type::JsonArray), Value::String(text)) => match serde_json::from_str(&text) {
            Ok(json) => Value::Json(json),
            Err(_) => Value::String(text),
        },
        (Some(Type::Boolean), Value::I64(raw)) => Value::Bool(raw != 0),
        // Datetime columns keep their preformatted text as-is.
        (_, value) => value,
    }
}
