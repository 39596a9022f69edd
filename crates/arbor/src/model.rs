use crate::{
    db::Db,
    filter::{Action, Filters, Hook, Phase},
    inflect,
    relation::{self, RelationDecl, RelationKind},
    schema::Type,
    stmt::Value,
    validate::Rule,
    QueryBuilder, Record, Result,
};
use arbor_core::driver::Row;

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

/// The descriptor for one model type: everything the original kept in
/// class-level statics, resolved into an explicit value.
pub struct ModelDef {
    name: String,
    table: Option<String>,
    connection: String,
    primary_key: String,
    data_types: Vec<(String, Type)>,
    excluded: Vec<String>,
    validations: Vec<(String, Vec<Rule>)>,
    filters: Filters,
    belongs_to: Vec<RelationDecl>,
    has_many: Vec<RelationDecl>,

    // Computed lazily, once per descriptor.
    base_table: OnceLock<String>,
    relations: OnceLock<HashMap<String, RelationKind>>,
}

impl ModelDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_name(&self) -> &str {
        &self.connection
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Table name before any connection prefix: the explicit override, or
    /// the inflected model name.
    pub fn base_table(&self) -> &str {
        self.base_table.get_or_init(|| match &self.table {
            Some(table) => table.clone(),
            None => inflect::tableize(&self.name),
        })
    }

    /// Look a relation up by name, resolving all declarations on first
    /// access.
    pub fn relation(&self, name: &str) -> Option<&RelationKind> {
        self.relations
            .get_or_init(|| {
                let mut map = HashMap::new();
                for decl in &self.belongs_to {
                    map.insert(
                        decl.name.clone(),
                        RelationKind::BelongsTo(relation::resolve_belongs_to(decl)),
                    );
                }
                for decl in &self.has_many {
                    map.insert(
                        decl.name.clone(),
                        RelationKind::HasMany(relation::resolve_has_many(decl, self.base_table())),
                    );
                }
                map
            })
            .get(name)
    }

    pub(crate) fn data_types(&self) -> &[(String, Type)] {
        &self.data_types
    }

    pub(crate) fn data_type_of(&self, column: &str) -> Option<Type> {
        self.data_types
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    pub(crate) fn is_excluded(&self, column: &str) -> bool {
        self.excluded.iter().any(|name| name == column)
    }

    pub(crate) fn validations(&self) -> &[(String, Vec<Rule>)] {
        &self.validations
    }

    pub(crate) fn filters(&self) -> &Filters {
        &self.filters
    }
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("table", &self.base_table())
            .field("connection", &self.connection)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

/// A cheap handle to a model descriptor. Records and query builders carry
/// clones of it.
#[derive(Clone)]
pub struct Model {
    def: Arc<ModelDef>,
}

impl Deref for Model {
    type Target = ModelDef;

    fn deref(&self) -> &ModelDef {
        &self.def
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model({})", self.def.name)
    }
}

impl Model {
    /// Start defining a model.
    pub fn define(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    /// A `SELECT *` query against this model's table.
    pub fn select(&self, db: &Db) -> Result<QueryBuilder> {
        let handle = db.connection(self.connection_name())?;
        let table = handle.table_name(self.base_table());
        Ok(QueryBuilder::new(self.clone()).from(&table, &table))
    }

    /// A query with an initial predicate.
    pub fn filter(&self, db: &Db, predicate: &str) -> Result<QueryBuilder> {
        Ok(self.select(db)?.filter(predicate))
    }

    /// Find one record by primary key.
    pub fn find(&self, db: &Db, id: impl Into<Value>) -> Result<Option<Record>> {
        self.find_by(db, self.primary_key(), id)
    }

    /// Find one record by `field = value`.
    pub fn find_by(
        &self,
        db: &Db,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Record>> {
        self.select(db)?
            .filter(&format!("{field} = ?"))
            .bind(value)
            .fetch(db)
    }

    /// Every row of the table, hydrated.
    pub fn all(&self, db: &Db) -> Result<Vec<Record>> {
        self.select(db)?.fetch_all(db)
    }

    /// Construct a new record and save it. `Ok(None)` signals validation
    /// failure; nothing was written.
    pub fn create(&self, db: &Db, data: Row) -> Result<Option<Record>> {
        let mut record = self.new_record(db, data)?;
        if record.save(db)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Construct an unsaved record with schema defaults overlaid by
    /// `data`.
    pub fn new_record(&self, db: &Db, data: Row) -> Result<Record> {
        Record::new(self.clone(), db, data)
    }

    /// Insert a raw row, bypassing the record lifecycle. The primary key
    /// is stripped; inserts never set it explicitly.
    pub fn insert(&self, db: &Db, data: Row) -> Result<usize> {
        self.insert_with_types(db, data, &[])
    }

    /// Insert with extra per-call column-type hints merged over the
    /// declared ones.
    pub fn insert_with_types(
        &self,
        db: &Db,
        mut data: Row,
        types: &[(String, Type)],
    ) -> Result<usize> {
        data.remove(self.primary_key());

        let mut merged = self.data_types().to_vec();
        for (column, ty) in types {
            match merged.iter_mut().find(|(name, _)| name == column) {
                Some(entry) => entry.1 = *ty,
                None => merged.push((column.clone(), *ty)),
            }
        }

        let handle = db.connection(self.connection_name())?;
        let table = handle.table_name(self.base_table());
        handle.insert(&table, &data, &merged)
    }
}

/// Builds a [`Model`].
pub struct ModelBuilder {
    name: String,
    table: Option<String>,
    connection: String,
    primary_key: String,
    data_types: Vec<(String, Type)>,
    excluded: Vec<String>,
    validations: Vec<(String, Vec<Rule>)>,
    filters: Filters,
    belongs_to: Vec<RelationDecl>,
    has_many: Vec<RelationDecl>,
}

impl ModelBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            connection: crate::db::DEFAULT_CONNECTION.to_string(),
            primary_key: "id".to_string(),
            data_types: vec![],
            excluded: vec![],
            validations: vec![],
            filters: Filters::default(),
            belongs_to: vec![],
            has_many: vec![],
        }
    }

    /// Override the inflected table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn connection(mut self, name: impl Into<String>) -> Self {
        self.connection = name.into();
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Declare a column's stored representation, e.g.
    /// [`Type::JsonArray`] for columns holding encoded documents.
    pub fn data_type(mut self, column: impl Into<String>, ty: Type) -> Self {
        self.data_types.push((column.into(), ty));
        self
    }

    /// Hide a column from [`Record::to_array`].
    pub fn exclude(mut self, column: impl Into<String>) -> Self {
        self.excluded.push(column.into());
        self
    }

    pub fn validates(
        mut self,
        field: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Self {
        self.validations
            .push((field.into(), rules.into_iter().collect()));
        self
    }

    pub fn belongs_to(mut self, decl: impl Into<RelationDecl>) -> Self {
        self.belongs_to.push(decl.into());
        self
    }

    pub fn has_many(mut self, decl: impl Into<RelationDecl>) -> Self {
        self.has_many.push(decl.into());
        self
    }

    pub fn before(mut self, action: Action, name: &'static str, hook: Hook) -> Self {
        self.filters.add(Phase::Before, action, name, hook);
        self
    }

    pub fn after(mut self, action: Action, name: &'static str, hook: Hook) -> Self {
        self.filters.add(Phase::After, action, name, hook);
        self
    }

    pub fn build(self) -> Model {
        Model {
            def: Arc::new(ModelDef {
                name: self.name,
                table: self.table,
                connection: self.connection,
                primary_key: self.primary_key,
                data_types: self.data_types,
                excluded: self.excluded,
                validations: self.validations,
                filters: self.filters,
                belongs_to: self.belongs_to,
                has_many: self.has_many,
                base_table: OnceLock::new(),
                relations: OnceLock::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_name_is_inflected_unless_overridden() {
        let user = Model::define("User").build();
        assert_eq!(user.base_table(), "users");

        let user = Model::define("User").table("people").build();
        assert_eq!(user.base_table(), "people");
    }

    #[test]
    fn relations_resolve_once_with_defaults() {
        let post = Model::define("Post")
            .belongs_to(RelationDecl::new("author").model("User"))
            .has_many("comments")
            .build();

        let RelationKind::BelongsTo(author) = post.relation("author").unwrap() else {
            panic!("expected belongs-to");
        };
        assert_eq!(author.model, "User");
        assert_eq!(author.local_key, "author_id");

        let RelationKind::HasMany(comments) = post.relation("comments").unwrap() else {
            panic!("expected has-many");
        };
        assert_eq!(comments.model, "Comment");
        assert_eq!(comments.foreign_key, "post_id");

        assert!(post.relation("widgets").is_none());
    }
}
