//! Belongs-to / has-many associations between models.

use crate::{inflect, QueryBuilder, Record};

/// A relation as declared on a model: just a name, with any of the
/// derivable parts overridden.
#[derive(Debug, Clone, Default)]
pub struct RelationDecl {
    pub(crate) name: String,
    model: Option<String>,
    local_key: Option<String>,
    foreign_key: Option<String>,
}

impl RelationDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Override the target model name (defaults to the classified relation
    /// name).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }

    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }
}

impl From<&str> for RelationDecl {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A declaration with every part resolved, computed once per model and
/// cached for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub name: String,
    pub model: String,
    pub local_key: String,
    pub foreign_key: String,
}

/// Tagged result of looking a relation up by name on a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo(RelationDescriptor),
    HasMany(RelationDescriptor),
}

impl RelationKind {
    pub fn descriptor(&self) -> &RelationDescriptor {
        match self {
            Self::BelongsTo(descriptor) => descriptor,
            Self::HasMany(descriptor) => descriptor,
        }
    }
}

/// What a relation access produces.
#[derive(Debug)]
pub enum Related {
    /// The owning record of a belongs-to relation.
    One(Record),

    /// A belongs-to relation whose local key is null or matches no row.
    Absent,

    /// A has-many relation: a query builder already filtered by the
    /// foreign key, ready for further filtering before fetching.
    Many(QueryBuilder),
}

impl Related {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn record(self) -> Option<Record> {
        match self {
            Self::One(record) => Some(record),
            _ => None,
        }
    }

    pub fn builder(self) -> Option<QueryBuilder> {
        match self {
            Self::Many(builder) => Some(builder),
            _ => None,
        }
    }
}

pub(crate) fn resolve_belongs_to(decl: &RelationDecl) -> RelationDescriptor {
    RelationDescriptor {
        name: decl.name.clone(),
        model: decl
            .model
            .clone()
            .unwrap_or_else(|| inflect::classify(&decl.name)),
        local_key: decl
            .local_key
            .clone()
            .unwrap_or_else(|| inflect::foreign_key(&decl.name)),
        foreign_key: decl.foreign_key.clone().unwrap_or_else(|| "id".to_string()),
    }
}

pub(crate) fn resolve_has_many(decl: &RelationDecl, own_table: &str) -> RelationDescriptor {
    RelationDescriptor {
        name: decl.name.clone(),
        model: decl
            .model
            .clone()
            .unwrap_or_else(|| inflect::classify(&decl.name)),
        local_key: decl.local_key.clone().unwrap_or_else(|| "id".to_string()),
        foreign_key: decl
            .foreign_key
            .clone()
            .unwrap_or_else(|| inflect::foreign_key(own_table)),
    }
}
