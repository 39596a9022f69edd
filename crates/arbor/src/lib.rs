pub mod db;
pub use db::{Builder, ConnectionInfo, Db};

mod errors;
pub use errors::{ErrorEntry, ErrorSet};

pub mod filter;
pub use filter::{Action, Phase};

pub mod inflect;

mod model;
pub use model::{Model, ModelBuilder, ModelDef};

pub mod query;
pub use query::QueryBuilder;

mod record;
pub use record::Record;

pub mod relation;
pub use relation::{Related, RelationDecl, RelationKind};

pub mod validate;
pub use validate::Rule;

pub use arbor_core::{driver, schema, stmt, Error, Result};

/// Build a [`driver::Row`] from `name => value` pairs, the call shape used
/// for mass assignment and inserts.
#[macro_export]
macro_rules! fields {
    () => { $crate::driver::Row::new() };
    ( $( $name:expr => $value:expr ),+ $(,)? ) => {{
        let mut row = $crate::driver::Row::new();
        $( row.insert($name, $value); )+
        row
    }};
}
