pub mod driver;
pub use driver::Connection;

mod error;
pub use error::Error;

pub mod schema;
pub use schema::TableSchema;

pub mod stmt;

/// A Result type alias that uses Arbor's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
