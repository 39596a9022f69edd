mod value;
pub use value::Value;

mod value_chrono;
