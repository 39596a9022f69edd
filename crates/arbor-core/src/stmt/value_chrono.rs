use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::stmt::Value;

/// Datetime columns store preformatted text; chrono values are rendered on
/// the way in.
macro_rules! impl_chrono_conversions {
    ($chrono:ty, $fmt:literal) => {
        impl From<$chrono> for Value {
            fn from(value: $chrono) -> Self {
                Self::String(value.format($fmt).to_string())
            }
        }
    };
}

impl_chrono_conversions!(NaiveDateTime, "%Y-%m-%d %H:%M:%S");
impl_chrono_conversions!(NaiveDate, "%Y-%m-%d");

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        value.naive_utc().into()
    }
}
