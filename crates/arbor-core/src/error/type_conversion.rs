use std::fmt;

#[derive(Debug)]
pub(super) struct TypeConversionError {
    from: &'static str,
    to: String,
}

impl TypeConversionError {
    pub(super) fn new(from: &'static str, to: impl Into<String>) -> Self {
        Self {
            from,
            to: to.into(),
        }
    }
}

impl fmt::Display for TypeConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to {}", self.from, self.to)
    }
}
