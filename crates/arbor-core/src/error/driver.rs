use std::fmt;

#[derive(Debug)]
pub(super) struct DriverError {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl DriverError {
    pub(super) fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver operation failed: {}", self.source)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[derive(Debug)]
pub(super) struct InvalidConnectionUrlError {
    message: String,
}

impl InvalidConnectionUrlError {
    pub(super) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for InvalidConnectionUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid connection URL: {}", self.message)
    }
}
