use std::fmt;

#[derive(Debug)]
pub(super) struct UnknownConnectionError {
    name: String,
}

impl UnknownConnectionError {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for UnknownConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown connection `{}`", self.name)
    }
}

#[derive(Debug)]
pub(super) struct UnknownModelError {
    name: String,
}

impl UnknownModelError {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for UnknownModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model `{}`", self.name)
    }
}

#[derive(Debug)]
pub(super) struct UnknownRelationError {
    model: String,
    name: String,
}

impl UnknownRelationError {
    pub(super) fn new(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for UnknownRelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relation [{}::{}]", self.model, self.name)
    }
}
