use crate::stmt::Value;

use indexmap::IndexMap;

/// One validation failure attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    /// Name of the validation rule that produced the entry.
    pub validation: String,

    /// Error code, e.g. `required` or `field_too_short`.
    pub error: String,

    /// Structured context for message rendering.
    pub options: Vec<(String, Value)>,
}

impl ErrorEntry {
    pub fn new(validation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            validation: validation.into(),
            error: error.into(),
            options: vec![],
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Validation errors collected on a record, keyed by field.
///
/// Entries are appended in the order validations run and never
/// overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorSet {
    entries: IndexMap<String, Vec<ErrorEntry>>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, entry: ErrorEntry) {
        self.entries.entry(field.into()).or_default().push(entry);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[ErrorEntry]> {
        self.entries.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorEntry])> {
        self.entries
            .iter()
            .map(|(field, entries)| (field.as_str(), entries.as_slice()))
    }

    /// Rendered messages for one field, in the order the failures were
    /// recorded.
    pub fn messages_for(&self, field: &str) -> Vec<String> {
        self.get(field)
            .map(|entries| entries.iter().map(|entry| render(field, entry)).collect())
            .unwrap_or_default()
    }

    /// Rendered messages for every field with errors.
    pub fn messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(field, entries)| entries.iter().map(move |entry| render(field, entry)))
            .collect()
    }
}

fn render(field: &str, entry: &ErrorEntry) -> String {
    match entry.error.as_str() {
        "required" => format!("{field} is required"),
        "already_in_use" => format!("{field} is already in use"),
        "must_be_email" => format!("{field} must be a valid email address"),
        "must_be_numeric" => format!("{field} must be a number"),
        "field_too_short" => match entry.option("min_length") {
            Some(Value::I64(min)) => {
                format!("{field} is too short (minimum {min} characters)")
            }
            _ => format!("{field} is too short"),
        },
        "field_too_long" => match entry.option("max_length") {
            Some(Value::I64(max)) => {
                format!("{field} is too long (maximum {max} characters)")
            }
            _ => format!("{field} is too long"),
        },
        "fields_dont_match" => match entry.option("confirm") {
            Some(Value::String(other)) => format!("{field} does not match {other}"),
            _ => format!("{field} does not match"),
        },
        _ => format!("{field} is invalid"),
    }
}
