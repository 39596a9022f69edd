//! Declarative per-field validation rules and their runner.

use crate::{db::Db, stmt::Value, ErrorEntry, Record, Result};

/// The rule catalog. Each rule checks one field and produces a structured
/// error entry on failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Fails on unset, null, and empty-string values.
    Required,

    /// Fails when another row holds the same value under a different
    /// primary key.
    Unique,

    Email,
    MinLength(usize),
    MaxLength(usize),
    Numeric,

    /// Cross-field equality, e.g. password confirmation.
    Confirm(String),
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Unique => "unique",
            Self::Email => "email",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Numeric => "numeric",
            Self::Confirm(_) => "confirm",
        }
    }
}

/// Run every declared rule for every field, appending an entry per
/// violation. Never short-circuits, so one pass reports everything.
pub(crate) fn run(record: &mut Record, db: &Db) -> Result<()> {
    let model = record.model().clone();

    for (field, rules) in model.validations() {
        for rule in rules {
            if let Some(entry) = apply(rule, record, field, db)? {
                record.errors_mut().add(field.clone(), entry);
            }
        }
    }

    Ok(())
}

fn apply(rule: &Rule, record: &Record, field: &str, db: &Db) -> Result<Option<ErrorEntry>> {
    let value = record.get(field);

    let entry = match rule {
        Rule::Required => match value {
            None | Some(Value::Null) => Some(ErrorEntry::new("required", "required")),
            Some(Value::String(s)) if s.is_empty() => {
                Some(ErrorEntry::new("required", "required"))
            }
            _ => None,
        },
        Rule::Unique => {
            // Unset values compare as the empty string.
            let value = match value {
                None | Some(Value::Null) => Value::from(""),
                Some(value) => value.clone(),
            };

            match record.model().find_by(db, field, value)? {
                Some(other) if other.id() != record.id() => {
                    Some(ErrorEntry::new("unique", "already_in_use"))
                }
                _ => None,
            }
        }
        Rule::Email => {
            if is_email(value) {
                None
            } else {
                Some(ErrorEntry::new("email", "must_be_email"))
            }
        }
        Rule::MinLength(min) => {
            if text_length(value) < *min {
                Some(
                    ErrorEntry::new("min_length", "field_too_short")
                        .with_option("min_length", *min as i64),
                )
            } else {
                None
            }
        }
        Rule::MaxLength(max) => {
            if text_length(value) > *max {
                Some(
                    ErrorEntry::new("max_length", "field_too_long")
                        .with_option("max_length", *max as i64),
                )
            } else {
                None
            }
        }
        Rule::Numeric => match value {
            Some(Value::I64(_)) | Some(Value::F64(_)) => None,
            Some(Value::String(s)) if s.parse::<f64>().is_ok() => None,
            _ => Some(ErrorEntry::new("numeric", "must_be_numeric")),
        },
        Rule::Confirm(other) => {
            if record.get(field) == record.get(other) {
                None
            } else {
                Some(
                    ErrorEntry::new("confirm", "fields_dont_match")
                        .with_option("confirm", other.clone()),
                )
            }
        }
    };

    Ok(entry)
}

fn text_length(value: Option<&Value>) -> usize {
    match value {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::I64(v)) => v.to_string().len(),
        Some(Value::F64(v)) => v.to_string().len(),
        _ => 0,
    }
}

fn is_email(value: Option<&Value>) -> bool {
    let Some(Value::String(s)) = value else {
        return false;
    };
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
}
