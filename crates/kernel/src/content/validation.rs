//! Schema-driven validation of content item data.
//!
//! Each field is checked independently against its own definition. Fields
//! without a violation never appear in the result, so an empty map means the
//! record may be persisted.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use tessera_schema::types::{
    Constraint, ContentTypeDefinition, FieldDefinition, FieldValidation,
};

/// Field name to error message.
pub type FieldErrors = BTreeMap<String, String>;

/// Validates item data against a content type definition.
///
/// With `strict_constraints` off only the required, length and pattern rules
/// run. Turning it on also enforces numeric bounds, select options and media
/// MIME types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine {
    strict_constraints: bool,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the numeric/select/media checks.
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict_constraints = enabled;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_constraints
    }

    /// Validate `data` against every field of `def`.
    pub fn validate(&self, def: &ContentTypeDefinition, data: &Map<String, Value>) -> FieldErrors {
        def.fields
            .iter()
            .filter_map(|field| {
                self.check_field(field, data.get(&field.name))
                    .map(|message| (field.name.clone(), message))
            })
            .collect()
    }

    /// Run all rules for one field. A later violation replaces an earlier one.
    fn check_field(&self, field: &FieldDefinition, value: Option<&Value>) -> Option<String> {
        let mut error = None;

        if field.required && is_absent(value) {
            error = Some(format!("{} is required", field.display_name));
        }

        let rules = field.rules();
        for constraint in field.field_type.constraints() {
            let violation = match constraint {
                Constraint::Length => check_length(field, &rules, value),
                Constraint::Pattern => check_pattern(field, &rules, value),
                Constraint::NumericRange if self.strict_constraints => {
                    check_range(field, &rules, value)
                }
                Constraint::Options if self.strict_constraints => {
                    check_options(field, &rules, value)
                }
                Constraint::Accept if self.strict_constraints => {
                    check_accept(field, &rules, value)
                }
                _ => None,
            };
            if violation.is_some() {
                error = violation;
            }
        }

        error
    }
}

/// Missing, null, or a string of only whitespace. `false` and `0` are values.
fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Non-empty string value, if any.
fn string_value(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn check_length(
    field: &FieldDefinition,
    rules: &FieldValidation,
    value: Option<&Value>,
) -> Option<String> {
    let text = string_value(value)?;
    let len = text.chars().count();
    let mut error = None;

    if let Some(min) = rules.min_length.filter(|n| *n > 0)
        && len < min
    {
        error = Some(format!(
            "{} must be at least {min} characters",
            field.display_name
        ));
    }
    if let Some(max) = rules.max_length.filter(|n| *n > 0)
        && len > max
    {
        error = Some(format!(
            "{} must be at most {max} characters",
            field.display_name
        ));
    }

    error
}

fn check_pattern(
    field: &FieldDefinition,
    rules: &FieldValidation,
    value: Option<&Value>,
) -> Option<String> {
    let text = string_value(value)?;
    let pattern = rules.pattern.as_deref()?;

    match Regex::new(pattern) {
        Ok(re) if re.is_match(text) => None,
        Ok(_) => Some(format!("{} format is invalid", field.display_name)),
        Err(e) => {
            warn!(field = %field.name, pattern, error = %e, "skipping uncompilable pattern");
            None
        }
    }
}

fn check_range(
    field: &FieldDefinition,
    rules: &FieldValidation,
    value: Option<&Value>,
) -> Option<String> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let mut error = None;
    if let Some(min) = rules.min
        && number < min
    {
        error = Some(format!("{} must be at least {min}", field.display_name));
    }
    if let Some(max) = rules.max
        && number > max
    {
        error = Some(format!("{} must be at most {max}", field.display_name));
    }
    error
}

fn check_options(
    field: &FieldDefinition,
    rules: &FieldValidation,
    value: Option<&Value>,
) -> Option<String> {
    let options = rules.options.as_ref()?;
    let chosen: Vec<&str> = match value? {
        Value::String(s) if !s.is_empty() => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };

    if chosen.iter().all(|c| options.iter().any(|o| o == c)) {
        None
    } else {
        Some(format!(
            "{} must be one of: {}",
            field.display_name,
            options.join(", ")
        ))
    }
}

fn check_accept(
    field: &FieldDefinition,
    rules: &FieldValidation,
    value: Option<&Value>,
) -> Option<String> {
    let accept = rules.accept.as_ref()?;
    let mime_types: Vec<&str> = match value? {
        Value::Array(items) => items.iter().filter_map(media_mime_type).collect(),
        other => media_mime_type(other).into_iter().collect(),
    };

    let rejected = mime_types
        .iter()
        .any(|mime| !accept.iter().any(|pattern| mime_matches(pattern, mime)));

    rejected.then(|| format!("{} has an unsupported file type", field.display_name))
}

/// MIME type carried by a media value (`{"mimeType": ..}` or `{"contentType": ..}`).
fn media_mime_type(value: &Value) -> Option<&str> {
    value
        .get("mimeType")
        .or_else(|| value.get("contentType"))
        .and_then(Value::as_str)
}

/// `image/*` style matching; exact types compare case-insensitively.
fn mime_matches(pattern: &str, mime: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let mime = mime.trim().to_ascii_lowercase();
    match pattern.strip_suffix("/*") {
        _ if pattern == "*" || pattern == "*/*" => true,
        Some(major) => mime.split('/').next() == Some(major),
        None => pattern == mime,
    }
}
