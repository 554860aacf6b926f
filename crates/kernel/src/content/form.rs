//! Auto-generated admin forms.
//!
//! Generates HTML create/edit forms from content type field definitions.

use serde_json::{Map, Number, Value};

use tessera_schema::types::{
    ContentItem, ContentTypeDefinition, FieldDefinition, FieldType, InputKind,
};

use super::validation::FieldErrors;
use crate::query::types::parse_instant;
use crate::routes::helpers::html_escape;

/// Builder for auto-generated forms.
pub struct FormBuilder {
    content_type: ContentTypeDefinition,
    errors: FieldErrors,
}

impl FormBuilder {
    /// Create a new form builder for a content type.
    pub fn new(content_type: ContentTypeDefinition) -> Self {
        Self {
            content_type,
            errors: FieldErrors::new(),
        }
    }

    /// Show validation messages under their fields.
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    /// Generate an add form for creating new items.
    ///
    /// Fields start at their declared default value.
    pub fn build_add_form(&self, action: &str) -> String {
        self.build_form(action, "item-form-add", "", |field| {
            field.default_value.as_ref()
        })
    }

    /// Add form refilled from a rejected submission.
    pub fn rebuild_add_form(&self, data: &Map<String, Value>, action: &str) -> String {
        self.build_form(action, "item-form-add", "", |field| data.get(&field.name))
    }

    /// Generate an edit form pre-filled with an item's data.
    pub fn build_edit_form(&self, item: &ContentItem, action: &str) -> String {
        let hidden = format!(
            r#"<input type="hidden" name="id" value="{}">"#,
            html_escape(&item.id)
        );
        self.build_form(action, "item-form-edit", &hidden, |field| {
            item.get(&field.name)
        })
    }

    /// Typed item data from a url-encoded submission.
    ///
    /// Starts from `existing` so keys the form cannot carry survive: media
    /// fields and undeclared keys. Every other declared field is replaced by
    /// its submitted value, or removed when the submission leaves it blank.
    pub fn read_submission(
        &self,
        pairs: &[(String, String)],
        existing: Option<&Map<String, Value>>,
    ) -> Map<String, Value> {
        let mut data = existing.cloned().unwrap_or_default();
        for field in &self.content_type.fields {
            if field.field_type == FieldType::Media {
                continue;
            }
            let raw: Vec<&str> = pairs
                .iter()
                .filter(|(key, _)| *key == field.name)
                .map(|(_, value)| value.as_str())
                .collect();
            match submitted_value(field, &raw) {
                Some(value) => {
                    data.insert(field.name.clone(), value);
                }
                None => {
                    data.remove(&field.name);
                }
            }
        }
        data
    }

    fn build_form<'a>(
        &'a self,
        action: &str,
        class: &str,
        hidden: &str,
        value: impl Fn(&'a FieldDefinition) -> Option<&'a Value>,
    ) -> String {
        let mut html = self.open_form(action, class);
        html.push_str(hidden);
        for field in &self.content_type.fields {
            html.push_str(&self.render_field(field, value(field)));
        }
        html.push_str(&close_form());
        html
    }

    fn open_form(&self, action: &str, class: &str) -> String {
        format!(
            r#"<form method="post" action="{}" class="item-form {class}" data-content-type="{}">"#,
            html_escape(action),
            html_escape(&self.content_type.name)
        )
    }

    /// Render a single field based on its type.
    fn render_field(&self, field: &FieldDefinition, value: Option<&Value>) -> String {
        let field_name = html_escape(&field.name);
        let label = html_escape(&field.display_name);
        let required = if field.required { "required" } else { "" };
        let required_star = if field.required { " *" } else { "" };
        let attrs = constraint_attrs(field);

        let control = match field.field_type.input_kind() {
            InputKind::Input(input_type) => {
                let val = html_escape(&input_value(field.field_type, value));
                let multiple = if field.multiple {
                    r#" data-multiple="true""#
                } else {
                    ""
                };
                format!(
                    r#"<input type="{input_type}" id="{field_name}" name="{field_name}" value="{val}" {required}{attrs}{multiple} class="form-control">"#
                )
            }

            InputKind::TextArea => {
                let rows = if field.field_type == FieldType::Textarea { 4 } else { 10 };
                let val = html_escape(&textarea_value(field.field_type, value));
                format!(
                    r#"<textarea id="{field_name}" name="{field_name}" rows="{rows}" {required}{attrs} class="form-control" data-field-type="{}">{val}</textarea>"#,
                    field.field_type
                )
            }

            InputKind::Checkbox => {
                let checked = if value.and_then(Value::as_bool).unwrap_or(false) {
                    "checked"
                } else {
                    ""
                };
                // Checkboxes carry their label inline.
                return self.wrap(
                    field,
                    format!(
                        r#"<label><input type="checkbox" id="{field_name}" name="{field_name}" value="true" {checked}> {label}</label>"#
                    ),
                );
            }

            InputKind::Select => {
                let selected = selected_values(value);
                let options: String = field
                    .rules()
                    .options
                    .unwrap_or_default()
                    .iter()
                    .map(|option| {
                        let sel = if selected.contains(&option.as_str()) {
                            " selected"
                        } else {
                            ""
                        };
                        let option = html_escape(option);
                        format!(r#"<option value="{option}"{sel}>{option}</option>"#)
                    })
                    .collect();
                let multiple = if field.multiple { " multiple" } else { "" };
                format!(
                    r#"<select id="{field_name}" name="{field_name}" {required}{multiple} class="form-control"><option value="">- Select -</option>{options}</select>"#
                )
            }

            InputKind::File => {
                let accept = field
                    .rules()
                    .accept
                    .map(|types| format!(r#" accept="{}""#, html_escape(&types.join(","))))
                    .unwrap_or_default();
                let multiple = if field.multiple { " multiple" } else { "" };
                let current = value
                    .and_then(|v| v.get("url").or(Some(v)))
                    .and_then(Value::as_str)
                    .map(|url| {
                        let url = html_escape(url);
                        format!(r#"<div class="form-help">Current: <a href="{url}">{url}</a></div>"#)
                    })
                    .unwrap_or_default();
                // A stored file satisfies the requirement; only fresh forms demand one.
                let required = if current.is_empty() { required } else { "" };
                format!(
                    r#"<input type="file" id="{field_name}" name="{field_name}" {required}{accept}{multiple} class="form-control">{current}"#
                )
            }

            InputKind::Reference => {
                let target = html_escape(field.relation_target.as_deref().unwrap_or_default());
                let val = html_escape(&input_value(field.field_type, value));
                format!(
                    r#"<input type="text" id="{field_name}" name="{field_name}" value="{val}" {required} class="form-control" data-relation-target="{target}" placeholder="ID">
                    <div class="form-help">Enter the ID of the referenced {target} item.</div>"#
                )
            }
        };

        self.wrap(
            field,
            format!(r#"<label for="{field_name}">{label}{required_star}</label>{control}"#),
        )
    }

    /// Form group with description and any error message.
    fn wrap(&self, field: &FieldDefinition, inner: String) -> String {
        let error = self.errors.get(&field.name);
        let class = if error.is_some() {
            "form-group has-error"
        } else {
            "form-group"
        };
        let description = field
            .description
            .as_deref()
            .map(|d| format!(r#"<div class="form-help">{}</div>"#, html_escape(d)))
            .unwrap_or_default();
        let error = error
            .map(|e| format!(r#"<div class="form-error">{}</div>"#, html_escape(e)))
            .unwrap_or_default();

        format!(
            r#"
            <div class="{class}">
                {inner}
                {description}
                {error}
            </div>
            "#
        )
    }
}

fn close_form() -> String {
    r#"
            <div class="form-actions">
                <button type="submit" class="btn btn-primary">Save</button>
            </div>
        </form>
        "#
    .to_string()
}

/// Value for one field from its raw submitted strings.
///
/// Checkboxes are false when absent. Multi-value inputs are comma separated;
/// multi-selects repeat the key instead.
fn submitted_value(field: &FieldDefinition, raw: &[&str]) -> Option<Value> {
    if field.field_type == FieldType::Boolean {
        let checked = raw
            .iter()
            .any(|v| matches!(v.trim(), "true" | "on" | "1"));
        return Some(Value::Bool(checked));
    }

    if field.multiple {
        let parts: Vec<&str> = if field.field_type == FieldType::Select {
            raw.to_vec()
        } else {
            raw.iter().copied().flat_map(|v| v.split(',')).collect()
        };
        let values: Vec<Value> = parts
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| scalar_value(field.field_type, v))
            .collect();
        return (!values.is_empty()).then_some(Value::Array(values));
    }

    raw.iter()
        .rev()
        .find(|v| !v.trim().is_empty())
        .map(|v| scalar_value(field.field_type, v))
}

/// Numbers and JSON are parsed; anything unparseable stays a string so
/// validation can report it.
fn scalar_value(field_type: FieldType, raw: &str) -> Value {
    match field_type {
        FieldType::Number => {
            let trimmed = raw.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Value::from(n);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or_else(|| Value::String(raw.to_string()), Value::Number)
        }
        FieldType::Json => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        _ => Value::String(raw.to_string()),
    }
}

/// HTML constraint attributes derived from the validation bundle.
fn constraint_attrs(field: &FieldDefinition) -> String {
    let rules = field.rules();
    let mut attrs = String::new();

    if field.field_type.is_text_like() {
        if let Some(min) = rules.min_length.filter(|n| *n > 0) {
            attrs.push_str(&format!(r#" minlength="{min}""#));
        }
        if let Some(max) = rules.max_length.filter(|n| *n > 0) {
            attrs.push_str(&format!(r#" maxlength="{max}""#));
        }
        if let Some(pattern) = &rules.pattern {
            attrs.push_str(&format!(r#" pattern="{}""#, html_escape(pattern)));
        }
    }
    if field.field_type == FieldType::Number {
        if let Some(min) = rules.min {
            attrs.push_str(&format!(r#" min="{min}""#));
        }
        if let Some(max) = rules.max {
            attrs.push_str(&format!(r#" max="{max}""#));
        }
        attrs.push_str(r#" step="any""#);
    }

    attrs
}

/// Unescaped value for an `<input>`.
fn input_value(field_type: FieldType, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match (field_type, value) {
        (FieldType::Datetime, Value::String(s)) => parse_instant(s)
            .map(|t| t.format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_else(|| s.clone()),
        (FieldType::Date, Value::String(s)) => s.get(..10).unwrap_or(s).to_string(),
        (_, Value::String(s)) => s.clone(),
        (_, Value::Number(n)) => n.to_string(),
        (_, Value::Bool(b)) => b.to_string(),
        (_, Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        (_, Value::Object(_)) => value.to_string(),
        (_, Value::Null) => String::new(),
    }
}

/// Unescaped value for a `<textarea>`. JSON fields show pretty-printed JSON.
fn textarea_value(field_type: FieldType, value: Option<&Value>) -> String {
    match (field_type, value) {
        (_, None | Some(Value::Null)) => String::new(),
        (FieldType::Json, Some(value)) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        (_, Some(Value::String(s))) => s.clone(),
        (_, Some(other)) => other.to_string(),
    }
}

fn selected_values(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
