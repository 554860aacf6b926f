//! Core schema types.
//!
//! The JSON representation follows the admin API: camelCase keys
//! (`displayName`, `relationTarget`, `createdAt`) and lowercase field type
//! names (`"text"`, `"richtext"`, `"datetime"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fixed set of field types a content type can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Richtext,
    Number,
    Boolean,
    Date,
    Datetime,
    Email,
    Url,
    Media,
    Relation,
    Select,
    Json,
}

/// A value constraint that can be declared in a field's `validation` bundle.
///
/// Which constraints apply is a property of the field type; see
/// [`FieldType::constraints`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// `minLength` / `maxLength` on string values.
    Length,
    /// `pattern` regular expression on string values.
    Pattern,
    /// `min` / `max` on numeric values.
    NumericRange,
    /// `options` membership.
    Options,
    /// `accept` MIME patterns on media values.
    Accept,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 13] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Richtext,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Email,
        FieldType::Url,
        FieldType::Media,
        FieldType::Relation,
        FieldType::Select,
        FieldType::Json,
    ];

    /// Machine name as used in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Richtext => "richtext",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Media => "media",
            FieldType::Relation => "relation",
            FieldType::Select => "select",
            FieldType::Json => "json",
        }
    }

    /// Parse a machine name. Unknown names return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Types whose value is a single string of free text.
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Textarea
                | FieldType::Richtext
                | FieldType::Email
                | FieldType::Url
        )
    }

    /// Types that listing views may sort by.
    pub fn is_sortable(self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Number
                | FieldType::Date
                | FieldType::Datetime
                | FieldType::Boolean
        )
    }

    /// Constraints recognized for this type, in the order they are checked.
    pub fn constraints(self) -> &'static [Constraint] {
        match self {
            FieldType::Text
            | FieldType::Textarea
            | FieldType::Richtext
            | FieldType::Email
            | FieldType::Url => &[Constraint::Length, Constraint::Pattern],
            FieldType::Number => &[Constraint::NumericRange],
            FieldType::Select => &[Constraint::Options],
            FieldType::Media => &[Constraint::Accept],
            FieldType::Boolean
            | FieldType::Date
            | FieldType::Datetime
            | FieldType::Relation
            | FieldType::Json => &[],
        }
    }
}

/// Form control used to edit a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `<input type="...">` with the given HTML input type.
    Input(&'static str),
    TextArea,
    Checkbox,
    Select,
    File,
    /// Text input holding the id of an item of another content type.
    Reference,
}

impl FieldType {
    /// Form control for this type.
    pub fn input_kind(self) -> InputKind {
        match self {
            FieldType::Text => InputKind::Input("text"),
            FieldType::Email => InputKind::Input("email"),
            FieldType::Url => InputKind::Input("url"),
            FieldType::Number => InputKind::Input("number"),
            FieldType::Date => InputKind::Input("date"),
            FieldType::Datetime => InputKind::Input("datetime-local"),
            FieldType::Textarea | FieldType::Richtext | FieldType::Json => InputKind::TextArea,
            FieldType::Boolean => InputKind::Checkbox,
            FieldType::Select => InputKind::Select,
            FieldType::Media => InputKind::File,
            FieldType::Relation => InputKind::Reference,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional constraint bundle attached to a field.
///
/// Keys that do not apply to the field's type are carried but ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression, used exactly as authored (no implicit anchors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// MIME patterns such as `image/*` or `application/pdf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<Vec<String>>,
}

impl FieldValidation {
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn options<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn accept<S: Into<String>>(mut self, accept: impl IntoIterator<Item = S>) -> Self {
        self.accept = Some(accept.into_iter().map(Into::into).collect());
        self
    }
}

/// A single field definition within a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Storage key; unique within its content type.
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Human label.
    pub display_name: String,

    #[serde(default)]
    pub required: bool,

    /// Advisory only; enforcement belongs to the persistence layer.
    #[serde(default)]
    pub unique: bool,

    /// The value is a sequence of the base type.
    #[serde(default)]
    pub multiple: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,

    /// Target content type name. Required when `field_type` is `Relation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            display_name: name.into(),
            required: false,
            unique: false,
            multiple: false,
            default_value: None,
            validation: None,
            relation_target: None,
            description: None,
        }
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn relation_to(mut self, target: &str) -> Self {
        self.relation_target = Some(target.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The validation bundle, or an empty one.
    pub fn rules(&self) -> FieldValidation {
        self.validation.clone().unwrap_or_default()
    }
}

/// Listing sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc` case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

fn default_timestamps() -> bool {
    true
}

/// Per-type options for listing views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeOptions {
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,

    /// Field supplying the item's title in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,

    /// Field supplying the item's slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug_field: Option<String>,

    /// Default listing sort field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortDirection>,
}

impl Default for ContentTypeOptions {
    fn default() -> Self {
        Self {
            timestamps: default_timestamps(),
            title_field: None,
            slug_field: None,
            sort_field: None,
            sort_order: None,
        }
    }
}

/// A content type: an ordered list of fields plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeDefinition {
    /// Lowercase identifier: a letter followed by letters or digits.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Display order is declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,

    #[serde(default)]
    pub options: ContentTypeOptions,
}

impl ContentTypeDefinition {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            fields: Vec::new(),
            options: ContentTypeOptions::default(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_options(mut self, options: ContentTypeOptions) -> Self {
        self.options = options;
        self
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn title_field(&self) -> Option<&FieldDefinition> {
        self.options
            .title_field
            .as_deref()
            .and_then(|name| self.field(name))
    }

    pub fn slug_field(&self) -> Option<&FieldDefinition> {
        self.options
            .slug_field
            .as_deref()
            .and_then(|name| self.field(name))
    }
}

/// A stored record conforming to a content type.
///
/// Identity and timestamps are assigned by whoever persists the item; the
/// schema layer only describes `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub content_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Get a raw field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Get a field value as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Title shown in listings: the type's `titleField`, then a `title` key,
    /// then the id.
    pub fn title(&self, content_type: &ContentTypeDefinition) -> String {
        content_type
            .options
            .title_field
            .as_deref()
            .and_then(|name| self.get_str(name))
            .or_else(|| self.get_str("title"))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }
}
