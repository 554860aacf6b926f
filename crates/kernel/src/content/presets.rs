//! Built-in content types shipped with the kernel.

use std::collections::BTreeMap;

use serde_json::Value;
use tessera_schema::types::{
    ContentTypeDefinition, ContentTypeOptions, FieldDefinition, FieldType, FieldValidation,
};

/// The `article` preset: blog articles and posts.
pub fn article() -> ContentTypeDefinition {
    ContentTypeDefinition::new("article", "Article")
        .description("Blog articles and posts")
        .with_field(
            FieldDefinition::new("title", FieldType::Text)
                .display_name("Title")
                .required()
                .with_validation(FieldValidation::default().min_length(1).max_length(200)),
        )
        .with_field(
            FieldDefinition::new("slug", FieldType::Text)
                .display_name("Slug")
                .required()
                .unique()
                .with_validation(FieldValidation::default().pattern("^[a-z0-9-]+$")),
        )
        .with_field(
            FieldDefinition::new("excerpt", FieldType::Textarea)
                .display_name("Excerpt")
                .with_validation(FieldValidation::default().max_length(500)),
        )
        .with_field(
            FieldDefinition::new("content", FieldType::Richtext)
                .display_name("Content")
                .required(),
        )
        .with_field(
            FieldDefinition::new("featuredImage", FieldType::Media)
                .display_name("Featured Image")
                .with_validation(FieldValidation::default().accept(["image/*"])),
        )
        .with_field(
            FieldDefinition::new("published", FieldType::Boolean)
                .display_name("Published")
                .default_value(Value::Bool(false)),
        )
        .with_field(
            FieldDefinition::new("publishedAt", FieldType::Datetime).display_name("Published At"),
        )
        .with_field(
            FieldDefinition::new("tags", FieldType::Text)
                .display_name("Tags")
                .multiple(),
        )
        .with_options(ContentTypeOptions {
            timestamps: true,
            title_field: Some("title".into()),
            slug_field: Some("slug".into()),
            sort_field: None,
            sort_order: None,
        })
}

/// All presets keyed by name.
pub fn all() -> BTreeMap<String, ContentTypeDefinition> {
    [article()]
        .into_iter()
        .map(|def| (def.name.clone(), def))
        .collect()
}
