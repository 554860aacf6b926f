//! HTTP route handlers.

pub mod admin;
pub mod content;
pub mod content_type;
pub mod health;
pub mod helpers;
