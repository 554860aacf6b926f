//! Loading user content types from a YAML file.
//!
//! The file maps type names to definitions:
//!
//! ```yaml
//! event:
//!   displayName: Event
//!   fields:
//!     - name: title
//!       type: text
//!       displayName: Title
//!       required: true
//! ```
//!
//! JSON is valid YAML, so a JSON export of `GET /api/cms/content-types` works
//! as well.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use tessera_schema::types::ContentTypeDefinition;

use super::type_registry::{ContentTypeRegistry, ContentTypeSet};

/// Errors reading a content type file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read content types from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse content types from {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// Parse a content type document.
///
/// Entries that fail structural validation, or whose key differs from their
/// `name`, are skipped with a warning. An entry without a `name` takes its key.
pub fn parse_content_types(source: &str) -> Result<ContentTypeSet, serde_yml::Error> {
    let raw: BTreeMap<String, ContentTypeDefinition> = serde_yml::from_str(source)?;
    let mut accepted = ContentTypeSet::new();

    for (key, mut def) in raw {
        if def.name.is_empty() {
            def.name = key.clone();
        }
        if def.name != key {
            warn!(key = %key, name = %def.name, "skipping content type whose name differs from its key");
            continue;
        }
        let errors = ContentTypeRegistry::validate(&def);
        if !errors.is_empty() {
            warn!(content_type = %key, errors = ?errors, "skipping invalid content type");
            continue;
        }
        accepted.insert(key, def);
    }

    Ok(accepted)
}

/// Read and parse a content type file.
pub fn load_content_types(path: &Path) -> Result<ContentTypeSet, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_content_types(&source).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a content type file and register its entries as the user set.
///
/// Returns the number of types registered.
pub fn register_from_file(registry: &ContentTypeRegistry, path: &Path) -> Result<usize, LoadError> {
    let set = load_content_types(path)?;
    let count = set.len();
    registry.register(set);
    info!(path = %path.display(), count, "content types loaded");
    Ok(count)
}
