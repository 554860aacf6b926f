//! Tessera schema model
//!
//! Types describing content types (named schemas of typed fields) and the
//! content items stored against them. The kernel's registry, validation
//! engine, query builder, and form builder all read field semantics from
//! these types; nothing else keeps a parallel copy.

pub mod types;

pub mod prelude {
    pub use crate::types::*;
}
