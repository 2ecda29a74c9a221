//! Shared types for the enhanced dependency tools: node identifiers and
//! their ordering, relation labels, edge categories, and the column-level
//! representation of a sentence line.

pub mod annotation;
pub mod category;
pub mod deprel;
pub mod error;
pub mod ids;
pub mod row;

// Re-export core types for convenience
pub use annotation::{EdgeKey, Features, Misc, MiscItem, EDEP_KEY, EMPTY_COLUMN};
pub use category::EdgeCategory;
pub use deprel::{Deprel, RelationBase};
pub use error::ParseError;
pub use ids::{compare, NodeId};
pub use row::Row;
