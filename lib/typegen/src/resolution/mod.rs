//! The document resolution engine: turns parsed documents plus the schema
//! catalog into fully-typed, fragment-expanded, merge-validated selection
//! sets.

pub mod documents;
pub mod error;
pub mod field;
pub mod selection_set;

pub use documents::{
    DocumentsResolver, ResolvedDefinition, ResolvedDocument, ResolvedDocuments, ResolvedFragment,
    ResolvedInputType, ResolvedOperation, ResolvedVariable,
};
pub use error::ResolutionError;
pub use field::{FieldResolver, ResolvedField, ResolvedFieldType};
pub use selection_set::{ResolvedSelection, ResolvedSelectionSet, SelectionSetResolver};
