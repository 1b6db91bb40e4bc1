//! The parsed document corpus: operations and fragments per source file, with
//! fragment names unique across the whole corpus.

pub mod error;
pub mod loader;
pub mod scan;
pub mod text;

pub use error::DocumentError;
pub use loader::DocumentsLoader;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::ast;

#[derive(Debug, Clone)]
pub struct Documents {
    pub documents: Vec<Document>,
    /// Global fragment lookup; loading guarantees name uniqueness.
    pub fragment_lookup: HashMap<String, Fragment>,
}

impl Documents {
    pub fn fragment(&self, name: &str) -> Result<&Fragment, DocumentError> {
        self.fragment_lookup
            .get(name)
            .ok_or_else(|| DocumentError::UnknownFragment(name.to_string()))
    }
}

/// One `.graphql` source file; may contain several operations and fragments.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub definitions: Vec<DocumentDefinition>,
}

#[derive(Debug, Clone)]
pub enum DocumentDefinition {
    Operation(Operation),
    /// Fragments live in the corpus-wide lookup; the document keeps the name
    /// so per-file output knows what was defined here.
    Fragment(String),
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub ast: ast::OperationDefinition,
    pub source_text: String,
    /// Operation text with every transitively spread fragment appended,
    /// minified. Populated only when validation or persisted operations
    /// need it.
    pub resolved_text: Option<String>,
    /// SHA-256 of `resolved_text`, for registered persisted operations.
    pub hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Fragment {
    pub file: PathBuf,
    pub ast: ast::FragmentDefinition,
    pub source_text: String,
}
