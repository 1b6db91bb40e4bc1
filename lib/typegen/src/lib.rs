//! GraphQL code-generation frontend: loads a schema and a corpus of `.graphql`
//! documents, validates them, and resolves every operation and fragment into
//! typed, fragment-expanded, merge-checked selection sets.

pub mod ast;
pub mod config;
pub mod documents;
pub mod error;
pub mod persisted;
pub mod pipeline;
pub mod resolution;
pub mod schema;
pub mod validation;

pub use config::Config;
pub use error::TypegenError;
pub use pipeline::{Pipeline, PipelineOutput};
pub use resolution::ResolvedDocuments;
pub use schema::Schema;
