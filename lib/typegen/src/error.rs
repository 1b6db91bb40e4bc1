use crate::config::ConfigError;
use crate::documents::DocumentError;
use crate::persisted::PersistedOperationsError;
use crate::resolution::ResolutionError;
use crate::schema::{SchemaError, SchemaLoadError};
use crate::validation::ValidationError;

/// Crate-level aggregate; each pipeline phase keeps its own error enum.
#[derive(Debug, thiserror::Error)]
pub enum TypegenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    SchemaLoad(#[from] SchemaLoadError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    PersistedOperations(#[from] PersistedOperationsError),
}
