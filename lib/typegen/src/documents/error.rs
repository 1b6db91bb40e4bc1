use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unable to read document file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: graphql_parser::query::ParseError,
    },
    // Stricter than the per-document uniqueness the GraphQL spec asks for
    // (https://spec.graphql.org/October2021/#sel-IALVDDFDABhCBrE77W):
    // corpus-wide uniqueness is what allows spreading fragments declared in
    // other .graphql files.
    #[error(
        "duplicate fragment name '{name}' found in {} and {}; \
         fragment names must be unique across all document files",
        first.display(),
        second.display()
    )]
    DuplicateFragmentName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("unable to find fragment definition for '{0}'")]
    UnknownFragment(String),
    #[error(
        "fragment spread '...{spread}' used in operation '{operation}' \
         but no definition was found for the fragment"
    )]
    MissingSpreadDefinition { spread: String, operation: String },
}
