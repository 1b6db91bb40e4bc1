use std::path::PathBuf;

use crate::documents::DocumentError;
use crate::schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("field '{response_key}' is of a composite type and requires a selection set")]
    MissingSelectionSet { response_key: String },
    #[error("'typename' is a reserved fragment name")]
    ReservedFragmentName,
    // Deciding at decode time whether a skipped fragment was sent requires
    // access to the operation's runtime variables, which resolved output does
    // not carry.
    #[error(
        "fragment spread '...{fragment}' cannot be combined with \
         @skip or @include directives"
    )]
    ConditionalFragmentSpread { fragment: String },
    #[error(
        "selections at response key '{response_key}' resolve to \
         incompatible field types and cannot be merged"
    )]
    IncompatibleFieldMerge { response_key: String },
    #[error("selections at response key '{response_key}' cannot be merged")]
    IncompatibleSelectionMerge { response_key: String },
    #[error(
        "fragment spread '...{fragment_spread}' requires a __typename check \
         but the selection set has no unconditional __typename selection"
    )]
    FragmentSpreadNeedsTypename { fragment_spread: String },
    #[error(
        "the selection set of field '{field}' spreads '...{fragment_spread}' \
         and needs an unconditional __typename selection to discriminate it"
    )]
    SelectionSetNeedsTypename {
        field: String,
        fragment_spread: String,
    },
    #[error("unable to resolve operation '{name}' in {}: {source}", path.display())]
    Operation {
        name: String,
        path: PathBuf,
        #[source]
        source: Box<ResolutionError>,
    },
    #[error("unable to resolve fragment '{name}' in {}: {source}", path.display())]
    Fragment {
        name: String,
        path: PathBuf,
        #[source]
        source: Box<ResolutionError>,
    },
    #[error("resolution task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}
