use std::path::PathBuf;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema: contained a type ref named '{0}' with no corresponding type")]
    InvalidSchema(String),
    #[error("the GraphQL schema does not support {kind} operations (operation '{operation}')")]
    UnsupportedOperation { kind: String, operation: String },
    #[error(
        "selected a field whose type is the input object '{0}'; \
         input objects are not valid field types \
         (https://spec.graphql.org/October2021/#sec-Input-Objects.Result-Coercion)"
    )]
    InputObjectInFieldPosition(String),
    #[error(
        "fragment was specified on type '{0}'; fragments must be specified on an \
         object, interface or union type \
         (https://spec.graphql.org/October2021/#sel-GAFbdJABeBiC2vU)"
    )]
    InvalidFragmentTypeCondition(String),
    #[error("selected field '{field}' that doesn't exist on {on_type}")]
    UnknownField { field: String, on_type: String },
    #[error(
        "queried field '{field}' directly from union type {union}; fields may not be \
         queried directly from union types \
         (https://spec.graphql.org/October2021/#sel-EAHdJDBAACCiDzyP)"
    )]
    UnionFieldSelection { field: String, union: String },
    #[error("could not find input type named '{0}' in schema")]
    UnknownInputType(String),
    #[error("type '{0}' is not usable in input position")]
    InvalidInputType(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("unable to read schema file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode introspection JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse schema SDL: {0}")]
    Sdl(#[from] graphql_parser::schema::ParseError),
    #[error("introspection request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("introspection response carried errors: {0}")]
    IntrospectionErrors(String),
    #[error("malformed introspection data: {0}")]
    MalformedIntrospection(String),
    #[error("schema SDL does not declare a query root type")]
    MissingQueryType,
}
