use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, instrument};

use super::error::SchemaLoadError;
use super::introspect::run_introspection;
use super::introspection::{schema_from_introspection, IntrospectionData, IntrospectionResponse};
use super::sdl::schema_from_sdl;
use super::Schema;

/// Where the schema comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaSource {
    IntrospectionEndpoint {
        url: String,
        #[serde(default)]
        include_deprecated_fields: bool,
        #[serde(default)]
        include_deprecated_enum_values: bool,
    },
    JsonFile {
        path: PathBuf,
    },
    SdlFile {
        path: PathBuf,
    },
}

pub struct SchemaLoader {
    pub source: SchemaSource,
    /// Retain an SDL rendition of the schema for the validation pass.
    pub retain_sdl: bool,
}

impl SchemaLoader {
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&self) -> Result<Schema, SchemaLoadError> {
        let schema = match &self.source {
            SchemaSource::IntrospectionEndpoint {
                url,
                include_deprecated_fields,
                include_deprecated_enum_values,
            } => {
                let response = run_introspection(
                    url,
                    *include_deprecated_fields,
                    *include_deprecated_enum_values,
                )
                .await?;
                schema_from_introspection(response.data.schema, self.retain_sdl)?
            }
            SchemaSource::JsonFile { path } => {
                let text = read_file(path)?;
                schema_from_introspection(decode_introspection(&text)?, self.retain_sdl)?
            }
            SchemaSource::SdlFile { path } => {
                let text = read_file(path)?;
                schema_from_sdl(&text, self.retain_sdl)?
            }
        };
        info!(
            query_type = %schema.query_type,
            objects = schema.cache.objects.len(),
            interfaces = schema.cache.interfaces.len(),
            unions = schema.cache.unions.len(),
            "schema loaded"
        );
        Ok(schema)
    }
}

fn read_file(path: &Path) -> Result<String, SchemaLoadError> {
    std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Schema JSON files come either as the bare `{"__schema": ...}` object or
/// wrapped in a `{"data": ...}` envelope saved from an endpoint response.
fn decode_introspection(
    text: &str,
) -> Result<super::introspection::IntrospectionSchema, SchemaLoadError> {
    if let Ok(data) = serde_json::from_str::<IntrospectionData>(text) {
        return Ok(data.schema);
    }
    let response: IntrospectionResponse = serde_json::from_str(text)?;
    Ok(response.data.schema)
}
