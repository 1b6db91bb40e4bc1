//! The full run: load schema and documents, optionally validate, resolve, and
//! write the persisted-operations manifest when configured.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{Config, PersistedOperationsMode};
use crate::documents::{Documents, DocumentsLoader};
use crate::error::TypegenError;
use crate::persisted;
use crate::resolution::{DocumentsResolver, ResolvedDocuments};
use crate::schema::{Schema, SchemaLoader};
use crate::validation::DocumentsValidator;

pub struct Pipeline {
    pub config: Config,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub schema: Arc<Schema>,
    pub documents: Arc<Documents>,
    pub resolved: ResolvedDocuments,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<PipelineOutput, TypegenError> {
        let hash_operations = matches!(
            self.config.persisted_operations,
            PersistedOperationsMode::Registered { .. }
        );
        let schema = SchemaLoader {
            source: self.config.schema.clone(),
            retain_sdl: self.config.validation,
        }
        .load()
        .await?;
        let documents = DocumentsLoader {
            directories: self.config.documents.clone(),
            resolve_text: self.config.validation || hash_operations,
            hash_operations,
        }
        .load()?;

        let schema = Arc::new(schema);
        let documents = Arc::new(documents);

        if self.config.validation {
            DocumentsValidator::new(Arc::clone(&schema), Arc::clone(&documents))
                .validate()
                .await?;
        }

        let resolved = DocumentsResolver::new(Arc::clone(&schema), Arc::clone(&documents))
            .resolve()
            .await?;
        info!(
            documents = resolved.documents.len(),
            fragments = resolved.fragment_lookup.len(),
            used_types = resolved.used_types.len(),
            "corpus resolved"
        );

        if let PersistedOperationsMode::Registered { manifest_path } =
            &self.config.persisted_operations
        {
            persisted::write_manifest(&documents, manifest_path)?;
        }

        Ok(PipelineOutput {
            schema,
            documents,
            resolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSource;
    use std::path::PathBuf;

    const SDL: &str = "type Query { hero: Character }\n\
                       interface Character { id: ID! name: String! }\n\
                       type Jedi implements Character { id: ID! name: String! }";

    fn setup(tag: &str, document: &str) -> (PathBuf, Config) {
        let dir = std::env::temp_dir().join(format!("typegen-pipeline-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("queries")).unwrap();
        std::fs::write(dir.join("schema.graphql"), SDL).unwrap();
        std::fs::write(dir.join("queries/doc.graphql"), document).unwrap();
        let config = Config {
            schema: SchemaSource::SdlFile {
                path: dir.join("schema.graphql"),
            },
            documents: vec![dir.join("queries")],
            validation: true,
            persisted_operations: PersistedOperationsMode::Registered {
                manifest_path: dir.join("ops.json"),
            },
        };
        (dir, config)
    }

    #[tokio::test]
    async fn end_to_end_run_resolves_and_writes_the_manifest() {
        let (dir, config) = setup(
            "ok",
            "query Hero { hero { __typename ...jedi } }\n\
             fragment jedi on Jedi { name }",
        );
        let output = Pipeline::new(config).run().await.unwrap();
        assert_eq!(output.resolved.documents.len(), 1);
        assert!(output.resolved.fragment_lookup.contains_key("jedi"));
        let manifest: std::collections::BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(dir.join("ops.json")).unwrap()).unwrap();
        assert_eq!(manifest.len(), 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn invalid_operation_stops_the_run_before_resolution() {
        let (dir, config) = setup("bad", "query Hero { hero { nope } }");
        let err = Pipeline::new(config).run().await.unwrap_err();
        assert!(matches!(err, TypegenError::Validation(_)));
        assert!(!dir.join("ops.json").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
