//! Persisted-operations manifest: hash → resolved operation text, for servers
//! that accept operations by content hash.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::documents::{DocumentDefinition, Documents};

#[derive(Debug, thiserror::Error)]
pub enum PersistedOperationsError {
    #[error(
        "operation '{operation}' has no hash; persisted operations require \
         hashed document loading"
    )]
    MissingHash { operation: String },
    #[error("unable to write persisted operations manifest to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to serialize persisted operations manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds the manifest from every operation in the corpus. `BTreeMap` keeps
/// the serialized key order stable across runs.
pub fn manifest(documents: &Documents) -> Result<BTreeMap<String, String>, PersistedOperationsError> {
    use crate::ast::OperationDefinitionExt;

    let mut manifest = BTreeMap::new();
    for document in &documents.documents {
        for definition in &document.definitions {
            let DocumentDefinition::Operation(operation) = definition else {
                continue;
            };
            let (Some(hash), Some(text)) = (&operation.hash, &operation.resolved_text) else {
                return Err(PersistedOperationsError::MissingHash {
                    operation: operation.ast.name().unwrap_or_default().to_string(),
                });
            };
            manifest.insert(hash.clone(), text.clone());
        }
    }
    Ok(manifest)
}

pub fn write_manifest(documents: &Documents, path: &Path) -> Result<(), PersistedOperationsError> {
    let manifest = manifest(documents)?;
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(path, json).map_err(|source| PersistedOperationsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(operations = manifest.len(), path = %path.display(), "persisted operations manifest written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::loader::tests::load_fixture;
    use crate::documents::DocumentsLoader;

    #[test]
    fn manifest_maps_hashes_to_resolved_text() {
        let dir = std::env::temp_dir().join(format!("typegen-persist-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("hero.graphql"),
            "query Hero { hero { ...character } }\n\
             fragment character on Character { id }",
        )
        .unwrap();
        let documents = DocumentsLoader {
            directories: vec![dir.clone()],
            resolve_text: true,
            hash_operations: true,
        }
        .load()
        .unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let manifest = manifest(&documents).unwrap();
        assert_eq!(manifest.len(), 1);
        let (hash, text) = manifest.iter().next().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(text.contains("fragment character"));
    }

    #[test]
    fn unhashed_corpus_is_rejected() {
        let documents = load_fixture(&[("hero.graphql", "query Hero { hero { id } }")]);
        assert!(matches!(
            manifest(&documents),
            Err(PersistedOperationsError::MissingHash { operation }) if operation == "Hero"
        ));
    }
}
