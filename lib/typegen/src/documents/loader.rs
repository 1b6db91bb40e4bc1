use std::collections::HashMap;
use std::path::PathBuf;

use graphql_parser::parse_query;
use tracing::{info, instrument};

use crate::ast;

use super::error::DocumentError;
use super::scan::DocumentScanner;
use super::text::{expand_operation_text, hash_hex, minify};
use super::{Document, DocumentDefinition, Documents, Fragment, Operation};

/// Loads every `.graphql` file under the configured directories into a
/// [`Documents`] corpus. Fragment names must be unique across all files so the
/// corpus-wide lookup is unambiguous.
pub struct DocumentsLoader {
    pub directories: Vec<PathBuf>,
    /// Populate each operation's minified resolved text.
    pub resolve_text: bool,
    /// Also hash resolved texts, for persisted-operation manifests. Implies
    /// text resolution.
    pub hash_operations: bool,
}

impl DocumentsLoader {
    #[instrument(level = "debug", skip(self), fields(directories = self.directories.len()))]
    pub fn load(&self) -> Result<Documents, DocumentError> {
        let paths = DocumentScanner::new(&self.directories).scan()?;
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| DocumentError::Io {
                path: path.clone(),
                source,
            })?;
            sources.push((path, text));
        }
        let mut documents = build_corpus(sources)?;
        if self.resolve_text || self.hash_operations {
            fill_resolved_texts(&mut documents, self.hash_operations)?;
        }
        info!(
            files = documents.documents.len(),
            operations = documents
                .documents
                .iter()
                .flat_map(|d| &d.definitions)
                .filter(|d| matches!(d, DocumentDefinition::Operation(_)))
                .count(),
            fragments = documents.fragment_lookup.len(),
            "documents loaded"
        );
        Ok(documents)
    }
}

fn build_corpus(sources: Vec<(PathBuf, String)>) -> Result<Documents, DocumentError> {
    let mut documents = Vec::with_capacity(sources.len());
    let mut fragment_lookup: HashMap<String, Fragment> = HashMap::new();
    for (path, text) in sources {
        let parsed = parse_query::<String>(&text)
            .map_err(|source| DocumentError::Parse {
                path: path.clone(),
                source,
            })?
            .into_static();
        let mut definitions = Vec::with_capacity(parsed.definitions.len());
        for definition in parsed.definitions {
            match definition {
                ast::Definition::Operation(operation) => {
                    let source_text = operation.to_string();
                    definitions.push(DocumentDefinition::Operation(Operation {
                        ast: operation,
                        source_text,
                        resolved_text: None,
                        hash: None,
                    }));
                }
                ast::Definition::Fragment(fragment) => {
                    if let Some(existing) = fragment_lookup.get(&fragment.name) {
                        return Err(DocumentError::DuplicateFragmentName {
                            name: fragment.name,
                            first: existing.file.clone(),
                            second: path,
                        });
                    }
                    let source_text = fragment.to_string();
                    definitions.push(DocumentDefinition::Fragment(fragment.name.clone()));
                    fragment_lookup.insert(
                        fragment.name.clone(),
                        Fragment {
                            file: path.clone(),
                            ast: fragment,
                            source_text,
                        },
                    );
                }
            }
        }
        documents.push(Document { path, definitions });
    }
    Ok(Documents {
        documents,
        fragment_lookup,
    })
}

/// Second pass once the fragment lookup is complete: expansion needs to see
/// fragments declared in files loaded after the operation's own.
fn fill_resolved_texts(documents: &mut Documents, hash: bool) -> Result<(), DocumentError> {
    let mut resolved: Vec<(usize, usize, String)> = Vec::new();
    for (doc_index, document) in documents.documents.iter().enumerate() {
        for (def_index, definition) in document.definitions.iter().enumerate() {
            if let DocumentDefinition::Operation(operation) = definition {
                let text = minify(&expand_operation_text(
                    operation,
                    &documents.fragment_lookup,
                )?);
                resolved.push((doc_index, def_index, text));
            }
        }
    }
    for (doc_index, def_index, text) in resolved {
        if let DocumentDefinition::Operation(operation) =
            &mut documents.documents[doc_index].definitions[def_index]
        {
            operation.hash = hash.then(|| hash_hex(&text));
            operation.resolved_text = Some(text);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a corpus from in-memory sources; shared by other test modules.
    pub(crate) fn load_fixture(files: &[(&str, &str)]) -> Documents {
        let sources = files
            .iter()
            .map(|(name, text)| (PathBuf::from(name), text.to_string()))
            .collect();
        build_corpus(sources).unwrap()
    }

    #[test]
    fn operations_and_fragments_are_indexed_per_file() {
        let documents = load_fixture(&[
            ("hero.graphql", "query Hero { hero { ...character } }"),
            (
                "character.graphql",
                "fragment character on Character { id name }",
            ),
        ]);
        assert_eq!(documents.documents.len(), 2);
        assert!(matches!(
            documents.documents[0].definitions[0],
            DocumentDefinition::Operation(_)
        ));
        assert!(matches!(
            &documents.documents[1].definitions[0],
            DocumentDefinition::Fragment(name) if name == "character"
        ));
        assert!(documents.fragment_lookup.contains_key("character"));
        assert!(documents.fragment("nope").is_err());
    }

    #[test]
    fn duplicate_fragment_names_across_files_are_rejected() {
        let sources = vec![
            (
                PathBuf::from("a.graphql"),
                "fragment character on Character { id }".to_string(),
            ),
            (
                PathBuf::from("b.graphql"),
                "fragment character on Character { name }".to_string(),
            ),
        ];
        let err = build_corpus(sources).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::DuplicateFragmentName { name, first, second }
                if name == "character"
                    && first == PathBuf::from("a.graphql")
                    && second == PathBuf::from("b.graphql")
        ));
    }

    #[test]
    fn resolved_text_and_hash_are_filled_on_demand() {
        let mut documents = load_fixture(&[
            ("hero.graphql", "query Hero {\n  hero {\n    ...character\n  }\n}"),
            (
                "character.graphql",
                "fragment character on Character { id }",
            ),
        ]);
        fill_resolved_texts(&mut documents, true).unwrap();
        let DocumentDefinition::Operation(operation) = &documents.documents[0].definitions[0]
        else {
            panic!("expected operation");
        };
        let resolved = operation.resolved_text.as_deref().unwrap();
        assert!(resolved.contains("query Hero { hero { ...character } }"));
        assert!(resolved.contains("fragment character on Character { id }"));
        assert!(!resolved.contains('\n'));
        assert_eq!(operation.hash.as_deref().unwrap().len(), 64);
    }

    #[test]
    fn parse_errors_carry_the_file_path() {
        let sources = vec![(PathBuf::from("broken.graphql"), "query {".to_string())];
        let err = build_corpus(sources).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Parse { path, .. } if path == PathBuf::from("broken.graphql")
        ));
    }
}
