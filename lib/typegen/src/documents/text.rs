//! Operation text resolution: expands an operation's source with every
//! fragment it transitively spreads, producing the self-contained text that
//! validation and persisted-operation hashing run against.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use crate::ast::{self, OperationDefinitionExt};

use super::error::DocumentError;
use super::{Fragment, Operation};

pub fn expand_operation_text(
    operation: &Operation,
    fragment_lookup: &HashMap<String, Fragment>,
) -> Result<String, DocumentError> {
    let mut text = operation.source_text.clone();
    for fragment in spread_fragments(operation, fragment_lookup)? {
        text.push('\n');
        text.push_str(&fragment.source_text);
    }
    Ok(text)
}

/// Fragments spread by the operation, directly or through other fragments,
/// in discovery order.
fn spread_fragments<'a>(
    operation: &Operation,
    fragment_lookup: &'a HashMap<String, Fragment>,
) -> Result<Vec<&'a Fragment>, DocumentError> {
    let mut result = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&ast::SelectionSet> = vec![operation.ast.selection_set()];
    while let Some(current) = stack.pop() {
        for selection in &current.items {
            match selection {
                ast::Selection::Field(field) => {
                    if !field.selection_set.items.is_empty() {
                        stack.push(&field.selection_set);
                    }
                }
                ast::Selection::InlineFragment(inline) => {
                    stack.push(&inline.selection_set);
                }
                ast::Selection::FragmentSpread(spread) => {
                    if visited.insert(&spread.fragment_name) {
                        let fragment = fragment_lookup
                            .get(&spread.fragment_name)
                            .ok_or_else(|| DocumentError::MissingSpreadDefinition {
                                spread: spread.fragment_name.clone(),
                                operation: operation.ast.name().unwrap_or_default().to_string(),
                            })?;
                        result.push(fragment);
                        stack.push(&fragment.ast.selection_set);
                    }
                }
            }
        }
    }
    Ok(result)
}

/// Collapses all whitespace runs to single spaces.
pub fn minify(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase hex SHA-256, the conventional persisted-operation identifier.
pub fn hash_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::loader::tests::load_fixture;

    #[test]
    fn minify_collapses_whitespace() {
        assert_eq!(
            minify("query Hero {\n  hero {\n    name\n  }\n}"),
            "query Hero { hero { name } }"
        );
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        // Well-known digest of the empty string.
        assert_eq!(
            hash_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_hex("a").len(), 64);
    }

    #[test]
    fn expansion_appends_transitive_fragments_once() {
        let documents = load_fixture(&[(
            "hero.graphql",
            "query Hero { hero { ...jedi ...droid } }\n\
             fragment jedi on Jedi { ...character }\n\
             fragment droid on Droid { ...character }\n\
             fragment character on Character { id }",
        )]);
        let super::super::DocumentDefinition::Operation(operation) =
            &documents.documents[0].definitions[0]
        else {
            panic!("expected operation");
        };
        let text = expand_operation_text(operation, &documents.fragment_lookup).unwrap();
        assert_eq!(text.matches("fragment character").count(), 1);
        assert!(text.contains("fragment jedi"));
        assert!(text.contains("fragment droid"));
        assert!(text.starts_with("query Hero"));
    }

    #[test]
    fn unknown_spread_in_operation_is_reported() {
        let documents = load_fixture(&[("bad.graphql", "query Bad { hero { ...missing } }")]);
        let super::super::DocumentDefinition::Operation(operation) =
            &documents.documents[0].definitions[0]
        else {
            panic!("expected operation");
        };
        let err = expand_operation_text(operation, &documents.fragment_lookup).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::MissingSpreadDefinition { spread, operation }
                if spread == "missing" && operation == "Bad"
        ));
    }
}
