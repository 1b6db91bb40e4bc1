//! Field collection: walks an AST selection set against a schema type,
//! expanding fragment spreads and inline fragments and merging selections that
//! share a response key.

use indexmap::IndexMap;
use tracing::{instrument, trace};

use crate::ast::{self, DirectiveListExt, FieldExt};
use crate::documents::Documents;
use crate::schema::{CompositeType, Schema};

use super::error::ResolutionError;
use super::field::{FieldResolver, ResolvedField};

/// Ordered response-key map; ordering equals first-occurrence document order
/// across the whole recursive walk, which is the order a spec-compliant
/// response would serialize the keys in.
pub type ResolvedSelectionSet = IndexMap<String, ResolvedSelection>;

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSelection {
    Field {
        field: ResolvedField,
        /// The field's presence is not guaranteed at the vantage type, either
        /// because it was collected from a narrower type condition or because
        /// a @skip/@include directive gates it.
        conditional: bool,
    },
    FragmentSpread {
        name: String,
        /// When set, the fragment is decoded only if the runtime `__typename`
        /// equals this object type name. `None` means the fragment is always
        /// fulfilled at the vantage type.
        check_typename: Option<String>,
    },
}

/// Response key a fragment spread entry lands under.
pub fn spread_response_key(fragment_name: &str) -> String {
    format!("__{fragment_name}")
}

pub struct SelectionSetResolver<'a> {
    /// The vantage type the resolved set is decoded at. Type conditions may
    /// narrow the collection type below this, but fulfillment and
    /// conditionality are always judged against the root.
    root_type: CompositeType<'a>,
    selection_set: &'a ast::SelectionSet,
    schema: &'a Schema,
    documents: &'a Documents,
}

impl<'a> SelectionSetResolver<'a> {
    pub fn new(
        root_type: CompositeType<'a>,
        selection_set: &'a ast::SelectionSet,
        schema: &'a Schema,
        documents: &'a Documents,
    ) -> Self {
        Self {
            root_type,
            selection_set,
            schema,
            documents,
        }
    }

    #[instrument(level = "trace", skip(self), fields(on_type = self.root_type.name()))]
    pub fn resolve(&self) -> Result<ResolvedSelectionSet, ResolutionError> {
        let resolved = self.collect(self.selection_set, self.root_type, false)?;
        ensure_typename_discriminator(&resolved)?;
        Ok(resolved)
    }

    fn collect(
        &self,
        selection_set: &'a ast::SelectionSet,
        on_type: CompositeType<'a>,
        in_conditional_directive: bool,
    ) -> Result<ResolvedSelectionSet, ResolutionError> {
        let mut resolved = ResolvedSelectionSet::new();
        for selection in &selection_set.items {
            match selection {
                ast::Selection::Field(field) => {
                    self.collect_field(&mut resolved, field, on_type, in_conditional_directive)?;
                }
                ast::Selection::FragmentSpread(spread) => {
                    self.collect_spread(&mut resolved, spread, in_conditional_directive)?;
                }
                ast::Selection::InlineFragment(inline) => {
                    let narrowed = match &inline.type_condition {
                        Some(condition) => self
                            .schema
                            .fragment_type(ast::type_condition_name(condition))?,
                        None => on_type,
                    };
                    let conditional =
                        in_conditional_directive || inline.directives.has_skip_or_include();
                    let inner = self.collect(&inline.selection_set, narrowed, conditional)?;
                    merge_sets(&mut resolved, inner)?;
                }
            }
        }
        Ok(resolved)
    }

    fn collect_field(
        &self,
        resolved: &mut ResolvedSelectionSet,
        field: &'a ast::Field,
        on_type: CompositeType<'a>,
        in_conditional_directive: bool,
    ) -> Result<(), ResolutionError> {
        let conditional = self.root_type.name() != on_type.name()
            || in_conditional_directive
            || field.directives.has_skip_or_include();
        // Only the type of __typename is special-cased (it is never a schema
        // field); its conditionality follows the normal rules so a __typename
        // collected under a narrower type condition cannot discriminate.
        let resolved_field = if field.name == "__typename" {
            ResolvedField::typename()
        } else {
            FieldResolver::new(self.schema, self.documents).resolve(field, on_type.field(field)?)?
        };
        merge_into(
            resolved,
            field.response_key(),
            ResolvedSelection::Field {
                field: resolved_field,
                conditional,
            },
        )
    }

    fn collect_spread(
        &self,
        resolved: &mut ResolvedSelectionSet,
        spread: &ast::FragmentSpread,
        in_conditional_directive: bool,
    ) -> Result<(), ResolutionError> {
        // "__typename" is already taken as a response key.
        if spread.fragment_name == "typename" {
            return Err(ResolutionError::ReservedFragmentName);
        }
        if in_conditional_directive || spread.directives.has_skip_or_include() {
            return Err(ResolutionError::ConditionalFragmentSpread {
                fragment: spread.fragment_name.clone(),
            });
        }
        let fragment = self.documents.fragment(&spread.fragment_name)?;
        let fragment_type = self
            .schema
            .fragment_type(ast::type_condition_name(&fragment.ast.type_condition))?;
        if self
            .schema
            .is_fragment_always_fulfilled(fragment_type, self.root_type)
        {
            trace!(fragment = %spread.fragment_name, "spread always fulfilled");
            merge_into(
                resolved,
                &spread_response_key(&spread.fragment_name),
                ResolvedSelection::FragmentSpread {
                    name: spread.fragment_name.clone(),
                    check_typename: None,
                },
            )
        } else if let CompositeType::Object(object) = fragment_type {
            trace!(fragment = %spread.fragment_name, object = %object.name, "spread gated on __typename");
            merge_into(
                resolved,
                &spread_response_key(&spread.fragment_name),
                ResolvedSelection::FragmentSpread {
                    name: spread.fragment_name.clone(),
                    check_typename: Some(object.name.clone()),
                },
            )
        } else {
            // Fulfillment of an interface- or union-conditioned fragment
            // cannot be decided from the static vantage type alone
            // (graphql/graphql-spec#879), so its fields are inlined instead.
            trace!(fragment = %spread.fragment_name, "inlining spread");
            let inner = self.collect(&fragment.ast.selection_set, fragment_type, false)?;
            merge_sets(resolved, inner)
        }
    }
}

/// A set that gates any fragment on a `__typename` check must also select
/// `__typename` unconditionally.
fn ensure_typename_discriminator(set: &ResolvedSelectionSet) -> Result<(), ResolutionError> {
    let gated = set.values().find_map(|selection| match selection {
        ResolvedSelection::FragmentSpread {
            name,
            check_typename: Some(_),
        } => Some(name),
        _ => None,
    });
    let Some(fragment) = gated else {
        return Ok(());
    };
    let has_discriminator = set.get("__typename").is_some_and(|selection| {
        matches!(
            selection,
            ResolvedSelection::Field {
                conditional: false,
                ..
            }
        )
    });
    if has_discriminator {
        Ok(())
    } else {
        Err(ResolutionError::FragmentSpreadNeedsTypename {
            fragment_spread: fragment.clone(),
        })
    }
}

pub(crate) fn merge_into(
    set: &mut ResolvedSelectionSet,
    response_key: &str,
    selection: ResolvedSelection,
) -> Result<(), ResolutionError> {
    match set.get(response_key) {
        None => {
            set.insert(response_key.to_string(), selection);
        }
        Some(existing) => {
            let merged = merge_selections(existing, &selection, response_key)?;
            // Re-inserting an existing key keeps its position.
            set.insert(response_key.to_string(), merged);
        }
    }
    Ok(())
}

pub(crate) fn merge_sets(
    target: &mut ResolvedSelectionSet,
    source: ResolvedSelectionSet,
) -> Result<(), ResolutionError> {
    for (response_key, selection) in source {
        merge_into(target, &response_key, selection)?;
    }
    Ok(())
}

fn merge_selections(
    a: &ResolvedSelection,
    b: &ResolvedSelection,
    response_key: &str,
) -> Result<ResolvedSelection, ResolutionError> {
    match (a, b) {
        (
            ResolvedSelection::Field {
                field,
                conditional,
            },
            ResolvedSelection::Field {
                field: other_field,
                conditional: other_conditional,
            },
        ) => Ok(ResolvedSelection::Field {
            field: field.merging(other_field, response_key)?,
            // Guaranteed present if either occurrence guarantees it.
            conditional: *conditional && *other_conditional,
        }),
        (
            ResolvedSelection::FragmentSpread {
                name,
                check_typename,
            },
            ResolvedSelection::FragmentSpread {
                name: other_name,
                check_typename: other_check,
            },
        ) if name == other_name && check_typename == other_check => Ok(a.clone()),
        _ => Err(ResolutionError::IncompatibleSelectionMerge {
            response_key: response_key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::OperationDefinitionExt;
    use crate::documents::loader::tests::load_fixture;
    use crate::documents::DocumentDefinition;
    use crate::resolution::field::ResolvedFieldType;
    use crate::schema::sdl::schema_from_sdl;
    use pretty_assertions::assert_eq;

    const SDL: &str = r#"
        type Query {
          hero(episode: Episode!): Character
          search: SearchResult
        }
        interface Character { id: ID! name: String! }
        type Jedi implements Character {
          id: ID!
          name: String!
          lightSaberColor: String
        }
        type Droid implements Character {
          id: ID!
          name: String!
          primaryFunction: String
        }
        union SearchResult = Jedi | Droid
        enum Episode { NEWHOPE EMPIRE JEDI }
    "#;

    fn resolve(document: &str) -> Result<ResolvedSelectionSet, ResolutionError> {
        let schema = schema_from_sdl(SDL, false).unwrap();
        let documents = load_fixture(&[("test.graphql", document)]);
        let DocumentDefinition::Operation(operation) = &documents.documents[0].definitions[0]
        else {
            panic!("expected operation first in the document");
        };
        let root = schema.query_type().unwrap();
        SelectionSetResolver::new(
            CompositeType::Object(root),
            operation.ast.selection_set(),
            &schema,
            &documents,
        )
        .resolve()
    }

    fn hero_set(set: &ResolvedSelectionSet) -> &ResolvedSelectionSet {
        let ResolvedSelection::Field { field, .. } = &set["hero"] else {
            panic!("expected hero field");
        };
        field.ty.unwrapped_map().unwrap()
    }

    #[test]
    fn object_conditioned_spreads_are_gated_on_typename() {
        let set = resolve(
            "query Hero($episode: Episode!) {\n\
               hero(episode: $episode) { __typename ...jedi ...droid }\n\
             }\n\
             fragment jedi on Jedi { ...character lightSaberColor }\n\
             fragment droid on Droid { ...character primaryFunction }\n\
             fragment character on Character { id name }",
        )
        .unwrap();
        let hero = hero_set(&set);
        let keys: Vec<_> = hero.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["__typename", "__jedi", "__droid"]);
        assert_eq!(
            hero["__jedi"],
            ResolvedSelection::FragmentSpread {
                name: "jedi".to_string(),
                check_typename: Some("Jedi".to_string()),
            }
        );
        assert_eq!(
            hero["__droid"],
            ResolvedSelection::FragmentSpread {
                name: "droid".to_string(),
                check_typename: Some("Droid".to_string()),
            }
        );
        assert!(matches!(
            hero["__typename"],
            ResolvedSelection::Field {
                conditional: false,
                ..
            }
        ));
    }

    #[test]
    fn spread_matching_the_vantage_type_is_always_fulfilled() {
        let set = resolve(
            "{ hero(episode: NEWHOPE) { ...character } }\n\
             fragment character on Character { id name }",
        )
        .unwrap();
        let hero = hero_set(&set);
        assert_eq!(
            hero["__character"],
            ResolvedSelection::FragmentSpread {
                name: "character".to_string(),
                check_typename: None,
            }
        );
    }

    #[test]
    fn gated_spread_without_typename_is_rejected_with_the_field_path() {
        let err = resolve(
            "{ hero(episode: NEWHOPE) { ...jedi } }\n\
             fragment jedi on Jedi { lightSaberColor }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::SelectionSetNeedsTypename { field, fragment_spread }
                if field == "hero" && fragment_spread == "jedi"
        ));
    }

    #[test]
    fn typename_from_a_narrower_condition_does_not_discriminate() {
        let err = resolve(
            "{ hero(episode: NEWHOPE) { ... on Jedi { __typename } ...droid } }\n\
             fragment droid on Droid { primaryFunction }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::SelectionSetNeedsTypename { fragment_spread, .. }
                if fragment_spread == "droid"
        ));
    }

    #[test]
    fn union_spread_on_object_vantage_is_inlined() {
        // `searchable` is conditioned on a union; from the Character vantage
        // it is neither fulfilled nor object-gated, so it inlines.
        let set = resolve(
            "{ hero(episode: NEWHOPE) { ...searchable } }\n\
             fragment searchable on SearchResult { __typename }",
        )
        .unwrap();
        let hero = hero_set(&set);
        assert!(hero.contains_key("__typename"));
        assert!(!hero.contains_key("__searchable"));
    }

    #[test]
    fn inlined_interface_fields_from_narrower_condition_are_conditional() {
        let set = resolve(
            "{ hero(episode: NEWHOPE) { __typename ... on Jedi { lightSaberColor } } }",
        )
        .unwrap();
        let hero = hero_set(&set);
        assert!(matches!(
            hero["lightSaberColor"],
            ResolvedSelection::Field {
                conditional: true,
                ..
            }
        ));
    }

    #[test]
    fn skip_and_include_mark_fields_conditional() {
        let set = resolve(
            "query Q($f: Boolean!) { hero(episode: NEWHOPE) { name @skip(if: $f) } }",
        )
        .unwrap();
        let hero = hero_set(&set);
        assert!(matches!(
            hero["name"],
            ResolvedSelection::Field {
                conditional: true,
                ..
            }
        ));
    }

    #[test]
    fn skip_on_a_fragment_spread_is_rejected() {
        let err = resolve(
            "query Q($f: Boolean!) { hero(episode: NEWHOPE) { ...character @skip(if: $f) } }\n\
             fragment character on Character { id }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::ConditionalFragmentSpread { fragment } if fragment == "character"
        ));
    }

    #[test]
    fn spread_under_a_conditional_inline_fragment_is_rejected() {
        let err = resolve(
            "query Q($f: Boolean!) {\n\
               hero(episode: NEWHOPE) { ... @include(if: $f) { ...character } }\n\
             }\n\
             fragment character on Character { id }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::ConditionalFragmentSpread { .. }
        ));
    }

    #[test]
    fn typename_is_a_reserved_fragment_name() {
        let err = resolve(
            "{ hero(episode: NEWHOPE) { ...typename } }\n\
             fragment typename on Character { id }",
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::ReservedFragmentName));
    }

    #[test]
    fn union_fields_cannot_be_selected_directly() {
        let err = resolve("{ search { name } }").unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::Schema(crate::schema::SchemaError::UnionFieldSelection { .. })
        ));
    }

    #[test]
    fn aliases_to_the_same_key_with_different_types_are_rejected() {
        // name: String! vs name: id (ID!) under the same response key.
        let err = resolve("{ hero(episode: NEWHOPE) { name name: id } }").unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::IncompatibleFieldMerge { response_key } if response_key == "name"
        ));
    }

    #[test]
    fn aliases_to_the_same_key_with_different_nullability_are_rejected() {
        // name: String! vs lightSaberColor: String under the same key.
        let err = resolve(
            "{ hero(episode: NEWHOPE) { name ... on Jedi { name: lightSaberColor } } }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::IncompatibleFieldMerge { response_key } if response_key == "name"
        ));
    }

    #[test]
    fn identical_selections_merge_to_one_entry() {
        let set = resolve("{ hero(episode: NEWHOPE) { id name id name } }").unwrap();
        let hero = hero_set(&set);
        assert_eq!(hero.len(), 2);
        let ResolvedSelection::Field { field, .. } = &hero["id"] else {
            panic!("expected field");
        };
        assert_eq!(
            field.ty,
            ResolvedFieldType::Scalar {
                type_name: "ID".to_string(),
                is_enum: false,
            }
        );
    }

    #[test]
    fn merged_conditional_clears_when_any_occurrence_is_unconditional() {
        let set = resolve(
            "{ hero(episode: NEWHOPE) { name ... on Jedi { name } } }",
        )
        .unwrap();
        let hero = hero_set(&set);
        assert!(matches!(
            hero["name"],
            ResolvedSelection::Field {
                conditional: false,
                ..
            }
        ));
    }

    #[test]
    fn ordering_follows_first_occurrence_across_fragment_boundaries() {
        let set = resolve(
            "{ hero(episode: NEWHOPE) { name ...character } }\n\
             fragment character on Character { id name }",
        )
        .unwrap();
        let hero = hero_set(&set);
        let keys: Vec<_> = hero.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "__character"]);
    }
}
