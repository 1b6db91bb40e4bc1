//! Resolves one selected field against its schema definition, recursing into
//! sub-selections for composite types.

use crate::ast::{self, FieldExt};
use crate::documents::Documents;
use crate::schema::{CompositeType, Deprecation, FieldDef, FieldType, Schema};

use super::error::ResolutionError;
use super::selection_set::{merge_sets, ResolvedSelectionSet, SelectionSetResolver};

/// A field's resolved type with GraphQL's nullability semantics applied:
/// everything is `Optional` unless the schema wrapped it in NON_NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFieldType {
    Scalar { type_name: String, is_enum: bool },
    /// Object/interface/union field with its resolved sub-selection.
    Map(ResolvedSelectionSet),
    List(Box<ResolvedFieldType>),
    Optional(Box<ResolvedFieldType>),
}

impl ResolvedFieldType {
    /// Strips exactly one `Optional` layer. An already-non-null type, e.g.
    /// one nested inside another NON_NULL, is left unchanged.
    pub fn non_null(self) -> Self {
        match self {
            ResolvedFieldType::Optional(inner) => *inner,
            other => other,
        }
    }

    /// The selection set behind any list/optional wrappers, if the leaf is a
    /// composite type.
    pub fn unwrapped_map(&self) -> Option<&ResolvedSelectionSet> {
        match self {
            ResolvedFieldType::Scalar { .. } => None,
            ResolvedFieldType::Map(set) => Some(set),
            ResolvedFieldType::List(inner) | ResolvedFieldType::Optional(inner) => {
                inner.unwrapped_map()
            }
        }
    }

    fn merging(&self, other: &Self, response_key: &str) -> Result<Self, ResolutionError> {
        match (self, other) {
            (
                ResolvedFieldType::Scalar { type_name, is_enum },
                ResolvedFieldType::Scalar {
                    type_name: other_name,
                    is_enum: other_enum,
                },
            ) if type_name == other_name && is_enum == other_enum => Ok(self.clone()),
            (ResolvedFieldType::Map(set), ResolvedFieldType::Map(other_set)) => {
                let mut merged = set.clone();
                merge_sets(&mut merged, other_set.clone())?;
                Ok(ResolvedFieldType::Map(merged))
            }
            (ResolvedFieldType::List(inner), ResolvedFieldType::List(other_inner)) => Ok(
                ResolvedFieldType::List(Box::new(inner.merging(other_inner, response_key)?)),
            ),
            (ResolvedFieldType::Optional(inner), ResolvedFieldType::Optional(other_inner)) => Ok(
                ResolvedFieldType::Optional(Box::new(inner.merging(other_inner, response_key)?)),
            ),
            _ => Err(ResolutionError::IncompatibleFieldMerge {
                response_key: response_key.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub ty: ResolvedFieldType,
    pub deprecation: Option<Deprecation>,
    pub description: Option<String>,
}

impl ResolvedField {
    /// Merges two occurrences of the same response key. Type shapes must
    /// match and both sides must agree on deprecation.
    pub fn merging(&self, other: &Self, response_key: &str) -> Result<Self, ResolutionError> {
        if self.deprecation != other.deprecation {
            return Err(ResolutionError::IncompatibleFieldMerge {
                response_key: response_key.to_string(),
            });
        }
        Ok(ResolvedField {
            ty: self.ty.merging(&other.ty, response_key)?,
            deprecation: self.deprecation.clone(),
            description: merge_descriptions(&self.description, &other.description),
        })
    }

    /// The `__typename` meta field: always a non-null `String`, never looked
    /// up on the schema.
    pub fn typename() -> Self {
        ResolvedField {
            ty: ResolvedFieldType::Scalar {
                type_name: "String".to_string(),
                is_enum: false,
            },
            deprecation: None,
            description: None,
        }
    }
}

fn merge_descriptions(a: &Option<String>, b: &Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) if a != b => Some(format!("{a}\n{b}")),
        (Some(a), _) => Some(a.clone()),
        (None, b) => b.clone(),
    }
}

pub struct FieldResolver<'a> {
    schema: &'a Schema,
    documents: &'a Documents,
}

impl<'a> FieldResolver<'a> {
    pub fn new(schema: &'a Schema, documents: &'a Documents) -> Self {
        Self { schema, documents }
    }

    pub fn resolve(
        &self,
        field: &ast::Field,
        field_def: &FieldDef,
    ) -> Result<ResolvedField, ResolutionError> {
        let schema_type = self.schema.field_type(&field_def.ty)?;
        Ok(ResolvedField {
            ty: self.resolve_type(field, &schema_type)?,
            deprecation: field_def.deprecation.clone(),
            description: field_def.description.clone(),
        })
    }

    fn resolve_type(
        &self,
        field: &ast::Field,
        schema_type: &FieldType<'a>,
    ) -> Result<ResolvedFieldType, ResolutionError> {
        let optional = |inner| ResolvedFieldType::Optional(Box::new(inner));
        match schema_type {
            FieldType::Scalar(scalar) => Ok(optional(ResolvedFieldType::Scalar {
                type_name: scalar.name.clone(),
                is_enum: false,
            })),
            FieldType::Enum(en) => Ok(optional(ResolvedFieldType::Scalar {
                type_name: en.name.clone(),
                is_enum: true,
            })),
            FieldType::Object(object) => Ok(optional(ResolvedFieldType::Map(
                self.resolve_sub_selection(field, CompositeType::Object(*object))?,
            ))),
            FieldType::Interface(interface) => Ok(optional(ResolvedFieldType::Map(
                self.resolve_sub_selection(field, CompositeType::Interface(*interface))?,
            ))),
            FieldType::Union(union) => Ok(optional(ResolvedFieldType::Map(
                self.resolve_sub_selection(field, CompositeType::Union(*union))?,
            ))),
            FieldType::List(inner) => Ok(optional(ResolvedFieldType::List(Box::new(
                self.resolve_type(field, inner)?,
            )))),
            FieldType::NonNull(inner) => Ok(self.resolve_type(field, inner)?.non_null()),
        }
    }

    fn resolve_sub_selection(
        &self,
        field: &ast::Field,
        vantage: CompositeType<'a>,
    ) -> Result<ResolvedSelectionSet, ResolutionError> {
        if field.selection_set.items.is_empty() {
            return Err(ResolutionError::MissingSelectionSet {
                response_key: field.response_key().to_string(),
            });
        }
        SelectionSetResolver::new(vantage, &field.selection_set, self.schema, self.documents)
            .resolve()
            .map_err(|err| match err {
                // A missing discriminator below a field is reported with the
                // offending field path.
                ResolutionError::FragmentSpreadNeedsTypename { fragment_spread } => {
                    ResolutionError::SelectionSetNeedsTypename {
                        field: field.response_key().to_string(),
                        fragment_spread,
                    }
                }
                other => other,
            })
    }
}
