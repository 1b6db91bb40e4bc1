//! serde model of the introspection result (`__schema` shape) and its
//! normalization into the type catalog.
//!
//! https://spec.graphql.org/October2021/#sec-Schema-Introspection.Schema-Introspection-Schema

use serde::Deserialize;

use super::cache::{
    Deprecation, EnumType, EnumValueDef, FieldDef, InputObjectType, InputValueDef, ScalarType,
    TypeCache, TypeDecl, TypeRef, UnionType,
};
use super::error::SchemaLoadError;
use super::render::render_sdl;
use super::Schema;

/// A `{"data": {"__schema": ...}}` envelope, as returned by a live endpoint.
#[derive(Debug, Deserialize)]
pub struct IntrospectionResponse {
    pub data: IntrospectionData,
}

/// The `{"__schema": ...}` object, as stored in schema JSON files.
#[derive(Debug, Deserialize)]
pub struct IntrospectionData {
    #[serde(rename = "__schema")]
    pub schema: IntrospectionSchema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    #[serde(default)]
    pub description: Option<String>,
    pub query_type: NamedTypeRef,
    #[serde(default)]
    pub mutation_type: Option<NamedTypeRef>,
    #[serde(default)]
    pub subscription_type: Option<NamedTypeRef>,
    pub types: Vec<IntrospectionType>,
}

#[derive(Debug, Deserialize)]
pub struct NamedTypeRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionType {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<IntrospectionField>>,
    #[serde(default)]
    pub interfaces: Option<Vec<NamedTypeRef>>,
    #[serde(default)]
    pub possible_types: Option<Vec<NamedTypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<IntrospectionEnumValue>>,
    #[serde(default)]
    pub input_fields: Option<Vec<IntrospectionInputValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionField {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub ty: IntrospectionTypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionInputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: IntrospectionTypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionEnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionTypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<IntrospectionTypeRef>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// Normalizes an introspection result into the schema catalog.
pub fn schema_from_introspection(
    data: IntrospectionSchema,
    retain_sdl: bool,
) -> Result<Schema, SchemaLoadError> {
    let mut decls = Vec::with_capacity(data.types.len());
    for ty in &data.types {
        if let Some(decl) = type_decl(ty)? {
            decls.push(decl);
        }
    }
    let cache = TypeCache::build(decls);
    let query_type = data.query_type.name;
    let mutation_type = data.mutation_type.map(|t| t.name);
    let subscription_type = data.subscription_type.map(|t| t.name);
    let sdl = retain_sdl.then(|| {
        render_sdl(
            &cache,
            &query_type,
            mutation_type.as_deref(),
            subscription_type.as_deref(),
        )
    });
    Ok(Schema {
        sdl,
        query_type,
        mutation_type,
        subscription_type,
        cache,
    })
}

fn type_decl(ty: &IntrospectionType) -> Result<Option<TypeDecl>, SchemaLoadError> {
    let name = || {
        ty.name
            .clone()
            .ok_or_else(|| SchemaLoadError::MalformedIntrospection("unnamed type".to_string()))
    };
    let decl = match ty.kind {
        // Wrapper kinds never appear in the top-level type list.
        TypeKind::List | TypeKind::NonNull => return Ok(None),
        TypeKind::Scalar => TypeDecl::Scalar(ScalarType {
            name: name()?,
            description: ty.description.clone(),
        }),
        TypeKind::Object => TypeDecl::Object {
            name: name()?,
            description: ty.description.clone(),
            fields: field_defs(ty.fields.as_deref().unwrap_or_default())?,
            interfaces: named_refs(ty.interfaces.as_deref().unwrap_or_default()),
        },
        TypeKind::Interface => TypeDecl::Interface {
            name: name()?,
            description: ty.description.clone(),
            fields: field_defs(ty.fields.as_deref().unwrap_or_default())?,
            interfaces: named_refs(ty.interfaces.as_deref().unwrap_or_default()),
        },
        TypeKind::Union => TypeDecl::Union(UnionType {
            name: name()?,
            description: ty.description.clone(),
            // Union members are always object types:
            // https://spec.graphql.org/October2021/#sec-Unions.Type-Validation
            possible_types: ty
                .possible_types
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        }),
        TypeKind::Enum => TypeDecl::Enum(EnumType {
            name: name()?,
            description: ty.description.clone(),
            values: ty
                .enum_values
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|value| EnumValueDef {
                    name: value.name.clone(),
                    description: value.description.clone(),
                    deprecation: value.is_deprecated.then(|| Deprecation {
                        reason: value.deprecation_reason.clone(),
                    }),
                })
                .collect(),
        }),
        TypeKind::InputObject => TypeDecl::InputObject(InputObjectType {
            name: name()?,
            description: ty.description.clone(),
            input_fields: input_value_defs(ty.input_fields.as_deref().unwrap_or_default())?,
        }),
    };
    Ok(Some(decl))
}

fn named_refs(refs: &[NamedTypeRef]) -> Vec<String> {
    refs.iter().map(|r| r.name.clone()).collect()
}

fn field_defs(fields: &[IntrospectionField]) -> Result<Vec<FieldDef>, SchemaLoadError> {
    fields
        .iter()
        .map(|field| {
            Ok(FieldDef {
                name: field.name.clone(),
                description: field.description.clone(),
                args: input_value_defs(&field.args)?,
                ty: type_ref(&field.ty)?,
                deprecation: field.is_deprecated.then(|| Deprecation {
                    reason: field.deprecation_reason.clone(),
                }),
            })
        })
        .collect()
}

fn input_value_defs(values: &[IntrospectionInputValue]) -> Result<Vec<InputValueDef>, SchemaLoadError> {
    values
        .iter()
        .map(|value| {
            Ok(InputValueDef {
                name: value.name.clone(),
                description: value.description.clone(),
                ty: type_ref(&value.ty)?,
                default_value: value.default_value.clone(),
            })
        })
        .collect()
}

fn type_ref(raw: &IntrospectionTypeRef) -> Result<TypeRef, SchemaLoadError> {
    match raw.kind {
        TypeKind::List => {
            let inner = raw.of_type.as_deref().ok_or_else(|| {
                SchemaLoadError::MalformedIntrospection("LIST ref without ofType".to_string())
            })?;
            Ok(TypeRef::List(Box::new(type_ref(inner)?)))
        }
        TypeKind::NonNull => {
            let inner = raw.of_type.as_deref().ok_or_else(|| {
                SchemaLoadError::MalformedIntrospection("NON_NULL ref without ofType".to_string())
            })?;
            Ok(TypeRef::NonNull(Box::new(type_ref(inner)?)))
        }
        _ => raw
            .name
            .clone()
            .map(TypeRef::Named)
            .ok_or_else(|| SchemaLoadError::MalformedIntrospection("unnamed type ref".to_string())),
    }
}
