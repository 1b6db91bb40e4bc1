//! SDL ingestion: parses schema SDL and normalizes it into the same catalog
//! the introspection path produces.

use graphql_parser::schema::{
    self, Definition, EnumValue, Field, InputValue, Type, TypeDefinition, Value,
};

use super::cache::{
    Deprecation, EnumType, EnumValueDef, FieldDef, InputObjectType, InputValueDef, ScalarType,
    TypeCache, TypeDecl, TypeRef, UnionType,
};
use super::error::SchemaLoadError;
use super::Schema;

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub fn schema_from_sdl(sdl: &str, retain_sdl: bool) -> Result<Schema, SchemaLoadError> {
    let document = graphql_parser::parse_schema::<String>(sdl)
        .map_err(SchemaLoadError::Sdl)?
        .into_static();

    let mut decls = builtin_scalar_decls();
    let mut query_type = None;
    let mut mutation_type = None;
    let mut subscription_type = None;
    let mut type_names = Vec::new();

    for definition in &document.definitions {
        match definition {
            Definition::SchemaDefinition(schema_def) => {
                query_type = schema_def.query.clone();
                mutation_type = schema_def.mutation.clone();
                subscription_type = schema_def.subscription.clone();
            }
            Definition::TypeDefinition(type_def) => {
                type_names.push(type_definition_name(type_def).to_string());
                decls.push(type_decl(type_def));
            }
            Definition::TypeExtension(_) | Definition::DirectiveDefinition(_) => {}
        }
    }

    // Without an explicit schema definition the roots fall back to the
    // conventional type names, when those types exist.
    let default_root = |name: &str| type_names.iter().any(|n| n == name).then(|| name.to_string());
    let query_type = query_type
        .or_else(|| default_root("Query"))
        .ok_or(SchemaLoadError::MissingQueryType)?;
    let mutation_type = mutation_type.or_else(|| default_root("Mutation"));
    let subscription_type = subscription_type.or_else(|| default_root("Subscription"));

    Ok(Schema {
        sdl: retain_sdl.then(|| sdl.to_string()),
        query_type,
        mutation_type,
        subscription_type,
        cache: TypeCache::build(decls),
    })
}

fn builtin_scalar_decls() -> Vec<TypeDecl> {
    BUILTIN_SCALARS
        .iter()
        .map(|name| {
            TypeDecl::Scalar(ScalarType {
                name: name.to_string(),
                description: None,
            })
        })
        .collect()
}

fn type_definition_name<'a>(type_def: &'a TypeDefinition<'static, String>) -> &'a str {
    match type_def {
        TypeDefinition::Scalar(scalar) => &scalar.name,
        TypeDefinition::Object(object) => &object.name,
        TypeDefinition::Interface(interface) => &interface.name,
        TypeDefinition::Union(union) => &union.name,
        TypeDefinition::Enum(en) => &en.name,
        TypeDefinition::InputObject(input_object) => &input_object.name,
    }
}

fn type_decl(type_def: &TypeDefinition<'static, String>) -> TypeDecl {
    match type_def {
        TypeDefinition::Scalar(scalar) => TypeDecl::Scalar(ScalarType {
            name: scalar.name.clone(),
            description: scalar.description.clone(),
        }),
        TypeDefinition::Object(object) => TypeDecl::Object {
            name: object.name.clone(),
            description: object.description.clone(),
            fields: object.fields.iter().map(field_def).collect(),
            interfaces: object.implements_interfaces.clone(),
        },
        TypeDefinition::Interface(interface) => TypeDecl::Interface {
            name: interface.name.clone(),
            description: interface.description.clone(),
            fields: interface.fields.iter().map(field_def).collect(),
            interfaces: interface.implements_interfaces.clone(),
        },
        TypeDefinition::Union(union) => TypeDecl::Union(UnionType {
            name: union.name.clone(),
            description: union.description.clone(),
            possible_types: union.types.iter().cloned().collect(),
        }),
        TypeDefinition::Enum(en) => TypeDecl::Enum(EnumType {
            name: en.name.clone(),
            description: en.description.clone(),
            values: en.values.iter().map(enum_value_def).collect(),
        }),
        TypeDefinition::InputObject(input_object) => TypeDecl::InputObject(InputObjectType {
            name: input_object.name.clone(),
            description: input_object.description.clone(),
            input_fields: input_object.fields.iter().map(input_value_def).collect(),
        }),
    }
}

fn field_def(field: &Field<'static, String>) -> FieldDef {
    FieldDef {
        name: field.name.clone(),
        description: field.description.clone(),
        args: field.arguments.iter().map(input_value_def).collect(),
        ty: type_ref(&field.field_type),
        deprecation: deprecation(&field.directives),
    }
}

fn input_value_def(value: &InputValue<'static, String>) -> InputValueDef {
    InputValueDef {
        name: value.name.clone(),
        description: value.description.clone(),
        ty: type_ref(&value.value_type),
        default_value: value.default_value.as_ref().map(|v| v.to_string()),
    }
}

fn enum_value_def(value: &EnumValue<'static, String>) -> EnumValueDef {
    EnumValueDef {
        name: value.name.clone(),
        description: value.description.clone(),
        deprecation: deprecation(&value.directives),
    }
}

fn type_ref(ty: &Type<'static, String>) -> TypeRef {
    match ty {
        Type::NamedType(name) => TypeRef::Named(name.clone()),
        Type::ListType(inner) => TypeRef::List(Box::new(type_ref(inner))),
        Type::NonNullType(inner) => TypeRef::NonNull(Box::new(type_ref(inner))),
    }
}

fn deprecation(directives: &[schema::Directive<'static, String>]) -> Option<Deprecation> {
    directives
        .iter()
        .find(|d| d.name == "deprecated")
        .map(|d| Deprecation {
            reason: d.arguments.iter().find_map(|(name, value)| {
                if name == "reason" {
                    match value {
                        Value::String(reason) => Some(reason.clone()),
                        other => Some(other.to_string()),
                    }
                } else {
                    None
                }
            }),
        })
}
