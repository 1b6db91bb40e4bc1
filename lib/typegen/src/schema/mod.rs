//! Normalized schema model: typed lookup tables over introspection data, with
//! implements-relationships and union membership precomputed.

pub mod cache;
pub mod error;
pub mod introspect;
pub mod introspection;
pub mod loader;
pub mod render;
pub mod sdl;

pub use cache::{
    Deprecation, EnumType, EnumValueDef, FieldDef, InputObjectType, InputValueDef, InterfaceType,
    ObjectType, ScalarType, TypeCache, TypeRef, UnionType,
};
pub use error::{SchemaError, SchemaLoadError};
pub use loader::{SchemaLoader, SchemaSource};

use crate::ast::{self, OperationDefinitionExt};

/// The schema catalog. Built once per run, shared read-only by every
/// resolution task.
#[derive(Debug)]
pub struct Schema {
    /// SDL rendition retained for the validator pass, when enabled.
    pub sdl: Option<String>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub cache: TypeCache,
}

/// A type a selection set can be interpreted against.
#[derive(Debug, Clone, Copy)]
pub enum CompositeType<'a> {
    Object(&'a ObjectType),
    Interface(&'a InterfaceType),
    Union(&'a UnionType),
}

impl<'a> CompositeType<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            CompositeType::Object(object) => &object.name,
            CompositeType::Interface(interface) => &interface.name,
            CompositeType::Union(union) => &union.name,
        }
    }

    /// Looks up a selected field. Unions reject any direct field selection.
    pub fn field(&self, field: &ast::Field) -> Result<&'a FieldDef, SchemaError> {
        let fields = match self {
            CompositeType::Object(object) => &object.fields,
            CompositeType::Interface(interface) => &interface.fields,
            CompositeType::Union(union) => {
                return Err(SchemaError::UnionFieldSelection {
                    field: field.name.clone(),
                    union: union.name.clone(),
                })
            }
        };
        fields
            .get(&field.name)
            .ok_or_else(|| SchemaError::UnknownField {
                field: field.name.clone(),
                on_type: self.name().to_string(),
            })
    }
}

/// A field's schema type with wrappers preserved, every name resolved against
/// the catalog.
#[derive(Debug)]
pub enum FieldType<'a> {
    Scalar(&'a ScalarType),
    Object(&'a ObjectType),
    Interface(&'a InterfaceType),
    Union(&'a UnionType),
    Enum(&'a EnumType),
    List(Box<FieldType<'a>>),
    NonNull(Box<FieldType<'a>>),
}

/// A type usable in input position (variables, arguments, input fields).
#[derive(Debug)]
pub enum InputType<'a> {
    Scalar(&'a ScalarType),
    Enum(&'a EnumType),
    InputObject(&'a InputObjectType),
    List(Box<InputType<'a>>),
    NonNull(Box<InputType<'a>>),
}

impl Schema {
    pub fn query_type(&self) -> Result<&ObjectType, SchemaError> {
        self.cache
            .objects
            .get(&self.query_type)
            .ok_or_else(|| SchemaError::InvalidSchema(self.query_type.clone()))
    }

    pub fn mutation_type(&self) -> Result<Option<&ObjectType>, SchemaError> {
        self.root_object(self.mutation_type.as_deref())
    }

    pub fn subscription_type(&self) -> Result<Option<&ObjectType>, SchemaError> {
        self.root_object(self.subscription_type.as_deref())
    }

    fn root_object(&self, name: Option<&str>) -> Result<Option<&ObjectType>, SchemaError> {
        match name {
            None => Ok(None),
            Some(name) => self
                .cache
                .objects
                .get(name)
                .map(Some)
                .ok_or_else(|| SchemaError::InvalidSchema(name.to_string())),
        }
    }

    /// The root object an operation executes against.
    pub fn operation_type(
        &self,
        operation: &ast::OperationDefinition,
    ) -> Result<&ObjectType, SchemaError> {
        let unsupported = || SchemaError::UnsupportedOperation {
            kind: operation.kind().to_string(),
            operation: operation.name().unwrap_or_default().to_string(),
        };
        match operation.kind() {
            ast::OperationKind::Query => self.query_type(),
            ast::OperationKind::Mutation => self.mutation_type()?.ok_or_else(unsupported),
            ast::OperationKind::Subscription => self.subscription_type()?.ok_or_else(unsupported),
        }
    }

    /// Resolves a field-position type ref into the [`FieldType`] tree.
    pub fn field_type<'a>(&'a self, ty: &TypeRef) -> Result<FieldType<'a>, SchemaError> {
        match ty {
            TypeRef::List(inner) => Ok(FieldType::List(Box::new(self.field_type(inner)?))),
            TypeRef::NonNull(inner) => Ok(FieldType::NonNull(Box::new(self.field_type(inner)?))),
            TypeRef::Named(name) => {
                if let Some(scalar) = self.cache.scalars.get(name) {
                    Ok(FieldType::Scalar(scalar))
                } else if let Some(object) = self.cache.objects.get(name) {
                    Ok(FieldType::Object(object))
                } else if let Some(interface) = self.cache.interfaces.get(name) {
                    Ok(FieldType::Interface(interface))
                } else if let Some(union) = self.cache.unions.get(name) {
                    Ok(FieldType::Union(union))
                } else if let Some(en) = self.cache.enums.get(name) {
                    Ok(FieldType::Enum(en))
                } else if self.cache.input_objects.contains_key(name) {
                    Err(SchemaError::InputObjectInFieldPosition(name.clone()))
                } else {
                    Err(SchemaError::InvalidSchema(name.clone()))
                }
            }
        }
    }

    /// Resolves a fragment type condition to the composite type it names.
    pub fn fragment_type<'a>(&'a self, name: &str) -> Result<CompositeType<'a>, SchemaError> {
        if let Some(object) = self.cache.objects.get(name) {
            Ok(CompositeType::Object(object))
        } else if let Some(interface) = self.cache.interfaces.get(name) {
            Ok(CompositeType::Interface(interface))
        } else if let Some(union) = self.cache.unions.get(name) {
            Ok(CompositeType::Union(union))
        } else {
            Err(SchemaError::InvalidFragmentTypeCondition(name.to_string()))
        }
    }

    /// Static subtyping check: is every value of `base_type` guaranteed to
    /// satisfy a fragment conditioned on `spread_type`? Governs whether a
    /// spread can be resolved without a runtime `__typename` check.
    pub fn is_fragment_always_fulfilled(
        &self,
        spread_type: CompositeType<'_>,
        base_type: CompositeType<'_>,
    ) -> bool {
        if base_type.name() == spread_type.name() {
            return true;
        }
        match base_type {
            CompositeType::Object(object) => match spread_type {
                CompositeType::Object(_) => false,
                CompositeType::Interface(interface) => object.implements.contains(&interface.name),
                CompositeType::Union(union) => union.possible_types.contains(&object.name),
            },
            CompositeType::Interface(interface) => match spread_type {
                CompositeType::Object(_) => false,
                CompositeType::Interface(spread) => interface.implements.contains(&spread.name),
                CompositeType::Union(_) => false,
            },
            CompositeType::Union(_) => false,
        }
    }

    /// Resolves a schema-side type ref in input position.
    pub fn input_type<'a>(&'a self, ty: &TypeRef) -> Result<InputType<'a>, SchemaError> {
        match ty {
            TypeRef::List(inner) => Ok(InputType::List(Box::new(self.input_type(inner)?))),
            TypeRef::NonNull(inner) => Ok(InputType::NonNull(Box::new(self.input_type(inner)?))),
            TypeRef::Named(name) => match self.named_input_type(name) {
                Some(found) => Ok(found),
                None => {
                    if self.cache.objects.contains_key(name)
                        || self.cache.interfaces.contains_key(name)
                        || self.cache.unions.contains_key(name)
                    {
                        Err(SchemaError::InvalidInputType(name.clone()))
                    } else {
                        Err(SchemaError::InvalidSchema(name.clone()))
                    }
                }
            },
        }
    }

    /// Resolves a document-side type node (a variable definition's type) in
    /// input position.
    pub fn input_type_from_ast<'a>(&'a self, ty: &ast::Type) -> Result<InputType<'a>, SchemaError> {
        match ty {
            ast::Type::ListType(inner) => {
                Ok(InputType::List(Box::new(self.input_type_from_ast(inner)?)))
            }
            ast::Type::NonNullType(inner) => Ok(InputType::NonNull(Box::new(
                self.input_type_from_ast(inner)?,
            ))),
            ast::Type::NamedType(name) => self
                .named_input_type(name)
                .ok_or_else(|| SchemaError::UnknownInputType(name.clone())),
        }
    }

    fn named_input_type<'a>(&'a self, name: &str) -> Option<InputType<'a>> {
        if let Some(scalar) = self.cache.scalars.get(name) {
            Some(InputType::Scalar(scalar))
        } else if let Some(en) = self.cache.enums.get(name) {
            Some(InputType::Enum(en))
        } else {
            self.cache
                .input_objects
                .get(name)
                .map(InputType::InputObject)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sdl::schema_from_sdl;

    fn schema() -> Schema {
        schema_from_sdl(
            r#"
            type Query {
              hero(episode: Episode!): Character
              search: SearchResult
            }
            interface Character {
              id: ID!
              name: String!
            }
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
            type Planet {
              name: String
            }
            union SearchResult = Jedi | Droid
            enum Episode { NEWHOPE EMPIRE JEDI }
            input ReviewInput { stars: Int!, commentary: String }
            "#,
            false,
        )
        .unwrap()
    }

    #[test]
    fn subtyping_interface_spread_on_implementing_object() {
        let schema = schema();
        let character = schema.fragment_type("Character").unwrap();
        let jedi = schema.fragment_type("Jedi").unwrap();
        assert!(schema.is_fragment_always_fulfilled(character, jedi));
        assert!(!schema.is_fragment_always_fulfilled(jedi, character));
    }

    #[test]
    fn subtyping_unrelated_objects_never_fulfilled() {
        let schema = schema();
        let jedi = schema.fragment_type("Jedi").unwrap();
        let droid = schema.fragment_type("Droid").unwrap();
        assert!(!schema.is_fragment_always_fulfilled(jedi, droid));
        assert!(!schema.is_fragment_always_fulfilled(droid, jedi));
    }

    #[test]
    fn subtyping_union_member() {
        let schema = schema();
        let search = schema.fragment_type("SearchResult").unwrap();
        let jedi = schema.fragment_type("Jedi").unwrap();
        let planet = schema.fragment_type("Planet").unwrap();
        assert!(schema.is_fragment_always_fulfilled(search, jedi));
        assert!(!schema.is_fragment_always_fulfilled(search, planet));
        // Union base never statically satisfies a narrower spread.
        assert!(!schema.is_fragment_always_fulfilled(jedi, search));
    }

    #[test]
    fn same_name_is_always_fulfilled() {
        let schema = schema();
        let character = schema.fragment_type("Character").unwrap();
        assert!(schema.is_fragment_always_fulfilled(character, character));
    }

    #[test]
    fn fragment_type_rejects_non_composite() {
        let schema = schema();
        assert!(matches!(
            schema.fragment_type("Episode"),
            Err(SchemaError::InvalidFragmentTypeCondition(name)) if name == "Episode"
        ));
        assert!(matches!(
            schema.fragment_type("ReviewInput"),
            Err(SchemaError::InvalidFragmentTypeCondition(_))
        ));
    }

    #[test]
    fn input_object_rejected_in_field_position() {
        let schema = schema();
        let err = schema
            .field_type(&TypeRef::named("ReviewInput"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InputObjectInFieldPosition(_)));
    }

    #[test]
    fn object_rejected_in_input_position() {
        let schema = schema();
        let err = schema.input_type(&TypeRef::named("Jedi")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidInputType(_)));
    }

    #[test]
    fn union_field_selection_is_an_error() {
        let schema = schema();
        let search = schema.fragment_type("SearchResult").unwrap();
        let field = ast::Field {
            position: Default::default(),
            alias: None,
            name: "name".to_string(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: ast::SelectionSet {
                span: Default::default(),
                items: Vec::new(),
            },
        };
        assert!(matches!(
            search.field(&field),
            Err(SchemaError::UnionFieldSelection { .. })
        ));
    }

    #[test]
    fn missing_mutation_root_is_reported() {
        let schema = schema();
        let doc = graphql_parser::parse_query::<String>("mutation AddHero { __typename }")
            .unwrap()
            .into_static();
        let ast::Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        assert!(matches!(
            schema.operation_type(op),
            Err(SchemaError::UnsupportedOperation { .. })
        ));
    }
}
