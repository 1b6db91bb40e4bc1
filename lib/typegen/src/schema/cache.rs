use std::collections::{HashMap, HashSet};

/// Reference to a named type, with list/non-null wrappers preserved.
///
/// Unlike the raw introspection shape this carries no type kind; the kind is
/// recovered by looking the name up in the [`TypeCache`], which also catches
/// refs that point at nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub args: Vec<InputValueDef>,
    pub ty: TypeRef,
    pub deprecation: Option<Deprecation>,
}

#[derive(Debug, Clone)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// GraphQL literal text, exactly as the schema spelled it.
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: HashMap<String, FieldDef>,
    /// Transitive closure of implemented interfaces.
    pub implements: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: HashMap<String, FieldDef>,
    /// Transitive closure of implemented interfaces.
    pub implements: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<Deprecation>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub input_fields: Vec<InputValueDef>,
}

/// A type as declared by the schema source, before the cache resolves the
/// implements closure. `interfaces` lists only the directly declared ones.
#[derive(Debug, Clone)]
pub enum TypeDecl {
    Scalar(ScalarType),
    Object {
        name: String,
        description: Option<String>,
        fields: Vec<FieldDef>,
        interfaces: Vec<String>,
    },
    Interface {
        name: String,
        description: Option<String>,
        fields: Vec<FieldDef>,
        interfaces: Vec<String>,
    },
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

/// Per-kind lookup tables for every named type in the schema. Built once per
/// run, read-only afterwards.
///
/// Type names are guaranteed to be unique across the schema:
/// https://spec.graphql.org/October2021/#sel-FAHTLABDBEmrR
#[derive(Debug, Default)]
pub struct TypeCache {
    pub scalars: HashMap<String, ScalarType>,
    pub objects: HashMap<String, ObjectType>,
    pub interfaces: HashMap<String, InterfaceType>,
    pub unions: HashMap<String, UnionType>,
    pub enums: HashMap<String, EnumType>,
    pub input_objects: HashMap<String, InputObjectType>,
}

impl TypeCache {
    pub fn build(decls: Vec<TypeDecl>) -> Self {
        // An interface may itself implement interfaces, so the closure is a
        // worklist over the declared lists.
        let declared_interfaces: HashMap<String, Vec<String>> = decls
            .iter()
            .filter_map(|decl| match decl {
                TypeDecl::Interface {
                    name, interfaces, ..
                } => Some((name.clone(), interfaces.clone())),
                _ => None,
            })
            .collect();

        let close_over = |declared: &[String]| -> HashSet<String> {
            let mut implements = HashSet::new();
            let mut pending: Vec<String> = declared.to_vec();
            while let Some(interface) = pending.pop() {
                if implements.insert(interface.clone()) {
                    if let Some(parents) = declared_interfaces.get(&interface) {
                        pending.extend(parents.iter().cloned());
                    }
                }
            }
            implements
        };

        let mut cache = TypeCache::default();
        for decl in decls {
            match decl {
                TypeDecl::Scalar(scalar) => {
                    cache.scalars.insert(scalar.name.clone(), scalar);
                }
                TypeDecl::Object {
                    name,
                    description,
                    fields,
                    interfaces,
                } => {
                    cache.objects.insert(
                        name.clone(),
                        ObjectType {
                            implements: close_over(&interfaces),
                            fields: fields
                                .into_iter()
                                .map(|field| (field.name.clone(), field))
                                .collect(),
                            name,
                            description,
                        },
                    );
                }
                TypeDecl::Interface {
                    name,
                    description,
                    fields,
                    interfaces,
                } => {
                    cache.interfaces.insert(
                        name.clone(),
                        InterfaceType {
                            implements: close_over(&interfaces),
                            fields: fields
                                .into_iter()
                                .map(|field| (field.name.clone(), field))
                                .collect(),
                            name,
                            description,
                        },
                    );
                }
                TypeDecl::Union(union) => {
                    cache.unions.insert(union.name.clone(), union);
                }
                TypeDecl::Enum(en) => {
                    cache.enums.insert(en.name.clone(), en);
                }
                TypeDecl::InputObject(input_object) => {
                    cache
                        .input_objects
                        .insert(input_object.name.clone(), input_object);
                }
            }
        }
        cache
    }
}
