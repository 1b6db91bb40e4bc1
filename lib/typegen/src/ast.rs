//! Static-lifetime aliases over the graphql-parser AST, plus a few extension
//! traits for the pieces the resolver keeps reaching for.

pub type Document = graphql_parser::query::Document<'static, String>;
pub type Definition = graphql_parser::query::Definition<'static, String>;
pub type OperationDefinition = graphql_parser::query::OperationDefinition<'static, String>;
pub type FragmentDefinition = graphql_parser::query::FragmentDefinition<'static, String>;
pub type SelectionSet = graphql_parser::query::SelectionSet<'static, String>;
pub type Selection = graphql_parser::query::Selection<'static, String>;
pub type Field = graphql_parser::query::Field<'static, String>;
pub type FragmentSpread = graphql_parser::query::FragmentSpread<'static, String>;
pub type InlineFragment = graphql_parser::query::InlineFragment<'static, String>;
pub type TypeCondition = graphql_parser::query::TypeCondition<'static, String>;
pub type VariableDefinition = graphql_parser::query::VariableDefinition<'static, String>;
pub type Type = graphql_parser::query::Type<'static, String>;
pub type Value = graphql_parser::query::Value<'static, String>;
pub type Directive = graphql_parser::query::Directive<'static, String>;

pub type SchemaDocument = graphql_parser::schema::Document<'static, String>;

/// Kind of an executable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

pub trait OperationDefinitionExt {
    fn kind(&self) -> OperationKind;
    fn name(&self) -> Option<&str>;
    fn selection_set(&self) -> &SelectionSet;
    fn variable_definitions(&self) -> &[VariableDefinition];
}

impl OperationDefinitionExt for OperationDefinition {
    fn kind(&self) -> OperationKind {
        match self {
            OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
                OperationKind::Query
            }
            OperationDefinition::Mutation(_) => OperationKind::Mutation,
            OperationDefinition::Subscription(_) => OperationKind::Subscription,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            OperationDefinition::SelectionSet(_) => None,
            OperationDefinition::Query(q) => q.name.as_deref(),
            OperationDefinition::Mutation(m) => m.name.as_deref(),
            OperationDefinition::Subscription(s) => s.name.as_deref(),
        }
    }

    fn selection_set(&self) -> &SelectionSet {
        match self {
            OperationDefinition::SelectionSet(s) => s,
            OperationDefinition::Query(q) => &q.selection_set,
            OperationDefinition::Mutation(m) => &m.selection_set,
            OperationDefinition::Subscription(s) => &s.selection_set,
        }
    }

    fn variable_definitions(&self) -> &[VariableDefinition] {
        match self {
            OperationDefinition::SelectionSet(_) => &[],
            OperationDefinition::Query(q) => &q.variable_definitions,
            OperationDefinition::Mutation(m) => &m.variable_definitions,
            OperationDefinition::Subscription(s) => &s.variable_definitions,
        }
    }
}

pub trait FieldExt {
    /// The key the field appears under in a response: its alias, or its name.
    fn response_key(&self) -> &str;
}

impl FieldExt for Field {
    fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

pub trait DirectiveListExt {
    /// Whether the list carries an `@skip` or `@include` directive, making the
    /// annotated selection runtime-conditional.
    fn has_skip_or_include(&self) -> bool;
}

impl DirectiveListExt for [Directive] {
    fn has_skip_or_include(&self) -> bool {
        self.iter().any(|d| d.name == "skip" || d.name == "include")
    }
}

pub fn type_condition_name(condition: &TypeCondition) -> &str {
    match condition {
        TypeCondition::On(name) => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Document {
        graphql_parser::parse_query::<String>(source)
            .unwrap()
            .into_static()
    }

    #[test]
    fn operation_ext_exposes_kind_and_name() {
        let doc = parse("mutation AddHero($name: String!) { addHero(name: $name) { id } }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        assert_eq!(op.kind(), OperationKind::Mutation);
        assert_eq!(op.name(), Some("AddHero"));
        assert_eq!(op.variable_definitions().len(), 1);
        assert_eq!(op.selection_set().items.len(), 1);
    }

    #[test]
    fn bare_selection_set_is_an_anonymous_query() {
        let doc = parse("{ hero { name } }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        assert_eq!(op.kind(), OperationKind::Query);
        assert_eq!(op.name(), None);
        assert!(op.variable_definitions().is_empty());
    }

    #[test]
    fn response_key_prefers_alias() {
        let doc = parse("{ renamed: hero { name } }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        let Selection::Field(field) = &op.selection_set().items[0] else {
            panic!("expected field");
        };
        assert_eq!(field.response_key(), "renamed");
        assert_eq!(field.name, "hero");
    }

    #[test]
    fn skip_and_include_are_detected() {
        let doc = parse("query Q($f: Boolean!) { hero @include(if: $f) { name @deprecatedish } }");
        let Definition::Operation(op) = &doc.definitions[0] else {
            panic!("expected operation");
        };
        let Selection::Field(hero) = &op.selection_set().items[0] else {
            panic!("expected field");
        };
        assert!(hero.directives.has_skip_or_include());
        let Selection::Field(name) = &hero.selection_set.items[0] else {
            panic!("expected field");
        };
        assert!(!name.directives.has_skip_or_include());
    }
}
