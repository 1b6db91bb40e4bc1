//! Resolution orchestrator: fans out over every document and every reachable
//! fragment, then computes the corpus-wide closures the emission layer needs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::ast::{self, OperationDefinitionExt, OperationKind};
use crate::documents::{Document, DocumentDefinition, Documents, Fragment, Operation};
use crate::schema::{CompositeType, InputType, Schema};

use super::error::ResolutionError;
use super::field::ResolvedFieldType;
use super::selection_set::{ResolvedSelection, ResolvedSelectionSet, SelectionSetResolver};

/// The sole artifact handed to consumers of resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocuments {
    pub documents: Vec<ResolvedDocument>,
    pub fragment_lookup: HashMap<String, ResolvedFragment>,
    /// Names of every scalar/enum/input type an operation actually touches.
    pub used_types: HashSet<String>,
    /// Fragments spread somewhere without a runtime `__typename` check.
    pub fulfilled_fragments: HashSet<String>,
    pub has_mutation: bool,
    pub has_subscription: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub path: PathBuf,
    pub definitions: Vec<ResolvedDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedDefinition {
    Operation(ResolvedOperation),
    Fragment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperation {
    pub name: Option<String>,
    pub kind: OperationKind,
    pub selection_set: ResolvedSelectionSet,
    pub variables: Vec<ResolvedVariable>,
    pub source_text: String,
    pub resolved_text: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub name: String,
    pub ty: ResolvedInputType,
    /// Default value exactly as the document spelled it.
    pub default_value: Option<String>,
}

/// Owned rendition of [`InputType`], detached from the schema's lifetime so
/// resolved output can outlive resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInputType {
    Scalar(String),
    Enum(String),
    InputObject(String),
    List(Box<ResolvedInputType>),
    NonNull(Box<ResolvedInputType>),
}

impl ResolvedInputType {
    fn from_schema(ty: &InputType<'_>) -> Self {
        match ty {
            InputType::Scalar(scalar) => ResolvedInputType::Scalar(scalar.name.clone()),
            InputType::Enum(en) => ResolvedInputType::Enum(en.name.clone()),
            InputType::InputObject(input_object) => {
                ResolvedInputType::InputObject(input_object.name.clone())
            }
            InputType::List(inner) => {
                ResolvedInputType::List(Box::new(Self::from_schema(inner)))
            }
            InputType::NonNull(inner) => {
                ResolvedInputType::NonNull(Box::new(Self::from_schema(inner)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFragment {
    pub name: String,
    pub type_condition: String,
    pub file: PathBuf,
    pub selection_set: ResolvedSelectionSet,
}

pub struct DocumentsResolver {
    schema: Arc<Schema>,
    documents: Arc<Documents>,
}

impl DocumentsResolver {
    pub fn new(schema: Arc<Schema>, documents: Arc<Documents>) -> Self {
        Self { schema, documents }
    }

    /// Resolves the whole corpus. One task per reachable fragment and one per
    /// document; each task's output is self-contained, so scheduling order
    /// cannot affect any resolved set's internal ordering. The first error
    /// aborts the run and discards sibling results.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Result<ResolvedDocuments, ResolutionError> {
        let used_fragments = self.used_fragments()?;
        debug!(
            used = used_fragments.len(),
            defined = self.documents.fragment_lookup.len(),
            "resolving reachable fragments"
        );
        let fragment_lookup = self.resolve_fragments(used_fragments).await?;
        let documents = self.resolve_documents().await?;
        let fulfilled_fragments = fulfilled_fragments(&documents, &fragment_lookup);
        let used_types = self.used_types(&documents, &fragment_lookup)?;
        Ok(ResolvedDocuments {
            has_mutation: self.has_operation_kind(OperationKind::Mutation),
            has_subscription: self.has_operation_kind(OperationKind::Subscription),
            documents,
            fragment_lookup,
            used_types,
            fulfilled_fragments,
        })
    }

    /// Fragment names transitively spread from any operation root. Defined
    /// but never-spread fragments are not resolved at all.
    fn used_fragments(&self) -> Result<HashSet<String>, ResolutionError> {
        let mut pending: Vec<&ast::SelectionSet> = Vec::new();
        for document in &self.documents.documents {
            for definition in &document.definitions {
                if let DocumentDefinition::Operation(operation) = definition {
                    pending.push(operation.ast.selection_set());
                }
            }
        }
        let mut used = HashSet::new();
        while let Some(selection_set) = pending.pop() {
            for selection in &selection_set.items {
                match selection {
                    ast::Selection::Field(field) => {
                        if !field.selection_set.items.is_empty() {
                            pending.push(&field.selection_set);
                        }
                    }
                    ast::Selection::InlineFragment(inline) => {
                        pending.push(&inline.selection_set);
                    }
                    ast::Selection::FragmentSpread(spread) => {
                        if used.insert(spread.fragment_name.clone()) {
                            let fragment = self.documents.fragment(&spread.fragment_name)?;
                            pending.push(&fragment.ast.selection_set);
                        }
                    }
                }
            }
        }
        Ok(used)
    }

    async fn resolve_fragments(
        &self,
        used_fragments: HashSet<String>,
    ) -> Result<HashMap<String, ResolvedFragment>, ResolutionError> {
        let mut tasks = JoinSet::new();
        for name in used_fragments {
            let schema = Arc::clone(&self.schema);
            let documents = Arc::clone(&self.documents);
            tasks.spawn(async move {
                let fragment = documents.fragment(&name)?;
                let resolved = resolve_fragment(&schema, &documents, fragment).map_err(
                    |source| ResolutionError::Fragment {
                        name: name.clone(),
                        path: fragment.file.clone(),
                        source: Box::new(source),
                    },
                )?;
                Ok::<_, ResolutionError>((name, resolved))
            });
        }
        let mut resolved = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (name, fragment) = joined??;
            resolved.insert(name, fragment);
        }
        Ok(resolved)
    }

    async fn resolve_documents(&self) -> Result<Vec<ResolvedDocument>, ResolutionError> {
        let mut tasks = JoinSet::new();
        for index in 0..self.documents.documents.len() {
            let schema = Arc::clone(&self.schema);
            let documents = Arc::clone(&self.documents);
            tasks.spawn(async move {
                let document = &documents.documents[index];
                let resolved = resolve_document(&schema, &documents, document)?;
                Ok::<_, ResolutionError>((index, resolved))
            });
        }
        // Keyed by original index so completion order never shows in output.
        let mut resolved = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, document) = joined??;
            resolved.insert(index, document);
        }
        Ok(resolved.into_values().collect())
    }

    fn has_operation_kind(&self, kind: OperationKind) -> bool {
        self.documents.documents.iter().any(|document| {
            document.definitions.iter().any(|definition| {
                matches!(
                    definition,
                    DocumentDefinition::Operation(operation) if operation.ast.kind() == kind
                )
            })
        })
    }

    /// Scalar/enum leaves reachable from any operation's resolved set, plus
    /// every named type reachable from any operation variable.
    fn used_types(
        &self,
        documents: &[ResolvedDocument],
        fragment_lookup: &HashMap<String, ResolvedFragment>,
    ) -> Result<HashSet<String>, ResolutionError> {
        let mut used = HashSet::new();
        let mut seen_spreads = HashSet::new();
        for document in documents {
            for definition in &document.definitions {
                if let ResolvedDefinition::Operation(operation) = definition {
                    collect_leaf_types(
                        &operation.selection_set,
                        fragment_lookup,
                        &mut seen_spreads,
                        &mut used,
                    );
                }
            }
        }
        for document in &self.documents.documents {
            for definition in &document.definitions {
                if let DocumentDefinition::Operation(operation) = definition {
                    for variable in operation.ast.variable_definitions() {
                        let input = self.schema.input_type_from_ast(&variable.var_type)?;
                        self.collect_input_types(&input, &mut used)?;
                    }
                }
            }
        }
        Ok(used)
    }

    fn collect_input_types(
        &self,
        ty: &InputType<'_>,
        used: &mut HashSet<String>,
    ) -> Result<(), ResolutionError> {
        match ty {
            InputType::Scalar(scalar) => {
                used.insert(scalar.name.clone());
            }
            InputType::Enum(en) => {
                used.insert(en.name.clone());
            }
            InputType::InputObject(input_object) => {
                // Input objects can be recursive; recurse only on first sight.
                if used.insert(input_object.name.clone()) {
                    for field in &input_object.input_fields {
                        let inner = self.schema.input_type(&field.ty)?;
                        self.collect_input_types(&inner, used)?;
                    }
                }
            }
            InputType::List(inner) | InputType::NonNull(inner) => {
                self.collect_input_types(inner, used)?;
            }
        }
        Ok(())
    }
}

fn resolve_fragment(
    schema: &Schema,
    documents: &Documents,
    fragment: &Fragment,
) -> Result<ResolvedFragment, ResolutionError> {
    let type_condition = ast::type_condition_name(&fragment.ast.type_condition);
    let root = schema.fragment_type(type_condition)?;
    let selection_set =
        SelectionSetResolver::new(root, &fragment.ast.selection_set, schema, documents).resolve()?;
    Ok(ResolvedFragment {
        name: fragment.ast.name.clone(),
        type_condition: type_condition.to_string(),
        file: fragment.file.clone(),
        selection_set,
    })
}

fn resolve_document(
    schema: &Schema,
    documents: &Documents,
    document: &Document,
) -> Result<ResolvedDocument, ResolutionError> {
    let mut definitions = Vec::with_capacity(document.definitions.len());
    for definition in &document.definitions {
        match definition {
            DocumentDefinition::Operation(operation) => {
                let resolved = resolve_operation(schema, documents, operation).map_err(
                    |source| ResolutionError::Operation {
                        name: operation.ast.name().unwrap_or_default().to_string(),
                        path: document.path.clone(),
                        source: Box::new(source),
                    },
                )?;
                definitions.push(ResolvedDefinition::Operation(resolved));
            }
            DocumentDefinition::Fragment(name) => {
                definitions.push(ResolvedDefinition::Fragment(name.clone()));
            }
        }
    }
    Ok(ResolvedDocument {
        path: document.path.clone(),
        definitions,
    })
}

fn resolve_operation(
    schema: &Schema,
    documents: &Documents,
    operation: &Operation,
) -> Result<ResolvedOperation, ResolutionError> {
    let root = schema.operation_type(&operation.ast)?;
    let selection_set = SelectionSetResolver::new(
        CompositeType::Object(root),
        operation.ast.selection_set(),
        schema,
        documents,
    )
    .resolve()?;
    let variables = operation
        .ast
        .variable_definitions()
        .iter()
        .map(|variable| {
            let input = schema.input_type_from_ast(&variable.var_type)?;
            Ok(ResolvedVariable {
                name: variable.name.clone(),
                ty: ResolvedInputType::from_schema(&input),
                default_value: variable.default_value.as_ref().map(|value| value.to_string()),
            })
        })
        .collect::<Result<Vec<_>, ResolutionError>>()?;
    Ok(ResolvedOperation {
        name: operation.ast.name().map(str::to_string),
        kind: operation.ast.kind(),
        selection_set,
        variables,
        source_text: operation.source_text.clone(),
        resolved_text: operation.resolved_text.clone(),
        hash: operation.hash.clone(),
    })
}

/// A fragment is fulfilled iff some selection set spreads it without a
/// `__typename` check; typename-gated spreads do not fulfill.
fn fulfilled_fragments(
    documents: &[ResolvedDocument],
    fragment_lookup: &HashMap<String, ResolvedFragment>,
) -> HashSet<String> {
    let mut pending: Vec<&ResolvedSelectionSet> = fragment_lookup
        .values()
        .map(|fragment| &fragment.selection_set)
        .collect();
    for document in documents {
        for definition in &document.definitions {
            if let ResolvedDefinition::Operation(operation) = definition {
                pending.push(&operation.selection_set);
            }
        }
    }
    let mut fulfilled = HashSet::new();
    while let Some(selection_set) = pending.pop() {
        for selection in selection_set.values() {
            match selection {
                ResolvedSelection::FragmentSpread {
                    name,
                    check_typename: None,
                } => {
                    fulfilled.insert(name.clone());
                }
                ResolvedSelection::FragmentSpread { .. } => {}
                ResolvedSelection::Field { field, .. } => {
                    if let Some(map) = field.ty.unwrapped_map() {
                        pending.push(map);
                    }
                }
            }
        }
    }
    fulfilled
}

fn collect_leaf_types(
    selection_set: &ResolvedSelectionSet,
    fragment_lookup: &HashMap<String, ResolvedFragment>,
    seen_spreads: &mut HashSet<String>,
    used: &mut HashSet<String>,
) {
    for selection in selection_set.values() {
        match selection {
            ResolvedSelection::FragmentSpread { name, .. } => {
                if seen_spreads.insert(name.clone()) {
                    if let Some(fragment) = fragment_lookup.get(name) {
                        collect_leaf_types(&fragment.selection_set, fragment_lookup, seen_spreads, used);
                    }
                }
            }
            ResolvedSelection::Field { field, .. } => {
                collect_field_leaf_types(&field.ty, fragment_lookup, seen_spreads, used);
            }
        }
    }
}

fn collect_field_leaf_types(
    ty: &ResolvedFieldType,
    fragment_lookup: &HashMap<String, ResolvedFragment>,
    seen_spreads: &mut HashSet<String>,
    used: &mut HashSet<String>,
) {
    match ty {
        ResolvedFieldType::Scalar { type_name, .. } => {
            used.insert(type_name.clone());
        }
        ResolvedFieldType::Map(set) => {
            collect_leaf_types(set, fragment_lookup, seen_spreads, used);
        }
        ResolvedFieldType::List(inner) | ResolvedFieldType::Optional(inner) => {
            collect_field_leaf_types(inner, fragment_lookup, seen_spreads, used);
        }
    }
}
