//! Spec-rule validation of every operation's resolved text against the schema
//! SDL, using graphql-tools' default rule plan. Unlike resolution this phase
//! batches: the report carries every violation across the corpus.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use graphql_parser::Pos;
use graphql_tools::validation::rules::default_rules_validation_plan;
use graphql_tools::validation::validate::{validate, ValidationPlan};
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::ast::{OperationDefinitionExt, SchemaDocument};
use crate::documents::{DocumentDefinition, Documents};
use crate::schema::Schema;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("validation needs an SDL rendition of the schema, but none was retained")]
    MissingSdl,
    #[error("unable to parse the schema SDL for validation: {0}")]
    Sdl(#[from] graphql_parser::schema::ParseError),
    #[error("operation '{operation}' in {} has no resolved text to validate", path.display())]
    MissingResolvedText { operation: String, path: PathBuf },
    #[error("unable to parse the resolved text of '{operation}' in {}: {source}", path.display())]
    Parse {
        operation: String,
        path: PathBuf,
        #[source]
        source: graphql_parser::query::ParseError,
    },
    #[error("{0}")]
    Invalid(ValidationReport),
    #[error("validation task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Every spec violation found across the corpus, in document order.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub entries: Vec<ValidationReportEntry>,
}

#[derive(Debug, Clone)]
pub struct ValidationReportEntry {
    pub path: PathBuf,
    pub operation: String,
    pub failures: Vec<ValidationFailure>,
}

#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub message: String,
    pub locations: Vec<Pos>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.failures.len()).sum()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} validation error(s) across {} operation(s):",
            self.failure_count(),
            self.entries.len()
        )?;
        for entry in &self.entries {
            for failure in &entry.failures {
                write!(
                    f,
                    "  {}: operation '{}': {}",
                    entry.path.display(),
                    entry.operation,
                    failure.message
                )?;
                if let Some(pos) = failure.locations.first() {
                    write!(f, " ({}:{})", pos.line, pos.column)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

pub struct DocumentsValidator {
    schema: Arc<Schema>,
    documents: Arc<Documents>,
}

impl DocumentsValidator {
    pub fn new(schema: Arc<Schema>, documents: Arc<Documents>) -> Self {
        Self { schema, documents }
    }

    /// Validates every operation concurrently, one task per document. Hard
    /// failures (missing or unparseable resolved text) abort immediately;
    /// rule violations are gathered into one full report.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Result<(), ValidationError> {
        let sdl = self.schema.sdl.as_deref().ok_or(ValidationError::MissingSdl)?;
        let schema_ast: Arc<SchemaDocument> =
            Arc::new(graphql_parser::parse_schema::<String>(sdl)?.into_static());
        let plan = Arc::new(default_rules_validation_plan());

        let mut tasks = JoinSet::new();
        for index in 0..self.documents.documents.len() {
            let documents = Arc::clone(&self.documents);
            let schema_ast = Arc::clone(&schema_ast);
            let plan = Arc::clone(&plan);
            tasks.spawn(async move {
                validate_document(&documents, index, &schema_ast, &plan).map(|entries| (index, entries))
            });
        }
        let mut by_index = std::collections::BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, entries) = joined??;
            by_index.insert(index, entries);
        }

        let report = ValidationReport {
            entries: by_index.into_values().flatten().collect(),
        };
        if report.is_empty() {
            debug!("all operations passed validation");
            Ok(())
        } else {
            Err(ValidationError::Invalid(report))
        }
    }
}

fn validate_document(
    documents: &Documents,
    index: usize,
    schema_ast: &SchemaDocument,
    plan: &ValidationPlan,
) -> Result<Vec<ValidationReportEntry>, ValidationError> {
    let document = &documents.documents[index];
    let mut entries = Vec::new();
    for definition in &document.definitions {
        let DocumentDefinition::Operation(operation) = definition else {
            continue;
        };
        let operation_name = operation
            .ast
            .name()
            .unwrap_or("(anonymous)")
            .to_string();
        let resolved_text = operation.resolved_text.as_deref().ok_or_else(|| {
            ValidationError::MissingResolvedText {
                operation: operation_name.clone(),
                path: document.path.clone(),
            }
        })?;
        // The resolved text carries every fragment the operation spreads, so
        // it validates standalone.
        let parsed = graphql_parser::parse_query::<String>(resolved_text)
            .map_err(|source| ValidationError::Parse {
                operation: operation_name.clone(),
                path: document.path.clone(),
                source,
            })?
            .into_static();
        let failures: Vec<ValidationFailure> = validate(schema_ast, &parsed, plan)
            .into_iter()
            .map(|error| ValidationFailure {
                message: error.message,
                locations: error.locations,
            })
            .collect();
        if !failures.is_empty() {
            entries.push(ValidationReportEntry {
                path: document.path.clone(),
                operation: operation_name,
                failures,
            });
        }
    }
    Ok(entries)
}
