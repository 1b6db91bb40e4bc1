mod logger;

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use graphql_typegen::{Config, Pipeline};

use crate::logger::configure_logging;

const DEFAULT_CONFIG_PATH: &str = "typegen.config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configure_logging();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TYPEGEN_CONFIG_FILE_PATH").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config_path = PathBuf::from(config_path);
    let config = Config::from_file(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let output = Pipeline::new(config).run().await?;

    let operations: usize = output
        .resolved
        .documents
        .iter()
        .map(|document| {
            document
                .definitions
                .iter()
                .filter(|definition| {
                    matches!(
                        definition,
                        graphql_typegen::resolution::ResolvedDefinition::Operation(_)
                    )
                })
                .count()
        })
        .sum();
    info!(
        documents = output.resolved.documents.len(),
        operations,
        fragments = output.resolved.fragment_lookup.len(),
        fulfilled_fragments = output.resolved.fulfilled_fragments.len(),
        used_types = output.resolved.used_types.len(),
        has_mutation = output.resolved.has_mutation,
        has_subscription = output.resolved.has_subscription,
        "resolution complete"
    );

    Ok(())
}
