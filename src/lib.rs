pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod sparql;
pub mod store;
pub mod taxonomy;
pub mod validation;
pub mod vocab;

pub use config::{CliArgs, Command, RegistryConfig};
pub use error::{ErrorCode, RegistryError, Result};
pub use logging::{LoggingConfig, init_logging};

use anyhow::Context;
use cache::LruCacheService;
use graph::{GraphConfigurationProvider, GraphManager, StoreConfigurationProvider};
use metadata::{MetadataRepository, MetadataSchemaResolver};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use store::OxigraphStore;
use taxonomy::{TaxonomyRepository, TaxonomyService};

type SharedProvider = Arc<dyn GraphConfigurationProvider + Send + Sync>;

/// Load the configured data and run one command, returning its JSON output.
pub fn run_command(config: &RegistryConfig, command: &Command) -> anyhow::Result<Value> {
    let _span = logging::operation_span("run_command").entered();
    let started = Instant::now();

    let store = Arc::new(OxigraphStore::new()?);
    for path in &config.data_files {
        store
            .load_file(path)
            .with_context(|| format!("failed to load {:?}", path))?;
    }
    tracing::info!(files = config.data_files.len(), quads = store.len()?, "store loaded");

    let provider: SharedProvider = match config.configuration_graph.as_deref() {
        Some(graph) => Arc::new(StoreConfigurationProvider::new(store.clone(), graph)),
        None => Arc::new(config.history()?),
    };

    let repository = MetadataRepository::new(store.clone(), provider.clone()).with_language(&config.language);

    let output = match command {
        Command::Schema {
            entity_type,
            config_id,
            notices,
        } => {
            let resolver = MetadataSchemaResolver::new(repository).with_max_depth(config.max_depth);
            let schema = resolver.resolve_with_notices(entity_type, config_id.as_deref())?;
            if *notices {
                serde_json::to_value(&schema)?
            } else {
                serde_json::to_value(&schema.properties)?
            }
        }
        Command::Types { entity_type, leaves } => {
            let entity_type = entity_type.as_deref().unwrap_or(&config.first_resource_type);
            if *leaves {
                serde_json::to_value(repository.leaf_entity_types(entity_type)?)?
            } else {
                let tree = repository
                    .entity_type_hierarchy(entity_type, config.max_depth)?
                    .ok_or_else(|| RegistryError::not_found("entity type", entity_type))?;
                serde_json::to_value(tree)?
            }
        }
        Command::Taxonomy {
            taxonomy_type,
            id,
            flat,
        } => {
            let service = TaxonomyService::new(
                TaxonomyRepository::new(store.clone(), provider.clone()).with_language(&config.language),
                LruCacheService::new(config.cache_capacity),
            );
            match (id, flat) {
                (Some(id), _) => serde_json::to_value(service.taxonomy(id)?)?,
                (None, true) => serde_json::to_value(service.taxonomies_flat(taxonomy_type)?)?,
                (None, false) => serde_json::to_value(service.taxonomies(taxonomy_type)?)?,
            }
        }
        Command::Graphs => {
            let mut manager = GraphManager::new(store.clone(), provider.clone());
            if let Some(graph) = config.configuration_graph.as_deref() {
                manager = manager.with_configuration_graph(graph);
            }
            serde_json::to_value(manager.graphs()?)?
        }
    };

    crate::log_slow_operation!(started.elapsed(), 1_000, command = ?command, "command finished");
    Ok(output)
}
