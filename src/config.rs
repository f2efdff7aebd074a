use crate::cache::DEFAULT_CAPACITY;
use crate::graph::{ConfigurationHistory, GraphConfiguration};
use crate::metadata::DEFAULT_MAX_DEPTH;
use crate::sparql::IriValidator;
use crate::vocab::registry;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// RDF files loaded into the in-memory store
    pub data_files: Vec<PathBuf>,
    pub language: String,
    /// Nesting ceiling for schema resolution
    pub max_depth: usize,
    pub cache_capacity: usize,
    /// Root type whose instantiable subtypes scope target URI lookups
    pub first_resource_type: String,
    /// Named graph holding stored graph configurations
    pub configuration_graph: Option<String>,
    /// Graph configurations given in the file
    pub configurations: Vec<GraphConfiguration>,
}

impl RegistryConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            data: cli_data,
            language: cli_language,
            max_depth: cli_max_depth,
            cache_capacity: cli_cache_capacity,
            configuration_graph: cli_configuration_graph,
            command: _,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            data: file_data,
            language: file_language,
            max_depth: file_max_depth,
            cache_capacity: file_cache_capacity,
            first_resource_type: file_first_resource_type,
            configuration_graph: file_configuration_graph,
            configurations: file_configurations,
        } = file_config;

        // relative paths in a config file are relative to the file
        let base_dir = config
            .as_ref()
            .and_then(|path| path.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let data_files = if cli_data.is_empty() {
            file_data
                .unwrap_or_default()
                .into_iter()
                .map(|path| if path.is_absolute() { path } else { base_dir.join(path) })
                .collect()
        } else {
            cli_data
        };

        let language = cli_language
            .or(file_language)
            .map(|lang| lang.trim().to_string())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(Self {
            data_files,
            language,
            max_depth: cli_max_depth.or(file_max_depth).unwrap_or(DEFAULT_MAX_DEPTH),
            cache_capacity: cli_cache_capacity
                .or(file_cache_capacity)
                .unwrap_or(DEFAULT_CAPACITY),
            first_resource_type: file_first_resource_type
                .unwrap_or_else(|| registry::FIRST_RESOURCE_TYPE.to_string()),
            configuration_graph: cli_configuration_graph.or(file_configuration_graph),
            configurations: file_configurations.unwrap_or_default(),
        })
    }

    /// Fail fast before any store is built.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.configuration_graph.is_some() || !self.configurations.is_empty(),
            "either configuration_graph or at least one entry in configurations must be provided"
        );
        anyhow::ensure!(self.max_depth > 0, "max_depth must be at least 1");
        anyhow::ensure!(self.cache_capacity > 0, "cache_capacity must be at least 1");
        anyhow::ensure!(!self.language.is_empty(), "language must not be empty");

        IriValidator::require_absolute(&self.first_resource_type)
            .context("first_resource_type must be an absolute URI")?;

        if let Some(graph) = self.configuration_graph.as_deref() {
            IriValidator::require_absolute(graph).context("configuration_graph must be an absolute URI")?;
        }

        for configuration in &self.configurations {
            IriValidator::require_absolute(&configuration.id)
                .with_context(|| format!("configuration id {:?} must be an absolute URI", configuration.id))?;
            for graph in configuration.all_graphs() {
                IriValidator::require_absolute(graph).with_context(|| {
                    format!("graph {:?} of configuration {:?} must be an absolute URI", graph, configuration.id)
                })?;
            }
        }

        for path in &self.data_files {
            anyhow::ensure!(path.is_file(), "data file {:?} does not exist", path);
        }

        Ok(())
    }

    /// History built from the configurations listed in the file.
    ///
    /// Unlike configurations read from the store, a file with repeated ids or
    /// start times is rejected.
    pub fn history(&self) -> Result<ConfigurationHistory> {
        let mut configurations = self.configurations.clone();
        configurations.sort_by(|a, b| a.start_date_time.cmp(&b.start_date_time));

        let mut history = ConfigurationHistory::new();
        for configuration in configurations {
            history
                .push(configuration)
                .context("invalid graph configuration history")?;
        }
        Ok(history)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "registry-graph", about = "Metadata registry graph queries", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "REGISTRY_GRAPH_DATA",
        value_name = "FILE",
        value_delimiter = ',',
        global = true,
        help = "RDF files to load (Turtle, TriG, N-Triples, N-Quads)"
    )]
    pub data: Vec<PathBuf>,

    #[arg(
        long,
        env = "REGISTRY_GRAPH_LANGUAGE",
        value_name = "LANG",
        global = true,
        help = "Language of labels and descriptions"
    )]
    pub language: Option<String>,

    #[arg(
        long,
        env = "REGISTRY_GRAPH_MAX_DEPTH",
        value_name = "N",
        global = true,
        help = "Maximum nesting depth for nested object schemas",
        value_parser = clap::value_parser!(usize)
    )]
    pub max_depth: Option<usize>,

    #[arg(
        long,
        env = "REGISTRY_GRAPH_CACHE_CAPACITY",
        value_name = "N",
        global = true,
        help = "Maximum number of cached taxonomy results",
        value_parser = clap::value_parser!(usize)
    )]
    pub cache_capacity: Option<usize>,

    #[arg(
        long,
        env = "REGISTRY_GRAPH_CONFIGURATION_GRAPH",
        value_name = "URI",
        global = true,
        help = "Named graph holding the graph configuration history"
    )]
    pub configuration_graph: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the metadata properties of an entity type
    Schema {
        entity_type: String,
        #[arg(long, value_name = "ID", help = "Graph configuration to resolve against")]
        config_id: Option<String>,
        #[arg(long, help = "Include schema notices in the output")]
        notices: bool,
    },
    /// Print the type hierarchy rooted at an entity type
    Types {
        #[arg(help = "Root entity type; defaults to first_resource_type")]
        entity_type: Option<String>,
        #[arg(long, help = "Only list leaf types")]
        leaves: bool,
    },
    /// Print a taxonomy forest, one subtree or the flat list
    Taxonomy {
        taxonomy_type: String,
        #[arg(long, value_name = "ID", conflicts_with = "flat")]
        id: Option<String>,
        #[arg(long)]
        flat: bool,
    },
    /// Print every named graph with its status
    Graphs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    data: Option<Vec<PathBuf>>,
    language: Option<String>,
    max_depth: Option<usize>,
    cache_capacity: Option<usize>,
    first_resource_type: Option<String>,
    configuration_graph: Option<String>,
    configurations: Option<Vec<GraphConfiguration>>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
