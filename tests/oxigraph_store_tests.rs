//! End-to-end reads against an oxigraph store loaded from a TriG fixture,
//! with graph configurations read from the store itself

mod support;

use assert_matches::assert_matches;
use registry_graph::RegistryError;
use registry_graph::cache::LruCacheService;
use registry_graph::graph::{
    GraphConfigurationProvider, GraphManager, GraphRole, GraphStatus, StoreConfigurationProvider,
};
use registry_graph::metadata::{MetadataRepository, MetadataSchemaResolver, SchemaNotice};
use registry_graph::store::OxigraphStore;
use registry_graph::taxonomy::{TaxonomyRepository, TaxonomyService};
use registry_graph::vocab::{owl, rdf, rdfs, registry, shacl};
use std::sync::Arc;

const CONFIG_GRAPH: &str = "https://pid.example.org/graph/config";
const OLD_CONFIG: &str = "https://pid.example.org/config/1";
const CURRENT_CONFIG: &str = "https://pid.example.org/config/2";

const PID_CONCEPT: &str = "https://pid.bayer.com/kos/19050/PID_Concept";
const RESOURCE: &str = "https://pid.example.org/Resource";
const DATASET: &str = "https://pid.example.org/Dataset";
const ONTOLOGY: &str = "https://pid.example.org/Ontology";
const BROWSABLE: &str = "https://pid.example.org/BrowsableEndpoint";
const TITLE: &str = "https://pid.example.org/hasTitle";
const KEYWORD: &str = "https://pid.example.org/KeywordConcept";

type Provider = StoreConfigurationProvider<Arc<OxigraphStore>>;

fn store() -> Arc<OxigraphStore> {
    let store = OxigraphStore::new().unwrap();
    store.load_file(&support::fixture("registry.trig")).unwrap();
    Arc::new(store)
}

fn provider(store: &Arc<OxigraphStore>) -> Provider {
    StoreConfigurationProvider::new(Arc::clone(store), CONFIG_GRAPH)
}

fn repository(store: &Arc<OxigraphStore>) -> MetadataRepository<Arc<OxigraphStore>, Provider> {
    MetadataRepository::new(Arc::clone(store), provider(store))
}

#[test]
fn configurations_are_read_from_the_configuration_graph() {
    let store = store();
    let history = provider(&store).history().unwrap();

    assert_eq!(history.len(), 2);
    let current = history.current().unwrap();
    assert_eq!(current.id, CURRENT_CONFIG);
    assert_eq!(current.graphs(GraphRole::Metadata), [support::METADATA_GRAPH]);
    assert_eq!(current.graphs(GraphRole::ShapeConstraints), [support::SHACL_GRAPH]);
    assert_eq!(current.graphs(GraphRole::EnterpriseOntology), [support::ONTOLOGY_GRAPH]);
    assert!(current.graphs(GraphRole::ConsumerGroup).is_empty());

    let old = history.by_id(OLD_CONFIG).unwrap();
    assert!(old.start_date_time < current.start_date_time);
    assert!(!history.is_current(OLD_CONFIG));
}

#[test]
fn dataset_schema_is_resolved_with_inherited_shapes() {
    let store = store();
    let resolver = MetadataSchemaResolver::new(repository(&store));

    let schema = resolver.resolve_with_notices(DATASET, None).unwrap();
    let keys: Vec<_> = schema.properties.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(schema.properties.len(), 3, "keys: {keys:?}");

    let type_property = schema.properties.iter().find(|p| p.key == rdf::TYPE).unwrap();
    assert_eq!(type_property.value(shacl::RANGE), Some(owl::CLASS));

    let title = schema.properties.iter().find(|p| p.key == TITLE).unwrap();
    assert_eq!(title.value(registry::PID_URI), Some(TITLE));
    assert_eq!(title.value(rdfs::COMMENT), Some("Human readable title"));
    let group = title.group().unwrap();
    assert_eq!(group.key, "https://pid.example.org/TechnicalInformation");
    assert_eq!(group.label.as_deref(), Some("Technical information"));
    assert_eq!(group.order, 2.0);

    let distribution = schema
        .properties
        .iter()
        .find(|p| p.key == registry::DISTRIBUTION)
        .unwrap();
    assert_eq!(distribution.nested_metadata.len(), 1);
    let nested = &distribution.nested_metadata[0];
    assert_eq!(nested.key, BROWSABLE);
    assert_eq!(nested.label, "Browsable Endpoint");
    assert_eq!(nested.properties.len(), 1);
    assert_eq!(nested.properties[0].key, registry::HAS_NETWORK_ADDRESS);

    assert!(
        schema
            .notices
            .iter()
            .any(|n| matches!(n, SchemaNotice::MissingPath { entity_type, .. } if entity_type == DATASET))
    );
}

#[test]
fn older_configuration_only_sees_its_own_graphs() {
    let store = store();
    let resolver = MetadataSchemaResolver::new(repository(&store));

    let properties = resolver.resolve(DATASET, Some(OLD_CONFIG)).unwrap();
    assert!(properties.is_empty());

    assert_matches!(
        resolver.resolve(DATASET, Some("https://pid.example.org/config/9")),
        Err(RegistryError::EntityNotFound { .. })
    );
}

#[test]
fn entity_type_queries() {
    let store = store();
    let repository = repository(&store);

    let tree = repository.entity_type_hierarchy(RESOURCE, 8).unwrap().unwrap();
    assert_eq!(tree.node.id, RESOURCE);
    assert_eq!(tree.node.label, "Resource");
    let mut children: Vec<_> = tree.children.iter().map(|c| c.node.id.as_str()).collect();
    children.sort();
    assert_eq!(children, vec![DATASET, ONTOLOGY]);

    let mut parents = repository.parent_entity_types(DATASET).unwrap();
    parents.sort();
    assert_eq!(parents, vec![PID_CONCEPT, DATASET, RESOURCE]);

    assert_eq!(repository.leaf_entity_types(PID_CONCEPT).unwrap(), vec![DATASET, ONTOLOGY]);
    assert_eq!(repository.instantiable_entity_types(PID_CONCEPT).unwrap(), vec![DATASET, ONTOLOGY]);

    assert_eq!(repository.entity_label(RESOURCE).unwrap(), "Resource");
    assert_eq!(repository.entity_label("https://pid.example.org/Unlabelled").unwrap(), "");
}

#[test]
fn shape_graph_spans_the_configured_graphs() {
    let store = store();
    let triples = repository(&store).shape_graph(None).unwrap();

    assert!(triples.iter().any(|t| t.predicate == shacl::PROPERTY));
    assert!(triples.iter().any(|t| t.predicate == rdfs::DOMAIN));
    assert!(!triples.iter().any(|t| t.predicate == registry::HAS_START_DATE_TIME));
}

#[test]
fn taxonomies_are_built_from_broader_links() {
    let store = store();
    let service = TaxonomyService::new(
        TaxonomyRepository::new(Arc::clone(&store), provider(&store)),
        LruCacheService::new(8),
    );

    let forest = service.taxonomies(KEYWORD).unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].node.label, "Science");
    assert_eq!(forest[0].children.len(), 2);
    // biochemistry sits under both biology and chemistry
    assert_eq!(forest[0].size(), 5);

    let biology = service.taxonomy("https://pid.example.org/keyword/biology").unwrap();
    assert_eq!(biology.node.label, "Biology");
    assert_eq!(biology.children.len(), 1);
    assert_eq!(biology.children[0].node.label, "Biochemistry");

    assert_eq!(service.taxonomies_flat(KEYWORD).unwrap().len(), 4);

    assert_matches!(
        service.taxonomy("https://pid.example.org/keyword/none"),
        Err(RegistryError::EntityNotFound { .. })
    );
}

#[test]
fn graph_overview_and_guarded_deletion() {
    let store = store();
    let manager = GraphManager::new(Arc::clone(&store), provider(&store)).with_configuration_graph(CONFIG_GRAPH);

    let overview: Vec<_> = manager
        .graphs()
        .unwrap()
        .into_iter()
        .map(|g| (g.name, g.status))
        .collect();
    assert_eq!(
        overview,
        vec![
            (CONFIG_GRAPH.to_string(), GraphStatus::Active),
            (support::METADATA_GRAPH.to_string(), GraphStatus::Active),
            ("https://pid.example.org/graph/metadata-old".to_string(), GraphStatus::Historic),
            (support::ONTOLOGY_GRAPH.to_string(), GraphStatus::Active),
            ("https://pid.example.org/graph/orphan".to_string(), GraphStatus::Unreferenced),
            (support::SHACL_GRAPH.to_string(), GraphStatus::Active),
        ]
    );

    assert_matches!(
        manager.delete_graph("https://pid.example.org/graph/metadata-old"),
        Err(RegistryError::GraphReferenced(_))
    );
    manager.delete_graph("https://pid.example.org/graph/orphan").unwrap();
    assert_eq!(manager.graphs().unwrap().len(), 5);
}
