//! Schema resolution against a scripted store
//!
//! Every rule matches on the bound entity type, so the tests also pin down
//! which queries the resolver issues and how many.

mod support;

use assert_matches::assert_matches;
use registry_graph::RegistryError;
use registry_graph::metadata::{MetadataRepository, MetadataSchemaResolver, SchemaNotice};
use registry_graph::sparql::{QueryRow, TypedValue};
use registry_graph::vocab::{owl, rdf, rdfs, registry, shacl, topbraid};
use support::{ScriptedStore, history, iri, lit, shape_row, spo};

const RESOURCE: &str = "https://pid.example.org/Resource";
const ENDPOINT: &str = "https://pid.example.org/Endpoint";
const BROWSABLE: &str = "https://pid.example.org/BrowsableEndpoint";
const LINK: &str = "https://pid.example.org/Link";
const PLAIN_LINK: &str = "https://pid.example.org/PlainLink";
const TITLE: &str = "https://pid.example.org/hasTitle";
const ADDRESS: &str = registry::HAS_NETWORK_ADDRESS;

fn schema_of(entity_type: &str) -> String {
    format!("<{entity_type}> rdfs:subClassOf* ?resourceType")
}

fn subclasses_of(entity_type: &str) -> String {
    format!("?subject rdfs:subClassOf* <{entity_type}>")
}

fn resolver(store: &ScriptedStore) -> MetadataSchemaResolver<&ScriptedStore, registry_graph::graph::ConfigurationHistory> {
    MetadataSchemaResolver::new(MetadataRepository::new(store, history()))
}

fn nested_editor(shape: &str, class: &str) -> QueryRow {
    shape_row(shape, topbraid::EDIT_WIDGET, iri(topbraid::NESTED_OBJECT_EDITOR)).with("nested", iri(class))
}

/// `class` with one direct subclass `sub`
fn type_rows(class: &str, sub: &str, sub_label: &str) -> Vec<QueryRow> {
    vec![
        spo(class, rdfs::LABEL, lit("Parent")),
        spo(sub, rdfs::SUB_CLASS_OF, iri(class)),
        spo(sub, rdfs::LABEL, TypedValue::LangLiteral {
            value: sub_label.into(),
            language: "en".into(),
        }),
    ]
}

#[test]
fn malformed_entity_type_issues_no_queries() {
    let store = ScriptedStore::new();
    let resolver = resolver(&store);

    assert_matches!(resolver.resolve("INVALID_Uri", None), Err(RegistryError::InvalidFormat { .. }));
    assert_matches!(
        resolver.repository().parent_entity_types("INVALID_Uri"),
        Err(RegistryError::InvalidFormat { .. })
    );
    assert_matches!(
        resolver.repository().entity_type_hierarchy("INVALID_Uri", 4),
        Err(RegistryError::InvalidFormat { .. })
    );
    assert_matches!(
        resolver.repository().entity_label("INVALID_Uri"),
        Err(RegistryError::InvalidFormat { .. })
    );
    assert_eq!(store.calls(), 0);
}

#[test]
fn unknown_configuration_issues_no_queries() {
    let store = ScriptedStore::new();
    let resolver = resolver(&store);

    let err = resolver.resolve(RESOURCE, Some("missing-config")).unwrap_err();
    assert_matches!(err, RegistryError::EntityNotFound { ref id, .. } if id == "missing-config");
    assert!(err.is_not_found());
    assert_eq!(store.calls(), 0);
}

#[test]
fn type_without_shapes_resolves_to_empty_schema() {
    let store = ScriptedStore::new();
    let properties = resolver(&store).resolve(RESOURCE, None).unwrap();

    assert!(properties.is_empty());
    assert_eq!(store.calls(), 1);
}

#[test]
fn schema_query_is_scoped_to_configured_graphs() {
    let store = ScriptedStore::new();
    resolver(&store).resolve(RESOURCE, Some(support::CONFIG_ID)).unwrap();

    let query = &store.queries()[0];
    assert!(query.contains(&format!("FROM <{}>", support::METADATA_GRAPH)));
    assert!(query.contains(&format!("FROM <{}>", support::SHACL_GRAPH)));
    assert!(query.contains(&format!("FROM <{}>", support::ONTOLOGY_GRAPH)));
    assert!(query.contains("lang(?shapeValue) IN (\"en\", \"\")"));
}

#[test]
fn type_path_is_always_class_ranged() {
    let store = ScriptedStore::new().on(
        &[&schema_of(RESOURCE)],
        vec![
            shape_row("b1", shacl::PATH, iri(rdf::TYPE)),
            shape_row("b1", shacl::RANGE, lit("http://example.org/NotAClass")),
            shape_row("b2", shacl::PATH, iri(TITLE)),
            shape_row("b2", shacl::RANGE, iri("http://www.w3.org/2001/XMLSchema#string")),
        ],
    );
    let properties = resolver(&store).resolve(RESOURCE, None).unwrap();

    let type_property = properties.iter().find(|p| p.key == rdf::TYPE).unwrap();
    assert_eq!(type_property.value(shacl::RANGE), Some(owl::CLASS));
    let title = properties.iter().find(|p| p.key == TITLE).unwrap();
    assert_eq!(title.value(shacl::RANGE), Some("http://www.w3.org/2001/XMLSchema#string"));
}

#[test]
fn nested_editors_resolve_each_direct_subclass() {
    let store = ScriptedStore::new()
        .on(
            &[&schema_of(RESOURCE)],
            vec![
                shape_row("d", shacl::PATH, iri(registry::DISTRIBUTION)),
                nested_editor("d", ENDPOINT),
            ],
        )
        .on(&[&subclasses_of(ENDPOINT)], type_rows(ENDPOINT, BROWSABLE, "Browsable Endpoint"))
        .on(&[&schema_of(BROWSABLE)], vec![shape_row("a", shacl::PATH, iri(ADDRESS))]);

    let properties = resolver(&store).resolve(RESOURCE, None).unwrap();

    let distribution = &properties[0];
    assert_eq!(distribution.nested_metadata.len(), 1);
    let nested = &distribution.nested_metadata[0];
    assert_eq!(nested.key, BROWSABLE);
    assert_eq!(nested.label, "Browsable Endpoint");
    assert_eq!(nested.properties.len(), 1);
    assert_eq!(nested.properties[0].key, ADDRESS);

    // own schema, subclasses of Endpoint, schema of BrowsableEndpoint
    assert_eq!(store.calls(), 3);
}

#[test]
fn main_distribution_shares_distribution_schema() {
    let store = ScriptedStore::new()
        .on(
            &[&schema_of(RESOURCE)],
            vec![
                shape_row("d", shacl::PATH, iri(registry::DISTRIBUTION)),
                nested_editor("d", ENDPOINT),
                shape_row("m", shacl::PATH, iri(registry::MAIN_DISTRIBUTION)),
                nested_editor("m", LINK),
            ],
        )
        .on(&[&subclasses_of(ENDPOINT)], type_rows(ENDPOINT, BROWSABLE, "Browsable Endpoint"))
        .on(&[&subclasses_of(LINK)], type_rows(LINK, PLAIN_LINK, "Plain Link"))
        .on(&[&schema_of(BROWSABLE)], vec![shape_row("a", shacl::PATH, iri(ADDRESS))])
        .on(&[&schema_of(PLAIN_LINK)], vec![shape_row("t", shacl::PATH, iri(TITLE))]);

    let properties = resolver(&store).resolve(RESOURCE, None).unwrap();

    let distribution = properties.iter().find(|p| p.key == registry::DISTRIBUTION).unwrap();
    let main = properties.iter().find(|p| p.key == registry::MAIN_DISTRIBUTION).unwrap();
    assert_eq!(main.nested_metadata, distribution.nested_metadata);
    assert_eq!(main.nested_metadata[0].key, BROWSABLE);
}

#[test]
fn ambiguous_shapes_are_reported_as_notices() {
    let store = ScriptedStore::new().on(
        &[&schema_of(RESOURCE)],
        vec![
            shape_row("b1", shacl::PATH, iri(TITLE)),
            shape_row("b1", "https://pid.example.org/order", lit("1")),
            shape_row("b2", "https://pid.example.org/order", lit("2")),
            shape_row("b3", shacl::PATH, iri(TITLE)),
            shape_row("b3", "https://pid.example.org/order", lit("3")),
        ],
    );
    let schema = resolver(&store).resolve_with_notices(RESOURCE, None).unwrap();

    assert_eq!(schema.properties.len(), 1);
    assert_eq!(schema.properties[0].value("https://pid.example.org/order"), Some("3"));
    assert_eq!(
        schema.notices,
        vec![
            SchemaNotice::MissingPath {
                entity_type: RESOURCE.into(),
                shape: "b2".into()
            },
            SchemaNotice::DuplicateKey {
                entity_type: RESOURCE.into(),
                key: TITLE.into()
            },
        ]
    );
}

#[test]
fn cyclic_nesting_stops_at_the_repeated_type() {
    // BrowsableEndpoint nests Endpoint again, whose only subclass is itself
    let store = ScriptedStore::new()
        .on(
            &[&schema_of(RESOURCE)],
            vec![
                shape_row("d", shacl::PATH, iri(registry::DISTRIBUTION)),
                nested_editor("d", ENDPOINT),
            ],
        )
        .on(&[&subclasses_of(ENDPOINT)], type_rows(ENDPOINT, BROWSABLE, "Browsable Endpoint"))
        .on(
            &[&schema_of(BROWSABLE)],
            vec![
                shape_row("n", shacl::PATH, iri("https://pid.example.org/hasNested")),
                nested_editor("n", ENDPOINT),
            ],
        );

    let schema = resolver(&store).resolve_with_notices(RESOURCE, None).unwrap();

    let browsable = &schema.properties[0].nested_metadata[0];
    let repeated = &browsable.properties[0].nested_metadata[0];
    assert_eq!(repeated.key, BROWSABLE);
    assert!(repeated.properties.is_empty());
    assert_eq!(
        schema.notices,
        vec![SchemaNotice::NestedCycle {
            entity_type: BROWSABLE.into()
        }]
    );
    // the subclass lookup for Endpoint runs once
    assert_eq!(store.calls(), 3);
}

#[test]
fn nesting_stops_at_max_depth() {
    let store = ScriptedStore::new()
        .on(
            &[&schema_of(RESOURCE)],
            vec![
                shape_row("d", shacl::PATH, iri(registry::DISTRIBUTION)),
                nested_editor("d", ENDPOINT),
            ],
        )
        .on(&[&subclasses_of(ENDPOINT)], type_rows(ENDPOINT, BROWSABLE, "Browsable Endpoint"))
        .on(
            &[&schema_of(BROWSABLE)],
            vec![
                shape_row("l", shacl::PATH, iri("https://pid.example.org/hasLink")),
                nested_editor("l", LINK),
            ],
        )
        .on(&[&subclasses_of(LINK)], type_rows(LINK, PLAIN_LINK, "Plain Link"));

    let schema = resolver(&store)
        .with_max_depth(1)
        .resolve_with_notices(RESOURCE, None)
        .unwrap();

    let browsable = &schema.properties[0].nested_metadata[0];
    assert_eq!(browsable.properties.len(), 1);
    assert!(browsable.properties[0].nested_metadata.is_empty());
    assert_eq!(
        schema.notices,
        vec![SchemaNotice::NestingTruncated {
            entity_type: BROWSABLE.into(),
            depth: 1
        }]
    );
    // Link's subclasses are never fetched
    assert!(!store.queries().iter().any(|q| q.contains(&subclasses_of(LINK))));
}

#[test]
fn store_failures_propagate() {
    let resolver = MetadataSchemaResolver::new(MetadataRepository::new(support::DownStore, history()));
    assert_matches!(
        resolver.resolve(RESOURCE, None),
        Err(RegistryError::StoreUnavailable(_))
    );
}
