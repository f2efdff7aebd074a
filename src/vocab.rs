//! Namespace and term constants used by the queries and transforms

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SH_NS: &str = "http://www.w3.org/ns/shacl#";
pub const TOSH_NS: &str = "http://topbraid.org/tosh#";
pub const DASH_NS: &str = "http://datashapes.org/dash#";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const PID_NS: &str = "https://pid.bayer.com/kos/19050/";

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
}

pub mod owl {
    pub const CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
}

pub mod shacl {
    pub const PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
    pub const PATH: &str = "http://www.w3.org/ns/shacl#path";
    pub const RANGE: &str = "http://www.w3.org/ns/shacl#range";
    pub const GROUP: &str = "http://www.w3.org/ns/shacl#group";
}

pub mod topbraid {
    pub const EDIT_WIDGET: &str = "http://topbraid.org/tosh#editWidget";
    pub const NESTED_OBJECT_EDITOR: &str = "http://topbraid.org/tosh#NestedObjectEditor";
}

pub mod dash {
    pub const ABSTRACT: &str = "http://datashapes.org/dash#abstract";
}

pub mod skos {
    pub const BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";
    pub const PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
}

/// Registry vocabulary for resources, identifiers and graph configurations
pub mod registry {
    pub const PID_URI: &str = "http://pid.bayer.com/kos/19050/hasPID";
    pub const BASE_URI: &str = "https://pid.bayer.com/kos/19050/hasBaseURI";
    pub const HAS_NETWORK_ADDRESS: &str = "http://pid.bayer.com/kos/19050/hasNetworkAddress";
    pub const DISTRIBUTION: &str = "https://pid.bayer.com/kos/19050/distribution";
    pub const MAIN_DISTRIBUTION: &str = "https://pid.bayer.com/kos/19050/mainDistribution";
    pub const FIRST_RESOURCE_TYPE: &str = "https://pid.bayer.com/kos/19050/PID_Concept";

    pub const METADATA_GRAPH_CONFIGURATION: &str =
        "https://pid.bayer.com/kos/19050/MetadataGraphConfiguration";
    pub const HAS_START_DATE_TIME: &str = "https://pid.bayer.com/kos/19050/hasStartDateTime";
    pub const HAS_METADATA_GRAPH: &str = "https://pid.bayer.com/kos/19050/hasMetadataGraph";
    pub const HAS_SHACL_CONSTRAINTS_GRAPH: &str =
        "https://pid.bayer.com/kos/19050/hasShaclConstraintsGraph";
    pub const HAS_ECO_GRAPH: &str = "https://pid.bayer.com/kos/19050/hasECOGraph";
    pub const HAS_CONSUMER_GROUP_GRAPH: &str =
        "https://pid.bayer.com/kos/19050/hasConsumerGroupGraph";
}

/// PREFIX block prepended to every query template
pub fn prefix_block() -> String {
    [
        ("rdf", RDF_NS),
        ("rdfs", RDFS_NS),
        ("owl", OWL_NS),
        ("xsd", XSD_NS),
        ("sh", SH_NS),
        ("tosh", TOSH_NS),
        ("dash", DASH_NS),
        ("skos", SKOS_NS),
        ("pid", PID_NS),
    ]
    .iter()
    .map(|(prefix, iri)| format!("PREFIX {}: <{}>\n", prefix, iri))
    .collect()
}
