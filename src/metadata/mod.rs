//! Entity type lookups and metadata schema resolution

pub mod repository;
pub mod schema;

pub use repository::{InstantiableTypes, MetadataRepository};
pub use schema::{MetadataSchemaResolver, ResolvedSchema, SchemaNotice, DEFAULT_MAX_DEPTH};
