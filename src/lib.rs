//! voidgraph
//!
//! Builds VoID / schema.org annotated knowledge graphs for cultural-heritage
//! datasets: dataset dumps are loaded into named graphs, described by typed
//! entities in a default metadata graph, optionally linked through symmetric
//! linksets, and written out as TriG or N-Quads.
//!
//! # Layers
//!
//! - [`rdf`]: terms, the named-graph quad store, prefixes, parsing and writing
//! - [`entity`]: kind schemas and the entity mapper (single/multi-valued
//!   attributes, type declarations, validation)
//! - [`compose`]: the graph composer and the linkset builder
//! - [`config`]: YAML build configuration
//! - [`vocab`]: vocabulary namespaces and literal helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use voidgraph::{Attributes, GraphComposer, NamedNode, RdfFormat, RioParser, SchemaRegistry};
//! use std::io::Cursor;
//!
//! let registry = SchemaRegistry::builtin().unwrap();
//! let default_graph = NamedNode::new("https://data.create.humanities.uva.nl/").unwrap();
//! let mut composer = GraphComposer::new(registry, Some(default_graph));
//!
//! // Load a dataset dump into its own graph
//! let graph = NamedNode::new("https://data.create.humanities.uva.nl/id/adamlink/").unwrap();
//! let dump = "<https://adamlink.nl/geo/street/damstraat/1> a <https://adamlink.nl/geo/Street> .";
//! composer
//!     .ingest(&graph, &RioParser::new(), &mut Cursor::new(dump), RdfFormat::NTriples)
//!     .unwrap();
//! composer.seal(&graph).unwrap();
//!
//! // Describe it
//! let dataset = composer
//!     .create_entity("Dataset", Some(graph.clone()), Attributes::new().with("name", "Adamlink"))
//!     .unwrap();
//! assert_eq!(composer.count_triples(&dataset, &graph).unwrap(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod compose;
pub mod config;
pub mod entity;
pub mod rdf;
pub mod vocab;

// Re-export main types for convenience
pub use compose::{
    read_link_pairs, ComposeError, ComposeResult, GraphComposer, IngestJob, LinkPairError,
    LinksetBuilder,
};

pub use config::{BuildConfig, ConfigError, ConfigResult};

pub use entity::{
    Attributes, Cardinality, Entity, EntityError, EntityMapper, PropertyValues, SchemaError,
    SchemaRegistry, SchemaTable, SchemaViolation, Value, ValueType,
};

pub use rdf::{
    BlankNode, Graph, Literal, NamedNode, NamespaceManager, ParseError, QuadStore, QuadWriter,
    RdfFormat, RdfObject, RdfPredicate, RdfSubject, RioParser, RioQuadWriter, SerializeError,
    SerializerAdapter, StoreError, Triple, TripleParser,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
