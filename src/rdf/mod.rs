//! RDF support for dataset composition
//!
//! This module provides:
//! - RDF terms and triples (wrappers around `oxrdf`)
//! - A named-graph quad store with sealing
//! - Namespace prefix management
//! - Turtle / N-Triples parsing and TriG / N-Quads writing
//!
//! # Example
//!
//! ```rust
//! use voidgraph::rdf::{NamedNode, Literal, QuadStore, RdfPredicate, Triple};
//!
//! let graph = NamedNode::new("https://data.create.humanities.uva.nl/id/adamlink/").unwrap();
//! let mut store = QuadStore::new();
//!
//! let subject = NamedNode::new("https://adamlink.nl/geo/street/damstraat/1").unwrap();
//! let predicate = RdfPredicate::new("http://www.w3.org/2000/01/rdf-schema#label").unwrap();
//! let triple = Triple::new(subject.into(), predicate, Literal::new_simple_literal("Damstraat").into());
//!
//! store.add(Some(&graph), triple.clone()).unwrap();
//! store.add(Some(&graph), triple).unwrap();
//!
//! assert_eq!(store.count(Some(&graph)), 1);
//! assert_eq!(store.len(), 1);
//! ```

mod namespace;
mod serialization;
mod store;
mod types;

pub use types::{
    BlankNode, Literal, NamedNode, RdfError, RdfObject, RdfPredicate, RdfResult, RdfSubject,
    Triple,
};

pub use store::{Graph, QuadStore, StoreError, StoreResult};

pub use namespace::{Namespace, NamespaceManager, PrefixError, PrefixResult};

pub use serialization::{
    ParseError, ParseResult, QuadWriter, RdfFormat, RioParser, RioQuadWriter, SerializeError,
    SerializeResult, SerializerAdapter, TripleParser,
};
