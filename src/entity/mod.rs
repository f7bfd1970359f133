//! Typed entities over RDF
//!
//! Kinds are declared in a [`SchemaTable`] and compiled once into a
//! [`SchemaRegistry`]. The [`EntityMapper`] writes entities of those kinds
//! into a quad store with explicit single/multi-valued semantics.

pub mod mapper;
pub mod schema;
pub mod value;

pub use mapper::{
    Attributes, Entity, EntityError, EntityMapper, EntityResult, PropertyValues, SchemaViolation,
};
pub use schema::{
    Cardinality, KindDecl, KindSchema, PropertyDecl, PropertySpec, SchemaError, SchemaRegistry,
    SchemaResult, SchemaTable, ValueType,
};
pub use value::Value;
