//! Attribute values

use super::mapper::Entity;
use crate::rdf::{BlankNode, Literal, NamedNode, RdfObject, RdfSubject};
use std::fmt;

/// A value written to an entity attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// IRI reference
    Iri(NamedNode),
    /// Blank node reference
    Blank(BlankNode),
    /// Literal, with language tag or datatype
    Literal(Literal),
    /// Reference to another entity, remembering its kind
    Entity { subject: RdfSubject, kind: String },
}

impl Value {
    /// Plain string literal
    pub fn text(value: impl Into<String>) -> Self {
        Value::Literal(Literal::new_simple_literal(value))
    }

    /// The RDF term written for this value
    pub fn to_object(&self) -> RdfObject {
        match self {
            Value::Iri(n) => RdfObject::NamedNode(n.clone()),
            Value::Blank(b) => RdfObject::BlankNode(b.clone()),
            Value::Literal(l) => RdfObject::Literal(l.clone()),
            Value::Entity { subject, .. } => subject.clone().into(),
        }
    }

    /// Whether the value refers to a resource rather than a literal
    pub fn is_resource(&self) -> bool {
        !matches!(self, Value::Literal(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Iri(n) => write!(f, "{n}"),
            Value::Blank(b) => write!(f, "{b}"),
            Value::Literal(l) => write!(f, "{l}"),
            Value::Entity { subject, kind } => write!(f, "{subject} ({kind})"),
        }
    }
}

impl From<NamedNode> for Value {
    fn from(node: NamedNode) -> Self {
        Value::Iri(node)
    }
}

impl From<&NamedNode> for Value {
    fn from(node: &NamedNode) -> Self {
        Value::Iri(node.clone())
    }
}

impl From<BlankNode> for Value {
    fn from(node: BlankNode) -> Self {
        Value::Blank(node)
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::text(value)
    }
}

impl From<&Entity> for Value {
    fn from(entity: &Entity) -> Self {
        Value::Entity {
            subject: entity.subject().clone(),
            kind: entity.kind_name().to_string(),
        }
    }
}
