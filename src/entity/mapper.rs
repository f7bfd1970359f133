//! Entity mapper
//!
//! Writes entities of a declared kind into a [`QuadStore`] and reads their
//! attributes back. Every call validates all of its attributes against the
//! kind schema before the first statement is written, so a rejected call
//! leaves the store untouched.
//!
//! Cardinality decides how a write lands:
//! - single-valued: all `(subject, predicate, *)` statements are removed and
//!   the new value inserted (writing no value clears the attribute)
//! - multi-valued: one statement is appended per value, in order, and prior
//!   values are kept

use super::schema::{Cardinality, KindSchema, PropertySpec, SchemaRegistry, ValueType};
use super::value::Value;
use crate::rdf::{BlankNode, NamedNode, QuadStore, RdfObject, RdfSubject, StoreError, Triple};
use crate::vocab;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Attribute writes rejected by the kind schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// Kind is not declared
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    /// Attribute is not part of the kind
    #[error("Kind {kind} has no property {property}")]
    UnknownProperty { kind: String, property: String },

    /// Value type is not in the attribute's allowed list
    #[error("Value {value} is not allowed for {kind}.{property}")]
    DisallowedValue {
        kind: String,
        property: String,
        value: String,
    },

    /// Several values written to a single-valued attribute
    #[error("Property {property} is single-valued, got {count} values")]
    TooManyValues { property: String, count: usize },

    /// Fewer distinct values than the attribute requires
    #[error("Property {property} needs at least {required} distinct values, got {found}")]
    TooFewValues {
        property: String,
        required: usize,
        found: usize,
    },
}

/// Entity errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error(transparent)]
    Violation(#[from] SchemaViolation),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EntityResult<T> = Result<T, EntityError>;

/// Handle to an entity written into a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    subject: RdfSubject,
    kind: Arc<KindSchema>,
    graph: Option<NamedNode>,
}

impl Entity {
    /// Subject the entity's statements are written under
    pub fn subject(&self) -> &RdfSubject {
        &self.subject
    }

    /// IRI of the entity, if it is not a blank node
    pub fn iri(&self) -> Option<&NamedNode> {
        match &self.subject {
            RdfSubject::NamedNode(n) => Some(n),
            RdfSubject::BlankNode(_) => None,
        }
    }

    /// Compiled kind schema
    pub fn kind(&self) -> &KindSchema {
        &self.kind
    }

    pub fn kind_name(&self) -> &str {
        self.kind.name()
    }

    /// Graph holding the entity's statements (`None` = default graph)
    pub fn graph(&self) -> Option<&NamedNode> {
        self.graph.as_ref()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.name(), self.subject)
    }
}

/// Ordered attribute writes
///
/// Adding to an attribute that is already present extends its value list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Vec<Value>)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value to an attribute
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.with_all(name, [value])
    }

    /// Add several values to an attribute
    pub fn with_all<V: Into<Value>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.extend(values),
            None => self.entries.push((name.to_string(), values.collect())),
        }
        self
    }

    /// Values recorded for an attribute
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attribute read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValues {
    /// Single-valued attribute, `None` when unset
    Single(Option<RdfObject>),
    /// Multi-valued attribute in insertion order, duplicates included
    Multi(Vec<RdfObject>),
}

impl PropertyValues {
    /// All values as a list
    pub fn into_vec(self) -> Vec<RdfObject> {
        match self {
            PropertyValues::Single(v) => v.into_iter().collect(),
            PropertyValues::Multi(v) => v,
        }
    }
}

/// Creates entities and maps their attributes onto statements
#[derive(Debug)]
pub struct EntityMapper {
    registry: Arc<SchemaRegistry>,
    blank_prefix: String,
    counter: u64,
}

impl EntityMapper {
    /// Create a mapper over compiled kind schemas
    pub fn new(registry: impl Into<Arc<SchemaRegistry>>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            registry: registry.into(),
            blank_prefix: format!("b{}", &id[..8]),
            counter: 0,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Create an entity of `kind` in `graph`.
    ///
    /// Without `identity` a fresh blank node is minted. The entity asserts
    /// one `rdf:type` per effective class of its kind, then `attributes` are
    /// written in order.
    pub fn create(
        &mut self,
        store: &mut QuadStore,
        kind: &str,
        identity: Option<NamedNode>,
        graph: Option<&NamedNode>,
        attributes: &Attributes,
    ) -> EntityResult<Entity> {
        let schema = self
            .registry
            .kind(kind)
            .ok_or_else(|| SchemaViolation::UnknownKind(kind.to_string()))?;

        self.check(&schema, attributes)?;
        check_minimums(&schema, attributes)?;
        if store.is_sealed(graph) {
            return Err(StoreError::GraphSealed(graph_label(graph)).into());
        }

        let subject = match identity {
            Some(iri) => RdfSubject::NamedNode(iri),
            None => RdfSubject::BlankNode(self.mint()),
        };
        let entity = Entity {
            subject,
            kind: schema,
            graph: graph.cloned(),
        };

        for class in entity.kind.classes() {
            store.add(
                graph,
                Triple::new(
                    entity.subject.clone(),
                    vocab::rdf_type().into(),
                    class.clone().into(),
                ),
            )?;
        }
        write(store, &entity, attributes)?;

        debug!("Created {}", entity);
        Ok(entity)
    }

    /// Write one attribute of an existing entity
    pub fn set<V: Into<Value>>(
        &self,
        store: &mut QuadStore,
        entity: &Entity,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> EntityResult<()> {
        self.set_many(store, entity, &Attributes::new().with_all(name, values))
    }

    /// Write several attributes of an existing entity, all or nothing
    pub fn set_many(
        &self,
        store: &mut QuadStore,
        entity: &Entity,
        attributes: &Attributes,
    ) -> EntityResult<()> {
        self.check(&entity.kind, attributes)?;
        if store.is_sealed(entity.graph()) {
            return Err(StoreError::GraphSealed(graph_label(entity.graph())).into());
        }
        write(store, entity, attributes)
    }

    /// Read an attribute back
    pub fn get(&self, store: &QuadStore, entity: &Entity, name: &str) -> EntityResult<PropertyValues> {
        let spec = property(&entity.kind, name)?;
        let values: Vec<RdfObject> = store
            .graph(entity.graph())
            .into_iter()
            .flat_map(|g| g.objects(&entity.subject, &spec.predicate))
            .cloned()
            .collect();

        Ok(match spec.cardinality {
            Cardinality::Single => PropertyValues::Single(values.into_iter().last()),
            Cardinality::Multi => PropertyValues::Multi(values),
        })
    }

    /// Validate attribute writes against a kind without touching a store
    pub(crate) fn check(&self, kind: &KindSchema, attributes: &Attributes) -> EntityResult<()> {
        for (name, values) in attributes.iter() {
            let spec = property(kind, name)?;

            if spec.cardinality == Cardinality::Single && values.len() > 1 {
                return Err(SchemaViolation::TooManyValues {
                    property: name.to_string(),
                    count: values.len(),
                }
                .into());
            }

            if let Some(value) = values.iter().find(|v| !self.allows(spec, v)) {
                return Err(SchemaViolation::DisallowedValue {
                    kind: kind.name().to_string(),
                    property: name.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn allows(&self, spec: &PropertySpec, value: &Value) -> bool {
        spec.allowed.iter().any(|allowed| match (allowed, value) {
            (ValueType::Iri, v) => v.is_resource(),
            (ValueType::Literal, Value::Literal(_)) => true,
            (ValueType::Entity(target), Value::Entity { kind, .. }) => {
                self.registry.is_a(kind, target)
            }
            _ => false,
        })
    }

    fn mint(&mut self) -> BlankNode {
        self.counter += 1;
        BlankNode::new_unchecked(format!("{}x{}", self.blank_prefix, self.counter))
    }
}

fn property<'a>(kind: &'a KindSchema, name: &str) -> EntityResult<&'a PropertySpec> {
    kind.property(name).ok_or_else(|| {
        SchemaViolation::UnknownProperty {
            kind: kind.name().to_string(),
            property: name.to_string(),
        }
        .into()
    })
}

fn check_minimums(kind: &KindSchema, attributes: &Attributes) -> EntityResult<()> {
    for spec in kind.properties() {
        let Some(required) = spec.min_distinct else {
            continue;
        };
        let found = attributes
            .get(&spec.name)
            .map(|values| values.iter().map(Value::to_object).collect::<HashSet<_>>().len())
            .unwrap_or(0);
        if found < required {
            return Err(SchemaViolation::TooFewValues {
                property: spec.name.clone(),
                required,
                found,
            }
            .into());
        }
    }
    Ok(())
}

/// Write already validated attributes
pub(crate) fn write(store: &mut QuadStore, entity: &Entity, attributes: &Attributes) -> EntityResult<()> {
    let graph = entity.graph();
    for (name, values) in attributes.iter() {
        let spec = property(&entity.kind, name)?;
        match spec.cardinality {
            Cardinality::Single => {
                store.remove(graph, &entity.subject, &spec.predicate)?;
                for value in values {
                    store.add(
                        graph,
                        Triple::new(entity.subject.clone(), spec.predicate.clone(), value.to_object()),
                    )?;
                }
            }
            Cardinality::Multi => {
                for value in values {
                    store.append(
                        graph,
                        Triple::new(entity.subject.clone(), spec.predicate.clone(), value.to_object()),
                    )?;
                }
            }
        }
        debug!("Set {}.{} ({} values)", entity.subject, name, values.len());
    }
    Ok(())
}

fn graph_label(graph: Option<&NamedNode>) -> String {
    graph
        .map(|g| g.as_str().to_string())
        .unwrap_or_else(|| "(default graph)".to_string())
}
