//! Entity kind schemas
//!
//! A [`SchemaTable`] is plain configuration: per kind, the RDF classes every
//! instance asserts, an optional parent kind, and the attribute table
//! (predicate, cardinality, allowed value types). [`SchemaRegistry::compile`]
//! turns it into effective schemas once, folding every ancestor's classes and
//! attributes into each kind.

use crate::rdf::{NamedNode, NamespaceManager, RdfPredicate};
use crate::vocab;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Schema compilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Parent kind is not declared
    #[error("Kind {kind} extends unknown kind {parent}")]
    UnknownParent { kind: String, parent: String },

    /// Inheritance chain loops back on itself
    #[error("Inheritance cycle through kind {0}")]
    Cycle(String),

    /// An allowed value type names an undeclared kind
    #[error("Property {kind}.{property} references unknown kind {target}")]
    UnknownKindReference {
        kind: String,
        property: String,
        target: String,
    },

    /// A class or predicate is not a valid IRI
    #[error("Invalid IRI in kind {kind}: {iri}")]
    InvalidIri { kind: String, iri: String },

    /// A value type string could not be read
    #[error("Invalid value type: {0}")]
    InvalidValueType(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// How many values an attribute holds per subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// One value, each write replaces the previous one
    Single,
    /// Ordered values, each write appends
    Multi,
}

/// A permitted value type for an attribute
///
/// Written in configuration as `iri`, `literal` or `entity:<Kind>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    /// An IRI reference
    Iri,
    /// A literal, with or without language tag or datatype
    Literal,
    /// An entity of the named kind or one of its descendants
    Entity(String),
}

impl ValueType {
    /// Shorthand for `ValueType::Entity`
    pub fn entity(kind: impl Into<String>) -> Self {
        Self::Entity(kind.into())
    }
}

impl TryFrom<String> for ValueType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "iri" => Ok(Self::Iri),
            "literal" => Ok(Self::Literal),
            other => match other.strip_prefix("entity:") {
                Some(kind) if !kind.is_empty() => Ok(Self::Entity(kind.to_string())),
                _ => Err(SchemaError::InvalidValueType(value)),
            },
        }
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Iri => write!(f, "iri"),
            ValueType::Literal => write!(f, "literal"),
            ValueType::Entity(kind) => write!(f, "entity:{kind}"),
        }
    }
}

fn any_value() -> Vec<ValueType> {
    vec![ValueType::Iri, ValueType::Literal]
}

/// Declared attribute of a kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Predicate IRI, absolute or `prefix:local`
    pub predicate: String,
    /// Single or multi valued
    pub cardinality: Cardinality,
    /// Allowed value types, IRI or literal when omitted
    #[serde(default = "any_value")]
    pub allowed: Vec<ValueType>,
    /// Minimum number of distinct values required when an entity is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distinct: Option<usize>,
}

impl PropertyDecl {
    fn new(predicate: NamedNode, cardinality: Cardinality, allowed: Vec<ValueType>) -> Self {
        Self {
            predicate: predicate.as_str().to_string(),
            cardinality,
            allowed,
            min_distinct: None,
        }
    }

    /// Single-valued attribute accepting the given types
    pub fn single(predicate: NamedNode, allowed: Vec<ValueType>) -> Self {
        Self::new(predicate, Cardinality::Single, allowed)
    }

    /// Multi-valued attribute accepting the given types
    pub fn multi(predicate: NamedNode, allowed: Vec<ValueType>) -> Self {
        Self::new(predicate, Cardinality::Multi, allowed)
    }

    /// Require at least `min` distinct values at creation
    pub fn with_min_distinct(mut self, min: usize) -> Self {
        self.min_distinct = Some(min);
        self
    }
}

/// Declared entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDecl {
    /// Parent kind whose classes and attributes are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// RDF classes asserted for every instance
    #[serde(default)]
    pub classes: Vec<String>,
    /// Attribute name -> declaration
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDecl>,
}

/// Schema declarations for every entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
    pub kinds: IndexMap<String, KindDecl>,
}

impl SchemaTable {
    /// The VoID / schema.org kinds: `Dataset`, `DataDownload` and `Linkset`
    pub fn builtin() -> Self {
        use vocab::{dcterms, rdfs, schema, void};
        use ValueType::{Iri, Literal};

        let any = any_value;
        let dataset = || ValueType::entity("Dataset");

        let mut ds = IndexMap::new();
        let mut p = |name: &str, decl: PropertyDecl| {
            ds.insert(name.to_string(), decl);
        };

        p("label", PropertyDecl::multi(rdfs::term("label"), any()));

        // schema.org
        p("name", PropertyDecl::multi(schema::term("name"), any()));
        p("description", PropertyDecl::multi(schema::term("description"), any()));
        p("alternateName", PropertyDecl::multi(schema::term("alternateName"), any()));
        p("creator", PropertyDecl::multi(schema::term("creator"), vec![Iri]));
        p("citation", PropertyDecl::multi(schema::term("citation"), vec![Literal, Iri]));
        p("hasPart", PropertyDecl::multi(schema::term("hasPart"), vec![Iri, dataset()]));
        p("isPartOf", PropertyDecl::single(schema::term("isPartOf"), vec![Iri, dataset()]));
        p("identifier", PropertyDecl::multi(schema::term("identifier"), vec![Iri, Literal]));
        p("keywords", PropertyDecl::multi(schema::term("keywords"), vec![Literal]));
        p("license", PropertyDecl::multi(schema::term("license"), vec![Iri]));
        p("sameAs", PropertyDecl::multi(schema::term("sameAs"), vec![Iri]));
        p("spatialCoverage", PropertyDecl::multi(schema::term("spatialCoverage"), vec![Literal, Iri]));
        p("temporalCoverage", PropertyDecl::multi(schema::term("temporalCoverage"), vec![Literal]));
        p("variableMeasured", PropertyDecl::multi(schema::term("variableMeasured"), vec![Literal, Iri]));
        p("version", PropertyDecl::multi(schema::term("version"), vec![Literal]));
        p("url", PropertyDecl::multi(schema::term("url"), vec![Iri]));
        p("image", PropertyDecl::single(schema::term("image"), vec![Iri]));
        p(
            "distribution",
            PropertyDecl::multi(schema::term("distribution"), vec![ValueType::entity("DataDownload")]),
        );
        p("dateModified", PropertyDecl::single(schema::term("dateModified"), any()));

        // dcterms
        p("dctitle", PropertyDecl::multi(dcterms::term("title"), any()));
        p("dcdescription", PropertyDecl::multi(dcterms::term("description"), any()));
        p("dccreator", PropertyDecl::multi(dcterms::term("creator"), any()));
        p("dcpublisher", PropertyDecl::multi(dcterms::term("publisher"), any()));
        p("dccontributor", PropertyDecl::multi(dcterms::term("contributor"), any()));
        p("dcsource", PropertyDecl::single(dcterms::term("source"), any()));
        p("dcdate", PropertyDecl::single(dcterms::term("date"), any()));
        p("dccreated", PropertyDecl::single(dcterms::term("created"), any()));
        p("dcissued", PropertyDecl::single(dcterms::term("issued"), any()));
        p("dcmodified", PropertyDecl::single(dcterms::term("modified"), any()));

        // void
        p("dataDump", PropertyDecl::single(void::term("dataDump"), vec![Iri]));
        p("sparqlEndpoint", PropertyDecl::single(void::term("sparqlEndpoint"), vec![Iri]));
        p("exampleResource", PropertyDecl::single(void::term("exampleResource"), vec![Iri]));
        p("vocabulary", PropertyDecl::multi(void::term("vocabulary"), vec![Iri]));
        p("triples", PropertyDecl::single(void::term("triples"), vec![Literal]));
        p("inDataset", PropertyDecl::single(void::term("inDataset"), vec![Iri, dataset()]));
        p("subset", PropertyDecl::multi(void::term("subset"), vec![Iri, dataset()]));

        let mut kinds = IndexMap::new();
        kinds.insert(
            "Dataset".to_string(),
            KindDecl {
                extends: None,
                classes: vec![
                    void::term("Dataset").as_str().to_string(),
                    schema::term("Dataset").as_str().to_string(),
                ],
                properties: ds,
            },
        );
        kinds.insert(
            "DataDownload".to_string(),
            KindDecl {
                extends: None,
                classes: vec![schema::term("DataDownload").as_str().to_string()],
                properties: IndexMap::from([
                    (
                        "contentUrl".to_string(),
                        PropertyDecl::single(schema::term("contentUrl"), vec![Iri]),
                    ),
                    (
                        "encodingFormat".to_string(),
                        PropertyDecl::single(schema::term("encodingFormat"), vec![Literal]),
                    ),
                ]),
            },
        );
        kinds.insert(
            "Linkset".to_string(),
            KindDecl {
                extends: Some("Dataset".to_string()),
                classes: vec![void::term("Linkset").as_str().to_string()],
                properties: IndexMap::from([
                    (
                        "target".to_string(),
                        PropertyDecl::multi(void::term("target"), vec![Iri, dataset()])
                            .with_min_distinct(2),
                    ),
                    (
                        "linkPredicate".to_string(),
                        PropertyDecl::multi(void::term("linkPredicate"), vec![Iri]),
                    ),
                ]),
            },
        );

        Self { kinds }
    }
}

/// Effective attribute of a compiled kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: String,
    pub predicate: RdfPredicate,
    pub cardinality: Cardinality,
    pub allowed: Vec<ValueType>,
    pub min_distinct: Option<usize>,
}

/// Effective schema of a kind, ancestors folded in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSchema {
    name: String,
    lineage: Vec<String>,
    classes: Vec<NamedNode>,
    properties: IndexMap<String, PropertySpec>,
}

impl KindSchema {
    /// Kind name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This kind followed by its ancestors, nearest first
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Own classes first, then inherited ones, without duplicates
    pub fn classes(&self) -> &[NamedNode] {
        &self.classes
    }

    /// Look up an attribute by name
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// All effective attributes
    pub fn properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.values()
    }

    /// Whether this kind is `kind` or descends from it
    pub fn is_a(&self, kind: &str) -> bool {
        self.lineage.iter().any(|k| k == kind)
    }
}

/// Compiled kind schemas
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    kinds: IndexMap<String, Arc<KindSchema>>,
}

impl SchemaRegistry {
    /// Compile the built-in VoID / schema.org kinds
    pub fn builtin() -> SchemaResult<Self> {
        Self::compile(&SchemaTable::builtin(), &NamespaceManager::new())
    }

    /// Resolve inheritance and IRIs for every kind of `table`.
    ///
    /// Compact IRIs are expanded with `namespaces`.
    pub fn compile(table: &SchemaTable, namespaces: &NamespaceManager) -> SchemaResult<Self> {
        let mut kinds = IndexMap::new();

        for name in table.kinds.keys() {
            let lineage = Self::lineage(table, name)?;

            let mut classes: Vec<NamedNode> = Vec::new();
            let mut properties: IndexMap<String, PropertySpec> = IndexMap::new();

            for kind in &lineage {
                let decl = &table.kinds[kind.as_str()];
                for class in &decl.classes {
                    let class = Self::iri(namespaces, name, class)?;
                    if !classes.contains(&class) {
                        classes.push(class);
                    }
                }
            }

            // root first so descendants override inherited attributes
            for kind in lineage.iter().rev() {
                let decl = &table.kinds[kind.as_str()];
                for (prop_name, prop) in &decl.properties {
                    for allowed in &prop.allowed {
                        if let ValueType::Entity(target) = allowed {
                            if !table.kinds.contains_key(target) {
                                return Err(SchemaError::UnknownKindReference {
                                    kind: kind.clone(),
                                    property: prop_name.clone(),
                                    target: target.clone(),
                                });
                            }
                        }
                    }
                    let predicate = Self::iri(namespaces, name, &prop.predicate)?;
                    properties.insert(
                        prop_name.clone(),
                        PropertySpec {
                            name: prop_name.clone(),
                            predicate: predicate.into(),
                            cardinality: prop.cardinality,
                            allowed: prop.allowed.clone(),
                            min_distinct: prop.min_distinct,
                        },
                    );
                }
            }

            kinds.insert(
                name.clone(),
                Arc::new(KindSchema {
                    name: name.clone(),
                    lineage,
                    classes,
                    properties,
                }),
            );
        }

        Ok(Self { kinds })
    }

    fn lineage(table: &SchemaTable, name: &str) -> SchemaResult<Vec<String>> {
        let mut lineage = vec![name.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([name]);
        let mut current = name;

        while let Some(parent) = table.kinds[current].extends.as_deref() {
            if !table.kinds.contains_key(parent) {
                return Err(SchemaError::UnknownParent {
                    kind: current.to_string(),
                    parent: parent.to_string(),
                });
            }
            if !seen.insert(parent) {
                return Err(SchemaError::Cycle(name.to_string()));
            }
            lineage.push(parent.to_string());
            current = parent;
        }

        Ok(lineage)
    }

    fn iri(namespaces: &NamespaceManager, kind: &str, iri: &str) -> SchemaResult<NamedNode> {
        let invalid = || SchemaError::InvalidIri {
            kind: kind.to_string(),
            iri: iri.to_string(),
        };
        let resolved = namespaces.resolve(iri).map_err(|_| invalid())?;
        NamedNode::new(&resolved).map_err(|_| invalid())
    }

    /// Look up a compiled kind
    pub fn kind(&self, name: &str) -> Option<Arc<KindSchema>> {
        self.kinds.get(name).cloned()
    }

    /// Names of all kinds
    pub fn kind_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Whether `kind` is `ancestor` or descends from it
    pub fn is_a(&self, kind: &str, ancestor: &str) -> bool {
        self.kinds
            .get(kind)
            .map(|k| k.is_a(ancestor))
            .unwrap_or(false)
    }
}
