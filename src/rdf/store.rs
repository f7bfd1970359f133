//! Named-graph quad store
//!
//! This module provides the in-memory store the composer builds into: one
//! default (metadata) graph plus any number of named graphs, each owning its
//! own statements.

use super::types::{NamedNode, RdfObject, RdfPredicate, RdfSubject, Triple};
use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Graph not found
    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    /// Graph is sealed and accepts no more statements
    #[error("Graph is sealed: {0}")]
    GraphSealed(String),

    /// Name belongs to the default graph and cannot be used for a named graph
    #[error("Graph name is reserved for the default graph: {0}")]
    ReservedGraphName(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

fn graph_label(name: Option<&NamedNode>) -> String {
    name.map(|n| n.as_str().to_string())
        .unwrap_or_else(|| "(default graph)".to_string())
}

/// Statements of one subject: ordered entries plus a membership index
#[derive(Debug, Clone, Default)]
struct Statements {
    entries: Vec<(RdfPredicate, RdfObject)>,
    present: HashSet<(RdfPredicate, RdfObject)>,
}

/// A set of statements grouped by subject
///
/// Subjects keep their first-seen order and each subject keeps the insertion
/// order of its statements, so multi-valued attributes read back in the order
/// they were written.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    statements: IndexMap<RdfSubject, Statements>,
    len: usize,
    sealed: bool,
}

impl Graph {
    /// Create an empty, open graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from triples with set semantics
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut graph = Self::new();
        for triple in triples {
            graph.insert(triple);
        }
        graph
    }

    /// Insert a triple unless an identical one is already present.
    ///
    /// Returns `true` if the triple was added.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let statements = self.statements.entry(triple.subject).or_default();
        let pair = (triple.predicate, triple.object);
        if statements.present.contains(&pair) {
            return false;
        }
        statements.present.insert(pair.clone());
        statements.entries.push(pair);
        self.len += 1;
        true
    }

    /// Append a triple, keeping duplicates as separate statements
    pub fn append(&mut self, triple: Triple) {
        let statements = self.statements.entry(triple.subject).or_default();
        let pair = (triple.predicate, triple.object);
        statements.present.insert(pair.clone());
        statements.entries.push(pair);
        self.len += 1;
    }

    /// Remove every statement with the given subject and predicate.
    ///
    /// Returns the number of statements removed.
    pub fn remove(&mut self, subject: &RdfSubject, predicate: &RdfPredicate) -> usize {
        let Some(statements) = self.statements.get_mut(subject) else {
            return 0;
        };
        let before = statements.entries.len();
        statements.entries.retain(|(p, _)| p != predicate);
        statements.present.retain(|(p, _)| p != predicate);
        let removed = before - statements.entries.len();
        if statements.entries.is_empty() {
            self.statements.shift_remove(subject);
        }
        self.len -= removed;
        removed
    }

    /// Check whether the exact statement is present
    pub fn contains(&self, triple: &Triple) -> bool {
        self.statements
            .get(&triple.subject)
            .map(|statements| {
                statements
                    .present
                    .contains(&(triple.predicate.clone(), triple.object.clone()))
            })
            .unwrap_or(false)
    }

    /// Objects of `(subject, predicate, *)` in insertion order
    pub fn objects<'a>(
        &'a self,
        subject: &RdfSubject,
        predicate: &'a RdfPredicate,
    ) -> impl Iterator<Item = &'a RdfObject> + 'a {
        self.statements
            .get(subject)
            .into_iter()
            .flat_map(move |statements| {
                statements
                    .entries
                    .iter()
                    .filter(move |(p, _)| p == predicate)
                    .map(|(_, o)| o)
            })
    }

    /// Distinct subjects, in first-seen order
    pub fn subjects(&self) -> impl Iterator<Item = &RdfSubject> {
        self.statements.keys()
    }

    /// Number of distinct subjects
    pub fn subject_count(&self) -> usize {
        self.statements.len()
    }

    /// All statements, grouped by subject
    pub fn iter(&self) -> impl Iterator<Item = (&RdfSubject, &RdfPredicate, &RdfObject)> {
        self.statements
            .iter()
            .flat_map(|(s, statements)| statements.entries.iter().map(move |(p, o)| (s, p, o)))
    }

    /// Number of statements (duplicates included)
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the graph holds no statements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether ingestion into this graph has finished
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn seal(&mut self) {
        self.sealed = true;
    }
}

/// Default graph plus named graphs
///
/// The default graph is addressed with `None`. It may carry a name that is
/// only used when the store is serialized; addressing the store with that
/// name also resolves to the default graph.
#[derive(Debug, Clone, Default)]
pub struct QuadStore {
    default_graph: Graph,
    default_graph_name: Option<NamedNode>,
    named: IndexMap<NamedNode, Graph>,
}

impl QuadStore {
    /// Create an empty store with an unnamed default graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose default graph is written under `name`
    pub fn with_default_graph_name(name: NamedNode) -> Self {
        Self {
            default_graph_name: Some(name),
            ..Self::default()
        }
    }

    /// Name of the default graph, if configured
    pub fn default_graph_name(&self) -> Option<&NamedNode> {
        self.default_graph_name.as_ref()
    }

    fn is_default(&self, graph: Option<&NamedNode>) -> bool {
        match graph {
            None => true,
            Some(name) => self.default_graph_name.as_ref() == Some(name),
        }
    }

    /// Look up a graph; `None` is the default graph
    pub fn graph(&self, graph: Option<&NamedNode>) -> Option<&Graph> {
        match graph {
            _ if self.is_default(graph) => Some(&self.default_graph),
            Some(name) => self.named.get(name),
            None => None,
        }
    }

    /// The default (metadata) graph
    pub fn default_graph(&self) -> &Graph {
        &self.default_graph
    }

    /// Get a graph for writing, creating a missing named graph.
    ///
    /// Fails if the graph is sealed.
    pub fn graph_mut(&mut self, graph: Option<&NamedNode>) -> StoreResult<&mut Graph> {
        let target = match graph {
            Some(name) if !self.is_default(graph) => {
                self.named.entry(name.clone()).or_default()
            }
            _ => &mut self.default_graph,
        };
        if target.is_sealed() {
            return Err(StoreError::GraphSealed(graph_label(graph)));
        }
        Ok(target)
    }

    /// Insert a triple into a graph with set semantics
    pub fn add(&mut self, graph: Option<&NamedNode>, triple: Triple) -> StoreResult<bool> {
        Ok(self.graph_mut(graph)?.insert(triple))
    }

    /// Append a triple to a graph, keeping duplicates
    pub fn append(&mut self, graph: Option<&NamedNode>, triple: Triple) -> StoreResult<()> {
        self.graph_mut(graph)?.append(triple);
        Ok(())
    }

    /// Remove all `(subject, predicate, *)` statements from a graph
    pub fn remove(
        &mut self,
        graph: Option<&NamedNode>,
        subject: &RdfSubject,
        predicate: &RdfPredicate,
    ) -> StoreResult<usize> {
        Ok(self.graph_mut(graph)?.remove(subject, predicate))
    }

    /// Make sure a named graph exists, even if empty
    pub fn ensure_graph(&mut self, name: &NamedNode) -> StoreResult<()> {
        self.graph_mut(Some(name)).map(|_| ())
    }

    /// Fail if `name` is the name of the default graph
    pub fn check_graph_name(&self, name: &NamedNode) -> StoreResult<()> {
        if self.is_default(Some(name)) {
            return Err(StoreError::ReservedGraphName(name.as_str().to_string()));
        }
        Ok(())
    }

    /// Register a named graph under `name`, replacing any previous graph.
    ///
    /// Returns the replaced graph. The default graph cannot be replaced.
    pub fn insert_graph(&mut self, name: NamedNode, graph: Graph) -> StoreResult<Option<Graph>> {
        self.check_graph_name(&name)?;
        Ok(self.named.insert(name, graph))
    }

    /// Mark a graph as read-only
    pub fn seal(&mut self, graph: Option<&NamedNode>) -> StoreResult<()> {
        let target = match graph {
            _ if self.is_default(graph) => Some(&mut self.default_graph),
            Some(name) => self.named.get_mut(name),
            None => None,
        };
        target
            .map(Graph::seal)
            .ok_or_else(|| StoreError::GraphNotFound(graph_label(graph)))
    }

    /// Whether a graph exists and is sealed
    pub fn is_sealed(&self, graph: Option<&NamedNode>) -> bool {
        self.graph(graph).map(Graph::is_sealed).unwrap_or(false)
    }

    /// Distinct subjects of a graph (empty if the graph does not exist)
    pub fn subjects(&self, graph: Option<&NamedNode>) -> impl Iterator<Item = &RdfSubject> {
        self.graph(graph).into_iter().flat_map(Graph::subjects)
    }

    /// Number of distinct subjects in a graph
    pub fn count(&self, graph: Option<&NamedNode>) -> usize {
        self.graph(graph).map(Graph::subject_count).unwrap_or(0)
    }

    /// Named graphs in registration order
    pub fn named_graphs(&self) -> impl Iterator<Item = (&NamedNode, &Graph)> {
        self.named.iter()
    }

    /// Names of all named graphs
    pub fn graph_names(&self) -> Vec<NamedNode> {
        self.named.keys().cloned().collect()
    }

    /// Total number of statements across all graphs
    pub fn len(&self) -> usize {
        self.default_graph.len() + self.named.values().map(Graph::len).sum::<usize>()
    }

    /// Check if the store holds no statements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
