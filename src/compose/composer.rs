//! Graph composer
//!
//! Owns the quad store and the entity mapper for one build. Dataset graphs
//! are attached or ingested, sealed, then described by entities in the
//! default graph.

use crate::entity::{
    mapper, Attributes, Entity, EntityError, EntityMapper, PropertyValues, SchemaRegistry,
    SchemaViolation, Value,
};
use crate::rdf::{
    Graph, NamedNode, ParseError, ParseResult, QuadStore, RdfFormat, StoreError, Triple,
    TripleParser,
};
use crate::vocab;
use rayon::prelude::*;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Composition errors
#[derive(Error, Debug)]
pub enum ComposeError {
    /// A source could not be parsed; nothing from it was kept
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] ParseError),

    /// A graph was counted before ingestion into it finished
    #[error("Graph {graph} must be sealed before counting")]
    OrderingViolation { graph: String },

    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<EntityError> for ComposeError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::Violation(v) => ComposeError::Schema(v),
            EntityError::Store(s) => ComposeError::Store(s),
        }
    }
}

pub type ComposeResult<T> = Result<T, ComposeError>;

/// Sources parsed into one named graph by [`GraphComposer::ingest_parallel`]
pub struct IngestJob {
    graph: NamedNode,
    sources: Vec<(RdfFormat, Box<dyn BufRead + Send>)>,
}

impl IngestJob {
    /// Create a job without sources
    pub fn new(graph: NamedNode) -> Self {
        Self {
            graph,
            sources: Vec::new(),
        }
    }

    /// Add an in-memory or streamed source
    pub fn with_source(mut self, format: RdfFormat, source: impl BufRead + Send + 'static) -> Self {
        self.sources.push((format, Box::new(source)));
        self
    }

    /// Add a file, guessing its format from the extension
    pub fn with_file(self, path: impl AsRef<Path>) -> ParseResult<Self> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(RdfFormat::from_extension)
            .ok_or_else(|| ParseError::Parse(format!("Unknown RDF format: {}", path.display())))?;
        let file = File::open(path)?;
        Ok(self.with_source(format, BufReader::new(file)))
    }

    pub fn graph(&self) -> &NamedNode {
        &self.graph
    }

    fn run(self, parser: &(dyn TripleParser + Sync)) -> ParseResult<(NamedNode, Graph)> {
        let mut graph = Graph::new();
        for (format, mut source) in self.sources {
            for triple in parser.parse(&mut *source, format)? {
                graph.insert(triple);
            }
        }
        Ok((self.graph, graph))
    }
}

impl fmt::Debug for IngestJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestJob")
            .field("graph", &self.graph)
            .field("sources", &self.sources.len())
            .finish()
    }
}

/// Builds one multi-graph store with its dataset descriptions
#[derive(Debug)]
pub struct GraphComposer {
    store: QuadStore,
    mapper: EntityMapper,
}

impl GraphComposer {
    /// Create a composer over compiled kinds.
    ///
    /// `default_graph_name` is the IRI the metadata graph is written under.
    pub fn new(registry: SchemaRegistry, default_graph_name: Option<NamedNode>) -> Self {
        let store = match default_graph_name {
            Some(name) => QuadStore::with_default_graph_name(name),
            None => QuadStore::new(),
        };
        Self {
            store,
            mapper: EntityMapper::new(registry),
        }
    }

    pub fn store(&self) -> &QuadStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut QuadStore {
        &mut self.store
    }

    /// Hand the finished store over, typically to the serializer
    pub fn into_store(self) -> QuadStore {
        self.store
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.mapper.registry()
    }

    /// Register an already parsed graph under `name`.
    ///
    /// The graph stays open. A graph already registered under `name` is
    /// replaced and returned. The default graph's name is rejected.
    pub fn attach_named_graph(
        &mut self,
        name: NamedNode,
        triples: impl IntoIterator<Item = Triple>,
    ) -> ComposeResult<Option<Graph>> {
        self.store.check_graph_name(&name)?;
        let graph = Graph::from_triples(triples);
        info!("Attached graph {} ({} statements)", name, graph.len());
        let replaced = self.store.insert_graph(name.clone(), graph)?;
        if replaced.is_some() {
            warn!("Replaced existing graph {}", name);
        }
        Ok(replaced)
    }

    /// Parse `source` into the named graph `name`.
    ///
    /// Statements are merged only once the whole source parsed, so a failed
    /// parse leaves the graph as it was. Repeated calls add to the same
    /// graph until it is sealed. Returns the number of new statements.
    pub fn ingest(
        &mut self,
        name: &NamedNode,
        parser: &dyn TripleParser,
        source: &mut dyn BufRead,
        format: RdfFormat,
    ) -> ComposeResult<usize> {
        self.store.check_graph_name(name)?;
        if self.store.is_sealed(Some(name)) {
            return Err(StoreError::GraphSealed(name.as_str().to_string()).into());
        }

        let staged = parser.parse(source, format)?;
        let parsed = staged.len();

        let graph = self.store.graph_mut(Some(name))?;
        let mut added = 0;
        for triple in staged {
            if graph.insert(triple) {
                added += 1;
            }
        }

        info!("Ingested {} of {} parsed statements into {}", added, parsed, name);
        Ok(added)
    }

    /// Parse several graphs concurrently, one worker per job.
    ///
    /// Results are attached and sealed in job order once every job finished;
    /// if any job fails nothing is attached. Returns the total number of
    /// statements attached.
    pub fn ingest_parallel(
        &mut self,
        jobs: Vec<IngestJob>,
        parser: &(dyn TripleParser + Sync),
    ) -> ComposeResult<usize> {
        for job in &jobs {
            self.store.check_graph_name(job.graph())?;
            if self.store.is_sealed(Some(job.graph())) {
                return Err(StoreError::GraphSealed(job.graph().as_str().to_string()).into());
            }
        }

        let count = jobs.len();
        let graphs: Vec<(NamedNode, Graph)> = jobs
            .into_par_iter()
            .map(|job| job.run(parser))
            .collect::<ParseResult<_>>()?;

        let mut total = 0;
        for (name, graph) in graphs {
            total += graph.len();
            info!("Attached graph {} ({} statements)", name, graph.len());
            if self.store.insert_graph(name.clone(), graph)?.is_some() {
                warn!("Replaced existing graph {}", name);
            }
            self.store.seal(Some(&name))?;
        }

        info!("Parallel ingestion of {} graphs finished, {} statements", count, total);
        Ok(total)
    }

    /// Mark a named graph read-only
    pub fn seal(&mut self, name: &NamedNode) -> ComposeResult<()> {
        self.store.check_graph_name(name)?;
        if self.store.graph(Some(name)).is_none() {
            return Err(StoreError::GraphNotFound(name.as_str().to_string()).into());
        }
        self.store.seal(Some(name))?;
        info!("Sealed graph {}", name);
        Ok(())
    }

    /// Create an entity in the default graph
    pub fn create_entity(
        &mut self,
        kind: &str,
        identity: Option<NamedNode>,
        attributes: Attributes,
    ) -> ComposeResult<Entity> {
        self.create_entity_in(kind, identity, None, attributes)
    }

    /// Create an entity in `graph`
    pub fn create_entity_in(
        &mut self,
        kind: &str,
        identity: Option<NamedNode>,
        graph: Option<&NamedNode>,
        attributes: Attributes,
    ) -> ComposeResult<Entity> {
        Ok(self
            .mapper
            .create(&mut self.store, kind, identity, graph, &attributes)?)
    }

    /// Write one attribute of an entity
    pub fn set<V: Into<Value>>(
        &mut self,
        entity: &Entity,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> ComposeResult<()> {
        Ok(self.mapper.set(&mut self.store, entity, name, values)?)
    }

    /// Write several attributes of an entity, all or nothing
    pub fn set_many(&mut self, entity: &Entity, attributes: &Attributes) -> ComposeResult<()> {
        Ok(self.mapper.set_many(&mut self.store, entity, attributes)?)
    }

    /// Read an attribute of an entity
    pub fn get(&self, entity: &Entity, name: &str) -> ComposeResult<PropertyValues> {
        Ok(self.mapper.get(&self.store, entity, name)?)
    }

    /// Validate attribute writes for `kind` without touching the store
    pub fn check(&self, kind: &str, attributes: &Attributes) -> ComposeResult<()> {
        let schema = self
            .registry()
            .kind(kind)
            .ok_or_else(|| SchemaViolation::UnknownKind(kind.to_string()))?;
        Ok(self.mapper.check(&schema, attributes)?)
    }

    /// Record `child` as part of `parent`.
    ///
    /// Writes `hasPart` and `subset` on the parent, `isPartOf` and
    /// `inDataset` on the child. All four are validated before any is
    /// written.
    pub fn link_child(&mut self, parent: &Entity, child: &Entity) -> ComposeResult<()> {
        let down = Attributes::new()
            .with("hasPart", child)
            .with("subset", child);
        let up = Attributes::new()
            .with("isPartOf", parent)
            .with("inDataset", parent);

        self.mapper.check(parent.kind(), &down)?;
        self.mapper.check(child.kind(), &up)?;
        for graph in [parent.graph(), child.graph()] {
            if self.store.is_sealed(graph) {
                let label = graph.map(|g| g.as_str()).unwrap_or("(default graph)");
                return Err(StoreError::GraphSealed(label.to_string()).into());
            }
        }

        mapper::write(&mut self.store, parent, &down)?;
        mapper::write(&mut self.store, child, &up)?;
        Ok(())
    }

    /// Set the `triples` attribute of `entity` from the graph `name`.
    ///
    /// The value is the number of distinct subjects. The graph must exist and
    /// be sealed.
    pub fn count_triples(&mut self, entity: &Entity, name: &NamedNode) -> ComposeResult<usize> {
        let graph = self
            .store
            .graph(Some(name))
            .ok_or_else(|| StoreError::GraphNotFound(name.as_str().to_string()))?;
        if !graph.is_sealed() {
            return Err(ComposeError::OrderingViolation {
                graph: name.as_str().to_string(),
            });
        }

        let count = graph.subject_count();
        self.set(entity, "triples", [vocab::integer_literal(count)])?;
        info!("Counted {} subjects in {}", count, name);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, RdfObject, RioParser};
    use std::io::Cursor;

    fn iri(s: &str) -> NamedNode {
        NamedNode::new(s).unwrap()
    }

    fn composer() -> GraphComposer {
        GraphComposer::new(
            SchemaRegistry::builtin().unwrap(),
            Some(iri("https://data.create.humanities.uva.nl/")),
        )
    }

    const STREETS: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:a a ex:Street .
    "#;

    #[test]
    fn test_count_requires_sealed_graph() {
        let mut composer = composer();
        let g1 = iri("http://example.org/G1");
        composer
            .ingest(&g1, &RioParser::new(), &mut Cursor::new(STREETS), RdfFormat::Turtle)
            .unwrap();
        let ds = composer.create_entity("Dataset", Some(g1.clone()), Attributes::new()).unwrap();

        let err = composer.count_triples(&ds, &g1).unwrap_err();
        assert!(matches!(err, ComposeError::OrderingViolation { .. }));

        composer.seal(&g1).unwrap();
        assert_eq!(composer.count_triples(&ds, &g1).unwrap(), 1);
        assert_eq!(
            composer.get(&ds, "triples").unwrap(),
            PropertyValues::Single(Some(RdfObject::Literal(vocab::integer_literal(1))))
        );
    }

    #[test]
    fn test_count_missing_graph() {
        let mut composer = composer();
        let ds = composer.create_entity("Dataset", None, Attributes::new()).unwrap();
        let err = composer.count_triples(&ds, &iri("http://example.org/none")).unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::GraphNotFound(_))));
    }

    #[test]
    fn test_failed_parse_keeps_graph_unchanged() {
        let mut composer = composer();
        let g = iri("http://example.org/G");
        composer
            .ingest(&g, &RioParser::new(), &mut Cursor::new(STREETS), RdfFormat::Turtle)
            .unwrap();

        let broken = "<http://example.org/b> a <http://example.org/Street> .\n<http://example.org/c> a";
        let err = composer
            .ingest(&g, &RioParser::new(), &mut Cursor::new(broken), RdfFormat::Turtle)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Ingestion(_)));
        assert_eq!(composer.store().count(Some(&g)), 1);
    }

    #[test]
    fn test_sealed_graph_rejects_ingest() {
        let mut composer = composer();
        let g = iri("http://example.org/G");
        composer.attach_named_graph(g.clone(), Vec::new()).unwrap();
        composer.seal(&g).unwrap();

        let err = composer
            .ingest(&g, &RioParser::new(), &mut Cursor::new(STREETS), RdfFormat::Turtle)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::GraphSealed(_))));
    }

    #[test]
    fn test_seal_unknown_graph() {
        let mut composer = composer();
        let err = composer.seal(&iri("http://example.org/none")).unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::GraphNotFound(_))));
    }

    #[test]
    fn test_attach_replaces() {
        let mut composer = composer();
        let g = iri("http://example.org/G");
        let t = |s: &str| {
            Triple::new(
                iri(s).into(),
                vocab::rdf_type().into(),
                iri("http://example.org/Street").into(),
            )
        };

        assert!(composer
            .attach_named_graph(g.clone(), vec![t("http://example.org/a")])
            .unwrap()
            .is_none());
        let replaced = composer
            .attach_named_graph(g.clone(), vec![t("http://example.org/b"), t("http://example.org/c")])
            .unwrap()
            .unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(composer.store().count(Some(&g)), 2);
    }

    #[test]
    fn test_link_child_writes_both_directions() {
        let mut composer = composer();
        let parent = composer
            .create_entity("Dataset", Some(iri("https://ex.org/parent")), Attributes::new())
            .unwrap();
        let child = composer
            .create_entity("Dataset", Some(iri("https://ex.org/child")), Attributes::new())
            .unwrap();

        composer.link_child(&parent, &child).unwrap();

        let child_obj: RdfObject = iri("https://ex.org/child").into();
        let parent_obj: RdfObject = iri("https://ex.org/parent").into();
        assert_eq!(
            composer.get(&parent, "hasPart").unwrap(),
            PropertyValues::Multi(vec![child_obj.clone()])
        );
        assert_eq!(
            composer.get(&parent, "subset").unwrap(),
            PropertyValues::Multi(vec![child_obj])
        );
        assert_eq!(
            composer.get(&child, "isPartOf").unwrap(),
            PropertyValues::Single(Some(parent_obj.clone()))
        );
        assert_eq!(
            composer.get(&child, "inDataset").unwrap(),
            PropertyValues::Single(Some(parent_obj))
        );
    }

    #[test]
    fn test_link_child_rejects_non_dataset_without_writing() {
        let mut composer = composer();
        let parent = composer.create_entity("Dataset", None, Attributes::new()).unwrap();
        let download = composer.create_entity("DataDownload", None, Attributes::new()).unwrap();
        let before = composer.store().len();

        let err = composer.link_child(&parent, &download).unwrap_err();
        assert!(matches!(err, ComposeError::Schema(SchemaViolation::UnknownProperty { .. })));
        assert_eq!(composer.store().len(), before);
    }

    #[test]
    fn test_ingest_parallel_attaches_in_order() {
        let mut composer = composer();
        let jobs = vec![
            IngestJob::new(iri("http://example.org/G2")).with_source(
                RdfFormat::NTriples,
                Cursor::new("<http://example.org/x> <http://example.org/p> \"1\" .\n"),
            ),
            IngestJob::new(iri("http://example.org/G1"))
                .with_source(RdfFormat::Turtle, Cursor::new(STREETS))
                .with_source(
                    RdfFormat::NTriples,
                    Cursor::new("<http://example.org/b> <http://example.org/p> \"2\" .\n"),
                ),
        ];

        let total = composer.ingest_parallel(jobs, &RioParser::new()).unwrap();
        assert_eq!(total, 3);
        assert_eq!(
            composer.store().graph_names(),
            vec![iri("http://example.org/G2"), iri("http://example.org/G1")]
        );
        assert!(composer.store().is_sealed(Some(&iri("http://example.org/G1"))));
        assert_eq!(composer.store().count(Some(&iri("http://example.org/G1"))), 2);
    }

    #[test]
    fn test_ingest_parallel_failure_attaches_nothing() {
        let mut composer = composer();
        let jobs = vec![
            IngestJob::new(iri("http://example.org/G1"))
                .with_source(RdfFormat::Turtle, Cursor::new(STREETS)),
            IngestJob::new(iri("http://example.org/G2"))
                .with_source(RdfFormat::NTriples, Cursor::new("<http://example.org/x> .\n")),
        ];

        let err = composer.ingest_parallel(jobs, &RioParser::new()).unwrap_err();
        assert!(matches!(err, ComposeError::Ingestion(_)));
        assert!(composer.store().graph_names().is_empty());
    }

    #[test]
    fn test_entities_live_in_default_graph() {
        let mut composer = composer();
        let ds = composer
            .create_entity(
                "Dataset",
                None,
                Attributes::new().with(
                    "name",
                    Literal::new_language_tagged_literal("Adamlink", "en").unwrap(),
                ),
            )
            .unwrap();

        assert!(ds.graph().is_none());
        assert_eq!(composer.store().count(None), 1);
        assert_eq!(composer.store().default_graph().len(), 3);
    }

    #[test]
    fn test_default_graph_name_is_reserved() {
        let mut composer = composer();
        let default_name = iri("https://data.create.humanities.uva.nl/");
        composer.create_entity("Dataset", None, Attributes::new()).unwrap();
        let before = composer.store().default_graph().len();

        let err = composer.attach_named_graph(default_name.clone(), Vec::new()).unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::ReservedGraphName(_))));

        let err = composer
            .ingest(&default_name, &RioParser::new(), &mut Cursor::new(STREETS), RdfFormat::Turtle)
            .unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::ReservedGraphName(_))));

        // a malformed source shows the name is checked before parsing
        let jobs = vec![
            IngestJob::new(iri("http://example.org/G1"))
                .with_source(RdfFormat::Turtle, Cursor::new(STREETS)),
            IngestJob::new(default_name.clone())
                .with_source(RdfFormat::NTriples, Cursor::new("<http://example.org/x> .\n")),
        ];
        let err = composer.ingest_parallel(jobs, &RioParser::new()).unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::ReservedGraphName(_))));

        let err = composer.seal(&default_name).unwrap_err();
        assert!(matches!(err, ComposeError::Store(StoreError::ReservedGraphName(_))));

        assert_eq!(composer.store().default_graph().len(), before);
        assert!(!composer.store().is_sealed(None));
        assert!(composer.store().graph_names().is_empty());
        composer.create_entity("Dataset", None, Attributes::new()).unwrap();
    }
}
