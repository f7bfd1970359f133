use std::fs;
use std::io::Cursor;
use voidgraph::vocab;
use voidgraph::{
    Attributes, GraphComposer, NamedNode, NamespaceManager, RdfFormat, RioParser, SchemaRegistry,
    SerializeError, SerializerAdapter,
};

const DEFAULT_GRAPH: &str = "https://data.create.humanities.uva.nl/";

fn iri(s: &str) -> NamedNode {
    NamedNode::new(s).unwrap()
}

fn built() -> GraphComposer {
    let mut composer = GraphComposer::new(SchemaRegistry::builtin().unwrap(), Some(iri(DEFAULT_GRAPH)));
    let graph = iri("https://data.create.humanities.uva.nl/id/onstage/");
    let dump = "<http://www.vondel.humanities.uva.nl/onstage/plays/1> <http://schema.org/name> \"Gijsbrecht van Aemstel\" .\n\
                <http://www.vondel.humanities.uva.nl/onstage/plays/2> <http://schema.org/name> \"Lucifer\" .\n";
    composer
        .ingest(&graph, &RioParser::new(), &mut Cursor::new(dump), RdfFormat::NTriples)
        .unwrap();
    composer.seal(&graph).unwrap();

    let ds = composer
        .create_entity("Dataset", Some(graph.clone()), Attributes::new().with("name", "Onstage"))
        .unwrap();
    composer.count_triples(&ds, &graph).unwrap();
    composer
}

#[test]
fn test_nquads_has_one_line_per_statement() -> anyhow::Result<()> {
    let composer = built();
    let store = composer.store();
    let adapter = SerializerAdapter::new(NamespaceManager::new());

    let output = adapter.write_to_string(store, RdfFormat::NQuads)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), store.len());

    // metadata first, under the default graph name
    let metadata = lines.iter().take_while(|l| l.ends_with(&format!("<{DEFAULT_GRAPH}> ."))).count();
    assert_eq!(metadata, store.default_graph().len());
    assert!(output.contains("\"2\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
    Ok(())
}

#[test]
fn test_trig_declares_required_prefixes() -> anyhow::Result<()> {
    let composer = built();
    let mut namespaces = NamespaceManager::empty();
    namespaces.add_prefix("owl", vocab::owl::NS);
    let adapter = SerializerAdapter::new(namespaces);

    let output = adapter.write_to_string(composer.store(), RdfFormat::TriG)?;
    for prefix in ["owl", "void", "dcterms", "schema"] {
        assert!(
            output.contains(&format!("@prefix {prefix}: <")),
            "missing prefix {prefix}"
        );
    }
    assert!(output.contains("<https://data.create.humanities.uva.nl/id/onstage/>"));
    assert!(output.contains("\"Lucifer\""));
    Ok(())
}

#[test]
fn test_serialization_does_not_change_the_store() -> anyhow::Result<()> {
    let composer = built();
    let before = composer.store().len();
    let adapter = SerializerAdapter::new(NamespaceManager::new());

    let first = adapter.write_to_string(composer.store(), RdfFormat::TriG)?;
    let second = adapter.write_to_string(composer.store(), RdfFormat::TriG)?;
    assert_eq!(first, second);
    assert_eq!(composer.store().len(), before);
    Ok(())
}

#[test]
fn test_write_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("create.trig");
    let store = built().into_store();

    SerializerAdapter::new(NamespaceManager::new()).write_file(&store, &path, RdfFormat::TriG)?;

    let written = fs::read_to_string(&path)?;
    assert!(written.starts_with("@prefix"));
    assert!(written.contains("<https://data.create.humanities.uva.nl/id/onstage/>"));
    Ok(())
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("create.trig");
    let store = built().into_store();

    let result = SerializerAdapter::new(NamespaceManager::new()).write_file(&store, &path, RdfFormat::TriG);
    assert!(matches!(result, Err(SerializeError::Io(_))));
}
