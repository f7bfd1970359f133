//! Linksets
//!
//! A linkset is a named graph of identity links between resources of two or
//! more datasets, described by a `Linkset` entity in the default graph whose
//! identity is the graph name.

use super::composer::{ComposeResult, GraphComposer};
use crate::entity::{Attributes, Entity, SchemaViolation, Value};
use crate::rdf::{NamedNode, RdfError, StoreError, Triple};
use std::collections::HashSet;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::info;

/// Builds a symmetric link graph plus its `Linkset` description
#[derive(Debug, Clone)]
pub struct LinksetBuilder {
    graph: NamedNode,
    predicate: NamedNode,
}

impl LinksetBuilder {
    /// Links are written into `graph` with `predicate`, e.g. `owl:sameAs`
    pub fn new(graph: NamedNode, predicate: NamedNode) -> Self {
        Self { graph, predicate }
    }

    pub fn graph(&self) -> &NamedNode {
        &self.graph
    }

    pub fn predicate(&self) -> &NamedNode {
        &self.predicate
    }

    /// Write both directions of every pair, seal the graph and describe it.
    ///
    /// `targets` are the datasets being linked (at least two distinct ones),
    /// recorded once each in first-seen order. The description, `attributes`
    /// and both graphs involved are checked before the first link is
    /// written. Pairs are not deduplicated.
    pub fn build(
        &self,
        composer: &mut GraphComposer,
        pairs: impl IntoIterator<Item = (NamedNode, NamedNode)>,
        targets: impl IntoIterator<Item = Value>,
        attributes: Attributes,
    ) -> ComposeResult<Entity> {
        let mut seen = HashSet::new();
        let targets: Vec<Value> = targets
            .into_iter()
            .filter(|t| seen.insert(t.to_object()))
            .collect();
        if targets.len() < 2 {
            return Err(SchemaViolation::TooFewValues {
                property: "target".to_string(),
                required: 2,
                found: targets.len(),
            }
            .into());
        }

        let attributes = attributes
            .with_all("target", targets)
            .with("linkPredicate", &self.predicate);
        composer.check("Linkset", &attributes)?;
        composer.store().check_graph_name(&self.graph)?;
        if composer.store().is_sealed(Some(&self.graph)) {
            return Err(StoreError::GraphSealed(self.graph.as_str().to_string()).into());
        }
        if composer.store().is_sealed(None) {
            return Err(StoreError::GraphSealed("(default graph)".to_string()).into());
        }

        let links = link_graph(composer, &self.graph, &self.predicate, pairs)?;
        composer.seal(&self.graph)?;

        let linkset = composer.create_entity("Linkset", Some(self.graph.clone()), attributes)?;
        info!("Built linkset {} with {} link statements", self.graph, links);
        Ok(linkset)
    }
}

/// Append `(a, p, b)` and `(b, p, a)` for every pair; returns the number of
/// statements written
fn link_graph(
    composer: &mut GraphComposer,
    graph: &NamedNode,
    predicate: &NamedNode,
    pairs: impl IntoIterator<Item = (NamedNode, NamedNode)>,
) -> ComposeResult<usize> {
    let store = composer.store_mut();
    store.ensure_graph(graph)?;

    let mut written = 0;
    for (a, b) in pairs {
        store.append(
            Some(graph),
            Triple::new(a.clone().into(), predicate.clone().into(), b.clone().into()),
        )?;
        store.append(
            Some(graph),
            Triple::new(b.into(), predicate.clone().into(), a.into()),
        )?;
        written += 2;
    }
    Ok(written)
}

/// Link table errors
#[derive(Error, Debug)]
pub enum LinkPairError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Header lacks a required column
    #[error("Missing column: {0}")]
    MissingColumn(&'static str),

    /// Row has fewer fields than the header requires
    #[error("Line {line}: missing field")]
    MissingField { line: usize },

    #[error("Line {line}: {source}")]
    InvalidIri { line: usize, source: RdfError },
}

/// Read link pairs from a comma-separated table with a `uri1,uri2` header.
///
/// Columns are located by header name, other columns are ignored. Fields may
/// be double-quoted, in which case they may contain commas and `""` stands
/// for a literal quote. Records span a single line. Blank lines are skipped.
pub fn read_link_pairs(reader: impl BufRead) -> Result<Vec<(NamedNode, NamedNode)>, LinkPairError> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(LinkPairError::MissingColumn("uri1")),
    };
    let columns = split_row(&header);
    let position = |name: &'static str| {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or(LinkPairError::MissingColumn(name))
    };
    let (first, second) = (position("uri1")?, position("uri2")?);

    let mut pairs = Vec::new();
    for (index, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = index + 1;
        let fields = split_row(&line);
        let iri = |col: usize| -> Result<NamedNode, LinkPairError> {
            let field = fields
                .get(col)
                .filter(|f| !f.is_empty())
                .ok_or(LinkPairError::MissingField { line: row })?;
            NamedNode::new(field.as_str()).map_err(|source| LinkPairError::InvalidIri { line: row, source })
        };
        pairs.push((iri(first)?, iri(second)?));
    }
    Ok(pairs)
}

/// Split one record on commas outside double quotes
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposeError;
    use crate::entity::{PropertyValues, SchemaRegistry};
    use crate::vocab;
    use std::io::Cursor;

    fn iri(s: &str) -> NamedNode {
        NamedNode::new(s).unwrap()
    }

    fn composer() -> GraphComposer {
        GraphComposer::new(SchemaRegistry::builtin().unwrap(), None)
    }

    #[test]
    fn test_build_writes_both_directions() {
        let mut composer = composer();
        let graph = iri("https://ex.org/linkset/");
        let builder = LinksetBuilder::new(graph.clone(), vocab::same_as());

        let linkset = builder
            .build(
                &mut composer,
                vec![
                    (iri("https://ex.org/u1"), iri("https://ex.org/u2")),
                    (iri("https://ex.org/u1"), iri("https://ex.org/u2")),
                ],
                vec![Value::from(iri("https://ex.org/ds1")), Value::from(iri("https://ex.org/ds2"))],
                Attributes::new().with("name", "Persons"),
            )
            .unwrap();

        let links = composer.store().graph(Some(&graph)).unwrap();
        assert_eq!(links.len(), 4);
        assert!(links.is_sealed());
        assert_eq!(linkset.iri(), Some(&graph));
        assert_eq!(
            composer.get(&linkset, "linkPredicate").unwrap(),
            PropertyValues::Multi(vec![vocab::same_as().into()])
        );
    }

    #[test]
    fn test_too_few_targets_writes_nothing() {
        let mut composer = composer();
        let graph = iri("https://ex.org/linkset/");
        let builder = LinksetBuilder::new(graph.clone(), vocab::same_as());

        let err = builder
            .build(
                &mut composer,
                vec![(iri("https://ex.org/u1"), iri("https://ex.org/u2"))],
                vec![Value::from(iri("https://ex.org/ds1")), Value::from(iri("https://ex.org/ds1"))],
                Attributes::new(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ComposeError::Schema(SchemaViolation::TooFewValues { found: 1, .. })
        ));
        assert!(composer.store().graph(Some(&graph)).is_none());
        assert!(composer.store().is_empty());
    }

    #[test]
    fn test_invalid_attribute_writes_no_links() {
        let mut composer = composer();
        let graph = iri("https://ex.org/linkset/");
        let builder = LinksetBuilder::new(graph.clone(), vocab::same_as());

        let err = builder
            .build(
                &mut composer,
                vec![(iri("https://ex.org/u1"), iri("https://ex.org/u2"))],
                vec![Value::from(iri("https://ex.org/ds1")), Value::from(iri("https://ex.org/ds2"))],
                Attributes::new().with("license", "CC0"),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ComposeError::Schema(SchemaViolation::DisallowedValue { .. })
        ));
        assert!(composer.store().graph(Some(&graph)).is_none());
    }

    #[test]
    fn test_read_link_pairs() {
        let table = "uri2,uri1,score\n\
                     https://ex.org/b1,https://ex.org/a1,0.9\n\
                     \n\
                     \"https://ex.org/b2\",\"https://ex.org/a2\",0.8\n";
        let pairs = read_link_pairs(Cursor::new(table)).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.as_str(), "https://ex.org/a1");
        assert_eq!(pairs[0].1.as_str(), "https://ex.org/b1");
        assert_eq!(pairs[1].0.as_str(), "https://ex.org/a2");
    }

    #[test]
    fn test_missing_header_column() {
        let err = read_link_pairs(Cursor::new("left,right\nhttps://a,https://b\n")).unwrap_err();
        assert!(matches!(err, LinkPairError::MissingColumn("uri1")));

        let err = read_link_pairs(Cursor::new("")).unwrap_err();
        assert!(matches!(err, LinkPairError::MissingColumn(_)));
    }

    #[test]
    fn test_bad_rows_report_line() {
        let err = read_link_pairs(Cursor::new("uri1,uri2\nhttps://ex.org/a\n")).unwrap_err();
        assert!(matches!(err, LinkPairError::MissingField { line: 2 }));

        let err = read_link_pairs(Cursor::new("uri1,uri2\nhttps://ex.org/a,not an iri\n")).unwrap_err();
        assert!(matches!(err, LinkPairError::InvalidIri { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_targets_are_recorded_once() {
        let mut composer = composer();
        let (a, b) = (iri("https://ex.org/ds1"), iri("https://ex.org/ds2"));

        let linkset = LinksetBuilder::new(iri("https://ex.org/linkset/"), vocab::same_as())
            .build(
                &mut composer,
                vec![(iri("https://ex.org/u1"), iri("https://ex.org/u2"))],
                vec![Value::from(a.clone()), Value::from(b.clone()), Value::from(a.clone())],
                Attributes::new(),
            )
            .unwrap();

        assert_eq!(
            composer.get(&linkset, "target").unwrap(),
            PropertyValues::Multi(vec![a.into(), b.into()])
        );
    }

    #[test]
    fn test_default_graph_as_link_graph_writes_nothing() {
        let default_name = iri("https://data.create.humanities.uva.nl/");
        let mut composer =
            GraphComposer::new(SchemaRegistry::builtin().unwrap(), Some(default_name.clone()));
        composer.create_entity("Dataset", None, Attributes::new()).unwrap();
        let before = composer.store().len();

        let err = LinksetBuilder::new(default_name, vocab::same_as())
            .build(
                &mut composer,
                vec![(iri("https://ex.org/u1"), iri("https://ex.org/u2"))],
                vec![Value::from(iri("https://ex.org/ds1")), Value::from(iri("https://ex.org/ds2"))],
                Attributes::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ComposeError::Store(StoreError::ReservedGraphName(_))));
        assert_eq!(composer.store().len(), before);
        assert!(!composer.store().is_sealed(None));
    }

    #[test]
    fn test_sealed_default_graph_writes_no_links() {
        let mut composer = composer();
        composer.store_mut().seal(None).unwrap();
        let graph = iri("https://ex.org/linkset/");

        let err = LinksetBuilder::new(graph.clone(), vocab::same_as())
            .build(
                &mut composer,
                vec![(iri("https://ex.org/u1"), iri("https://ex.org/u2"))],
                vec![Value::from(iri("https://ex.org/ds1")), Value::from(iri("https://ex.org/ds2"))],
                Attributes::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ComposeError::Store(StoreError::GraphSealed(_))));
        assert!(composer.store().graph(Some(&graph)).is_none());
        assert!(composer.store().is_empty());
    }

    #[test]
    fn test_quoted_fields_keep_commas_and_quotes() {
        let table = "uri1,note,uri2\n\
                     \"https://ex.org/a?x=1,2\",\"said \"\"hi\"\", twice\",https://ex.org/b\n";
        let pairs = read_link_pairs(Cursor::new(table)).unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.as_str(), "https://ex.org/a?x=1,2");
        assert_eq!(pairs[0].1.as_str(), "https://ex.org/b");
        assert_eq!(
            split_row(r#""a""b",c"#),
            vec!["a\"b".to_string(), "c".to_string()]
        );
    }
}
