//! TriG / N-Quads writing

use super::{QuadWriter, RdfFormat, SerializeError, SerializeResult};
use crate::rdf::{Graph, NamedNode, NamespaceManager, QuadStore, RdfObject, RdfSubject};
use rio_api::formatter::QuadsFormatter;
use rio_api::model::{
    BlankNode as RioBlankNode, GraphName, Literal as RioLiteral, NamedNode as RioNamedNode,
    Quad as RioQuad, Subject, Term,
};
use rio_turtle::{NQuadsFormatter, TriGFormatter};
use std::io::{self, Write};

/// Quad writer backed by `rio_turtle`
///
/// The default graph comes first (under its configured name, if any), then
/// named graphs sorted by IRI so repeated runs produce identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RioQuadWriter;

impl QuadWriter for RioQuadWriter {
    fn write_store(
        &self,
        store: &QuadStore,
        namespaces: &NamespaceManager,
        dest: &mut dyn Write,
        format: RdfFormat,
    ) -> SerializeResult<()> {
        match format {
            RdfFormat::TriG => {
                for ns in namespaces.prefixes() {
                    writeln!(dest, "@prefix {}: <{}> .", ns.prefix, ns.iri)?;
                }
                writeln!(dest)?;

                let mut formatter = TriGFormatter::new(&mut *dest);
                for_each_quad(store, |quad| formatter.format(quad))?;
                formatter.finish()?;
            }
            RdfFormat::NQuads => {
                let mut formatter = NQuadsFormatter::new(&mut *dest);
                for_each_quad(store, |quad| formatter.format(quad))?;
            }
            other => return Err(SerializeError::UnsupportedFormat(other)),
        }
        Ok(())
    }
}

fn for_each_quad(
    store: &QuadStore,
    mut emit: impl FnMut(&RioQuad<'_>) -> io::Result<()>,
) -> io::Result<()> {
    let mut emit_graph = |name: Option<&NamedNode>, graph: &Graph| -> io::Result<()> {
        let graph_name = name.map(|n| GraphName::NamedNode(RioNamedNode { iri: n.as_str() }));
        for (s, p, o) in graph.iter() {
            emit(&RioQuad {
                subject: rio_subject(s),
                predicate: RioNamedNode { iri: p.as_str() },
                object: rio_term(o),
                graph_name,
            })?;
        }
        Ok(())
    };

    emit_graph(store.default_graph_name(), store.default_graph())?;

    let mut named: Vec<_> = store.named_graphs().collect();
    named.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
    for (name, graph) in named {
        emit_graph(Some(name), graph)?;
    }
    Ok(())
}

fn rio_subject(subject: &RdfSubject) -> Subject<'_> {
    match subject {
        RdfSubject::NamedNode(n) => Subject::NamedNode(RioNamedNode { iri: n.as_str() }),
        RdfSubject::BlankNode(b) => Subject::BlankNode(RioBlankNode { id: b.as_str() }),
    }
}

fn rio_term(object: &RdfObject) -> Term<'_> {
    match object {
        RdfObject::NamedNode(n) => Term::NamedNode(RioNamedNode { iri: n.as_str() }),
        RdfObject::BlankNode(b) => Term::BlankNode(RioBlankNode { id: b.as_str() }),
        RdfObject::Literal(l) => Term::Literal(if let Some(language) = l.language() {
            RioLiteral::LanguageTaggedString {
                value: l.value(),
                language,
            }
        } else if l.is_plain() {
            RioLiteral::Simple { value: l.value() }
        } else {
            RioLiteral::Typed {
                value: l.value(),
                datatype: RioNamedNode {
                    iri: l.datatype_iri(),
                },
            }
        }),
    }
}
