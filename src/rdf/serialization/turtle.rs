//! Turtle / N-Triples parsing

use super::{ParseError, ParseResult, RdfFormat, TripleParser};
use crate::rdf::{BlankNode, Literal, NamedNode, RdfObject, RdfPredicate, RdfSubject, Triple};
use oxiri::Iri;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleParser};
use std::io::BufRead;

/// Parser backed by `rio_turtle`
#[derive(Debug, Clone, Default)]
pub struct RioParser {
    base_iri: Option<String>,
}

impl RioParser {
    /// Create a parser without base IRI
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser resolving relative IRIs against `base_iri`
    pub fn with_base_iri(base_iri: impl Into<String>) -> Self {
        Self {
            base_iri: Some(base_iri.into()),
        }
    }

    fn base(&self) -> ParseResult<Option<Iri<String>>> {
        self.base_iri
            .as_ref()
            .map(|base| Iri::parse(base.clone()).map_err(|e| ParseError::Parse(e.to_string())))
            .transpose()
    }
}

impl TripleParser for RioParser {
    fn parse(&self, source: &mut dyn BufRead, format: RdfFormat) -> ParseResult<Vec<Triple>> {
        let mut triples = Vec::new();

        let res: ParseResult<()> = match format {
            RdfFormat::Turtle => TurtleParser::new(source, self.base()?).parse_all(&mut |t| {
                triples.push(convert_triple(t)?);
                Ok(())
            }),
            RdfFormat::NTriples => NTriplesParser::new(source).parse_all(&mut |t| {
                triples.push(convert_triple(t)?);
                Ok(())
            }),
            other => return Err(ParseError::UnsupportedFormat(other)),
        };

        res.map(|_| triples)
    }
}

fn convert_triple(t: rio_api::model::Triple) -> ParseResult<Triple> {
    Ok(Triple::new(
        convert_subject(t.subject)?,
        convert_predicate(t.predicate)?,
        convert_object(t.object)?,
    ))
}

fn convert_subject(s: rio_api::model::Subject) -> ParseResult<RdfSubject> {
    match s {
        rio_api::model::Subject::NamedNode(n) => Ok(RdfSubject::NamedNode(convert_named_node(n)?)),
        rio_api::model::Subject::BlankNode(b) => Ok(RdfSubject::BlankNode(
            BlankNode::from_str(b.id).map_err(|e| ParseError::Parse(e.to_string()))?,
        )),
        _ => Err(ParseError::Parse("Unsupported subject type".to_string())),
    }
}

fn convert_named_node(n: rio_api::model::NamedNode) -> ParseResult<NamedNode> {
    NamedNode::new(n.iri).map_err(|e| ParseError::Parse(e.to_string()))
}

fn convert_predicate(p: rio_api::model::NamedNode) -> ParseResult<RdfPredicate> {
    Ok(convert_named_node(p)?.into())
}

fn convert_object(o: rio_api::model::Term) -> ParseResult<RdfObject> {
    match o {
        rio_api::model::Term::NamedNode(n) => Ok(RdfObject::NamedNode(convert_named_node(n)?)),
        rio_api::model::Term::BlankNode(b) => Ok(RdfObject::BlankNode(
            BlankNode::from_str(b.id).map_err(|e| ParseError::Parse(e.to_string()))?,
        )),
        rio_api::model::Term::Literal(l) => {
            let literal = match l {
                rio_api::model::Literal::Simple { value } => Literal::new_simple_literal(value),
                rio_api::model::Literal::LanguageTaggedString { value, language } => {
                    Literal::new_language_tagged_literal(value, language)
                        .map_err(|e| ParseError::Parse(e.to_string()))?
                }
                rio_api::model::Literal::Typed { value, datatype } => {
                    Literal::new_typed_literal(value, convert_named_node(datatype)?)
                }
            };
            Ok(RdfObject::Literal(literal))
        }
        _ => Err(ParseError::Parse("Unsupported object type".to_string())),
    }
}
