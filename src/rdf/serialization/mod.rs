//! RDF serialization formats
//!
//! Parsing supports Turtle and N-Triples (one graph per source). Writing
//! supports TriG and N-Quads (the whole store, named graphs included).
//!
//! Both directions go through narrow traits, [`TripleParser`] and
//! [`QuadWriter`], with default implementations backed by `rio_turtle`.

mod trig;
mod turtle;

pub use trig::RioQuadWriter;
pub use turtle::RioParser;

use super::{NamespaceManager, QuadStore, Triple};
use crate::vocab;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    /// Turtle format (.ttl)
    Turtle,
    /// N-Triples format (.nt)
    NTriples,
    /// TriG format (.trig)
    TriG,
    /// N-Quads format (.nq)
    NQuads,
}

impl RdfFormat {
    /// Guess the format from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ttl" | "turtle" => Some(Self::Turtle),
            "nt" | "ntriples" => Some(Self::NTriples),
            "trig" => Some(Self::TriG),
            "nq" | "nquads" => Some(Self::NQuads),
            _ => None,
        }
    }

    /// Whether the format can carry named graphs
    pub fn is_quad_format(self) -> bool {
        matches!(self, Self::TriG | Self::NQuads)
    }
}

impl FromStr for RdfFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| ParseError::Parse(format!("Unknown format: {s}")))
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error reported by the parser
    #[error("Syntax error: {0}")]
    Syntax(#[from] rio_turtle::TurtleError),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unsupported format
    #[error("Unsupported format: {0:?}")]
    UnsupportedFormat(RdfFormat),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0:?}")]
    UnsupportedFormat(RdfFormat),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// Turns a source into the triples of one graph
pub trait TripleParser {
    /// Parse every triple of `source`, failing on malformed input
    fn parse(&self, source: &mut dyn BufRead, format: RdfFormat) -> ParseResult<Vec<Triple>>;
}

/// Writes a whole store in a quad syntax
pub trait QuadWriter {
    /// Write `store` to `dest`, declaring `namespaces` where the syntax allows
    fn write_store(
        &self,
        store: &QuadStore,
        namespaces: &NamespaceManager,
        dest: &mut dyn Write,
        format: RdfFormat,
    ) -> SerializeResult<()>;
}

/// Boundary between a finished store and the quad writer
///
/// Registers the prefix bindings and hands the store over; it never changes
/// a statement.
pub struct SerializerAdapter<W: QuadWriter = RioQuadWriter> {
    namespaces: NamespaceManager,
    writer: W,
}

impl SerializerAdapter<RioQuadWriter> {
    /// Create an adapter using the built-in writer
    pub fn new(namespaces: NamespaceManager) -> Self {
        Self::with_writer(namespaces, RioQuadWriter)
    }
}

impl<W: QuadWriter> SerializerAdapter<W> {
    /// Create an adapter around a custom writer.
    ///
    /// `void`, `dcterms` and `schema` are always bound.
    pub fn with_writer(mut namespaces: NamespaceManager, writer: W) -> Self {
        for (prefix, iri) in [
            ("void", vocab::void::NS),
            ("dcterms", vocab::dcterms::NS),
            ("schema", vocab::schema::NS),
        ] {
            if !namespaces.contains(prefix) {
                namespaces.add_prefix(prefix, iri);
            }
        }
        Self { namespaces, writer }
    }

    /// Bindings that will be declared in the output
    pub fn namespaces(&self) -> &NamespaceManager {
        &self.namespaces
    }

    /// Serialize the store into `dest`
    pub fn write(
        &self,
        store: &QuadStore,
        dest: &mut dyn Write,
        format: RdfFormat,
    ) -> SerializeResult<()> {
        if !format.is_quad_format() {
            return Err(SerializeError::UnsupportedFormat(format));
        }
        info!(
            "Serializing {} statements in {} named graphs as {:?}",
            store.len(),
            store.graph_names().len(),
            format
        );
        self.writer.write_store(store, &self.namespaces, dest, format)?;
        dest.flush()?;
        Ok(())
    }

    /// Serialize the store into a file at `path`
    pub fn write_file(
        &self,
        store: &QuadStore,
        path: impl AsRef<Path>,
        format: RdfFormat,
    ) -> SerializeResult<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.write(store, &mut out, format)?;
        info!("Wrote {}", path.display());
        Ok(())
    }

    /// Serialize the store into a string
    pub fn write_to_string(&self, store: &QuadStore, format: RdfFormat) -> SerializeResult<String> {
        let mut out = Vec::new();
        self.write(store, &mut out, format)?;
        String::from_utf8(out).map_err(|e| SerializeError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(RdfFormat::from_extension("ttl"), Some(RdfFormat::Turtle));
        assert_eq!(RdfFormat::from_extension("NT"), Some(RdfFormat::NTriples));
        assert_eq!("trig".parse::<RdfFormat>().unwrap(), RdfFormat::TriG);
        assert!("csv".parse::<RdfFormat>().is_err());
    }

    #[test]
    fn test_adapter_binds_required_prefixes() {
        let adapter = SerializerAdapter::new(NamespaceManager::empty());
        let ns = adapter.namespaces();
        assert!(ns.contains("void"));
        assert!(ns.contains("dcterms"));
        assert!(ns.contains("schema"));
    }

    #[test]
    fn test_adapter_rejects_triple_formats() {
        let adapter = SerializerAdapter::new(NamespaceManager::new());
        let store = QuadStore::new();
        let result = adapter.write_to_string(&store, RdfFormat::Turtle);
        assert!(matches!(result, Err(SerializeError::UnsupportedFormat(RdfFormat::Turtle))));
    }

    #[test]
    fn test_io_failure_is_reported() {
        let adapter = SerializerAdapter::new(NamespaceManager::new());
        let store = QuadStore::new();
        let result = adapter.write(&store, &mut FailingSink, RdfFormat::TriG);
        assert!(matches!(result, Err(SerializeError::Io(_))));
    }
}
