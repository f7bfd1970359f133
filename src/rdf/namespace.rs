//! RDF namespace and prefix management
//!
//! This module handles namespace prefixes for compact IRI notation and for
//! the prefix declarations written at the top of serialized output.

use crate::vocab;
use indexmap::IndexMap;
use thiserror::Error;

/// Prefix errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Namespace (prefix → IRI mapping)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix
    pub prefix: String,
    /// IRI
    pub iri: String,
}

impl Namespace {
    /// Create a new namespace
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            iri: iri.into(),
        }
    }
}

/// Namespace manager with common prefixes
///
/// Bindings keep their registration order; rebinding a prefix replaces its
/// IRI in place.
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    /// Prefix → IRI mappings
    prefixes: IndexMap<String, String>,
}

impl NamespaceManager {
    /// Create a new namespace manager with common prefixes
    pub fn new() -> Self {
        let mut mgr = Self::empty();

        mgr.add_prefix("rdf", vocab::rdf::NS);
        mgr.add_prefix("rdfs", vocab::rdfs::NS);
        mgr.add_prefix("xsd", vocab::xsd::NS);
        mgr.add_prefix("owl", vocab::owl::NS);
        mgr.add_prefix("foaf", vocab::foaf::NS);
        mgr.add_prefix("dcterms", vocab::dcterms::NS);
        mgr.add_prefix("void", vocab::void::NS);
        mgr.add_prefix("schema", vocab::schema::NS);

        mgr
    }

    /// Create a manager without any bindings
    pub fn empty() -> Self {
        Self {
            prefixes: IndexMap::new(),
        }
    }

    /// Add a prefix
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Check whether a prefix is bound
    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Get IRI for a prefix
    pub fn get_iri(&self, prefix: &str) -> PrefixResult<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))
    }

    /// Expand a compact IRI (prefix:local) to full IRI
    pub fn expand(&self, compact_iri: &str) -> PrefixResult<String> {
        if let Some(pos) = compact_iri.find(':') {
            let prefix = &compact_iri[..pos];
            let local = &compact_iri[pos + 1..];
            let iri = self.get_iri(prefix)?;
            Ok(format!("{}{}", iri, local))
        } else {
            Err(PrefixError::InvalidIri(compact_iri.to_string()))
        }
    }

    /// Expand a compact IRI, or pass an absolute IRI through unchanged
    pub fn resolve(&self, iri: &str) -> PrefixResult<String> {
        match self.expand(iri) {
            Ok(expanded) => Ok(expanded),
            Err(PrefixError::UnknownPrefix(_)) if iri.contains("://") || iri.starts_with("urn:") => {
                Ok(iri.to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Get all registered prefixes
    pub fn prefixes(&self) -> Vec<Namespace> {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| Namespace::new(prefix.clone(), iri.clone()))
            .collect()
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}
