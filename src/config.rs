//! Build configuration
//!
//! Loaded from YAML (or JSON, by file extension). Every field has a default,
//! so an empty document is a valid configuration.

use crate::compose::GraphComposer;
use crate::entity::{SchemaError, SchemaRegistry, SchemaTable};
use crate::rdf::{NamedNode, NamespaceManager, RdfError, RdfFormat};
use crate::vocab;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid default graph: {0}")]
    InvalidIri(#[from] RdfError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Output must be a quad format
    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(RdfFormat),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// IRI the default (metadata) graph is written under
    pub default_graph: Option<String>,
    /// Extra prefix bindings, on top of the common ones
    pub prefixes: IndexMap<String, String>,
    /// `trig` or `nquads`
    pub output_format: RdfFormat,
    /// Schema table replacing the built-in kinds
    pub schema: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            default_graph: Some(vocab::create::NS.to_string()),
            prefixes: IndexMap::from([
                ("owl".to_string(), vocab::owl::NS.to_string()),
                ("foaf".to_string(), vocab::foaf::NS.to_string()),
            ]),
            output_format: RdfFormat::TriG,
            schema: None,
        }
    }
}

impl BuildConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a `.json` file or a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        info!("Loaded build configuration from {}", path.display());
        Ok(config)
    }

    /// Check the output format and the default graph IRI
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.output_format.is_quad_format() {
            return Err(ConfigError::UnsupportedFormat(self.output_format));
        }
        self.default_graph_name()?;
        Ok(())
    }

    pub fn default_graph_name(&self) -> ConfigResult<Option<NamedNode>> {
        Ok(self
            .default_graph
            .as_deref()
            .map(NamedNode::new)
            .transpose()?)
    }

    /// Common bindings plus the configured prefixes
    pub fn namespaces(&self) -> NamespaceManager {
        let mut namespaces = NamespaceManager::new();
        for (prefix, iri) in &self.prefixes {
            namespaces.add_prefix(prefix.clone(), iri.clone());
        }
        namespaces
    }

    /// The configured schema table, or the built-in one
    pub fn schema_table(&self) -> ConfigResult<SchemaTable> {
        match &self.schema {
            Some(path) => load_schema_table(path),
            None => Ok(SchemaTable::builtin()),
        }
    }

    /// Compile the schema table against the configured prefixes
    pub fn registry(&self) -> ConfigResult<SchemaRegistry> {
        Ok(SchemaRegistry::compile(&self.schema_table()?, &self.namespaces())?)
    }
}

/// Load a schema table from YAML or JSON
pub fn load_schema_table(path: impl AsRef<Path>) -> ConfigResult<SchemaTable> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let table: SchemaTable = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    info!("Loaded {} kinds from {}", table.kinds.len(), path.display());
    Ok(table)
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

impl GraphComposer {
    /// Create a composer from a build configuration
    pub fn from_config(config: &BuildConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(config.registry()?, config.default_graph_name()?))
    }
}
