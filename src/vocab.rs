//! Vocabulary namespaces used by the dataset descriptions
//!
//! Each namespace module exposes its IRI as `NS` and a `term` constructor for
//! local names. Terms are built without validation, so local names must be
//! plain IRI path characters.

use crate::rdf::{Literal, NamedNode};
use chrono::NaiveDate;

macro_rules! namespace {
    ($(#[$meta:meta])* $name:ident, $iri:expr) => {
        $(#[$meta])*
        pub mod $name {
            use crate::rdf::NamedNode;

            pub const NS: &str = $iri;

            pub fn term(local: &str) -> NamedNode {
                NamedNode::new_unchecked(format!("{NS}{local}"))
            }
        }
    };
}

namespace!(rdf, "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
namespace!(rdfs, "http://www.w3.org/2000/01/rdf-schema#");
namespace!(xsd, "http://www.w3.org/2001/XMLSchema#");
namespace!(owl, "http://www.w3.org/2002/07/owl#");
namespace!(foaf, "http://xmlns.com/foaf/0.1/");
namespace!(dcterms, "http://purl.org/dc/terms/");
namespace!(
    /// Vocabulary of Interlinked Datasets
    void,
    "http://rdfs.org/ns/void#"
);
namespace!(schema, "http://schema.org/");
namespace!(
    /// CREATE project namespace, also the conventional default-graph name
    create,
    "https://data.create.humanities.uva.nl/"
);

/// `rdf:type`
pub fn rdf_type() -> NamedNode {
    rdf::term("type")
}

/// `owl:sameAs`
pub fn same_as() -> NamedNode {
    owl::term("sameAs")
}

/// An `xsd:integer` literal
pub fn integer_literal(value: usize) -> Literal {
    Literal::new_typed_literal(value.to_string(), xsd::term("integer"))
}

/// An `xsd:date` literal, the form used for `dateModified` and `dcterms:date`
pub fn date_literal(date: NaiveDate) -> Literal {
    Literal::new_typed_literal(date.format("%Y-%m-%d").to_string(), xsd::term("date"))
}

/// Today's date in local time as an `xsd:date` literal
pub fn today_literal() -> Literal {
    date_literal(chrono::Local::now().date_naive())
}
