//! Named-graph composition
//!
//! [`GraphComposer`] collects dataset graphs into one store and describes
//! them; [`LinksetBuilder`] adds symmetric identity-link graphs.

mod composer;
mod linkset;

pub use composer::{ComposeError, ComposeResult, GraphComposer, IngestJob};
pub use linkset::{read_link_pairs, LinkPairError, LinksetBuilder};
