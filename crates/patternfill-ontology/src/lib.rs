//! Ontology loading and subsumption classification.
//!
//! This crate sits below the curation engine:
//!
//! - It parses OWL-shaped RDF inputs (N-Triples, Turtle, RDF/XML) via Sophia
//!   into a lightweight [`parse::Ontology`] model (named classes, asserted
//!   subclass/equivalence axioms, labels, restriction expressions).
//! - It answers subsumption queries through the [`Classification`] trait; the
//!   default implementation is [`index::SubsumptionIndex`], a transitive
//!   closure over the asserted hierarchy with equivalence-cycle condensation.
//!
//! The engine treats classification as a black box: any `Classification`
//! implementation backed by a consistent snapshot can be substituted (e.g. a
//! façade over a full reasoner). Queries are read-only, so a built index can
//! be shared across worker threads by reference.

pub mod index;
pub mod parse;

pub use index::SubsumptionIndex;
pub use parse::{
    parse_ontology_file, parse_ontology_str, ClassExpression, EquivalenceAxiom, Ontology,
    RdfFormat,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const OWL_THING_IRI: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OBO_PURL: &str = "http://purl.obolibrary.org/obo/";

/// An ontology class identifier (a full IRI). Equality is by identifier value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIri(String);

impl ClassIri {
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn owl_thing() -> Self {
        Self(OWL_THING_IRI.to_string())
    }

    pub fn is_owl_thing(&self) -> bool {
        self.0 == OWL_THING_IRI
    }

    /// Expand an OBO-style CURIE (`UBERON:0001062`) into its PURL form.
    /// Strings that already look like IRIs are taken over unchanged.
    pub fn from_curie(curie: &str) -> Self {
        let curie = curie.trim();
        if curie.contains("://") {
            Self(curie.to_string())
        } else {
            Self(format!("{OBO_PURL}{}", curie.replace(':', "_")))
        }
    }
}

impl fmt::Display for ClassIri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassIri {
    fn from(iri: &str) -> Self {
        Self::new(iri)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    /// The oracle cannot answer a query. Fatal to the whole batch run:
    /// every downstream computation depends on classification results.
    #[error("classification oracle unavailable: {0}")]
    Unavailable(String),
}

/// Subsumption queries against one consistent classification snapshot.
///
/// `ancestors` and `descendants` are *strict*: a class is never its own
/// ancestor, and equivalent classes are not reported as ancestors of each
/// other. `owl:Thing` is an implicit ancestor of every other class.
pub trait Classification {
    fn ancestors(&self, class: &ClassIri) -> Result<BTreeSet<ClassIri>, ClassificationError>;

    fn descendants(&self, class: &ClassIri) -> Result<BTreeSet<ClassIri>, ClassificationError>;

    fn is_ancestor(&self, candidate: &ClassIri, of: &ClassIri) -> Result<bool, ClassificationError> {
        Ok(self.ancestors(of)?.contains(candidate))
    }
}
