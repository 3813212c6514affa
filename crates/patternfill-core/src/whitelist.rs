//! Namespace whitelist: which filler classes belong to an accepted,
//! species-independent vocabulary.

use patternfill_ontology::ClassIri;
use std::io;
use std::path::Path;

/// A set of accepted identifier prefixes. A candidate filler is legal iff its
/// IRI starts with one of them.
#[derive(Debug, Clone, Default)]
pub struct NamespaceWhitelist {
    prefixes: Vec<String>,
}

impl NamespaceWhitelist {
    pub fn new(prefixes: impl IntoIterator<Item = String>) -> Self {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    /// Load from a newline-separated prefix file.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(text.lines().map(str::to_string)))
    }

    pub fn is_legal(&self, class: &ClassIri) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| class.as_str().starts_with(prefix.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
