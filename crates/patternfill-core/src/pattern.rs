//! Pattern definitions: which anchor class each slot is bound to.
//!
//! A pattern is a YAML document in the DOSDP style:
//!
//! ```yaml
//! pattern_name: abnormalAnatomicalEntity
//! classes:
//!   anatomical entity: "UBERON:0001062"
//!   quality: "PATO:0000001"
//! vars:
//!   anatomical_entity: "'anatomical entity'"
//!   quality: "'quality'"
//! ```
//!
//! `vars` maps slot names (the match-table columns) to class names, which in
//! turn resolve through `classes` to CURIEs or `owl:Thing`. A slot referenced
//! by the input table without an anchor is a configuration error, fatal for
//! that pattern only.

use crate::ClassIri;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("failed to read pattern definition: {0}")]
    Io(#[from] io::Error),
    #[error("malformed pattern definition: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("variable '{var}' refers to unknown class '{class_name}'")]
    UnknownClass { var: String, class_name: String },
    #[error("no anchor declared for input column '{0}'")]
    MissingAnchor(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    #[serde(default)]
    pub pattern_name: Option<String>,
    #[serde(default)]
    pub classes: BTreeMap<String, String>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl PatternDefinition {
    pub fn from_yaml_str(text: &str) -> Result<Self, PatternError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, PatternError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Resolve every variable to its anchor class.
    pub fn anchors(&self) -> Result<BTreeMap<String, ClassIri>, PatternError> {
        let mut anchors = BTreeMap::new();
        for (var, class_name) in &self.vars {
            let key = class_name.trim().trim_matches('\'');
            let Some(curie) = self.classes.get(key) else {
                return Err(PatternError::UnknownClass {
                    var: var.clone(),
                    class_name: key.to_string(),
                });
            };
            let anchor = if curie.trim() == "owl:Thing" {
                ClassIri::owl_thing()
            } else {
                ClassIri::from_curie(curie)
            };
            anchors.insert(var.clone(), anchor);
        }
        Ok(anchors)
    }

    /// Bind the definition to a concrete table's column order, verifying that
    /// every column has an anchor.
    pub fn compile(
        &self,
        columns: &[String],
        expand_slots: &BTreeSet<String>,
    ) -> Result<CompiledPattern, PatternError> {
        let anchors = self.anchors()?;
        for column in columns {
            if !anchors.contains_key(column) {
                return Err(PatternError::MissingAnchor(column.clone()));
            }
        }
        Ok(CompiledPattern {
            name: self.pattern_name.clone().unwrap_or_default(),
            columns: columns.to_vec(),
            anchors,
            expand_slots: expand_slots.clone(),
        })
    }
}

/// A pattern bound to a fixed, deterministic column order with a complete
/// anchor map.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    name: String,
    columns: Vec<String>,
    anchors: BTreeMap<String, ClassIri>,
    expand_slots: BTreeSet<String>,
}

impl CompiledPattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn anchor(&self, slot: &str) -> Option<&ClassIri> {
        self.anchors.get(slot)
    }

    /// Whether this slot resolves to all ancestors up to the anchor rather
    /// than just the leaf.
    pub fn is_expanded(&self, slot: &str) -> bool {
        self.expand_slots.contains(slot)
    }
}

/// Load the set of slot names flagged for ancestor expansion (one per line).
pub fn load_expand_flags(path: &Path) -> io::Result<BTreeSet<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
