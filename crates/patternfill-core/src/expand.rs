//! Per-record expansion: candidate sets per slot, then their cross-product.
//!
//! Policy is all-or-nothing: a pattern instantiation is only valid if every
//! slot can be generalized, so a record with any empty candidate set (after
//! whitelist filtering) is discarded whole. No partial rows are emitted.

use crate::pattern::CompiledPattern;
use crate::resolve::{resolve, Resolution};
use crate::whitelist::NamespaceWhitelist;
use crate::{InputRecord, OutputRow};
use patternfill_ontology::{ClassIri, Classification, ClassificationError};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    /// A record escaped table validation without a value for a pattern column.
    #[error("record is missing a value for slot '{0}'")]
    MissingSlot(String),
    /// A column escaped pattern compilation without an anchor.
    #[error("no anchor declared for slot '{0}'")]
    MissingAnchor(String),
}

/// Why a record produced no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discard {
    /// The slot's leaf is not classified under the slot's anchor.
    AnchorViolation { slot: String, leaf: ClassIri },
    /// The slot yielded no whitelisted fillers.
    NoLegalFillers { slot: String, leaf: ClassIri },
}

impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discard::AnchorViolation { slot, leaf } => {
                write!(f, "slot '{slot}': {leaf} is not classified under the slot anchor")
            }
            Discard::NoLegalFillers { slot, leaf } => {
                write!(f, "slot '{slot}': no legal fillers for {leaf}")
            }
        }
    }
}

/// Result of expanding one record: either rows, or the reason it was dropped.
#[derive(Debug)]
pub struct RecordExpansion {
    pub rows: BTreeSet<OutputRow>,
    pub discard: Option<Discard>,
}

impl RecordExpansion {
    fn discarded(discard: Discard) -> Self {
        Self {
            rows: BTreeSet::new(),
            discard: Some(discard),
        }
    }
}

pub fn expand_record(
    oracle: &(impl Classification + ?Sized),
    record: &InputRecord,
    pattern: &CompiledPattern,
    whitelist: &NamespaceWhitelist,
) -> Result<RecordExpansion, ExpandError> {
    // One candidate list per slot, in column order.
    let mut per_slot: Vec<Vec<ClassIri>> = Vec::with_capacity(pattern.columns().len());

    for slot in pattern.columns() {
        let leaf = record
            .get(slot)
            .ok_or_else(|| ExpandError::MissingSlot(slot.clone()))?;
        let anchor = pattern
            .anchor(slot)
            .ok_or_else(|| ExpandError::MissingAnchor(slot.clone()))?;

        match resolve(oracle, leaf, anchor, pattern.is_expanded(slot))? {
            Resolution::AnchorViolation => {
                return Ok(RecordExpansion::discarded(Discard::AnchorViolation {
                    slot: slot.clone(),
                    leaf: leaf.clone(),
                }));
            }
            Resolution::Candidates(candidates) => {
                // Legality is checked before the emptiness test: a slot whose
                // fillers are all outside the whitelist counts as empty.
                let legal: Vec<ClassIri> = candidates
                    .into_iter()
                    .filter(|class| whitelist.is_legal(class))
                    .collect();
                if legal.is_empty() {
                    warn!(slot = %slot, class = %leaf, "no legal fillers for class");
                    return Ok(RecordExpansion::discarded(Discard::NoLegalFillers {
                        slot: slot.clone(),
                        leaf: leaf.clone(),
                    }));
                }
                per_slot.push(legal);
            }
        }
    }

    let mut rows = BTreeSet::new();
    for combination in cartesian_product(&per_slot) {
        let row: OutputRow = pattern
            .columns()
            .iter()
            .cloned()
            .zip(combination)
            .collect();
        rows.insert(row);
    }

    Ok(RecordExpansion {
        rows,
        discard: None,
    })
}

/// Cross-product of per-slot candidate lists, in slot order. With a single
/// slot the product is that slot's candidates, one row each.
fn cartesian_product(sets: &[Vec<ClassIri>]) -> Vec<Vec<ClassIri>> {
    if sets.is_empty() {
        return Vec::new();
    }
    if sets.len() == 1 {
        return sets[0].iter().map(|c| vec![c.clone()]).collect();
    }

    let mut acc: Vec<Vec<ClassIri>> = vec![Vec::new()];
    for set in sets {
        let mut next = Vec::with_capacity(acc.len() * set.len());
        for prefix in &acc {
            for class in set {
                let mut row = prefix.clone();
                row.push(class.clone());
                next.push(row);
            }
        }
        acc = next;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(curie: &str) -> ClassIri {
        ClassIri::from_curie(curie)
    }

    #[test]
    fn product_cardinality_is_the_product_of_sizes() {
        let sets = vec![
            vec![c("A:1"), c("A:2")],
            vec![c("B:1"), c("B:2"), c("B:3")],
            vec![c("C:1")],
        ];
        assert_eq!(cartesian_product(&sets).len(), 6);
    }

    #[test]
    fn single_slot_product_is_the_candidate_list() {
        let sets = vec![vec![c("A:1"), c("A:2")]];
        let rows = cartesian_product(&sets);
        assert_eq!(rows, vec![vec![c("A:1")], vec![c("A:2")]]);
    }

    #[test]
    fn zero_slots_yield_no_rows() {
        assert!(cartesian_product(&[]).is_empty());
    }
}
