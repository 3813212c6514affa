//! Per-pattern batch processing.
//!
//! Records are independent, so expansion fans out across a rayon pool; the
//! only merge is a union of row sets into one globally deduplicated result
//! (cartesian products from different source records may legitimately
//! overlap). Counters are explicit accumulator values, not ambient state.

use crate::expand::{expand_record, Discard, ExpandError};
use crate::pattern::CompiledPattern;
use crate::whitelist::NamespaceWhitelist;
use crate::{InputRecord, OutputRow};
use patternfill_ontology::Classification;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub records_in: usize,
    pub records_discarded: usize,
    /// Discards caused specifically by an anchor violation (a subset of
    /// `records_discarded`).
    pub anchor_violations: usize,
    pub distinct_rows: usize,
}

#[derive(Debug)]
pub struct BatchOutput {
    pub rows: BTreeSet<OutputRow>,
    /// One entry per discarded record, with the offending slot and leaf.
    pub discards: Vec<Discard>,
    pub summary: BatchSummary,
}

/// Expand every record of one pattern's table and union the results.
pub fn process_pattern(
    oracle: &(impl Classification + Sync),
    pattern: &CompiledPattern,
    records: &[InputRecord],
    whitelist: &NamespaceWhitelist,
) -> Result<BatchOutput, ExpandError> {
    let expansions = records
        .par_iter()
        .map(|record| expand_record(oracle, record, pattern, whitelist))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows: BTreeSet<OutputRow> = BTreeSet::new();
    let mut summary = BatchSummary {
        records_in: records.len(),
        ..BatchSummary::default()
    };

    let mut discards: Vec<Discard> = Vec::new();
    for expansion in expansions {
        match expansion.discard {
            Some(discard) => {
                summary.records_discarded += 1;
                if matches!(discard, Discard::AnchorViolation { .. }) {
                    summary.anchor_violations += 1;
                }
                discards.push(discard);
            }
            None => {
                rows.extend(expansion.rows);
            }
        }
    }

    summary.distinct_rows = rows.len();
    info!(
        pattern = pattern.name(),
        records_in = summary.records_in,
        records_discarded = summary.records_discarded,
        distinct_rows = summary.distinct_rows,
        "pattern batch complete"
    );

    Ok(BatchOutput {
        rows,
        discards,
        summary,
    })
}
